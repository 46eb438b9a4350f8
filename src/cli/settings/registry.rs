//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{BooleanHandler, NumberHandler, StringHandler};
use super::helpers::parse_base_url;
use super::SettingHandler;
use crate::core::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_CHAR_DELAY_MS, DEFAULT_GENERATION_BASE_URL, DEFAULT_JITTER_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_PAUSE_DELAY_MS, DEFAULT_SUMMARY_BASE_URL,
};

fn plain(input: &str) -> Result<String, super::SettingError> {
    Ok(input.trim().to_string())
}

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `bavard set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(StringHandler {
            key: "model",
            hint: "Specify the model identifier",
            example: "bavard set model gemini-2.5-pro",
            default_display: DEFAULT_MODEL,
            get: |c| c.model.as_deref(),
            set_field: |c, v| c.model = v,
            parse: plain,
        }));
        registry.register(Box::new(NumberHandler {
            key: "max-retries",
            hint: "Specify the number of attempts per request",
            example: "bavard set max-retries 3",
            default_value: u64::from(DEFAULT_MAX_RETRIES),
            get: |c| c.max_retries.map(u64::from),
            set_field: |c, v| c.max_retries = v.map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
        }));
        registry.register(Box::new(NumberHandler {
            key: "base-delay-ms",
            hint: "Specify the backoff unit in milliseconds",
            example: "bavard set base-delay-ms 500",
            default_value: DEFAULT_BASE_DELAY_MS,
            get: |c| c.base_delay_ms,
            set_field: |c, v| c.base_delay_ms = v,
        }));
        registry.register(Box::new(NumberHandler {
            key: "jitter-ms",
            hint: "Specify the maximum backoff jitter in milliseconds",
            example: "bavard set jitter-ms 250",
            default_value: DEFAULT_JITTER_MS,
            get: |c| c.jitter_ms,
            set_field: |c, v| c.jitter_ms = v,
        }));
        registry.register(Box::new(StringHandler {
            key: "generation-base-url",
            hint: "Specify the generation API base URL",
            example: "bavard set generation-base-url http://localhost:8080/v1beta",
            default_display: DEFAULT_GENERATION_BASE_URL,
            get: |c| c.generation_base_url.as_deref(),
            set_field: |c, v| c.generation_base_url = v,
            parse: parse_base_url,
        }));
        registry.register(Box::new(StringHandler {
            key: "summary-base-url",
            hint: "Specify the summary API base URL",
            example: "bavard set summary-base-url https://en.wikipedia.org/api/rest_v1",
            default_display: DEFAULT_SUMMARY_BASE_URL,
            get: |c| c.summary_base_url.as_deref(),
            set_field: |c, v| c.summary_base_url = v,
            parse: parse_base_url,
        }));
        registry.register(Box::new(StringHandler {
            key: "system-instruction",
            hint: "Specify the persona sent with every request",
            example: "bavard set system-instruction Tu es un pirate.",
            default_display: "built-in persona",
            get: |c| c.system_instruction.as_deref(),
            set_field: |c, v| c.system_instruction = v,
            parse: plain,
        }));
        registry.register(Box::new(BooleanHandler {
            key: "typewriter",
            hint: "Specify on or off",
            example: "bavard set typewriter off",
            default_value: true,
            get: |c| c.typewriter,
            set_field: |c, v| c.typewriter = v,
        }));
        registry.register(Box::new(NumberHandler {
            key: "char-delay-ms",
            hint: "Specify the per-character delay in milliseconds",
            example: "bavard set char-delay-ms 10",
            default_value: DEFAULT_CHAR_DELAY_MS,
            get: |c| c.char_delay_ms,
            set_field: |c, v| c.char_delay_ms = v,
        }));
        registry.register(Box::new(NumberHandler {
            key: "pause-delay-ms",
            hint: "Specify the delay after a period in milliseconds",
            example: "bavard set pause-delay-ms 200",
            default_value: DEFAULT_PAUSE_DELAY_MS,
            get: |c| c.pause_delay_ms,
            set_field: |c, v| c.pause_delay_ms = v,
        }));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
