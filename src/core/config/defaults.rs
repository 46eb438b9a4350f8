use std::num::NonZeroU32;
use std::time::Duration;

use tracing::warn;

use crate::core::config::data::Config;
use crate::core::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_CHAR_DELAY_MS, DEFAULT_GENERATION_BASE_URL, DEFAULT_JITTER_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_PAUSE_DELAY_MS, DEFAULT_SUMMARY_BASE_URL,
    SYSTEM_INSTRUCTION,
};
use crate::core::retry::RetryPolicy;
use crate::ui::TypewriterTiming;

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn generation_base_url(&self) -> &str {
        self.generation_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GENERATION_BASE_URL)
    }

    pub fn summary_base_url(&self) -> &str {
        self.summary_base_url
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARY_BASE_URL)
    }

    pub fn system_instruction(&self) -> &str {
        self.system_instruction
            .as_deref()
            .unwrap_or(SYSTEM_INSTRUCTION)
    }

    pub fn typewriter_enabled(&self) -> bool {
        self.typewriter.unwrap_or(true)
    }

    /// `max_retries = 0` would mean no attempt at all; it is treated as one.
    pub fn retry_policy(&self) -> RetryPolicy {
        let requested = self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        let max_attempts = NonZeroU32::new(requested).unwrap_or_else(|| {
            warn!("max_retries = 0 is not usable, performing a single attempt");
            NonZeroU32::MIN
        });
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(self.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
            Duration::from_millis(self.jitter_ms.unwrap_or(DEFAULT_JITTER_MS)),
        )
    }

    pub fn typewriter_timing(&self) -> TypewriterTiming {
        if !self.typewriter_enabled() {
            return TypewriterTiming::instant();
        }
        TypewriterTiming {
            char_delay: Duration::from_millis(self.char_delay_ms.unwrap_or(DEFAULT_CHAR_DELAY_MS)),
            pause_delay: Duration::from_millis(
                self.pause_delay_ms.unwrap_or(DEFAULT_PAUSE_DELAY_MS),
            ),
        }
    }
}
