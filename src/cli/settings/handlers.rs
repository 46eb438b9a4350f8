//! Data-driven handlers for the keys of `config.toml`.

use super::error::SettingError;
use super::helpers::{format_bool, parse_bool, parse_u64};
use super::SettingHandler;
use crate::core::config::data::Config;

pub struct StringHandler {
    pub key: &'static str,
    pub hint: &'static str,
    pub example: &'static str,
    pub default_display: &'static str,
    pub get: fn(&Config) -> Option<&str>,
    pub set_field: fn(&mut Config, Option<String>),
    pub parse: fn(&str) -> Result<String, SettingError>,
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }
        let value = (self.parse)(&input)?;
        let message = format!("✅ Set {} to: {value}", self.key);
        (self.set_field)(config, Some(value));
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

pub struct BooleanHandler {
    pub key: &'static str,
    pub hint: &'static str,
    pub example: &'static str,
    pub default_value: bool,
    pub get: fn(&Config) -> Option<bool>,
    pub set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }
        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        (self.set_field)(config, Some(value));
        Ok(format!("✅ Set {} to: {}", self.key, format_bool(value)))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key,
            format_bool(self.default_value)
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!(
                "  {}: (unset, default: {})",
                self.key,
                format_bool(self.default_value)
            ),
        }
    }
}

pub struct NumberHandler {
    pub key: &'static str,
    pub hint: &'static str,
    pub example: &'static str,
    pub default_value: u64,
    pub get: fn(&Config) -> Option<u64>,
    pub set_field: fn(&mut Config, Option<u64>),
}

impl SettingHandler for NumberHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        };
        let value = parse_u64(input)?;
        (self.set_field)(config, Some(value));
        Ok(format!("✅ Set {} to: {value}", self.key))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_value
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_value),
        }
    }
}
