//! Settings management for `bavard set` and `bavard unset`.
//!
//! Handlers only edit an in-memory [`Config`]; the functions here load and
//! persist the file around them.

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

use std::path::Path;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::data::{path_display, Config};

pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Returns a success message to display.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    fn unset(&self, config: &mut Config) -> String;

    /// Format the current value for display in `bavard set` output.
    fn format(&self, config: &Config) -> String;
}

/// Lists every key with its current value.
pub fn format_all(registry: &SettingRegistry, config: &Config, config_path: &Path) -> String {
    let mut lines = vec![format!(
        "Current configuration ({}):",
        path_display(config_path)
    )];
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            lines.push(handler.format(config));
        }
    }
    lines.join("\n")
}

/// `bavard set [key [value...]]` against the file at `config_path`.
/// Without a key, or without a value, the current configuration is listed.
pub fn set_at(
    config_path: &Path,
    key: Option<&str>,
    value: &[String],
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let mut config = load(config_path)?;

    let Some(key) = key else {
        return Ok(format_all(&registry, &config, config_path));
    };
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    if value.is_empty() {
        return Ok(format_all(&registry, &config, config_path));
    }

    let message = handler.set(value, &mut config)?;
    save(&config, config_path)?;
    Ok(message)
}

pub fn unset_at(config_path: &Path, key: &str) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let mut config = load(config_path)?;
    let message = handler.unset(&mut config);
    save(&config, config_path)?;
    Ok(message)
}

fn load(config_path: &Path) -> Result<Config, SettingError> {
    Config::load_from_path(config_path).map_err(|e| SettingError::ConfigError(e.to_string()))
}

fn save(config: &Config, config_path: &Path) -> Result<(), SettingError> {
    config
        .save_to_path(config_path)
        .map_err(|e| SettingError::ConfigError(e.to_string()))
}
