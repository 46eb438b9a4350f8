use reqwest::Url;

use super::error::SettingError;

/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn parse_u64(input: &str) -> Result<u64, SettingError> {
    input
        .trim()
        .parse()
        .map_err(|_| SettingError::InvalidNumber(input.to_string()))
}

/// Validates an http(s) base URL and strips trailing slashes.
pub fn parse_base_url(input: &str) -> Result<String, SettingError> {
    let trimmed = input.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {
            Ok(trimmed.to_string())
        }
        _ => Err(SettingError::InvalidUrl(input.to_string())),
    }
}
