use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `config.toml`. Every key is optional; see
/// [`crate::core::config::defaults`] for the values used when unset.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Generation model identifier (e.g., "gemini-2.5-flash")
    pub model: Option<String>,
    /// Attempts per generation request, first attempt included
    pub max_retries: Option<u32>,
    /// Backoff unit; attempt `n` waits `2^n * base_delay_ms` plus jitter
    pub base_delay_ms: Option<u64>,
    /// Upper bound of the random jitter added to each backoff
    pub jitter_ms: Option<u64>,
    pub generation_base_url: Option<String>,
    pub summary_base_url: Option<String>,
    /// Replaces the built-in persona
    pub system_instruction: Option<String>,
    /// Reveal replies character by character
    pub typewriter: Option<bool>,
    pub char_delay_ms: Option<u64>,
    /// Delay after a period
    pub pause_delay_ms: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
