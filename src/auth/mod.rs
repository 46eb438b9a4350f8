//! Gemini API key storage and resolution.
//!
//! The key comes from `GEMINI_API_KEY` when set, otherwise from the system
//! keyring entry written by `bavard auth`.

use crate::core::keyring::KeyringAccessError;
use keyring::Entry;
use std::fmt;
use tracing::{debug, warn};

mod ui;

use self::ui::{prompt_confirmation, prompt_token, ConfirmationChoice};

const KEYRING_SERVICE: &str = "bavard";
const KEYRING_ENTRY: &str = "gemini";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug)]
pub enum AuthError {
    /// Neither the environment nor the keyring holds a key.
    MissingKey,
    Keyring(KeyringAccessError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingKey => write!(
                f,
                "No Gemini API key found. Set {API_KEY_ENV} or run 'bavard auth'."
            ),
            AuthError::Keyring(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::MissingKey => None,
            AuthError::Keyring(err) => Some(err),
        }
    }
}

pub struct AuthManager {
    use_keyring: bool,
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    pub fn store_token(&self, token: &str) -> Result<(), KeyringAccessError> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?;
        entry.set_password(token)?;
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns `false` when there was nothing to remove.
    pub fn remove_token(&self) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Picks the API key: a non-blank `env_value` wins over the keyring.
    /// An unavailable keyring counts as empty.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Result<String, AuthError> {
        if let Some(key) = env_value.filter(|value| !value.trim().is_empty()) {
            debug!("using API key from {API_KEY_ENV}");
            return Ok(key.trim().to_string());
        }

        match self.get_token() {
            Ok(Some(token)) => {
                debug!("using API key from keyring");
                Ok(token)
            }
            Ok(None) => Err(AuthError::MissingKey),
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "keyring lookup failed");
                Err(AuthError::MissingKey)
            }
            Err(err) => Err(AuthError::Keyring(err)),
        }
    }

    pub fn interactive_auth(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.get_token()?.is_some() {
            let choice = prompt_confirmation("A key is already stored. Replace it?")?;
            if choice == ConfirmationChoice::No {
                println!("Cancelled.");
                return Ok(());
            }
        }

        let token = prompt_token()?;
        if token.is_empty() {
            return Err("Token cannot be empty".into());
        }
        self.store_token(&token)?;
        println!("✓ API key stored securely");
        Ok(())
    }

    pub fn interactive_deauth(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.get_token()?.is_none() {
            println!("No stored API key found.");
            return Ok(());
        }
        if prompt_confirmation("Remove the stored API key?")? == ConfirmationChoice::No {
            println!("Cancelled.");
            return Ok(());
        }
        if self.remove_token()? {
            println!("✓ API key removed");
        }
        Ok(())
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_key_wins() {
        let auth = AuthManager::new_with_keyring(false);
        assert_eq!(
            auth.resolve_api_key(Some("  abc123 \n".to_string())).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn blank_environment_falls_through_to_keyring() {
        let auth = AuthManager::new_with_keyring(false);
        assert!(matches!(
            auth.resolve_api_key(Some("   ".to_string())),
            Err(AuthError::MissingKey)
        ));
        assert!(matches!(
            auth.resolve_api_key(None),
            Err(AuthError::MissingKey)
        ));
    }

    #[test]
    fn disabled_keyring_is_a_no_op() {
        let auth = AuthManager::new_with_keyring(false);
        auth.store_token("secret").unwrap();
        assert_eq!(auth.get_token().unwrap(), None);
        assert!(!auth.remove_token().unwrap());
    }

    #[test]
    fn missing_key_message_names_the_variable() {
        assert!(AuthError::MissingKey.to_string().contains(API_KEY_ENV));
    }
}
