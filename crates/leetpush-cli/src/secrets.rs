//! Secret storage: environment overrides on top of the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;
use leetpush_core::config::{ConfigError, CredentialStore, Credentials};
use leetpush_core::util::normalize_text_option;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "leetpush-cli";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    AccessToken,
    FormatterKey,
}

impl SecretKind {
    const fn label(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::FormatterKey => "formatter_key",
        }
    }

    pub const fn env_var(self) -> &'static str {
        match self {
            Self::AccessToken => "LEETPUSH_ACCESS_TOKEN",
            Self::FormatterKey => "LEETPUSH_FORMATTER_KEY",
        }
    }
}

/// Where a resolved secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Keychain,
}

/// Keychain entries for one GitHub username.
#[derive(Clone)]
pub struct SecretStore {
    username: String,
}

impl SecretStore {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    fn account(&self, kind: SecretKind) -> String {
        format!("{}:{}", kind.label(), self.username)
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self, kind: SecretKind) -> Result<Entry, ConfigError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.account(kind))
            .map_err(|error| ConfigError::Storage(error.to_string()))
    }

    #[cfg(not(test))]
    pub fn load(&self, kind: SecretKind) -> Result<Option<String>, ConfigError> {
        match self.entry(kind)?.get_password() {
            Ok(value) => Ok(normalize_text_option(Some(value))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(ConfigError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn load(&self, kind: SecretKind) -> Result<Option<String>, ConfigError> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| ConfigError::Storage(error.to_string()))?;
        Ok(guard.get(&self.account(kind)).cloned())
    }

    #[cfg(not(test))]
    pub fn save(&self, kind: SecretKind, value: &str) -> Result<(), ConfigError> {
        self.entry(kind)?
            .set_password(value)
            .map_err(|error| ConfigError::Storage(error.to_string()))
    }

    #[cfg(test)]
    pub fn save(&self, kind: SecretKind, value: &str) -> Result<(), ConfigError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| ConfigError::Storage(error.to_string()))?;
        guard.insert(self.account(kind), value.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    pub fn clear(&self, kind: SecretKind) -> Result<(), ConfigError> {
        match self.entry(kind)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(ConfigError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn clear(&self, kind: SecretKind) -> Result<(), ConfigError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| ConfigError::Storage(error.to_string()))?;
        guard.remove(&self.account(kind));
        Ok(())
    }

    /// Environment variable first, then the keychain.
    pub fn resolve(&self, kind: SecretKind) -> Result<Option<(String, SecretSource)>, ConfigError> {
        if let Some(value) = normalize_text_option(std::env::var(kind.env_var()).ok()) {
            return Ok(Some((value, SecretSource::Environment)));
        }
        Ok(self
            .load(kind)?
            .map(|value| (value, SecretSource::Keychain)))
    }
}

/// Credentials assembled from the configured username and stored secrets.
pub struct KeychainCredentialStore {
    username: Option<String>,
}

impl KeychainCredentialStore {
    pub const fn new(username: Option<String>) -> Self {
        Self { username }
    }
}

impl CredentialStore for KeychainCredentialStore {
    fn load_credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        let Some(username) = self.username.as_deref() else {
            return Ok(None);
        };

        let secrets = SecretStore::new(username);
        let Some((access_token, _)) = secrets.resolve(SecretKind::AccessToken)? else {
            return Ok(None);
        };
        let formatter_key = secrets
            .resolve(SecretKind::FormatterKey)?
            .map(|(key, _)| key);

        Credentials::new(Some(username.to_string()), Some(access_token), formatter_key).map(Some)
    }
}
