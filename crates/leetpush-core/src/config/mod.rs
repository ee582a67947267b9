//! Credentials and repository settings shared by the CLI and the sync service.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_REPOSITORY: &str = "leetcode";
pub const DEFAULT_BRANCH: &str = "main";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ACCESS_TOKEN_PREFIXES: &[&str] = &["ghp_", "github_pat_"];
const FORMATTER_KEY_PREFIXES: &[&str] = &["sk-or-v1-", "sk-or-"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid token format. Token should start with \"ghp_\" or \"github_pat_\"")]
    AccessTokenFormat,
    #[error("Invalid formatter key format. Key should start with \"sk-or-v1-\" or \"sk-or-\"")]
    FormatterKeyFormat,
    #[error("{0} must include http:// or https://")]
    InvalidUrl(&'static str),
    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Hosting credentials plus the optional formatter key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub access_token: String,
    pub formatter_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_token", &"[REDACTED]")
            .field(
                "formatter_key",
                &self.formatter_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credentials {
    /// Build credentials from raw settings values, rejecting blanks and
    /// malformed secrets.
    pub fn new(
        username: Option<String>,
        access_token: Option<String>,
        formatter_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let username = normalize_text_option(username).ok_or(ConfigError::Missing("Username"))?;
        let access_token =
            normalize_text_option(access_token).ok_or(ConfigError::Missing("Access token"))?;
        validate_access_token(&access_token)?;

        let formatter_key = normalize_text_option(formatter_key);
        if let Some(key) = formatter_key.as_deref() {
            validate_formatter_key(key)?;
        }

        Ok(Self {
            username,
            access_token,
            formatter_key,
        })
    }
}

/// Read access to the configured credentials.
///
/// `Ok(None)` means nothing is configured yet.
pub trait CredentialStore: Send + Sync {
    fn load_credentials(&self) -> Result<Option<Credentials>, ConfigError>;
}

/// Where and how solutions are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSettings {
    pub api_base_url: String,
    pub repository: String,
    pub branch: String,
    pub description: String,
    pub private: bool,
    pub license_template: Option<String>,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            description: "LeetCode solutions - automatically pushed by leetpush".to_string(),
            private: false,
            license_template: Some("mit".to_string()),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl RepoSettings {
    /// Apply optional overrides on top of the defaults.
    pub fn with_overrides(
        api_base_url: Option<String>,
        repository: Option<String>,
        branch: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(url) = normalize_text_option(api_base_url) {
            if !is_http_url(&url) {
                return Err(ConfigError::InvalidUrl("API base URL"));
            }
            settings.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(repository) = normalize_text_option(repository) {
            settings.repository = repository;
        }
        if let Some(branch) = normalize_text_option(branch) {
            settings.branch = branch;
        }
        Ok(settings)
    }
}

pub fn validate_access_token(token: &str) -> Result<(), ConfigError> {
    if ACCESS_TOKEN_PREFIXES
        .iter()
        .any(|prefix| token.starts_with(prefix))
    {
        Ok(())
    } else {
        Err(ConfigError::AccessTokenFormat)
    }
}

pub fn validate_formatter_key(key: &str) -> Result<(), ConfigError> {
    if FORMATTER_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        Ok(())
    } else {
        Err(ConfigError::FormatterKeyFormat)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_secrets() {
        let credentials = Credentials {
            username: "octocat".to_string(),
            access_token: "ghp_secret".to_string(),
            formatter_key: Some("sk-or-v1-secret".to_string()),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("octocat"));
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("sk-or-v1-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn credentials_require_username_and_token() {
        assert_eq!(
            Credentials::new(None, Some("ghp_x".to_string()), None).unwrap_err(),
            ConfigError::Missing("Username")
        );
        assert_eq!(
            Credentials::new(Some("octocat".to_string()), Some("  ".to_string()), None)
                .unwrap_err(),
            ConfigError::Missing("Access token")
        );
    }

    #[test]
    fn credentials_validate_secret_formats() {
        assert_eq!(
            Credentials::new(
                Some("octocat".to_string()),
                Some("token".to_string()),
                None
            )
            .unwrap_err(),
            ConfigError::AccessTokenFormat
        );
        assert_eq!(
            Credentials::new(
                Some("octocat".to_string()),
                Some("github_pat_abc".to_string()),
                Some("openai-key".to_string())
            )
            .unwrap_err(),
            ConfigError::FormatterKeyFormat
        );

        let credentials = Credentials::new(
            Some(" octocat ".to_string()),
            Some("ghp_abc".to_string()),
            Some(" ".to_string()),
        )
        .unwrap();
        assert_eq!(credentials.username, "octocat");
        assert_eq!(credentials.formatter_key, None);
    }

    #[test]
    fn repo_settings_overrides_trim_and_validate() {
        let settings = RepoSettings::with_overrides(
            Some("https://github.example.com/api/v3/".to_string()),
            Some(" solutions ".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(settings.api_base_url, "https://github.example.com/api/v3");
        assert_eq!(settings.repository, "solutions");
        assert_eq!(settings.branch, DEFAULT_BRANCH);

        assert_eq!(
            RepoSettings::with_overrides(Some("github.com".to_string()), None, None).unwrap_err(),
            ConfigError::InvalidUrl("API base URL")
        );
    }
}
