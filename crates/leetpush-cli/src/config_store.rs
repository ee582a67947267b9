//! Persistent CLI configuration (non-secret settings only).

use std::path::{Path, PathBuf};

use leetpush_core::config::{ConfigError, RepoSettings};
use leetpush_core::formatter::FormatterSettings;
use leetpush_core::util::{is_http_url, normalize_text_option};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub formatter_model: Option<String>,
    #[serde(default)]
    pub formatter_base_url: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leetpush")
        .join(CONFIG_FILE_NAME)
}

/// Explicit `--config` path, then `LEETPUSH_CONFIG`, then the default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("LEETPUSH_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

impl CliConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self {
                version: default_config_version(),
                ..Self::default()
            });
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn username(&self) -> Option<String> {
        normalize_text_option(self.username.clone())
    }

    pub fn repo_settings(&self) -> Result<RepoSettings, ConfigError> {
        RepoSettings::with_overrides(
            self.api_base_url.clone(),
            self.repository.clone(),
            self.branch.clone(),
        )
    }

    pub fn formatter_settings(&self) -> Result<FormatterSettings, String> {
        FormatterSettings::with_overrides(
            self.formatter_base_url.clone(),
            self.formatter_model.clone(),
        )
        .map_err(|error| error.to_string())
    }

    /// Reject URLs without a scheme before they are persisted.
    pub fn validate(&self) -> Result<(), String> {
        for (label, value) in [
            ("API base URL", &self.api_base_url),
            ("Formatter base URL", &self.formatter_base_url),
        ] {
            if let Some(url) = value.as_deref() {
                if !is_http_url(url) {
                    return Err(format!("{label} must include http:// or https://"));
                }
            }
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.username = normalize_text_option(self.username.take());
        self.repository = normalize_text_option(self.repository.take());
        self.branch = normalize_text_option(self.branch.take());
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.formatter_model = normalize_text_option(self.formatter_model.take());
        self.formatter_base_url = normalize_text_option(self.formatter_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "leetpush-cli-config-test-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ))
    }

    #[test]
    fn config_roundtrip_normalizes_values() {
        let path = temp_config_path();
        let config = CliConfig {
            version: 1,
            username: Some(" octocat ".to_string()),
            repository: Some("  ".to_string()),
            branch: Some("solutions".to_string()),
            api_base_url: Some("https://github.example.com/api/v3/".to_string()),
            formatter_model: None,
            formatter_base_url: None,
        };

        config.save_to_path(&path).unwrap();
        let loaded = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.username.as_deref(), Some("octocat"));
        assert_eq!(loaded.repository, None);
        assert_eq!(
            loaded.api_base_url.as_deref(),
            Some("https://github.example.com/api/v3")
        );

        let settings = loaded.repo_settings().unwrap();
        assert_eq!(settings.repository, "leetcode");
        assert_eq!(settings.branch, "solutions");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = CliConfig::load_from_path(&temp_config_path()).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.username(), None);
    }

    #[test]
    fn validate_rejects_schemeless_urls() {
        let config = CliConfig {
            formatter_base_url: Some("openrouter.ai/api/v1".to_string()),
            ..CliConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
