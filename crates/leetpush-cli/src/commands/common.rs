use std::path::Path;

use leetpush_core::github::GitHubClient;
use leetpush_core::sync::SyncService;

use crate::config_store::CliConfig;
use crate::error::CliError;
use crate::notifier::TerminalNotifier;
use crate::secrets::KeychainCredentialStore;

pub type CliSyncService = SyncService<GitHubClient, KeychainCredentialStore, TerminalNotifier>;

pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    CliConfig::load_from_path(path).map_err(CliError::Config)
}

/// Sync service wired to GitHub, the keychain and the terminal.
pub fn build_sync_service(config: &CliConfig) -> Result<CliSyncService, CliError> {
    let Some(username) = config.username() else {
        return Err(CliError::NotConfigured);
    };

    let settings = config.repo_settings()?;
    let formatter_settings = config.formatter_settings().map_err(CliError::Config)?;
    let api = GitHubClient::new(&settings)?;
    tracing::debug!(repository = %settings.repository, branch = %settings.branch, "Sync target");

    Ok(SyncService::new(
        api,
        KeychainCredentialStore::new(Some(username)),
        TerminalNotifier,
        settings,
    )
    .with_formatter_settings(formatter_settings))
}

/// Turn a judge slug (`two-sum`) into a problem identifier (`two_sum`).
pub fn normalize_problem_slug(slug: &str) -> Result<String, CliError> {
    let trimmed = slug.trim().trim_matches('/');
    if trimmed.is_empty() {
        Err(CliError::EmptyProblem)
    } else {
        Ok(trimmed.replace('-', "_"))
    }
}
