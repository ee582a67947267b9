use std::path::Path;

use leetpush_core::config::{validate_access_token, validate_formatter_key};
use leetpush_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::commands::common::load_config;
use crate::config_store::CliConfig;
use crate::error::CliError;
use crate::secrets::{SecretKind, SecretSource, SecretStore};

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            username,
            repository,
            branch,
            api_base_url,
            formatter_model,
            formatter_base_url,
        } => {
            let config = run_config_init(
                config_path,
                ConfigInit {
                    username,
                    repository,
                    branch,
                    api_base_url,
                    formatter_model,
                    formatter_base_url,
                },
            )?;
            println!("Config initialized at {}", config_path.display());
            if let Some(username) = config.username() {
                let store = SecretStore::new(&username);
                if store.resolve(SecretKind::AccessToken)?.is_none() {
                    println!("No access token stored yet. Run `leetpush config set-token <TOKEN>`.");
                }
            }
            Ok(())
        }
        ConfigCommands::SetToken { token } => {
            let store = secret_store(config_path)?;
            store_secret(&store, SecretKind::AccessToken, &token)?;
            println!("Access token saved");
            Ok(())
        }
        ConfigCommands::SetFormatterKey { key } => {
            let store = secret_store(config_path)?;
            store_secret(&store, SecretKind::FormatterKey, &key)?;
            println!("Formatter key saved");
            Ok(())
        }
        ConfigCommands::ClearFormatterKey => {
            secret_store(config_path)?.clear(SecretKind::FormatterKey)?;
            println!("Formatter key removed");
            Ok(())
        }
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            for line in format_config_lines(&config, config_path)? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Values supplied to `config init`; `None` keeps what is already stored.
#[derive(Debug, Default)]
pub struct ConfigInit {
    pub username: String,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub api_base_url: Option<String>,
    pub formatter_model: Option<String>,
    pub formatter_base_url: Option<String>,
}

pub fn run_config_init(config_path: &Path, init: ConfigInit) -> Result<CliConfig, CliError> {
    let mut config = load_config(config_path)?;

    config.username = Some(
        normalize_text_option(Some(init.username))
            .ok_or_else(|| CliError::Config("username must not be empty".to_string()))?,
    );
    for (slot, value) in [
        (&mut config.repository, init.repository),
        (&mut config.branch, init.branch),
        (&mut config.api_base_url, init.api_base_url),
        (&mut config.formatter_model, init.formatter_model),
        (&mut config.formatter_base_url, init.formatter_base_url),
    ] {
        if let Some(value) = normalize_text_option(value) {
            *slot = Some(value);
        }
    }

    config.validate().map_err(CliError::Config)?;
    config.save_to_path(config_path).map_err(CliError::Config)?;
    load_config(config_path)
}

pub fn store_secret(store: &SecretStore, kind: SecretKind, value: &str) -> Result<(), CliError> {
    let value = value.trim();
    match kind {
        SecretKind::AccessToken => validate_access_token(value)?,
        SecretKind::FormatterKey => validate_formatter_key(value)?,
    }
    store.save(kind, value)?;
    Ok(())
}

pub fn format_config_lines(config: &CliConfig, config_path: &Path) -> Result<Vec<String>, CliError> {
    let settings = config.repo_settings()?;
    let formatter = config.formatter_settings().map_err(CliError::Config)?;
    let username = config.username();

    let mut lines = vec![
        format!("config:          {}", config_path.display()),
        format!("username:        {}", username.as_deref().unwrap_or("(not set)")),
        format!("repository:      {}", settings.repository),
        format!("branch:          {}", settings.branch),
        format!("api base url:    {}", settings.api_base_url),
        format!("formatter model: {}", formatter.model),
        format!("formatter url:   {}", formatter.base_url),
    ];

    let store = username.as_deref().map(SecretStore::new);
    for (label, kind) in [
        ("access token:    ", SecretKind::AccessToken),
        ("formatter key:   ", SecretKind::FormatterKey),
    ] {
        let status = match store.as_ref() {
            Some(store) => describe_secret(store.resolve(kind)?.map(|(_, source)| source)),
            None => describe_secret(None),
        };
        lines.push(format!("{label}{status}"));
    }
    Ok(lines)
}

fn describe_secret(source: Option<SecretSource>) -> &'static str {
    match source {
        Some(SecretSource::Environment) => "set (environment)",
        Some(SecretSource::Keychain) => "set (keychain)",
        None => "not set",
    }
}

fn secret_store(config_path: &Path) -> Result<SecretStore, CliError> {
    let config = load_config(config_path)?;
    let username = config.username().ok_or(CliError::NotConfigured)?;
    Ok(SecretStore::new(&username))
}
