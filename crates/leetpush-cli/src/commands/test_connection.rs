use std::path::Path;

use crate::commands::common::{build_sync_service, load_config};
use crate::error::CliError;

pub async fn run_test_connection(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let service = build_sync_service(&config)?;
    let report = service.test_connection().await;

    if report.success {
        println!("{}", report.message.unwrap_or_default());
        Ok(())
    } else {
        Err(CliError::ConnectionFailed(
            report.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
