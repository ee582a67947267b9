use std::path::Path;

use leetpush_core::extract::clean_code;
use leetpush_core::sync::SyncOutcome;
use leetpush_core::SubmissionEvent;

use crate::commands::common::{build_sync_service, load_config, normalize_problem_slug};
use crate::error::CliError;

pub async fn run_push(
    config_path: &Path,
    problem: &str,
    language: &str,
    file: &Path,
) -> Result<(), CliError> {
    let event = read_submission(problem, language, file)?;
    let config = load_config(config_path)?;
    let service = build_sync_service(&config)?;

    match service.sync_solution(&event).await {
        Ok(SyncOutcome::Created { path } | SyncOutcome::Updated { path }) => {
            println!("{path}");
            Ok(())
        }
        Ok(SyncOutcome::Unchanged { path }) => {
            println!("{path} (unchanged)");
            Ok(())
        }
        Err(_) => Err(CliError::PushFailed),
    }
}

/// Build the submission from a solution file on disk.
pub fn read_submission(
    problem: &str,
    language: &str,
    file: &Path,
) -> Result<SubmissionEvent, CliError> {
    let problem = normalize_problem_slug(problem)?;
    let code = clean_code(&std::fs::read_to_string(file)?);
    if code.is_empty() {
        return Err(CliError::EmptySolution(file.display().to_string()));
    }
    Ok(SubmissionEvent::new(problem, code, language)?)
}
