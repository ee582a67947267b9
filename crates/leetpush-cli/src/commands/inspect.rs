use std::path::Path;

use leetpush_core::detect::detect_language;
use leetpush_core::extract::extract_code;
use leetpush_core::page::PageSnapshot;
use leetpush_core::sync::solution_path;
use leetpush_core::watcher::contains_own_source;
use serde::Serialize;

use crate::error::CliError;

/// What a detection cycle would see on a snapshot.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct InspectReport {
    pub accepted: bool,
    pub problem_identifier: Option<String>,
    pub language: String,
    pub target_path: Option<String>,
    pub own_source: bool,
    pub code: String,
}

pub fn run_inspect(snapshot: &Path, as_json: bool) -> Result<(), CliError> {
    let page = PageSnapshot::load(snapshot)?;
    let report = inspect_page(&page);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_report_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn inspect_page(page: &PageSnapshot) -> InspectReport {
    let problem_identifier = page.problem_identifier();
    let language = detect_language(page);
    let code = extract_code(page);
    InspectReport {
        accepted: page.shows_acceptance(),
        target_path: problem_identifier
            .as_deref()
            .map(|problem| solution_path(problem, &language)),
        problem_identifier,
        own_source: contains_own_source(&code),
        language,
        code,
    }
}

fn format_report_lines(report: &InspectReport) -> Vec<String> {
    let mut lines = vec![
        format!("accepted:  {}", if report.accepted { "yes" } else { "no" }),
        format!(
            "problem:   {}",
            report.problem_identifier.as_deref().unwrap_or("-")
        ),
        format!("language:  {}", report.language),
        format!("target:    {}", report.target_path.as_deref().unwrap_or("-")),
    ];
    if report.own_source {
        lines.push("warning:   extracted text looks like extension source".to_string());
    }
    if report.code.is_empty() {
        lines.push("code:      -".to_string());
    } else {
        lines.push(String::new());
        lines.extend(report.code.lines().map(ToString::to_string));
    }
    lines
}
