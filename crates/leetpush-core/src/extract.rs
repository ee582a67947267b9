//! Source code extraction from the judge page.
//!
//! Strategies run in a fixed order and the first one that yields plausible
//! code wins. Structured editor models come first because they hold the exact
//! source; rendered lines come last because virtualized rendering can repeat
//! or drop lines.

use std::collections::HashSet;

use crate::page::{PageSnapshot, Selector};
use crate::util::trimmed_len;

/// Minimum trimmed length for editor-model and text-input reads.
pub const MIN_STRUCTURED_LEN: usize = 20;
/// Minimum trimmed length for rendered-line and widget reads.
pub const MIN_SCRAPED_LEN: usize = 10;

/// A single extraction strategy over a page snapshot.
pub type Strategy = fn(&PageSnapshot) -> Option<String>;

/// Extraction strategies in priority order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("editor model", from_editor_models),
    ("text input", from_text_inputs),
    ("rendered lines", from_rendered_lines),
    ("CodeMirror", from_code_mirror),
    ("Ace", from_ace),
];

/// Read the current editor contents, cleaned. Empty means nothing usable was
/// found.
pub fn extract_code(page: &PageSnapshot) -> String {
    for (source, strategy) in STRATEGIES {
        if let Some(raw) = strategy(page) {
            tracing::debug!(source, chars = trimmed_len(&raw), "Extracted code");
            return clean_code(&raw);
        }
    }

    tracing::debug!(
        editors = page.editors.len(),
        elements = page.elements.len(),
        "No extraction strategy produced code"
    );
    String::new()
}

/// Longest readable editor model.
pub fn from_editor_models(page: &PageSnapshot) -> Option<String> {
    page.editors
        .iter()
        .filter_map(|editor| editor.value.as_deref())
        .max_by_key(|value| trimmed_len(value))
        .filter(|value| trimmed_len(value) > MIN_STRUCTURED_LEN)
        .map(ToString::to_string)
}

/// Text inputs, preferring ones that are named after code.
pub fn from_text_inputs(page: &PageSnapshot) -> Option<String> {
    let filled: Vec<&str> = page
        .by_tag("textarea")
        .filter_map(|element| {
            let value = element.value.as_deref()?;
            (trimmed_len(value) > 0).then_some(value)
        })
        .collect();

    let hinted = page
        .by_tag("textarea")
        .filter(|element| {
            element.attribute("name") == Some("code")
                || element.attribute("data-cy") == Some("code-area")
                || element.id.as_deref().is_some_and(|id| id.contains("code"))
        })
        .filter_map(|element| element.value.as_deref())
        .max_by_key(|value| trimmed_len(value));

    if let Some(value) = hinted.filter(|value| trimmed_len(value) > MIN_STRUCTURED_LEN) {
        return Some(value.to_string());
    }

    filled
        .into_iter()
        .max_by_key(|value| trimmed_len(value))
        .filter(|value| trimmed_len(value) > MIN_STRUCTURED_LEN)
        .map(ToString::to_string)
}

/// Rendered editor lines with repeated non-blank lines dropped.
pub fn from_rendered_lines(page: &PageSnapshot) -> Option<String> {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();

    for line in page.query_all(Selector::Class("view-line")) {
        let trimmed = line.text.trim();
        if trimmed.is_empty() || seen.insert(trimmed) {
            lines.push(line.text.as_str());
        }
    }

    let joined = lines.join("\n");
    (trimmed_len(&joined) > MIN_SCRAPED_LEN).then_some(joined)
}

pub fn from_code_mirror(page: &PageSnapshot) -> Option<String> {
    page.code_mirror
        .clone()
        .filter(|value| trimmed_len(value) > MIN_SCRAPED_LEN)
}

pub fn from_ace(page: &PageSnapshot) -> Option<String> {
    page.ace
        .clone()
        .filter(|value| trimmed_len(value) > MIN_SCRAPED_LEN)
}

/// Normalize whitespace without touching indentation.
///
/// Runs of blank lines collapse to one, trailing whitespace is stripped from
/// every line, and blank lines at either end are removed.
pub fn clean_code(code: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in code.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank && !lines.is_empty() {
                lines.push("");
            }
            previous_blank = true;
            continue;
        }
        lines.push(line);
        previous_blank = false;
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
