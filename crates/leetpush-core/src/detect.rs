//! Programming language detection for the code on the judge page.

use std::sync::OnceLock;

use regex::Regex;

use crate::extract::{extract_code, MIN_SCRAPED_LEN};
use crate::language::{normalize, DEFAULT_LANGUAGE};
use crate::page::{PageSnapshot, Selector};
use crate::util::trimmed_len;

const PLAINTEXT_LANGUAGE_ID: &str = "plaintext";
const PLACEHOLDER_LABEL: &str = "select language";
const MAX_BUTTON_LABEL_LEN: usize = 20;

const SELECTOR_CONTROLS: &[Selector] = &[
    Selector::Attr("data-cy", "lang-select"),
    Selector::TagAttr("select", "data-cy", "lang-select"),
    Selector::Class("language-select"),
];

const LANGUAGE_BUTTONS: &[Selector] = &[
    Selector::TagAttr("button", "data-cy", "lang-select"),
    Selector::Class("lang-select-button"),
    Selector::ClassContains("lang-select"),
    Selector::AttrContains("aria-label", "language"),
    Selector::AttrContains("aria-label", "Language"),
];

const LANGUAGE_INDICATORS: &[Selector] = &[
    Selector::HasAttr("data-lang"),
    Selector::ClassContains("language-"),
    Selector::ClassContains("lang-"),
];

/// A single detection strategy; results are raw and normalized afterwards.
pub type Strategy = fn(&PageSnapshot) -> Option<String>;

/// Detection strategies in priority order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("url parameter", from_url),
    ("editor model", from_editor_models),
    ("language selector", from_selector_control),
    ("language button", from_language_button),
    ("code content", from_code_content),
    ("page attributes", from_page_attributes),
];

/// Canonical language tag of the current editor content. Never empty.
pub fn detect_language(page: &PageSnapshot) -> String {
    for (source, strategy) in STRATEGIES {
        if let Some(raw) = strategy(page) {
            let language = normalize(&raw);
            tracing::debug!(source, raw = %raw, language = %language, "Detected language");
            return language;
        }
    }

    tracing::warn!("Could not detect language, defaulting to {DEFAULT_LANGUAGE}");
    DEFAULT_LANGUAGE.to_string()
}

pub fn from_url(page: &PageSnapshot) -> Option<String> {
    page.query_param("lang")
}

pub fn from_editor_models(page: &PageSnapshot) -> Option<String> {
    page.editors
        .iter()
        .filter_map(|editor| editor.language_id.as_deref())
        .map(str::trim)
        .find(|id| !id.is_empty() && *id != PLAINTEXT_LANGUAGE_ID)
        .map(ToString::to_string)
}

pub fn from_selector_control(page: &PageSnapshot) -> Option<String> {
    SELECTOR_CONTROLS.iter().find_map(|selector| {
        let control = page.query(*selector)?;
        let from_option = control.selected_option().and_then(|option| {
            let value = option.value.trim();
            if value.is_empty() {
                non_empty(option.text.trim().to_lowercase())
            } else {
                Some(value.to_string())
            }
        });
        from_option.or_else(|| control.value.clone().and_then(non_empty))
    })
}

/// Visible label of a language picker button.
///
/// This is a weak signal: a label that normalizes to the default language is
/// ignored so it cannot mask better evidence further down.
pub fn from_language_button(page: &PageSnapshot) -> Option<String> {
    LANGUAGE_BUTTONS.iter().find_map(|selector| {
        let button = page.query(*selector)?;
        let label = non_empty(button.text.trim().to_lowercase())
            .or_else(|| button.attribute("aria-label").map(str::to_lowercase))
            .or_else(|| button.attribute("title").map(str::to_lowercase))?;

        if label == PLACEHOLDER_LABEL || label.chars().count() >= MAX_BUTTON_LABEL_LEN {
            return None;
        }
        (normalize(&label) != DEFAULT_LANGUAGE).then_some(label)
    })
}

pub fn from_code_content(page: &PageSnapshot) -> Option<String> {
    let code = extract_code(page);
    if trimmed_len(&code) <= MIN_SCRAPED_LEN {
        return None;
    }
    classify_code(&code).map(ToString::to_string)
}

pub fn from_page_attributes(page: &PageSnapshot) -> Option<String> {
    LANGUAGE_INDICATORS.iter().find_map(|selector| {
        let element = page.query(*selector)?;
        element
            .attribute("data-lang")
            .and_then(|lang| non_empty(lang.to_string()))
            .or_else(|| {
                element.classes.iter().find_map(|class| {
                    language_class()
                        .captures(class)
                        .and_then(|captures| captures.get(1))
                        .map(|lang| lang.as_str().to_string())
                })
            })
    })
}

/// Guess the language from characteristic source markers.
pub fn classify_code(code: &str) -> Option<&'static str> {
    let has = |marker: &str| code.contains(marker);

    if has("public class Solution")
        || (has("class Solution")
            && (has("public static void main") || has("public int") || has("public String")))
    {
        return Some("java");
    }

    if has("#include")
        || has("using namespace std")
        || has("vector<")
        || has("std::")
        || (has("class Solution") && has("public:"))
    {
        return Some("cpp");
    }

    if has("def ") || has("class Solution:") || has("import ") {
        return Some("python");
    }

    if has("function ") || has("const ") || has("let ") || has("var ") {
        if has("interface ") || has(": string") || has(": number") {
            return Some("typescript");
        }
        return Some("javascript");
    }

    if has("#include") && !has("using namespace") && !has("vector<") {
        return Some("c");
    }

    if has("func ") && has("package ") {
        return Some("go");
    }

    None
}

fn language_class() -> &'static Regex {
    static LANGUAGE_CLASS: OnceLock<Regex> = OnceLock::new();
    LANGUAGE_CLASS
        .get_or_init(|| Regex::new(r"(?:language|lang)-(\w+)").expect("Invalid regex"))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
