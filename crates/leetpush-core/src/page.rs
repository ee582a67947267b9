//! Typed view of the monitored judge page.
//!
//! A page shim serializes what it can see of the DOM and the in-page editors
//! into a [`PageSnapshot`]. Everything downstream (extraction, language
//! detection, acceptance checks) only reads snapshots, so it can be driven by
//! fixtures in tests.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Path segment that precedes the problem slug in judge URLs.
const PROBLEM_PATH_MARKER: &str = "/problems/";
const JUDGE_HOST: &str = "leetcode.com";

/// Elements whose presence indicates a finished, successful submission.
pub const SUCCESS_MARKERS: &[Selector] = &[
    Selector::Class("success__3Ai7"),
    Selector::Attr("data-cy", "submission-result"),
    Selector::Class("ant-alert-success"),
    Selector::Class("text-green-500"),
    Selector::Class("text-green-600"),
    Selector::Class("success-message"),
    Selector::ClassContains("success"),
    Selector::ClassContains("accepted"),
];

/// Source that yields snapshots of the live page.
pub trait PageHost: Send {
    /// Whether the page context is still alive. A detached host ends the
    /// watcher; nothing further is read or sent.
    fn is_attached(&self) -> bool;

    /// Capture the page as it looks right now.
    fn snapshot(&mut self) -> PageSnapshot;
}

/// Point-in-time capture of the judge page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Full page address including the query string
    #[serde(default)]
    pub url: String,
    /// Concatenated text content of the document body
    #[serde(default)]
    pub body_text: String,
    /// Flattened element list in document order
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Structured editor models (one per open editor instance)
    #[serde(default)]
    pub editors: Vec<EditorModel>,
    /// Value of a CodeMirror widget, if one is mounted
    #[serde(default)]
    pub code_mirror: Option<String>,
    /// Value of an Ace widget, if one is mounted
    #[serde(default)]
    pub ace: Option<String>,
}

/// One DOM element, reduced to what the heuristics look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Readout of one in-memory editor model.
///
/// `value` is absent when reading the model failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorModel {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub language_id: Option<String>,
}

/// The handful of CSS selector shapes the heuristics need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `.name`
    Class(&'static str),
    /// `[class*="fragment"]`
    ClassContains(&'static str),
    /// `[name="value"]`
    Attr(&'static str, &'static str),
    /// `[name*="fragment"]`
    AttrContains(&'static str, &'static str),
    /// `[name]`
    HasAttr(&'static str),
    /// `tag[name="value"]`
    TagAttr(&'static str, &'static str, &'static str),
}

impl Selector {
    pub fn matches(&self, element: &Element) -> bool {
        match *self {
            Self::Class(name) => element.classes.iter().any(|class| class == name),
            Self::ClassContains(fragment) => {
                element.classes.iter().any(|class| class.contains(fragment))
            }
            Self::Attr(name, value) => element.attribute(name) == Some(value),
            Self::AttrContains(name, fragment) => element
                .attribute(name)
                .is_some_and(|value| value.contains(fragment)),
            Self::HasAttr(name) => element.attribute(name).is_some(),
            Self::TagAttr(tag, name, value) => {
                element.tag.eq_ignore_ascii_case(tag) && element.attribute(name) == Some(value)
            }
        }
    }
}

impl Element {
    /// Attribute lookup that also answers for `id`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name == "id" {
            if let Some(id) = self.id.as_deref() {
                return Some(id);
            }
        }
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|class| class == name)
    }

    /// The option marked selected, if any.
    pub fn selected_option(&self) -> Option<&SelectOption> {
        self.options.iter().find(|option| option.selected)
    }
}

impl PageSnapshot {
    /// Parse a snapshot from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a snapshot exported by the page shim.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// First element matching `selector`, in document order.
    pub fn query(&self, selector: Selector) -> Option<&Element> {
        self.elements.iter().find(|element| selector.matches(element))
    }

    /// All elements matching `selector`, in document order.
    pub fn query_all(&self, selector: Selector) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |element| selector.matches(element))
    }

    /// Elements with the given tag name.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |element| element.tag.eq_ignore_ascii_case(tag))
    }

    /// Value of a query-string parameter in the page URL.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let (_, query) = self.url.split_once('?')?;
        let query = query.split('#').next().unwrap_or_default();
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key != name || value.is_empty() {
                return None;
            }
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(std::borrow::Cow::into_owned)
        })
    }

    /// Problem identifier derived from the `/problems/<slug>` path segment,
    /// with dashes turned into underscores.
    ///
    /// Returns `None` when the page is not a judge problem page.
    pub fn problem_identifier(&self) -> Option<String> {
        if !self.url.contains(JUDGE_HOST) {
            return None;
        }
        let (_, rest) = self.url.split_once(PROBLEM_PATH_MARKER)?;
        let slug = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        if slug.is_empty() {
            return None;
        }
        Some(slug.replace('-', "_"))
    }

    /// A success marker is on the page and the body mentions acceptance.
    pub fn shows_acceptance(&self) -> bool {
        let accepted_text =
            self.body_text.contains("Accepted") || self.body_text.contains("accepted");
        accepted_text && SUCCESS_MARKERS.iter().any(|marker| self.query(*marker).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, classes: &[&str]) -> Element {
        Element {
            tag: tag.to_string(),
            classes: classes.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn problem_identifier_replaces_dashes() {
        let page = PageSnapshot {
            url: "https://leetcode.com/problems/two-sum/submissions/123/".to_string(),
            ..Default::default()
        };
        assert_eq!(page.problem_identifier().as_deref(), Some("two_sum"));
    }

    #[test]
    fn problem_identifier_requires_judge_problem_page() {
        let other_site = PageSnapshot {
            url: "https://example.com/problems/two-sum".to_string(),
            ..Default::default()
        };
        let no_problem = PageSnapshot {
            url: "https://leetcode.com/contest/".to_string(),
            ..Default::default()
        };
        assert_eq!(other_site.problem_identifier(), None);
        assert_eq!(no_problem.problem_identifier(), None);
    }

    #[test]
    fn query_param_decodes_values() {
        let page = PageSnapshot {
            url: "https://leetcode.com/problems/two-sum/?envType=daily&lang=c%2B%2B#top"
                .to_string(),
            ..Default::default()
        };
        assert_eq!(page.query_param("lang").as_deref(), Some("c++"));
        assert_eq!(page.query_param("missing"), None);
    }

    #[test]
    fn acceptance_needs_marker_and_text() {
        let mut page = PageSnapshot {
            body_text: "Accepted 63 / 63 testcases passed".to_string(),
            ..Default::default()
        };
        assert!(!page.shows_acceptance());

        page.elements.push(element("span", &["text-green-500"]));
        assert!(page.shows_acceptance());

        page.body_text = "Wrong Answer".to_string();
        assert!(!page.shows_acceptance());
    }

    #[test]
    fn selectors_match_attributes_and_class_fragments() {
        let mut select = element("select", &["lang-select-wrapper"]);
        select
            .attributes
            .insert("data-cy".to_string(), "lang-select".to_string());

        assert!(Selector::Attr("data-cy", "lang-select").matches(&select));
        assert!(Selector::TagAttr("select", "data-cy", "lang-select").matches(&select));
        assert!(!Selector::TagAttr("button", "data-cy", "lang-select").matches(&select));
        assert!(Selector::ClassContains("lang-select").matches(&select));
        assert!(!Selector::Class("lang-select").matches(&select));
        assert!(Selector::HasAttr("data-cy").matches(&select));
    }

    #[test]
    fn snapshot_parses_camel_case_json() {
        let raw = r#"
        {
          "url": "https://leetcode.com/problems/two-sum/",
          "bodyText": "Accepted",
          "editors": [{ "value": "print(1)", "languageId": "python" }],
          "elements": [{ "tag": "textarea", "attributes": { "name": "code" }, "value": "x" }]
        }
        "#;
        let page = PageSnapshot::from_json(raw).unwrap();
        assert_eq!(page.editors[0].language_id.as_deref(), Some("python"));
        assert_eq!(page.by_tag("TEXTAREA").count(), 1);
        assert_eq!(page.code_mirror, None);
    }
}
