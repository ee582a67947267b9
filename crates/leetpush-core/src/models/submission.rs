//! Submission event and its de-duplication key

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::normalize;
use crate::{Error, Result};

/// An accepted submission ready to be synced.
///
/// Built once per accepted submission and consumed by the sync protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEvent {
    problem_identifier: String,
    source_code: String,
    language_tag: String,
}

impl SubmissionEvent {
    /// Create an event, normalizing the language tag.
    ///
    /// Fails when the problem identifier or the code is blank.
    pub fn new(
        problem_identifier: impl Into<String>,
        source_code: impl Into<String>,
        language: &str,
    ) -> Result<Self> {
        let problem_identifier = problem_identifier.into().trim().to_string();
        if problem_identifier.is_empty() {
            return Err(Error::InvalidInput(
                "Problem identifier cannot be empty".to_string(),
            ));
        }

        let source_code = source_code.into();
        if source_code.trim().is_empty() {
            return Err(Error::InvalidInput("Source code cannot be empty".to_string()));
        }

        Ok(Self {
            problem_identifier,
            source_code,
            language_tag: normalize(language),
        })
    }

    pub fn problem_identifier(&self) -> &str {
        &self.problem_identifier
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn language_tag(&self) -> &str {
        &self.language_tag
    }
}

/// De-duplication token: problem, language and detection time (Unix ms).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub problem_identifier: String,
    pub language_tag: String,
    pub detected_at: i64,
}

impl SubmissionKey {
    pub fn new(problem_identifier: &str, language_tag: &str, detected_at: i64) -> Self {
        Self {
            problem_identifier: problem_identifier.to_string(),
            language_tag: language_tag.to_string(),
            detected_at,
        }
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.problem_identifier, self.language_tag, self.detected_at
        )
    }
}
