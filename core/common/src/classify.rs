//! Classification of backend failure messages.
//!
//! Backends report conditions such as "user already exists" or "table missing"
//! only as human-readable text. The classifier keeps the wording in one table
//! so a change in backend phrasing is a table edit, not a code change.
//!
//! The default rows track a third-party service's wording and may drift.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Conditions recognized in backend failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPattern {
    /// The identity being created is already registered.
    DuplicateIdentity,
    /// The relation backing profiles does not exist yet.
    SchemaNotReady,
}

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Condition this row detects.
    pub pattern: ErrorPattern,
    /// Regular expression, matched case-insensitively anywhere in the message.
    pub expression: String,
}

impl PatternRule {
    /// Create a new rule.
    pub fn new(pattern: ErrorPattern, expression: impl Into<String>) -> Self {
        Self {
            pattern,
            expression: expression.into(),
        }
    }
}

/// Default table.
pub fn default_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            ErrorPattern::DuplicateIdentity,
            r"already exists|duplicate|user exists|user already registered",
        ),
        PatternRule::new(
            ErrorPattern::SchemaNotReady,
            r"(relation|table) .*does not exist|no such table|could not find the table",
        ),
    ]
}

/// Compiled classification table.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<(ErrorPattern, Regex)>,
}

impl ErrorClassifier {
    /// Compile a classifier from a rule table.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if any expression fails to compile
    pub fn with_rules(rules: impl IntoIterator<Item = PatternRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                RegexBuilder::new(&rule.expression)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| (rule.pattern, regex))
                    .map_err(|e| {
                        Error::InvalidInput(format!(
                            "Invalid pattern for {:?}: {}",
                            rule.pattern, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Load a rule table from JSON (an array of `{pattern, expression}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: Vec<PatternRule> = serde_json::from_str(json)?;
        Self::with_rules(rules)
    }

    /// First condition whose row matches `message`, in table order.
    pub fn classify(&self, message: &str) -> Option<ErrorPattern> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(message))
            .map(|(pattern, _)| *pattern)
    }

    /// Whether any row for `pattern` matches `message`.
    pub fn matches(&self, pattern: ErrorPattern, message: &str) -> bool {
        self.rules
            .iter()
            .any(|(p, regex)| *p == pattern && regex.is_match(message))
    }

    /// Map a profile-store failure message to an error kind.
    ///
    /// Schema-not-ready messages win; everything else becomes `fallback`.
    pub fn kind_for(&self, message: &str, fallback: ErrorKind) -> ErrorKind {
        if self.matches(ErrorPattern::SchemaNotReady, message) {
            ErrorKind::SchemaNotReady
        } else {
            fallback
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::with_rules(default_rules()).expect("default classifier rules must compile")
    }
}
