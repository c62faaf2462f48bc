use std::fmt;

use regex::Regex;

use crate::value::Value;

/// A single navigation step.
#[derive(Debug, Clone)]
pub enum Step {
    /// Mapping key or attribute name.
    Key(String),
    /// Sequence position. Negative positions never match.
    Index(i64),
    /// Bulk scan: every value whose key (or text form) matches.
    Pattern(Regex),
}

impl Step {
    /// Classifies one path segment: canonical decimal integers become
    /// indices, everything else is a key.
    ///
    /// Only segments that print back unchanged count as numeric, so keys such
    /// as `01`, `+1` or `-0` keep their spelling.
    pub fn parse(segment: &str) -> Self {
        match segment.parse::<i64>() {
            Ok(index) if index.to_string() == segment => Step::Index(index),
            _ => Step::Key(segment.to_string()),
        }
    }

    /// Splits a dotted path into steps.
    ///
    /// ```
    /// use grabview_core::Step;
    ///
    /// let steps = Step::parse_path("b.3.1");
    /// assert_eq!(steps.len(), 3);
    /// assert!(matches!(steps[1], Step::Index(3)));
    /// ```
    pub fn parse_path(path: &str) -> Vec<Step> {
        if path.is_empty() {
            return Vec::new();
        }
        path.split('.').map(Step::parse).collect()
    }

    pub fn pattern(regex: Regex) -> Self {
        Step::Pattern(regex)
    }

    /// Name used for attribute lookup and as a mapping key.
    pub fn name(&self) -> String {
        match self {
            Step::Key(key) => key.clone(),
            Step::Index(index) => index.to_string(),
            Step::Pattern(regex) => regex.as_str().to_string(),
        }
    }

    /// The step as a value, used for set membership checks.
    pub(crate) fn as_value(&self) -> Value {
        match self {
            Step::Key(key) => Value::Str(key.clone()),
            Step::Index(index) => Value::Int(*index),
            Step::Pattern(regex) => Value::Str(regex.as_str().to_string()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => write!(f, "{key}"),
            Step::Index(index) => write!(f, "{index}"),
            Step::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Step::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Step::Key(key)
    }
}

impl From<i64> for Step {
    fn from(index: i64) -> Self {
        Step::Index(index)
    }
}

impl From<i32> for Step {
    fn from(index: i32) -> Self {
        Step::Index(i64::from(index))
    }
}

impl From<usize> for Step {
    fn from(index: usize) -> Self {
        Step::Index(index as i64)
    }
}

impl From<Regex> for Step {
    fn from(regex: Regex) -> Self {
        Step::Pattern(regex)
    }
}

/// Renders a step list as a dotted path.
pub(crate) fn display_path(steps: &[Step]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
