use crate::tail::TailError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a `--grep` pattern is interpreted. Matching is case-sensitive in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSyntax {
    /// Plain substring.
    #[default]
    Literal,
    /// `regex` crate syntax, unanchored.
    Regex,
}

/// Predicate over event messages.
#[derive(Debug, Clone)]
pub enum EventFilter {
    Literal(String),
    Regex(Regex),
}

impl EventFilter {
    pub fn new(pattern: &str, syntax: FilterSyntax) -> Result<Self, TailError> {
        match syntax {
            FilterSyntax::Literal => Ok(Self::Literal(pattern.to_string())),
            FilterSyntax::Regex => Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|source| TailError::InvalidFilter {
                    pattern: pattern.to_string(),
                    source,
                }),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        match self {
            EventFilter::Literal(needle) => message.contains(needle.as_str()),
            EventFilter::Regex(re) => re.is_match(message),
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            EventFilter::Literal(needle) => needle,
            EventFilter::Regex(re) => re.as_str(),
        }
    }
}
