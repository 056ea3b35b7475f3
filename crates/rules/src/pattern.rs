//! Validated glob patterns for source identifiers and branch names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A compiled glob pattern.
///
/// `*` matches any substring, including `/`, so `"org/*"` covers every
/// repository of `org` and `"*"` matches everything. Construction fails on
/// malformed patterns, which makes an invalid glob a configuration-build
/// error rather than a per-event one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Glob {
    pattern: glob::Pattern,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        glob::Pattern::new(pattern)
            .map(|pattern| Self { pattern })
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// The pattern text as written in configuration.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.as_str() == "*" || self.pattern.matches(candidate)
    }
}

impl TryFrom<String> for Glob {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Glob> for String {
    fn from(glob: Glob) -> Self {
        glob.pattern.as_str().to_string()
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
