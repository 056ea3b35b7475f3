//! Source patterns: which sources a rule covers and where matches go.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::FilterSpec;
use crate::pattern::Glob;

/// A rule keyed by a glob over source identifiers (`org/repo`).
///
/// `events` maps a declared name (base event, event set, or custom event)
/// to an optional override. Declaration order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcePattern {
    pub pattern: Glob,
    #[serde(default)]
    pub events: IndexMap<String, Option<FilterSpec>>,
    #[serde(default)]
    pub notify_to: Vec<String>,
}
