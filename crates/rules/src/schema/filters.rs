//! Per-event filters applied after a source pattern matched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pattern::Glob;

/// Event kinds whose `ref` names a branch.
pub const BRANCH_EVENTS: &[&str] = &["push", "pull_request"];

/// Ref prefix stripped before branch globs are applied.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Base event name -> default filter (null = accept every instance).
pub type BaseEvents = IndexMap<String, Option<FilterSpec>>;

/// Flat event name -> effective filter, derived per source pattern.
pub type ExpandedEventConfig = IndexMap<String, Option<FilterSpec>>;

/// Branch and action-type restrictions for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Glob>>,
    #[serde(default, rename = "types", skip_serializing_if = "Option::is_none")]
    pub action_types: Option<Vec<String>>,
}

impl FilterSpec {
    /// `true` when neither filter is declared.
    pub fn is_empty(&self) -> bool {
        self.branches.is_none() && self.action_types.is_none()
    }

    /// Check an event instance against both filters.
    ///
    /// The branch filter only applies to branch-bearing events with a
    /// non-empty ref; the action filter only applies to a non-empty action.
    pub fn accepts(&self, event: &str, action: &str, reference: &str) -> bool {
        if BRANCH_EVENTS.contains(&event) {
            if let Some(branches) = &self.branches {
                if !reference.is_empty() && !matches_branch(reference, branches) {
                    return false;
                }
            }
        }

        if let Some(types) = &self.action_types {
            if !action.is_empty() && !types.iter().any(|t| t == action) {
                return false;
            }
        }

        true
    }
}

fn matches_branch(reference: &str, branches: &[Glob]) -> bool {
    let branch = reference
        .strip_prefix(BRANCH_REF_PREFIX)
        .unwrap_or(reference);
    branches.iter().any(|glob| glob.matches(branch))
}
