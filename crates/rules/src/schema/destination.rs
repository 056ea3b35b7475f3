//! Destination profiles.

use serde::{Deserialize, Serialize};

/// A delivery target alias and the template catalog it prefers.
///
/// Transport details (URLs, credentials) belong to the dispatcher and are
/// ignored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}
