//! Sink trait definition and shared error types.

use hookrelay_core::Value;
use hookrelay_rules::{ConfigError, SelectionError};
use serde::Serialize;

/// Errors that can occur while preparing or delivering a rendered document.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Template selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Downstream boundary receiving rendered documents.
///
/// Implementations own the transport (webhook POST, queue publish, ...).
/// One call delivers one document to every destination in a group.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Deliver `document` to each of `destinations`.
    async fn deliver(&self, destinations: &[String], document: &Value) -> Result<(), NotifyError>;

    /// Human-readable name for this sink (e.g., "webhook").
    fn name(&self) -> &str;
}

/// Result of rendering and delivering to one destination group.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub sink: String,
    /// Template catalog the group rendered with.
    pub catalog: String,
    pub destinations: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
