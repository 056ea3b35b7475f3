//! Event routing rules for the webhook relay.
//!
//! This crate provides:
//! - Serde schema for source patterns, event sets, base event filters,
//!   destinations and template catalogs
//! - Immutable per-epoch [`Snapshot`]s with build-time validation
//! - First-match-wins source matching and event filter expansion
//! - Tag-affinity template selection
//! - Lock-free snapshot hot-swap via [`SnapshotStore`]

pub mod envelope;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod router;
pub mod schema;
pub mod selector;
pub mod snapshot;
pub mod tags;

pub use envelope::EventEnvelope;
pub use error::{ConfigError, Result, SelectionError};
pub use pattern::Glob;
pub use router::{Route, RouteDecision, SkipReason};
pub use snapshot::{CompiledRule, Snapshot, SnapshotConfig, SnapshotStore};
