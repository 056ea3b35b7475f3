//! Rendering and delivery for routed webhook events.
//!
//! This crate provides:
//! - A small placeholder expression language over JSON-shaped contexts
//! - `ExpressionRenderer` for template documents (`{{ path | filter }}`,
//!   `{{#if cond}}...{{/if}}`)
//! - `Sink` trait for pluggable downstream delivery
//! - Dispatcher that routes, selects, renders and delivers per destination group

pub mod dispatcher;
pub mod expr;
pub mod templating;
pub mod traits;

pub use dispatcher::{DispatchOutcome, Dispatcher, Plan, PlannedGroup};
pub use templating::{ExpressionRenderer, Rendered};
pub use traits::{DispatchResult, NotifyError, Sink};
