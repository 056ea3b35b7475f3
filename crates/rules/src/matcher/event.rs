//! Event instance gate.

use crate::schema::ExpandedEventConfig;

/// Accept or reject an event instance against an expanded filter table.
///
/// Unknown events are rejected; events declared without a filter are
/// accepted. `action` and `reference` may be empty, which skips the
/// corresponding filter.
pub fn match_event(
    event: &str,
    action: &str,
    reference: &str,
    config: &ExpandedEventConfig,
) -> bool {
    match config.get(event) {
        None => false,
        Some(None) => true,
        Some(Some(filter)) => filter.accepts(event, action, reference),
    }
}
