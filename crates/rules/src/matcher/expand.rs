//! Event expansion: declared events -> flat effective filter table.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::schema::{BaseEvents, EventSets, ExpandedEventConfig, FilterSpec};

/// Expand a source pattern's declared events.
///
/// For each declared `(key, value)`:
/// - an event set expands to its members, each with its own base filter
///   (`value` is ignored)
/// - a base event uses its base filter when `value` is null, otherwise
///   `value` replaces it wholesale
/// - any other key is a custom event filtered by `value`
///
/// Later keys overwrite earlier results for the same event name.
pub fn expand_events(
    declared: &IndexMap<String, Option<FilterSpec>>,
    event_sets: &EventSets,
    base_events: &BaseEvents,
) -> Result<ExpandedEventConfig> {
    let mut expanded = ExpandedEventConfig::new();

    for (key, value) in declared {
        if let Some(set) = event_sets.get(key) {
            if value.is_some() {
                debug!(set = %key, "override on event set reference ignored");
            }
            for member in set.members() {
                let base = base_events
                    .get(member)
                    .ok_or_else(|| ConfigError::UnknownSetMember {
                        set: key.clone(),
                        event: member.clone(),
                    })?;
                expanded.insert(member.clone(), base.clone());
            }
        } else if let Some(base) = base_events.get(key) {
            let effective = match value {
                None => base.clone(),
                Some(custom) => Some(custom.clone()),
            };
            expanded.insert(key.clone(), effective);
        } else {
            expanded.insert(key.clone(), value.clone());
        }
    }

    Ok(expanded)
}
