//! Rule matching: source patterns, event expansion and event filters.
//!
//! The three stages run in order for every incoming event:
//! - [`match_repo`]: first declared source pattern whose glob matches wins
//! - [`expand_events`]: resolve declared events against event sets and base filters
//! - [`match_event`]: gate a concrete event instance on the expanded filters

mod event;
mod expand;
mod repo;

pub use event::match_event;
pub use expand::expand_events;
pub use repo::{match_repo, org_destinations};
