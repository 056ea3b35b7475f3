//! Named event sets.

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Event set name -> member events.
pub type EventSets = IndexMap<String, EventSet>;

/// A named alias that expands to several base events at once.
///
/// Accepts either a list of event names or a map whose keys are event names
/// (values are ignored: members always use their own base definition).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "EventSetRepr", into = "Vec<String>")]
pub struct EventSet {
    members: Vec<String>,
}

impl EventSet {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventSetRepr {
    List(Vec<String>),
    Map(IndexMap<String, IgnoredAny>),
    Empty(()),
}

impl From<EventSetRepr> for EventSet {
    fn from(repr: EventSetRepr) -> Self {
        match repr {
            EventSetRepr::List(members) => Self { members },
            EventSetRepr::Map(map) => Self {
                members: map.into_keys().collect(),
            },
            EventSetRepr::Empty(()) => Self::default(),
        }
    }
}

impl From<EventSet> for Vec<String> {
    fn from(set: EventSet) -> Self {
        set.members
    }
}
