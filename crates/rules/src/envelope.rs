//! Routing-relevant fields of an incoming event.

use hookrelay_core::{lookup_path, Value};

use crate::tags::derive_tags;

/// Prefix added to a pull request's base branch to form a ref.
const HEADS_PREFIX: &str = "refs/heads/";

/// The identifying fields the router needs from one event instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventEnvelope {
    /// Event type (`push`, `pull_request`, ...).
    pub event: String,
    /// Source identifier (`owner/repo`), when the event concerns a repository.
    pub repository: Option<String>,
    /// Organization login for organization-level events.
    pub organization: Option<String>,
    /// Event action, empty when the event has none.
    pub action: String,
    /// Git ref, empty when the event has none.
    pub reference: String,
    /// Ordered selector tags, starting with the event name.
    pub tags: Vec<String>,
}

impl EventEnvelope {
    /// A bare envelope whose only tag is the event name.
    pub fn new(event: impl Into<String>) -> Self {
        let event = event.into();
        Self {
            tags: vec![event.clone()],
            event,
            ..Self::default()
        }
    }

    /// Extract routing fields and selector tags from a raw payload.
    pub fn from_payload(event: &str, payload: &Value) -> Self {
        let text = |path: &str| {
            lookup_path(payload, path)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        // A string `ref` wins even when empty; only a missing one falls back.
        let reference = match payload.get("ref").and_then(Value::as_str) {
            Some(reference) => reference.to_string(),
            None => lookup_path(payload, "pull_request.base.ref")
                .and_then(Value::as_str)
                .map(|base| format!("{HEADS_PREFIX}{base}"))
                .unwrap_or_default(),
        };

        Self {
            event: event.to_string(),
            repository: text("repository.full_name"),
            organization: text("organization.login"),
            action: text("action").unwrap_or_default(),
            reference,
            tags: derive_tags(event, payload),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Replace the selector tags. The event name is kept as the first tag.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = std::iter::once(self.event.clone())
            .chain(tags.into_iter().map(Into::into))
            .collect();
        self
    }
}
