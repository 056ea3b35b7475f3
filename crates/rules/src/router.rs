//! Route an event envelope through a snapshot.
//!
//! Repository events go to the first matching rule's destinations after the
//! event filter gate. Organization events without a repository fan out to
//! every `<org>/*` rule. `ping` events bypass the filter gate.

use std::fmt;

use tracing::debug;

use crate::envelope::EventEnvelope;
use crate::matcher::{match_event, org_destinations};
use crate::snapshot::{CompiledRule, Snapshot};

/// Event name that bypasses event filters.
pub const PING_EVENT: &str = "ping";

/// Why an event was not routed. A normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The event carries neither a repository nor an organization.
    NoSource,
    /// No source pattern matched the repository.
    NoMatchingPattern { source: String },
    /// No `<org>/*` pattern exists for the organization.
    NoOrganizationPatterns { organization: String },
    /// An organization-level event needs a repository rule to be filtered.
    UnfilteredOrganizationEvent { event: String },
    /// The matched rule's event filters rejected the instance.
    EventFiltered {
        event: String,
        action: String,
        reference: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSource => write!(f, "event has no repository or organization"),
            Self::NoMatchingPattern { source } => {
                write!(f, "no source pattern matches '{source}'")
            }
            Self::NoOrganizationPatterns { organization } => {
                write!(f, "no '{organization}/*' pattern configured")
            }
            Self::UnfilteredOrganizationEvent { event } => {
                write!(f, "organization event '{event}' has no rule to filter it")
            }
            Self::EventFiltered {
                event,
                action,
                reference,
            } => write!(
                f,
                "event '{event}' (action: '{action}', ref: '{reference}') rejected by filters"
            ),
        }
    }
}

/// A routed event: the rule that matched (absent for organization fan-out)
/// and the destinations to notify.
#[derive(Debug, Clone, PartialEq)]
pub struct Route<'a> {
    pub rule: Option<&'a CompiledRule>,
    pub destinations: Vec<String>,
}

/// Outcome of routing one event.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision<'a> {
    Deliver(Route<'a>),
    Skip(SkipReason),
}

impl RouteDecision<'_> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

impl Snapshot {
    /// Decide whether an event is relevant and where it goes.
    pub fn route(&self, envelope: &EventEnvelope) -> RouteDecision<'_> {
        let (rule, destinations) = if let Some(repo) = envelope.repository.as_deref() {
            match self.match_source(repo) {
                Some(rule) => {
                    debug!(repo, pattern = %rule.source.pattern, "matched source pattern");
                    (Some(rule), rule.source.notify_to.clone())
                }
                None => {
                    debug!(repo, "no matching source pattern, skipping");
                    return RouteDecision::Skip(SkipReason::NoMatchingPattern {
                        source: repo.to_string(),
                    });
                }
            }
        } else if let Some(org) = envelope.organization.as_deref() {
            let destinations = org_destinations(org, self.patterns());
            if destinations.is_empty() {
                debug!(org, "no organization patterns, skipping");
                return RouteDecision::Skip(SkipReason::NoOrganizationPatterns {
                    organization: org.to_string(),
                });
            }
            (None, destinations)
        } else {
            debug!(event = %envelope.event, "event has no repository or organization, skipping");
            return RouteDecision::Skip(SkipReason::NoSource);
        };

        if envelope.event != PING_EVENT {
            let Some(rule) = rule else {
                debug!(event = %envelope.event, "organization event has no rule to filter it, skipping");
                return RouteDecision::Skip(SkipReason::UnfilteredOrganizationEvent {
                    event: envelope.event.clone(),
                });
            };
            if !match_event(
                &envelope.event,
                &envelope.action,
                &envelope.reference,
                &rule.events,
            ) {
                debug!(
                    event = %envelope.event,
                    action = %envelope.action,
                    reference = %envelope.reference,
                    "event rejected by filters, skipping"
                );
                return RouteDecision::Skip(SkipReason::EventFiltered {
                    event: envelope.event.clone(),
                    action: envelope.action.clone(),
                    reference: envelope.reference.clone(),
                });
            }
        }

        RouteDecision::Deliver(Route { rule, destinations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotConfig;

    const CONFIG: &str = r#"
repos:
  - pattern: "org/specific-repo"
    events:
      push:
        branches: [main]
      pull_request:
    notify_to: [team]
  - pattern: "org/*"
    events:
      basic:
    notify_to: [org-bot, team]
  - pattern: "org/*"
    notify_to: [audit]
event_sets:
  basic: [push, issues]
events:
  push:
    branches: ["*"]
  pull_request:
    types: [opened, closed]
  issues:
templates:
  default:
    templates: {}
"#;

    fn snapshot() -> Snapshot {
        serde_yaml::from_str::<SnapshotConfig>(CONFIG)
            .unwrap()
            .build()
            .unwrap()
    }

    fn deliver<'a>(decision: RouteDecision<'a>) -> Route<'a> {
        match decision {
            RouteDecision::Deliver(route) => route,
            RouteDecision::Skip(reason) => panic!("expected delivery, skipped: {reason}"),
        }
    }

    #[test]
    fn repository_event_routes_to_rule_destinations() {
        let snap = snapshot();
        let env = EventEnvelope::new("push")
            .with_repository("org/specific-repo")
            .with_ref("refs/heads/main");
        let route = deliver(snap.route(&env));
        assert_eq!(route.destinations, vec!["team"]);
        assert_eq!(route.rule.unwrap().source.pattern.as_str(), "org/specific-repo");
    }

    #[test]
    fn filtered_event_is_skipped() {
        let snap = snapshot();
        let env = EventEnvelope::new("push")
            .with_repository("org/specific-repo")
            .with_ref("refs/heads/dev");
        assert_eq!(
            snap.route(&env),
            RouteDecision::Skip(SkipReason::EventFiltered {
                event: "push".to_string(),
                action: String::new(),
                reference: "refs/heads/dev".to_string(),
            })
        );
    }

    #[test]
    fn event_set_rule_uses_base_filters() {
        let snap = snapshot();
        let env = EventEnvelope::new("issues")
            .with_repository("org/other")
            .with_action("opened");
        let route = deliver(snap.route(&env));
        assert_eq!(route.destinations, vec!["org-bot", "team"]);

        let env = EventEnvelope::new("pull_request")
            .with_repository("org/other")
            .with_action("opened");
        assert!(snap.route(&env).is_skip(), "pull_request is not declared for org/*");
    }

    #[test]
    fn unmatched_repository_is_skipped() {
        let snap = snapshot();
        let env = EventEnvelope::new("push").with_repository("else/repo");
        assert!(matches!(
            snap.route(&env),
            RouteDecision::Skip(SkipReason::NoMatchingPattern { .. })
        ));
    }

    #[test]
    fn event_without_source_is_skipped() {
        let snap = snapshot();
        assert_eq!(
            snap.route(&EventEnvelope::new("push")),
            RouteDecision::Skip(SkipReason::NoSource)
        );
    }

    #[test]
    fn ping_bypasses_filters() {
        let snap = snapshot();
        let env = EventEnvelope::new("ping").with_repository("org/specific-repo");
        let route = deliver(snap.route(&env));
        assert_eq!(route.destinations, vec!["team"]);
    }

    #[test]
    fn organization_ping_fans_out_deduplicated() {
        let snap = snapshot();
        let env = EventEnvelope::new("ping").with_organization("org");
        let route = deliver(snap.route(&env));
        assert!(route.rule.is_none());
        assert_eq!(route.destinations, vec!["org-bot", "team", "audit"]);
    }

    #[test]
    fn organization_event_needs_a_rule() {
        let snap = snapshot();
        let env = EventEnvelope::new("member").with_organization("org");
        assert!(matches!(
            snap.route(&env),
            RouteDecision::Skip(SkipReason::UnfilteredOrganizationEvent { .. })
        ));

        let env = EventEnvelope::new("ping").with_organization("nobody");
        assert!(matches!(
            snap.route(&env),
            RouteDecision::Skip(SkipReason::NoOrganizationPatterns { .. })
        ));
    }
}
