//! Routes events to destination groups and delivers rendered documents.
//!
//! For each event the dispatcher takes the active snapshot, routes the event,
//! groups the matched destinations by preferred template catalog, then
//! selects and renders one document per group. Individual group failures
//! (selection or delivery) don't block other groups.

use std::sync::Arc;
use std::time::Instant;

use hookrelay_core::Value;
use hookrelay_rules::{
    EventEnvelope, RouteDecision, SelectionError, SkipReason, SnapshotConfig, SnapshotStore,
};

use crate::templating::{ExpressionRenderer, Rendered};
use crate::traits::{DispatchResult, NotifyError, Sink};

/// One destination group ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGroup {
    pub catalog: String,
    pub destinations: Vec<String>,
    pub rendered: Result<Rendered, SelectionError>,
}

/// Synchronous routing and rendering result for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Skip(SkipReason),
    Deliver(Vec<PlannedGroup>),
}

/// What happened to one event.
#[derive(Debug)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Dispatched(Vec<DispatchResult>),
}

impl DispatchOutcome {
    /// Per-group results; empty when the event was skipped.
    pub fn results(&self) -> &[DispatchResult] {
        match self {
            Self::Skipped(_) => &[],
            Self::Dispatched(results) => results,
        }
    }
}

/// Dispatches rendered documents to a sink, one delivery per catalog group.
pub struct Dispatcher {
    store: Arc<SnapshotStore>,
    renderer: ExpressionRenderer,
    sink: Box<dyn Sink>,
}

impl Dispatcher {
    pub fn new(store: Arc<SnapshotStore>, renderer: ExpressionRenderer, sink: Box<dyn Sink>) -> Self {
        Self {
            store,
            renderer,
            sink,
        }
    }

    /// The snapshot store this dispatcher reads from (e.g., for hot-reload).
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Rebuild the routing snapshot from `config` and swap it in.
    ///
    /// Returns `true` when the new snapshot differs from the active one. On
    /// error the active snapshot keeps serving events.
    pub fn reload(&self, config: SnapshotConfig) -> Result<bool, NotifyError> {
        match self.store.reload(config) {
            Ok(changed) => Ok(changed),
            Err(e) => {
                tracing::warn!(sink = self.sink.name(), error = %e, "configuration reload rejected");
                Err(e.into())
            }
        }
    }

    /// Route, select and render without delivering.
    pub fn plan(&self, envelope: &EventEnvelope, context: &Value) -> Plan {
        let snapshot = self.store.load();

        let route = match snapshot.route(envelope) {
            RouteDecision::Skip(reason) => {
                tracing::debug!(event = %envelope.event, %reason, "event skipped");
                return Plan::Skip(reason);
            }
            RouteDecision::Deliver(route) => route,
        };

        let groups = snapshot
            .group_by_catalog(&route.destinations)
            .into_iter()
            .map(|(catalog, destinations)| {
                let rendered = snapshot
                    .select(&catalog, envelope)
                    .map(|variant| self.renderer.render_with_diagnostics(&variant.payload, context));
                PlannedGroup {
                    catalog,
                    destinations,
                    rendered,
                }
            })
            .collect();

        Plan::Deliver(groups)
    }

    /// Plan and deliver an event to every destination group.
    ///
    /// Returns results for each group. Individual failures don't block
    /// other groups.
    pub async fn dispatch(&self, envelope: &EventEnvelope, context: &Value) -> DispatchOutcome {
        let groups = match self.plan(envelope, context) {
            Plan::Skip(reason) => return DispatchOutcome::Skipped(reason),
            Plan::Deliver(groups) => groups,
        };

        if groups.is_empty() {
            tracing::debug!(event = %envelope.event, "No destinations configured");
        }

        let mut results = Vec::with_capacity(groups.len());

        for group in groups {
            let start = Instant::now();
            let result = match &group.rendered {
                Ok(rendered) => {
                    self.sink
                        .deliver(&group.destinations, &rendered.document)
                        .await
                }
                Err(e) => Err(NotifyError::Selection(e.clone())),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        event = %envelope.event,
                        sink = self.sink.name(),
                        catalog = %group.catalog,
                        destinations = group.destinations.len(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        event = %envelope.event,
                        sink = self.sink.name(),
                        catalog = %group.catalog,
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                sink: self.sink.name().to_string(),
                catalog: group.catalog,
                destinations: group.destinations,
                success,
                error,
                duration_ms,
            });
        }

        DispatchOutcome::Dispatched(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const CONFIG: &str = r#"
repos:
  - pattern: "org/repo"
    events:
      push:
      issues:
    notify_to: [team-bot, cn-bot, fr-bot]
  - pattern: "org/*"
    notify_to: [org-bot]
events:
  push:
  issues:
destinations:
  - alias: cn-bot
    template: cn
  - alias: fr-bot
    template: fr
templates:
  default:
    templates:
      push:
        payloads:
          - tags: [push, default]
            payload: { text: "{{ sender.login }} pushed to {{ repository.full_name }}" }
  cn:
    templates:
      push:
        payloads:
          - tags: [push]
            payload: { text: "{{ sender.login }} 推送到 {{ repository.full_name }}" }
  fr:
    templates:
      issues:
        payloads:
          - tags: [issues]
            payload: { text: "ticket" }
"#;

    struct MockSink {
        name: String,
        send_count: Arc<AtomicUsize>,
        delivered: Arc<Mutex<Vec<(Vec<String>, Value)>>>,
        should_fail: bool,
    }

    impl MockSink {
        fn new(should_fail: bool) -> Self {
            Self {
                name: "mock".to_string(),
                send_count: Arc::new(AtomicUsize::new(0)),
                delivered: Arc::new(Mutex::new(Vec::new())),
                should_fail,
            }
        }
    }

    #[async_trait::async_trait]
    impl Sink for MockSink {
        async fn deliver(&self, destinations: &[String], document: &Value) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(NotifyError::Delivery("mock failure".to_string()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((destinations.to_vec(), document.clone()));
            Ok(())
        }
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn store() -> Arc<SnapshotStore> {
        let config: SnapshotConfig = serde_yaml::from_str(CONFIG).unwrap();
        Arc::new(SnapshotStore::from_config(config).unwrap())
    }

    fn push_context() -> Value {
        json!({
            "ref": "refs/heads/main",
            "repository": {"full_name": "org/repo"},
            "sender": {"login": "alice"}
        })
    }

    fn push_envelope() -> EventEnvelope {
        EventEnvelope::from_payload("push", &push_context())
    }

    #[test]
    fn plan_groups_by_catalog() {
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(MockSink::new(false)));
        let Plan::Deliver(groups) = dispatcher.plan(&push_envelope(), &push_context()) else {
            panic!("expected delivery");
        };
        let catalogs: Vec<&str> = groups.iter().map(|g| g.catalog.as_str()).collect();
        assert_eq!(catalogs, vec!["default", "cn", "fr"]);

        let default = groups[0].rendered.as_ref().unwrap();
        assert_eq!(default.document, json!({"text": "alice pushed to org/repo"}));
        assert!(default.unresolved.is_empty());
        assert_eq!(
            groups[1].rendered.as_ref().unwrap().document,
            json!({"text": "alice 推送到 org/repo"})
        );
        assert_eq!(
            groups[2].rendered,
            Err(SelectionError::UnknownEvent {
                event: "push".to_string()
            })
        );
    }

    #[test]
    fn plan_skips_unmatched_repository() {
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(MockSink::new(false)));
        let envelope = EventEnvelope::new("push").with_repository("else/repo");
        assert!(matches!(
            dispatcher.plan(&envelope, &json!({})),
            Plan::Skip(SkipReason::NoMatchingPattern { .. })
        ));
    }

    #[tokio::test]
    async fn dispatch_to_all_groups() {
        let sink = MockSink::new(false);
        let count = sink.send_count.clone();
        let delivered = sink.delivered.clone();
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(sink));

        let outcome = dispatcher.dispatch(&push_envelope(), &push_context()).await;
        let results = outcome.results();
        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(results[1].success);
        assert!(!results[2].success, "fr catalog has no push template");
        assert!(results[2].error.as_deref().unwrap().contains("push"));
        assert_eq!(count.load(Ordering::SeqCst), 2); // selection failure never reaches the sink

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered[0].0, vec!["team-bot"]);
        assert_eq!(delivered[1].0, vec!["cn-bot"]);
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let sink = MockSink::new(true);
        let count = sink.send_count.clone();
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(sink));

        let outcome = dispatcher.dispatch(&push_envelope(), &push_context()).await;
        let results = outcome.results();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.success));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(results[0].error.as_deref(), Some("Delivery failed: mock failure"));
    }

    #[tokio::test]
    async fn skipped_event_returns_reason() {
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(MockSink::new(false)));
        let outcome = dispatcher.dispatch(&EventEnvelope::new("push"), &json!({})).await;
        assert!(matches!(outcome, DispatchOutcome::Skipped(SkipReason::NoSource)));
        assert!(outcome.results().is_empty());
    }

    #[test]
    fn reload_rejects_bad_config_and_keeps_snapshot() {
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(MockSink::new(false)));
        let before = dispatcher.store().load();

        let config: SnapshotConfig = serde_yaml::from_str(CONFIG).unwrap();
        let err = dispatcher
            .reload(config.with_default_template("missing"))
            .unwrap_err();
        assert!(matches!(
            err,
            NotifyError::Config(hookrelay_rules::ConfigError::MissingDefaultCatalog(ref name)) if name == "missing"
        ));
        assert!(err.to_string().starts_with("Configuration error: "));
        assert!(Arc::ptr_eq(&before, &dispatcher.store().load()));

        let mut config: SnapshotConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.repos[0].notify_to = vec!["team-bot".to_string()];
        assert!(dispatcher.reload(config).unwrap());
        let Plan::Deliver(groups) = dispatcher.plan(&push_envelope(), &push_context()) else {
            panic!("expected delivery");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].destinations, vec!["team-bot"]);
    }

    #[tokio::test]
    async fn ping_without_template_reports_selection_error() {
        let sink = MockSink::new(false);
        let count = sink.send_count.clone();
        let dispatcher = Dispatcher::new(store(), ExpressionRenderer::default(), Box::new(sink));

        let envelope = EventEnvelope::new("ping").with_repository("org/empty");
        let outcome = dispatcher.dispatch(&envelope, &json!({})).await;
        let results = outcome.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].destinations, vec!["org-bot"]);
        assert!(!results[0].success);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
