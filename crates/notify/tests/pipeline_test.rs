//! Integration tests for the route → select → render → deliver pipeline.
//!
//! These tests load a complete rule configuration, feed raw webhook
//! payloads through `EventEnvelope::from_payload`, and check what a
//! recording sink receives, including behavior across a hot reload.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use hookrelay_core::EngineConfig;
use hookrelay_notify::{DispatchOutcome, Dispatcher, ExpressionRenderer, NotifyError, Sink};
use hookrelay_rules::{EventEnvelope, SkipReason, SnapshotConfig, SnapshotStore};

const CONFIG: &str = r#"
repos:
  - pattern: "acme/api"
    events:
      push:
        branches: [main, "release/*"]
      pull_request:
        types: [opened, closed]
    notify_to: [api-team, cn-team]
  - pattern: "acme/*"
    events:
      triage:
    notify_to: [acme-bot]
event_sets:
  triage: [issues, pull_request]
events:
  push:
    branches: ["*"]
  pull_request:
    types: [opened]
  issues:
    types: [opened, labeled]
destinations:
  - alias: api-team
    url: "https://hooks.example.com/api"
  - alias: cn-team
    url: "https://hooks.example.com/cn"
    template: cn
templates:
  default:
    templates:
      push:
        payloads:
          - tags: [push, default]
            payload:
              title: "{{ repository.full_name }}: {{ commits | length }} commit(s)"
              body: "{{#if head_commit}}Latest: {{ head_commit.message }}{{/if}}"
          - tags: [push, force]
            payload:
              title: "Force push to {{ repository.full_name }} by {{ sender.login }}"
      pull_request:
        payloads:
          - tags: [pull_request, opened]
            payload:
              title: "PR #{{ number }} opened: {{ pull_request.title }}"
          - tags: [pull_request, closed, merged]
            payload:
              title: "PR #{{ number }} merged by {{ pull_request.merged_by.login | default('someone') }}"
          - tags: [pull_request, closed, unmerged]
            payload:
              title: "PR #{{ number }} closed"
      issues:
        payloads:
          - tags: [issues, default]
            payload:
              title: "Issue: {{ issue.title }}"
          - tags: [issues, "type:bug"]
            payload:
              title: "Bug: {{ issue.title }} ({{ issue.assignee.login | default('unassigned') }})"
      ping:
        payloads:
          - tags: [ping]
            payload:
              title: "Webhook connected: {{ zen }}"
  cn:
    templates:
      push:
        payloads:
          - tags: [push]
            payload:
              title: "{{ repository.full_name }} 收到 {{ commits | length }} 个提交"
"#;

#[derive(Clone, Default)]
struct RecordingSink {
    delivered: Arc<Mutex<Vec<(Vec<String>, Value)>>>,
}

#[async_trait::async_trait]
impl Sink for RecordingSink {
    async fn deliver(&self, destinations: &[String], document: &Value) -> Result<(), NotifyError> {
        self.delivered
            .lock()
            .unwrap()
            .push((destinations.to_vec(), document.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn config() -> SnapshotConfig {
    serde_yaml::from_str(CONFIG).unwrap()
}

fn setup() -> (Dispatcher, RecordingSink) {
    let engine = EngineConfig::default();
    let store = SnapshotStore::from_config(
        config().with_default_template(engine.default_template.clone()),
    )
    .unwrap();
    let sink = RecordingSink::default();
    let dispatcher = Dispatcher::new(
        Arc::new(store),
        ExpressionRenderer::from_config(&engine),
        Box::new(sink.clone()),
    );
    (dispatcher, sink)
}

async fn run(dispatcher: &Dispatcher, event: &str, payload: &Value) -> DispatchOutcome {
    let envelope = EventEnvelope::from_payload(event, payload);
    dispatcher.dispatch(&envelope, payload).await
}

fn delivered(sink: &RecordingSink) -> Vec<(Vec<String>, Value)> {
    sink.delivered.lock().unwrap().clone()
}

#[tokio::test]
async fn push_renders_per_catalog_group() {
    let (dispatcher, sink) = setup();
    let payload = json!({
        "ref": "refs/heads/main",
        "repository": {"full_name": "acme/api"},
        "sender": {"login": "alice"},
        "commits": [{"id": "1"}, {"id": "2"}],
        "head_commit": {"message": "fix: flaky test"}
    });

    let outcome = run(&dispatcher, "push", &payload).await;
    assert!(outcome.results().iter().all(|r| r.success));

    let delivered = delivered(&sink);
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].0, vec!["api-team"]);
    assert_eq!(
        delivered[0].1,
        json!({"title": "acme/api: 2 commit(s)", "body": "Latest: fix: flaky test"})
    );
    assert_eq!(delivered[1].0, vec!["cn-team"]);
    assert_eq!(delivered[1].1, json!({"title": "acme/api 收到 2 个提交"}));
}

#[tokio::test]
async fn force_push_prefers_force_variant() {
    let (dispatcher, sink) = setup();
    let payload = json!({
        "ref": "refs/heads/release/2.0",
        "forced": true,
        "repository": {"full_name": "acme/api"},
        "sender": {"login": "bob"},
        "commits": []
    });

    run(&dispatcher, "push", &payload).await;
    let delivered = delivered(&sink);
    assert_eq!(
        delivered[0].1,
        json!({"title": "Force push to acme/api by bob"})
    );
}

#[tokio::test]
async fn push_to_unlisted_branch_is_skipped() {
    let (dispatcher, sink) = setup();
    let payload = json!({
        "ref": "refs/heads/feature/x",
        "repository": {"full_name": "acme/api"}
    });

    let outcome = run(&dispatcher, "push", &payload).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Skipped(SkipReason::EventFiltered { .. })
    ));
    assert!(delivered(&sink).is_empty());
}

#[tokio::test]
async fn merged_pull_request_selects_merged_variant() {
    let (dispatcher, sink) = setup();
    let payload = json!({
        "action": "closed",
        "number": 42,
        "repository": {"full_name": "acme/api"},
        "pull_request": {"merged": true, "title": "Add cache", "base": {"ref": "main"}}
    });

    run(&dispatcher, "pull_request", &payload).await;
    let delivered = delivered(&sink);
    assert_eq!(delivered[0].1, json!({"title": "PR #42 merged by someone"}));
}

#[tokio::test]
async fn event_set_uses_base_filters() {
    let (dispatcher, sink) = setup();
    let labeled_bug = json!({
        "action": "labeled",
        "repository": {"full_name": "acme/web"},
        "issue": {"title": "Crash on save", "labels": [{"name": "bug"}]},
        "label": {"name": "bug"}
    });
    run(&dispatcher, "issues", &labeled_bug).await;

    let closed = json!({
        "action": "closed",
        "repository": {"full_name": "acme/web"},
        "issue": {"title": "Old"}
    });
    let outcome = run(&dispatcher, "issues", &closed).await;
    assert!(matches!(outcome, DispatchOutcome::Skipped(_)));

    let delivered = delivered(&sink);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, vec!["acme-bot"]);
    assert_eq!(
        delivered[0].1,
        json!({"title": "Bug: Crash on save (unassigned)"})
    );
}

#[tokio::test]
async fn organization_ping_fans_out() {
    let (dispatcher, sink) = setup();
    let payload = json!({"zen": "Keep it simple.", "organization": {"login": "acme"}});

    let outcome = run(&dispatcher, "ping", &payload).await;
    assert_eq!(outcome.results().len(), 1);
    let delivered = delivered(&sink);
    assert_eq!(delivered[0].0, vec!["acme-bot"]);
    assert_eq!(
        delivered[0].1,
        json!({"title": "Webhook connected: Keep it simple."})
    );
}

#[tokio::test]
async fn reload_changes_routing_for_new_events() {
    let (dispatcher, sink) = setup();
    let payload = json!({
        "ref": "refs/heads/main",
        "repository": {"full_name": "acme/api"},
        "commits": []
    });

    let mut updated = config();
    updated.repos[0].notify_to = vec!["api-team".to_string()];
    assert!(dispatcher.store().reload(updated).unwrap());

    run(&dispatcher, "push", &payload).await;
    let delivered = delivered(&sink);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, vec!["api-team"]);
}
