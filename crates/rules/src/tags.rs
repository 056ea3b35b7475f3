//! Selector tag derivation from raw event payloads.
//!
//! The tag list always starts with the event name, followed by the payload
//! `action` when present, then event-specific outcome tags. Events that end
//! up with at most two tags get a trailing `"default"` so catch-all
//! template variants can score.

use hookrelay_core::Value;

/// Tag appended when nothing more specific was derived.
pub const DEFAULT_TAG: &str = "default";

/// Derive the ordered selector tags for an event.
pub fn derive_tags(event: &str, payload: &Value) -> Vec<String> {
    let mut tags = vec![event.to_string()];

    let action = str_field(payload, "action").filter(|a| !a.is_empty());
    if let Some(action) = action {
        tags.push(action.to_string());
    }

    match event {
        "push" => {
            let forced = payload.get("forced").and_then(Value::as_bool) == Some(true);
            tags.push(if forced { "force" } else { DEFAULT_TAG }.to_string());
        }
        "pull_request" => {
            if action == Some("closed") {
                if let Some(pr) = payload.get("pull_request").filter(|v| v.is_object()) {
                    let merged = pr.get("merged").and_then(Value::as_bool) == Some(true);
                    tags.push("closed".to_string());
                    tags.push(if merged { "merged" } else { "unmerged" }.to_string());
                }
            }
        }
        "issues" => issue_tags(payload, action, &mut tags),
        "workflow_run" => completion_tags(payload.get("workflow_run"), &mut tags),
        "check_run" => completion_tags(payload.get("check_run"), &mut tags),
        "workflow_job" => status_tags(payload.get("workflow_job"), &mut tags),
        "check_suite" => status_tags(payload.get("check_suite"), &mut tags),
        _ => {}
    }

    if tags.len() <= 2 {
        tags.push(DEFAULT_TAG.to_string());
    }

    tracing::debug!(event, ?tags, "derived selector tags");
    tags
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn non_empty<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a str> {
    value
        .and_then(|v| str_field(v, key))
        .filter(|s| !s.is_empty())
}

/// `status`, plus `conclusion` once the run is completed.
fn completion_tags(run: Option<&Value>, tags: &mut Vec<String>) {
    if let Some(status) = non_empty(run, "status") {
        tags.push(status.to_string());
        if status == "completed" {
            if let Some(conclusion) = non_empty(run, "conclusion") {
                tags.push(conclusion.to_string());
            }
        }
    }
}

/// `status` and `conclusion`, each when present.
fn status_tags(run: Option<&Value>, tags: &mut Vec<String>) {
    if let Some(status) = non_empty(run, "status") {
        tags.push(status.to_string());
    }
    if let Some(conclusion) = non_empty(run, "conclusion") {
        tags.push(conclusion.to_string());
    }
}

fn issue_tags(payload: &Value, action: Option<&str>, tags: &mut Vec<String>) {
    let issue = payload.get("issue").filter(|v| v.is_object());

    let explicit_type = issue
        .and_then(|i| i.get("type"))
        .and_then(|t| str_field(t, "name"))
        .filter(|n| !n.is_empty())
        .or_else(|| {
            payload
                .get("type")
                .and_then(|t| str_field(t, "name"))
                .filter(|n| !n.is_empty())
        });

    if let Some(name) = explicit_type {
        let lower = name.to_lowercase();
        let kind = classify_issue_kind(&lower).map_or(lower, str::to_string);
        tags.push(format!("type:{kind}"));
    } else {
        match issue.and_then(|i| i.get("labels")).and_then(Value::as_array) {
            Some(labels) => {
                let kind = labels
                    .iter()
                    .filter_map(|l| str_field(l, "name"))
                    .find_map(|name| classify_issue_kind(&name.to_lowercase()))
                    .unwrap_or("unknown");
                tags.push(format!("type:{kind}"));
                for name in labels.iter().filter_map(|l| str_field(l, "name")) {
                    if !name.is_empty() {
                        tags.push(format!("label:{}", sanitize_label(name)));
                    }
                }
            }
            None => tags.push("type:unknown".to_string()),
        }
    }

    if let Some(name) = payload
        .get("label")
        .and_then(|l| str_field(l, "name"))
        .filter(|n| !n.is_empty())
    {
        let label = sanitize_label(name);
        tags.push(format!("label:{label}"));
        if action == Some("labeled") {
            tags.push("labeled".to_string());
            tags.push(format!("labeled:{label}"));
        }
    }
}

fn classify_issue_kind(lower: &str) -> Option<&'static str> {
    if lower.contains("bug") {
        Some("bug")
    } else if lower.contains("feature") {
        Some("feature")
    } else if lower.contains("task") {
        Some("task")
    } else {
        None
    }
}

/// Lowercase, spaces to underscores, keep only `[a-z0-9_-]`.
pub fn sanitize_label(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}
