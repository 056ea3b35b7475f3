use std::env;

use serde::{Deserialize, Serialize};

/// Default cap on nested `#if` blocks and nested `default(...)` arguments.
pub const DEFAULT_MAX_RENDER_DEPTH: usize = 128;

/// Template catalog used by destinations that declare no preference.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

// ── Engine config ─────────────────────────────────────────────

/// Runtime knobs for the matching and rendering engine.
///
/// Rule and template documents are supplied by the configuration loader;
/// this struct only carries process-level settings read from the
/// environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Maximum recursion depth for nested conditionals and `default(...)`.
    pub max_render_depth: usize,
    /// Catalog name used when a destination has no template preference.
    pub default_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            max_render_depth: DEFAULT_MAX_RENDER_DEPTH,
            default_template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `HOOKRELAY_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("HOOKRELAY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            max_render_depth: profiled_env_usize(
                p,
                "HOOKRELAY_MAX_RENDER_DEPTH",
                DEFAULT_MAX_RENDER_DEPTH,
            ),
            default_template: profiled_env_or(p, "HOOKRELAY_DEFAULT_TEMPLATE", DEFAULT_TEMPLATE),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Engine config loaded (profile: {}):", self.profile_label());
        tracing::info!("  render:    max_depth={}", self.max_render_depth);
        tracing::info!("  templates: default={}", self.default_template);
    }
}
