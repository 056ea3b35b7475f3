//! Immutable per-epoch configuration snapshots.
//!
//! A [`SnapshotConfig`] is the raw bundle handed over by the configuration
//! loader. [`SnapshotConfig::build`] validates it and pre-expands every
//! source pattern's events, producing a [`Snapshot`] that is never mutated
//! afterwards. Reloads build a fresh snapshot and swap it into a
//! [`SnapshotStore`].

mod store;


use hookrelay_core::config::DEFAULT_TEMPLATE;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::envelope::EventEnvelope;
use crate::error::{ConfigError, Result, SelectionError};
use crate::matcher::{expand_events, match_repo};
use crate::schema::{
    BaseEvents, Destination, EventSets, ExpandedEventConfig, SourcePattern, TemplateCatalog,
    TemplateCatalogs, TemplateVariant,
};
use crate::selector::select_template;

pub use self::store::SnapshotStore;

fn default_template_name() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Unvalidated configuration as supplied by the loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub repos: Vec<SourcePattern>,
    #[serde(default)]
    pub event_sets: EventSets,
    #[serde(default)]
    pub events: BaseEvents,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub templates: TemplateCatalogs,
    #[serde(default = "default_template_name")]
    pub default_template: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            event_sets: EventSets::new(),
            events: BaseEvents::new(),
            destinations: Vec::new(),
            templates: TemplateCatalogs::new(),
            default_template: default_template_name(),
        }
    }
}

impl SnapshotConfig {
    /// Override the fallback catalog name (usually from `EngineConfig`).
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }

    /// Validate and compile into an immutable [`Snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the default catalog is missing, an event
    /// set names an unknown base event, or a destination prefers an unknown
    /// catalog. Invalid globs never reach this point: they fail when the
    /// configuration is deserialized.
    pub fn build(self) -> Result<Snapshot> {
        let SnapshotConfig {
            repos,
            event_sets,
            events,
            destinations,
            templates,
            default_template,
        } = self;

        if !templates.contains_key(&default_template) {
            return Err(ConfigError::MissingDefaultCatalog(default_template));
        }

        for (name, set) in &event_sets {
            if let Some(missing) = set.members().iter().find(|m| !events.contains_key(*m)) {
                return Err(ConfigError::UnknownSetMember {
                    set: name.clone(),
                    event: missing.clone(),
                });
            }
        }

        let mut profiles = IndexMap::with_capacity(destinations.len());
        for dest in destinations {
            if let Some(catalog) = &dest.template {
                if !templates.contains_key(catalog) {
                    return Err(ConfigError::UnknownCatalog {
                        destination: dest.alias.clone(),
                        catalog: catalog.clone(),
                    });
                }
            }
            if let Some(previous) = profiles.insert(dest.alias.clone(), dest) {
                warn!(alias = %previous.alias, "duplicate destination profile, keeping the later one");
            }
        }

        let rules = repos
            .into_iter()
            .map(|source| -> Result<CompiledRule> {
                let expanded = expand_events(&source.events, &event_sets, &events)?;
                Ok(CompiledRule {
                    source,
                    events: expanded,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            rules = rules.len(),
            event_sets = event_sets.len(),
            base_events = events.len(),
            catalogs = templates.len(),
            "built configuration snapshot"
        );

        Ok(Snapshot {
            rules,
            event_sets,
            base_events: events,
            destinations: profiles,
            catalogs: templates,
            default_template,
        })
    }
}

/// A source pattern together with its pre-expanded event filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub source: SourcePattern,
    pub events: ExpandedEventConfig,
}

/// Validated, immutable configuration for one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    rules: Vec<CompiledRule>,
    event_sets: EventSets,
    base_events: BaseEvents,
    destinations: IndexMap<String, Destination>,
    catalogs: TemplateCatalogs,
    default_template: String,
}

impl Snapshot {
    /// Rules in declaration order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn patterns(&self) -> impl Iterator<Item = &SourcePattern> {
        self.rules.iter().map(|r| &r.source)
    }

    pub fn event_sets(&self) -> &EventSets {
        &self.event_sets
    }

    pub fn base_events(&self) -> &BaseEvents {
        &self.base_events
    }

    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    /// First rule whose source pattern matches.
    pub fn match_source(&self, source: &str) -> Option<&CompiledRule> {
        match_repo(source, self.patterns()).map(|(index, _)| &self.rules[index])
    }

    /// Catalog name preferred by a destination, or the default.
    pub fn catalog_name_for(&self, destination: &str) -> &str {
        self.destinations
            .get(destination)
            .and_then(|d| d.template.as_deref())
            .unwrap_or(&self.default_template)
    }

    /// Look up a catalog, falling back to the default catalog.
    pub fn catalog(&self, name: &str) -> Option<&TemplateCatalog> {
        self.catalogs
            .get(name)
            .or_else(|| self.catalogs.get(&self.default_template))
    }

    /// Group destinations by preferred catalog, keeping first-seen order.
    pub fn group_by_catalog(&self, destinations: &[String]) -> IndexMap<String, Vec<String>> {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for dest in destinations {
            groups
                .entry(self.catalog_name_for(dest).to_string())
                .or_default()
                .push(dest.clone());
        }
        groups
    }

    /// Select the template variant for an event from the named catalog.
    pub fn select(
        &self,
        catalog: &str,
        envelope: &EventEnvelope,
    ) -> std::result::Result<&TemplateVariant, SelectionError> {
        let templates = self
            .catalog(catalog)
            .ok_or_else(|| SelectionError::MissingCatalog {
                catalog: catalog.to_string(),
            })?;
        select_template(&envelope.event, &envelope.tags, templates)
    }
}
