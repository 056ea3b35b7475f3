//! Template catalogs: candidate output documents per event type.

use hookrelay_core::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Catalog name -> catalog (e.g. `"default"`, `"cn"`).
pub type TemplateCatalogs = IndexMap<String, TemplateCatalog>;

/// One set of templates covering many event types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateCatalog {
    #[serde(default)]
    pub templates: IndexMap<String, TemplateFamily>,
}

impl TemplateCatalog {
    pub fn family(&self, event: &str) -> Option<&TemplateFamily> {
        self.templates.get(event)
    }
}

/// Ordered candidate documents for one event type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateFamily {
    #[serde(default)]
    pub payloads: Vec<TemplateVariant>,
}

/// One candidate output document paired with its selector tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateVariant {
    #[serde(default)]
    pub tags: Vec<String>,
    pub payload: Value,
}
