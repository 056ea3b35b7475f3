//! Error types for snapshot building and template selection.

/// Errors that block a configuration snapshot from becoming active.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source or branch glob failed to compile.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// An event set lists a member with no base event definition.
    #[error("event set '{set}' references unknown base event '{event}'")]
    UnknownSetMember { set: String, event: String },

    /// A destination prefers a template catalog that was never supplied.
    #[error("destination '{destination}' references unknown template catalog '{catalog}'")]
    UnknownCatalog { destination: String, catalog: String },

    /// The fallback catalog is missing from the snapshot.
    #[error("default template catalog '{0}' is not configured")]
    MissingDefaultCatalog(String),
}

/// Result alias for snapshot operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Template selection failures. Recoverable per destination group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no template found for event type: {event}")]
    UnknownEvent { event: String },

    #[error("template for event type '{event}' declares no payloads")]
    EmptyFamily { event: String },

    #[error("template catalog '{catalog}' is not configured")]
    MissingCatalog { catalog: String },
}
