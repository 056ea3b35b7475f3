//! Serde schema for relay configuration documents.
//!
//! Defines the per-epoch configuration entities:
//! - `SourcePattern`: glob over source identifiers with declared events and destinations
//! - `EventSet`: named alias expanding to several base events
//! - `FilterSpec`: branch and action-type filters for a single event
//! - `TemplateCatalog`: event name -> ordered template variants
//! - `Destination`: destination alias with its template catalog preference

mod destination;
mod event_set;
mod filters;
mod source;
mod templates;

pub use destination::*;
pub use event_set::*;
pub use filters::*;
pub use source::*;
pub use templates::*;
