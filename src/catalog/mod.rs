//! Stream catalog module
//!
//! The connector knows a fixed tree of streams: `campaigns` at the top, with
//! `campaign_report` and `affiliate_sites` fetched per campaign. The tree is
//! declared in `definitions/streams.yaml`, validated on load and flattened so
//! that every child names its parent.
//!
//! Discovery turns the flattened catalog into a Singer catalog document, and
//! selection reads the user's choice back from one.

mod discover;
mod streams;

pub use discover::{discover, select_streams, Catalog, CatalogEntry, MetadataEntry};
pub use streams::{
    flatten_streams, validate, Endpoint, Stream, StreamCatalog, StreamDefinition,
    BUILTIN_STREAMS,
};
