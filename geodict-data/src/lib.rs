//! Data access and loading logic for the geodict gazetteer.
//!
//! Responsibilities:
//! - Decode OSM XML extracts (plain, bzip2 or gzip) as a lazy element stream.
//! - Run the two loading passes: geometry resolution, then entity emission.
//! - Provide SQLite adapters for the geometry store and the destination.
//!
//! Boundaries:
//! - Domain types and the deduplication policy live in `geodict-core`.
//! - Process wiring and configuration live in `geodict-cli`.
//!
//! Invariants:
//! - Memory per element is bounded; no document tree is ever built.
//! - A tier is flushed to the geometry store before the next tier reads it.
//! - No global mutable state.

mod batch;
pub mod destination;
pub mod geometry_store;
pub mod osm;

pub use destination::{
    DEFAULT_BATCH_SIZE, DestinationSchemaError, SqliteEntitySink, SqliteEntitySinkError,
    initialise_destination,
};
pub use geometry_store::{SqliteGeometryStore, SqliteGeometryStoreError};
pub use osm::{
    LoadOptions, OsmLoadError, OsmLoadReport, ReadError, load_osm_extract,
    load_osm_extract_to_sqlite,
};
