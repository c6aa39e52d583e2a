//! Facade crate for the geodict gazetteer loader.
//!
//! This crate re-exports the core domain types and, behind the
//! `store-sqlite` feature, the OSM loader with its SQLite geometry store and
//! destination writer.

#![forbid(unsafe_code)]

pub use geodict_core::{
    CATEGORY_KEYS, ChildRef, Coordinate, DEFAULT_SOURCE, Deduplicator, Element, ElementId,
    ElementKey, ElementKind, EntityId, EntityRecord, EntityRecordError, EntitySink, Geometry,
    GeometryStore, MemoryGeometryStore, Observation, is_category_key,
};

#[cfg(feature = "test-support")]
pub use geodict_core::test_support;

#[cfg(feature = "store-sqlite")]
pub use geodict_data::{
    DEFAULT_BATCH_SIZE, LoadOptions, OsmLoadError, OsmLoadReport, ReadError, SqliteEntitySink,
    SqliteEntitySinkError, SqliteGeometryStore, SqliteGeometryStoreError, initialise_destination,
    load_osm_extract, load_osm_extract_to_sqlite,
};

#[cfg(feature = "store-sqlite")]
pub use geodict_data::osm;
