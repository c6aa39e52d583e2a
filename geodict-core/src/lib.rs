//! Core domain types for the geodict gazetteer loader.
//!
//! The loader turns hierarchical geographic extracts (nodes, ways and
//! relations) into a flat relation of named entities with resolved point
//! geometries. This crate holds the pieces that do not touch I/O:
//!
//! - the element model decoded from the source stream ([`Element`]);
//! - coordinates and resolved geometries ([`Coordinate`], [`Geometry`]);
//! - the entity records written to the destination ([`EntityRecord`]);
//! - the storage seams ([`GeometryStore`], [`EntitySink`]); and
//! - the stream-adjacent [`Deduplicator`].
//!
//! Adapters that read files or talk to databases live in `geodict-data`.

#![forbid(unsafe_code)]

pub mod category;
pub mod dedup;
mod element;
mod entity;
mod geometry;
pub mod sink;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use category::{CATEGORY_KEYS, NAME_KEY, is_category_key};
pub use dedup::{Deduplicator, Observation};
pub use element::{ChildRef, Element, ElementId, ElementKey, ElementKind, UnknownElementKind};
pub use entity::{DEFAULT_SOURCE, EntityId, EntityIdentity, EntityRecord, EntityRecordError};
pub use geometry::{Coordinate, Geometry};
pub use sink::EntitySink;
pub use store::{GeometryStore, MemoryGeometryStore};
