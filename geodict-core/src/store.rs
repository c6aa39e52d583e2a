//! Geometry resolution store.
//!
//! The store maps a kind-scoped [`ElementKey`] to the [`Geometry`] resolved
//! for it. Pass 1 writes every element's geometry; later elements and Pass 2
//! only read. A missing key is not an error: source extracts are not
//! guaranteed to be referentially complete, so a dangling reference simply
//! contributes no coordinates.

use std::{collections::HashMap, convert::Infallible};

use crate::{ElementKey, Geometry};

/// Key-value storage for resolved geometries.
///
/// # Examples
///
/// ```rust
/// use geodict_core::{Coordinate, ElementKey, Geometry, GeometryStore, MemoryGeometryStore};
///
/// let mut store = MemoryGeometryStore::default();
/// let key = ElementKey::node(1);
/// store.put(key, &Geometry::point(Coordinate::new(51.5, -0.1))).unwrap();
///
/// assert_eq!(store.get(key).unwrap().len(), 1);
/// assert!(store.get(ElementKey::way(1)).unwrap().is_empty());
/// ```
pub trait GeometryStore {
    /// Error raised by the backing storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `geometry` under `key`, replacing any previous value.
    fn put(&mut self, key: ElementKey, geometry: &Geometry) -> Result<(), Self::Error>;

    /// Return the stored geometry, or `None` when `key` was never stored.
    fn lookup(&self, key: ElementKey) -> Result<Option<Geometry>, Self::Error>;

    /// Return the stored geometry, or an empty one when `key` is absent.
    fn get(&self, key: ElementKey) -> Result<Geometry, Self::Error> {
        Ok(self.lookup(key)?.unwrap_or_default())
    }

    /// Make every previous `put` visible to readers.
    ///
    /// Called at tier boundaries and at the end of Pass 1.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: GeometryStore + ?Sized> GeometryStore for &mut T {
    type Error = T::Error;

    fn put(&mut self, key: ElementKey, geometry: &Geometry) -> Result<(), Self::Error> {
        (**self).put(key, geometry)
    }

    fn lookup(&self, key: ElementKey) -> Result<Option<Geometry>, Self::Error> {
        (**self).lookup(key)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// In-process [`GeometryStore`] backed by a hash map.
///
/// Suitable for small extracts and tests; memory grows with the number of
/// stored keys.
#[derive(Debug, Default, Clone)]
pub struct MemoryGeometryStore {
    geometries: HashMap<ElementKey, Geometry>,
}

impl MemoryGeometryStore {
    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

impl GeometryStore for MemoryGeometryStore {
    type Error = Infallible;

    fn put(&mut self, key: ElementKey, geometry: &Geometry) -> Result<(), Self::Error> {
        self.geometries.insert(key, geometry.clone());
        Ok(())
    }

    fn lookup(&self, key: ElementKey) -> Result<Option<Geometry>, Self::Error> {
        Ok(self.geometries.get(&key).cloned())
    }
}
