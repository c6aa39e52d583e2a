//! Destination writer contract.

use crate::{EntityId, EntityRecord, Geometry};

/// Destination for retained entities and their locations.
///
/// The caller creates an entity first and then appends its points, possibly
/// over several calls when adjacent source elements continue the same
/// entity. Implementations own their transaction boundaries; `finish` must
/// commit anything still pending.
pub trait EntitySink {
    /// Error raised by the destination.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the descriptive attributes of `record` and return the
    /// identity assigned by the destination.
    ///
    /// The record's geometry is not written here; see
    /// [`EntitySink::append_locations`].
    fn create_entity(&mut self, record: &EntityRecord) -> Result<EntityId, Self::Error>;

    /// Append one location row per coordinate of `geometry` to `entity`.
    fn append_locations(&mut self, entity: EntityId, geometry: &Geometry)
    -> Result<(), Self::Error>;

    /// Commit outstanding writes.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: EntitySink + ?Sized> EntitySink for &mut T {
    type Error = T::Error;

    fn create_entity(&mut self, record: &EntityRecord) -> Result<EntityId, Self::Error> {
        (**self).create_entity(record)
    }

    fn append_locations(
        &mut self,
        entity: EntityId,
        geometry: &Geometry,
    ) -> Result<(), Self::Error> {
        (**self).append_locations(entity, geometry)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}
