//! Test-only, in-memory `EntitySink` implementation used by unit and
//! behaviour tests.

use std::convert::Infallible;

use crate::{EntityId, EntityRecord, EntitySink, Geometry};

/// An entity captured by [`RecordingSink`], with every point appended to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntity {
    /// Identity handed back to the caller.
    pub id: EntityId,
    /// Attributes as passed to `create_entity`; its geometry is the
    /// concatenation of every `append_locations` call.
    pub record: EntityRecord,
}

/// In-memory `EntitySink` that keeps entities in creation order.
///
/// Identifiers start at one and follow creation order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entities: Vec<RecordedEntity>,
    finished: bool,
}

impl RecordingSink {
    /// Entities in creation order.
    #[must_use]
    pub fn entities(&self) -> &[RecordedEntity] {
        &self.entities
    }

    /// Names in creation order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entities
            .iter()
            .map(|entity| entity.record.name.as_str())
            .collect()
    }

    /// Total number of location rows appended.
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.entities
            .iter()
            .map(|entity| entity.record.geometry.len())
            .sum()
    }

    /// Whether `finish` has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

impl EntitySink for RecordingSink {
    type Error = Infallible;

    fn create_entity(&mut self, record: &EntityRecord) -> Result<EntityId, Self::Error> {
        let id = EntityId(i64::try_from(self.entities.len()).unwrap_or(i64::MAX - 1) + 1);
        let stored = record.clone().with_geometry(Geometry::new());
        self.entities.push(RecordedEntity { id, record: stored });
        Ok(id)
    }

    fn append_locations(
        &mut self,
        entity: EntityId,
        geometry: &Geometry,
    ) -> Result<(), Self::Error> {
        if let Some(found) = self.entities.iter_mut().find(|e| e.id == entity) {
            found.record.geometry.extend_from(geometry);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinate;
    use rstest::rstest;

    #[rstest]
    fn appends_accumulate_on_the_named_entity() {
        let mut sink = RecordingSink::default();
        let first = EntityRecord::new("A", "test").expect("valid name");
        let id = sink.create_entity(&first).expect("infallible");
        let point = Geometry::point(Coordinate::new(1.0, 2.0));
        sink.append_locations(id, &point).expect("infallible");
        sink.append_locations(id, &point).expect("infallible");

        assert_eq!(id, EntityId(1));
        assert_eq!(sink.location_count(), 2);
        assert!(!sink.is_finished());
    }
}
