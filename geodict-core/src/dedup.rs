//! Collapsing of immediately consecutive entities.
//!
//! Source extracts often split one named area over many consecutive raw
//! elements. The [`Deduplicator`] remembers only the most recently retained
//! entity: a record whose `(name, category, subcategory)` triple matches it
//! continues that entity, anything else starts a new one. Identical records
//! separated by a different one stay distinct.
//!
//! The state is an explicit value threaded through the Pass 2 consumer, so
//! it can be tested in isolation and must be driven in stream order.

use crate::{EntityId, EntityIdentity, EntityRecord};

/// Outcome of observing one retained record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A new destination entity was created.
    Created(EntityId),
    /// The record continues the previous entity.
    Continued(EntityId),
}

impl Observation {
    /// The destination entity the record's points belong to.
    #[must_use]
    pub const fn entity(self) -> EntityId {
        match self {
            Self::Created(id) | Self::Continued(id) => id,
        }
    }

    /// Whether a new entity was created.
    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Debug, Clone)]
struct Pending {
    identity: EntityIdentity,
    entity: EntityId,
}

/// Two-state machine: no pending entity, or one awaiting comparison.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use geodict_core::{Deduplicator, EntityId, EntityRecord, Observation};
///
/// let mut dedup = Deduplicator::new();
/// let mut next_id = 0;
/// let mut create = |_: &EntityRecord| -> Result<EntityId, Infallible> {
///     next_id += 1;
///     Ok(EntityId(next_id))
/// };
/// let river = EntityRecord::new("Thames", "OpenStreetMap").unwrap();
///
/// assert_eq!(dedup.observe(&river, &mut create), Ok(Observation::Created(EntityId(1))));
/// assert_eq!(dedup.observe(&river, &mut create), Ok(Observation::Continued(EntityId(1))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    pending: Option<Pending>,
}

impl Deduplicator {
    /// Start with no pending entity.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Classify `record` against the previous retained record.
    ///
    /// `create` runs only when a new entity is needed; its identity then
    /// becomes the pending one. A failing `create` leaves the state
    /// untouched.
    pub fn observe<F, E>(&mut self, record: &EntityRecord, create: F) -> Result<Observation, E>
    where
        F: FnOnce(&EntityRecord) -> Result<EntityId, E>,
    {
        if let Some(pending) = &self.pending
            && pending.identity.matches(record)
        {
            return Ok(Observation::Continued(pending.entity));
        }

        let entity = create(record)?;
        self.pending = Some(Pending {
            identity: record.identity(),
            entity,
        });
        Ok(Observation::Created(entity))
    }

    /// Identity of the pending entity, if any.
    #[must_use]
    pub fn pending(&self) -> Option<EntityId> {
        self.pending.as_ref().map(|pending| pending.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::convert::Infallible;

    #[derive(Debug, Default)]
    struct Counter {
        next: i64,
    }

    impl Counter {
        fn create(&mut self, _record: &EntityRecord) -> Result<EntityId, Infallible> {
            self.next += 1;
            Ok(EntityId(self.next))
        }
    }

    #[fixture]
    fn counter() -> Counter {
        Counter::default()
    }

    fn record(name: &str, category: &str, subcategory: &str) -> EntityRecord {
        EntityRecord::new(name, "OpenStreetMap")
            .expect("valid name")
            .with_category(category, subcategory)
    }

    fn run(records: &[EntityRecord], counter: &mut Counter) -> Vec<Observation> {
        let mut dedup = Deduplicator::new();
        records
            .iter()
            .map(|entry| {
                dedup
                    .observe(entry, |r| counter.create(r))
                    .expect("infallible")
            })
            .collect()
    }

    #[rstest]
    fn adjacent_matches_continue(mut counter: Counter) {
        let records = [
            record("X", "a", "b"),
            record("X", "a", "b"),
            record("Y", "a", "b"),
        ];
        let observed = run(&records, &mut counter);
        assert_eq!(
            observed,
            vec![
                Observation::Created(EntityId(1)),
                Observation::Continued(EntityId(1)),
                Observation::Created(EntityId(2)),
            ]
        );
    }

    #[rstest]
    fn separated_matches_stay_distinct(mut counter: Counter) {
        let records = [
            record("X", "a", "b"),
            record("Y", "c", "d"),
            record("X", "a", "b"),
        ];
        let created = run(&records, &mut counter)
            .into_iter()
            .filter(|observation| observation.is_created())
            .count();
        assert_eq!(created, 3);
    }

    #[rstest]
    fn missing_category_differs_from_present_one(mut counter: Counter) {
        let plain = EntityRecord::new("X", "OpenStreetMap").expect("valid name");
        let records = [plain, record("X", "a", "b")];
        let observed = run(&records, &mut counter);
        assert!(observed.iter().all(|observation| observation.is_created()));
    }

    #[rstest]
    fn failed_creation_keeps_previous_state() {
        let mut dedup = Deduplicator::new();
        let first = record("X", "a", "b");
        let second = record("Y", "a", "b");
        dedup
            .observe(&first, |_| Ok::<_, Infallible>(EntityId(10)))
            .expect("first entity");
        let err = dedup.observe(&second, |_| Err("destination offline"));
        assert_eq!(err, Err("destination offline"));
        assert_eq!(dedup.pending(), Some(EntityId(10)));
    }
}
