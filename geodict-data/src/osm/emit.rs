//! Pass 2: turn named elements into destination entities.

use geodict_core::{Deduplicator, Element, ElementKey, EntitySink, GeometryStore, Observation};
use log::{debug, info};
use thiserror::Error;

use super::{ReadError, describe_element};

/// Counts gathered during Pass 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitSummary {
    /// Elements read from the stream.
    pub scanned: u64,
    /// Elements with a usable name.
    pub named: u64,
    /// Destination entities created.
    pub entities_created: u64,
    /// Named elements merged into the preceding entity.
    pub continuations: u64,
    /// Location rows written.
    pub locations_written: u64,
}

/// Errors raised during Pass 2.
#[derive(Debug, Error)]
pub enum EmitError<S, K>
where
    S: std::error::Error + Send + Sync + 'static,
    K: std::error::Error + Send + Sync + 'static,
{
    /// The element stream failed to decode.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Reading the resolved geometry of `key` failed.
    #[error("failed to read the geometry of {key}")]
    Store {
        /// Element being emitted.
        key: ElementKey,
        /// Store error.
        #[source]
        source: S,
    },
    /// The destination rejected a write for `key`.
    #[error("destination write failed for {key}")]
    Sink {
        /// Element being emitted.
        key: ElementKey,
        /// Destination error.
        #[source]
        source: K,
    },
    /// The destination failed to commit the final batch.
    #[error("destination failed to commit")]
    Finish {
        /// Destination error.
        #[source]
        source: K,
    },
}

/// Run Pass 2 over `elements`.
///
/// Each named element is described, given the geometry Pass 1 stored for
/// it, and passed through a [`Deduplicator`] so consecutive elements with
/// the same name and category extend one entity. Named elements with empty
/// geometry still create or extend an entity; they just add no locations.
/// The sink is finished once the stream is exhausted.
pub fn emit_entities<I, S, K>(
    elements: I,
    store: &S,
    sink: &mut K,
    source: &str,
) -> Result<EmitSummary, EmitError<S::Error, K::Error>>
where
    I: IntoIterator<Item = Result<Element, ReadError>>,
    S: GeometryStore + ?Sized,
    K: EntitySink + ?Sized,
{
    let mut summary = EmitSummary::default();
    let mut dedup = Deduplicator::new();

    for decoded in elements {
        let element = decoded?;
        summary.scanned += 1;
        let key = element.key();
        let Some(description) = describe_element(&element, source) else {
            continue;
        };
        summary.named += 1;

        let geometry = store
            .get(key)
            .map_err(|source| EmitError::Store { key, source })?;
        let record = description.with_geometry(geometry);
        let observation = dedup
            .observe(&record, |entity| sink.create_entity(entity))
            .map_err(|source| EmitError::Sink { key, source })?;
        match observation {
            Observation::Created(id) => {
                summary.entities_created += 1;
                debug!("{key} created entity {id} ({})", record.name);
            }
            Observation::Continued(id) => {
                summary.continuations += 1;
                debug!("{key} continues entity {id}");
            }
        }

        if !record.geometry.is_empty() {
            sink.append_locations(observation.entity(), &record.geometry)
                .map_err(|source| EmitError::Sink { key, source })?;
            summary.locations_written += u64::try_from(record.geometry.len()).unwrap_or(u64::MAX);
        }
    }

    sink.finish().map_err(|source| EmitError::Finish { source })?;
    info!(
        "pass 2 wrote {} entities with {} locations from {} named elements",
        summary.entities_created, summary.locations_written, summary.named
    );
    Ok(summary)
}
