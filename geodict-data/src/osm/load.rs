//! Two-pass orchestration from an OSM extract to a destination.

use std::io::BufRead;

use camino::Utf8Path;
use geodict_core::{DEFAULT_SOURCE, EntitySink, GeometryStore};
use log::info;
use thiserror::Error;

use super::{
    ElementReader, EmitError, EmitSummary, KindFilter, ReadError, ResolveError, ResolveSummary,
    emit_entities, open_osm_source, resolve_geometries,
};
use crate::{
    DEFAULT_BATCH_SIZE, SqliteEntitySink, SqliteEntitySinkError, SqliteGeometryStore,
    SqliteGeometryStoreError,
};

/// Options shared by the load entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Provenance tag stored with every entity.
    pub source: String,
    /// Entities per destination transaction, used when this crate opens the
    /// destination itself.
    pub batch_size: usize,
    /// Kinds that may become entities in Pass 2. Pass 1 always resolves
    /// every kind so references stay complete.
    pub entity_kinds: KindFilter,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_owned(),
            batch_size: DEFAULT_BATCH_SIZE,
            entity_kinds: KindFilter::all(),
        }
    }
}

impl LoadOptions {
    /// Override the provenance tag.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Override the destination batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Restrict which element kinds are written as entities.
    #[must_use]
    pub const fn with_entity_kinds(mut self, kinds: KindFilter) -> Self {
        self.entity_kinds = kinds;
        self
    }
}

/// Outcome of a completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmLoadReport {
    /// Pass 1 counts.
    pub resolve: ResolveSummary,
    /// Pass 2 counts.
    pub emit: EmitSummary,
}

/// Errors returned by the load entry points.
#[derive(Debug, Error)]
pub enum OsmLoadError<S, K>
where
    S: std::error::Error + Send + Sync + 'static,
    K: std::error::Error + Send + Sync + 'static,
{
    /// The extract could not be opened.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Pass 1 failed.
    #[error("failed to resolve geometries")]
    Resolve(#[source] ResolveError<S>),
    /// Pass 2 failed.
    #[error("failed to write entities")]
    Emit(#[source] EmitError<S, K>),
    /// The geometry store could not be opened or closed.
    #[error("geometry store unavailable")]
    Store(#[source] S),
    /// The destination could not be opened.
    #[error("destination unavailable")]
    Sink(#[source] K),
}

/// Run both passes over the streams produced by `open`.
///
/// `open` is called once per pass and must yield the same document each
/// time. The store is written in Pass 1 and only read in Pass 2.
pub fn load_osm_elements<F, R, S, K>(
    mut open: F,
    store: &mut S,
    sink: &mut K,
    options: &LoadOptions,
) -> Result<OsmLoadReport, OsmLoadError<S::Error, K::Error>>
where
    F: FnMut() -> Result<R, ReadError>,
    R: BufRead,
    S: GeometryStore + ?Sized,
    K: EntitySink + ?Sized,
{
    info!("pass 1: resolving geometries");
    let resolve =
        resolve_geometries(ElementReader::new(open()?), store).map_err(OsmLoadError::Resolve)?;

    info!("pass 2: emitting entities");
    let elements = ElementReader::new(open()?).with_kinds(options.entity_kinds);
    let emit =
        emit_entities(elements, &*store, sink, &options.source).map_err(OsmLoadError::Emit)?;

    Ok(OsmLoadReport { resolve, emit })
}

/// Load the extract at `input` through caller-supplied store and sink.
///
/// `.bz2` and `.gz` inputs are decompressed on the fly.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use geodict_core::MemoryGeometryStore;
/// use geodict_data::{LoadOptions, SqliteEntitySink, load_osm_extract};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = MemoryGeometryStore::default();
/// let mut sink = SqliteEntitySink::open(Utf8Path::new("gazetteer.sqlite3"), 10_000)?;
/// let report = load_osm_extract(
///     Utf8Path::new("berkshire.osm.bz2"),
///     &mut store,
///     &mut sink,
///     &LoadOptions::default(),
/// )?;
/// println!("{} entities", report.emit.entities_created);
/// # Ok(())
/// # }
/// ```
pub fn load_osm_extract<S, K>(
    input: &Utf8Path,
    store: &mut S,
    sink: &mut K,
    options: &LoadOptions,
) -> Result<OsmLoadReport, OsmLoadError<S::Error, K::Error>>
where
    S: GeometryStore + ?Sized,
    K: EntitySink + ?Sized,
{
    info!("loading OSM extract {input}");
    load_osm_elements(|| open_osm_source(input), store, sink, options)
}

/// Load `input` into the SQLite destination at `database`, resolving
/// through a fresh SQLite geometry store at `geometry_store`.
///
/// The geometry store is replaced if it already exists and is left on disk
/// afterwards; delete it once the report has been inspected.
pub fn load_osm_extract_to_sqlite(
    input: &Utf8Path,
    database: &Utf8Path,
    geometry_store: &Utf8Path,
    options: &LoadOptions,
) -> Result<OsmLoadReport, OsmLoadError<SqliteGeometryStoreError, SqliteEntitySinkError>> {
    let mut store = SqliteGeometryStore::create(geometry_store).map_err(OsmLoadError::Store)?;
    let mut sink =
        SqliteEntitySink::open(database, options.batch_size).map_err(OsmLoadError::Sink)?;
    let report = load_osm_extract(input, &mut store, &mut sink, options)?;
    store.close().map_err(OsmLoadError::Store)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodict_core::{ElementKind, MemoryGeometryStore, test_support::RecordingSink};
    use rstest::rstest;

    const EXTRACT: &str = r#"<osm>
  <node id="1" lat="51.50" lon="-0.12"><tag k="name" v="Big Ben"/></node>
  <node id="2" lat="51.51" lon="-0.13"/>
  <way id="10"><nd ref="1"/><nd ref="2"/><tag k="name" v="Bridge Street"/></way>
  <relation id="20"><member type="way" ref="10"/><tag k="name" v="Westminster"/></relation>
</osm>"#;

    fn load(options: &LoadOptions) -> (RecordingSink, OsmLoadReport) {
        let mut store = MemoryGeometryStore::default();
        let mut sink = RecordingSink::default();
        let report = load_osm_elements(
            || Ok::<_, ReadError>(EXTRACT.as_bytes()),
            &mut store,
            &mut sink,
            options,
        )
        .expect("load succeeds");
        (sink, report)
    }

    #[rstest]
    fn every_kind_becomes_an_entity_by_default() {
        let (sink, report) = load(&LoadOptions::default());
        assert_eq!(sink.names(), vec!["Big Ben", "Bridge Street", "Westminster"]);
        assert_eq!(report.resolve.elements(), 4);
    }

    #[rstest]
    fn entity_kinds_limit_pass_two_only() {
        let options = LoadOptions::default()
            .with_entity_kinds(KindFilter::only(&[ElementKind::Relation]));
        let (sink, report) = load(&options);
        assert_eq!(sink.names(), vec!["Westminster"]);
        assert_eq!(sink.location_count(), 2);
        assert_eq!(report.resolve.elements(), 4);
        assert_eq!(report.emit.entities_created, 1);
    }
}
