//! Pass 1: resolve and store the geometry of every element.
//!
//! Elements arrive tier by tier (nodes, then ways, then relations). Each
//! element's geometry is assembled from store lookups only, so transitive
//! references (relation to relation to way to node) never recurse. The store
//! is flushed whenever the tier advances, which is the barrier that makes a
//! whole tier visible before the next one reads it.

use geo::{Coord, Rect};
use geodict_core::{Element, ElementKey, ElementKind, Geometry, GeometryStore};
use log::{debug, info, warn};
use thiserror::Error;

use super::ReadError;

/// Geometry of one element plus the references that resolved to nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    /// Concatenated coordinates in declaration order.
    pub geometry: Geometry,
    /// Number of child references absent from the store.
    pub dangling: u64,
}

/// Resolve `element` against the geometries already in `store`.
///
/// Nodes resolve to their own coordinate, or to nothing when it is absent.
/// Way children are nodes; relation members carry their own kind. Missing
/// children contribute nothing and are counted in
/// [`Resolution::dangling`].
///
/// # Examples
/// ```
/// use geodict_core::{
///     Coordinate, Element, ElementId, ElementKey, ElementKind, Geometry, GeometryStore,
///     MemoryGeometryStore,
/// };
/// use geodict_data::osm::resolve_element;
///
/// let mut store = MemoryGeometryStore::default();
/// store.put(ElementKey::node(1), &Geometry::point(Coordinate::new(1.0, 2.0))).unwrap();
/// let way = Element::new(ElementKind::Way, ElementId(10))
///     .with_reference(ElementKey::node(1))
///     .with_reference(ElementKey::node(99));
///
/// let resolution = resolve_element(&way, &store).unwrap();
/// assert_eq!(resolution.geometry.len(), 1);
/// assert_eq!(resolution.dangling, 1);
/// ```
pub fn resolve_element<S>(element: &Element, store: &S) -> Result<Resolution, S::Error>
where
    S: GeometryStore + ?Sized,
{
    if element.kind == ElementKind::Node {
        return Ok(Resolution {
            geometry: element.coordinate.map(Geometry::point).unwrap_or_default(),
            dangling: 0,
        });
    }

    let mut resolution = Resolution::default();
    for child in element.references() {
        let key = match element.kind {
            ElementKind::Way => ElementKey::new(ElementKind::Node, child.id),
            ElementKind::Node | ElementKind::Relation => child,
        };
        match store.lookup(key)? {
            Some(geometry) => resolution.geometry.extend_from(&geometry),
            None => {
                debug!("{} references missing {key}", element.key());
                resolution.dangling += 1;
            }
        }
    }
    Ok(resolution)
}

/// Counts gathered during Pass 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveSummary {
    /// Nodes stored.
    pub nodes: u64,
    /// Ways stored.
    pub ways: u64,
    /// Relations stored.
    pub relations: u64,
    /// Bounding box of valid node coordinates, `x = longitude`,
    /// `y = latitude`.
    pub bounds: Option<Rect<f64>>,
    /// Child references that resolved to nothing.
    pub dangling_references: u64,
    /// Elements that appeared after an element of a later tier.
    pub tier_regressions: u64,
}

impl ResolveSummary {
    /// Total number of elements stored.
    #[must_use]
    pub const fn elements(&self) -> u64 {
        self.nodes + self.ways + self.relations
    }

    fn record(&mut self, kind: ElementKind) {
        match kind {
            ElementKind::Node => self.nodes += 1,
            ElementKind::Way => self.ways += 1,
            ElementKind::Relation => self.relations += 1,
        }
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }
}

/// Errors raised during Pass 1.
#[derive(Debug, Error)]
pub enum ResolveError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The element stream failed to decode.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// The geometry store failed while handling `key`.
    #[error("geometry store failed while resolving {key}")]
    Store {
        /// Element being resolved.
        key: ElementKey,
        /// Store error.
        #[source]
        source: E,
    },
    /// The geometry store failed to flush at a tier boundary.
    #[error("geometry store failed to flush")]
    Flush {
        /// Store error.
        #[source]
        source: E,
    },
}

/// Run Pass 1 over `elements`, storing every element's geometry.
///
/// Every element is stored, including those whose geometry is empty, so a
/// repeated key always ends with the last occurrence. An element of an
/// earlier tier appearing after a later one is still stored but logged as
/// a tier regression, since elements that referenced it have already been
/// resolved without it.
pub fn resolve_geometries<I, S>(
    elements: I,
    store: &mut S,
) -> Result<ResolveSummary, ResolveError<S::Error>>
where
    I: IntoIterator<Item = Result<Element, ReadError>>,
    S: GeometryStore + ?Sized,
{
    let mut summary = ResolveSummary::default();
    let mut current_tier: Option<ElementKind> = None;

    for decoded in elements {
        let element = decoded?;
        let key = element.key();

        match current_tier {
            Some(tier) if element.kind.tier() > tier.tier() => {
                store.flush().map_err(|source| ResolveError::Flush { source })?;
                info!("finished {tier} tier, resolving {}s", element.kind);
                current_tier = Some(element.kind);
            }
            Some(tier) if element.kind.tier() < tier.tier() => {
                warn!("{key} appeared after the {tier} tier began; earlier referrers missed it");
                summary.tier_regressions += 1;
            }
            Some(_) => {}
            None => current_tier = Some(element.kind),
        }

        let resolution = resolve_element(&element, store)
            .map_err(|source| ResolveError::Store { key, source })?;
        store
            .put(key, &resolution.geometry)
            .map_err(|source| ResolveError::Store { key, source })?;

        summary.record(element.kind);
        summary.dangling_references += resolution.dangling;
        if element.kind == ElementKind::Node
            && let Some(bounds) = resolution.geometry.bounds()
        {
            summary.include_bounds(bounds);
        }
    }

    store.flush().map_err(|source| ResolveError::Flush { source })?;
    if summary.dangling_references > 0 {
        warn!(
            "{} references pointed at elements missing from the extract",
            summary.dangling_references
        );
    }
    info!(
        "pass 1 stored {} nodes, {} ways and {} relations",
        summary.nodes, summary.ways, summary.relations
    );
    Ok(summary)
}
