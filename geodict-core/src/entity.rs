//! Entity records emitted to the destination store.

use std::fmt;

use thiserror::Error;

use crate::Geometry;

/// Provenance tag attached to entities derived from OpenStreetMap extracts.
pub const DEFAULT_SOURCE: &str = "OpenStreetMap";

/// Destination-assigned identity of a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors returned by [`EntityRecord::new`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityRecordError {
    /// The name was empty.
    #[error("entity name must not be empty")]
    EmptyName,
}

/// A named entity with its resolved geometry.
///
/// # Examples
/// ```
/// use geodict_core::{Coordinate, EntityRecord, Geometry};
///
/// # fn main() -> Result<(), geodict_core::EntityRecordError> {
/// let record = EntityRecord::new("Slough", "OpenStreetMap")?
///     .with_category("place", "town")
///     .with_geometry(Geometry::point(Coordinate::new(51.51, -0.59)));
/// assert_eq!(record.category.as_deref(), Some("place"));
/// assert_eq!(record.geometry.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Non-empty display name.
    pub name: String,
    /// Category tag key, if any.
    pub category: Option<String>,
    /// Category tag value, if any.
    pub subcategory: Option<String>,
    /// Provenance tag.
    pub source: String,
    /// Creation timestamp as found in the source; the writer stamps the
    /// current time when absent.
    pub create_time: Option<String>,
    /// Resolved point sequence.
    pub geometry: Geometry,
}

impl EntityRecord {
    /// Validate the name and build a record without category or geometry.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, EntityRecordError> {
        let owned_name: String = name.into();
        if owned_name.is_empty() {
            return Err(EntityRecordError::EmptyName);
        }
        Ok(Self {
            name: owned_name,
            category: None,
            subcategory: None,
            source: source.into(),
            create_time: None,
            geometry: Geometry::new(),
        })
    }

    /// Set category and subcategory.
    #[must_use]
    pub fn with_category(
        mut self,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        self.category = Some(category.into());
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub fn with_create_time(mut self, create_time: impl Into<String>) -> Self {
        self.create_time = Some(create_time.into());
        self
    }

    /// Replace the geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// The attributes that decide whether adjacent records merge.
    #[must_use]
    pub fn identity(&self) -> EntityIdentity {
        EntityIdentity {
            name: self.name.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }
}

/// The `(name, category, subcategory)` triple compared by the deduplicator.
///
/// Provenance is not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityIdentity {
    /// Entity name.
    pub name: String,
    /// Category tag key.
    pub category: Option<String>,
    /// Category tag value.
    pub subcategory: Option<String>,
}

impl EntityIdentity {
    /// Whether `record` carries this identity.
    #[must_use]
    pub fn matches(&self, record: &EntityRecord) -> bool {
        self.name == record.name
            && self.category == record.category
            && self.subcategory == record.subcategory
    }
}
