//! Coordinates and resolved geometries.

use geo::{Coord, Rect};

/// A WGS84 position in degrees.
///
/// Source coordinates are assumed to already be in SRID 4326; nothing here
/// reprojects them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the coordinate is finite and inside the WGS84 envelope.
    #[must_use]
    pub fn is_valid_wgs84(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Self {
            x: value.lon,
            y: value.lat,
        }
    }
}

/// The ordered coordinate sequence resolved for one element.
///
/// Order is significant and repeated coordinates are kept.
///
/// # Examples
/// ```
/// use geodict_core::{Coordinate, Geometry};
///
/// let mut way = Geometry::point(Coordinate::new(51.5, -0.1));
/// way.extend_from(&Geometry::point(Coordinate::new(51.6, -0.2)));
/// assert_eq!(way.len(), 2);
/// assert_eq!(way.as_slice()[1], Coordinate::new(51.6, -0.2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Geometry(Vec<Coordinate>);

impl Geometry {
    /// Create an empty geometry.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a single-point geometry.
    #[must_use]
    pub fn point(coordinate: Coordinate) -> Self {
        Self(vec![coordinate])
    }

    /// Number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the geometry holds no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append every coordinate of `other`, preserving its order.
    pub fn extend_from(&mut self, other: &Self) {
        self.0.extend_from_slice(&other.0);
    }

    /// Borrow the coordinates.
    #[must_use]
    pub fn as_slice(&self) -> &[Coordinate] {
        &self.0
    }

    /// Iterate over the coordinates in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.0.iter()
    }

    /// Axis-aligned bounds (`x = longitude`, `y = latitude`) of the valid
    /// coordinates, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let mut valid = self.0.iter().filter(|coordinate| coordinate.is_valid_wgs84());
        let first = Coord::from(*valid.next()?);
        let (min, max) = valid.fold((first, first), |(min, max), coordinate| {
            let coord = Coord::from(*coordinate);
            (
                Coord {
                    x: min.x.min(coord.x),
                    y: min.y.min(coord.y),
                },
                Coord {
                    x: max.x.max(coord.x),
                    y: max.y.max(coord.y),
                },
            )
        });
        Some(Rect::new(min, max))
    }
}

impl From<Vec<Coordinate>> for Geometry {
    fn from(value: Vec<Coordinate>) -> Self {
        Self(value)
    }
}

impl FromIterator<Coordinate> for Geometry {
    fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Geometry {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
