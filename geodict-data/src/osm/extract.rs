//! Descriptive attributes of an element.

use geodict_core::{Element, EntityRecord, NAME_KEY, is_category_key};

const TIMESTAMP_ATTRIBUTE: &str = "timestamp";

/// Build the entity record described by `element`'s tags.
///
/// Returns `None` when the element has no non-empty `name` tag. When several
/// category-bearing tags are present the last one declared wins, and the
/// same holds for repeated `name` tags. The element's `timestamp` attribute
/// becomes the creation time. The geometry is left empty for the caller to
/// fill from the store.
///
/// # Examples
/// ```
/// use geodict_core::{Element, ElementId, ElementKind};
/// use geodict_data::osm::describe_element;
///
/// let element = Element::new(ElementKind::Node, ElementId(1))
///     .with_tag("amenity", "pub")
///     .with_tag("name", "The Crown")
///     .with_tag("tourism", "attraction");
/// let record = describe_element(&element, "OpenStreetMap").expect("named element");
/// assert_eq!(record.name, "The Crown");
/// assert_eq!(record.category.as_deref(), Some("tourism"));
/// assert_eq!(record.subcategory.as_deref(), Some("attraction"));
/// ```
#[must_use]
pub fn describe_element(element: &Element, source: &str) -> Option<EntityRecord> {
    let mut name = None;
    let mut category = None;
    for (key, value) in element.tags() {
        if key == NAME_KEY {
            name = Some(value);
        } else if is_category_key(key) {
            category = Some((key, value));
        }
    }

    let mut record = EntityRecord::new(name?, source).ok()?;
    if let Some((key, value)) = category {
        record = record.with_category(key, value);
    }
    if let Some(timestamp) = element.attribute(TIMESTAMP_ATTRIBUTE) {
        record = record.with_create_time(timestamp);
    }
    Some(record)
}
