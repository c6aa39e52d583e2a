//! Tag vocabulary that determines an entity's name and category.
//!
//! An element's `name` tag names the entity. A tag whose key appears in
//! [`CATEGORY_KEYS`] sets the category to that key and the subcategory to its
//! value; when several are present the last one declared wins.

/// Tag key carrying the entity name.
pub const NAME_KEY: &str = "name";

/// Tag keys that carry a category, with the tag value as subcategory.
pub const CATEGORY_KEYS: [&str; 20] = [
    "place",
    "amenity",
    "landuse",
    "leisure",
    "sport",
    "tourism",
    "shop",
    "vending",
    "historic",
    "man_made",
    "religion",
    "natural",
    "highway",
    "railway",
    "waterway",
    "aeroway",
    "aerialway",
    "power",
    "boundary",
    "barrier",
];

/// Returns true when `key` is one of the category-bearing tag keys.
///
/// # Examples
/// ```
/// use geodict_core::is_category_key;
///
/// assert!(is_category_key("amenity"));
/// assert!(!is_category_key("name"));
/// ```
#[must_use]
pub fn is_category_key(key: &str) -> bool {
    CATEGORY_KEYS.contains(&key)
}
