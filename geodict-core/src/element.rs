//! Element records decoded from the hierarchical source stream.

use std::{collections::BTreeMap, fmt, str::FromStr};

use thiserror::Error;

use crate::Coordinate;

/// The closed set of element types carried by the source format.
///
/// The variants are ordered by resolution tier: every node is resolved
/// before any way, and every way before any relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A point carrying its own coordinate.
    Node,
    /// An ordered list of node references.
    Way,
    /// An ordered list of typed member references.
    Relation,
}

impl ElementKind {
    /// Every kind, in tier order.
    pub const ALL: [Self; 3] = [Self::Node, Self::Way, Self::Relation];

    /// Tag name used by the source markup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Position in the resolution order; lower tiers resolve first.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Node => 0,
            Self::Way => 1,
            Self::Relation => 2,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a tag does not name one of the three element kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown element kind {0:?}")]
pub struct UnknownElementKind(pub String);

impl FromStr for ElementKind {
    type Err = UnknownElementKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "node" => Ok(Self::Node),
            "way" => Ok(Self::Way),
            "relation" => Ok(Self::Relation),
            other => Err(UnknownElementKind(other.to_owned())),
        }
    }
}

/// Raw identifier of an element, unique within its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ElementId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Kind-scoped element identity.
///
/// A node and a way may share a raw identifier; the key keeps them apart.
///
/// # Examples
/// ```
/// use geodict_core::{ElementKey, ElementKind};
///
/// let node = ElementKey::node(7);
/// let way = ElementKey::way(7);
/// assert_ne!(node, way);
/// assert_eq!(way.kind, ElementKind::Way);
/// assert_eq!(way.to_string(), "way/7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    /// Element kind.
    pub kind: ElementKind,
    /// Raw identifier within the kind.
    pub id: ElementId,
}

impl ElementKey {
    /// Build a key from its parts.
    #[must_use]
    pub const fn new(kind: ElementKind, id: ElementId) -> Self {
        Self { kind, id }
    }

    /// Key of the node with the given raw identifier.
    #[must_use]
    pub const fn node(id: i64) -> Self {
        Self::new(ElementKind::Node, ElementId(id))
    }

    /// Key of the way with the given raw identifier.
    #[must_use]
    pub const fn way(id: i64) -> Self {
        Self::new(ElementKind::Way, ElementId(id))
    }

    /// Key of the relation with the given raw identifier.
    #[must_use]
    pub const fn relation(id: i64) -> Self {
        Self::new(ElementKind::Relation, ElementId(id))
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A child entry of an element, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRef {
    /// Pointer to a previously seen element.
    ///
    /// Way children always point at nodes; relation members carry their own
    /// kind.
    Reference(ElementKey),
    /// Descriptive key/value pair.
    Tag {
        /// Tag key.
        key: String,
        /// Tag value.
        value: String,
    },
}

/// One record of the input stream.
///
/// Elements are ephemeral: the reader builds one, the caller consumes it,
/// and it is dropped before the next one is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element kind.
    pub kind: ElementKind,
    /// Raw identifier.
    pub id: ElementId,
    /// Own coordinate; only nodes carry one.
    pub coordinate: Option<Coordinate>,
    /// Remaining markup attributes such as `timestamp` or `version`.
    pub attributes: BTreeMap<String, String>,
    /// References and tags in declaration order.
    pub children: Vec<ChildRef>,
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub const fn new(kind: ElementKind, id: ElementId) -> Self {
        Self {
            kind,
            id,
            coordinate: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Kind-scoped key of this element.
    #[must_use]
    pub const fn key(&self) -> ElementKey {
        ElementKey::new(self.kind, self.id)
    }

    /// Attach the element's own coordinate.
    #[must_use]
    pub const fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Record a raw markup attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a reference child.
    #[must_use]
    pub fn with_reference(mut self, key: ElementKey) -> Self {
        self.children.push(ChildRef::Reference(key));
        self
    }

    /// Append a tag child.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.children.push(ChildRef::Tag {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Look up a raw markup attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Reference children in declaration order.
    pub fn references(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.children.iter().filter_map(|child| match child {
            ChildRef::Reference(key) => Some(*key),
            ChildRef::Tag { .. } => None,
        })
    }

    /// Tag children in declaration order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.children.iter().filter_map(|child| match child {
            ChildRef::Tag { key, value } => Some((key.as_str(), value.as_str())),
            ChildRef::Reference(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("node", ElementKind::Node)]
    #[case("way", ElementKind::Way)]
    #[case("relation", ElementKind::Relation)]
    fn parses_known_kinds(#[case] raw: &str, #[case] expected: ElementKind) {
        assert_eq!(raw.parse::<ElementKind>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn rejects_unknown_kind() {
        let err = "area".parse::<ElementKind>().expect_err("area is not a kind");
        assert_eq!(err, UnknownElementKind("area".into()));
    }

    #[rstest]
    fn tiers_follow_dependency_order() {
        let tiers: Vec<u8> = ElementKind::ALL.iter().map(|kind| kind.tier()).collect();
        assert_eq!(tiers, vec![0, 1, 2]);
    }

    #[rstest]
    fn splits_children_by_type() {
        let element = Element::new(ElementKind::Way, ElementId(5))
            .with_reference(ElementKey::node(1))
            .with_tag("name", "High Street")
            .with_reference(ElementKey::node(2));

        let refs: Vec<_> = element.references().collect();
        assert_eq!(refs, vec![ElementKey::node(1), ElementKey::node(2)]);
        let tags: Vec<_> = element.tags().collect();
        assert_eq!(tags, vec![("name", "High Street")]);
        assert_eq!(element.key(), ElementKey::way(5));
    }
}
