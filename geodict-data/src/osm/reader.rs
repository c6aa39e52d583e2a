//! Streaming decoder from OSM XML to [`Element`] records.
//!
//! The reader pulls one markup event at a time and keeps at most one open
//! element with its children, so memory is bounded by the widest element
//! rather than by the document. Elements of kinds outside the
//! [`KindFilter`] are skipped without collecting their children.

use std::{io::BufRead, str::FromStr};

use geodict_core::{ChildRef, Coordinate, Element, ElementId, ElementKey, ElementKind};
use log::trace;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::ReadError;

const ND_TAG: &[u8] = b"nd";
const TAG_TAG: &[u8] = b"tag";
const MEMBER_TAG: &[u8] = b"member";

/// Set of element kinds a reader yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindFilter {
    node: bool,
    way: bool,
    relation: bool,
}

impl KindFilter {
    /// Yield every kind.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            node: true,
            way: true,
            relation: true,
        }
    }

    /// Yield only the listed kinds.
    #[must_use]
    pub fn only(kinds: &[ElementKind]) -> Self {
        Self {
            node: kinds.contains(&ElementKind::Node),
            way: kinds.contains(&ElementKind::Way),
            relation: kinds.contains(&ElementKind::Relation),
        }
    }

    /// Whether `kind` is yielded.
    #[must_use]
    pub const fn contains(self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Node => self.node,
            ElementKind::Way => self.way,
            ElementKind::Relation => self.relation,
        }
    }
}

impl Default for KindFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug)]
struct OpenElement {
    element: Element,
    keep: bool,
}

/// Lazy iterator over the elements of an OSM XML stream.
///
/// The iterator is single pass; reopen the source to read it again. After
/// the first error it yields `None`.
///
/// # Examples
/// ```
/// use geodict_core::{ElementKey, ElementKind};
/// use geodict_data::osm::{ElementReader, KindFilter};
///
/// let xml = r#"<osm>
///   <node id="1" lat="51.5" lon="-0.1"/>
///   <way id="2"><nd ref="1"/><tag k="name" v="Mall"/></way>
/// </osm>"#;
/// let ways: Vec<_> = ElementReader::new(xml.as_bytes())
///     .with_kinds(KindFilter::only(&[ElementKind::Way]))
///     .collect::<Result<_, _>>()
///     .expect("well-formed input");
///
/// assert_eq!(ways.len(), 1);
/// assert_eq!(ways[0].references().collect::<Vec<_>>(), vec![ElementKey::node(1)]);
/// ```
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
    kinds: KindFilter,
    open: Option<OpenElement>,
    done: bool,
}

impl<R: BufRead> ElementReader<R> {
    /// Wrap a buffered stream of XML.
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buffer: Vec::new(),
            kinds: KindFilter::all(),
            open: None,
            done: false,
        }
    }

    /// Restrict the yielded kinds.
    #[must_use]
    pub const fn with_kinds(mut self, kinds: KindFilter) -> Self {
        self.kinds = kinds;
        self
    }

    #[cfg(test)]
    fn scratch_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn next_element(&mut self) -> Result<Option<Element>, ReadError> {
        let Self {
            reader,
            buffer,
            kinds,
            open,
            ..
        } = self;
        loop {
            buffer.clear();
            let event = reader
                .read_event_into(buffer)
                .map_err(|source| ReadError::Xml {
                    position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                    source,
                })?;
            match event {
                Event::Start(start) => {
                    if let Some(kind) = element_kind(&start) {
                        *open = Some(open_element(open.as_ref(), kind, &start, *kinds)?);
                    } else if let Some(current) = open.as_mut() {
                        push_child(current, &start)?;
                    }
                }
                Event::Empty(start) => {
                    if let Some(kind) = element_kind(&start) {
                        let complete = open_element(open.as_ref(), kind, &start, *kinds)?;
                        if complete.keep {
                            return Ok(Some(complete.element));
                        }
                    } else if let Some(current) = open.as_mut() {
                        push_child(current, &start)?;
                    }
                }
                Event::End(end) => {
                    let closes_open = open.as_ref().is_some_and(|current| {
                        end.name().as_ref() == current.element.kind.as_str().as_bytes()
                    });
                    if closes_open && let Some(complete) = open.take() {
                        if complete.keep {
                            return Ok(Some(complete.element));
                        }
                        trace!("skipped {}", complete.element.key());
                    }
                }
                Event::Eof => {
                    return match open.take() {
                        Some(unfinished) => Err(ReadError::UnexpectedEof {
                            open: unfinished.element.key(),
                        }),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<Element, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.open = None;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for ElementReader<R> {}

fn element_kind(start: &BytesStart<'_>) -> Option<ElementKind> {
    match start.name().as_ref() {
        b"node" => Some(ElementKind::Node),
        b"way" => Some(ElementKind::Way),
        b"relation" => Some(ElementKind::Relation),
        _ => None,
    }
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn decode_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, ReadError> {
    let malformed = |source: quick_xml::Error| ReadError::MalformedAttribute {
        tag: tag_name(start),
        source,
    };
    start
        .attributes()
        .map(|raw| {
            let attribute = raw.map_err(|err| malformed(err.into()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(malformed)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn parse_attribute<T: FromStr>(
    tag: &str,
    attribute: &'static str,
    value: &str,
) -> Result<T, ReadError> {
    value.parse().map_err(|_| ReadError::InvalidAttribute {
        tag: tag.to_owned(),
        attribute,
        value: value.to_owned(),
    })
}

/// Like [`parse_attribute`], but `NaN` and the infinities are rejected too.
fn parse_coordinate(tag: &str, attribute: &'static str, value: &str) -> Result<f64, ReadError> {
    let parsed: f64 = parse_attribute(tag, attribute, value)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ReadError::InvalidAttribute {
            tag: tag.to_owned(),
            attribute,
            value: value.to_owned(),
        })
    }
}

fn take_attribute(attributes: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let index = attributes.iter().position(|(key, _)| key == name)?;
    Some(attributes.swap_remove(index).1)
}

fn open_element(
    current: Option<&OpenElement>,
    kind: ElementKind,
    start: &BytesStart<'_>,
    kinds: KindFilter,
) -> Result<OpenElement, ReadError> {
    if let Some(outer) = current {
        return Err(ReadError::NestedElement {
            outer: outer.element.key(),
            inner: kind.as_str().to_owned(),
        });
    }

    let tag = kind.as_str();
    let mut attributes = decode_attributes(start)?;
    let raw_id = take_attribute(&mut attributes, "id").ok_or_else(|| {
        ReadError::MissingAttribute {
            tag: tag.to_owned(),
            attribute: "id",
        }
    })?;
    let id = ElementId(parse_attribute(tag, "id", &raw_id)?);
    let keep = kinds.contains(kind);
    let mut element = Element::new(kind, id);
    if !keep {
        return Ok(OpenElement { element, keep });
    }

    if kind == ElementKind::Node {
        let lat = take_attribute(&mut attributes, "lat");
        let lon = take_attribute(&mut attributes, "lon");
        if let (Some(lat), Some(lon)) = (lat, lon) {
            element.coordinate = Some(Coordinate::new(
                parse_coordinate(tag, "lat", &lat)?,
                parse_coordinate(tag, "lon", &lon)?,
            ));
        }
    }
    element.attributes.extend(attributes);
    Ok(OpenElement { element, keep })
}

fn push_child(current: &mut OpenElement, start: &BytesStart<'_>) -> Result<(), ReadError> {
    if !current.keep {
        return Ok(());
    }
    let name = start.name();
    let tag = name.as_ref();
    if tag != ND_TAG && tag != TAG_TAG && tag != MEMBER_TAG {
        return Ok(());
    }

    let mut attributes = decode_attributes(start)?;
    let tag_label = tag_name(start);
    let mut required = |attribute: &'static str| {
        take_attribute(&mut attributes, attribute).ok_or_else(|| ReadError::MissingAttribute {
            tag: tag_label.clone(),
            attribute,
        })
    };

    let element = &mut current.element;
    if tag == TAG_TAG {
        let key = required("k")?;
        let value = required("v")?;
        element.children.push(ChildRef::Tag { key, value });
        return Ok(());
    }

    let raw_ref = required("ref")?;
    let kind = if tag == ND_TAG {
        ElementKind::Node
    } else {
        let raw_type = required("type")?;
        raw_type
            .parse::<ElementKind>()
            .map_err(|_| ReadError::UnknownMemberType {
                parent: element.key(),
                value: raw_type,
            })?
    };
    let id = ElementId(parse_attribute(&tag_label, "ref", &raw_ref)?);
    element
        .children
        .push(ChildRef::Reference(ElementKey::new(kind, id)));
    Ok(())
}
