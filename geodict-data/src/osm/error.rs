//! Errors raised while decoding an OSM XML stream.

use std::io;

use camino::Utf8PathBuf;
use geodict_core::ElementKey;
use thiserror::Error;

/// Errors produced by [`open_osm_source`](super::open_osm_source) and
/// [`ElementReader`](super::ElementReader).
///
/// Every variant is fatal: no partially decoded element is ever yielded.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The input file could not be opened.
    #[error("failed to open OSM extract at {path:?}")]
    Open {
        /// Path of the extract.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The markup itself is malformed, or the decompressed stream failed.
    #[error("malformed OSM XML near byte {position}")]
    Xml {
        /// Byte offset into the decompressed stream.
        position: u64,
        /// Error reported by `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// An attribute of `tag` could not be decoded.
    #[error("malformed attribute on <{tag}>")]
    MalformedAttribute {
        /// Tag carrying the attribute.
        tag: String,
        /// Error reported by `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// A required attribute is absent.
    #[error("<{tag}> is missing the {attribute:?} attribute")]
    MissingAttribute {
        /// Tag missing the attribute.
        tag: String,
        /// Name of the absent attribute.
        attribute: &'static str,
    },
    /// An attribute value could not be parsed.
    #[error("<{tag}> has an invalid {attribute:?} value {value:?}")]
    InvalidAttribute {
        /// Tag carrying the attribute.
        tag: String,
        /// Attribute name.
        attribute: &'static str,
        /// Raw attribute value.
        value: String,
    },
    /// A relation member declares a type outside node/way/relation.
    #[error("{parent} has a member of unknown type {value:?}")]
    UnknownMemberType {
        /// Relation declaring the member.
        parent: ElementKey,
        /// Raw `type` value.
        value: String,
    },
    /// An element opened inside another element.
    #[error("<{inner}> opened inside {outer}")]
    NestedElement {
        /// Element still open.
        outer: ElementKey,
        /// Tag of the nested element.
        inner: String,
    },
    /// The stream ended while an element was still open.
    #[error("stream ended inside {open}")]
    UnexpectedEof {
        /// Element left open.
        open: ElementKey,
    },
}
