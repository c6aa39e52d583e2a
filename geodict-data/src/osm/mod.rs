//! OSM XML extracts: decoding, the two resolution passes and their
//! orchestration.
#![forbid(unsafe_code)]

mod emit;
mod error;
mod extract;
mod load;
mod reader;
mod resolve;
mod source;

pub use emit::{EmitError, EmitSummary, emit_entities};
pub use error::ReadError;
pub use extract::describe_element;
pub use load::{
    LoadOptions, OsmLoadError, OsmLoadReport, load_osm_elements, load_osm_extract,
    load_osm_extract_to_sqlite,
};
pub use reader::{ElementReader, KindFilter};
pub use resolve::{Resolution, ResolveError, ResolveSummary, resolve_element, resolve_geometries};
pub use source::{Compression, open_osm_source};
