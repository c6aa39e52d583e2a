//! Opening OSM extracts with transparent decompression.

use std::io::{BufRead, BufReader};

use bzip2::read::MultiBzDecoder;
use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use geodict_fs::open_utf8_file;

use super::ReadError;

/// Compression applied to an extract, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain XML.
    None,
    /// `.bz2`, possibly made of several concatenated streams.
    Bzip2,
    /// `.gz`, possibly made of several concatenated members.
    Gzip,
}

impl Compression {
    /// Detect the compression from the extension of `path`, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use geodict_data::osm::Compression;
    ///
    /// assert_eq!(Compression::from_path(Utf8Path::new("planet.osm.BZ2")), Compression::Bzip2);
    /// assert_eq!(Compression::from_path(Utf8Path::new("city.osm")), Compression::None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("bz2") => Self::Bzip2,
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Self::Gzip,
            _ => Self::None,
        }
    }
}

/// Open `path` as a buffered stream of decompressed XML.
///
/// Decompression failures surface later as [`ReadError::Xml`] from the
/// element reader.
pub fn open_osm_source(path: &Utf8Path) -> Result<Box<dyn BufRead + Send>, ReadError> {
    let file = open_utf8_file(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn BufRead + Send> = match Compression::from_path(path) {
        Compression::None => Box::new(BufReader::new(file)),
        Compression::Bzip2 => Box::new(BufReader::new(MultiBzDecoder::new(file))),
        Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(file))),
    };
    Ok(reader)
}
