//! Test helpers for writing small extracts and inspecting load results.

use bzip2::{Compression, write::BzEncoder};
use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;
use std::{fs, io::Write};
use tempfile::TempDir;

/// Two named elements: a pub (node) and a street (way over two nodes).
pub(super) const HIGH_STREET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="51.45" lon="-0.97"/>
  <node id="2" lat="51.46" lon="-0.96"/>
  <node id="3" lat="51.455" lon="-0.965" timestamp="2010-01-01T00:00:00Z">
    <tag k="amenity" v="pub"/>
    <tag k="name" v="The Crown"/>
  </node>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="primary"/>
    <tag k="name" v="High Street"/>
  </way>
</osm>
"#;

/// Temporary workspace holding an extract and the paths a load writes to.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write the sample extract as plain XML.
    pub(super) fn plain_extract(&self) -> Utf8PathBuf {
        let path = self.root.join("high-street.osm");
        write_utf8(&path, HIGH_STREET_XML.as_bytes());
        path
    }

    /// Write the sample extract compressed with bzip2.
    pub(super) fn bzip2_extract(&self) -> Utf8PathBuf {
        let path = self.root.join("high-street.osm.bz2");
        let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(HIGH_STREET_XML.as_bytes())
            .expect("compress extract");
        write_utf8(&path, &encoder.finish().expect("finish compression"));
        path
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("out/gazetteer.sqlite3")
    }

    /// Where the load places its working store when none is configured.
    pub(super) fn default_geometry_store(&self) -> Utf8PathBuf {
        self.root.join(crate::load::DEFAULT_GEOMETRY_STORE_NAME)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
}

/// `(name, source)` of every entity, in id order.
pub(super) fn entity_rows(database: &Utf8Path) -> Vec<(String, String)> {
    let conn = Connection::open(database.as_std_path()).expect("open destination");
    let mut stmt = conn
        .prepare("SELECT name, source FROM entity ORDER BY id")
        .expect("prepare entity query");
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query entities")
        .collect::<Result<_, _>>()
        .expect("read entities")
}

pub(super) fn location_total(database: &Utf8Path) -> i64 {
    let conn = Connection::open(database.as_std_path()).expect("open destination");
    conn.query_row("SELECT COUNT(*) FROM location", [], |row| row.get(0))
        .expect("count locations")
}
