//! Shared helpers for the OSM loading integration tests.

use bzip2::write::BzEncoder;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::write::GzEncoder;
use rusqlite::Connection;
use std::{fs, io::Write, path::PathBuf};

/// Epsilon for floating-point coordinate comparisons in tests.
const COORDINATE_EPSILON: f64 = 1.0e-7;

/// Directory containing the checked-in fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Raw markup of the sample extract.
pub fn sample_xml() -> Vec<u8> {
    let path = fixtures_dir().join("sample.osm");
    fs::read(&path).unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"))
}

/// How a fixture is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Bzip2,
    Gzip,
}

impl Encoding {
    pub fn parse(raw: &str) -> Self {
        match raw.trim_matches('"') {
            "plain" => Self::Plain,
            "bzip2" => Self::Bzip2,
            "gzip" => Self::Gzip,
            other => panic!("unknown fixture encoding {other:?}"),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Plain => "osm",
            Self::Bzip2 => "osm.bz2",
            Self::Gzip => "osm.gz",
        }
    }
}

/// Write `xml` into `dir` using `encoding` and return the file path.
pub fn write_extract(dir: &Utf8Path, xml: &[u8], encoding: Encoding) -> Utf8PathBuf {
    let path = dir.join(format!("extract.{}", encoding.extension()));
    let bytes = match encoding {
        Encoding::Plain => xml.to_vec(),
        Encoding::Bzip2 => {
            let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
            encoder.write_all(xml).expect("compress fixture");
            encoder.finish().expect("finish bzip2 stream")
        }
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(xml).expect("compress fixture");
            encoder.finish().expect("finish gzip stream")
        }
    };
    fs::write(&path, bytes).unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
    path
}

/// UTF-8 view of a temporary directory.
pub fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
}

/// One destination entity with its points in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub name: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub create_time: String,
    pub points: Vec<(f64, f64)>,
}

/// Read every entity from the destination at `path`, in id order.
pub fn read_entities(path: &Utf8Path) -> Vec<StoredEntity> {
    let conn = Connection::open(path.as_std_path()).expect("open destination");
    let mut entities = conn
        .prepare("SELECT id, name, category, subcategory, create_time FROM entity ORDER BY id")
        .expect("prepare entity query")
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                StoredEntity {
                    name: row.get(1)?,
                    category: row.get(2)?,
                    subcategory: row.get(3)?,
                    create_time: row.get(4)?,
                    points: Vec::new(),
                },
            ))
        })
        .expect("query entities")
        .collect::<Result<Vec<_>, _>>()
        .expect("read entities");

    let mut points = conn
        .prepare("SELECT lat, lon FROM location WHERE entity_id = ?1 ORDER BY id")
        .expect("prepare location query");
    for (id, entity) in &mut entities {
        entity.points = points
            .query_map([*id], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("query locations")
            .collect::<Result<_, _>>()
            .expect("read locations");
    }
    entities.into_iter().map(|(_, entity)| entity).collect()
}

/// Compare floating-point coordinates within a small epsilon.
pub fn assert_close(actual: f64, expected: f64) {
    let delta = (actual - expected).abs();
    assert!(
        delta <= COORDINATE_EPSILON,
        "expected {expected}, got {actual} (|Δ| = {delta})"
    );
}
