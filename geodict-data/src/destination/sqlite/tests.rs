//! Unit tests for the SQLite entity sink.

use super::*;
use geodict_core::Coordinate;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn db_path(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("nested/gazetteer.sqlite3")).expect("utf-8 path")
}

fn record(name: &str) -> EntityRecord {
    EntityRecord::new(name, "OpenStreetMap")
        .expect("valid name")
        .with_category("place", "village")
}

fn count(connection: &Connection, table: &str) -> i64 {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count rows")
}

#[rstest]
fn writes_entity_attributes_and_points() {
    let mut sink = SqliteEntitySink::from_connection(
        Connection::open_in_memory().expect("open database"),
        10,
    )
    .expect("open sink");
    let id = sink
        .create_entity(&record("Pangbourne").with_create_time("2010-01-01T00:00:00Z"))
        .expect("create entity");
    let geometry: Geometry = vec![Coordinate::new(51.48, -1.08), Coordinate::new(51.49, -1.09)].into();
    sink.append_locations(id, &geometry).expect("append");
    sink.finish().expect("finish");

    let conn = sink.connection();
    let row: (String, Option<String>, Option<String>, String, String) = conn
        .query_row(
            "SELECT name, category, subcategory, source, create_time FROM entity WHERE id = ?1",
            [id.0],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .expect("read entity");
    assert_eq!(row.0, "Pangbourne");
    assert_eq!(row.1.as_deref(), Some("place"));
    assert_eq!(row.2.as_deref(), Some("village"));
    assert_eq!(row.3, "OpenStreetMap");
    assert_eq!(row.4, "2010-01-01T00:00:00Z");

    let points: Vec<String> = conn
        .prepare("SELECT geom FROM location WHERE entity_id = ?1 ORDER BY id")
        .expect("prepare")
        .query_map([id.0], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("read points");
    assert_eq!(points, vec!["POINT(-1.08 51.48)", "POINT(-1.09 51.49)"]);
}

#[rstest]
fn stamps_missing_creation_time() {
    let mut sink = SqliteEntitySink::from_connection(
        Connection::open_in_memory().expect("open database"),
        10,
    )
    .expect("open sink");
    let plain = EntityRecord::new("Goring", "OpenStreetMap").expect("valid name");
    let id = sink.create_entity(&plain).expect("create entity");
    let (category, create_time): (Option<String>, String) = sink
        .connection()
        .query_row(
            "SELECT category, create_time FROM entity WHERE id = ?1",
            [id.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("read entity");
    assert_eq!(category, None);
    assert!(create_time.ends_with('Z'), "unexpected timestamp {create_time}");
}

#[rstest]
fn identities_increase_with_creation_order() {
    let mut sink = SqliteEntitySink::from_connection(
        Connection::open_in_memory().expect("open database"),
        2,
    )
    .expect("open sink");
    let ids: Vec<EntityId> = ["A", "B", "C"]
        .into_iter()
        .map(|name| sink.create_entity(&record(name)).expect("create"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[rstest]
fn commits_every_batch(temp_dir: TempDir) {
    let path = db_path(&temp_dir);
    let mut sink = SqliteEntitySink::open(&path, 2).expect("open sink");
    for name in ["A", "B", "C"] {
        let id = sink.create_entity(&record(name)).expect("create");
        sink.append_locations(id, &Geometry::point(Coordinate::new(1.0, 2.0)))
            .expect("append");
    }

    let observer = Connection::open(path.as_std_path()).expect("open observer");
    assert_eq!(count(&observer, "entity"), 2, "first batch is committed");
    assert_eq!(count(&observer, "location"), 2);

    sink.finish().expect("finish");
    assert_eq!(count(&observer, "entity"), 3);
    assert_eq!(count(&observer, "location"), 3);
}

#[rstest]
fn reopening_keeps_existing_entities(temp_dir: TempDir) {
    let path = db_path(&temp_dir);
    {
        let mut sink = SqliteEntitySink::open(&path, 10).expect("open sink");
        sink.create_entity(&record("A")).expect("create");
        sink.finish().expect("finish");
    }
    let sink = SqliteEntitySink::open(&path, 10).expect("reopen sink");
    let connection = sink.into_connection().expect("release connection");
    assert_eq!(count(&connection, "entity"), 1);
}

#[rstest]
fn failed_writes_keep_earlier_batches(temp_dir: TempDir) {
    let path = db_path(&temp_dir);
    let mut sink = SqliteEntitySink::open(&path, 1).expect("open sink");
    let first = sink.create_entity(&record("A")).expect("create");
    sink.append_locations(first, &Geometry::point(Coordinate::new(0.0, 0.0)))
        .expect("append");
    sink.create_entity(&record("B")).expect("create second");
    let err = sink
        .append_locations(EntityId(9_999), &Geometry::point(Coordinate::new(0.0, 0.0)))
        .expect_err("foreign key violation");
    assert!(matches!(err, SqliteEntitySinkError::Sqlite { operation: "insert location", .. }));
    drop(sink);

    let observer = Connection::open(path.as_std_path()).expect("open observer");
    assert_eq!(count(&observer, "entity"), 1);
    assert_eq!(count(&observer, "location"), 1);
}
