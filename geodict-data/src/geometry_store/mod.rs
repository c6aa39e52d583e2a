//! On-disk backing for the geometry resolution store.
#![forbid(unsafe_code)]

mod sqlite;

pub use sqlite::{DEFAULT_STORE_BATCH_SIZE, SqliteGeometryStore, SqliteGeometryStoreError};
