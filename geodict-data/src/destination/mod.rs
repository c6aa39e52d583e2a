//! SQLite destination for gazetteer entities and their locations.
#![forbid(unsafe_code)]

mod schema;
mod sqlite;

pub use schema::{DESTINATION_SRID, DestinationSchemaError, SCHEMA_VERSION, initialise_destination};
pub use sqlite::{DEFAULT_BATCH_SIZE, SqliteEntitySink, SqliteEntitySinkError};
