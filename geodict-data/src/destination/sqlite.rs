//! Batched [`EntitySink`] writing to the SQLite destination schema.

use camino::{Utf8Path, Utf8PathBuf};
use geodict_core::{EntityId, EntityRecord, EntitySink, Geometry};
use log::debug;
use rusqlite::{Connection, Error as SqliteError};
use thiserror::Error;

use super::schema::{DestinationSchemaError, initialise_destination};
use crate::batch::{begin_if_idle, commit_if_open};

/// Entities committed per transaction unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

const INSERT_ENTITY: &str = "INSERT INTO entity (name, category, subcategory, source, create_time)
    VALUES (?1, ?2, ?3, ?4, COALESCE(?5, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))";
const INSERT_LOCATION: &str =
    "INSERT INTO location (entity_id, lon, lat, geom) VALUES (?1, ?2, ?3, ?4)";

/// Errors raised by [`SqliteEntitySink`].
#[derive(Debug, Error)]
pub enum SqliteEntitySinkError {
    /// The parent directory of the destination could not be created.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the destination database failed.
    #[error("failed to open destination database at {path:?}")]
    Open {
        /// Destination path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the destination schema failed.
    #[error(transparent)]
    Schema(#[from] DestinationSchemaError),
    /// A write failed.
    #[error("destination operation '{operation}' failed")]
    Sqlite {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

impl SqliteEntitySinkError {
    fn sqlite(operation: &'static str) -> impl FnOnce(SqliteError) -> Self {
        move |source| Self::Sqlite { operation, source }
    }
}

/// Writes entities and their locations, committing every `batch_size`
/// created entities.
///
/// A commit only ever happens before a new entity is created, so an entity
/// and every location appended to it land in the same transaction. If a
/// write fails, earlier batches stay committed.
///
/// # Examples
/// ```
/// use geodict_core::{Coordinate, EntityRecord, EntitySink, Geometry};
/// use geodict_data::SqliteEntitySink;
/// use rusqlite::Connection;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sink = SqliteEntitySink::from_connection(Connection::open_in_memory()?, 100)?;
/// let record = EntityRecord::new("Reading", "OpenStreetMap")?.with_category("place", "town");
/// let id = sink.create_entity(&record)?;
/// sink.append_locations(id, &Geometry::point(Coordinate::new(51.45, -0.97)))?;
/// sink.finish()?;
///
/// let geom: String = sink
///     .connection()
///     .query_row("SELECT geom FROM location WHERE entity_id = ?1", [id.0], |row| row.get(0))?;
/// assert_eq!(geom, "POINT(-0.97 51.45)");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteEntitySink {
    connection: Connection,
    batch_size: usize,
    created_in_batch: usize,
}

impl SqliteEntitySink {
    /// Open (or create) the destination database at `path`.
    ///
    /// Missing parent directories are created and the schema is initialised
    /// if absent; existing entities are kept.
    pub fn open(path: &Utf8Path, batch_size: usize) -> Result<Self, SqliteEntitySinkError> {
        geodict_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteEntitySinkError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteEntitySinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection, batch_size)
    }

    /// Wrap an existing connection, initialising the schema if needed.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn from_connection(
        mut connection: Connection,
        batch_size: usize,
    ) -> Result<Self, SqliteEntitySinkError> {
        initialise_destination(&mut connection)?;
        Ok(Self {
            connection,
            batch_size: batch_size.max(1),
            created_in_batch: 0,
        })
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Commit outstanding writes and return the connection.
    pub fn into_connection(mut self) -> Result<Connection, SqliteEntitySinkError> {
        self.commit()?;
        Ok(self.connection)
    }

    fn commit(&mut self) -> Result<(), SqliteEntitySinkError> {
        commit_if_open(&self.connection).map_err(SqliteEntitySinkError::sqlite("commit batch"))?;
        if self.created_in_batch > 0 {
            debug!("committed {} entities", self.created_in_batch);
        }
        self.created_in_batch = 0;
        Ok(())
    }
}

impl EntitySink for SqliteEntitySink {
    type Error = SqliteEntitySinkError;

    fn create_entity(&mut self, record: &EntityRecord) -> Result<EntityId, Self::Error> {
        if self.created_in_batch >= self.batch_size {
            self.commit()?;
        }
        begin_if_idle(&self.connection).map_err(SqliteEntitySinkError::sqlite("begin batch"))?;
        self.connection
            .prepare_cached(INSERT_ENTITY)
            .and_then(|mut statement| {
                statement.execute((
                    record.name.as_str(),
                    record.category.as_deref(),
                    record.subcategory.as_deref(),
                    record.source.as_str(),
                    record.create_time.as_deref(),
                ))
            })
            .map_err(SqliteEntitySinkError::sqlite("insert entity"))?;
        self.created_in_batch += 1;
        Ok(EntityId(self.connection.last_insert_rowid()))
    }

    fn append_locations(
        &mut self,
        entity: EntityId,
        geometry: &Geometry,
    ) -> Result<(), Self::Error> {
        begin_if_idle(&self.connection).map_err(SqliteEntitySinkError::sqlite("begin batch"))?;
        let mut statement = self
            .connection
            .prepare_cached(INSERT_LOCATION)
            .map_err(SqliteEntitySinkError::sqlite("prepare insert location"))?;
        for coordinate in geometry {
            let wkt = format!("POINT({} {})", coordinate.lon, coordinate.lat);
            statement
                .execute((entity.0, coordinate.lon, coordinate.lat, wkt))
                .map_err(SqliteEntitySinkError::sqlite("insert location"))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.commit()
    }
}

#[cfg(test)]
mod tests;
