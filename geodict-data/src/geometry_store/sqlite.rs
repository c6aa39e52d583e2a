//! SQLite-backed [`GeometryStore`] for extracts too large for memory.
//!
//! Each element kind has its own table keyed by the raw identifier, with the
//! coordinate sequence encoded by `bincode`. Writes are grouped into
//! transactions of `batch_size` puts; [`GeometryStore::flush`] commits the
//! open one so a finished tier is durable before the next begins.

use camino::{Utf8Path, Utf8PathBuf};
use geodict_core::{ElementKey, ElementKind, Geometry, GeometryStore};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, OptionalExtension};
use thiserror::Error;

use crate::batch::{begin_if_idle, commit_if_open};

/// Puts grouped into one transaction unless overridden.
pub const DEFAULT_STORE_BATCH_SIZE: usize = 50_000;

/// Errors raised by [`SqliteGeometryStore`].
#[derive(Debug, Error)]
pub enum SqliteGeometryStoreError {
    /// The parent directory of the store could not be created.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Store path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A store left over from an earlier run could not be removed.
    #[error("failed to remove stale geometry store {path:?}")]
    RemoveStale {
        /// Store path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open geometry store at {path:?}")]
    Open {
        /// Store path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A statement failed.
    #[error("geometry store operation '{operation}' failed")]
    Sqlite {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A geometry could not be encoded.
    #[error("failed to encode the geometry of {key}")]
    Encode {
        /// Element whose geometry failed.
        key: ElementKey,
        /// Source error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// A stored blob could not be decoded.
    #[error("failed to decode the stored geometry of {key}")]
    Decode {
        /// Element whose geometry failed.
        key: ElementKey,
        /// Source error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
}

const fn table_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "node_geometry",
        ElementKind::Way => "way_geometry",
        ElementKind::Relation => "relation_geometry",
    }
}

const fn insert_sql(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "INSERT OR REPLACE INTO node_geometry (id, coords) VALUES (?1, ?2)",
        ElementKind::Way => "INSERT OR REPLACE INTO way_geometry (id, coords) VALUES (?1, ?2)",
        ElementKind::Relation => {
            "INSERT OR REPLACE INTO relation_geometry (id, coords) VALUES (?1, ?2)"
        }
    }
}

const fn select_sql(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "SELECT coords FROM node_geometry WHERE id = ?1",
        ElementKind::Way => "SELECT coords FROM way_geometry WHERE id = ?1",
        ElementKind::Relation => "SELECT coords FROM relation_geometry WHERE id = ?1",
    }
}

/// [`GeometryStore`] persisted in a SQLite file.
///
/// # Examples
/// ```
/// use geodict_core::{Coordinate, ElementKey, Geometry, GeometryStore};
/// use geodict_data::SqliteGeometryStore;
///
/// # fn main() -> Result<(), geodict_data::SqliteGeometryStoreError> {
/// let mut store = SqliteGeometryStore::open_in_memory()?;
/// store.put(ElementKey::node(1), &Geometry::point(Coordinate::new(51.5, -0.1)))?;
/// store.flush()?;
/// assert_eq!(store.get(ElementKey::node(1))?.len(), 1);
/// assert!(store.get(ElementKey::way(1))?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteGeometryStore {
    connection: Connection,
    path: Option<Utf8PathBuf>,
    batch_size: usize,
    pending: usize,
}

impl SqliteGeometryStore {
    /// Create a fresh store at `path`.
    ///
    /// Any file already at `path` is deleted first, since the store is
    /// working state for a single run. Missing parent directories are
    /// created.
    pub fn create(path: &Utf8Path) -> Result<Self, SqliteGeometryStoreError> {
        if geodict_fs::remove_file_if_exists(path).map_err(|source| {
            SqliteGeometryStoreError::RemoveStale {
                path: path.to_path_buf(),
                source,
            }
        })? {
            debug!("removed stale geometry store {path}");
        }
        geodict_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteGeometryStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let connection = Connection::open(path.as_std_path()).map_err(|source| {
            SqliteGeometryStoreError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::initialise(connection, Some(path.to_path_buf()))
    }

    /// Create a store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, SqliteGeometryStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteGeometryStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::initialise(connection, None)
    }

    /// Group `batch_size` puts per transaction; zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Backing file, or `None` for an in-memory store.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Commit outstanding puts and close the connection.
    pub fn close(mut self) -> Result<(), SqliteGeometryStoreError> {
        self.commit()?;
        self.connection
            .close()
            .map_err(|(_, source)| SqliteGeometryStoreError::Sqlite {
                operation: "close geometry store",
                source,
            })
    }

    fn initialise(
        connection: Connection,
        path: Option<Utf8PathBuf>,
    ) -> Result<Self, SqliteGeometryStoreError> {
        connection
            .pragma_update(None, "synchronous", "OFF")
            .map_err(|source| SqliteGeometryStoreError::Sqlite {
                operation: "disable synchronous writes",
                source,
            })?;
        connection
            .pragma_update_and_check(None, "journal_mode", "MEMORY", |row| {
                row.get::<_, String>(0)
            })
            .map_err(|source| SqliteGeometryStoreError::Sqlite {
                operation: "set journal mode",
                source,
            })?;
        for kind in ElementKind::ALL {
            connection
                .execute(
                    &format!(
                        "CREATE TABLE IF NOT EXISTS {} (
                            id INTEGER PRIMARY KEY NOT NULL,
                            coords BLOB NOT NULL
                        )",
                        table_name(kind)
                    ),
                    [],
                )
                .map_err(|source| SqliteGeometryStoreError::Sqlite {
                    operation: "create geometry tables",
                    source,
                })?;
        }
        Ok(Self {
            connection,
            path,
            batch_size: DEFAULT_STORE_BATCH_SIZE,
            pending: 0,
        })
    }

    fn commit(&mut self) -> Result<(), SqliteGeometryStoreError> {
        commit_if_open(&self.connection).map_err(|source| SqliteGeometryStoreError::Sqlite {
            operation: "commit geometry batch",
            source,
        })?;
        self.pending = 0;
        Ok(())
    }
}

impl GeometryStore for SqliteGeometryStore {
    type Error = SqliteGeometryStoreError;

    fn put(&mut self, key: ElementKey, geometry: &Geometry) -> Result<(), Self::Error> {
        let blob = bincode::serialize(geometry)
            .map_err(|source| SqliteGeometryStoreError::Encode { key, source })?;
        begin_if_idle(&self.connection).map_err(|source| SqliteGeometryStoreError::Sqlite {
            operation: "begin geometry batch",
            source,
        })?;
        self.connection
            .prepare_cached(insert_sql(key.kind))
            .and_then(|mut statement| statement.execute((key.id.0, blob)))
            .map_err(|source| SqliteGeometryStoreError::Sqlite {
                operation: "insert geometry",
                source,
            })?;
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.commit()?;
        }
        Ok(())
    }

    fn lookup(&self, key: ElementKey) -> Result<Option<Geometry>, Self::Error> {
        let blob: Option<Vec<u8>> = self
            .connection
            .prepare_cached(select_sql(key.kind))
            .and_then(|mut statement| {
                statement
                    .query_row([key.id.0], |row| row.get(0))
                    .optional()
            })
            .map_err(|source| SqliteGeometryStoreError::Sqlite {
                operation: "select geometry",
                source,
            })?;
        blob.map(|bytes| {
            bincode::deserialize(&bytes)
                .map_err(|source| SqliteGeometryStoreError::Decode { key, source })
        })
        .transpose()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.commit()
    }
}
