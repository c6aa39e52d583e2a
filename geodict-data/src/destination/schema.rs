use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `geodict_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Spatial reference of every stored point (WGS84).
pub const DESTINATION_SRID: i64 = 4326;

/// Create the `entity` and `location` tables inside an existing database.
///
/// Tables are created only when missing, so the function may run against a
/// destination that already holds entities from earlier loads. An existing
/// schema of a different version is rejected.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use geodict_data::destination::initialise_destination;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_destination(&mut conn).expect("create destination schema");
/// initialise_destination(&mut conn).expect("schema creation is idempotent");
///
/// let srid: i64 = conn
///     .query_row("SELECT srid FROM geodict_schema_version LIMIT 1", [], |row| row.get(0))
///     .expect("read schema metadata");
/// assert_eq!(srid, 4326);
/// ```
pub fn initialise_destination(connection: &mut Connection) -> Result<(), DestinationSchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| DestinationSchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| DestinationSchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| DestinationSchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), DestinationSchemaError> {
    run_migration_step(
        transaction,
        "create entity",
        "CREATE TABLE IF NOT EXISTS entity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) > 0),
            category TEXT,
            subcategory TEXT,
            source TEXT NOT NULL,
            create_time TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create location",
        "CREATE TABLE IF NOT EXISTS location (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id INTEGER NOT NULL REFERENCES entity(id) ON DELETE CASCADE,
            lon REAL NOT NULL,
            lat REAL NOT NULL,
            geom TEXT NOT NULL
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), DestinationSchemaError> {
    run_migration_step(
        transaction,
        "index location by entity",
        "CREATE INDEX IF NOT EXISTS idx_location_entity ON location(entity_id)",
    )?;
    run_migration_step(
        transaction,
        "index entity by name",
        "CREATE INDEX IF NOT EXISTS idx_entity_name ON entity(name)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), DestinationSchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS geodict_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            srid INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM geodict_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| DestinationSchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(DestinationSchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO geodict_schema_version (version, srid) VALUES (?1, ?2)",
                [SCHEMA_VERSION, DESTINATION_SRID],
            )
            .map(|_| ())
            .map_err(|source| DestinationSchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), DestinationSchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| DestinationSchemaError::Migration { step, source })
}

/// Errors raised when initialising the destination schema.
#[derive(Debug, Error)]
pub enum DestinationSchemaError {
    /// Foreign key enforcement could not be enabled.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step being executed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database carries a different schema version.
    #[error(
        "expected destination schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build writes.
        expected: i64,
        /// Version found in the database.
        found: i64,
    },
}
