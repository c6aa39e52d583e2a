//! Error types emitted by the geodict CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::{convert::Infallible, sync::Arc};

use camino::Utf8PathBuf;
use geodict_data::{OsmLoadError, SqliteEntitySinkError, SqliteGeometryStoreError};
use thiserror::Error;

/// Errors emitted by the geodict CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was supplied with a value the loader cannot use.
    #[error("invalid --{field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Loading through the on-disk geometry store failed.
    #[error("failed to load {path:?}: {source}")]
    Load {
        path: Utf8PathBuf,
        #[source]
        source: Box<OsmLoadError<SqliteGeometryStoreError, SqliteEntitySinkError>>,
    },
    /// Loading through the in-process geometry store failed.
    #[error("failed to load {path:?}: {source}")]
    LoadInMemory {
        path: Utf8PathBuf,
        #[source]
        source: Box<OsmLoadError<Infallible, SqliteEntitySinkError>>,
    },
    /// Opening the destination database failed.
    #[error("failed to open destination {path:?}: {source}")]
    OpenDestination {
        path: Utf8PathBuf,
        #[source]
        source: SqliteEntitySinkError,
    },
    /// Removing the working geometry store after the run failed.
    #[error("failed to remove geometry store {path:?}: {source}")]
    RemoveGeometryStore {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing the run report failed.
    #[error("failed to write load report: {0}")]
    WriteReport(#[source] std::io::Error),
}
