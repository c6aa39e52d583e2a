//! Load command implementation for the geodict CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geodict_core::MemoryGeometryStore;
use geodict_data::{
    LoadOptions, OsmLoadReport, SqliteEntitySink, load_osm_extract, load_osm_extract_to_sqlite,
};
use log::{debug, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BATCH_SIZE, ARG_DATABASE, ARG_GEOMETRY_STORE, ARG_IN_MEMORY_GEOMETRY,
    ARG_KEEP_GEOMETRY_STORE, ARG_OSM, ARG_SOURCE, CliError, ENV_DATABASE, ENV_OSM,
};

/// File name of the working geometry store when none is configured. It is
/// placed beside the input extract.
pub(crate) const DEFAULT_GEOMETRY_STORE_NAME: &str = "geometry.sqlite3";

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream an OSM XML extract (optionally .bz2 or .gz) twice: \
                 first resolving every element's geometry into a working \
                 store, then writing each named element to the destination \
                 database. Paths can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Load an OSM extract into a gazetteer database"
)]
#[ortho_config(prefix = "GEODICT")]
pub(crate) struct LoadArgs {
    /// Path to the OSM XML extract (`.osm`, `.osm.bz2` or `.osm.gz`).
    #[arg(long = ARG_OSM, value_name = "path")]
    #[serde(default)]
    pub(crate) osm: Option<Utf8PathBuf>,
    /// Path to the destination SQLite database; created when missing.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Working geometry store. Defaults to `geometry.sqlite3` beside the
    /// extract and is replaced on every run.
    #[arg(long = ARG_GEOMETRY_STORE, value_name = "path")]
    #[serde(default)]
    pub(crate) geometry_store: Option<Utf8PathBuf>,
    /// Resolve geometries in memory instead of an on-disk store.
    #[arg(long = ARG_IN_MEMORY_GEOMETRY)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) in_memory_geometry: bool,
    /// Entities written per destination transaction.
    #[arg(long = ARG_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) batch_size: Option<usize>,
    /// Provenance tag stored with every entity.
    #[arg(long = ARG_SOURCE, value_name = "tag")]
    #[serde(default)]
    pub(crate) source: Option<String>,
    /// Keep the on-disk geometry store after the run.
    #[arg(long = ARG_KEEP_GEOMETRY_STORE)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) keep_geometry_store: bool,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Where Pass 1 keeps resolved geometries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GeometryStoreChoice {
    /// In-process map; nothing touches the disk.
    InMemory,
    /// SQLite file at `path`, removed after the run unless `keep` is set.
    OnDisk { path: Utf8PathBuf, keep: bool },
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    /// Input extract.
    pub(crate) osm: Utf8PathBuf,
    /// Destination database.
    pub(crate) database: Utf8PathBuf,
    /// Working geometry store.
    pub(crate) geometry: GeometryStoreChoice,
    /// Provenance tag and batch size handed to the loader.
    pub(crate) options: LoadOptions,
}

impl LoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.osm, ARG_OSM)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match geodict_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let osm = args.osm.ok_or(CliError::MissingArgument {
            field: ARG_OSM,
            env: ENV_OSM,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;

        let mut options = LoadOptions::default();
        if let Some(batch_size) = args.batch_size {
            if batch_size == 0 {
                return Err(CliError::InvalidArgument {
                    field: ARG_BATCH_SIZE,
                    reason: "must be at least 1",
                });
            }
            options = options.with_batch_size(batch_size);
        }
        if let Some(source) = args.source {
            if source.trim().is_empty() {
                return Err(CliError::InvalidArgument {
                    field: ARG_SOURCE,
                    reason: "must not be blank",
                });
            }
            options = options.with_source(source);
        }

        let geometry = if args.in_memory_geometry {
            if args.geometry_store.is_some() {
                return Err(CliError::InvalidArgument {
                    field: ARG_GEOMETRY_STORE,
                    reason: "cannot be combined with --in-memory-geometry",
                });
            }
            GeometryStoreChoice::InMemory
        } else {
            let path = args
                .geometry_store
                .unwrap_or_else(|| geodict_fs::sibling_path(&osm, DEFAULT_GEOMETRY_STORE_NAME));
            if path == osm || path == database {
                return Err(CliError::InvalidArgument {
                    field: ARG_GEOMETRY_STORE,
                    reason: "must differ from --osm and --database",
                });
            }
            GeometryStoreChoice::OnDisk {
                path,
                keep: args.keep_geometry_store,
            }
        };

        Ok(Self {
            osm,
            database,
            geometry,
            options,
        })
    }
}

pub(crate) fn run_load(args: LoadArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_load_config(args)?;
    let report = execute_load(&config)?;
    write_load_report(writer, &config, &report)
}

pub(crate) fn resolve_load_config(args: LoadArgs) -> Result<LoadConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Run both passes for `config` and tidy the working store afterwards.
pub(crate) fn execute_load(config: &LoadConfig) -> Result<OsmLoadReport, CliError> {
    info!(
        "loading {} into {} (source {:?}, batch size {})",
        config.osm, config.database, config.options.source, config.options.batch_size
    );
    match &config.geometry {
        GeometryStoreChoice::InMemory => {
            let mut store = MemoryGeometryStore::default();
            let mut sink = SqliteEntitySink::open(&config.database, config.options.batch_size)
                .map_err(|source| CliError::OpenDestination {
                    path: config.database.clone(),
                    source,
                })?;
            load_osm_extract(&config.osm, &mut store, &mut sink, &config.options).map_err(
                |source| CliError::LoadInMemory {
                    path: config.osm.clone(),
                    source: Box::new(source),
                },
            )
        }
        GeometryStoreChoice::OnDisk { path, keep } => {
            let outcome =
                load_osm_extract_to_sqlite(&config.osm, &config.database, path, &config.options)
                    .map_err(|source| CliError::Load {
                        path: config.osm.clone(),
                        source: Box::new(source),
                    });
            if *keep {
                info!("kept geometry store at {path}");
                return outcome;
            }
            let removal = remove_geometry_store(path);
            let report = outcome?;
            removal?;
            Ok(report)
        }
    }
}

fn remove_geometry_store(path: &Utf8Path) -> Result<(), CliError> {
    let removed =
        geodict_fs::remove_file_if_exists(path).map_err(|source| CliError::RemoveGeometryStore {
            path: path.to_path_buf(),
            source,
        })?;
    if removed {
        debug!("removed geometry store {path}");
    }
    Ok(())
}

fn write_load_report(
    writer: &mut dyn Write,
    config: &LoadConfig,
    report: &OsmLoadReport,
) -> Result<(), CliError> {
    let resolve = &report.resolve;
    let emit = &report.emit;
    writeln!(writer, "loaded {} into {}", config.osm, config.database)
        .map_err(CliError::WriteReport)?;
    writeln!(
        writer,
        "  pass 1: {} nodes, {} ways, {} relations, {} dangling references",
        resolve.nodes, resolve.ways, resolve.relations, resolve.dangling_references
    )
    .map_err(CliError::WriteReport)?;
    if let Some(bounds) = resolve.bounds {
        writeln!(
            writer,
            "  bounds: lon {} to {}, lat {} to {}",
            bounds.min().x,
            bounds.max().x,
            bounds.min().y,
            bounds.max().y
        )
        .map_err(CliError::WriteReport)?;
    }
    writeln!(
        writer,
        "  pass 2: {} entities ({} merged continuations) with {} locations from {} named elements",
        emit.entities_created, emit.continuations, emit.locations_written, emit.named
    )
    .map_err(CliError::WriteReport)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<LoadConfig, CliError> {
    let merged = LoadArgs::merge_from_layers(layers).map_err(CliError::from)?;
    LoadConfig::try_from(merged)
}
