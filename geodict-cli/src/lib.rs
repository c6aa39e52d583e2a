//! Command-line interface for loading OSM extracts into a geodict gazetteer.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{ArgAction, Parser, Subcommand};

mod error;
mod load;

pub use error::CliError;
use load::{LoadArgs, run_load};
#[cfg(test)]
use load::{LoadConfig, config_from_layers_for_test, execute_load, resolve_load_config};

pub(crate) const ARG_OSM: &str = "osm";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_GEOMETRY_STORE: &str = "geometry-store";
pub(crate) const ARG_IN_MEMORY_GEOMETRY: &str = "in-memory-geometry";
pub(crate) const ARG_BATCH_SIZE: &str = "batch-size";
pub(crate) const ARG_SOURCE: &str = "source";
pub(crate) const ARG_KEEP_GEOMETRY_STORE: &str = "keep-geometry-store";
pub(crate) const ENV_OSM: &str = "GEODICT_CMDS_LOAD_OSM";
pub(crate) const ENV_DATABASE: &str = "GEODICT_CMDS_LOAD_DATABASE";

/// Run the geodict CLI with the current process arguments and environment.
///
/// The run report is written to standard output; log lines go to standard
/// error.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging(cli.verbose);
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Load(args) => run_load(args, writer),
    }
}

const fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let env = env_logger::Env::default().default_filter_or(default_filter(verbosity));
    let installed = env_logger::Builder::from_env(env)
        .format_target(false)
        .format_module_path(false)
        .try_init();
    if installed.is_err() {
        log::debug!("logger already installed; keeping the existing one");
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "geodict",
    about = "Load OpenStreetMap extracts into a geographic dictionary",
    version
)]
struct Cli {
    /// Increase log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve an OSM XML extract and write its named entities.
    Load(LoadArgs),
}

#[cfg(test)]
mod tests;
