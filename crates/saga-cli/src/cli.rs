//! Command-line argument definitions for `saga-nextgen`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for the saga-nextgen provider.
#[derive(Parser, Debug)]
#[command(name = "saga-nextgen", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations offered by the binary.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Lists the algorithms found in a description directory.
    Discover {
        /// Directory holding `*.txt` description units.
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Prints the parameters of one algorithm.
    Describe {
        /// Directory holding `*.txt` description units.
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Internal algorithm name, for example `fillsinks`.
        #[arg(value_name = "ALGORITHM")]
        algorithm: String,
    },
    /// Runs one algorithm through `saga_cmd`.
    Run {
        /// Directory holding `*.txt` description units.
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Internal algorithm name, for example `fillsinks`.
        #[arg(value_name = "ALGORITHM")]
        algorithm: String,
        /// Parameter assignments such as `DEM=/data/dem.sdat`.
        #[arg(value_name = "KEY=VALUE", num_args = 0..)]
        assignments: Vec<String>,
    },
    /// Reports the installed `saga_cmd` version.
    Probe {
        /// Ignore any cached outcome.
        #[arg(long)]
        force: bool,
    },
}
