//! CLI argument definitions for opedit.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OPPARAMS_GIT_COMMIT"),
    ", built ",
    env!("OPPARAMS_BUILD_TIMESTAMP"),
    ")"
);

/// opedit - edit the shared parameter file read by a running process.
///
/// Output is JSON unless -H is given.
#[derive(Parser, Debug)]
#[command(name = "opedit")]
#[command(author, version, long_version = LONG_VERSION, about = "Edit the shared op_params parameter file", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Params file to edit (default: $OPPARAMS_FILE, then /data/op_params.json)
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,

    /// KDL schema file (default: $OPPARAMS_SCHEMA, then the built-in schema)
    #[arg(short = 's', long = "schema", global = true)]
    pub schema: Option<PathBuf>,

    /// Keep every change in memory instead of writing the file
    #[arg(long = "no-persist", global = true)]
    pub no_persist: bool,

    /// Write through a temporary file renamed over the params file
    #[arg(long = "atomic", global = true)]
    pub atomic: bool,

    /// Minimum milliseconds between re-reads of live parameters
    #[arg(long = "refresh-ms", global = true)]
    pub refresh_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List parameters and their current values
    List {
        /// Only show live parameters
        #[arg(long)]
        live: bool,

        /// Include hidden parameters
        #[arg(long)]
        all: bool,
    },

    /// Show one parameter's value, after type validation
    Get {
        /// Parameter name
        key: String,

        /// Re-read the file even if the parameter is not live
        #[arg(long)]
        force: bool,
    },

    /// Change a parameter, rejecting values of a type the schema doesn't allow
    ///
    /// VALUE is parsed as a JSON literal when possible (0.5, [1, 2], true,
    /// null); None/True/False are accepted too, anything else is a string.
    Set {
        /// Parameter name
        key: String,

        /// New value
        value: String,
    },

    /// Store a new parameter without schema validation
    Add {
        /// Parameter name
        key: String,

        /// Value (parsed like `set`)
        value: String,
    },

    /// Delete a parameter from the file
    Delete {
        /// Parameter name
        key: String,
    },

    /// Show schema details and the current value of a parameter
    Info {
        /// Parameter name
        key: String,
    },

    /// List parameter definitions
    Schema {
        /// Include hidden parameters
        #[arg(long)]
        all: bool,
    },

    /// Follow a parameter the way a running consumer sees it
    Watch {
        /// Parameter name
        key: String,

        /// Polling period in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Stop after this many observations (the first is the current value)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show the resolved store configuration and where each setting came from
    Config,
}
