//! Command-line interface definitions for keyfx.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;

/// Command-line interface for the `keyfx` binary.
#[derive(Parser, Debug)]
#[command(
    name = "keyfx",
    about = "Key behavior engine: check configs and replay edge scripts",
    version
)]
pub struct Cli {
    /// Logging controls shared across keyfx binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a configuration, build every behavior, and list the bindings.
    Check {
        /// Path to a keyfx configuration file (RON).
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Drive an engine built from a configuration with a timestamped script
    /// of input edges, printing every edge it sends.
    Replay(ReplayArgs),
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Path to a keyfx configuration file (RON).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Script of `<ms> down|up <key>`, `<ms> focus <window>` and
    /// `<ms> focus-fail` lines.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// How long to keep running after the last scripted edge so pending
    /// timers can fire.
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub settle_ms: u64,

    /// Run against the wall clock instead of a virtual one.
    #[arg(long)]
    pub realtime: bool,

    /// Also append every log record to this file.
    #[arg(long, value_name = "PATH")]
    pub diag_log: Option<PathBuf>,
}
