#![warn(missing_docs)]

//! Entry point for the `keyfx` binary.

mod check;
mod cli;
mod error;
mod replay;

use std::{io, process};

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {}", err.pretty());
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli { log, command } = Cli::parse();
    let env_filter = log.filter();
    // Stdout carries command output; logs go to stderr.
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .with(logging::diag::layer())
        .try_init()
        .ok();

    match command {
        Commands::Check { config } => check::run(&config),
        Commands::Replay(args) => replay::run(&args),
    }
}
