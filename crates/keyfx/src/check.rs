//! Validate a configuration by building the engine it describes.

use std::{
    io::{self, Write},
    path::Path,
    sync::Arc,
};

use keyfx_config::Config;
use keyfx_engine::{Engine, NoPhysical, NoWindow, TraceEmitter};

use crate::error::Result;

/// Run the `check` subcommand, printing a summary to stdout.
pub fn run(path: &Path) -> Result<()> {
    let config = keyfx_config::load_from_path(path)?;
    let mut out = io::stdout().lock();
    summarize(&config, &mut out)?;
    Ok(())
}

/// Build `config` into a throwaway engine and describe it to `out`.
fn summarize(config: &Config, out: &mut impl Write) -> Result<()> {
    let engine = Engine::from_config(
        config,
        Arc::new(TraceEmitter),
        Arc::new(NoPhysical),
        Arc::new(NoWindow),
    )?;
    writeln!(
        out,
        "ok: {} behaviors, {} bindings",
        config.behaviors.len(),
        config.bindings.len()
    )?;
    for (input, name) in &config.bindings {
        let kind = engine.behavior(name).map_or("?", |b| b.name());
        writeln!(out, "  {input} -> {name} ({kind})")?;
    }
    let unbound: Vec<&str> = config
        .behaviors
        .keys()
        .filter(|n| !config.bindings.iter().any(|(_, b)| b == *n))
        .map(String::as_str)
        .collect();
    if !unbound.is_empty() {
        writeln!(out, "  not bound: {}", unbound.join(", "))?;
    }
    Ok(())
}
