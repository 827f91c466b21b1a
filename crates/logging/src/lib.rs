#![warn(missing_docs)]

//! Logging setup shared by the keyfx binaries.
//!
//! [`LogArgs`] adds the verbosity flags to a clap parser and turns them into
//! an [`EnvFilter`]. Level flags only raise verbosity for keyfx's own targets,
//! so dependencies stay quiet. [`fmt`] renders events as single lines and
//! [`diag`] copies them into a diagnostic log file.

use std::env;

use clap::Args;
use tracing_subscriber::EnvFilter;

pub mod diag;
pub mod fmt;

/// Tracing targets that belong to keyfx.
pub const TARGETS: &[&str] = &["keyfx", "keyfx_engine", "keyfx_config", "logging"];

/// Level used when no flag and no `RUST_LOG` says otherwise.
const DEFAULT_LEVEL: &str = "info";

/// Verbosity flags. At most one of `--trace`, `--debug` and `--log-level`
/// applies; `--log-filter` beats all of them.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Trace keyfx targets (shorthand for `--log-level trace`)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Debug keyfx targets (shorthand for `--log-level debug`)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Level for keyfx targets: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Raw filter directives, used as given,
    /// e.g. "keyfx_engine=trace,keyfx=debug"
    #[arg(long, value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// The level these flags ask for, if any.
    fn level(&self) -> Option<&str> {
        if self.trace {
            Some("trace")
        } else if self.debug {
            Some("debug")
        } else {
            self.log_level.as_deref()
        }
    }

    /// Filter directives these flags select.
    ///
    /// An explicit `--log-filter` is used verbatim. A level flag applies to
    /// [`TARGETS`]. Otherwise `RUST_LOG` is honored, falling back to `info`
    /// for keyfx targets.
    pub fn spec(&self) -> String {
        if let Some(raw) = &self.log_filter {
            return raw.clone();
        }
        match self.level() {
            Some(level) => targets_at(level),
            None => env::var("RUST_LOG").unwrap_or_else(|_| targets_at(DEFAULT_LEVEL)),
        }
    }

    /// The [`EnvFilter`] for [`spec`](Self::spec).
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::new(self.spec())
    }
}

/// Directives setting every keyfx target to `level`.
pub fn targets_at(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_filter_is_used_verbatim() {
        let args = LogArgs {
            log_level: Some("warn".into()),
            log_filter: Some("keyfx=trace".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), "keyfx=trace");
    }

    #[test]
    fn level_flags_cover_every_target() {
        let args = LogArgs {
            trace: true,
            ..LogArgs::default()
        };
        let spec = args.spec();
        for t in TARGETS {
            assert!(spec.contains(&format!("{t}=trace")), "{spec}");
        }

        let args = LogArgs {
            log_level: Some("WARN".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), targets_at("warn"));
    }

    #[test]
    fn debug_flag_selects_debug() {
        let args = LogArgs {
            debug: true,
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), targets_at("debug"));
    }
}
