//! Error handling for the keyfx binary.

use std::{io, result};

use keyfx_engine::Error as EngineError;
use thiserror::Error;

/// Convenient result type for keyfx commands.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors raised while building the engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    /// Configuration loading or validation errors.
    #[error("Configuration error: {0}")]
    Config(#[from] keyfx_config::Error),
    /// A malformed replay script line.
    #[error("Script line {line}: {message}")]
    Script {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

impl Error {
    /// Helper to build a script error.
    pub fn script<M: Into<String>>(line: usize, msg: M) -> Self {
        Self::Script {
            line,
            message: msg.into(),
        }
    }

    /// Multi-line rendering for the terminal. Configuration errors carry a
    /// source excerpt.
    pub fn pretty(&self) -> String {
        match self {
            Self::Config(e) | Self::Engine(EngineError::Config(e)) => e.pretty(),
            other => other.to_string(),
        }
    }
}
