//! Parse and load user configuration.

use std::{ffi::OsStr, fmt::Display, fs, path::Path};

use ron::{Options, extensions::Extensions};
use tracing::debug;

use crate::{Config, Error, error::excerpt_at};

/// Load and validate a `Config` from a RON file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, Error> {
    if path.extension() != Some(OsStr::new("ron")) {
        return Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported config format (expected a .ron file)".to_string(),
        });
    }
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source, Some(path))
}

/// Parse and validate a `Config` from RON text. `path` is only used for
/// error reporting.
pub fn load_from_str(source: &str, path: Option<&Path>) -> Result<Config, Error> {
    let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    let config: Config = options
        .from_str(source)
        .map_err(|e| parse_error(source, path, &e))?;
    config.validate().map_err(|e| e.with_path(path))?;
    debug!(
        behaviors = config.behaviors.len(),
        bindings = config.bindings.len(),
        "config_loaded"
    );
    Ok(config)
}

/// Convert a rendered RON error into a located parse error.
fn parse_error(source: &str, path: Option<&Path>, err: &impl Display) -> Error {
    let text = err.to_string();
    let (line, col, message) = split_position(&text).unwrap_or((1, 1, text));
    Error::Parse {
        path: path.map(Path::to_path_buf),
        line,
        col,
        excerpt: excerpt_at(source, line, col),
        message,
    }
}

/// Split the leading `line:col` position (optionally a `line:col-line:col`
/// span) off a rendered RON error.
fn split_position(text: &str) -> Option<(usize, usize, String)> {
    let (loc, message) = text.split_once(": ")?;
    let start = loc.split('-').next()?;
    let (line, col) = start.split_once(':')?;
    Some((line.parse().ok()?, col.parse().ok()?, message.to_string()))
}
