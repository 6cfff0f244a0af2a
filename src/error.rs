/// Error taxonomy for loading and navigation.
///
/// Only genuine failures are errors. Processing with nothing pending is a
/// no-op, and an unresolvable spawn degrades to a best-effort placement
/// (see `sim::transition`), so neither appears here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    /// Unregistered room, undiscovered graph node, missing spawn or tileset.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Malformed map, tileset, transition file or save.
    #[error("invalid format in {source_name}: {reason}")]
    InvalidFormat { source_name: String, reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NavError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        NavError::NotFound { what, id: id.into() }
    }

    pub fn invalid(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        NavError::InvalidFormat {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NavError::Io { path: path.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NavError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
