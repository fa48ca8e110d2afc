// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundlegateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Project root not found or not a directory: {0:?}")]
    RootNotFound(PathBuf),

    #[error("Invalid watch pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BundlegateError>;

/// True if anything in the error chain is an `io::Error` of kind `NotFound`
/// (or `NotADirectory`, which shows up when a parent path is a regular file).
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory))
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn not_found_is_detected_through_context() {
        let err = Err::<(), _>(io::Error::new(io::ErrorKind::NotFound, "gone"))
            .context("opening file")
            .unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn permission_denied_is_not_treated_as_missing() {
        let err = anyhow::Error::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(!is_not_found(&err));
    }
}
