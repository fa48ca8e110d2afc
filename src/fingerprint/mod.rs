// src/fingerprint/mod.rs

//! Content fingerprinting of the watched file set.
//!
//! This module is responsible for:
//! - Turning the configured watch patterns into a concrete, sorted list of
//!   files below the project root.
//! - Hashing each file and folding the per-file hashes into one digest.
//!
//! It has no side effects and knows nothing about the bundler or about
//! where the last digest is stored.

pub mod hash;
pub mod path_utils;
pub mod patterns;

use std::path::{Path, PathBuf};

use crate::errors::{BundlegateError, Result};
use crate::fs::FileSystem;

pub use hash::{
    Digest, FileFingerprint, combine_fingerprints, compute_file_hash, fingerprint_files,
};
pub use patterns::{CompiledWatchSet, WatchSet};

/// Resolve `watch_set` against `root` into a deduplicated, path-sorted list of
/// regular files.
pub fn resolve_files(
    fs: &dyn FileSystem,
    root: &Path,
    watch_set: &WatchSet,
) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(root) {
        return Err(BundlegateError::RootNotFound(root.to_path_buf()));
    }
    watch_set.compile(root)?.resolve(fs)
}

/// Per-file fingerprints for the resolved watch set, in path order.
pub fn file_fingerprints(
    fs: &dyn FileSystem,
    root: &Path,
    watch_set: &WatchSet,
) -> Result<Vec<FileFingerprint>> {
    let files = resolve_files(fs, root, watch_set)?;
    fingerprint_files(fs, root, &files)
}

/// Compute the digest representing the current state of the whole watch set.
///
/// Zero matching files is not an error; the result is then the digest of the
/// empty sequence.
pub fn compute_digest(fs: &dyn FileSystem, root: &Path, watch_set: &WatchSet) -> Result<Digest> {
    let fingerprints = file_fingerprints(fs, root, watch_set)?;
    Ok(combine_fingerprints(&fingerprints))
}
