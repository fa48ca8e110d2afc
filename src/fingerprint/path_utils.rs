// src/fingerprint/path_utils.rs

//! Utility functions for turning watched paths into stable identifiers.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    // Notify reports canonical paths (e.g. /private/var/... on macOS) while
    // the configured root may not be canonical.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Identifier used for a file inside a fingerprint token.
///
/// Files below `root` are identified by their root-relative path; files
/// matched through absolute patterns outside the root keep their full path.
pub fn file_identifier(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"))
}
