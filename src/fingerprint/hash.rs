// src/fingerprint/hash.rs

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use blake3::Hasher;
use tracing::debug;

use crate::errors::{Result, is_not_found};
use crate::fs::FileSystem;
use crate::fingerprint::path_utils::file_identifier;

/// Separator between per-file tokens in the aggregate hash input.
const TOKEN_SEPARATOR: &str = "\n";

/// Hex-encoded blake3 digest over a whole watch set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Digest {
    fn from(s: String) -> Self {
        Digest(s)
    }
}

impl From<&str> for Digest {
    fn from(s: &str) -> Self {
        Digest(s.to_string())
    }
}

impl PartialEq<str> for Digest {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Content hash of one watched file, keyed by its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub identifier: String,
    pub content_hash: String,
}

impl FileFingerprint {
    /// Token form used in the aggregate hash: `<identifier>/<hex>`.
    pub fn token(&self) -> String {
        format!("{}/{}", self.identifier, self.content_hash)
    }
}

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> anyhow::Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprint every file in `files`, in the given order.
///
/// A file that disappeared since it was enumerated is skipped; any other read
/// failure is returned.
pub fn fingerprint_files(
    fs: &dyn FileSystem,
    root: &Path,
    files: &[PathBuf],
) -> Result<Vec<FileFingerprint>> {
    let mut out = Vec::with_capacity(files.len());
    for path in files {
        match compute_file_hash(fs, path) {
            Ok(content_hash) => out.push(FileFingerprint {
                identifier: file_identifier(root, path),
                content_hash,
            }),
            Err(err) if is_not_found(&err) => {
                debug!(path = ?path, "watched file vanished before hashing; skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(out)
}

/// Combine per-file fingerprints into one digest.
///
/// `fingerprints` must already be in path order. An empty slice yields the
/// digest of the empty string.
pub fn combine_fingerprints(fingerprints: &[FileFingerprint]) -> Digest {
    let joined = fingerprints
        .iter()
        .map(FileFingerprint::token)
        .collect::<Vec<_>>()
        .join(TOKEN_SEPARATOR);
    let digest = blake3::hash(joined.as_bytes()).to_hex().to_string();
    debug!(files = fingerprints.len(), digest = %digest, "computed watch set digest");
    Digest(digest)
}
