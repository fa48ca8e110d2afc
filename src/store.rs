// src/store.rs

//! Persistence of the last compilation digest.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{CompilerConfig, digest_file_in};
use crate::errors::{Result, is_not_found};
use crate::fingerprint::Digest;
use crate::fs::FileSystem;
use crate::types::DigestStorageMode;

/// Abstract storage for the digest of the last compilation attempt.
pub trait DigestStore: Send + Sync {
    /// Return the stored digest, or `None` if nothing has been recorded.
    fn load(&self) -> Result<Option<Digest>>;
    /// Replace the stored digest.
    fn save(&mut self, digest: &Digest) -> Result<()>;
}

/// Stores the digest in `<cache_dir>/last-compilation-digest-<environment>`.
///
/// The file holds the bare hex digest and is overwritten in full on every
/// save. Each environment gets its own file.
#[derive(Debug)]
pub struct FileDigestStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileDigestStore {
    pub fn new(fs: Arc<dyn FileSystem>, cache_dir: impl Into<PathBuf>, environment: &str) -> Self {
        Self {
            fs,
            path: digest_file_in(&cache_dir.into(), environment),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl DigestStore for FileDigestStore {
    fn load(&self) -> Result<Option<Digest>> {
        match self.fs.read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    debug!(path = ?self.path, "digest file is empty");
                    Ok(None)
                } else {
                    Ok(Some(Digest::from(trimmed)))
                }
            }
            Err(err) if is_not_found(&err) => {
                debug!(path = ?self.path, "no previous compilation digest");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, digest: &Digest) -> Result<()> {
        self.fs.write(&self.path, digest.as_str().as_bytes())?;
        info!(path = ?self.path, digest = %digest, "recorded compilation digest (file)");
        Ok(())
    }
}

/// Keeps the digest in memory only.
#[derive(Debug, Default)]
pub struct MemoryDigestStore {
    digest: Option<Digest>,
}

impl MemoryDigestStore {
    pub fn new() -> Self {
        Self { digest: None }
    }
}

impl DigestStore for MemoryDigestStore {
    fn load(&self) -> Result<Option<Digest>> {
        Ok(self.digest.clone())
    }

    fn save(&mut self, digest: &Digest) -> Result<()> {
        self.digest = Some(digest.clone());
        info!(digest = %digest, "recorded compilation digest (memory)");
        Ok(())
    }
}

/// Build the store selected by `cfg.digest_storage`.
pub fn store_for_config(cfg: &CompilerConfig, fs: Arc<dyn FileSystem>) -> Box<dyn DigestStore> {
    match cfg.digest_storage {
        DigestStorageMode::File => {
            Box::new(FileDigestStore::new(fs, cfg.cache_dir(), &cfg.environment))
        }
        DigestStorageMode::Memory => Box::new(MemoryDigestStore::new()),
    }
}
