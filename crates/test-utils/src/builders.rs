#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bundlegate::config::CompilerConfig;
use tempfile::TempDir;

/// A throwaway project directory for compiler tests.
///
/// Defaults mirror a freshly generated app: sources under `app/javascript`,
/// digests under `tmp/cache/bundlegate`, environment `test`.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating parent dirs");
        }
        fs::write(&path, contents).expect("writing project file");
        path
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("removing project file");
    }

    pub fn rename(&self, from: &str, to: &str) {
        fs::rename(self.path(from), self.path(to)).expect("renaming project file");
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path(rel)).ok()
    }

    /// Compiler config rooted at this project, environment `test`.
    pub fn config(&self) -> CompilerConfig {
        CompilerConfig::for_root(self.root()).with_environment("test")
    }

    /// Where the digest for `environment` is recorded with default settings.
    pub fn digest_path(&self, environment: &str) -> PathBuf {
        self.path(&format!("tmp/cache/bundlegate/last-compilation-digest-{environment}"))
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
