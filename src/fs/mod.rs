// src/fs/mod.rs

//! Filesystem access used by the fingerprint engine and the digest store.
//!
//! Everything that touches the disk goes through [`FileSystem`], so the
//! compiler can run against [`mock::MockFileSystem`] in tests.

use std::fmt::Debug;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub mod mock;

/// Abstract filesystem interface.
///
/// Errors keep the underlying `std::io::Error` in their chain so callers can
/// tell a missing file apart from a real failure (see
/// [`crate::errors::is_not_found`]).
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
    /// Write `contents` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// True if `path` itself is a symbolic link (the link is not followed).
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    /// Writes to a uniquely named temporary file in the target directory and
    /// renames it over `path`. Concurrent writers each replace the file in
    /// full; the last rename wins.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temporary file in {:?}", parent))?;
        tmp.write_all(contents)
            .and_then(|()| tmp.flush())
            .with_context(|| format!("writing temporary file for {:?}", path))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry.with_context(|| format!("reading entry in {:?}", path))?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parents_and_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tmp/cache/digest");
        let fs = RealFileSystem;

        fs.write(&target, b"first").unwrap();
        fs.write(&target, b"second").unwrap();

        assert_eq!(fs.read_to_string(&target).unwrap(), "second");
        let leftovers: Vec<_> = fs
            .read_dir(target.parent().unwrap())
            .unwrap()
            .into_iter()
            .filter(|p| p != &target)
            .collect();
        assert!(leftovers.is_empty(), "temporary files left behind: {leftovers:?}");
    }

    #[test]
    fn concurrent_writers_to_one_file_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cache/last-compilation-digest-test");

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let target = &target;
                scope.spawn(move || {
                    for round in 0..25 {
                        let digest = format!("digest-{writer}-{round}");
                        RealFileSystem.write(target, digest.as_bytes()).unwrap();
                    }
                });
            }
        });

        let last = RealFileSystem.read_to_string(&target).unwrap();
        assert!(last.starts_with("digest-"), "unexpected contents {last:?}");
        let entries = RealFileSystem.read_dir(target.parent().unwrap()).unwrap();
        assert_eq!(entries, vec![target.clone()], "temporary files left behind");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_without_following_them() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert!(RealFileSystem.is_symlink(&link));
        assert!(RealFileSystem.is_dir(&link));
        assert!(!RealFileSystem.is_symlink(&real));
        assert!(!RealFileSystem.is_symlink(&dir.path().join("missing")));
    }

    #[test]
    fn missing_directory_listing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealFileSystem.read_dir(&dir.path().join("nope")).unwrap_err();
        assert!(crate::errors::is_not_found(&err));
    }
}
