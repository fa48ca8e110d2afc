// src/fingerprint/patterns.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::config::CompilerConfig;
use crate::errors::{BundlegateError, Result, is_not_found};
use crate::fs::FileSystem;

/// Lockfile and manifest names that are always watched, relative to the root.
pub const DEFAULT_ROOT_FILES: &[&str] = &["yarn.lock", "package.json"];

/// Bundler configuration directory glob, relative to the root.
pub const DEFAULT_BUNDLER_CONFIG_GLOB: &str = "config/webpack/**/*";

/// Ordered list of glob patterns describing the files whose content decides
/// whether a rebuild is needed.
///
/// Relative patterns are evaluated against the project root; absolute ones are
/// used as-is. A pattern without glob metacharacters names a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    patterns: Vec<String>,
}

impl WatchSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the watch set for a compiler configuration:
    ///
    /// 1. `additional_paths`
    /// 2. the deprecated `watched_paths`
    /// 3. `<source_path>/**/*`
    /// 4. `yarn.lock`, `package.json`
    /// 5. `config/webpack/**/*`
    pub fn from_config(cfg: &CompilerConfig) -> Self {
        let mut patterns: Vec<String> = Vec::new();
        patterns.extend(cfg.additional_paths.iter().cloned());
        patterns.extend(cfg.watched_paths.iter().cloned());

        let source = cfg.source_path.to_string_lossy().replace('\\', "/");
        patterns.push(format!("{}/**/*", source.trim_end_matches('/')));
        patterns.extend(DEFAULT_ROOT_FILES.iter().map(|s| s.to_string()));
        patterns.push(DEFAULT_BUNDLER_CONFIG_GLOB.to_string());

        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compile every pattern against `root`.
    pub fn compile(&self, root: &Path) -> Result<CompiledWatchSet> {
        let patterns = self
            .patterns
            .iter()
            .map(|p| CompiledPattern::new(root, p))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledWatchSet { patterns })
    }
}

/// A single pattern split into a literal base directory and a glob tail.
///
/// For `app/javascript/**/*.js` the base is `<root>/app/javascript` and the
/// tail is `**/*.js`. Only the base is walked.
#[derive(Clone)]
struct CompiledPattern {
    raw: String,
    base: PathBuf,
    tail: Option<GlobMatcher>,
    /// How many directory levels below `base` can match, `None` if unbounded.
    max_depth: Option<usize>,
    /// Tail segments that start with `.`; only these may select hidden
    /// entries below `base`.
    dot_segments: Vec<GlobMatcher>,
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("raw", &self.raw)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

impl CompiledPattern {
    fn new(root: &Path, pattern: &str) -> Result<Self> {
        let normalized = pattern.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').collect();
        let split = segments
            .iter()
            .position(|s| has_glob_meta(s))
            .unwrap_or(segments.len());

        let literal = segments[..split].join("/");
        let literal = if literal.is_empty() && normalized.starts_with('/') {
            "/".to_string()
        } else {
            literal
        };
        let base = if literal.is_empty() {
            root.to_path_buf()
        } else {
            root.join(&literal)
        };

        let tail_segments: Vec<&str> = segments[split..]
            .iter()
            .copied()
            .filter(|s| !s.is_empty())
            .collect();

        if tail_segments.is_empty() {
            return Ok(Self {
                raw: pattern.to_string(),
                base,
                tail: None,
                max_depth: Some(0),
                dot_segments: Vec::new(),
            });
        }

        let glob = |text: &str| {
            GlobBuilder::new(text)
                .literal_separator(true)
                .build()
                .map(|g| g.compile_matcher())
                .map_err(|source| BundlegateError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
        };

        let matcher = glob(&tail_segments.join("/"))?;
        let dot_segments = tail_segments
            .iter()
            .filter(|s| s.starts_with('.'))
            .map(|s| glob(s))
            .collect::<Result<Vec<_>>>()?;

        let max_depth = if tail_segments.iter().any(|s| s.contains("**")) {
            None
        } else {
            Some(tail_segments.len())
        };

        Ok(Self {
            raw: pattern.to_string(),
            base,
            tail: Some(matcher),
            max_depth,
            dot_segments,
        })
    }

    /// Returns true if `path` (absolute, or at least joined the same way the
    /// base was) is selected by this pattern. Directory-ness is not checked.
    fn matches(&self, path: &Path) -> bool {
        match &self.tail {
            None => path == self.base,
            Some(matcher) => match crate::fingerprint::path_utils::relative_str(&self.base, path) {
                Some(rel) if !rel.is_empty() => {
                    rel.split('/').all(|name| self.admits(name)) && matcher.is_match(&rel)
                }
                _ => false,
            },
        }
    }

    /// Wildcards never select hidden names; a hidden name is admitted only by
    /// a tail segment that itself starts with `.`.
    fn admits(&self, name: &str) -> bool {
        !name.starts_with('.') || self.dot_segments.iter().any(|m| m.is_match(name))
    }

    /// Collect all regular files selected by this pattern into `out`.
    fn collect(&self, fs: &dyn FileSystem, out: &mut BTreeSet<PathBuf>) -> Result<()> {
        if self.tail.is_none() {
            if fs.is_file(&self.base) {
                out.insert(self.base.clone());
            } else {
                debug!(pattern = %self.raw, "literal watch path is not a regular file; skipping");
            }
            return Ok(());
        }

        if !fs.is_dir(&self.base) {
            debug!(pattern = %self.raw, base = ?self.base, "watch pattern base does not exist");
            return Ok(());
        }

        let mut stack = vec![(self.base.clone(), 0usize)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = match fs.read_dir(&dir) {
                Ok(entries) => entries,
                // Directory removed while we were walking.
                Err(err) if is_not_found(&err) => {
                    debug!(dir = ?dir, "directory vanished during scan");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            for path in entries {
                if fs.is_dir(&path) {
                    if fs.is_symlink(&path) {
                        debug!(dir = ?path, "not descending into symlinked directory");
                        continue;
                    }
                    let hidden = path
                        .file_name()
                        .is_some_and(|name| !self.admits(&name.to_string_lossy()));
                    if hidden {
                        continue;
                    }
                    if self.max_depth.is_none_or(|max| depth + 1 < max) {
                        stack.push((path, depth + 1));
                    }
                } else if fs.is_file(&path) && self.matches(&path) {
                    out.insert(path);
                }
            }
        }

        Ok(())
    }
}

/// A [`WatchSet`] compiled against a concrete project root.
#[derive(Debug, Clone)]
pub struct CompiledWatchSet {
    patterns: Vec<CompiledPattern>,
}

impl CompiledWatchSet {
    /// Resolve every pattern into a deduplicated list of regular files,
    /// sorted by path.
    pub fn resolve(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();
        for pattern in &self.patterns {
            pattern.collect(fs, &mut files)?;
        }
        Ok(files.into_iter().collect())
    }

    /// Directories a watcher must observe to see every change this set can
    /// select, each with whether it needs recursive watching.
    pub fn watch_roots(&self) -> Vec<(PathBuf, bool)> {
        let mut roots: BTreeMap<PathBuf, bool> = BTreeMap::new();
        for pattern in &self.patterns {
            let (dir, recursive) = match &pattern.tail {
                None => match pattern.base.parent() {
                    Some(parent) => (parent.to_path_buf(), false),
                    None => continue,
                },
                Some(_) => (pattern.base.clone(), pattern.max_depth != Some(1)),
            };
            *roots.entry(dir).or_insert(false) |= recursive;
        }
        roots.into_iter().collect()
    }

    /// Returns true if any pattern selects `path`.
    ///
    /// Used by the watcher to ignore events for unrelated files (e.g. the
    /// bundler's own output).
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}
