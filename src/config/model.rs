// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::DigestStorageMode;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [compiler]
/// environment = "production"
/// source_path = "app/javascript"
/// additional_paths = ["app/assets/**/*"]
/// cache_path = "tmp/cache/bundlegate"
/// public_output_path = "public/packs"
/// manifest_path = "public/packs/manifest.json"
/// compile_output = true
/// command = ["./bin/webpack"]
///
/// [env]
/// FRONTEND_API_KEY = "secret"
///
/// [asset_host]
/// host = "https://cdn.example.com"
/// relative_url_root = "/shop"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub compiler: CompilerSection,

    /// Static environment overrides passed to the bundler.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Static asset host settings, used when no other resolver is injected.
    #[serde(default)]
    pub asset_host: Option<AssetHostSection>,
}

/// `[compiler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerSection {
    /// Project root, relative to the directory containing the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Environment name; part of the digest file name.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Frontend source directory, relative to the root. Watched recursively.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Extra glob patterns to watch, relative to the root.
    #[serde(default)]
    pub additional_paths: Vec<String>,

    /// Deprecated alias for `additional_paths`.
    #[serde(default)]
    pub watched_paths: Vec<String>,

    /// Where the last compilation digest is written, relative to the root.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Where the bundler writes its output. Only used for log messages.
    #[serde(default = "default_public_output_path")]
    pub public_output_path: PathBuf,

    /// Bundler manifest. When set and missing on disk, the last digest is
    /// ignored so the bundle gets rebuilt.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    /// Log the bundler's stdout after a successful build.
    #[serde(default = "default_compile_output")]
    pub compile_output: bool,

    /// Bundler command line: program followed by its arguments.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    #[serde(default)]
    pub digest_storage: DigestStorageMode,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_source_path() -> PathBuf {
    PathBuf::from("app/javascript")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("tmp/cache/bundlegate")
}

fn default_public_output_path() -> PathBuf {
    PathBuf::from("public/packs")
}

fn default_compile_output() -> bool {
    true
}

fn default_command() -> Vec<String> {
    vec!["./bin/webpack".to_string()]
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            environment: default_environment(),
            source_path: default_source_path(),
            additional_paths: Vec::new(),
            watched_paths: Vec::new(),
            cache_path: default_cache_path(),
            public_output_path: default_public_output_path(),
            manifest_path: None,
            compile_output: default_compile_output(),
            command: default_command(),
            digest_storage: DigestStorageMode::default(),
        }
    }
}

/// `[asset_host]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AssetHostSection {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub relative_url_root: Option<String>,
}

/// Immutable settings for one [`crate::compiler::Compiler`].
///
/// Paths other than `root` and `config_path` are kept as written and
/// interpreted relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub root: PathBuf,
    pub environment: String,
    pub source_path: PathBuf,
    pub additional_paths: Vec<String>,
    pub watched_paths: Vec<String>,
    pub cache_path: PathBuf,
    pub public_output_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub compile_output: bool,
    pub command: Vec<String>,
    /// Static environment overrides for the bundler process.
    pub env: BTreeMap<String, String>,
    /// Path of the configuration file, exported to the bundler.
    pub config_path: PathBuf,
    pub digest_storage: DigestStorageMode,
}

impl CompilerConfig {
    /// Build a config from a `[compiler]` section without validating it.
    pub(crate) fn from_section(
        section: CompilerSection,
        env: BTreeMap<String, String>,
        config_path: PathBuf,
    ) -> Self {
        Self {
            root: section.root,
            environment: section.environment,
            source_path: section.source_path,
            additional_paths: section.additional_paths,
            watched_paths: section.watched_paths,
            cache_path: section.cache_path,
            public_output_path: section.public_output_path,
            manifest_path: section.manifest_path,
            compile_output: section.compile_output,
            command: section.command,
            env,
            config_path,
            digest_storage: section.digest_storage,
        }
    }

    /// Defaults for a project rooted at `root`, with the config file assumed
    /// at `<root>/bundlegate.toml`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_path = root.join(super::loader::DEFAULT_CONFIG_FILE);
        let mut cfg = Self::from_section(CompilerSection::default(), BTreeMap::new(), config_path);
        cfg.root = root;
        cfg
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = source_path.into();
        self
    }

    pub fn with_additional_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_watched_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watched_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = cache_path.into();
        self
    }

    pub fn with_manifest_path(mut self, manifest_path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(manifest_path.into());
        self
    }

    pub fn with_compile_output(mut self, compile_output: bool) -> Self {
        self.compile_output = compile_output;
        self
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_config_path(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = config_path.into();
        self
    }

    pub fn with_digest_storage(mut self, mode: DigestStorageMode) -> Self {
        self.digest_storage = mode;
        self
    }

    /// Absolute cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.cache_path)
    }

    /// Absolute bundler output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.public_output_path)
    }

    /// Absolute manifest path, if one is configured.
    pub fn manifest_file(&self) -> Option<PathBuf> {
        self.manifest_path.as_ref().map(|p| self.root.join(p))
    }

    /// Digest file for this config's environment.
    pub fn digest_file(&self) -> PathBuf {
        digest_file_in(&self.cache_dir(), &self.environment)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// `<cache_dir>/last-compilation-digest-<environment>`
pub fn digest_file_in(cache_dir: &Path, environment: &str) -> PathBuf {
    cache_dir.join(format!("last-compilation-digest-{environment}"))
}

/// Validated configuration file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub compiler: CompilerConfig,
    pub asset_host: Option<AssetHostSection>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        compiler: CompilerConfig,
        asset_host: Option<AssetHostSection>,
    ) -> Self {
        Self {
            compiler,
            asset_host,
        }
    }
}
