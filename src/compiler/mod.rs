// src/compiler/mod.rs

//! Compilation orchestration.
//!
//! A [`Compiler`] compares the digest of the watched files with the digest
//! recorded after the last compilation attempt, runs the bundler when they
//! differ, and records the new digest whether or not the build succeeded.
//!
//! ```text
//! IDLE -> CHECKING -> CLEAN                  (digests equal, nothing written)
//!                  -> BUILDING -> RECORDED   (digest written even on failure)
//! ```

pub mod report;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::errors::Result;
use crate::exec::{
    AssetHostResolver, EnvLookup, Invocation, ProcessRunner, RealProcessRunner, build_env,
    process_env_lookup,
};
use crate::fingerprint::{self, Digest, FileFingerprint, WatchSet};
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::{DigestStore, store_for_config};

use self::report::log_process_output;

/// Decides whether the bundle is stale and rebuilds it when it is.
///
/// All collaborators are injected; [`Compiler::new`] wires the production
/// ones (real filesystem, real process runner, store chosen by
/// `digest_storage`).
///
/// `compile` holds an internal lock from the staleness check until the
/// digest is recorded, so threads sharing one `Compiler` never start two
/// builds for the same change. Separate processes are not coordinated.
pub struct Compiler {
    config: CompilerConfig,
    watch_set: WatchSet,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn ProcessRunner>,
    store: Mutex<Box<dyn DigestStore>>,
    resolver: Option<Arc<dyn AssetHostResolver>>,
    env_lookup: EnvLookup,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("root", &self.config.root)
            .field("environment", &self.config.environment)
            .field("watch_set", &self.watch_set)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        if !config.watched_paths.is_empty() {
            warn!(
                paths = ?config.watched_paths,
                "`watched_paths` is deprecated; use `additional_paths` instead"
            );
        }

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = store_for_config(&config, Arc::clone(&fs));
        let watch_set = WatchSet::from_config(&config);

        Self {
            config,
            watch_set,
            fs,
            runner: Arc::new(RealProcessRunner),
            store: Mutex::new(store),
            resolver: None,
            env_lookup: process_env_lookup(),
        }
    }

    /// Replace the filesystem. The digest store is rebuilt on top of it, so
    /// call [`Compiler::with_store`] afterwards if you need a custom store.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.store = Mutex::new(store_for_config(&self.config, Arc::clone(&fs)));
        self.fs = fs;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_store(mut self, store: Box<dyn DigestStore>) -> Self {
        self.store = Mutex::new(store);
        self
    }

    pub fn with_asset_host_resolver(mut self, resolver: Arc<dyn AssetHostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env_lookup = lookup;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Compile the bundle if the watched files changed since the last attempt.
    ///
    /// Returns `Ok(true)` when nothing needed doing or the build succeeded,
    /// `Ok(false)` when the bundler exited unsuccessfully. In both build
    /// cases the current digest is recorded. `Err` is reserved for problems
    /// running the check or starting the bundler.
    pub fn compile(&self) -> Result<bool> {
        let mut store = self.lock_store();

        let last = self.last_digest_from(&**store)?;
        let current = self.current_digest()?;

        if last.as_ref() == Some(&current) {
            debug!("Everything's up-to-date. Nothing to do");
            return Ok(true);
        }

        debug!(
            last = ?last.as_ref().map(Digest::as_str),
            current = %current,
            "watched files changed since last compilation"
        );

        if self.config.is_development() {
            warn!(
                "Slow setup for development: prepare assets by running the bundler's \
                 dev server or watch mode instead of compiling on demand"
            );
        }

        let success = self.run_bundler()?;

        // Recorded whether or not the build succeeded.
        store.save(&current)?;

        Ok(success)
    }

    /// True if the recorded digest matches the current state of the watched
    /// files. Rescans on every call; never writes.
    pub fn is_fresh(&self) -> Result<bool> {
        let last = {
            let store = self.lock_store();
            self.last_digest_from(&**store)?
        };
        match last {
            Some(last) => Ok(last == self.current_digest()?),
            None => Ok(false),
        }
    }

    pub fn is_stale(&self) -> Result<bool> {
        Ok(!self.is_fresh()?)
    }

    /// Digest of the watched files as they are now.
    pub fn current_digest(&self) -> Result<Digest> {
        fingerprint::compute_digest(self.fs.as_ref(), &self.config.root, &self.watch_set)
    }

    /// Per-file fingerprints behind [`Compiler::current_digest`].
    pub fn file_fingerprints(&self) -> Result<Vec<FileFingerprint>> {
        fingerprint::file_fingerprints(self.fs.as_ref(), &self.config.root, &self.watch_set)
    }

    /// Digest recorded by the last compilation attempt, if it still counts.
    pub fn last_compilation_digest(&self) -> Result<Option<Digest>> {
        let store = self.lock_store();
        self.last_digest_from(&**store)
    }

    /// The invocation `compile` would run, with its merged environment.
    pub fn invocation(&self) -> Result<Invocation> {
        let env = build_env(
            &self.config.env,
            self.resolver.as_deref(),
            &*self.env_lookup,
            &self.config.config_path,
        );
        Invocation::from_command(&self.config.command, &self.config.root, env)
    }

    fn last_digest_from(&self, store: &dyn DigestStore) -> Result<Option<Digest>> {
        if let Some(manifest) = self.config.manifest_file() {
            if !self.fs.is_file(&manifest) {
                debug!(manifest = ?manifest, "bundler manifest missing; ignoring recorded digest");
                return Ok(None);
            }
        }
        store.load()
    }

    fn run_bundler(&self) -> Result<bool> {
        let invocation = self.invocation()?;
        info!(cmd = %invocation.display_command(), "Compiling...");

        let output = self.runner.run(&invocation)?;
        log_process_output(&output, &self.config.output_dir(), self.config.compile_output);

        Ok(output.status.success())
    }

    fn lock_store(&self) -> MutexGuard<'_, Box<dyn DigestStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
