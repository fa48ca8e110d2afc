// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Context;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::fingerprint::CompiledWatchSet;

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch every directory the watch set can select from and forward changed
/// paths that the watch set matches.
///
/// Only pattern bases are registered with the OS, so large unwatched trees
/// (e.g. `node_modules`) are never watched. Bases that do not exist yet are
/// skipped.
pub fn spawn_watcher(
    watch_set: CompiledWatchSet,
    tx: mpsc::UnboundedSender<PathBuf>,
) -> Result<WatcherHandle> {
    let roots = watch_set.watch_roots();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                for path in event.paths {
                    if watch_set.matches(&path) && tx.send(path).is_err() {
                        // Receiver gone; watch mode is shutting down.
                        return;
                    }
                }
            }
            Err(err) => {
                // We can't log via tracing reliably from notify's thread.
                eprintln!("bundlegate: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    let mut watched = 0usize;
    for (dir, recursive) in roots {
        if !dir.is_dir() {
            debug!(dir = ?dir, "watch base does not exist; not watching");
            continue;
        }
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&dir, mode)
            .with_context(|| format!("watching {:?}", dir))?;
        watched += 1;
    }

    info!(directories = watched, "file watcher started");

    Ok(WatcherHandle { _inner: watcher })
}
