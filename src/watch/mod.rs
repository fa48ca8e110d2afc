// src/watch/mod.rs

//! Watch mode: recompile whenever a watched file changes.
//!
//! This module only turns filesystem events into `compile()` calls. Whether
//! a change actually requires a rebuild is still decided by the digest
//! comparison in [`crate::compiler::Compiler`].

pub mod watcher;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::compiler::Compiler;
use crate::errors::Result;

pub use watcher::{WatcherHandle, spawn_watcher};

/// Settings for [`run_watch`].
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Quiet period after the last event before compiling.
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
        }
    }
}

/// Compile once, then recompile after every burst of relevant file changes
/// until Ctrl-C is received.
///
/// Compilations run one at a time on a blocking thread. Errors from a single
/// attempt are logged and watching continues.
pub async fn run_watch(compiler: Arc<Compiler>, options: WatchOptions) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<std::path::PathBuf>();

    let watch_set = compiler.watch_set().compile(&compiler.config().root)?;
    let _handle = spawn_watcher(watch_set, tx)?;

    compile_blocking(&compiler).await?;

    loop {
        tokio::select! {
            first = rx.recv() => {
                let Some(first) = first else {
                    warn!("file watcher stopped; leaving watch mode");
                    break;
                };
                debug!(path = ?first, "watched file changed");
                let extra = drain_burst(&mut rx, options.debounce).await;
                info!(changes = extra + 1, "change detected; checking bundle");
                compile_blocking(&compiler).await?;
            }
            res = tokio::signal::ctrl_c() => {
                res.context("listening for Ctrl+C")?;
                info!("Ctrl+C received; stopping watch mode");
                break;
            }
        }
    }

    Ok(())
}

/// Swallow further events until the channel has been quiet for `debounce`.
/// Returns how many extra events were absorbed.
async fn drain_burst(
    rx: &mut mpsc::UnboundedReceiver<std::path::PathBuf>,
    debounce: Duration,
) -> usize {
    let mut absorbed = 0;
    while let Ok(Some(path)) = timeout(debounce, rx.recv()).await {
        debug!(path = ?path, "coalescing change");
        absorbed += 1;
    }
    absorbed
}

/// Run one `compile()` on the blocking pool.
///
/// Only a panic inside the compiler is returned as an error; compile errors
/// are logged.
async fn compile_blocking(compiler: &Arc<Compiler>) -> Result<()> {
    let compiler = Arc::clone(compiler);
    let res = tokio::task::spawn_blocking(move || compiler.compile())
        .await
        .context("compile task panicked")?;

    match res {
        Ok(true) => debug!("bundle is up to date"),
        Ok(false) => warn!("compilation failed; waiting for further changes"),
        Err(err) => error!(error = %err, "compilation check failed"),
    }
    Ok(())
}
