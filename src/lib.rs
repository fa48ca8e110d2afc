// src/lib.rs

pub mod cli;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fingerprint;
pub mod fs;
pub mod logging;
pub mod store;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::compiler::Compiler;
use crate::config::{ConfigFile, load_and_validate, validate_environment_name};
use crate::exec::StaticAssetHost;
use crate::watch::{WatchOptions, run_watch};

/// High-level entry point used by `main.rs`.
///
/// This wires together config loading, the environment override, the
/// compiler and the selected subcommand. Returns `Ok(false)` when the command
/// ran but the result is negative (failed build, stale bundle).
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(environment) = args.environment.as_deref() {
        validate_environment_name(environment)?;
        cfg.compiler.environment = environment.to_string();
    }

    info!(
        env = %cfg.compiler.environment,
        root = ?cfg.compiler.root,
        "loaded bundlegate config"
    );

    match args.command.unwrap_or(Command::Compile) {
        Command::Compile => {
            let compiler = Arc::new(build_compiler(cfg));
            blocking(move || Ok(compiler.compile()?)).await
        }
        Command::Check => {
            let compiler = Arc::new(build_compiler(cfg));
            let fresh = blocking(move || Ok(compiler.is_fresh()?)).await?;
            println!("{}", if fresh { "fresh" } else { "stale" });
            Ok(fresh)
        }
        Command::Digest { files } => {
            let compiler = Arc::new(build_compiler(cfg));
            blocking(move || {
                if files {
                    for fp in compiler.file_fingerprints()? {
                        println!("{}  {}", fp.content_hash, fp.identifier);
                    }
                }
                println!("{}", compiler.current_digest()?);
                Ok(true)
            })
            .await
        }
        Command::Watch { debounce_ms } => {
            // Notify reports canonical paths; match against a canonical root.
            if let Ok(root) = cfg.compiler.root.canonicalize() {
                cfg.compiler.root = root;
            }
            let compiler = Arc::new(build_compiler(cfg));
            let options = WatchOptions {
                debounce: Duration::from_millis(debounce_ms),
            };
            run_watch(compiler, options).await?;
            Ok(true)
        }
    }
}

/// Build a production compiler, injecting the `[asset_host]` table as the
/// asset host resolver when present.
fn build_compiler(cfg: ConfigFile) -> Compiler {
    let compiler = Compiler::new(cfg.compiler);
    match cfg.asset_host {
        Some(section) => {
            debug!(?section, "using static asset host settings");
            compiler.with_asset_host_resolver(Arc::new(StaticAssetHost::from(section)))
        }
        None => compiler,
    }
}

/// Run blocking compiler work off the async runtime.
async fn blocking<F>(f: F) -> Result<bool>
where
    F: FnOnce() -> Result<bool> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("compiler task panicked")?
}
