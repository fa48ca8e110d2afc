// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `bundlegate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlegate",
    version,
    about = "Rebuild a frontend asset bundle only when its sources changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "bundlegate.toml", global = true)]
    pub config: String,

    /// Environment name; overrides `[compiler].environment`.
    #[arg(long, value_name = "NAME", env = "BUNDLEGATE_ENV", global = true)]
    pub environment: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// What to do; defaults to `compile`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the bundler if the watched files changed since the last attempt.
    Compile,

    /// Report whether the bundle is fresh without compiling.
    ///
    /// Exits 0 when fresh and 1 when stale.
    Check,

    /// Print the digest of the watched files.
    Digest {
        /// Also print each file's identifier and content hash.
        #[arg(long)]
        files: bool,
    },

    /// Compile, then recompile whenever a watched file changes.
    Watch {
        /// Quiet period in milliseconds before a burst of changes is compiled.
        #[arg(long, value_name = "MS", default_value_t = 200)]
        debounce_ms: u64,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let args = CliArgs::try_parse_from(["bundlegate"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.config, "bundlegate.toml");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "bundlegate",
            "digest",
            "--files",
            "--config",
            "web/bundlegate.toml",
            "--environment",
            "test",
        ])
        .unwrap();
        assert!(matches!(args.command, Some(Command::Digest { files: true })));
        assert_eq!(args.config, "web/bundlegate.toml");
        assert_eq!(args.environment.as_deref(), Some("test"));
    }
}
