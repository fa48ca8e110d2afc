// src/config/validate.rs

use std::path::PathBuf;

use crate::config::loader::DEFAULT_CONFIG_FILE;
use crate::config::model::{CompilerConfig, ConfigFile, RawConfigFile};
use crate::errors::{BundlegateError, Result};
use crate::fingerprint::WatchSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BundlegateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let compiler = CompilerConfig::from_section(
            raw.compiler,
            raw.env,
            PathBuf::from(DEFAULT_CONFIG_FILE),
        );
        compiler.validate()?;
        Ok(ConfigFile::new_unchecked(compiler, raw.asset_host))
    }
}

impl CompilerConfig {
    /// Check the invariants the compiler relies on.
    pub fn validate(&self) -> Result<()> {
        validate_environment_name(&self.environment)?;
        validate_command(&self.command)?;
        validate_paths(self)?;
        validate_env(self)?;
        // Surface bad globs at load time instead of on the first compile.
        WatchSet::from_config(self).compile(&self.root)?;
        Ok(())
    }
}

/// The environment name ends up in a file name, so it must be a single,
/// plain path component.
pub fn validate_environment_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BundlegateError::ConfigError(
            "[compiler].environment must not be empty".to_string(),
        ));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || name == "." || name == ".." {
        return Err(BundlegateError::ConfigError(format!(
            "invalid environment name '{name}' (allowed: letters, digits, '-', '_', '.')"
        )));
    }
    Ok(())
}

fn validate_command(command: &[String]) -> Result<()> {
    match command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(BundlegateError::ConfigError(
            "[compiler].command must name a program to run".to_string(),
        )),
    }
}

fn validate_paths(cfg: &CompilerConfig) -> Result<()> {
    if cfg.cache_path.as_os_str().is_empty() {
        return Err(BundlegateError::ConfigError(
            "[compiler].cache_path must not be empty".to_string(),
        ));
    }
    if cfg.source_path.as_os_str().is_empty() {
        return Err(BundlegateError::ConfigError(
            "[compiler].source_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_env(cfg: &CompilerConfig) -> Result<()> {
    for key in cfg.env.keys() {
        if key.is_empty() || key.contains(['=', '\0']) {
            return Err(BundlegateError::ConfigError(format!(
                "invalid environment variable name in [env]: {key:?}"
            )));
        }
    }
    Ok(())
}
