// src/config/mod.rs

//! Configuration loading and validation for bundlegate.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the resulting `CompilerConfig` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path};
pub use model::{
    AssetHostSection, CompilerConfig, CompilerSection, ConfigFile, RawConfigFile, digest_file_in,
};
pub use validate::validate_environment_name;
