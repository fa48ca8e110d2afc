// src/exec/mod.rs

//! External bundler execution.
//!
//! - [`runner`] provides the `ProcessRunner` trait and the production
//!   `RealProcessRunner`, which runs the bundler synchronously and captures
//!   its output. Tests replace it with a recording fake.
//! - [`env`] builds the environment handed to the bundler and defines the
//!   `AssetHostResolver` capability used to fill in asset-serving settings.

pub mod env;
pub mod runner;

pub use env::{
    ASSET_HOST_VAR, AssetHostResolver, CONFIG_VAR, EnvLookup, RELATIVE_URL_ROOT_VAR,
    StaticAssetHost, build_env, process_env_lookup,
};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, RealProcessRunner};
