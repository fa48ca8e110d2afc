// src/exec/env.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::AssetHostSection;

/// Asset host the bundler should use for public URLs.
pub const ASSET_HOST_VAR: &str = "BUNDLEGATE_ASSET_HOST";

/// Sub-path the application is mounted under.
pub const RELATIVE_URL_ROOT_VAR: &str = "BUNDLEGATE_RELATIVE_URL_ROOT";

/// Absolute path of the bundlegate configuration file.
pub const CONFIG_VAR: &str = "BUNDLEGATE_CONFIG";

/// How variables of the current process environment are read.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads from the real process environment.
pub fn process_env_lookup() -> EnvLookup {
    Arc::new(|key| std::env::var(key).ok())
}

/// Supplies asset-serving settings from the host application (e.g. a web
/// framework's live configuration).
///
/// When a resolver is injected, its values fill in whatever the process
/// environment does not set.
pub trait AssetHostResolver: Send + Sync {
    fn asset_host(&self) -> Option<String>;
    fn relative_url_root(&self) -> Option<String>;
}

/// Resolver backed by fixed values, typically the `[asset_host]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAssetHost {
    pub host: Option<String>,
    pub relative_url_root: Option<String>,
}

impl From<AssetHostSection> for StaticAssetHost {
    fn from(section: AssetHostSection) -> Self {
        Self {
            host: section.host,
            relative_url_root: section.relative_url_root,
        }
    }
}

impl AssetHostResolver for StaticAssetHost {
    fn asset_host(&self) -> Option<String> {
        self.host.clone()
    }

    fn relative_url_root(&self) -> Option<String> {
        self.relative_url_root.clone()
    }
}

impl fmt::Debug for dyn AssetHostResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHostResolver")
            .field("asset_host", &self.asset_host())
            .field("relative_url_root", &self.relative_url_root())
            .finish()
    }
}

/// Build the environment overrides for one bundler run.
///
/// Order of writes (later wins on key collisions):
/// 1. `static_env` from the `[env]` table;
/// 2. asset host and relative URL root: process environment first, then the
///    resolver; omitted when neither has a value;
/// 3. the config file path.
pub fn build_env(
    static_env: &BTreeMap<String, String>,
    resolver: Option<&dyn AssetHostResolver>,
    lookup: &dyn Fn(&str) -> Option<String>,
    config_path: &Path,
) -> BTreeMap<String, String> {
    let mut env = static_env.clone();

    let host = lookup(ASSET_HOST_VAR).or_else(|| resolver.and_then(|r| r.asset_host()));
    if let Some(host) = host {
        env.insert(ASSET_HOST_VAR.to_string(), host);
    }

    let url_root =
        lookup(RELATIVE_URL_ROOT_VAR).or_else(|| resolver.and_then(|r| r.relative_url_root()));
    if let Some(url_root) = url_root {
        env.insert(RELATIVE_URL_ROOT_VAR.to_string(), url_root);
    }

    env.insert(
        CONFIG_VAR.to_string(),
        config_path.to_string_lossy().into_owned(),
    );

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn static_env() -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("FRONTEND_API_KEY".to_string(), "secret".to_string());
        env
    }

    #[test]
    fn config_path_is_always_present() {
        let env = build_env(&static_env(), None, &no_env, Path::new("/proj/bundlegate.toml"));
        assert_eq!(env.get(CONFIG_VAR).map(String::as_str), Some("/proj/bundlegate.toml"));
        assert_eq!(env.get("FRONTEND_API_KEY").map(String::as_str), Some("secret"));
        assert!(!env.contains_key(ASSET_HOST_VAR));
        assert!(!env.contains_key(RELATIVE_URL_ROOT_VAR));
    }

    #[test]
    fn resolver_fills_missing_process_values() {
        let resolver = StaticAssetHost {
            host: Some("https://cdn.example.com".into()),
            relative_url_root: Some("/shop".into()),
        };
        let env = build_env(&static_env(), Some(&resolver), &no_env, Path::new("/c.toml"));
        assert_eq!(env.get(ASSET_HOST_VAR).map(String::as_str), Some("https://cdn.example.com"));
        assert_eq!(env.get(RELATIVE_URL_ROOT_VAR).map(String::as_str), Some("/shop"));
    }

    #[test]
    fn process_environment_beats_resolver() {
        let resolver = StaticAssetHost {
            host: Some("https://cdn.example.com".into()),
            relative_url_root: None,
        };
        let lookup = |key: &str| (key == ASSET_HOST_VAR).then(|| "https://edge.example.com".to_string());
        let env = build_env(&static_env(), Some(&resolver), &lookup, Path::new("/c.toml"));
        assert_eq!(env.get(ASSET_HOST_VAR).map(String::as_str), Some("https://edge.example.com"));
        assert!(!env.contains_key(RELATIVE_URL_ROOT_VAR));
    }

    #[test]
    fn derived_values_override_static_ones() {
        let mut statics = static_env();
        statics.insert(ASSET_HOST_VAR.to_string(), "https://static.example.com".to_string());
        statics.insert(CONFIG_VAR.to_string(), "/wrong.toml".to_string());
        let resolver = StaticAssetHost {
            host: Some("https://cdn.example.com".into()),
            relative_url_root: None,
        };

        let env = build_env(&statics, Some(&resolver), &no_env, Path::new("/right.toml"));
        assert_eq!(env.get(ASSET_HOST_VAR).map(String::as_str), Some("https://cdn.example.com"));
        assert_eq!(env.get(CONFIG_VAR).map(String::as_str), Some("/right.toml"));
        assert_eq!(env.get("FRONTEND_API_KEY").map(String::as_str), Some("secret"));
    }
}
