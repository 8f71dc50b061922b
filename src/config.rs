//! Application-level configuration: an optional JSON file overlaid by environment variables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAMEVAULT_CONFIG_PATH";

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_JWT_SECRET: &str = "change-me";
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
/// Avatar assigned to users that register without one.
pub const DEFAULT_AVATAR_URL: &str =
    "https://www.futwiz.com/assets/img/fifa18/careerfaces/158023.png";

/// Which [`CatalogStore`](crate::dao::catalog_store::CatalogStore) backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// MongoDB, the production backend.
    Mongo,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StoreBackend::Mongo),
            "memory" | "in-memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the HTTP server binds on all interfaces.
    pub port: u16,
    pub store_backend: StoreBackend,
    pub mongo_uri: String,
    pub mongo_db: Option<String>,
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,
    /// Lifetime of issued session tokens.
    pub token_ttl: Duration,
    /// Avatar stored for users that do not provide one.
    pub default_avatar: String,
}

impl AppConfig {
    /// Load the configuration file (if any) and apply environment overrides.
    pub fn load() -> Self {
        let raw = read_config_file();
        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge the file contents with values looked up through `lookup`, environment first.
    pub fn from_sources(raw: Option<RawConfig>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let raw = raw.unwrap_or_default();
        let defaults = Self::default();

        let port = lookup("PORT")
            .or_else(|| lookup("SERVER_PORT"))
            .and_then(|value| value.parse::<u16>().ok())
            .or(raw.port)
            .unwrap_or(defaults.port);

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => StoreBackend::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown STORE_BACKEND; using mongo");
                StoreBackend::Mongo
            }),
            None => raw.store_backend.unwrap_or(defaults.store_backend),
        };

        let token_ttl = lookup("TOKEN_TTL_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(raw.token_ttl_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.token_ttl);

        Self {
            port,
            store_backend,
            mongo_uri: lookup("MONGO_URI")
                .or_else(|| lookup("MONGODB_URI"))
                .or(raw.mongo_uri)
                .unwrap_or(defaults.mongo_uri),
            mongo_db: lookup("MONGO_DB").or(raw.mongo_db),
            jwt_secret: lookup("JWT_SECRET")
                .or(raw.jwt_secret)
                .unwrap_or(defaults.jwt_secret),
            token_ttl,
            default_avatar: lookup("DEFAULT_AVATAR_URL")
                .or(raw.default_avatar)
                .unwrap_or(defaults.default_avatar),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store_backend: StoreBackend::Mongo,
            mongo_uri: DEFAULT_MONGO_URI.to_owned(),
            mongo_db: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_owned(),
            token_ttl: DEFAULT_TOKEN_TTL,
            default_avatar: DEFAULT_AVATAR_URL.to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
pub struct RawConfig {
    port: Option<u16>,
    store_backend: Option<StoreBackend>,
    mongo_uri: Option<String>,
    mongo_db: Option<String>,
    jwt_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    default_avatar: Option<String>,
}

fn read_config_file() -> Option<RawConfig> {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded config file");
                Some(raw)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using environment and built-in defaults"
            );
            None
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = AppConfig::from_sources(None, lookup_from(&[]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store_backend, StoreBackend::Mongo);
        assert_eq!(config.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(config.default_avatar, DEFAULT_AVATAR_URL);
    }

    #[test]
    fn environment_overrides_file() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"port": 9000, "store_backend": "memory", "mongo_db": "file"}"#)
                .unwrap();
        let config = AppConfig::from_sources(
            Some(raw),
            lookup_from(&[("PORT", "8081"), ("MONGO_DB", "env"), ("TOKEN_TTL_SECS", "60")]),
        );
        assert_eq!(config.port, 8081);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.mongo_db.as_deref(), Some("env"));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
    }

    #[test]
    fn unparsable_port_falls_back() {
        let config = AppConfig::from_sources(None, lookup_from(&[("PORT", "http")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn backend_names_are_case_insensitive() {
        let config = AppConfig::from_sources(None, lookup_from(&[("STORE_BACKEND", "Memory")]));
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }
}
