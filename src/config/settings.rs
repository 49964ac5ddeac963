use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub mongo_uri: Option<String>,
    pub database_name: String,
    /// Shared secret of the identity provider that signs caller tokens
    pub jwt_secret: String,
    pub cors_origin: String,
    pub live_results_interval: Duration,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend: StoreBackend = try_load("STORE_BACKEND", "mongo")?;
        let mongo_uri = env::var("MONGO_URI").ok();
        if store_backend == StoreBackend::Mongo && mongo_uri.is_none() {
            return Err(ConfigError::Missing("MONGO_URI"));
        }

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must not be blank".to_string(),
            });
        }

        let default_page_size: u32 = try_load("DEFAULT_PAGE_SIZE", "20")?;
        let max_page_size: u32 = try_load("MAX_PAGE_SIZE", "100")?;
        if default_page_size == 0 || default_page_size > max_page_size {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_PAGE_SIZE",
                reason: format!("must be between 1 and MAX_PAGE_SIZE ({max_page_size})"),
            });
        }

        let interval_secs: u64 = try_load("LIVE_RESULTS_INTERVAL_SECS", "1")?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "LIVE_RESULTS_INTERVAL_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            server_addr: try_load("SERVER_ADDR", "0.0.0.0:9000")?,
            store_backend,
            mongo_uri,
            database_name: try_load("DATABASE_NAME", "pollmaster")?,
            jwt_secret,
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:3000")?,
            live_results_interval: Duration::from_secs(interval_secs),
            default_page_size,
            max_page_size,
        })
    }

    /// Clamps a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
impl Settings {
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            store_backend: StoreBackend::Memory,
            mongo_uri: None,
            database_name: "pollmaster_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            live_results_interval: Duration::from_secs(1),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_names() {
        assert_eq!("Mongo".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!(" memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn page_size_is_clamped() {
        let settings = Settings::for_tests();
        assert_eq!(settings.page_size(None), 20);
        assert_eq!(settings.page_size(Some(0)), 1);
        assert_eq!(settings.page_size(Some(5000)), 100);
    }
}
