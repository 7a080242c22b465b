//! Server settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `BIZSEARCH_*` environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`BIZSEARCH_BIND_ADDRESS`, ...)
const ENV_PREFIX: &str = "BIZSEARCH";

/// Environment variable naming an alternative config file
const CONFIG_PATH_VAR: &str = "BIZSEARCH_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "bizsearch.toml";

/// Which cache backend holds the business list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub redis_connect_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub provider_base_url: String,
    pub business_ids: Vec<String>,
    pub upstream_timeout_secs: u64,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            cache_backend: CacheBackend::Redis,
            redis_url: "redis://cache".to_string(),
            redis_connect_timeout_secs: 5,
            cache_ttl_secs: 60,
            provider_base_url: "https://storage.googleapis.com/coding-session-rest-api"
                .to_string(),
            business_ids: vec![
                "GXvPAor1ifNfpF0U5PTG0w".to_string(),
                "ohGSnJtMIC5nPfYRi_HTAg".to_string(),
            ],
            upstream_timeout_secs: 10,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Load from `bizsearch.toml` (or `$BIZSEARCH_CONFIG`) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(Some(Path::new(&path)), None)
    }

    /// `env: None` reads the process environment.
    fn from_sources(
        file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("business_ids")
            .source(env);

        let config: Self = builder.add_source(environment).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Message(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.business_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(ConfigError::Message(
                "business_ids must name at least one business".to_string(),
            ));
        }
        if self.provider_base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "provider_base_url may not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|e| {
            ConfigError::Message(format!("Invalid bind_address {}: {}", self.bind_address, e))
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_connect_timeout_secs)
    }

    /// Business ids with blanks dropped
    pub fn business_ids(&self) -> Vec<String> {
        self.business_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}
