use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

mod error;

use crate::{cache, upstream};
pub use error::Error;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub upstream: upstream::Config,
    // absent: characters are served straight from upstream
    #[serde(default)]
    pub cache: Option<cache::Config>,
    #[serde(default)]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    #[serde(default = "ServerConfig::default_query_timeout")]
    pub query_timeout: u64,
    #[serde(default = "ServerConfig::default_query_timeout_grace_period")]
    pub query_timeout_grace_period: u64,
}

impl ServerConfig {
    fn default_bind_address() -> IpAddr {
        IpAddr::from(Ipv4Addr::UNSPECIFIED)
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_query_timeout() -> u64 {
        3600
    }

    fn default_query_timeout_grace_period() -> u64 {
        60
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: Self::default_bind_address(),
            port: Self::default_port(),
            query_timeout: Self::default_query_timeout(),
            query_timeout_grace_period: Self::default_query_timeout_grace_period(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "GlobalConfig::default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default)]
    pub cache_ttl: Option<u64>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            worker_threads: GlobalConfig::default_worker_threads(),
            cache_ttl: None,
        }
    }
}

impl GlobalConfig {
    fn default_worker_threads() -> usize {
        4
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TracingConfig {
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        let config: Configuration = toml::from_str(slice)?;

        if config.global.worker_threads == 0 {
            return Err(Error::ConfigurationFileFormat(
                "global.worker_threads must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}
