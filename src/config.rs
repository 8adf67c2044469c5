//! Service configuration.
//!
//! Layered with figment: built-in defaults, then an optional `motorent.toml`,
//! then `MOTORENT_*` environment variables (a `.env` file is loaded into the
//! environment by dotenvy at startup).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE: &str = "motorent.toml";
pub const ENV_PREFIX: &str = "MOTORENT_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// In-memory stores are used when unset
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// JSON list of plans loaded into the in-memory catalog
    pub plans_file: Option<PathBuf>,
    pub plan_cache_capacity: u64,
    pub plan_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            database_max_connections: 5,
            plans_file: None,
            plan_cache_capacity: 256,
            plan_cache_ttl_secs: 300,
        }
    }
}

impl Config {
    /// Provider stack used by [`Config::load`]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        let mut config: Config = figment.extract()?;
        // An empty value is the same as leaving it unset
        config.database_url = config.database_url.filter(|url| !url.trim().is_empty());
        config.plans_file = config.plans_file.filter(|path| !path.as_os_str().is_empty());
        Ok(config)
    }

    pub fn plan_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.plan_cache_ttl_secs)
    }
}
