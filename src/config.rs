use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use thiserror::Error;

use crate::pool::{PoolStrategy, StrategySelector};

pub const DEFAULT_CONNECTION_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/connection.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid port {0:?}")]
    Port(String),
}

/// Connection parameters read from `connection.json`. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
}

impl ConnectionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
            .map_err(|err| match err {
                ConfigError::Parse { source, .. } => {
                    ConfigError::Parse { path: path.to_path_buf(), source }
                },
                other => other,
            })
    }

    /// Parses a flat object of string values; anything else is rejected.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut map: BTreeMap<String, String> = serde_json::from_str(raw)
            .map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;

        let port = match map.remove("port") {
            Some(p) => Some(p.trim().parse().map_err(|_| ConfigError::Port(p))?),
            None => None,
        };

        Ok(Self {
            host: map.remove("host"),
            user: map.remove("user"),
            password: map.remove("password"),
            database: map.remove("database"),
            port,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    /// When set, used as-is instead of the connection file.
    pub database_url: Option<String>,
    pub connection_file: PathBuf,
    pub charset: Option<String>,
    pub selector: StrategySelector,
    pub reset: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

        let connection_file = std::env::var("FILME_CONNECTION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONNECTION_FILE));

        let charset = std::env::var("FILME_CHARSET").ok().filter(|s| !s.trim().is_empty());

        let seed: Option<u64> = std::env::var("FILME_POOL_SEED")
            .ok()
            .map(|s| s.parse())
            .transpose()
            .context("FILME_POOL_SEED")?;

        let selector = match std::env::var("FILME_POOL_STRATEGY") {
            Ok(s) => parse_selector(&s, seed).context("FILME_POOL_STRATEGY")?,
            Err(_) => StrategySelector::Random { seed },
        };

        let reset: bool = std::env::var("FILME_RESET")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("FILME_RESET")?;

        Ok(Self { database_url, connection_file, charset, selector, reset })
    }
}

fn parse_selector(value: &str, seed: Option<u64>) -> anyhow::Result<StrategySelector> {
    match value.trim().to_ascii_lowercase().as_str() {
        "params" | "parameters" => Ok(StrategySelector::Fixed(PoolStrategy::Parameters)),
        "url" => Ok(StrategySelector::Fixed(PoolStrategy::Url)),
        "random" | "" => Ok(StrategySelector::Random { seed }),
        other => anyhow::bail!("unknown pool strategy {other:?}, expected params, url or random"),
    }
}
