//! Service configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8083";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Boundary datasets the index is built from
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// State boundaries (GeoJSON, optionally gzipped)
    pub states: PathBuf,
    /// Counties, sub-counties, cities and communities
    pub regions: PathBuf,
}

/// Settings given as flags or environment variables.
///
/// Each field set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    /// Port on 0.0.0.0, ignored when `listen` is set
    pub port: Option<u16>,
    pub states: Option<PathBuf>,
    pub regions: Option<PathBuf>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load the optional config file and layer the overrides on top, field by field.
    ///
    /// Listen address: `listen`, then `port`, then the file, then the default.
    /// Both source paths must come from somewhere.
    pub fn load_with_overrides(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let file = path.map(Self::load_from_file).transpose()?;
        Self::merge(file, overrides)
    }

    pub fn merge(file: Option<Config>, overrides: Overrides) -> Result<Self> {
        let (file_server, file_sources) = match file {
            Some(config) => (Some(config.server), Some(config.sources)),
            None => (None, None),
        };

        let listen = overrides
            .listen
            .or_else(|| overrides.port.map(|port| format!("0.0.0.0:{}", port)))
            .or_else(|| file_server.map(|server| server.listen))
            .unwrap_or_else(default_listen);

        let states = overrides
            .states
            .or_else(|| file_sources.as_ref().map(|s| s.states.clone()))
            .context("No states source configured (--states, STATES or config file)")?;
        let regions = overrides
            .regions
            .or_else(|| file_sources.map(|s| s.regions))
            .context("No regions source configured (--regions, CITIES_COUNTIES or config file)")?;

        Ok(Config {
            server: ServerConfig { listen },
            sources: SourcesConfig { states, regions },
        })
    }
}
