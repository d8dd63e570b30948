use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the environment variable holding the OMDb API key.
pub const OMDB_API_KEY_VAR: &str = "OMDB_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inputs: InputsConfig,
    pub database: DatabaseConfig,
    pub omdb: OmdbConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub movies_csv: String,
    pub ratings_csv: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OmdbConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub sample_size: usize,
    pub batch_pause_ms: u64,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            movies_csv: "data/movies.csv".to_string(),
            ratings_csv: "data/ratings.csv".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "movies.db".to_string(),
        }
    }
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.omdbapi.com/".to_string(),
            timeout_seconds: 5,
            sample_size: 50,
            batch_pause_ms: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: InputsConfig::default(),
            database: DatabaseConfig::default(),
            omdb: OmdbConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. When `path` is None the default
    /// `config.toml` is used if present, otherwise built-in defaults apply.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    EtlError::Config(format!("Failed to read config file '{p}': {e}"))
                })?;
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            None => {
                if Path::new("config.toml").exists() {
                    let content = fs::read_to_string("config.toml")?;
                    let config: Config = toml::from_str(&content)?;
                    Ok(config)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Read the OMDb API key from the process environment. Missing or empty
    /// values are a fatal startup error raised before any I/O happens.
    pub fn omdb_api_key() -> Result<String> {
        let key = std::env::var(OMDB_API_KEY_VAR).map_err(|_| {
            EtlError::Config(format!(
                "{OMDB_API_KEY_VAR} not set. Add to environment or .env"
            ))
        })?;
        if key.trim().is_empty() {
            return Err(EtlError::Config(format!(
                "{OMDB_API_KEY_VAR} not set. Add to environment or .env"
            )));
        }
        Ok(key)
    }
}
