use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use harvester::HarvestConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub export_dir: PathBuf,
    pub headless: bool,
    pub block_resources: bool,
    pub max_results: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            export_dir: env::var("EXPORT_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            headless: env::var("HEADLESS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("HEADLESS must be true or false")?,
            block_resources: env::var("BLOCK_RESOURCES")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("BLOCK_RESOURCES must be true or false")?,
            max_results: match env::var("MAX_RESULTS") {
                Ok(value) => Some(value.parse().context("MAX_RESULTS must be a number")?),
                Err(_) => None,
            },
        })
    }

    /// The per-session extraction config derived from this server config.
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            headless: self.headless,
            block_resources: self.block_resources,
            max_results: self.max_results,
            ..HarvestConfig::default()
        }
    }
}
