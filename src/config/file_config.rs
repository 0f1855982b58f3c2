//! TOML configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Raw TOML file configuration. Every field is optional; resolution against
/// CLI arguments and defaults happens in [`super::AppConfig::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub spotify: Option<SpotifyFileConfig>,
    pub background_jobs: Option<BackgroundJobsFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyFileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_base_url: Option<String>,
    pub accounts_url: Option<String>,
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub artists_to_track: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackgroundJobsFileConfig {
    pub artist_sync: Option<IntervalJobFileConfig>,
    pub token_refresh: Option<IntervalJobFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntervalJobFileConfig {
    pub interval_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
