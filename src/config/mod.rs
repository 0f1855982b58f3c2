mod file_config;

pub use file_config::{
    BackgroundJobsFileConfig, FileConfig, IntervalJobFileConfig, SpotifyFileConfig,
};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_API_URL: &str = "https://api.spotify.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
}

/// Settings for the remote provider (OAuth accounts endpoint + catalog API).
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    /// Base URL this server is reachable at; the provider redirects the
    /// login dance back to `{redirect_base_url}/login_response`.
    pub redirect_base_url: String,
    pub accounts_url: String,
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub artists_to_track: Vec<String>,
}

impl SpotifySettings {
    /// `Authorization: Basic` header value for the token endpoint.
    pub fn to_basic_auth_header(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalJobSettings {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundJobsSettings {
    pub artist_sync: IntervalJobSettings,
    pub token_refresh: IntervalJobSettings,
}

impl Default for BackgroundJobsSettings {
    fn default() -> Self {
        Self {
            artist_sync: IntervalJobSettings { interval_secs: 600 },
            token_refresh: IntervalJobSettings { interval_secs: 300 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub spotify: SpotifySettings,
    pub background_jobs: BackgroundJobsSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present; the provider secrets
    /// fall back to the `SPOTIFY_CLIENT_ID`/`SPOTIFY_CLIENT_SECRET`
    /// environment variables.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let sp_file = file.spotify.unwrap_or_default();
        let client_id = sp_file
            .client_id
            .or_else(|| std::env::var("SPOTIFY_CLIENT_ID").ok())
            .context("spotify.client_id missing (config file or SPOTIFY_CLIENT_ID env var)")?;
        let client_secret = sp_file
            .client_secret
            .or_else(|| std::env::var("SPOTIFY_CLIENT_SECRET").ok())
            .context("spotify.client_secret missing (config file or SPOTIFY_CLIENT_SECRET env var)")?;

        let spotify = SpotifySettings {
            client_id,
            client_secret,
            redirect_base_url: sp_file
                .redirect_base_url
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            accounts_url: sp_file
                .accounts_url
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            api_url: sp_file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout_secs: sp_file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            artists_to_track: sp_file.artists_to_track.unwrap_or_default(),
        };

        let bg_file = file.background_jobs.unwrap_or_default();
        let bg_defaults = BackgroundJobsSettings::default();
        let background_jobs = BackgroundJobsSettings {
            artist_sync: IntervalJobSettings {
                interval_secs: bg_file
                    .artist_sync
                    .and_then(|j| j.interval_secs)
                    .unwrap_or(bg_defaults.artist_sync.interval_secs),
            },
            token_refresh: IntervalJobSettings {
                interval_secs: bg_file
                    .token_refresh
                    .and_then(|j| j.interval_secs)
                    .unwrap_or(bg_defaults.token_refresh.interval_secs),
            },
        };

        Ok(Self {
            db_dir,
            port,
            spotify,
            background_jobs,
        })
    }

    pub fn token_db_path(&self) -> PathBuf {
        self.db_dir.join("token.db")
    }

    pub fn artist_db_path(&self) -> PathBuf {
        self.db_dir.join("artist.db")
    }
}
