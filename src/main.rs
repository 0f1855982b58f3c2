use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trackify_server::artist_store::SqliteArtistStore;
use trackify_server::background_jobs::jobs::{ArtistSyncJob, TokenRefreshJob};
use trackify_server::background_jobs::{create_scheduler, JobContext};
use trackify_server::config;
use trackify_server::server::run_server;
use trackify_server::spotify::HttpSpotifyClient;
use trackify_server::sync::SyncService;
use trackify_server::token_store::SqliteTokenStore;

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (token.db, artist.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!(
        "  tracking {} artist(s)",
        app_config.spotify.artists_to_track.len()
    );

    let token_store = Arc::new(SqliteTokenStore::new(app_config.token_db_path())?);
    let artist_store = Arc::new(SqliteArtistStore::new(app_config.artist_db_path())?);
    let spotify = Arc::new(HttpSpotifyClient::new(&app_config.spotify)?);

    let sync = Arc::new(SyncService::new(
        spotify,
        token_store.clone(),
        artist_store.clone(),
        &app_config.spotify,
    ));

    let shutdown_token = CancellationToken::new();
    let job_context = JobContext::new(shutdown_token.child_token(), sync.clone());

    let mut scheduler = create_scheduler(shutdown_token.clone(), job_context);
    scheduler.register_job(Arc::new(ArtistSyncJob::from_settings(
        &app_config.background_jobs.artist_sync,
    )));
    scheduler.register_job(Arc::new(TokenRefreshJob::from_settings(
        &app_config.background_jobs.token_refresh,
    )));

    info!("Job scheduler initialized with {} job(s)", scheduler.job_count());
    info!("Ready to serve at port {}!", app_config.port);

    tokio::select! {
        result = run_server(sync, token_store, artist_store, app_config.port) => {
            info!("HTTP server stopped: {:?}", result);
            shutdown_token.cancel();
            result
        },
        _ = scheduler.run() => {
            info!("Scheduler stopped");
            Ok(())
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            shutdown_token.cancel();
            Ok(())
        }
    }
}
