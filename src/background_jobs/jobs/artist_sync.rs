//! Artist synchronization background job.
//!
//! Periodically fetches snapshots of every tracked artist from the remote
//! catalog and reconciles them into the artist store, leaving manually
//! modified records untouched.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, JobError, JobSchedule, ShutdownBehavior},
};
use crate::config::IntervalJobSettings;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

pub struct ArtistSyncJob {
    interval_secs: u64,
}

impl ArtistSyncJob {
    pub fn from_settings(settings: &IntervalJobSettings) -> Self {
        Self {
            interval_secs: settings.interval_secs,
        }
    }
}

#[async_trait]
impl BackgroundJob for ArtistSyncJob {
    fn id(&self) -> &'static str {
        "artist_sync"
    }

    fn name(&self) -> &'static str {
        "Artist Sync"
    }

    fn description(&self) -> &'static str {
        "Fetch tracked artists from the remote catalog and reconcile them into the store"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Interval(Duration::from_secs(self.interval_secs))
    }

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        ShutdownBehavior::Cancellable
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let artists = ctx
            .sync
            .update_artists_from_spotify()
            .await
            .map_err(|e| JobError::ExecutionFailed(format!("artist sync failed: {}", e)))?;

        if !artists.is_empty() {
            info!("Artist sync updated {} artist(s)", artists.len());
        }
        Ok(())
    }
}
