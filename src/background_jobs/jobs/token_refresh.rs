//! Credential refresh background job.
//!
//! Periodically checks the stored OAuth credential and refreshes it once it
//! has expired. Without a stored credential the job is a no-op until a human
//! completes the interactive login.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, JobError, JobSchedule, ShutdownBehavior},
};
use crate::config::IntervalJobSettings;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

pub struct TokenRefreshJob {
    interval_secs: u64,
}

impl TokenRefreshJob {
    pub fn from_settings(settings: &IntervalJobSettings) -> Self {
        Self {
            interval_secs: settings.interval_secs,
        }
    }
}

#[async_trait]
impl BackgroundJob for TokenRefreshJob {
    fn id(&self) -> &'static str {
        "token_refresh"
    }

    fn name(&self) -> &'static str {
        "Token Refresh"
    }

    fn description(&self) -> &'static str {
        "Refresh the stored OAuth credential once it has expired"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Interval(Duration::from_secs(self.interval_secs))
    }

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        // A freshly obtained credential should always reach the store.
        ShutdownBehavior::WaitForCompletion
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let refreshed = ctx
            .sync
            .refresh_auth_token()
            .await
            .map_err(|e| JobError::ExecutionFailed(format!("token refresh failed: {}", e)))?;

        if refreshed.is_some() {
            info!("Token refresh replaced the stored credential");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_metadata() {
        let job = TokenRefreshJob::from_settings(&IntervalJobSettings { interval_secs: 300 });

        assert_eq!(job.id(), "token_refresh");
        assert_eq!(job.name(), "Token Refresh");
        assert!(!job.description().is_empty());
        assert_eq!(job.shutdown_behavior(), ShutdownBehavior::WaitForCompletion);
    }

    #[test]
    fn test_job_schedule() {
        let job = TokenRefreshJob::from_settings(&IntervalJobSettings { interval_secs: 300 });

        assert_eq!(
            job.schedule(),
            JobSchedule::Interval(Duration::from_secs(300))
        );
    }
}
