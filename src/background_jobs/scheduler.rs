//! Interval-driven job scheduler.
//!
//! A single loop owns every registered job and executes due jobs one at a
//! time, so at most one sync or refresh operation is ever in flight against
//! the stores.

use super::context::JobContext;
use super::job::{BackgroundJob, JobError, JobSchedule, ShutdownBehavior};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub fn create_scheduler(shutdown_token: CancellationToken, context: JobContext) -> JobScheduler {
    JobScheduler {
        jobs: Vec::new(),
        context,
        shutdown_token,
    }
}

pub struct JobScheduler {
    jobs: Vec<Arc<dyn BackgroundJob>>,
    context: JobContext,
    shutdown_token: CancellationToken,
}

impl JobScheduler {
    pub fn register_job(&mut self, job: Arc<dyn BackgroundJob>) {
        info!("Registered job {} ({})", job.id(), job.description());
        self.jobs.push(job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Drive the registered jobs until the shutdown token fires.
    pub async fn run(self) {
        if self.jobs.is_empty() {
            self.shutdown_token.cancelled().await;
            return;
        }

        let mut schedule: Vec<(Arc<dyn BackgroundJob>, Instant)> = self
            .jobs
            .iter()
            .map(|job| {
                let JobSchedule::Interval(interval) = job.schedule();
                (Arc::clone(job), Instant::now() + interval)
            })
            .collect();

        loop {
            let Some(earliest) = schedule.iter().map(|(_, next_run)| *next_run).min() else {
                break;
            };

            tokio::select! {
                _ = tokio::time::sleep_until(earliest) => {}
                _ = self.shutdown_token.cancelled() => break,
            }

            let now = Instant::now();
            for (job, next_run) in schedule.iter_mut() {
                if *next_run > now {
                    continue;
                }
                self.execute_job(job).await;
                let JobSchedule::Interval(interval) = job.schedule();
                *next_run = Instant::now() + interval;

                if self.shutdown_token.is_cancelled() {
                    return;
                }
            }
        }
    }

    async fn execute_job(&self, job: &Arc<dyn BackgroundJob>) {
        let started = Instant::now();
        let result = match job.shutdown_behavior() {
            ShutdownBehavior::WaitForCompletion => job.execute(&self.context).await,
            ShutdownBehavior::Cancellable => tokio::select! {
                result = job.execute(&self.context) => result,
                _ = self.shutdown_token.cancelled() => Err(JobError::Cancelled),
            },
        };
        match result {
            Ok(()) => info!(
                "Job {} completed in {}ms",
                job.id(),
                started.elapsed().as_millis()
            ),
            Err(JobError::Cancelled) => info!("Job {} cancelled", job.id()),
            Err(e) => error!("Job {} failed: {}", job.id(), e),
        }
    }
}
