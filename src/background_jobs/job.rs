//! The background job contract.

use super::context::JobContext;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// When a job should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// Run every fixed interval, starting one interval after startup.
    Interval(Duration),
}

/// How a job reacts to shutdown while executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownBehavior {
    /// The job is abandoned mid-flight on shutdown; store transactions keep
    /// partial work invisible and the next cycle retries from scratch.
    Cancellable,
    /// The in-flight execution is awaited before the scheduler exits.
    WaitForCompletion,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job cancelled")]
    Cancelled,
    #[error("job execution failed: {0}")]
    ExecutionFailed(String),
}

/// A self-contained scheduled work item. Jobs hold no mutable state of their
/// own; everything they touch comes in through the [`JobContext`].
#[async_trait]
pub trait BackgroundJob: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schedule(&self) -> JobSchedule;

    fn shutdown_behavior(&self) -> ShutdownBehavior;

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError>;
}
