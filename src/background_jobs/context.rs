use crate::sync::SyncService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context provided to jobs during execution.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    /// The core sync operations (credential refresh, artist sync).
    pub sync: Arc<SyncService>,
}

impl JobContext {
    pub fn new(cancellation_token: CancellationToken, sync: Arc<SyncService>) -> Self {
        Self {
            cancellation_token,
            sync,
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
