use crate::artist_store::ArtistStore;
use crate::sync::SyncService;
use crate::token_store::TokenStore;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct ServerState {
    pub start_time: Instant,
    pub sync: Arc<SyncService>,
    pub token_store: Arc<dyn TokenStore>,
    pub artist_store: Arc<dyn ArtistStore>,
}

impl ServerState {
    pub fn new(
        sync: Arc<SyncService>,
        token_store: Arc<dyn TokenStore>,
        artist_store: Arc<dyn ArtistStore>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            sync,
            token_store,
            artist_store,
        }
    }
}
