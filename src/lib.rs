pub mod artist_store;
pub mod background_jobs;
pub mod config;
pub mod server;
pub mod spotify;
pub mod sqlite_persistence;
pub mod sync;
pub mod token_store;
