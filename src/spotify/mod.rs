mod client;
mod models;

pub use client::{HttpSpotifyClient, SpotifyError, SpotifyGateway};
pub use models::TokenResponse;
