//! The two idempotent core operations behind both the HTTP surface and the
//! background jobs: credential refresh and artist synchronization.

use crate::artist_store::{Artist, ArtistStore};
use crate::config::SpotifySettings;
use crate::spotify::SpotifyGateway;
use crate::token_store::{AuthToken, TokenStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct SyncService {
    spotify: Arc<dyn SpotifyGateway>,
    token_store: Arc<dyn TokenStore>,
    artist_store: Arc<dyn ArtistStore>,
    client_id: String,
    redirect_base: String,
    basic_auth_header: String,
    tracked_artists: Vec<String>,
}

impl SyncService {
    pub fn new(
        spotify: Arc<dyn SpotifyGateway>,
        token_store: Arc<dyn TokenStore>,
        artist_store: Arc<dyn ArtistStore>,
        settings: &SpotifySettings,
    ) -> Self {
        Self {
            spotify,
            token_store,
            artist_store,
            client_id: settings.client_id.clone(),
            redirect_base: settings.redirect_base_url.clone(),
            basic_auth_header: settings.to_basic_auth_header(),
            tracked_artists: settings.artists_to_track.clone(),
        }
    }

    /// Provider authorize URL for the interactive login flow.
    pub fn login_redirect_url(&self, state: &str) -> String {
        self.spotify
            .authorize_url(&self.client_id, &self.redirect_base, state)
    }

    /// Exchange an authorization code and store the resulting credential.
    /// Returns None when the exchange fails (logged, user retries login).
    pub async fn complete_login(&self, code: &str) -> Result<Option<AuthToken>> {
        match self
            .spotify
            .exchange_code(&self.redirect_base, &self.basic_auth_header, code)
            .await
        {
            Ok(token) => {
                self.token_store.replace(&token)?;
                info!("Login completed, credential stored");
                Ok(Some(token))
            }
            Err(e) => {
                error!("{}", e);
                Ok(None)
            }
        }
    }

    /// Refresh the stored credential if it is expired.
    ///
    /// Returns None when there is no credential, when the credential is not
    /// expired yet (no refresh attempted), or when the provider refresh
    /// fails; the failed case keeps the old credential so the next cycle
    /// retries.
    pub async fn refresh_auth_token(&self) -> Result<Option<AuthToken>> {
        let Some(current) = self.token_store.get()? else {
            warn!("No credential stored, complete a login first");
            return Ok(None);
        };
        if !current.expired() {
            return Ok(None);
        }
        match self
            .spotify
            .refresh_token(&current, &self.basic_auth_header)
            .await
        {
            Ok(new_token) => {
                self.token_store.replace(&new_token)?;
                info!("Credential refreshed");
                Ok(Some(new_token))
            }
            Err(e) => {
                error!("{}", e);
                Ok(None)
            }
        }
    }

    /// Fetch snapshots for every tracked artist and reconcile them into the
    /// store, leaving manually modified records untouched. Remote failures
    /// skip the cycle and yield an empty list; the next cycle retries.
    pub async fn update_artists_from_spotify(&self) -> Result<Vec<Artist>> {
        if self.tracked_artists.is_empty() {
            return Ok(Vec::new());
        }
        let Some(token) = self.usable_token().await? else {
            return Ok(Vec::new());
        };
        let snapshots = match self
            .spotify
            .get_artists(&self.tracked_artists, &token.access_token)
            .await
        {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("{}", e);
                return Ok(Vec::new());
            }
        };
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }
        let artists = self.artist_store.upsert_artists(&snapshots, true, false)?;
        info!("Reconciled {} artist(s)", artists.len());
        Ok(artists)
    }

    /// Resolve a non-expired bearer credential, refreshing inline when the
    /// stored one has expired.
    async fn usable_token(&self) -> Result<Option<AuthToken>> {
        let Some(current) = self.token_store.get()? else {
            warn!("No credential stored, skipping artist sync");
            return Ok(None);
        };
        if !current.expired() {
            return Ok(Some(current));
        }
        match self
            .spotify
            .refresh_token(&current, &self.basic_auth_header)
            .await
        {
            Ok(new_token) => {
                self.token_store.replace(&new_token)?;
                info!("Credential refreshed before artist sync");
                Ok(Some(new_token))
            }
            Err(e) => {
                error!("{}", e);
                Ok(None)
            }
        }
    }
}
