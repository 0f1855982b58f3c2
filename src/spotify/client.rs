//! Client for the Spotify accounts (OAuth) and catalog endpoints.

use super::models::{ArtistsResponse, TokenResponse};
use crate::artist_store::Artist;
use crate::config::SpotifySettings;
use crate::token_store::AuthToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

const AUTHORIZE_SCOPES: &str = "user-read-private user-read-email";

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("artists fetch failed: {0}")]
    FetchFailed(String),
}

/// Seam between the core and the remote provider. Production uses
/// [`HttpSpotifyClient`]; tests substitute in-memory doubles.
#[async_trait]
pub trait SpotifyGateway: Send + Sync {
    /// Provider authorize URL for the three-legged login dance. `state` is
    /// the caller-generated anti-CSRF nonce, echoed back on the redirect to
    /// `{redirect_base}/login_response`.
    fn authorize_url(&self, client_id: &str, redirect_base: &str, state: &str) -> String;

    /// Exchange an authorization code for a fresh credential.
    async fn exchange_code(
        &self,
        redirect_base: &str,
        basic_auth_header: &str,
        code: &str,
    ) -> Result<AuthToken, SpotifyError>;

    /// Trade the stored refresh token for a new credential. The provider
    /// does not always rotate the refresh token; the old one is carried
    /// forward when the response omits it.
    async fn refresh_token(
        &self,
        old_token: &AuthToken,
        basic_auth_header: &str,
    ) -> Result<AuthToken, SpotifyError>;

    /// Fetch snapshots for all tracked artists in one batched request.
    async fn get_artists(
        &self,
        artist_ids: &[String],
        bearer_token: &str,
    ) -> Result<Vec<Artist>, SpotifyError>;
}

pub struct HttpSpotifyClient {
    client: Client,
    accounts_url: String,
    api_url: String,
}

impl HttpSpotifyClient {
    pub fn new(settings: &SpotifySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            accounts_url: settings.accounts_url.clone(),
            api_url: settings.api_url.clone(),
        })
    }

    async fn post_token_request(
        &self,
        form: &[(&str, &str)],
        basic_auth_header: &str,
    ) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header("Authorization", format!("Basic {}", basic_auth_header))
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("status {}: {}", status, body));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| format!("malformed token response: {}", e))
    }
}

#[async_trait]
impl SpotifyGateway for HttpSpotifyClient {
    fn authorize_url(&self, client_id: &str, redirect_base: &str, state: &str) -> String {
        let redirect_uri = format!("{}/login_response", redirect_base);
        format!(
            "{}/authorize?client_id={}&response_type=code&scope={}&redirect_uri={}&state={}",
            self.accounts_url,
            urlencoding::encode(client_id),
            urlencoding::encode(AUTHORIZE_SCOPES),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(
        &self,
        redirect_base: &str,
        basic_auth_header: &str,
        code: &str,
    ) -> Result<AuthToken, SpotifyError> {
        let redirect_uri = format!("{}/login_response", redirect_base);
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let response = self
            .post_token_request(&form, basic_auth_header)
            .await
            .map_err(SpotifyError::ExchangeFailed)?;

        response.into_auth_token(None).ok_or_else(|| {
            SpotifyError::ExchangeFailed("token response without refresh_token".to_string())
        })
    }

    async fn refresh_token(
        &self,
        old_token: &AuthToken,
        basic_auth_header: &str,
    ) -> Result<AuthToken, SpotifyError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", old_token.refresh_token.as_str()),
        ];
        let response = self
            .post_token_request(&form, basic_auth_header)
            .await
            .map_err(SpotifyError::RefreshFailed)?;

        response
            .into_auth_token(Some(&old_token.refresh_token))
            .ok_or_else(|| SpotifyError::RefreshFailed("token response unusable".to_string()))
    }

    async fn get_artists(
        &self,
        artist_ids: &[String],
        bearer_token: &str,
    ) -> Result<Vec<Artist>, SpotifyError> {
        let response = self
            .client
            .get(format!("{}/v1/artists", self.api_url))
            .query(&[("ids", artist_ids.join(","))])
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| SpotifyError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::FetchFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: ArtistsResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::FetchFailed(format!("malformed artists response: {}", e)))?;

        debug!("Fetched {} artist snapshot(s)", parsed.artists.len());
        Ok(parsed.artists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpotifySettings;

    fn test_settings() -> SpotifySettings {
        SpotifySettings {
            client_id: "client_id_test".to_string(),
            client_secret: "client_secret_test".to_string(),
            redirect_base_url: "http://localhost:8000".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com".to_string(),
            request_timeout_secs: 20,
            artists_to_track: vec![],
        }
    }

    #[test]
    fn authorize_url_contains_the_full_dance() {
        let client = HttpSpotifyClient::new(&test_settings()).unwrap();

        let url = client.authorize_url("client_id_test", "http://localhost:8000", "nonce123");

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("client_id=client_id_test"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=user-read-private%20user-read-email"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Flogin_response"));
        assert!(url.contains("state=nonce123"));
    }

    #[test]
    fn authorize_url_percent_encodes_the_state() {
        let client = HttpSpotifyClient::new(&test_settings()).unwrap();

        let url = client.authorize_url("id", "http://localhost:8000", "a b&c");

        assert!(url.contains("state=a%20b%26c"));
    }
}
