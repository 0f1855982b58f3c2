//! Wire types for the Spotify accounts and catalog endpoints.

use crate::artist_store::Artist;
use crate::token_store::AuthToken;
use chrono::Utc;
use serde::Deserialize;

/// Body returned by the accounts token endpoint, for both the
/// authorization_code and refresh_token grants. The provider omits
/// `refresh_token` on some refreshes.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
    pub token_type: String,
}

impl TokenResponse {
    /// Turn the wire response into a stored credential issued now.
    ///
    /// When the response carries no refresh token, the previous one is
    /// carried forward; without either there is no usable credential.
    pub fn into_auth_token(self, previous_refresh_token: Option<&str>) -> Option<AuthToken> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string))?;
        Some(AuthToken {
            access_token: self.access_token,
            refresh_token,
            expires_in: self.expires_in,
            scope: self.scope,
            token_type: self.token_type,
            created: Utc::now(),
        })
    }
}

/// Envelope of the batched artists endpoint.
#[derive(Debug, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Artist>,
}
