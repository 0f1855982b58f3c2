use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use axum_extra::extract::cookie::{Cookie, CookieJar};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Json, Router,
};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};

use super::state::ServerState;
use crate::artist_store::{Artist, ArtistStore};
use crate::sync::SyncService;
use crate::token_store::TokenStore;

const STATE_COOKIE: &str = "oauth_state";
const STATE_LENGTH: usize = 16;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn login(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let login_state = Alphanumeric.sample_string(&mut rand::rng(), STATE_LENGTH);
    let url = state.sync.login_redirect_url(&login_state);

    let cookie = Cookie::build((STATE_COOKIE, login_state))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::minutes(5))
        .build();

    (jar.add(cookie), Redirect::temporary(&url))
}

#[derive(Deserialize)]
struct LoginResponseParams {
    state: String,
    code: Option<String>,
    error: Option<String>,
}

async fn login_response(
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(params): Query<LoginResponseParams>,
) -> Response {
    let original_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if original_state.as_deref() != Some(params.state.as_str()) {
        return "state_mismatch".into_response();
    }
    if let Some(provider_error) = params.error {
        return provider_error.into_response();
    }
    let Some(code) = params.code else {
        return "no_code".into_response();
    };
    match state.sync.complete_login(&code).await {
        Ok(Some(_)) => "login_successful".into_response(),
        Ok(None) => "get_token_failed".into_response(),
        Err(e) => {
            error!("Failed to store exchanged credential: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_auth_token(State(state): State<ServerState>) -> Response {
    match state.token_store.get() {
        Ok(token) => Json(token).into_response(),
        Err(e) => {
            error!("Failed to read credential: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn refresh_auth_token(State(state): State<ServerState>) -> Response {
    match state.sync.refresh_auth_token().await {
        Ok(token) => Json(token).into_response(),
        Err(e) => {
            error!("Failed to refresh credential: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn update_artists_from_spotify(State(state): State<ServerState>) -> Response {
    match state.sync.update_artists_from_spotify().await {
        Ok(artists) => Json(artists).into_response(),
        Err(e) => {
            error!("Failed to sync artists: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_artist(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.artist_store.get_artist(&id) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to read artist {}: {:?}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn update_artist(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(mut artist): Json<Artist>,
) -> Response {
    artist.id = id;
    match state.artist_store.upsert_artist(&artist, false, true) {
        Ok(Some(updated)) => Json(updated).into_response(),
        Ok(None) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(e) => {
            error!("Failed to update artist {}: {:?}", artist.id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn create_artist(State(state): State<ServerState>, Json(artist): Json<Artist>) -> Response {
    match state.artist_store.create_artist(&artist) {
        Ok(created) => Json(created).into_response(),
        Err(e) => {
            error!("Failed to create artist {}: {:?}", artist.id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_artist(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.artist_store.delete_artist(&id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Failed to delete artist {}: {:?}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_app(
    sync: Arc<SyncService>,
    token_store: Arc<dyn TokenStore>,
    artist_store: Arc<dyn ArtistStore>,
) -> Router {
    let state = ServerState::new(sync, token_store, artist_store);

    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/login_response", get(login_response))
        .route("/auth_token", get(get_auth_token))
        .route("/refresh_auth_token", get(refresh_auth_token))
        .route("/update_artists_from_spotify", get(update_artists_from_spotify))
        .route("/artist/", put(create_artist))
        .route(
            "/artist/{id}",
            get(get_artist).put(update_artist).delete(delete_artist),
        )
        .with_state(state)
}

pub async fn run_server(
    sync: Arc<SyncService>,
    token_store: Arc<dyn TokenStore>,
    artist_store: Arc<dyn ArtistStore>,
    port: u16,
) -> Result<()> {
    let app = make_app(sync, token_store, artist_store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
