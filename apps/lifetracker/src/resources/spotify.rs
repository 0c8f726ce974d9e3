//! Spotify integration endpoints

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::{ApiError, Result};

/// Permissions requested from Spotify
pub const SCOPES: &str = "user-read-currently-playing user-read-private";

const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    #[serde(default)]
    pub name: String,
}

/// Track currently playing on the user's account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayingItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl PlayingItem {
    pub fn first_artist(&self) -> Option<&str> {
        self.artists
            .first()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn album_name(&self) -> Option<&str> {
        self.album
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Duration in whole minutes, rounded down
    pub fn duration_minutes(&self) -> i64 {
        (self.duration_ms.unwrap_or(0) / 60_000) as i64
    }
}

#[derive(Deserialize)]
struct NowPlayingReply {
    #[serde(default)]
    item: Option<PlayingItem>,
}

#[derive(Serialize)]
struct CodeExchange<'a> {
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenReply {
    #[serde(default)]
    access_token: Option<String>,
}

/// Spotify authorization page URL for the code flow
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&show_dialog=true",
        AUTHORIZE_ENDPOINT,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPES),
    )
}

/// Spotify endpoints
///
/// `now_playing` needs a client carrying the Spotify access token, not the
/// user's session token.
pub struct SpotifyApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SpotifyApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Currently playing item; `None` when nothing is playing
    pub async fn now_playing(&self) -> Result<Option<PlayingItem>> {
        let reply: Option<NowPlayingReply> = self
            .client
            .get_optional("/api/spotify/now-playing", "Failed to fetch now playing")
            .await?;
        Ok(reply.and_then(|r| r.item))
    }

    /// Trade an authorization code for an access token
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String> {
        if code.is_empty() {
            return Err(ApiError::Validation("No code found in callback".into()));
        }

        let reply: TokenReply = self
            .client
            .send_anonymous(
                "/api/spotify/callback",
                &CodeExchange { code, redirect_uri },
                "Spotify connection failed",
            )
            .await?;

        reply
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("callback reply has no access_token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticToken;
    use crate::testing::spawn_server;
    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_authorize_url() {
        let url = authorize_url("abc", "http://localhost:5173/callback");
        assert!(url.starts_with("https://accounts.spotify.com/authorize?client_id=abc"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fcallback"));
        assert!(url.contains("scope=user-read-currently-playing%20user-read-private"));
        assert!(url.ends_with("show_dialog=true"));
    }

    #[test]
    fn test_item_defaults() {
        let item: PlayingItem =
            serde_json::from_value(json!({ "name": "Song", "artists": [], "duration_ms": 179_999 })).unwrap();
        assert_eq!(item.first_artist(), None);
        assert_eq!(item.album_name(), None);
        assert_eq!(item.duration_minutes(), 2);
    }

    #[tokio::test]
    async fn test_now_playing_uses_spotify_token() {
        let app = Router::new().route(
            "/api/spotify/now-playing",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth == "Bearer spotify" {
                    Json(json!({ "item": { "name": "Song", "artists": [{ "name": "Band" }] } })).into_response()
                } else {
                    StatusCode::NO_CONTENT.into_response()
                }
            }),
        );
        let base = spawn_server(app).await;
        let user = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("user")));
        let spotify = user.with_credentials(Arc::new(StaticToken::new("spotify")));

        assert_eq!(SpotifyApi::new(&user).now_playing().await.unwrap(), None);

        let item = SpotifyApi::new(&spotify).now_playing().await.unwrap().unwrap();
        assert_eq!(item.name, "Song");
        assert_eq!(item.first_artist(), Some("Band"));
    }

    #[tokio::test]
    async fn test_now_playing_unauthorized() {
        let app = Router::new().route(
            "/api/spotify/now-playing",
            get(|| async { StatusCode::UNAUTHORIZED }),
        );
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("old")));

        let err = SpotifyApi::new(&client).now_playing().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
