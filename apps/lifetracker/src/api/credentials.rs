//! Credentials providers
//!
//! Fetchers never read ambient storage for tokens. They are handed a
//! [`CredentialsProvider`] at construction time instead: a fixed token for
//! scripts and tests, or a [`SessionStore`] that persists the signed-in
//! session to a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Source of the bearer token attached to API requests
pub trait CredentialsProvider: Send + Sync {
    /// Current token, or `None` for anonymous requests
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl CredentialsProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Signed-in user, decoded from the token issued at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_token: String,
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct TokenClaims {
    id: serde_json::Value,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl Session {
    /// Decode the user fields from a JWT payload
    ///
    /// The signature is not verified; the server does that on every request.
    pub fn from_token(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| ApiError::InvalidToken("expected three dot-separated parts".into()))?;

        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::InvalidToken(format!("payload is not base64: {}", e)))?;

        let claims: TokenClaims = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidToken(format!("payload is not JSON: {}", e)))?;

        let id = match claims.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(ApiError::InvalidToken(format!("unexpected user id: {}", other)));
            }
        };

        Ok(Self {
            user_token: token.to_string(),
            id,
            first_name: claims.first_name,
            last_name: claims.last_name,
            email: claims.email,
        })
    }

    /// "First Last", falling back to the email address
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.email.clone().unwrap_or_else(|| format!("user {}", self.id))
        } else {
            name
        }
    }
}

/// On-disk session layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    user: Option<Session>,
    #[serde(default)]
    spotify_token: Option<String>,
}

/// Session persisted to a JSON file
pub struct SessionStore {
    path: PathBuf,
    state: RwLock<SessionFile>,
}

impl SessionStore {
    /// Open the session file, starting empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Signed-in user, if any
    pub fn user(&self) -> Option<Session> {
        self.state.read().user.clone()
    }

    /// Store a freshly issued session
    pub fn sign_in(&self, session: Session) -> Result<()> {
        let mut state = self.state.write();
        state.user = Some(session);
        self.persist(&state)
    }

    /// Forget the signed-in user
    pub fn sign_out(&self) -> Result<()> {
        let mut state = self.state.write();
        state.user = None;
        self.persist(&state)
    }

    pub fn spotify_token(&self) -> Option<String> {
        self.state.read().spotify_token.clone()
    }

    /// Store or clear the Spotify access token
    pub fn set_spotify_token(&self, token: Option<String>) -> Result<()> {
        let mut state = self.state.write();
        state.spotify_token = token;
        self.persist(&state)
    }

    /// Provider that reads the user token from this store
    pub fn user_credentials(self: &Arc<Self>) -> Arc<dyn CredentialsProvider> {
        Arc::new(UserCredentials(Arc::clone(self)))
    }

    /// Provider that reads the Spotify token from this store
    pub fn spotify_credentials(self: &Arc<Self>) -> Arc<dyn CredentialsProvider> {
        Arc::new(SpotifyCredentials(Arc::clone(self)))
    }

    fn persist(&self, state: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}

struct UserCredentials(Arc<SessionStore>);

impl CredentialsProvider for UserCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.0.user().map(|s| s.user_token)
    }
}

struct SpotifyCredentials(Arc<SessionStore>);

impl CredentialsProvider for SpotifyCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.0.spotify_token()
    }
}

#[cfg(test)]
pub(crate) fn fake_jwt(claims: serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.signature",
        engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(claims.to_string())
    )
}
