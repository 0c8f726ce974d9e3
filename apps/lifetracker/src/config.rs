//! Configuration management for the LifeTracker client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub spotify: SpotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend origin, without the `/api` suffix
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub redirect_uri: String,
    pub poll_interval_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SpotifyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:5000".to_string(),
                request_timeout_secs: 30,
            },
            session: SessionConfig {
                file: PathBuf::from(".lifetracker-session.json"),
            },
            spotify: SpotifyConfig {
                client_id: None,
                redirect_uri: "http://localhost:5173/callback".to_string(),
                poll_interval_secs: 10,
            },
        }
    }
}

impl Config {
    /// Build configuration from the environment, after loading `.env` if present
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let defaults = Config::default();

        Config {
            api: ApiConfig {
                base_url: env::var("LIFETRACKER_API_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.api.base_url),
                request_timeout_secs: parse_var("LIFETRACKER_REQUEST_TIMEOUT_SECS")
                    .unwrap_or(defaults.api.request_timeout_secs),
            },
            session: SessionConfig {
                file: env::var("LIFETRACKER_SESSION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.file),
            },
            spotify: SpotifyConfig {
                client_id: env::var("SPOTIFY_CLIENT_ID").ok().filter(|id| !id.is_empty()),
                redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                    .unwrap_or(defaults.spotify.redirect_uri),
                poll_interval_secs: parse_var("LIFETRACKER_POLL_INTERVAL_SECS")
                    .unwrap_or(defaults.spotify.poll_interval_secs),
            },
        }
    }
}

fn parse_var(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.spotify.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let mut config = Config::default();
        config.spotify.poll_interval_secs = 0;
        assert_eq!(config.spotify.poll_interval(), Duration::from_secs(1));
    }
}
