//! Music listening log endpoints

use chrono::{DateTime, Local, NaiveDate, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::Result;

/// Logged track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub track_name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub listened_at: Option<String>,
}

impl Track {
    /// Local calendar day the track was listened to
    pub fn listened_on(&self) -> Option<NaiveDate> {
        let raw = self.listened_at.as_deref()?;
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Local).date_naive());
        }
        // Some rows only carry a date
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }
}

/// Track to log
#[derive(Debug, Clone, Serialize)]
pub struct NewTrack {
    pub track_name: String,
    pub artist: String,
    pub album: String,
    pub mood: String,
    pub genre: String,
    pub duration_minutes: i64,
    pub listened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistCount {
    #[serde(default, alias = "artist")]
    pub name: String,
    #[serde(default, alias = "plays")]
    pub count: i64,
}

/// Listening statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicStats {
    #[serde(default)]
    pub top_artists: Vec<ArtistCount>,
    #[serde(default)]
    pub mood_distribution: serde_json::Value,
    #[serde(default)]
    pub daily_listening: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Music endpoints
pub struct MusicApi<'a> {
    client: &'a ApiClient,
}

impl<'a> MusicApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_track(&self, track: &NewTrack) -> Result<Track> {
        self.client
            .send(Method::POST, "/api/music", track, "Failed to create track")
            .await
    }

    /// Insert the track, or update the existing row for the same listen
    pub async fn upsert_track(&self, track: &NewTrack) -> Result<Track> {
        self.client
            .send(Method::POST, "/api/music/upsert", track, "Failed to create or update track")
            .await
    }

    pub async fn list(&self) -> Result<Vec<Track>> {
        self.client.get("/api/music", "Failed to fetch tracks").await
    }

    pub async fn stats(&self) -> Result<MusicStats> {
        self.client.get("/api/music/stats", "Failed to fetch stats").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listened_on_formats() {
        let mut track: Track = serde_json::from_value(json!({
            "id": 1,
            "track_name": "Song",
            "artist": "Band",
            "listened_at": "2024-03-05"
        }))
        .unwrap();
        assert_eq!(track.listened_on(), NaiveDate::from_ymd_opt(2024, 3, 5));

        let at = Local::now();
        track.listened_at = Some(at.to_rfc3339());
        assert_eq!(track.listened_on(), Some(at.date_naive()));

        track.listened_at = Some("garbage".into());
        assert_eq!(track.listened_on(), None);
    }

    #[test]
    fn test_new_track_serializes_utc() {
        let track = NewTrack {
            track_name: "Song".into(),
            artist: "Band".into(),
            album: "Unknown Album".into(),
            mood: "listening".into(),
            genre: String::new(),
            duration_minutes: 3,
            listened_at: DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["listened_at"], "2024-03-05T10:00:00Z");
        assert_eq!(value["mood"], "listening");
    }
}
