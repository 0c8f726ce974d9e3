//! Note endpoints

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewNote {
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub is_starred: bool,
    pub is_archived: bool,
}

impl NewNote {
    /// Build a note from form input; `tags` is a comma separated list
    pub fn from_input(title: Option<&str>, content: &str, tags: &str, starred: bool) -> Self {
        Self {
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            content: content.to_string(),
            tags: parse_tags(tags),
            is_starred: starred,
            is_archived: false,
        }
    }
}

/// Split a comma separated tag list, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteStats {
    #[serde(default)]
    pub total_notes: i64,
    #[serde(default)]
    pub notes_this_week: i64,
    #[serde(default)]
    pub starred_notes: i64,
}

/// Note endpoints
pub struct NotesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NotesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<NoteStats> {
        self.client.get("/api/notes/stats", "Failed to fetch note stats").await
    }

    pub async fn list(&self) -> Result<Vec<Note>> {
        self.client.get("/api/notes", "Failed to fetch notes").await
    }

    pub async fn create(&self, note: &NewNote) -> Result<Note> {
        if note.content.trim().is_empty() {
            return Err(ApiError::Validation("content is required".into()));
        }
        self.client
            .send(Method::POST, "/api/notes", note, "Failed to create note")
            .await
    }

    pub async fn toggle_starred(&self, id: &str) -> Result<Note> {
        self.client
            .send_empty(
                Method::PUT,
                &format!("/api/notes/{}/toggle-starred", id),
                "Failed to update note",
            )
            .await
    }
}
