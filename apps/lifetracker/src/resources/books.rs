//! Book library endpoints

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::{ApiError, Result};

/// Reading status as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    ToRead,
    #[default]
    Reading,
    Finished,
    #[serde(other)]
    Other,
}

impl BookStatus {
    /// Finished books are frozen: forward navigation is blocked
    pub fn is_finished(&self) -> bool {
        matches!(self, BookStatus::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "to_read",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
            BookStatus::Other => "other",
        }
    }
}

/// Book record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub current_page: i64,
    #[serde(default)]
    pub total_pages: Option<i64>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl Book {
    /// Percentage read, when the page total is known
    pub fn percent_complete(&self) -> Option<f64> {
        match self.total_pages {
            Some(total) if total > 0 => {
                Some((self.current_page.clamp(0, total) as f64 / total as f64) * 100.0)
            }
            _ => None,
        }
    }
}

/// Yearly reading goal summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingGoal {
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub target: i64,
    #[serde(default)]
    pub percentage: f64,
}

/// Library statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookStats {
    #[serde(default)]
    pub currently_reading: i64,
    #[serde(default)]
    pub completed_this_year: i64,
    #[serde(default)]
    pub reading_goal: Option<ReadingGoal>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of a progress update
///
/// The backend may answer with the whole book or only part of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub current_page: Option<i64>,
    #[serde(default)]
    pub status: Option<BookStatus>,
}

/// Uploaded book file
#[derive(Debug, Clone)]
pub struct BookFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BookFile {
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Validation(format!("not a file: {}", path.display())))?
            .to_string();
        Ok(Self {
            file_name,
            bytes: std::fs::read(path)?,
        })
    }
}

/// New book submitted with its file
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: BookStatus,
    pub started_at: Option<NaiveDate>,
    pub finished_at: Option<NaiveDate>,
    pub current_page: i64,
    pub total_pages: i64,
    pub rating: Option<f32>,
    pub file: BookFile,
}

impl NewBook {
    fn into_form(self) -> Result<Form> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".into()));
        }

        let mime = mime_guess::from_path(&self.file.file_name).first_or_octet_stream();
        let part = Part::bytes(self.file.bytes)
            .file_name(self.file.file_name)
            .mime_str(mime.as_ref())?;

        let mut form = Form::new()
            .text("title", self.title)
            .text("status", self.status.as_str())
            .text("current_page", self.current_page.to_string())
            .text("total_pages", self.total_pages.to_string())
            .part("file", part);

        if let Some(author) = self.author {
            form = form.text("author", author);
        }
        if let Some(genre) = self.genre {
            form = form.text("genre", genre);
        }
        if let Some(date) = self.started_at {
            form = form.text("started_at", date.to_string());
        }
        if let Some(date) = self.finished_at {
            form = form.text("finished_at", date.to_string());
        }
        if let Some(rating) = self.rating {
            form = form.text("rating", rating.to_string());
        }

        Ok(form)
    }
}

#[derive(Serialize)]
struct ProgressBody {
    current_page: i64,
}

/// Book endpoints
pub struct BooksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BooksApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All books of the signed-in user
    pub async fn list(&self) -> Result<Vec<Book>> {
        self.client.get("/api/books", "Failed to fetch books").await
    }

    pub async fn stats(&self) -> Result<BookStats> {
        self.client.get("/api/books/stats", "Failed to fetch book stats").await
    }

    /// Books and stats together, as the library page loads them
    pub async fn overview(&self) -> Result<(Vec<Book>, BookStats)> {
        futures::future::try_join(self.list(), self.stats()).await
    }

    /// Upload a new book
    pub async fn create(&self, book: NewBook) -> Result<Book> {
        let form = book.into_form()?;
        self.client
            .send_multipart("/api/books", form, "Failed to create book")
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Book> {
        self.client
            .get(&format!("/api/books/{}", id), "Failed to fetch book")
            .await
    }

    /// Persist the current page of a book
    pub async fn update_progress(&self, id: &str, current_page: i64) -> Result<ProgressUpdate> {
        self.client
            .send(
                Method::PUT,
                &format!("/api/books/{}/progress", id),
                &ProgressBody { current_page },
                "Failed to update progress",
            )
            .await
    }

    /// Download the stored file of a book
    pub async fn download(&self, file_path: &str) -> Result<Vec<u8>> {
        self.client.get_bytes(file_path, "Failed to download book file").await
    }
}
