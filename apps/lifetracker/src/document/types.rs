//! Core document types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::BookStatus;

/// Identifier of a document in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Parse a user supplied id; blank ids are rejected
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct PageIndex(u32);

impl PageIndex {
    pub const FIRST: PageIndex = PageIndex(1);

    /// `None` for page zero
    pub fn new(page: u32) -> Option<Self> {
        (page >= 1).then_some(Self(page))
    }

    /// Clamp a raw page number (as stored by the server) into `[1, page_count]`
    ///
    /// Zero, negative, and missing progress all mean page 1.
    pub fn clamp(raw: i64, page_count: u32) -> Self {
        let upper = i64::from(page_count.max(1));
        Self(raw.clamp(1, upper) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based index, as used by renderers
    pub fn zero_based(self) -> u32 {
        self.0 - 1
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Previous page; page 1 stays on page 1
    pub fn previous(self) -> Self {
        Self((self.0 - 1).max(1))
    }
}

impl TryFrom<u32> for PageIndex {
    type Error = &'static str;

    fn try_from(page: u32) -> Result<Self, Self::Error> {
        Self::new(page).ok_or("page numbers start at 1")
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a document is presented, resolved once from its mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Rendered one page at a time
    Paginated,
    /// Shown whole through its content URL
    Embedded,
}

impl DocumentKind {
    pub fn from_mime(mime: Option<&str>) -> Self {
        let essence = mime
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());
        match essence.as_deref() {
            Some("application/pdf") => Self::Paginated,
            _ => Self::Embedded,
        }
    }
}

/// Metadata needed to open a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub title: String,
    pub author: Option<String>,
    pub mime_type: Option<String>,
    /// Page the reader was last on, unclamped
    pub stored_page: i64,
    pub total_pages: Option<i64>,
    pub status: BookStatus,
    pub file_path: Option<String>,
}

/// Reply of a progress update
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub confirmed_page: i64,
    /// Completion status reported with the update, when known
    pub status: Option<BookStatus>,
}
