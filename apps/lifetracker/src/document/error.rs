//! Document error types
//!
//! One enum per contract: the store, the renderer, and the view controller
//! that sits on top of both.

use thiserror::Error;

/// Document store failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Unknown document id or missing file
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The server rejected a concurrent update
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No usable response
    #[error("Network error: {0}")]
    Network(String),

    /// Any other rejected request or malformed reply
    #[error("Invalid response: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Page renderer failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    /// The render was superseded; not a failure
    #[error("Render cancelled")]
    Cancelled,

    /// Bytes are not a readable document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Document or page does not exist
    #[error("Missing document: {0}")]
    MissingDocument(String),

    /// Another writer holds the surface
    #[error("Surface is already being drawn to")]
    SurfaceBusy,

    #[error("Render backend error: {0}")]
    Backend(String),
}

impl RenderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }
}

/// Classified render failure shown to the reader
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderFailure {
    #[error("invalid document")]
    Invalid,

    #[error("missing document")]
    Missing,

    #[error("surface conflict")]
    Conflict,

    #[error("render error: {0}")]
    Generic(String),
}

impl RenderFailure {
    /// Classify a renderer error; cancellation is not a failure
    pub fn classify(err: RenderError) -> Option<Self> {
        match err {
            RenderError::Cancelled => None,
            RenderError::InvalidDocument(_) => Some(RenderFailure::Invalid),
            RenderError::MissingDocument(_) => Some(RenderFailure::Missing),
            RenderError::SurfaceBusy => Some(RenderFailure::Conflict),
            RenderError::Backend(msg) => Some(RenderFailure::Generic(msg)),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RenderFailure::Invalid => {
                "Invalid PDF file. The file may be corrupted or not a PDF.".to_string()
            }
            RenderFailure::Missing => {
                "PDF file not found. Check if the file was uploaded correctly.".to_string()
            }
            RenderFailure::Conflict => "Rendering conflict. Please refresh the page.".to_string(),
            RenderFailure::Generic(msg) => format!("Failed to render PDF: {}", msg),
        }
    }
}

/// View controller error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewError {
    /// No id supplied, or the store does not know it
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to load document: {0}")]
    LoadFailed(String),

    #[error("Render failed: {0}")]
    Render(RenderFailure),

    /// The page stayed where it was
    #[error("Failed to update progress: {0}")]
    ProgressUpdateFailed(String),

    #[error("Operation not allowed while {0}")]
    InvalidState(&'static str),
}

impl ViewError {
    pub fn user_message(&self) -> String {
        match self {
            ViewError::NotFound(_) | ViewError::LoadFailed(_) => "Failed to load book.".to_string(),
            ViewError::Render(failure) => failure.user_message(),
            ViewError::ProgressUpdateFailed(_) => "Failed to update progress.".to_string(),
            ViewError::InvalidState(_) => self.to_string(),
        }
    }
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(RenderFailure::classify(RenderError::Cancelled), None);
        assert_eq!(
            RenderFailure::classify(RenderError::SurfaceBusy),
            Some(RenderFailure::Conflict)
        );
        assert_eq!(
            RenderFailure::classify(RenderError::InvalidDocument("bad xref".into())),
            Some(RenderFailure::Invalid)
        );
    }

    #[test]
    fn test_messages_are_distinct() {
        let messages = [
            RenderFailure::Invalid.user_message(),
            RenderFailure::Missing.user_message(),
            RenderFailure::Conflict.user_message(),
            RenderFailure::Generic("boom".into()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(messages[3], "Failed to render PDF: boom");
    }
}
