//! Document store backed by the books endpoints

use async_trait::async_trait;

use super::error::{StoreError, StoreResult};
use super::traits::DocumentStore;
use super::types::{DocumentId, DocumentMetadata, PageIndex, ProgressRecord};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::resources::{Book, BookStatus, BooksApi};

/// [`DocumentStore`] over `/api/books`
#[derive(Clone)]
pub struct RemoteDocumentStore {
    client: ApiClient,
}

impl RemoteDocumentStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn books(&self) -> BooksApi<'_> {
        BooksApi::new(&self.client)
    }
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        if err.is_network() {
            return StoreError::Network(err.to_string());
        }
        match err {
            ApiError::NotFound(msg) => StoreError::NotFound(msg),
            ApiError::Status { status: 409, message } => StoreError::Conflict(message),
            ApiError::Status { status, message } if status >= 500 => {
                StoreError::Network(format!("{} (HTTP {})", message, status))
            }
            other => StoreError::Invalid(other.to_string()),
        }
    }
}

fn to_metadata(id: DocumentId, book: Book) -> DocumentMetadata {
    DocumentMetadata {
        id,
        title: book.title,
        author: book.author,
        mime_type: book.mime_type,
        stored_page: book.current_page,
        total_pages: book.total_pages,
        status: book.status,
        file_path: book.file_path,
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    async fn fetch_metadata(&self, id: &DocumentId) -> StoreResult<DocumentMetadata> {
        let book = self.books().get(id.as_str()).await?;
        Ok(to_metadata(id.clone(), book))
    }

    async fn fetch_binary(&self, metadata: &DocumentMetadata) -> StoreResult<Vec<u8>> {
        let path = metadata
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| StoreError::NotFound(format!("book {} has no file", metadata.id)))?;

        let bytes = self.books().download(path).await?;
        tracing::debug!("Downloaded {} bytes for book {}", bytes.len(), metadata.id);
        Ok(bytes)
    }

    async fn update_progress(&self, id: &DocumentId, page: PageIndex) -> StoreResult<ProgressRecord> {
        let requested = i64::from(page.get());
        let update = self.books().update_progress(id.as_str(), requested).await?;

        Ok(ProgressRecord {
            confirmed_page: update.current_page.unwrap_or(requested),
            status: update.status.filter(|s| *s != BookStatus::Other),
        })
    }

    fn content_url(&self, metadata: &DocumentMetadata) -> Option<String> {
        metadata
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| self.client.url(p))
    }
}
