//! Document traits
//!
//! The view controller talks to the outside world through these: a store
//! that knows documents and reading progress, and a renderer that turns
//! document bytes into pages.

use std::sync::Arc;

use async_trait::async_trait;

use super::cancel::CancellationToken;
use super::error::{RenderError, StoreResult};
use super::surface::SurfaceLease;
use super::types::{DocumentId, DocumentMetadata, PageIndex, ProgressRecord};

/// Remote document and progress storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Metadata of a document; `StoreError::NotFound` for unknown ids
    async fn fetch_metadata(&self, id: &DocumentId) -> StoreResult<DocumentMetadata>;

    /// Raw document bytes
    async fn fetch_binary(&self, metadata: &DocumentMetadata) -> StoreResult<Vec<u8>>;

    /// Persist the current page. Repeating an identical call is harmless.
    async fn update_progress(&self, id: &DocumentId, page: PageIndex) -> StoreResult<ProgressRecord>;

    /// URL of the whole document, for formats that are not paginated
    fn content_url(&self, metadata: &DocumentMetadata) -> Option<String>;
}

/// Opens document bytes for rendering
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn RenderableDocument>, RenderError>;
}

/// An opened, renderable document
#[async_trait]
pub trait RenderableDocument: Send + Sync {
    fn page_count(&self) -> u32;

    /// Draw `page` at `scale` onto the leased surface
    ///
    /// Implementations check `cancel` and return [`RenderError::Cancelled`]
    /// promptly once it fires.
    async fn render_page(
        &self,
        page: PageIndex,
        scale: f32,
        lease: &SurfaceLease,
        cancel: &CancellationToken,
    ) -> Result<(), RenderError>;
}
