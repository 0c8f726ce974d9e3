//! Paginated document view controller
//!
//! Loads a document through a [`DocumentStore`], renders one page at a time
//! onto a [`Surface`], and keeps the stored reading progress in step with
//! navigation.
//!
//! Renders never overlap: starting a render cancels the live one and waits
//! for its task to finish before the new one is spawned. Navigation moves
//! the page only after the store has confirmed the new position.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::cancel::CancellationToken;
use super::error::{RenderError, RenderFailure, StoreError, ViewError, ViewResult};
use super::surface::Surface;
use super::traits::{DocumentStore, PageRenderer, RenderableDocument};
use super::types::{DocumentId, DocumentKind, DocumentMetadata, PageIndex};
use crate::resources::BookStatus;

/// Zoom applied to every rendered page
pub const RENDER_SCALE: f32 = 1.5;

const EVENT_CAPACITY: usize = 64;

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Ready,
    Rendering,
    LoadFailed,
    RenderFailed,
    Closed,
}

impl ViewState {
    fn name(self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Ready => "ready",
            ViewState::Rendering => "rendering",
            ViewState::LoadFailed => "load failed",
            ViewState::RenderFailed => "render failed",
            ViewState::Closed => "closed",
        }
    }
}

/// Notification sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    DocumentOpened {
        id: DocumentId,
        page: PageIndex,
        page_count: u32,
        kind: DocumentKind,
    },
    /// The store confirmed a new current page
    ProgressChanged { id: DocumentId, page: PageIndex },
    RenderCompleted { page: PageIndex },
    RenderCancelled { page: PageIndex },
    Failed { error: ViewError },
    Closed,
}

/// How a render request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed(PageIndex),
    Cancelled(PageIndex),
    /// Nothing to render (embedded document, or no render pending)
    Skipped,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Already at the boundary, frozen, or not paginated
    Unchanged,
    Moved {
        page: PageIndex,
        /// Outcome of the follow-up render, when a surface is attached
        render: Option<RenderOutcome>,
    },
}

struct LoadedDocument {
    metadata: DocumentMetadata,
    kind: DocumentKind,
    page_count: u32,
    page: PageIndex,
    status: BookStatus,
    renderable: Option<Arc<dyn RenderableDocument>>,
    content_url: Option<String>,
}

struct RenderHandle {
    page: PageIndex,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), RenderError>>,
}

/// Reader for one document at a time
pub struct DocumentViewController {
    store: Arc<dyn DocumentStore>,
    renderer: Arc<dyn PageRenderer>,
    state: ViewState,
    document: Option<LoadedDocument>,
    active: Option<RenderHandle>,
    /// Last surface passed to a render call; navigation redraws onto it
    surface: Option<Surface>,
    events: broadcast::Sender<ViewEvent>,
}

impl DocumentViewController {
    pub fn new(store: Arc<dyn DocumentStore>, renderer: Arc<dyn PageRenderer>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            renderer,
            state: ViewState::Idle,
            document: None,
            active: None,
            surface: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn current_page(&self) -> Option<PageIndex> {
        self.document.as_ref().map(|d| d.page)
    }

    pub fn page_count(&self) -> Option<u32> {
        self.document.as_ref().map(|d| d.page_count)
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.document.as_ref().map(|d| d.kind)
    }

    pub fn metadata(&self) -> Option<&DocumentMetadata> {
        self.document.as_ref().map(|d| &d.metadata)
    }

    pub fn status(&self) -> Option<&BookStatus> {
        self.document.as_ref().map(|d| &d.status)
    }

    /// Content URL of an embedded document
    pub fn embed_url(&self) -> Option<&str> {
        self.document
            .as_ref()
            .filter(|d| d.kind == DocumentKind::Embedded)
            .and_then(|d| d.content_url.as_deref())
    }

    /// Load a document, replacing whatever was open
    pub async fn open_document(&mut self, id: &str) -> ViewResult<()> {
        self.ensure_not_closed()?;
        self.supersede_active().await;
        self.document = None;

        let Some(id) = DocumentId::parse(id) else {
            self.state = ViewState::LoadFailed;
            return Err(self.fail(ViewError::NotFound("no document id supplied".into())));
        };

        self.state = ViewState::Loading;
        tracing::info!("Opening document {}", id);

        match self.load(&id).await {
            Ok(doc) => {
                tracing::info!(
                    "Opened \"{}\" at page {}/{} ({:?})",
                    doc.metadata.title,
                    doc.page,
                    doc.page_count,
                    doc.kind
                );
                self.emit(ViewEvent::DocumentOpened {
                    id,
                    page: doc.page,
                    page_count: doc.page_count,
                    kind: doc.kind,
                });
                self.document = Some(doc);
                self.state = ViewState::Ready;
                Ok(())
            }
            Err(err) => {
                self.state = ViewState::LoadFailed;
                Err(self.fail(err))
            }
        }
    }

    async fn load(&self, id: &DocumentId) -> ViewResult<LoadedDocument> {
        let metadata = self.store.fetch_metadata(id).await.map_err(|e| match e {
            StoreError::NotFound(msg) => ViewError::NotFound(msg),
            other => ViewError::LoadFailed(other.to_string()),
        })?;

        let kind = DocumentKind::from_mime(metadata.mime_type.as_deref());
        match kind {
            DocumentKind::Paginated => {
                let bytes = self
                    .store
                    .fetch_binary(&metadata)
                    .await
                    .map_err(|e| ViewError::LoadFailed(e.to_string()))?;
                let renderable = self
                    .renderer
                    .open(bytes)
                    .await
                    .map_err(|e| ViewError::LoadFailed(e.to_string()))?;

                let page_count = renderable.page_count();
                if page_count == 0 {
                    return Err(ViewError::LoadFailed("document has no pages".into()));
                }

                Ok(LoadedDocument {
                    page: PageIndex::clamp(metadata.stored_page, page_count),
                    status: metadata.status.clone(),
                    kind,
                    page_count,
                    renderable: Some(renderable),
                    content_url: None,
                    metadata,
                })
            }
            DocumentKind::Embedded => {
                let content_url = self
                    .store
                    .content_url(&metadata)
                    .ok_or_else(|| ViewError::LoadFailed("document has no file".into()))?;
                let page_count = metadata
                    .total_pages
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(1);

                Ok(LoadedDocument {
                    page: PageIndex::clamp(metadata.stored_page, page_count),
                    status: metadata.status.clone(),
                    kind,
                    page_count,
                    renderable: None,
                    content_url: Some(content_url),
                    metadata,
                })
            }
        }
    }

    /// Render the current page and wait for it
    pub async fn render_current_page(&mut self, surface: &Surface) -> ViewResult<RenderOutcome> {
        self.start_render(surface).await?;
        self.finish_render().await
    }

    /// Begin rendering the current page onto `surface`
    ///
    /// A live render is cancelled and awaited first. Embedded documents are
    /// not rendered.
    pub async fn start_render(&mut self, surface: &Surface) -> ViewResult<()> {
        match self.state {
            ViewState::Ready | ViewState::Rendering => {}
            other => return Err(ViewError::InvalidState(other.name())),
        }

        self.supersede_active().await;

        let (renderable, page) = match self.document.as_ref() {
            Some(doc) => (
                doc.renderable.clone(),
                PageIndex::clamp(i64::from(doc.page.get()), doc.page_count),
            ),
            None => return Err(ViewError::InvalidState(ViewState::Idle.name())),
        };
        let Some(renderable) = renderable else {
            return Ok(());
        };

        self.surface = Some(surface.clone());

        let cancel = CancellationToken::new();
        tracing::debug!("Rendering page {}", page);
        let task = tokio::spawn(render_page(renderable, surface.clone(), page, cancel.clone()));

        self.active = Some(RenderHandle { page, cancel, task });
        self.state = ViewState::Rendering;
        Ok(())
    }

    /// Wait for the render started by [`start_render`](Self::start_render)
    pub async fn finish_render(&mut self) -> ViewResult<RenderOutcome> {
        let Some(handle) = self.active.take() else {
            return Ok(RenderOutcome::Skipped);
        };
        let page = handle.page;

        match join(handle.task).await {
            Ok(()) => {
                self.state = ViewState::Ready;
                self.emit(ViewEvent::RenderCompleted { page });
                Ok(RenderOutcome::Completed(page))
            }
            Err(err) => match RenderFailure::classify(err) {
                None => {
                    self.state = ViewState::Ready;
                    self.emit(ViewEvent::RenderCancelled { page });
                    Ok(RenderOutcome::Cancelled(page))
                }
                Some(failure) => {
                    self.state = ViewState::RenderFailed;
                    Err(self.fail(ViewError::Render(failure)))
                }
            },
        }
    }

    /// Cancel the live render, if any, and wait for its task to end
    async fn supersede_active(&mut self) {
        let Some(handle) = self.active.take() else {
            return;
        };
        let page = handle.page;
        handle.cancel.cancel();

        if let Err(err) = join(handle.task).await {
            if !err.is_cancelled() {
                tracing::warn!("Superseded render of page {} failed: {}", page, err);
            }
        }

        tracing::debug!("Render of page {} superseded", page);
        self.emit(ViewEvent::RenderCancelled { page });
        if self.state == ViewState::Rendering {
            self.state = ViewState::Ready;
        }
    }

    /// Advance one page once the store confirms it
    pub async fn go_to_next_page(&mut self) -> ViewResult<NavigationOutcome> {
        let target = {
            let doc = self.navigable()?;
            if doc.kind == DocumentKind::Embedded
                || doc.page.get() >= doc.page_count
                || doc.status.is_finished()
            {
                return Ok(NavigationOutcome::Unchanged);
            }
            doc.page.next()
        };
        self.navigate_to(target).await
    }

    /// Go back one page once the store confirms it
    pub async fn go_to_previous_page(&mut self) -> ViewResult<NavigationOutcome> {
        let target = {
            let doc = self.navigable()?;
            if doc.kind == DocumentKind::Embedded || doc.page == PageIndex::FIRST {
                return Ok(NavigationOutcome::Unchanged);
            }
            doc.page.previous()
        };
        self.navigate_to(target).await
    }

    fn navigable(&self) -> ViewResult<&LoadedDocument> {
        match self.state {
            ViewState::Ready | ViewState::Rendering => {}
            other => return Err(ViewError::InvalidState(other.name())),
        }
        self.document
            .as_ref()
            .ok_or(ViewError::InvalidState(ViewState::Idle.name()))
    }

    async fn navigate_to(&mut self, target: PageIndex) -> ViewResult<NavigationOutcome> {
        let (id, page_count) = match self.document.as_ref() {
            Some(doc) => (doc.metadata.id.clone(), doc.page_count),
            None => return Err(ViewError::InvalidState(ViewState::Idle.name())),
        };

        let record = match self.store.update_progress(&id, target).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(ViewError::ProgressUpdateFailed(err.to_string()))),
        };

        let confirmed = PageIndex::clamp(record.confirmed_page, page_count);
        if confirmed != target {
            tracing::info!("Store confirmed page {} instead of {}", confirmed, target);
        }
        if let Some(doc) = self.document.as_mut() {
            doc.page = confirmed;
            if let Some(status) = record.status.filter(|s| *s != BookStatus::Other) {
                doc.status = status;
            }
        }
        self.emit(ViewEvent::ProgressChanged { id, page: confirmed });

        let render = match self.surface.clone() {
            Some(surface) => Some(self.render_current_page(&surface).await?),
            None => None,
        };
        Ok(NavigationOutcome::Moved {
            page: confirmed,
            render,
        })
    }

    /// Update the page count from outside; the current page is clamped into it
    pub fn set_page_count(&mut self, page_count: u32) -> Option<PageIndex> {
        let doc = self.document.as_mut()?;
        if page_count == 0 {
            tracing::warn!("Ignoring page count of zero");
            return Some(doc.page);
        }
        doc.page_count = page_count;
        doc.page = PageIndex::clamp(i64::from(doc.page.get()), page_count);
        Some(doc.page)
    }

    /// Release the document; a live render is cancelled and awaited
    pub async fn close(&mut self) {
        if self.state == ViewState::Closed {
            return;
        }
        self.supersede_active().await;
        self.document = None;
        self.surface = None;
        self.state = ViewState::Closed;
        self.emit(ViewEvent::Closed);
        tracing::debug!("View closed");
    }

    fn ensure_not_closed(&self) -> ViewResult<()> {
        if self.state == ViewState::Closed {
            Err(ViewError::InvalidState(ViewState::Closed.name()))
        } else {
            Ok(())
        }
    }

    fn fail(&self, err: ViewError) -> ViewError {
        tracing::warn!("{}", err);
        self.emit(ViewEvent::Failed { error: err.clone() });
        err
    }

    fn emit(&self, event: ViewEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for DocumentViewController {
    fn drop(&mut self) {
        if let Some(handle) = &self.active {
            handle.cancel.cancel();
        }
    }
}

async fn render_page(
    document: Arc<dyn RenderableDocument>,
    surface: Surface,
    page: PageIndex,
    cancel: CancellationToken,
) -> Result<(), RenderError> {
    cancel.check()?;
    let lease = surface.try_lease()?;
    document.render_page(page, RENDER_SCALE, &lease, &cancel).await
}

async fn join(task: JoinHandle<Result<(), RenderError>>) -> Result<(), RenderError> {
    task.await
        .unwrap_or_else(|e| Err(RenderError::Backend(format!("render task failed: {}", e))))
}
