//! Paginated document reader
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │               DocumentViewController                    │
//! │   (page index, confirm-before-advance, render handle)  │
//! └─────────────────────────────────────────────────────────┘
//!           │                                  │
//!           ▼                                  ▼
//!   ┌──────────────────┐             ┌──────────────────────┐
//!   │  DocumentStore   │             │    PageRenderer      │
//!   │ (RemoteDocument- │             │ (MupdfRenderer with  │
//!   │  Store over REST)│             │  `render-mupdf`)     │
//!   └──────────────────┘             └──────────────────────┘
//!                                              │
//!                                              ▼
//!                                   ┌──────────────────────┐
//!                                   │ Surface (one lease)  │
//!                                   └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lifetracker::document::{DocumentViewController, RemoteDocumentStore, Surface};
//!
//! let store = Arc::new(RemoteDocumentStore::new(client));
//! let mut view = DocumentViewController::new(store, renderer);
//!
//! view.open_document("12").await?;
//! let surface = Surface::new(0, 0);
//! view.render_current_page(&surface).await?;
//! view.go_to_next_page().await?;
//! ```

mod cancel;
mod controller;
mod error;
mod remote;
mod surface;
mod traits;
mod types;

pub use cancel::CancellationToken;
pub use controller::{
    DocumentViewController, NavigationOutcome, RenderOutcome, ViewEvent, ViewState, RENDER_SCALE,
};
pub use error::{
    RenderError, RenderFailure, StoreError, StoreResult, ViewError, ViewResult,
};
pub use remote::RemoteDocumentStore;
pub use surface::{Surface, SurfaceLease};
pub use traits::{DocumentStore, PageRenderer, RenderableDocument};
pub use types::{DocumentId, DocumentKind, DocumentMetadata, PageIndex, ProgressRecord};
