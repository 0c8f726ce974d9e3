//! LifeTracker client library
//!
//! Typed access to the LifeTracker REST API plus a paginated book reader.
//!
//! # Modules
//!
//! - `api`: HTTP client, credentials, and the stored session
//! - `resources`: one fetcher per domain (books, music, expenses, ...)
//! - `document`: view controller for reading a book page by page
//! - `formats`: page renderers (MuPDF behind `render-mupdf`)
//! - `playback`: Spotify now-playing poller

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod formats;
pub mod playback;
pub mod resources;

pub use config::Config;
pub use error::{ApiError, Result};

#[cfg(test)]
pub(crate) mod testing {
    /// Serve `app` on an ephemeral local port; returns its origin
    pub async fn spawn_server(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
