//! PDF format implementation
//!
//! [`MupdfRenderer`] implements the document [`PageRenderer`] contract using
//! MuPDF.
//!
//! [`PageRenderer`]: crate::document::PageRenderer

mod renderer;

pub use renderer::{MupdfRenderer, PdfDocument};
