//! Format-specific renderers
//!
//! Each format implements the `PageRenderer` / `RenderableDocument` traits
//! from the `document` module. MuPDF needs a C toolchain, so the PDF
//! renderer is only built with the `render-mupdf` feature.

#[cfg(feature = "render-mupdf")]
pub mod pdf;
