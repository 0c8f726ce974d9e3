//! MuPDF page renderer
//!
//! MuPDF documents are not thread-safe, so [`PdfDocument`] keeps the raw
//! bytes, reopens the document for each page inside `spawn_blocking`, and
//! serializes those operations behind a mutex.

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use mupdf::{Colorspace, Document, Matrix};
use parking_lot::Mutex;

use crate::document::{
    CancellationToken, PageIndex, PageRenderer, RenderError, RenderableDocument, SurfaceLease,
};

const PDF_MIME: &str = "application/pdf";

/// [`PageRenderer`] for PDF files
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfRenderer;

impl MupdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageRenderer for MupdfRenderer {
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn RenderableDocument>, RenderError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(RenderError::InvalidDocument("missing %PDF header".into()));
        }

        let data = Arc::new(bytes);
        let probe = data.clone();
        let page_count = tokio::task::spawn_blocking(move || {
            let doc = Document::from_bytes(&probe, PDF_MIME).map_err(invalid)?;
            doc.page_count().map_err(invalid)
        })
        .await
        .map_err(join_error)??;

        let page_count = u32::try_from(page_count)
            .map_err(|_| RenderError::InvalidDocument(format!("bad page count {}", page_count)))?;
        tracing::debug!("Opened PDF with {} pages ({} bytes)", page_count, data.len());

        Ok(Arc::new(PdfDocument {
            data,
            page_count,
            lock: Arc::new(Mutex::new(())),
        }))
    }
}

/// Opened PDF
pub struct PdfDocument {
    data: Arc<Vec<u8>>,
    page_count: u32,
    lock: Arc<Mutex<()>>,
}

#[async_trait]
impl RenderableDocument for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn render_page(
        &self,
        page: PageIndex,
        scale: f32,
        lease: &SurfaceLease,
        cancel: &CancellationToken,
    ) -> Result<(), RenderError> {
        if page.get() > self.page_count {
            return Err(RenderError::MissingDocument(format!(
                "page {} of {}",
                page, self.page_count
            )));
        }
        cancel.check()?;

        let data = self.data.clone();
        let lock = self.lock.clone();
        let token = cancel.clone();
        let scale = scale.clamp(0.1, 4.0);

        let image = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            token.check()?;

            let doc = Document::from_bytes(&data, PDF_MIME).map_err(invalid)?;
            let page = doc.load_page(page.zero_based() as i32).map_err(backend)?;
            token.check()?;

            let matrix = Matrix::new_scale(scale, scale);
            let colorspace = Colorspace::device_rgb();
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, true, true)
                .map_err(backend)?;
            token.check()?;

            samples_to_rgba(
                pixmap.samples(),
                pixmap.width() as u32,
                pixmap.height() as u32,
                pixmap.n() as usize,
            )
            .ok_or_else(|| RenderError::Backend("Failed to create image buffer".into()))
        })
        .await
        .map_err(join_error)??;

        // Cancelled while rasterizing: leave the surface alone
        cancel.check()?;
        lease.put_image(image);
        Ok(())
    }
}

fn invalid(err: mupdf::Error) -> RenderError {
    RenderError::InvalidDocument(err.to_string())
}

fn backend(err: mupdf::Error) -> RenderError {
    RenderError::Backend(err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> RenderError {
    RenderError::Backend(format!("Task join error: {}", err))
}

/// Byte length of a `width` x `height` RGBA buffer
fn rgba_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Expand MuPDF samples (`n` components per pixel) to RGBA
fn samples_to_rgba(samples: &[u8], width: u32, height: u32, n: usize) -> Option<RgbaImage> {
    if n == 0 {
        return None;
    }
    let mut rgba = Vec::with_capacity(rgba_len(width, height));

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(r);
            let b = samples.get(offset + 2).copied().unwrap_or(r);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba.extend_from_slice(&[r, g, b, a]);
        }
    }

    RgbaImage::from_raw(width, height, rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_samples_to_rgba() {
        let samples = [10, 20, 30, 200, 1, 2, 3, 255];
        let image = samples_to_rgba(&samples, 2, 1, 4).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([10, 20, 30, 200]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([1, 2, 3, 255]));

        let rgb = samples_to_rgba(&[5, 6, 7], 1, 1, 3).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), &Rgba([5, 6, 7, 255]));

        assert!(samples_to_rgba(&[], 1, 1, 0).is_none());
    }

    #[test]
    fn test_rgba_len_large_pixmap() {
        assert_eq!(rgba_len(40_000, 40_000), 6_400_000_000);
    }

    #[tokio::test]
    async fn test_rejects_non_pdf() {
        let err = MupdfRenderer::new().open(b"hello".to_vec()).await.err();
        assert!(matches!(err, Some(RenderError::InvalidDocument(_))));
    }
}
