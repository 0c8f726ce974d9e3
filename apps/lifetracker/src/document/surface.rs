//! Drawable page surface
//!
//! A [`Surface`] is an RGBA buffer shared between the reader and the
//! renderer. Drawing requires a [`SurfaceLease`]; at most one lease exists
//! at a time and it is released when dropped.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use super::error::RenderError;

struct SurfaceInner {
    canvas: Mutex<RgbaImage>,
    leased: AtomicBool,
}

/// Shared drawable surface
#[derive(Clone)]
pub struct Surface {
    inner: Arc<SurfaceInner>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                canvas: Mutex::new(RgbaImage::new(width, height)),
                leased: AtomicBool::new(false),
            }),
        }
    }

    /// Take the writer lease
    ///
    /// Fails with [`RenderError::SurfaceBusy`] while another lease is alive.
    pub fn try_lease(&self) -> Result<SurfaceLease, RenderError> {
        self.inner
            .leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RenderError::SurfaceBusy)?;
        Ok(SurfaceLease {
            inner: self.inner.clone(),
        })
    }

    pub fn is_leased(&self) -> bool {
        self.inner.leased.load(Ordering::Acquire)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.canvas.lock().dimensions()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> RgbaImage {
        self.inner.canvas.lock().clone()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        let canvas = self.inner.canvas.lock();
        canvas.save_with_format(path, image::ImageFormat::Png)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("Surface")
            .field("width", &width)
            .field("height", &height)
            .field("leased", &self.is_leased())
            .finish()
    }
}

/// Exclusive write access to a [`Surface`]
pub struct SurfaceLease {
    inner: Arc<SurfaceInner>,
}

impl SurfaceLease {
    /// Resize to `width` x `height`, clearing to white
    pub fn resize(&self, width: u32, height: u32) {
        let mut canvas = self.inner.canvas.lock();
        *canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    }

    /// Replace the contents with a rendered page
    pub fn put_image(&self, image: RgbaImage) {
        *self.inner.canvas.lock() = image;
    }

    /// Draw directly on the buffer
    pub fn with_canvas<R>(&self, f: impl FnOnce(&mut RgbaImage) -> R) -> R {
        let mut canvas = self.inner.canvas.lock();
        f(&mut canvas)
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        self.inner.leased.store(false, Ordering::Release);
    }
}
