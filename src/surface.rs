//! Off-screen raster surface a single frame is drawn into.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::frame::Frame;
use crate::traits::{CameraError, Result};

/// RGB pixel buffer sized to a stream's native resolution.
#[derive(Debug, Clone)]
pub struct FrameSurface {
    pixels: RgbImage,
}

impl FrameSurface {
    /// Allocate a black surface of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidDimensions { width, height });
        }
        Ok(Self {
            pixels: RgbImage::new(width, height),
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the pixel buffer.
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Draw `image` at (0, 0), scaled to fill the full surface.
    pub fn draw_image(&mut self, image: &RgbImage) {
        if image.dimensions() == self.pixels.dimensions() {
            self.pixels.copy_from_slice(image.as_raw());
        } else {
            self.pixels = imageops::resize(image, self.width(), self.height(), FilterType::Nearest);
        }
    }

    /// Convert a YUYV frame and draw it filling the surface.
    pub fn draw_frame(&mut self, frame: &Frame) -> Result<()> {
        let rgb = frame.to_rgb()?;
        self.draw_image(&rgb);
        Ok(())
    }
}
