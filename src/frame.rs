//! Raw YUYV frames and their conversion to RGB.

use std::time::Duration;

use image::{Rgb, RgbImage};

use crate::traits::{CameraError, Result};

/// Metadata for a captured frame.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Frame sequence number.
    pub sequence: u32,
    /// Capture timestamp.
    pub timestamp: Duration,
    /// Actual bytes used in the frame buffer.
    pub bytes_used: u32,
}

/// A captured YUYV video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw frame data.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame metadata.
    pub metadata: FrameMetadata,
}

impl Frame {
    /// Get RGB values for a pixel at the specified coordinates.
    ///
    /// Returns `None` when the coordinates fall outside the buffer. For odd x
    /// coordinates the Y value of the second pixel in the pair is used with
    /// the shared U/V values.
    #[must_use]
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // YUYV format: [Y0 U Y1 V] repeats
        let pair_x = x & !1;
        let offset = ((y * self.width + pair_x) * 2) as usize;

        let y_val = if x % 2 == 0 {
            *self.data.get(offset)?
        } else {
            *self.data.get(offset + 2)?
        };
        let u = *self.data.get(offset + 1)?;
        let v = *self.data.get(offset + 3)?;

        Some(yuv_to_rgb(y_val, u, v))
    }

    /// Convert the whole frame to an RGB image.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for an empty frame and `StreamError` when
    /// the buffer is shorter than `width * height * 2` bytes.
    pub fn to_rgb(&self) -> Result<RgbImage> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.width as usize * self.height as usize * 2;
        if self.data.len() < expected {
            return Err(CameraError::StreamError(format!(
                "Short frame: {} bytes, expected {expected}",
                self.data.len()
            )));
        }

        let mut image = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let (r, g, b) = self.pixel_at(x, y).unwrap_or((0, 0, 0));
            *pixel = Rgb([r, g, b]);
        }
        Ok(image)
    }
}

/// Convert YUV values to RGB using the ITU-R BT.601 formula.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y_f = f32::from(y);
    let u_f = f32::from(u) - 128.0;
    let v_f = f32::from(v) - 128.0;

    let r = 1.402f32.mul_add(v_f, y_f);
    let g = 0.714_14f32.mul_add(-v_f, 0.344_14f32.mul_add(-u_f, y_f));
    let b = 1.772f32.mul_add(u_f, y_f);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamp = |val: f32| -> u8 { val.clamp(0.0, 255.0) as u8 };

    (clamp(r), clamp(g), clamp(b))
}
