//! Test pattern verification for captured images.
//!
//! Captures come back as lossy JPEG, so every check here carries a tolerance.
//! Useful for integration testing with virtual cameras.

use image::RgbImage;

use crate::traits::{CameraError, Result};

/// Expected RGB values for SMPTE color bars (8 bars), as produced by BT.601
/// conversion of the YUV values vivid and the mock device emit.
///
/// Colors in order: White, Yellow, Cyan, Green, Magenta, Red, Blue, Black
const SMPTE_COLOR_BARS: [(u8, u8, u8); 8] = [
    (235, 235, 235),
    (235, 235, 11),
    (12, 236, 237),
    (13, 237, 13),
    (237, 13, 237),
    (238, 14, 13),
    (15, 15, 239),
    (16, 16, 16),
];

/// Per-channel tolerance (YUV->RGB rounding plus JPEG loss).
const COLOR_TOLERANCE: u32 = 24;

/// Largest luminance drop between gradient samples still treated as noise.
const GRADIENT_SLACK: f32 = 3.0;

/// Validates that an image contains the SMPTE color bar pattern.
///
/// Samples the center of each of the 8 vertical stripes on the middle row.
///
/// # Errors
///
/// Returns `StreamError` if the image is narrower than 8 pixels or any bar
/// doesn't match its expected color within tolerance.
pub fn validate_color_bars(image: &RgbImage) -> Result<()> {
    let (width, height) = image.dimensions();
    let bar_width = width / 8;
    if bar_width == 0 {
        return Err(CameraError::StreamError(format!(
            "Image too narrow for color bars: {width}px"
        )));
    }
    let center_y = height / 2;

    for (bar_idx, expected_rgb) in SMPTE_COLOR_BARS.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let sample_x = (bar_idx as u32 * bar_width) + (bar_width / 2);
        let actual_rgb = rgb_at(image, sample_x, center_y)?;

        if !colors_match(actual_rgb, *expected_rgb, COLOR_TOLERANCE) {
            return Err(CameraError::StreamError(format!(
                "Color bar {bar_idx} mismatch at ({sample_x}, {center_y}): \
                 expected RGB{expected_rgb:?}, got RGB{actual_rgb:?}"
            )));
        }
    }

    Ok(())
}

/// Validates that an image contains a left-to-right brightening gradient.
///
/// Samples every 10 pixels along the middle row; luminance must never drop
/// by more than the noise slack and must rise by at least 50 overall.
///
/// # Errors
///
/// Returns `StreamError` if the luminance falls or barely changes.
pub fn validate_gradient(image: &RgbImage) -> Result<()> {
    let (width, height) = image.dimensions();
    let center_y = height / 2;

    let mut first_luminance: Option<f32> = None;
    let mut prev_luminance: Option<f32> = None;

    for x in (0..width).step_by(10) {
        let luma = luminance(rgb_at(image, x, center_y)?);

        first_luminance.get_or_insert(luma);

        if let Some(prev) = prev_luminance {
            if luma < prev - GRADIENT_SLACK {
                return Err(CameraError::StreamError(format!(
                    "Gradient not monotonically increasing at x={x}: \
                     luminance {luma} < previous {prev}"
                )));
            }
        }

        prev_luminance = Some(luma);
    }

    if let (Some(first), Some(last)) = (first_luminance, prev_luminance) {
        let luminance_change = last - first;
        if luminance_change < 50.0 {
            return Err(CameraError::StreamError(format!(
                "Insufficient luminance change for gradient: {luminance_change} \
                 (expected at least 50.0)"
            )));
        }
    }

    Ok(())
}

fn rgb_at(image: &RgbImage, x: u32, y: u32) -> Result<(u8, u8, u8)> {
    image
        .get_pixel_checked(x, y)
        .map(|p| (p[0], p[1], p[2]))
        .ok_or_else(|| CameraError::StreamError(format!("Failed to get pixel at ({x}, {y})")))
}

/// Rec. 601 luma.
fn luminance((r, g, b): (u8, u8, u8)) -> f32 {
    0.114f32.mul_add(
        f32::from(b),
        0.587f32.mul_add(f32::from(g), 0.299 * f32::from(r)),
    )
}

fn colors_match(actual: (u8, u8, u8), expected: (u8, u8, u8), tolerance: u32) -> bool {
    let (ar, ag, ab) = actual;
    let (er, eg, eb) = expected;

    u32::from(ar.abs_diff(er)) <= tolerance
        && u32::from(ag.abs_diff(eg)) <= tolerance
        && u32::from(ab.abs_diff(eb)) <= tolerance
}
