//! JPEG data-URL encoding of a drawn surface.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::surface::FrameSurface;
use crate::traits::{CameraError, Result};

/// MIME type of every encoded capture.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Prefix every encoded capture starts with.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encoder quality used when none is requested (matches a browser's 0.92).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// A captured frame as a `data:image/jpeg;base64,...` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Borrow the full data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the data URL string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// MIME type embedded in the URL.
    pub const fn mime_type(&self) -> &'static str {
        JPEG_MIME_TYPE
    }

    /// Base64 payload after the prefix.
    pub fn payload(&self) -> &str {
        self.0.strip_prefix(JPEG_DATA_URL_PREFIX).unwrap_or_default()
    }

    /// Decode the payload back into JPEG bytes.
    pub fn to_jpeg_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.payload())
            .map_err(|err| CameraError::Encode(format!("Invalid base64 payload: {err}")))
    }

    /// Decode the payload into an RGB image.
    pub fn decode(&self) -> Result<RgbImage> {
        let bytes = self.to_jpeg_bytes()?;
        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)?;
        Ok(image.to_rgb8())
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedImage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.0
    }
}

/// Encode a surface as a JPEG data URL at [`DEFAULT_JPEG_QUALITY`].
pub fn encode_jpeg_data_url(surface: &FrameSurface) -> Result<EncodedImage> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, DEFAULT_JPEG_QUALITY);
    surface.pixels().write_with_encoder(encoder)?;

    let mut url = String::with_capacity(JPEG_DATA_URL_PREFIX.len() + jpeg.len().div_ceil(3) * 4);
    url.push_str(JPEG_DATA_URL_PREFIX);
    STANDARD.encode_string(&jpeg, &mut url);
    Ok(EncodedImage(url))
}
