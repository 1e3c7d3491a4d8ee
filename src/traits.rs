//! Core traits and types for the camera capability seam.

use crate::frame::Frame;
use crate::surface::FrameSurface;

/// Pixel format representation (e.g., YUYV, MJPG, RGB3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Video format negotiated with a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub fourcc: FourCC,
}

impl Format {
    /// Create a new format specification.
    #[must_use]
    pub const fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        Self {
            width,
            height,
            fourcc,
        }
    }
}

/// Stream metadata, available once the feed has reported its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
}

/// Lifecycle state of a single media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// The track is delivering media.
    Live,
    /// The track was stopped and its hardware released.
    Ended,
}

/// Error type for camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// The user or the system refused access to the camera.
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    /// Device with given index was not found.
    #[error("Device {0} not found")]
    DeviceNotFound(u32),
    /// Failed to open device.
    #[error("Failed to open device: {0}")]
    DeviceOpenFailed(String),
    /// Requested format is not supported.
    #[error("Format not supported: {0:?}")]
    FormatNotSupported(Format),
    /// Error during streaming operation.
    #[error("Stream error: {0}")]
    StreamError(String),
    /// A surface or frame was described with unusable dimensions.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A setting could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Image encoding or decoding failed.
    #[error("Encode error: {0}")]
    Encode(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// A channel within a media stream that must be stopped to free the hardware.
pub trait MediaTrack {
    /// Human-readable track label.
    fn label(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> TrackState;

    /// Stop the track and release whatever it holds.
    fn stop(&mut self);
}

/// A live camera feed made of one or more tracks.
pub trait MediaStream {
    /// Track type carried by this stream.
    type Track: MediaTrack;

    /// Mutable access to every track of the stream.
    fn tracks_mut(&mut self) -> &mut [Self::Track];

    /// Stop every constituent track.
    fn stop_tracks(&mut self) {
        for track in self.tracks_mut() {
            track.stop();
        }
    }
}

/// Host camera and rendering capabilities used by a capture.
///
/// Surface allocation and encoding stay in this crate; a provider only
/// supplies the feed and renders its current frame.
#[allow(async_fn_in_trait)]
pub trait MediaProvider {
    /// Stream type returned by `acquire_stream`.
    type Stream: MediaStream;

    /// Request a video-only camera stream. May wait on a permission grant.
    async fn acquire_stream(&mut self) -> Result<Self::Stream>;

    /// Wait until the stream reports its native dimensions.
    async fn wait_for_metadata(&mut self, stream: &mut Self::Stream) -> Result<VideoMetadata>;

    /// Start playback. Best effort, never awaited by the caller.
    fn play(&mut self, stream: &mut Self::Stream) -> Result<()>;

    /// Render the currently presented frame into `surface`, filling it.
    fn draw_frame(&mut self, stream: &mut Self::Stream, surface: &mut FrameSurface) -> Result<()>;
}

/// Sources of raw YUYV frames, shared by the real and mock providers.
pub trait FrameSource {
    /// Pull the next frame.
    fn next_frame(&mut self) -> Result<Frame>;
}
