//! Pi-Snapshot: single-frame camera capture to a JPEG data URL
//!
//! A capture acquires a camera stream through an injected [`MediaProvider`],
//! draws one frame into an off-screen [`FrameSurface`], releases the stream
//! and encodes the surface as `data:image/jpeg;base64,...`. [`V4L2Provider`]
//! binds the provider seam to Linux V4L2 devices; tests use a mock.

pub mod capture;
pub mod device;
pub mod encode;
pub mod frame;
pub mod surface;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use capture::{capture_image, ImageCapture, StreamGuard};
pub use device::{DeviceCapabilities, V4L2Provider, V4L2Stream, V4L2Track};
pub use encode::{encode_jpeg_data_url, EncodedImage, DEFAULT_JPEG_QUALITY, JPEG_DATA_URL_PREFIX};
pub use frame::{Frame, FrameMetadata};
pub use surface::FrameSurface;
pub use traits::{
    CameraError, Format, FourCC, FrameSource, MediaProvider, MediaStream, MediaTrack, Result,
    TrackState, VideoMetadata,
};
