//! Single-frame capture orchestration.

use std::ops::{Deref, DerefMut};

use tracing::{debug, info, warn};

use crate::encode::{encode_jpeg_data_url, EncodedImage};
use crate::surface::FrameSurface;
use crate::traits::{MediaProvider, MediaStream, Result};

/// Holds a stream for the duration of one capture and stops its tracks
/// exactly once, either through [`StreamGuard::release`] or on drop.
pub struct StreamGuard<S: MediaStream> {
    stream: S,
    released: bool,
}

impl<S: MediaStream> StreamGuard<S> {
    /// Take ownership of `stream`.
    pub const fn new(stream: S) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    /// Stop every track now. Later calls and the drop are no-ops.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stream.stop_tracks();
            debug!("camera stream released");
        }
    }

    /// Whether the tracks are still running.
    pub const fn is_held(&self) -> bool {
        !self.released
    }
}

impl<S: MediaStream> Deref for StreamGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.stream
    }
}

impl<S: MediaStream> DerefMut for StreamGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: MediaStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        if !self.released {
            warn!("capture aborted, releasing camera stream");
            self.release();
        }
    }
}

/// Captures still images through an injected [`MediaProvider`].
pub struct ImageCapture<P> {
    provider: P,
}

impl<P: MediaProvider> ImageCapture<P> {
    /// Wrap a provider.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Borrow the provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutably borrow the provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Give the provider back.
    pub fn into_inner(self) -> P {
        self.provider
    }

    /// Capture one frame as a JPEG data URL.
    pub async fn capture_image(&mut self) -> Result<EncodedImage> {
        capture_image(&mut self.provider).await
    }
}

/// Capture one frame from `provider` as a JPEG data URL.
///
/// Provider failures are returned as raised. The acquired stream is
/// released after the frame is drawn and before encoding; if an earlier step
/// fails, it is released on the way out.
pub async fn capture_image<P: MediaProvider>(provider: &mut P) -> Result<EncodedImage> {
    let stream = provider.acquire_stream().await?;
    let mut stream = StreamGuard::new(stream);
    debug!("camera stream acquired");

    let metadata = provider.wait_for_metadata(&mut stream).await?;
    debug!(width = metadata.width, height = metadata.height, "stream metadata loaded");

    if let Err(err) = provider.play(&mut stream) {
        warn!(error = %err, "playback did not start");
    }

    let mut surface = FrameSurface::new(metadata.width, metadata.height)?;
    provider.draw_frame(&mut stream, &mut surface)?;
    stream.release();

    let encoded = encode_jpeg_data_url(&surface)?;
    info!(
        width = surface.width(),
        height = surface.height(),
        bytes = encoded.as_str().len(),
        "image captured"
    );
    Ok(encoded)
}
