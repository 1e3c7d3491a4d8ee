//! V4L2 provider implementation using the v4l crate.

use std::io;
use std::time::Duration;

use tracing::debug;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as V4lCaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::frame::{Frame, FrameMetadata};
use crate::surface::FrameSurface;
use crate::traits::{
    CameraError, Format, FourCC, FrameSource, MediaProvider, MediaStream, MediaTrack, Result,
    TrackState, VideoMetadata,
};

/// Default number of mmap buffers queued while streaming.
pub const DEFAULT_BUFFER_COUNT: u32 = 4;

/// Device capability flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Camera provider backed by a V4L2 device node (`/dev/videoN`).
#[derive(Debug, Clone)]
pub struct V4L2Provider {
    index: u32,
    buffer_count: u32,
}

impl V4L2Provider {
    /// Provider for `/dev/video{index}`. Nothing is opened until a capture.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            buffer_count: DEFAULT_BUFFER_COUNT,
        }
    }

    /// Number of mmap buffers to request when playback starts.
    #[must_use]
    pub const fn with_buffer_count(mut self, buffer_count: u32) -> Self {
        self.buffer_count = buffer_count;
        self
    }

    /// Device index this provider opens.
    pub const fn index(&self) -> u32 {
        self.index
    }

    fn open(&self) -> Result<(Device, DeviceCapabilities)> {
        let device = Device::new(self.index as usize).map_err(|err| self.open_error(&err))?;

        let caps = device
            .query_caps()
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;

        let capabilities = DeviceCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(v4l::capability::Flags::STREAMING),
        };

        if !capabilities.can_capture || !capabilities.can_stream {
            return Err(CameraError::DeviceOpenFailed(format!(
                "{} cannot stream video capture",
                capabilities.card
            )));
        }

        Ok((device, capabilities))
    }

    fn open_error(&self, err: &io::Error) -> CameraError {
        match err.kind() {
            io::ErrorKind::NotFound => CameraError::DeviceNotFound(self.index),
            io::ErrorKind::PermissionDenied => {
                CameraError::PermissionDenied(format!("/dev/video{}: {err}", self.index))
            }
            _ => CameraError::DeviceOpenFailed(err.to_string()),
        }
    }
}

/// Keep the driver's native size and ask for YUYV.
fn negotiate_format(device: &Device) -> Result<V4L2Format> {
    let mut fmt = device
        .format()
        .map_err(|err| CameraError::StreamError(err.to_string()))?;

    fmt.fourcc = FourCC::YUYV.into();

    let fmt = device
        .set_format(&fmt)
        .map_err(|err| CameraError::StreamError(err.to_string()))?;

    let format = Format::new(fmt.width, fmt.height, FourCC::from(fmt.fourcc));
    if format.fourcc != FourCC::YUYV {
        return Err(CameraError::FormatNotSupported(format));
    }

    Ok(V4L2Format {
        format,
        stride: fmt.stride,
    })
}

#[derive(Debug, Clone)]
struct V4L2Format {
    format: Format,
    stride: u32,
}

impl MediaProvider for V4L2Provider {
    type Stream = V4L2Stream;

    async fn acquire_stream(&mut self) -> Result<V4L2Stream> {
        let (device, capabilities) = self.open()?;
        let format = negotiate_format(&device)?;
        debug!(
            index = self.index,
            card = %capabilities.card,
            driver = %capabilities.driver,
            "opened V4L2 device"
        );

        Ok(V4L2Stream {
            capabilities,
            tracks: vec![V4L2Track {
                label: format!("video{}", self.index),
                device: Some(device),
                capture: None,
                format,
                buffer_count: self.buffer_count,
            }],
        })
    }

    async fn wait_for_metadata(&mut self, stream: &mut V4L2Stream) -> Result<VideoMetadata> {
        let format = &stream.video_track()?.format.format;
        Ok(VideoMetadata {
            width: format.width,
            height: format.height,
        })
    }

    fn play(&mut self, stream: &mut V4L2Stream) -> Result<()> {
        stream.video_track_mut()?.start()
    }

    fn draw_frame(&mut self, stream: &mut V4L2Stream, surface: &mut FrameSurface) -> Result<()> {
        let frame = stream.video_track_mut()?.next_frame()?;
        surface.draw_frame(&frame)
    }
}

/// An open V4L2 device exposed as a single-track stream.
pub struct V4L2Stream {
    capabilities: DeviceCapabilities,
    tracks: Vec<V4L2Track>,
}

impl V4L2Stream {
    /// Capabilities reported by the driver.
    pub const fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn video_track(&self) -> Result<&V4L2Track> {
        self.tracks
            .first()
            .ok_or_else(|| CameraError::StreamError("stream has no video track".to_owned()))
    }

    fn video_track_mut(&mut self) -> Result<&mut V4L2Track> {
        self.tracks
            .first_mut()
            .ok_or_else(|| CameraError::StreamError("stream has no video track".to_owned()))
    }
}

impl MediaStream for V4L2Stream {
    type Track = V4L2Track;

    fn tracks_mut(&mut self) -> &mut [V4L2Track] {
        &mut self.tracks
    }
}

/// The video channel of a V4L2 stream.
pub struct V4L2Track {
    label: String,
    device: Option<Device>,
    capture: Option<Stream<'static>>,
    format: V4L2Format,
    buffer_count: u32,
}

impl V4L2Track {
    /// Start mmap streaming if it is not running yet.
    fn start(&mut self) -> Result<()> {
        if self.capture.is_some() {
            return Ok(());
        }
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| CameraError::StreamError(format!("{} is stopped", self.label)))?;

        let stream = Stream::with_buffers(device, Type::VideoCapture, self.buffer_count)
            .map_err(|err| CameraError::StreamError(err.to_string()))?;
        self.capture = Some(stream);
        debug!(track = %self.label, buffers = self.buffer_count, "streaming started");
        Ok(())
    }
}

impl FrameSource for V4L2Track {
    fn next_frame(&mut self) -> Result<Frame> {
        self.start()?;
        let format = self.format.clone();
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| CameraError::StreamError(format!("{} is not streaming", self.label)))?;

        let (buf, meta) = capture
            .next()
            .map_err(|err| CameraError::StreamError(err.to_string()))?;

        // Safe conversions: V4L2 timestamps are always non-negative in practice
        #[allow(clippy::cast_sign_loss)]
        let secs = meta.timestamp.sec.max(0) as u64;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let nanos = (meta.timestamp.usec.max(0) as u32).saturating_mul(1000);

        Ok(Frame {
            data: pack_rows(buf, &format),
            width: format.format.width,
            height: format.format.height,
            metadata: FrameMetadata {
                sequence: meta.sequence,
                timestamp: Duration::new(secs, nanos),
                bytes_used: meta.bytesused,
            },
        })
    }
}

impl MediaTrack for V4L2Track {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> TrackState {
        if self.device.is_some() {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }

    fn stop(&mut self) {
        // Dropping the mmap stream issues STREAMOFF; dropping the device closes it.
        self.capture = None;
        self.device = None;
        debug!(track = %self.label, "track stopped");
    }
}

/// Strip per-row padding so rows are exactly `width * 2` bytes apart.
fn pack_rows(buf: &[u8], format: &V4L2Format) -> Vec<u8> {
    let row = format.format.width as usize * 2;
    let stride = format.stride as usize;
    if stride <= row {
        return buf.to_vec();
    }

    buf.chunks(stride)
        .take(format.format.height as usize)
        .flat_map(|line| line.iter().take(row))
        .copied()
        .collect()
}
