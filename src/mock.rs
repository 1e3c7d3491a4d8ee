//! Mock provider for testing without hardware.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::frame::{Frame, FrameMetadata};
use crate::surface::FrameSurface;
use crate::traits::{
    CameraError, Format, FourCC, FrameSource, MediaProvider, MediaStream, MediaTrack, Result,
    TrackState, VideoMetadata,
};

/// Provider calls recorded in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `acquire_stream` was called.
    Acquire,
    /// `wait_for_metadata` was called.
    Metadata,
    /// `play` was called.
    Play,
    /// `draw_frame` was called.
    Draw,
    /// Track with the given index was stopped.
    Stop(usize),
}

/// Step at which the mock fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Stream acquisition is refused, as on a denied permission prompt.
    Acquire,
    /// Metadata never becomes available.
    Metadata,
    /// Playback refuses to start.
    Play,
    /// Drawing the frame fails.
    Draw,
}

/// Test pattern types for mock frame generation.
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// SMPTE color bars pattern.
    ColorBars,
    /// Horizontal gradient from dark to light.
    Gradient,
    /// Solid color with specified Y, U, V values.
    Solid(u8, u8, u8),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

/// Mock track sharing its stop counter with every clone.
#[derive(Debug, Clone)]
pub struct MockTrack {
    index: usize,
    label: String,
    stops: Rc<Cell<u32>>,
    log: EventLog,
}

impl MockTrack {
    /// How many times `stop` was called.
    pub fn stop_count(&self) -> u32 {
        self.stops.get()
    }
}

impl MediaTrack for MockTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> TrackState {
        if self.stops.get() == 0 {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }

    fn stop(&mut self) {
        self.stops.set(self.stops.get() + 1);
        self.log.borrow_mut().push(Event::Stop(self.index));
    }
}

/// Mock stream producing YUYV pattern frames.
pub struct MockStream {
    tracks: Vec<MockTrack>,
    format: Format,
    pattern: TestPattern,
    sequence: u32,
}

impl MockStream {
    /// Clones of the tracks, for inspecting them after the stream is gone.
    pub fn track_handles(&self) -> Vec<MockTrack> {
        self.tracks.clone()
    }
}

impl MediaStream for MockStream {
    type Track = MockTrack;

    fn tracks_mut(&mut self) -> &mut [MockTrack] {
        &mut self.tracks
    }
}

impl FrameSource for MockStream {
    fn next_frame(&mut self) -> Result<Frame> {
        let data = generate_test_frame(&self.format, self.pattern);
        let seq = self.sequence;
        self.sequence += 1;

        Ok(Frame {
            data,
            width: self.format.width,
            height: self.format.height,
            metadata: FrameMetadata {
                sequence: seq,
                timestamp: Duration::from_millis(u64::from(seq) * 33), // ~30fps
                bytes_used: self.format.width * self.format.height * 2,
            },
        })
    }
}

/// Mock provider for testing without hardware.
pub struct MockProvider {
    format: Format,
    pattern: TestPattern,
    track_count: usize,
    failure: Option<Failure>,
    log: EventLog,
    streams: Vec<Vec<MockTrack>>,
}

impl MockProvider {
    /// Create a provider whose streams report `width` x `height`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            format: Format::new(width, height, FourCC::YUYV),
            pattern: TestPattern::ColorBars,
            track_count: 1,
            failure: None,
            log: Rc::new(RefCell::new(Vec::new())),
            streams: Vec::new(),
        }
    }

    /// Number of tracks in each acquired stream.
    #[must_use]
    pub const fn with_track_count(mut self, count: usize) -> Self {
        self.track_count = count;
        self
    }

    /// Fail at the given step.
    #[must_use]
    pub const fn fail_at(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Set the test pattern for later frames.
    pub fn set_pattern(&mut self, pattern: TestPattern) {
        self.pattern = pattern;
    }

    /// Every provider call so far.
    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// Tracks of every stream handed out, in acquisition order.
    pub fn streams(&self) -> Vec<Vec<MockTrack>> {
        self.streams.clone()
    }

    /// A stream built outside any capture.
    pub fn stream_for_test(&self) -> MockStream {
        self.build_stream()
    }

    fn build_stream(&self) -> MockStream {
        let tracks = (0..self.track_count)
            .map(|index| MockTrack {
                index,
                label: format!("mock video {index}"),
                stops: Rc::new(Cell::new(0)),
                log: Rc::clone(&self.log),
            })
            .collect();

        MockStream {
            tracks,
            format: self.format.clone(),
            pattern: self.pattern,
            sequence: 0,
        }
    }

    fn record(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn fails_at(&self, step: Failure) -> bool {
        self.failure == Some(step)
    }
}

impl MediaProvider for MockProvider {
    type Stream = MockStream;

    async fn acquire_stream(&mut self) -> Result<MockStream> {
        self.record(Event::Acquire);
        if self.fails_at(Failure::Acquire) {
            return Err(CameraError::PermissionDenied("mock denied".to_owned()));
        }

        let stream = self.build_stream();
        self.streams.push(stream.track_handles());
        Ok(stream)
    }

    async fn wait_for_metadata(&mut self, stream: &mut MockStream) -> Result<VideoMetadata> {
        self.record(Event::Metadata);
        if self.fails_at(Failure::Metadata) {
            return Err(CameraError::StreamError("mock metadata unavailable".to_owned()));
        }

        Ok(VideoMetadata {
            width: stream.format.width,
            height: stream.format.height,
        })
    }

    fn play(&mut self, _stream: &mut MockStream) -> Result<()> {
        self.record(Event::Play);
        if self.fails_at(Failure::Play) {
            return Err(CameraError::StreamError("mock playback refused".to_owned()));
        }
        Ok(())
    }

    fn draw_frame(&mut self, stream: &mut MockStream, surface: &mut FrameSurface) -> Result<()> {
        self.record(Event::Draw);
        if self.fails_at(Failure::Draw) {
            return Err(CameraError::StreamError("mock draw failed".to_owned()));
        }

        let frame = stream.next_frame()?;
        surface.draw_frame(&frame)
    }
}

/// Generate test frame data based on pattern.
fn generate_test_frame(format: &Format, pattern: TestPattern) -> Vec<u8> {
    let size = (format.width * format.height * 2) as usize; // YUYV = 2 bytes/pixel
    let mut data = vec![0u8; size];

    match pattern {
        TestPattern::ColorBars => {
            generate_color_bars(&mut data, format.width, format.height);
        }
        TestPattern::Gradient => {
            generate_gradient(&mut data, format.width, format.height);
        }
        TestPattern::Solid(y, u, v) => {
            generate_solid(&mut data, y, u, v);
        }
    }

    data
}

/// Generate YUYV color bars pattern.
fn generate_color_bars(data: &mut [u8], width: u32, height: u32) {
    // White, Yellow, Cyan, Green, Magenta, Red, Blue, Black
    let bars: [(u8, u8, u8); 8] = [
        (235, 128, 128),
        (210, 16, 146),
        (170, 166, 16),
        (145, 54, 34),
        (106, 202, 222),
        (81, 90, 240),
        (41, 240, 110),
        (16, 128, 128),
    ];

    let bar_width = (width / 8).max(1);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let bar_idx = (x / bar_width).min(7) as usize;
            let (y_val, u_val, v_val) = bars[bar_idx];

            let offset = ((y * width + x) * 2) as usize;
            if offset + 3 < data.len() {
                data[offset] = y_val;
                data[offset + 1] = u_val;
                data[offset + 2] = y_val;
                data[offset + 3] = v_val;
            }
        }
    }
}

/// Generate YUYV horizontal gradient pattern.
fn generate_gradient(data: &mut [u8], width: u32, height: u32) {
    for y in 0..height {
        for x in (0..width).step_by(2) {
            #[allow(clippy::cast_possible_truncation)]
            let y_val = ((x * 255) / width) as u8;
            let offset = ((y * width + x) * 2) as usize;

            if offset + 3 < data.len() {
                data[offset] = y_val;
                data[offset + 1] = 128; // neutral chroma
                data[offset + 2] = y_val;
                data[offset + 3] = 128;
            }
        }
    }
}

/// Generate solid color YUYV frame.
fn generate_solid(data: &mut [u8], y: u8, u: u8, v: u8) {
    for chunk in data.chunks_exact_mut(4) {
        chunk.copy_from_slice(&[y, u, y, v]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_metadata_matches_configuration() {
        let mut provider = MockProvider::new(1280, 720);
        let mut stream = provider.acquire_stream().await.expect("acquire");
        let meta = provider
            .wait_for_metadata(&mut stream)
            .await
            .expect("metadata");
        assert_eq!(meta, VideoMetadata { width: 1280, height: 720 });
    }

    #[test]
    fn test_mock_stream_sequence() {
        let provider = MockProvider::new(64, 48);
        let mut stream = provider.stream_for_test();

        let frame1 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame1.metadata.sequence, 0);
        assert!(!frame1.data.is_empty());

        let frame2 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame2.metadata.sequence, 1);
    }

    #[test]
    fn test_mock_track_stop_is_counted() {
        let provider = MockProvider::new(4, 4).with_track_count(2);
        let mut stream = provider.stream_for_test();
        stream.stop_tracks();

        let tracks = stream.track_handles();
        assert!(tracks.iter().all(|t| t.stop_count() == 1));
        assert!(tracks.iter().all(|t| t.state() == TrackState::Ended));
        assert_eq!(provider.events(), vec![Event::Stop(0), Event::Stop(1)]);
    }

    #[test]
    fn test_color_bars_pattern() {
        let format = Format::new(640, 480, FourCC::YUYV);
        let data = generate_test_frame(&format, TestPattern::ColorBars);

        assert_eq!(data.len(), (640 * 480 * 2) as usize);
        // First bar is white
        assert_eq!(data[0], 235);
    }

    #[test]
    fn test_color_bars_narrow_frame() {
        let format = Format::new(2, 2, FourCC::YUYV);
        let data = generate_test_frame(&format, TestPattern::ColorBars);
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn test_gradient_pattern() {
        let format = Format::new(640, 480, FourCC::YUYV);
        let data = generate_test_frame(&format, TestPattern::Gradient);

        assert!(data[0] < 10);

        let last_row_start = (479 * 640 * 2) as usize;
        let last_pixel_y = data[last_row_start + 638 * 2];
        assert!(last_pixel_y > 200);
    }

    #[test]
    fn test_solid_pattern() {
        let format = Format::new(64, 64, FourCC::YUYV);
        let data = generate_test_frame(&format, TestPattern::Solid(128, 64, 192));

        assert_eq!(data[0], 128);
        assert_eq!(data[2], 128);
        assert_eq!(data[1], 64);
        assert_eq!(data[3], 192);
    }
}
