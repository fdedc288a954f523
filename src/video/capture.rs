//! Frame sources

use super::frame::{Frame, PixelFormat};
use super::VideoError;
use crate::config::{CaptureSource, VideoConfig};
use std::time::{Duration, Instant};

/// A blocking source of BGR frames, read from the capture thread
pub trait FrameSource: Send + 'static {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<Frame, VideoError>;

    /// Human-readable name for logs
    fn describe(&self) -> String;
}

/// Open the configured source
pub fn open_source(config: &VideoConfig) -> Result<Box<dyn FrameSource>, VideoError> {
    match &config.source {
        CaptureSource::TestPattern => Ok(Box::new(TestPattern::new(
            config.width,
            config.height,
            config.fps,
        ))),
        CaptureSource::Device { path } => open_device(path, config),
    }
}

#[cfg(feature = "v4l2")]
fn open_device(
    path: &std::path::Path,
    config: &VideoConfig,
) -> Result<Box<dyn FrameSource>, VideoError> {
    let camera = super::device::V4lCamera::open(path, config.width, config.height, config.fps)?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "v4l2"))]
fn open_device(
    _path: &std::path::Path,
    _config: &VideoConfig,
) -> Result<Box<dyn FrameSource>, VideoError> {
    Err(VideoError::Unsupported)
}

/// Diagonal gradient that scrolls one pixel per frame, paced at `fps`
pub struct TestPattern {
    width: u32,
    height: u32,
    interval: Duration,
    next_due: Option<Instant>,
    index: u64,
}

impl TestPattern {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            interval: Duration::from_secs(1) / fps.max(1),
            next_due: None,
            index: 0,
        }
    }

    fn render(&self) -> Vec<u8> {
        let shift = self.index as u32;
        let mut data = Vec::with_capacity(Frame::expected_len(self.width, self.height, PixelFormat::Bgr24));
        for y in 0..self.height {
            for x in 0..self.width {
                let b = (x.wrapping_add(shift) & 0xff) as u8;
                let g = (y.wrapping_add(shift) & 0xff) as u8;
                let r = (((x + y).wrapping_add(shift) >> 1) & 0xff) as u8;
                data.extend_from_slice(&[b, g, r]);
            }
        }
        data
    }
}

impl FrameSource for TestPattern {
    fn read_frame(&mut self) -> Result<Frame, VideoError> {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        // Don't try to catch up after a stall
        self.next_due = Some(due.max(now) + self.interval);

        let frame = Frame::new(self.width, self.height, PixelFormat::Bgr24, self.render())?;
        self.index += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_frames_have_geometry() {
        let mut source = TestPattern::new(16, 8, 1000);
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 8);
        assert_eq!(frame.format, PixelFormat::Bgr24);
        assert_eq!(frame.data.len(), 16 * 8 * 3);
    }

    #[test]
    fn test_pattern_moves() {
        let mut source = TestPattern::new(8, 8, 1000);
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn test_pattern_is_paced() {
        let mut source = TestPattern::new(4, 4, 50);
        let start = Instant::now();
        for _ in 0..3 {
            source.read_frame().unwrap();
        }
        // First frame is immediate, then two 20ms intervals
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_open_test_pattern_source() {
        let config = VideoConfig {
            source: CaptureSource::TestPattern,
            ..Default::default()
        };
        let source = open_source(&config).unwrap();
        assert_eq!(source.describe(), "test pattern 640x480");
    }

    #[test]
    fn test_open_missing_device_fails() {
        let config = VideoConfig {
            source: CaptureSource::Device {
                path: "/nonexistent/video9".into(),
            },
            ..Default::default()
        };
        assert!(open_source(&config).is_err());
    }
}
