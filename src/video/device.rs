//! V4L2 capture device
//!
//! Negotiates packed YUYV at the configured size and converts each buffer
//! to BGR24.

use super::capture::FrameSource;
use super::convert::yuyv_to_bgr;
use super::frame::Frame;
use super::VideoError;
use std::path::Path;
use tracing::{debug, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

const BUFFER_COUNT: u32 = 4;

/// Memory-mapped V4L2 capture
pub struct V4lCamera {
    // Dropped before the device
    stream: MmapStream<'static>,
    _device: Device,
    path: String,
    width: u32,
    height: u32,
}

impl V4lCamera {
    /// Open `path` and start streaming at `width`x`height`
    pub fn open(path: &Path, width: u32, height: u32, fps: u32) -> Result<Self, VideoError> {
        let path_str = path.display().to_string();
        debug!("[VIDEO] Opening capture device {}", path_str);

        let open_err = |source| VideoError::DeviceOpen {
            path: path_str.clone(),
            source,
        };

        let device = Device::with_path(path).map_err(open_err)?;

        let yuyv = FourCC::new(b"YUYV");
        let actual = device
            .set_format(&Format::new(width, height, yuyv))
            .map_err(open_err)?;
        if actual.width != width || actual.height != height || actual.fourcc != yuyv {
            return Err(VideoError::FormatMismatch {
                expected: format!("{}x{} YUYV", width, height),
                actual: format!("{}x{} {}", actual.width, actual.height, actual.fourcc),
            });
        }

        if let Err(e) = device.set_params(&Parameters::with_fps(fps)) {
            warn!("[VIDEO] Could not set {} fps on {}: {}", fps, path_str, e);
        }

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(open_err)?;

        Ok(Self {
            stream,
            _device: device,
            path: path_str,
            width,
            height,
        })
    }
}

impl FrameSource for V4lCamera {
    fn read_frame(&mut self) -> Result<Frame, VideoError> {
        let (buf, meta) = self.stream.next().map_err(VideoError::Read)?;

        // Some drivers leave bytesused at 0
        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };

        yuyv_to_bgr(&buf[..used], self.width, self.height)
    }

    fn describe(&self) -> String {
        format!("{} {}x{} YUYV", self.path, self.width, self.height)
    }
}
