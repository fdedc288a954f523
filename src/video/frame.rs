//! Raw video frames

use super::VideoError;
use bytes::Bytes;

/// Pixel layouts handed to the encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, blue first
    Bgr24,
    /// 1 byte per pixel luma
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Name of the format for ffmpeg's `-pix_fmt`
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Gray8 => "gray",
        }
    }
}

/// One tightly packed frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Bytes,
}

impl Frame {
    /// Wrap `data`, checking it matches the geometry
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: impl Into<Bytes>,
    ) -> Result<Self, VideoError> {
        let data = data.into();
        let expected = Self::expected_len(width, height, format);
        if data.len() != expected {
            return Err(VideoError::FrameSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn expected_len(width: u32, height: u32, format: PixelFormat) -> usize {
        width as usize * height as usize * format.bytes_per_pixel()
    }
}
