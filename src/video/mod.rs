//! Video Capture/Forward Module
//!
//! Captures one camera, derives a grayscale "thermal" copy and feeds both
//! into H.264/RTP encoder processes.

mod capture;
mod convert;
mod encoder;
mod error;
mod frame;
mod streamer;
#[cfg(feature = "v4l2")]
mod device;

pub use error::VideoError;
pub use streamer::VideoStreamer;
