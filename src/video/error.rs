//! Video pipeline errors

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot open capture device {path}: {source}")]
    DeviceOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Capture device negotiated {actual}, need {expected}")]
    FormatMismatch { expected: String, actual: String },

    #[error("Cannot read frame: {0}")]
    Read(#[source] io::Error),

    #[error("Frame size mismatch: got {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Capture devices not supported in this build (enable the `v4l2` feature)")]
    Unsupported,

    #[error("Failed to spawn encoder `{program}`: {source}. Is it installed?")]
    EncoderSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Encoder `{0}` has no stdin pipe")]
    EncoderPipe(String),
}
