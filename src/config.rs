//! Simulator configuration
//!
//! Everything is compiled in; `main` builds a [`SimConfig`] from defaults.

use camsim_shared::codec::{encode_text, TextError};
use camsim_shared::{ids, ports, timing};
use mavlink::ardupilotmega::{MavAutopilot, MavType, VideoStreamType};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors found at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field}: {source}")]
    Text {
        field: String,
        #[source]
        source: TextError,
    },

    #[error("Stream id {0} is invalid or duplicated")]
    StreamId(u8),

    #[error("At most 255 streams can be announced, got {0}")]
    TooManyStreams(usize),

    #[error("Invalid video geometry {width}x{height}@{fps}")]
    VideoGeometry { width: u32, height: u32, fps: u32 },
}

/// How the MAVLink UDP link is opened
#[derive(Debug, Clone)]
pub enum LinkMode {
    /// Send to a fixed remote address (e.g., "127.0.0.1:14550")
    UdpOut { address: String },
    /// Bind locally and reply to the last peer
    UdpIn { address: String },
}

impl LinkMode {
    /// Connection string understood by `mavlink::connect_async`
    pub fn connection_string(&self) -> String {
        match self {
            LinkMode::UdpOut { address } => format!("udpout:{}", address),
            LinkMode::UdpIn { address } => format!("udpin:{}", address),
        }
    }
}

impl Default for LinkMode {
    fn default() -> Self {
        Self::UdpOut {
            address: format!("127.0.0.1:{}", ports::GCS_PORT),
        }
    }
}

/// Configuration for the MAVLink link
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub mode: LinkMode,
    /// System ID of this endpoint
    pub system_id: u8,
    /// Capacity of the inbound message channel
    pub inbound_buffer: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::default(),
            system_id: ids::SYSTEM_ID,
            inbound_buffer: 100,
        }
    }
}

/// The "vehicle" sub-identity
#[derive(Debug, Clone)]
pub struct VehicleIdentity {
    pub component_id: u8,
    pub mav_type: MavType,
    pub autopilot: MavAutopilot,
}

impl Default for VehicleIdentity {
    fn default() -> Self {
        Self {
            component_id: ids::VEHICLE_COMPONENT,
            mav_type: MavType::MAV_TYPE_GENERIC,
            autopilot: MavAutopilot::MAV_AUTOPILOT_GENERIC,
        }
    }
}

/// The "camera" sub-identity and its capabilities
#[derive(Debug, Clone)]
pub struct CameraProfile {
    pub component_id: u8,
    pub vendor: String,
    pub model: String,
    pub resolution_h: u16,
    pub resolution_v: u16,
}

impl Default for CameraProfile {
    fn default() -> Self {
        Self {
            component_id: ids::CAMERA_COMPONENT,
            vendor: "CustomCam".into(),
            model: "DualStream".into(),
            resolution_h: 640,
            resolution_v: 480,
        }
    }
}

/// A video stream announced through VIDEO_STREAM_INFORMATION
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stream id, starting at 1
    pub stream_id: u8,
    pub name: String,
    pub uri: String,
    pub stream_type: VideoStreamType,
    pub thermal: bool,
    pub framerate: f32,
    pub resolution_h: u16,
    pub resolution_v: u16,
    /// Bits per second, 0 if unknown
    pub bitrate: u32,
    /// Horizontal field of view in degrees
    pub hfov: u16,
}

impl StreamDescriptor {
    /// RTP/UDP stream as produced by the encoder pipeline
    pub fn rtp(stream_id: u8, name: &str, port: u16, thermal: bool) -> Self {
        Self {
            stream_id,
            name: name.into(),
            uri: format!("udp://0.0.0.0:{}", port),
            stream_type: VideoStreamType::VIDEO_STREAM_TYPE_RTPUDP,
            thermal,
            framerate: 30.0,
            resolution_h: 640,
            resolution_v: 480,
            bitrate: 2_000_000,
            hfov: 90,
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// V4L2 capture device (e.g., "/dev/video0")
    Device { path: PathBuf },
    /// Synthetic moving gradient
    TestPattern,
}

/// Encoder command line
#[derive(Debug, Clone)]
pub enum EncoderArgs {
    /// ffmpeg raw-video to H.264 RTP
    Ffmpeg,
    /// Arguments passed verbatim
    Custom(Vec<String>),
}

/// Configuration for the external encoder processes
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub program: String,
    pub args: EncoderArgs,
    /// RTP destination host
    pub host: String,
    pub bitrate: String,
    pub bufsize: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".into(),
            args: EncoderArgs::Ffmpeg,
            host: "127.0.0.1".into(),
            bitrate: "2M".into(),
            bufsize: "1M".into(),
        }
    }
}

/// Configuration for the capture/forward pipeline
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub source: CaptureSource,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub rgb_port: u16,
    pub thermal_port: u16,
    pub encoder: EncoderConfig,
    /// Frames buffered per encoder before the producer starts dropping
    pub channel_capacity: usize,
    /// Bound for each shutdown step
    pub shutdown_timeout: Duration,
}

impl VideoConfig {
    /// Time between two frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::Device {
                path: PathBuf::from("/dev/video0"),
            },
            width: 640,
            height: 480,
            fps: 30,
            rgb_port: ports::RGB_PORT,
            thermal_port: ports::THERMAL_PORT,
            encoder: EncoderConfig::default(),
            channel_capacity: 4,
            shutdown_timeout: Duration::from_millis(timing::SHUTDOWN_TIMEOUT_MS),
        }
    }
}

/// Top-level simulator configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub link: LinkConfig,
    pub vehicle: VehicleIdentity,
    pub camera: CameraProfile,
    pub streams: Vec<StreamDescriptor>,
    /// Capture/forward pipeline, `None` to only announce
    pub video: Option<VideoConfig>,
    pub tick_interval: Duration,
    /// Name of the NAMED_VALUE_FLOAT telemetry sample
    pub telemetry_name: String,
    /// Upper bound on inbound records handled per tick
    pub max_inbound_per_tick: usize,
}

impl Default for SimConfig {
    /// Dual stream camera (RGB + thermal) with the video pipeline
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            vehicle: VehicleIdentity::default(),
            camera: CameraProfile::default(),
            streams: vec![
                StreamDescriptor::rtp(1, "RGB Camera", ports::RGB_PORT, false),
                StreamDescriptor::rtp(2, "Thermal Camera", ports::THERMAL_PORT, true),
            ],
            video: Some(VideoConfig::default()),
            tick_interval: Duration::from_millis(timing::TICK_INTERVAL_MS),
            telemetry_name: "test_count".into(),
            max_inbound_per_tick: 16,
        }
    }
}

impl SimConfig {
    /// Single MJPEG-over-HTTP stream served elsewhere, no video pipeline
    pub fn single_stream() -> Self {
        Self {
            vehicle: VehicleIdentity {
                mav_type: MavType::MAV_TYPE_QUADROTOR,
                ..Default::default()
            },
            camera: CameraProfile {
                model: "DataCollection".into(),
                ..Default::default()
            },
            streams: vec![StreamDescriptor {
                stream_id: 1,
                name: "Data Stream".into(),
                uri: "http://127.0.0.1:5000/video_feed".into(),
                stream_type: VideoStreamType::VIDEO_STREAM_TYPE_RTPUDP,
                thermal: false,
                framerate: 30.0,
                resolution_h: 640,
                resolution_v: 480,
                bitrate: 0,
                hfov: 0,
            }],
            video: None,
            ..Default::default()
        }
    }

    /// Check that every announced text fits its wire field
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_text::<32>("camera vendor", &self.camera.vendor)?;
        check_text::<32>("camera model", &self.camera.model)?;
        check_text::<10>("telemetry name", &self.telemetry_name)?;

        if self.streams.len() > u8::MAX as usize {
            return Err(ConfigError::TooManyStreams(self.streams.len()));
        }

        let mut seen = HashSet::new();
        for stream in &self.streams {
            if stream.stream_id == 0 || !seen.insert(stream.stream_id) {
                return Err(ConfigError::StreamId(stream.stream_id));
            }
            check_text::<32>(&format!("stream {} name", stream.stream_id), &stream.name)?;
            check_text::<160>(&format!("stream {} uri", stream.stream_id), &stream.uri)?;
        }

        if let Some(video) = &self.video {
            if video.width == 0 || video.height == 0 || video.fps == 0 {
                return Err(ConfigError::VideoGeometry {
                    width: video.width,
                    height: video.height,
                    fps: video.fps,
                });
            }
        }

        Ok(())
    }
}

fn check_text<const N: usize>(field: &str, text: &str) -> Result<(), ConfigError> {
    encode_text::<N>(text)
        .map(|_| ())
        .map_err(|source| ConfigError::Text {
            field: field.into(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.link.system_id, 1);
        assert_eq!(config.camera.component_id, 100);
        assert_eq!(config.streams.len(), 2);
        assert!(config.streams[1].thermal);
        assert!(config.video.is_some());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_single_stream_profile() {
        let config = SimConfig::single_stream();
        assert!(config.video.is_none());
        assert_eq!(config.streams.len(), 1);
        assert_eq!(config.streams[0].uri, "http://127.0.0.1:5000/video_feed");
        config.validate().expect("profile is valid");
    }

    #[test]
    fn test_connection_strings() {
        let out = LinkMode::default();
        assert_eq!(out.connection_string(), "udpout:127.0.0.1:14550");

        let inbound = LinkMode::UdpIn {
            address: "0.0.0.0:14551".into(),
        };
        assert_eq!(inbound.connection_string(), "udpin:0.0.0.0:14551");
    }

    #[test]
    fn test_validate_rejects_long_uri() {
        let mut config = SimConfig::default();
        config.streams[0].uri = "x".repeat(161);
        assert!(matches!(config.validate(), Err(ConfigError::Text { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_stream_id() {
        let mut config = SimConfig::default();
        config.streams[1].stream_id = 1;
        assert!(matches!(config.validate(), Err(ConfigError::StreamId(1))));
    }

    #[test]
    fn test_frame_interval() {
        let video = VideoConfig::default();
        assert_eq!(video.frame_interval(), Duration::from_nanos(33_333_333));
    }
}
