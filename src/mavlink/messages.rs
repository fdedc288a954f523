//! MAVLink Message Builders
//!
//! Builds the fixed-schema records this endpoint announces.

use crate::config::{CameraProfile, StreamDescriptor};
use camsim_shared::codec::encode_text_lossy;
use mavlink::ardupilotmega::{
    CameraCapFlags, MavAutopilot, MavCmd, MavMessage, MavModeFlag, MavProtocolCapability,
    MavResult, MavState, MavType, VideoStreamStatusFlags, AUTOPILOT_VERSION_DATA,
    CAMERA_INFORMATION_DATA, COMMAND_ACK_DATA, HEARTBEAT_DATA, NAMED_VALUE_FLOAT_DATA,
    VIDEO_STREAM_INFORMATION_DATA,
};

/// Flight software version reported in AUTOPILOT_VERSION (1.0.0, dev)
pub const FLIGHT_SW_VERSION: u32 = 0x0100_0000;

/// Heartbeat for one of our components
pub fn heartbeat(mav_type: MavType, autopilot: MavAutopilot) -> MavMessage {
    MavMessage::HEARTBEAT(HEARTBEAT_DATA {
        custom_mode: 0,
        mavtype: mav_type,
        autopilot,
        base_mode: MavModeFlag::empty(),
        system_status: MavState::MAV_STATE_ACTIVE,
        mavlink_version: 3,
    })
}

/// Camera capabilities
pub fn camera_information(camera: &CameraProfile, time_boot_ms: u32) -> MavMessage {
    MavMessage::CAMERA_INFORMATION(CAMERA_INFORMATION_DATA {
        time_boot_ms,
        vendor_name: encode_text_lossy(&camera.vendor),
        model_name: encode_text_lossy(&camera.model),
        resolution_h: camera.resolution_h,
        resolution_v: camera.resolution_v,
        flags: CameraCapFlags::CAMERA_CAP_FLAGS_HAS_VIDEO_STREAM,
        ..Default::default()
    })
}

/// Where one stream can be retrieved; `count` is the total number of streams
pub fn video_stream_information(stream: &StreamDescriptor, count: u8) -> MavMessage {
    let mut flags = VideoStreamStatusFlags::VIDEO_STREAM_STATUS_FLAGS_RUNNING;
    if stream.thermal {
        flags |= VideoStreamStatusFlags::VIDEO_STREAM_STATUS_FLAGS_THERMAL;
    }

    MavMessage::VIDEO_STREAM_INFORMATION(VIDEO_STREAM_INFORMATION_DATA {
        framerate: stream.framerate,
        bitrate: stream.bitrate,
        flags,
        resolution_h: stream.resolution_h,
        resolution_v: stream.resolution_v,
        rotation: 0,
        hfov: stream.hfov,
        stream_id: stream.stream_id,
        count,
        mavtype: stream.stream_type,
        name: encode_text_lossy(&stream.name),
        uri: encode_text_lossy(&stream.uri),
        ..Default::default()
    })
}

/// Named telemetry sample
pub fn named_value_float(name: &str, value: f32, time_boot_ms: u32) -> MavMessage {
    MavMessage::NAMED_VALUE_FLOAT(NAMED_VALUE_FLOAT_DATA {
        time_boot_ms,
        value,
        name: encode_text_lossy(name),
    })
}

/// Autopilot capabilities of the simulated vehicle
pub fn autopilot_version() -> MavMessage {
    MavMessage::AUTOPILOT_VERSION(AUTOPILOT_VERSION_DATA {
        capabilities: MavProtocolCapability::MAV_PROTOCOL_CAPABILITY_MAVLINK2
            | MavProtocolCapability::MAV_PROTOCOL_CAPABILITY_MISSION_FLOAT
            | MavProtocolCapability::MAV_PROTOCOL_CAPABILITY_PARAM_FLOAT
            | MavProtocolCapability::MAV_PROTOCOL_CAPABILITY_COMMAND_INT,
        flight_sw_version: FLIGHT_SW_VERSION,
        ..Default::default()
    })
}

/// Result of a COMMAND_LONG. The ardupilotmega ACK carries no target
/// fields; the sender header identifies which component answered.
pub fn command_ack(command: MavCmd, result: MavResult) -> MavMessage {
    MavMessage::COMMAND_ACK(COMMAND_ACK_DATA { command, result })
}
