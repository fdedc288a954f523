//! camsim Shared Protocol Constants
//!
//! Component identities, message ids and timing shared by the camera
//! simulator and the GCS monitor.

pub mod codec;

use std::time::Instant;

/// MAVLink system and component identities
pub mod ids {
    /// System ID of the simulated vehicle
    pub const SYSTEM_ID: u8 = 1;

    /// Autopilot component (MAV_COMP_ID_AUTOPILOT1)
    pub const VEHICLE_COMPONENT: u8 = 1;

    /// Camera component (MAV_COMP_ID_CAMERA)
    pub const CAMERA_COMPONENT: u8 = 100;

    /// System ID used by ground stations
    pub const GCS_SYSTEM_ID: u8 = 255;

    /// MAV_COMP_ID_MISSIONPLANNER
    pub const GCS_COMPONENT: u8 = 190;
}

/// Message ids that can be requested with MAV_CMD_REQUEST_MESSAGE
pub mod msg_id {
    pub const AUTOPILOT_VERSION: u32 = 148;
    pub const CAMERA_INFORMATION: u32 = 259;
    pub const VIDEO_STREAM_INFORMATION: u32 = 269;
}

/// Network ports
pub mod ports {
    /// UDP port the GCS listens on
    pub const GCS_PORT: u16 = 14550;

    /// RTP port of the RGB stream
    pub const RGB_PORT: u16 = 5600;

    /// RTP port of the thermal (grayscale) stream
    pub const THERMAL_PORT: u16 = 5601;
}

/// Timing parameters
pub mod timing {
    /// Announcer tick interval in milliseconds
    pub const TICK_INTERVAL_MS: u64 = 1000;

    /// Log the tick counter at info level every this many ticks
    pub const LOG_EVERY_TICKS: u64 = 5;

    /// Bounded wait for each shutdown step
    pub const SHUTDOWN_TIMEOUT_MS: u64 = 2000;

    /// How long the GCS monitor waits for a COMMAND_ACK
    pub const COMMAND_ACK_TIMEOUT_MS: u64 = 3000;

    /// A component silent for this long is considered lost
    pub const HEARTBEAT_TIMEOUT_MS: u64 = 5000;
}

/// Milliseconds since process start, for `time_boot_ms` fields
#[derive(Debug, Clone, Copy)]
pub struct BootClock {
    start: Instant,
}

impl BootClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since boot, wrapping at `u32::MAX` like the wire field
    pub fn time_boot_ms(&self) -> u32 {
        wrap_ms(self.start.elapsed().as_millis())
    }
}

impl Default for BootClock {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_ms(ms: u128) -> u32 {
    (ms & u32::MAX as u128) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_clock_starts_near_zero() {
        let clock = BootClock::new();
        assert!(clock.time_boot_ms() < 1000);
    }

    #[test]
    fn test_wrap_ms() {
        assert_eq!(wrap_ms(42), 42);
        assert_eq!(wrap_ms(u32::MAX as u128), u32::MAX);
        assert_eq!(wrap_ms(u32::MAX as u128 + 1), 0);
        assert_eq!(wrap_ms(u32::MAX as u128 + 11), 10);
    }

    #[test]
    fn test_component_ids_are_distinct() {
        assert_ne!(ids::VEHICLE_COMPONENT, ids::CAMERA_COMPONENT);
        assert_ne!(ids::SYSTEM_ID, ids::GCS_SYSTEM_ID);
    }
}
