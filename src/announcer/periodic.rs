//! Periodic announcer
//!
//! One tick: vehicle heartbeat, camera heartbeat, pending one-shot
//! announcements, telemetry sample. Everything is fire-and-forget.

use super::session::{AnnouncementState, SessionState};
use crate::config::{CameraProfile, SimConfig, StreamDescriptor, VehicleIdentity};
use crate::mavlink::{messages, MessageSink};
use camsim_shared::{timing, BootClock};
use mavlink::ardupilotmega::{MavAutopilot, MavType};
use tracing::{debug, info};

/// Emits the per-tick records
pub struct Announcer {
    vehicle: VehicleIdentity,
    camera: CameraProfile,
    streams: Vec<StreamDescriptor>,
    telemetry_name: String,
    clock: BootClock,
}

impl Announcer {
    pub fn new(config: &SimConfig, clock: BootClock) -> Self {
        Self {
            vehicle: config.vehicle.clone(),
            camera: config.camera.clone(),
            streams: config.streams.clone(),
            telemetry_name: config.telemetry_name.clone(),
            clock,
        }
    }

    /// Run one tick and return the state for the next one
    pub async fn tick<S: MessageSink + ?Sized>(&self, sink: &S, state: SessionState) -> SessionState {
        let mut state = state;
        let vehicle = self.vehicle.component_id;
        let camera = self.camera.component_id;

        sink.emit(
            vehicle,
            &messages::heartbeat(self.vehicle.mav_type, self.vehicle.autopilot),
        )
        .await;
        sink.emit(
            camera,
            &messages::heartbeat(MavType::MAV_TYPE_CAMERA, MavAutopilot::MAV_AUTOPILOT_INVALID),
        )
        .await;

        // Marked sent even if the send failed; these are not retried
        if state.camera_info.is_pending() {
            let msg = messages::camera_information(&self.camera, self.clock.time_boot_ms());
            if sink.emit(camera, &msg).await {
                info!("[ANNOUNCE] Sent CAMERA_INFORMATION from component {}", camera);
            }
            state.camera_info = AnnouncementState::Sent;
        }

        if state.stream_info.is_pending() {
            let count = self.streams.len() as u8;
            for stream in &self.streams {
                let msg = messages::video_stream_information(stream, count);
                if sink.emit(camera, &msg).await {
                    info!(
                        "[ANNOUNCE] Sent VIDEO_STREAM_INFORMATION #{} '{}' at {}",
                        stream.stream_id, stream.name, stream.uri
                    );
                }
            }
            state.stream_info = AnnouncementState::Sent;
        }

        let sample = messages::named_value_float(
            &self.telemetry_name,
            state.counter as f32,
            self.clock.time_boot_ms(),
        );
        sink.emit(vehicle, &sample).await;

        if state.counter % timing::LOG_EVERY_TICKS == 0 {
            info!("Heartbeats + telemetry sent (counter={})", state.counter);
        } else {
            debug!("Heartbeats + telemetry sent (counter={})", state.counter);
        }

        state.advance()
    }
}
