//! Inbound message handling for the GCS monitor

use crate::command::{PendingRequest, RequestTracker};
use crate::session::{ComponentKey, ComponentRegistry};
use anyhow::Result;
use async_trait::async_trait;
use camsim_shared::codec::decode_text;
use camsim_shared::{ids, msg_id, timing};
use mavlink::ardupilotmega::{MavCmd, MavMessage, MavType, COMMAND_LONG_DATA};
use mavlink::{AsyncMavConnection, MavHeader, Message};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

pub type SharedConnection = Arc<dyn AsyncMavConnection<MavMessage> + Sync + Send>;

/// Outbound half of the GCS link
#[async_trait]
pub trait CommandLink: Send + Sync {
    async fn send(&self, header: &MavHeader, msg: &MavMessage) -> Result<()>;
}

#[async_trait]
impl CommandLink for SharedConnection {
    async fn send(&self, header: &MavHeader, msg: &MavMessage) -> Result<()> {
        AsyncMavConnection::send(self.as_ref(), header, msg).await?;
        Ok(())
    }
}

pub struct GcsMonitor<L> {
    link: L,
    registry: ComponentRegistry,
    tracker: RequestTracker,
}

impl<L: CommandLink> GcsMonitor<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            registry: ComponentRegistry::new(),
            tracker: RequestTracker::new(Duration::from_millis(timing::COMMAND_ACK_TIMEOUT_MS)),
        }
    }

    /// Components currently known
    pub fn components(&self) -> usize {
        self.registry.len()
    }

    /// Requests still waiting for an ACK
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub async fn handle(&mut self, header: MavHeader, msg: MavMessage) {
        let key: ComponentKey = (header.system_id, header.component_id);
        let now = Instant::now();

        match &msg {
            MavMessage::HEARTBEAT(hb) => {
                if self.registry.observe(key, hb, now) {
                    info!(
                        "[GCS] New component {}/{}: type={:?} autopilot={:?}",
                        key.0, key.1, hb.mavtype, hb.autopilot
                    );
                    if hb.mavtype == MavType::MAV_TYPE_CAMERA {
                        self.request_camera_records(key).await;
                    }
                } else {
                    debug!("[GCS] Heartbeat from {}/{}", key.0, key.1);
                }
            }
            MavMessage::CAMERA_INFORMATION(ci) => {
                info!(
                    "[GCS] {}/{} CAMERA_INFORMATION: {} {} {}x{} flags={:?}",
                    key.0,
                    key.1,
                    decode_text(&ci.vendor_name),
                    decode_text(&ci.model_name),
                    ci.resolution_h,
                    ci.resolution_v,
                    ci.flags
                );
            }
            MavMessage::VIDEO_STREAM_INFORMATION(vs) => {
                info!(
                    "[GCS] {}/{} VIDEO_STREAM_INFORMATION: #{}/{} '{}' {} {:?} {}x{}@{} flags={:?}",
                    key.0,
                    key.1,
                    vs.stream_id,
                    vs.count,
                    decode_text(&vs.name),
                    decode_text(&vs.uri),
                    vs.mavtype,
                    vs.resolution_h,
                    vs.resolution_v,
                    vs.framerate,
                    vs.flags
                );
            }
            MavMessage::NAMED_VALUE_FLOAT(nv) => {
                info!(
                    "[GCS] {}/{} {} = {}",
                    key.0,
                    key.1,
                    decode_text(&nv.name),
                    nv.value
                );
            }
            MavMessage::AUTOPILOT_VERSION(av) => {
                info!(
                    "[GCS] {}/{} AUTOPILOT_VERSION: sw={:#010x} capabilities={:?}",
                    key.0, key.1, av.flight_sw_version, av.capabilities
                );
            }
            MavMessage::COMMAND_ACK(ack) => {
                let kind = self.registry.get(key).map(|info| info.mav_type);
                match self.tracker.complete(key, ack.command, now) {
                    Some((request, latency)) => info!(
                        "[GCS] ACK {:?} (msg {}) from {}/{} ({:?}): {:?} in {:?}",
                        ack.command, request.message_id, key.0, key.1, kind, ack.result, latency
                    ),
                    None => debug!(
                        "[GCS] Unsolicited ACK {:?} from {}/{}: {:?}",
                        ack.command, key.0, key.1, ack.result
                    ),
                }
            }
            other => trace!(
                "[GCS] {} from {}/{}",
                other.message_name(),
                key.0,
                key.1
            ),
        }
    }

    /// Ask a camera for its capabilities and streams
    async fn request_camera_records(&mut self, target: ComponentKey) {
        for message_id in [msg_id::CAMERA_INFORMATION, msg_id::VIDEO_STREAM_INFORMATION] {
            let cmd = MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
                target_system: target.0,
                target_component: target.1,
                command: MavCmd::MAV_CMD_REQUEST_MESSAGE,
                confirmation: 0,
                param1: message_id as f32,
                ..Default::default()
            });
            let header = MavHeader {
                system_id: ids::GCS_SYSTEM_ID,
                component_id: ids::GCS_COMPONENT,
                sequence: 0,
            };

            match self.link.send(&header, &cmd).await {
                Ok(()) => {
                    info!(
                        "[GCS] Requested message {} from {}/{}",
                        message_id, target.0, target.1
                    );
                    self.tracker.insert(PendingRequest {
                        target,
                        command: MavCmd::MAV_CMD_REQUEST_MESSAGE,
                        message_id,
                        sent_at: Instant::now(),
                    });
                }
                Err(e) => warn!("[GCS] Failed to request message {}: {}", message_id, e),
            }
        }
    }

    /// Expire overdue requests and forget silent components
    pub fn sweep(&mut self, now: Instant) {
        for request in self.tracker.expire(now) {
            warn!(
                "[GCS] No ACK for {:?} (msg {}) from {}/{}",
                request.command, request.message_id, request.target.0, request.target.1
            );
        }

        let timeout = Duration::from_millis(timing::HEARTBEAT_TIMEOUT_MS);
        for (key, info) in self.registry.remove_stale(now, timeout) {
            warn!(
                "[GCS] Lost component {}/{} ({:?}/{:?}, {} heartbeats over {:?})",
                key.0,
                key.1,
                info.mav_type,
                info.autopilot,
                info.heartbeats,
                info.last_heartbeat.saturating_duration_since(info.first_seen)
            );
        }
    }
}
