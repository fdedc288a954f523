//! Outbound message seam
//!
//! The announcer and the command responder only need to send a message
//! from one of our components; the UDP endpoint and test doubles both
//! implement this.

use anyhow::Result;
use async_trait::async_trait;
use mavlink::ardupilotmega::MavMessage;
use mavlink::Message;
use tracing::warn;

/// Sends MAVLink messages on behalf of a local component
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `msg` with `component_id` as the source component
    async fn send_from(&self, component_id: u8, msg: &MavMessage) -> Result<()>;

    /// System ID of this endpoint
    fn system_id(&self) -> u8;

    /// Send and log failures, returning whether the send succeeded
    async fn emit(&self, component_id: u8, msg: &MavMessage) -> bool {
        match self.send_from(component_id, msg).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "[MAVLink] Failed to send {} from component {}: {}",
                    msg.message_name(),
                    component_id,
                    e
                );
                false
            }
        }
    }
}
