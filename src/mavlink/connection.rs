//! UDP MAVLink Endpoint
//!
//! Opens the UDP link to the GCS, sends on behalf of our components and
//! forwards everything received to the control loop over a channel.

use super::traits::MessageSink;
use crate::config::LinkConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mavlink::ardupilotmega::MavMessage;
use mavlink::error::MessageReadError;
use mavlink::{AsyncMavConnection, MavHeader, MavlinkVersion};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Inbound messages with the sender's header
pub type InboundReceiver = mpsc::Receiver<(MavHeader, MavMessage)>;

type SharedConnection = Arc<dyn AsyncMavConnection<MavMessage> + Sync + Send>;

/// An open MAVLink link
pub struct MavEndpoint {
    config: LinkConfig,
    connection: SharedConnection,
    reader: JoinHandle<()>,
}

impl MavEndpoint {
    /// Open the link and start the inbound reader task
    pub async fn connect(config: LinkConfig) -> Result<(Self, InboundReceiver)> {
        let conn_str = config.mode.connection_string();
        info!("[MAVLink] Opening {}", conn_str);

        let mut conn = mavlink::connect_async::<MavMessage>(&conn_str)
            .await
            .with_context(|| format!("Failed to open MAVLink link {}", conn_str))?;
        conn.set_protocol_version(MavlinkVersion::V2);

        let connection: SharedConnection = Arc::from(conn);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer.max(1));

        let reader_conn = connection.clone();
        let reader = tokio::spawn(async move {
            reader_loop(reader_conn, inbound_tx).await;
        });

        let endpoint = Self {
            config,
            connection,
            reader,
        };
        Ok((endpoint, inbound_rx))
    }

    /// Get the configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

impl Drop for MavEndpoint {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl MessageSink for MavEndpoint {
    async fn send_from(&self, component_id: u8, msg: &MavMessage) -> Result<()> {
        let header = MavHeader {
            system_id: self.config.system_id,
            component_id,
            sequence: 0, // Set by the connection
        };

        self.connection
            .send(&header, msg)
            .await
            .map(|_| ())
            .map_err(|e| anyhow!("Send error: {}", e))
    }

    fn system_id(&self) -> u8 {
        self.config.system_id
    }
}

/// Read datagrams until the control loop goes away
async fn reader_loop(connection: SharedConnection, inbound_tx: mpsc::Sender<(MavHeader, MavMessage)>) {
    loop {
        match connection.recv().await {
            Ok((header, msg)) => {
                if inbound_tx.send((header, msg)).await.is_err() {
                    debug!("[MAVLink] Inbound channel closed, reader exiting");
                    break;
                }
            }
            Err(MessageReadError::Io(e)) => {
                warn!("[MAVLink] Read error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            }
            Err(e) => {
                debug!("[MAVLink] Dropping unparseable message: {}", e);
            }
        }
    }
}
