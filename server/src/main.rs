mod command;
mod monitor;
mod session;

use anyhow::{Context, Result};
use camsim_shared::ports;
use mavlink::ardupilotmega::MavMessage;
use mavlink::error::MessageReadError;
use mavlink::{AsyncMavConnection, MavHeader, MavlinkVersion};
use monitor::{GcsMonitor, SharedConnection};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let address = format!("udpin:0.0.0.0:{}", ports::GCS_PORT);
    let mut conn = mavlink::connect_async::<MavMessage>(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    conn.set_protocol_version(MavlinkVersion::V2);
    let conn: SharedConnection = Arc::from(conn);
    info!("GCS monitor listening on {}", address);

    let (tx, mut rx) = mpsc::channel(100);
    let reader = tokio::spawn(read_loop(conn.clone(), tx));

    let mut monitor = GcsMonitor::new(conn);

    let mut sweep = tokio::time::interval(Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some((header, msg)) => monitor.handle(header, msg).await,
                None => {
                    warn!("[GCS] Reader stopped");
                    break;
                }
            },
            _ = sweep.tick() => monitor.sweep(Instant::now()),
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    reader.abort();
    info!(
        "GCS monitor stopped ({} component(s) seen, {} request(s) pending)",
        monitor.components(),
        monitor.pending()
    );
    Ok(())
}

async fn read_loop(conn: SharedConnection, tx: mpsc::Sender<(MavHeader, MavMessage)>) {
    loop {
        match conn.recv().await {
            Ok(received) => {
                if tx.send(received).await.is_err() {
                    break;
                }
            }
            Err(MessageReadError::Io(e)) => {
                warn!("[GCS] Read error: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(e) => debug!("[GCS] Dropping unparseable message: {}", e),
        }
    }
}
