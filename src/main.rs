mod announcer;
mod command;
mod config;
mod mavlink;
mod video;

use announcer::{Announcer, SessionState};
use anyhow::{Context, Result};
use camsim_shared::BootClock;
use command::CommandResponder;
use config::SimConfig;
use crate::mavlink::{MavEndpoint, MessageSink};
use video::VideoStreamer;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match std::env::args().nth(1).as_deref() {
        Some("--single-stream") => SimConfig::single_stream(),
        _ => SimConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    info!(
        "Camera simulator starting: {} {} ({} stream(s))",
        config.camera.vendor,
        config.camera.model,
        config.streams.len()
    );

    let (endpoint, mut inbound) = MavEndpoint::connect(config.link.clone())
        .await
        .context("Failed to open MAVLink endpoint")?;

    let streamer = match &config.video {
        Some(video) => Some(VideoStreamer::start(video).context("Failed to start video streaming")?),
        None => None,
    };

    let clock = BootClock::new();
    let announcer = Announcer::new(&config, clock);
    let responder = CommandResponder::new(&config, clock);
    let mut state = SessionState::new();
    let mut video_lost = false;

    let mut ticker = tokio::time::interval(config.tick_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Announcing as system {} on {}",
        endpoint.system_id(),
        endpoint.config().mode.connection_string()
    );

    // Main control loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let handled = responder.poll(&endpoint, &mut inbound).await;
                if handled > 0 {
                    debug!("Handled {} inbound record(s)", handled);
                }
                state = announcer.tick(&endpoint, state).await;

                if let Some(streamer) = &streamer {
                    if !video_lost && !streamer.is_running() {
                        warn!("Video pipeline ended, announcing only");
                        video_lost = true;
                    }
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
        }
    }

    if let Some(streamer) = streamer {
        let report = streamer.stop().await;
        if !report.source_released {
            warn!("Capture source was not released cleanly");
        }
        let killed = report.encoders.iter().filter(|t| t.escalated).count();
        if killed > 0 {
            warn!("{} encoder(s) had to be killed", killed);
        }
    }

    info!("Stopped after {} tick(s)", state.counter);
    Ok(())
}
