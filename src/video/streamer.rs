//! Dual-stream capture and forwarding
//!
//! One blocking producer reads frames and derives the grayscale copy. Two
//! consumer tasks forward frames into the encoder processes. Producer and
//! consumers are joined by bounded channels, so a slow encoder drops
//! frames instead of stalling capture.

use super::capture::{open_source, FrameSource};
use super::convert::bgr_to_gray;
use super::encoder::{encoder_args, EncoderProcess, Termination};
use super::frame::PixelFormat;
use super::VideoError;
use crate::config::VideoConfig;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Log frame counters every this many seconds of video
const LOG_EVERY_SECS: u64 = 5;

/// What the producer hands back when it exits
struct CaptureOutcome {
    frames: u64,
    dropped: u64,
    source: Box<dyn FrameSource>,
}

/// One encoder output of the pipeline
struct Output {
    name: &'static str,
    format: PixelFormat,
    tx: mpsc::Sender<Bytes>,
    closed: bool,
}

/// Summary of a pipeline shutdown
#[derive(Debug)]
pub struct ShutdownReport {
    pub frames: u64,
    pub dropped: u64,
    /// The capture source was dropped before `stop` returned
    pub source_released: bool,
    pub encoders: Vec<Termination>,
}

/// Running capture/forward pipeline
pub struct VideoStreamer {
    stop: Arc<AtomicBool>,
    producer: Option<JoinHandle<CaptureOutcome>>,
    consumers: Vec<JoinHandle<()>>,
    encoders: Vec<EncoderProcess>,
    shutdown_timeout: Duration,
}

impl VideoStreamer {
    /// Open the configured source and start streaming
    pub fn start(config: &VideoConfig) -> Result<Self, VideoError> {
        let source = open_source(config)?;
        Self::start_with_source(config, source)
    }

    /// Start streaming from an already opened source
    pub fn start_with_source(
        config: &VideoConfig,
        source: Box<dyn FrameSource>,
    ) -> Result<Self, VideoError> {
        info!(
            "[VIDEO] Capturing from {} every {:?}",
            source.describe(),
            config.frame_interval()
        );

        let plan = [
            ("rgb", PixelFormat::Bgr24, config.rgb_port),
            ("thermal", PixelFormat::Gray8, config.thermal_port),
        ];

        // An early return drops `source` and any spawned encoder, which kills it
        let mut encoders = Vec::with_capacity(plan.len());
        for (name, format, port) in plan {
            let args = encoder_args(
                &config.encoder,
                format,
                config.width,
                config.height,
                config.fps,
                port,
            );
            encoders.push(EncoderProcess::spawn(name, &config.encoder.program, &args)?);
        }

        let mut outputs = Vec::with_capacity(plan.len());
        let mut consumers = Vec::with_capacity(plan.len());
        for ((name, format, port), encoder) in plan.into_iter().zip(encoders.iter_mut()) {
            let stdin = encoder.take_stdin()?;
            let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
            consumers.push(tokio::spawn(forward_loop(name, rx, stdin)));
            outputs.push(Output {
                name,
                format,
                tx,
                closed: false,
            });
            info!(
                "[VIDEO] {} stream -> rtp://{}:{}",
                name, config.encoder.host, port
            );
        }

        let stop = Arc::new(AtomicBool::new(false));
        let log_every = (config.fps.max(1) as u64) * LOG_EVERY_SECS;
        let producer = {
            let stop = stop.clone();
            tokio::task::spawn_blocking(move || capture_loop(source, outputs, stop, log_every))
        };

        Ok(Self {
            stop,
            producer: Some(producer),
            consumers,
            encoders,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// The producer is still capturing
    pub fn is_running(&self) -> bool {
        self.producer
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop capture, drain the consumers and terminate both encoders
    pub async fn stop(mut self) -> ShutdownReport {
        info!("[VIDEO] Stopping video streaming");
        self.stop.store(true, Ordering::Relaxed);

        let mut report = ShutdownReport {
            frames: 0,
            dropped: 0,
            source_released: false,
            encoders: Vec::new(),
        };

        // Released last, once the encoders are gone
        let mut source = None;
        if let Some(mut producer) = self.producer.take() {
            match timeout(self.shutdown_timeout, &mut producer).await {
                Ok(Ok(outcome)) => {
                    report.frames = outcome.frames;
                    report.dropped = outcome.dropped;
                    source = Some(outcome.source);
                }
                Ok(Err(e)) => error!("[VIDEO] Capture thread failed: {}", e),
                Err(_) => warn!(
                    "[VIDEO] Capture thread did not stop within {:?}",
                    self.shutdown_timeout
                ),
            }
        }

        for mut consumer in self.consumers.drain(..) {
            if timeout(self.shutdown_timeout, &mut consumer).await.is_err() {
                warn!("[VIDEO] Forwarding task did not finish, aborting");
                consumer.abort();
            }
        }

        let grace = self.shutdown_timeout;
        let terminations = self
            .encoders
            .drain(..)
            .map(|encoder| encoder.terminate(grace));
        report.encoders = futures::future::join_all(terminations).await;
        for done in &report.encoders {
            debug!("[VIDEO] {} encoder exited: {:?}", done.name, done.status);
        }

        if let Some(source) = source {
            let name = source.describe();
            drop(source);
            report.source_released = true;
            debug!("[VIDEO] Released {}", name);
        }

        info!(
            "[VIDEO] Stopped after {} frames ({} dropped)",
            report.frames, report.dropped
        );
        report
    }
}

impl Drop for VideoStreamer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    mut outputs: Vec<Output>,
    stop: Arc<AtomicBool>,
    log_every: u64,
) -> CaptureOutcome {
    let mut frames = 0u64;
    let mut dropped = 0u64;

    while !stop.load(Ordering::Relaxed) {
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("[VIDEO] Capture failed: {}", e);
                break;
            }
        };
        let gray = bgr_to_gray(&frame);

        for output in outputs.iter_mut().filter(|o| !o.closed) {
            let payload = match output.format {
                PixelFormat::Bgr24 => frame.data.clone(),
                PixelFormat::Gray8 => gray.data.clone(),
            };
            match output.tx.try_send(payload) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => dropped += 1,
                Err(TrySendError::Closed(_)) => {
                    warn!("[VIDEO] {} encoder pipe closed", output.name);
                    output.closed = true;
                }
            }
        }
        if outputs.iter().any(|o| o.closed) {
            break;
        }

        frames += 1;
        if frames % log_every == 0 {
            info!("[VIDEO] Streamed {} frames ({} dropped)", frames, dropped);
        }
    }

    debug!("[VIDEO] Capture loop exited after {} frames", frames);
    CaptureOutcome {
        frames,
        dropped,
        source,
    }
}

async fn forward_loop(name: &'static str, mut rx: mpsc::Receiver<Bytes>, mut stdin: ChildStdin) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = stdin.write_all(&frame).await {
            warn!("[VIDEO] Write to {} encoder failed: {}", name, e);
            return;
        }
    }

    if let Err(e) = stdin.shutdown().await {
        debug!("[VIDEO] Closing {} encoder stdin: {}", name, e);
    }
}
