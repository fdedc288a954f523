//! External encoder processes
//!
//! Each encoder reads raw frames on stdin and publishes H.264 over RTP.

use super::frame::PixelFormat;
use super::VideoError;
use crate::config::{EncoderArgs, EncoderConfig};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Arguments for an encoder fed `format` frames, sending to `port`
pub fn encoder_args(
    config: &EncoderConfig,
    format: PixelFormat,
    width: u32,
    height: u32,
    fps: u32,
    port: u16,
) -> Vec<String> {
    match &config.args {
        EncoderArgs::Ffmpeg => ffmpeg_args(config, format, width, height, fps, port),
        EncoderArgs::Custom(args) => args.clone(),
    }
}

/// Raw video on stdin to low-latency H.264 over RTP
pub fn ffmpeg_args(
    config: &EncoderConfig,
    format: PixelFormat,
    width: u32,
    height: u32,
    fps: u32,
    port: u16,
) -> Vec<String> {
    let fps = fps.to_string();
    let size = format!("{}x{}", width, height);
    let destination = format!("rtp://{}:{}", config.host, port);
    let args: &[&str] = &[
        "-y",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-pix_fmt",
        format.ffmpeg_name(),
        "-s",
        &size,
        "-r",
        &fps,
        "-i",
        "-",
        "-c:v",
        "libx264",
        "-preset",
        "ultrafast",
        "-tune",
        "zerolatency",
        "-b:v",
        &config.bitrate,
        "-maxrate",
        &config.bitrate,
        "-bufsize",
        &config.bufsize,
        "-g",
        &fps,
        "-keyint_min",
        &fps,
        "-sc_threshold",
        "0",
        "-bf",
        "0",
        "-f",
        "rtp",
        &destination,
    ];
    args.iter().map(|s| s.to_string()).collect()
}

/// How an encoder ended
#[derive(Debug)]
pub struct Termination {
    pub name: String,
    pub status: Option<ExitStatus>,
    /// SIGTERM was ignored and the process had to be killed
    pub escalated: bool,
}

/// A running encoder child
pub struct EncoderProcess {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl EncoderProcess {
    /// Spawn `program` with a piped stdin. Stderr is drained into debug logs.
    pub fn spawn(name: &str, program: &str, args: &[String]) -> Result<Self, VideoError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| VideoError::EncoderSpawn {
                program: program.to_string(),
                source,
            })?;

        if let Some(stderr) = child.stderr.take() {
            let tag = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[VIDEO] {}: {}", tag, line);
                }
            });
        }

        let stdin = child.stdin.take();
        info!(
            "[VIDEO] Started {} encoder (pid {})",
            name,
            child.id().unwrap_or_default()
        );

        Ok(Self {
            name: name.to_string(),
            child,
            stdin,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Hand the stdin pipe to a forwarding task
    pub fn take_stdin(&mut self) -> Result<ChildStdin, VideoError> {
        self.stdin
            .take()
            .ok_or_else(|| VideoError::EncoderPipe(self.name.clone()))
    }

    /// Close stdin, ask the process to exit, and kill it after `grace`
    pub async fn terminate(mut self, grace: Duration) -> Termination {
        drop(self.stdin.take());
        self.request_exit();

        let (status, escalated) = match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => (Some(status), false),
            Ok(Err(e)) => {
                warn!("[VIDEO] Waiting on {} encoder failed: {}", self.name, e);
                (None, false)
            }
            Err(_) => {
                warn!(
                    "[VIDEO] {} encoder still running after {:?}, killing",
                    self.name, grace
                );
                if let Err(e) = self.child.kill().await {
                    warn!("[VIDEO] Failed to kill {} encoder: {}", self.name, e);
                }
                (self.child.try_wait().ok().flatten(), true)
            }
        };

        Termination {
            name: self.name,
            status,
            escalated,
        }
    }

    #[cfg(unix)]
    fn request_exit(&mut self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // None once the child has been reaped
        if let Some(pid) = self.id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!("[VIDEO] SIGTERM to {} encoder failed: {}", self.name, e);
            }
        }
    }

    #[cfg(not(unix))]
    fn request_exit(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!("[VIDEO] Failed to stop {} encoder: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ffmpeg_args_thermal() {
        let config = EncoderConfig::default();
        let args = encoder_args(&config, PixelFormat::Gray8, 640, 480, 30, 5601);

        let pix = args.iter().position(|a| a == "-pix_fmt").unwrap();
        assert_eq!(args[pix + 1], "gray");
        assert!(args.contains(&"640x480".to_string()));
        assert_eq!(args.last().unwrap(), "rtp://127.0.0.1:5601");

        let gop = args.iter().position(|a| a == "-g").unwrap();
        assert_eq!(args[gop + 1], "30");
    }

    #[test]
    fn test_custom_args_verbatim() {
        let config = EncoderConfig {
            args: EncoderArgs::Custom(args(&["-q"])),
            ..Default::default()
        };
        assert_eq!(
            encoder_args(&config, PixelFormat::Bgr24, 640, 480, 30, 5600),
            vec!["-q".to_string()]
        );
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let result = EncoderProcess::spawn("rgb", "/nonexistent/encoder", &[]);
        assert!(matches!(result, Err(VideoError::EncoderSpawn { .. })));
    }

    #[tokio::test]
    async fn test_take_stdin_once() {
        let mut encoder = EncoderProcess::spawn("rgb", "cat", &[]).unwrap();
        assert!(encoder.take_stdin().is_ok());
        assert!(matches!(
            encoder.take_stdin(),
            Err(VideoError::EncoderPipe(_))
        ));
        let done = encoder.terminate(Duration::from_secs(2)).await;
        assert!(!done.escalated);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_graceful() {
        let encoder = EncoderProcess::spawn("rgb", "sleep", &args(&["30"])).unwrap();
        assert!(encoder.id().is_some());

        let done = encoder.terminate(Duration::from_secs(2)).await;
        assert_eq!(done.name, "rgb");
        assert!(!done.escalated);
        assert!(done.status.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_escalates_to_kill() {
        let encoder = EncoderProcess::spawn(
            "thermal",
            "sh",
            &args(&["-c", "trap '' TERM; exec sleep 30"]),
        )
        .unwrap();
        // Let the shell install its trap
        tokio::time::sleep(Duration::from_millis(200)).await;

        let done = encoder.terminate(Duration::from_millis(300)).await;
        assert!(done.escalated);
        assert!(done.status.is_some());
    }
}
