//! Command responder - dispatches inbound COMMAND_LONG and sends the ACK

use super::handlers::{self, HandlerContext};
use crate::config::SimConfig;
use crate::mavlink::{messages, InboundReceiver, MessageSink};
use camsim_shared::BootClock;
use mavlink::ardupilotmega::{MavCmd, MavMessage, MavResult, COMMAND_LONG_DATA};
use mavlink::MavHeader;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, trace, warn};

/// Result of command handling
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Command executed
    Accepted { message: String },
    /// Command understood but its parameters cannot be honoured
    Denied { message: String },
    /// Command understood but a reply could not be sent
    Failed { message: String },
    /// Command (or requested message) not supported
    Unsupported { message: String },
}

impl CommandResult {
    /// Wire result code for the ACK
    pub fn mav_result(&self) -> MavResult {
        match self {
            CommandResult::Accepted { .. } => MavResult::MAV_RESULT_ACCEPTED,
            CommandResult::Denied { .. } => MavResult::MAV_RESULT_DENIED,
            CommandResult::Failed { .. } => MavResult::MAV_RESULT_FAILED,
            CommandResult::Unsupported { .. } => MavResult::MAV_RESULT_UNSUPPORTED,
        }
    }

    fn message(&self) -> &str {
        match self {
            CommandResult::Accepted { message }
            | CommandResult::Denied { message }
            | CommandResult::Failed { message }
            | CommandResult::Unsupported { message } => message,
        }
    }
}

/// Answers commands addressed to this system
pub struct CommandResponder {
    ctx: HandlerContext,
    max_per_poll: usize,
}

impl CommandResponder {
    pub fn new(config: &SimConfig, clock: BootClock) -> Self {
        Self {
            ctx: HandlerContext {
                system_id: config.link.system_id,
                vehicle_component: config.vehicle.component_id,
                camera: config.camera.clone(),
                streams: config.streams.clone(),
                clock,
            },
            max_per_poll: config.max_inbound_per_tick.max(1),
        }
    }

    /// Handle whatever is already queued, without waiting
    ///
    /// Returns the number of commands answered.
    pub async fn poll<S: MessageSink + ?Sized>(&self, sink: &S, inbound: &mut InboundReceiver) -> usize {
        let mut answered = 0;

        for _ in 0..self.max_per_poll {
            match inbound.try_recv() {
                Ok((header, msg)) => {
                    if self.handle(sink, &header, &msg).await.is_some() {
                        answered += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    trace!("[CMD] Inbound channel closed");
                    break;
                }
            }
        }

        answered
    }

    /// Handle one inbound message, returning the ACK result if it was a command for us
    pub async fn handle<S: MessageSink + ?Sized>(
        &self,
        sink: &S,
        header: &MavHeader,
        msg: &MavMessage,
    ) -> Option<MavResult> {
        let cmd = match msg {
            MavMessage::COMMAND_LONG(cmd) => cmd,
            _ => {
                trace!(
                    "[CMD] Ignoring non-command message from {}/{}",
                    header.system_id,
                    header.component_id
                );
                return None;
            }
        };

        if cmd.target_system != 0 && cmd.target_system != self.ctx.system_id {
            debug!(
                "[CMD] {:?} addressed to system {}, not us",
                cmd.command, cmd.target_system
            );
            return None;
        }

        info!(
            "[CMD] {:?} from {}/{} to component {} (param1={})",
            cmd.command, header.system_id, header.component_id, cmd.target_component, cmd.param1
        );

        let result = self.dispatch(sink, cmd).await;
        let mav_result = result.mav_result();

        match &result {
            CommandResult::Accepted { message } => info!("  [CMD] Accepted: {}", message),
            CommandResult::Failed { message } => warn!("  [CMD] Failed: {}", message),
            other => info!("  [CMD] {:?}: {}", mav_result, other.message()),
        }

        // ACK from the targeted component, or the vehicle if none was named
        let ack_component = if cmd.target_component != 0 {
            cmd.target_component
        } else {
            self.ctx.vehicle_component
        };
        let ack = messages::command_ack(cmd.command, mav_result);
        sink.emit(ack_component, &ack).await;

        Some(mav_result)
    }

    async fn dispatch<S: MessageSink + ?Sized>(&self, sink: &S, cmd: &COMMAND_LONG_DATA) -> CommandResult {
        match cmd.command {
            MavCmd::MAV_CMD_REQUEST_MESSAGE => {
                handlers::handle_request_message(&self.ctx, sink, cmd).await
            }
            MavCmd::MAV_CMD_REQUEST_CAMERA_INFORMATION => {
                handlers::handle_request_camera_information(&self.ctx, sink, cmd).await
            }
            MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL => {
                handlers::handle_set_message_interval(&self.ctx, cmd).await
            }
            other => CommandResult::Unsupported {
                message: format!("{:?} not supported", other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavlink::testing::RecordingSink;
    use camsim_shared::msg_id;
    use mavlink::ardupilotmega::HEARTBEAT_DATA;
    use tokio::sync::mpsc;

    fn responder() -> CommandResponder {
        CommandResponder::new(&SimConfig::default(), BootClock::new())
    }

    fn gcs_header() -> MavHeader {
        MavHeader {
            system_id: 255,
            component_id: 190,
            sequence: 0,
        }
    }

    fn command(command: MavCmd, target_component: u8, param1: f32) -> MavMessage {
        MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            target_system: 1,
            target_component,
            command,
            confirmation: 0,
            param1,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
        })
    }

    fn last_ack(sink: &RecordingSink) -> (u8, mavlink::ardupilotmega::COMMAND_ACK_DATA) {
        match sink.sent().pop() {
            Some((component, MavMessage::COMMAND_ACK(ack))) => (component, ack),
            other => panic!("expected COMMAND_ACK, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsupported_command_gets_single_ack() {
        let sink = RecordingSink::new();
        let msg = command(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, 1, 1.0);

        let result = responder().handle(&sink, &gcs_header(), &msg).await;

        assert_eq!(result, Some(MavResult::MAV_RESULT_UNSUPPORTED));
        assert_eq!(sink.names(), vec!["COMMAND_ACK"]);
        let (component, ack) = last_ack(&sink);
        assert_eq!(component, 1);
        assert_eq!(ack.command, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM);
        assert_eq!(ack.result, MavResult::MAV_RESULT_UNSUPPORTED);
    }

    #[tokio::test]
    async fn test_request_camera_information_before_ack() {
        let sink = RecordingSink::new();
        let msg = command(
            MavCmd::MAV_CMD_REQUEST_MESSAGE,
            100,
            msg_id::CAMERA_INFORMATION as f32,
        );

        let result = responder().handle(&sink, &gcs_header(), &msg).await;

        assert_eq!(result, Some(MavResult::MAV_RESULT_ACCEPTED));
        assert_eq!(sink.names(), vec!["CAMERA_INFORMATION", "COMMAND_ACK"]);
        match &sink.sent()[0] {
            (100, MavMessage::CAMERA_INFORMATION(info)) => {
                assert_eq!(info.resolution_h, 640);
                assert_eq!(info.resolution_v, 480);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(last_ack(&sink).0, 100);
    }

    #[tokio::test]
    async fn test_request_stream_information_sends_all_streams() {
        let sink = RecordingSink::new();
        let msg = command(
            MavCmd::MAV_CMD_REQUEST_MESSAGE,
            100,
            msg_id::VIDEO_STREAM_INFORMATION as f32,
        );

        responder().handle(&sink, &gcs_header(), &msg).await;

        assert_eq!(
            sink.names(),
            vec!["VIDEO_STREAM_INFORMATION", "VIDEO_STREAM_INFORMATION", "COMMAND_ACK"]
        );
        for (component, msg) in &sink.sent()[..2] {
            assert_eq!(*component, 100);
            match msg {
                MavMessage::VIDEO_STREAM_INFORMATION(info) => {
                    assert_eq!(info.framerate, 30.0);
                    assert_eq!(info.resolution_h, 640);
                    assert_eq!(info.resolution_v, 480);
                    assert_eq!(info.count, 2);
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_request_unknown_message_is_unsupported() {
        let sink = RecordingSink::new();
        let msg = command(MavCmd::MAV_CMD_REQUEST_MESSAGE, 1, 33.0);

        let result = responder().handle(&sink, &gcs_header(), &msg).await;

        assert_eq!(result, Some(MavResult::MAV_RESULT_UNSUPPORTED));
        assert_eq!(sink.names(), vec!["COMMAND_ACK"]);
    }

    #[tokio::test]
    async fn test_ack_falls_back_to_vehicle_component() {
        let sink = RecordingSink::new();
        let msg = command(
            MavCmd::MAV_CMD_REQUEST_MESSAGE,
            0,
            msg_id::CAMERA_INFORMATION as f32,
        );

        responder().handle(&sink, &gcs_header(), &msg).await;

        // Camera info still comes from the camera; the ACK from the vehicle
        assert_eq!(sink.sent()[0].0, 100);
        assert_eq!(last_ack(&sink).0, 1);
    }

    #[tokio::test]
    async fn test_set_message_interval_accepted() {
        let sink = RecordingSink::new();
        let msg = command(MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL, 1, 33.0);

        let result = responder().handle(&sink, &gcs_header(), &msg).await;

        assert_eq!(result, Some(MavResult::MAV_RESULT_ACCEPTED));
        assert_eq!(sink.names(), vec!["COMMAND_ACK"]);
    }

    #[tokio::test]
    async fn test_failed_reply_reports_failed() {
        let sink = RecordingSink::new();
        sink.fail_sends(true);
        let msg = command(
            MavCmd::MAV_CMD_REQUEST_MESSAGE,
            100,
            msg_id::CAMERA_INFORMATION as f32,
        );

        let result = responder().handle(&sink, &gcs_header(), &msg).await;
        assert_eq!(result, Some(MavResult::MAV_RESULT_FAILED));
    }

    #[tokio::test]
    async fn test_command_for_other_system_ignored() {
        let sink = RecordingSink::new();
        let msg = MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            target_system: 42,
            target_component: 1,
            command: MavCmd::MAV_CMD_REQUEST_MESSAGE,
            ..Default::default()
        });

        let result = responder().handle(&sink, &gcs_header(), &msg).await;
        assert_eq!(result, None);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_command_ignored() {
        let sink = RecordingSink::new();
        let msg = MavMessage::HEARTBEAT(HEARTBEAT_DATA::default());

        let result = responder().handle(&sink, &gcs_header(), &msg).await;
        assert_eq!(result, None);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_poll_drains_without_blocking() {
        let sink = RecordingSink::new();
        let responder = responder();
        let (tx, mut rx) = mpsc::channel(8);

        // Nothing queued: returns immediately
        assert_eq!(responder.poll(&sink, &mut rx).await, 0);

        tx.send((gcs_header(), MavMessage::HEARTBEAT(HEARTBEAT_DATA::default())))
            .await
            .unwrap();
        tx.send((gcs_header(), command(MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL, 1, 0.0)))
            .await
            .unwrap();
        tx.send((gcs_header(), command(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, 1, 0.0)))
            .await
            .unwrap();

        assert_eq!(responder.poll(&sink, &mut rx).await, 2);
        assert_eq!(sink.count("COMMAND_ACK"), 2);
    }

    #[tokio::test]
    async fn test_poll_is_bounded_per_tick() {
        let sink = RecordingSink::new();
        let config = SimConfig {
            max_inbound_per_tick: 2,
            ..Default::default()
        };
        let responder = CommandResponder::new(&config, BootClock::new());
        let (tx, mut rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send((gcs_header(), command(MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL, 1, 0.0)))
                .await
                .unwrap();
        }

        assert_eq!(responder.poll(&sink, &mut rx).await, 2);
        assert_eq!(responder.poll(&sink, &mut rx).await, 1);
    }
}
