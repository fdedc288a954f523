//! MAV_CMD_REQUEST_MESSAGE handler

use super::HandlerContext;
use crate::command::CommandResult;
use crate::mavlink::{messages, MessageSink};
use camsim_shared::msg_id;
use mavlink::ardupilotmega::COMMAND_LONG_DATA;
use tracing::debug;

/// Handle REQUEST_MESSAGE: param1 is the message id, param2 an optional stream id
pub async fn handle_request_message<S: MessageSink + ?Sized>(
    ctx: &HandlerContext,
    sink: &S,
    command: &COMMAND_LONG_DATA,
) -> CommandResult {
    // Saturating cast: negative and NaN become 0
    let requested = command.param1 as u32;

    match requested {
        msg_id::CAMERA_INFORMATION => send_camera_information(ctx, sink).await,
        msg_id::VIDEO_STREAM_INFORMATION => {
            send_stream_information(ctx, sink, command.param2 as u32).await
        }
        msg_id::AUTOPILOT_VERSION => {
            if sink.emit(ctx.vehicle_component, &messages::autopilot_version()).await {
                CommandResult::Accepted {
                    message: format!("Sent AUTOPILOT_VERSION from component {}", ctx.vehicle_component),
                }
            } else {
                CommandResult::Failed {
                    message: "Could not send AUTOPILOT_VERSION".into(),
                }
            }
        }
        other => CommandResult::Unsupported {
            message: format!("Message {} cannot be requested", other),
        },
    }
}

/// CAMERA_INFORMATION always comes from the camera component
pub(super) async fn send_camera_information<S: MessageSink + ?Sized>(
    ctx: &HandlerContext,
    sink: &S,
) -> CommandResult {
    let msg = messages::camera_information(&ctx.camera, ctx.clock.time_boot_ms());

    if sink.emit(ctx.camera.component_id, &msg).await {
        CommandResult::Accepted {
            message: format!("Sent CAMERA_INFORMATION from component {}", ctx.camera.component_id),
        }
    } else {
        CommandResult::Failed {
            message: "Could not send CAMERA_INFORMATION".into(),
        }
    }
}

/// Stream id 0 means all streams
async fn send_stream_information<S: MessageSink + ?Sized>(
    ctx: &HandlerContext,
    sink: &S,
    stream_id: u32,
) -> CommandResult {
    let selected: Vec<_> = ctx
        .streams
        .iter()
        .filter(|s| stream_id == 0 || s.stream_id as u32 == stream_id)
        .collect();

    if selected.is_empty() {
        return CommandResult::Denied {
            message: format!("No video stream with id {}", stream_id),
        };
    }

    let count = ctx.streams.len() as u8;
    let mut sent = 0;
    for stream in &selected {
        let msg = messages::video_stream_information(stream, count);
        if sink.emit(ctx.camera.component_id, &msg).await {
            debug!("  [CMD] Sent VIDEO_STREAM_INFORMATION #{}", stream.stream_id);
            sent += 1;
        }
    }

    if sent == selected.len() {
        CommandResult::Accepted {
            message: format!(
                "Sent {} VIDEO_STREAM_INFORMATION from component {}",
                sent, ctx.camera.component_id
            ),
        }
    } else {
        CommandResult::Failed {
            message: format!("Sent {} of {} VIDEO_STREAM_INFORMATION", sent, selected.len()),
        }
    }
}
