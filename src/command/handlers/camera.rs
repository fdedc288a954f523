//! Legacy MAV_CMD_REQUEST_CAMERA_INFORMATION handler

use super::request_message::send_camera_information;
use super::HandlerContext;
use crate::command::CommandResult;
use crate::mavlink::MessageSink;
use mavlink::ardupilotmega::COMMAND_LONG_DATA;
use tracing::debug;

/// Older GCS builds ask for camera info with this instead of REQUEST_MESSAGE.
/// param1 = 0 means "do not send".
pub async fn handle_request_camera_information<S: MessageSink + ?Sized>(
    ctx: &HandlerContext,
    sink: &S,
    command: &COMMAND_LONG_DATA,
) -> CommandResult {
    if command.param1 == 0.0 {
        debug!("  [CMD] Camera information request with param1=0, nothing to send");
        return CommandResult::Accepted {
            message: "Nothing requested".into(),
        };
    }

    send_camera_information(ctx, sink).await
}
