//! MAV_CMD_SET_MESSAGE_INTERVAL handler

use super::HandlerContext;
use crate::command::CommandResult;
use mavlink::ardupilotmega::COMMAND_LONG_DATA;
use tracing::debug;

/// Acknowledge an interval request.
///
/// The announcer runs on a fixed tick; the requested interval is logged and
/// accepted but not applied.
pub async fn handle_set_message_interval(
    ctx: &HandlerContext,
    command: &COMMAND_LONG_DATA,
) -> CommandResult {
    let message_id = command.param1 as u32;
    let interval_us = command.param2;

    debug!(
        "  [CMD] Interval for message {} -> {}us requested on system {} (not applied)",
        message_id, interval_us, ctx.system_id
    );

    CommandResult::Accepted {
        message: format!(
            "Interval {}us for message {} acknowledged, not applied",
            interval_us, message_id
        ),
    }
}
