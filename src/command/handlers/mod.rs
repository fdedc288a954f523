//! Command handlers for the supported MAV_CMDs

mod camera;
mod interval;
mod request_message;

pub use camera::handle_request_camera_information;
pub use interval::handle_set_message_interval;
pub use request_message::handle_request_message;

use crate::config::{CameraProfile, StreamDescriptor};
use camsim_shared::BootClock;

/// Context passed to command handlers
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub system_id: u8,
    pub vehicle_component: u8,
    pub camera: CameraProfile,
    pub streams: Vec<StreamDescriptor>,
    pub clock: BootClock,
}
