//! Periodic announcements (heartbeats, camera/stream info, telemetry)

mod periodic;
mod session;

pub use periodic::Announcer;
pub use session::SessionState;
