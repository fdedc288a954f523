//! Per-run session state owned by the control loop

/// Lifecycle of a one-shot announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnouncementState {
    #[default]
    Pending,
    Sent,
}

impl AnnouncementState {
    pub fn is_pending(self) -> bool {
        self == AnnouncementState::Pending
    }
}

/// State carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Ticks completed since start; also the telemetry sample value
    pub counter: u64,
    pub camera_info: AnnouncementState,
    pub stream_info: AnnouncementState,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for the next tick
    pub fn advance(self) -> Self {
        Self {
            counter: self.counter + 1,
            ..self
        }
    }

    /// Both one-shot announcements are out
    pub fn fully_announced(&self) -> bool {
        !self.camera_info.is_pending() && !self.stream_info.is_pending()
    }
}
