//! Pending request tracking

use crate::session::ComponentKey;
use mavlink::ardupilotmega::MavCmd;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A command sent to a component, awaiting its ACK
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub target: ComponentKey,
    pub command: MavCmd,
    /// Message id for REQUEST_MESSAGE, 0 otherwise
    pub message_id: u32,
    pub sent_at: Instant,
}

impl PendingRequest {
    /// Check if the ACK is overdue
    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.sent_at) > timeout
    }
}

/// Requests in the order they were sent
#[derive(Debug)]
pub struct RequestTracker {
    pending: VecDeque<PendingRequest>,
    timeout: Duration,
}

impl RequestTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            timeout,
        }
    }

    pub fn insert(&mut self, request: PendingRequest) {
        self.pending.push_back(request);
    }

    /// Match an ACK from `source` to the oldest request with the same command
    pub fn complete(
        &mut self,
        source: ComponentKey,
        command: MavCmd,
        now: Instant,
    ) -> Option<(PendingRequest, Duration)> {
        let index = self
            .pending
            .iter()
            .position(|p| p.target == source && p.command == command)?;
        let request = self.pending.remove(index)?;
        let latency = now.saturating_duration_since(request.sent_at);
        Some((request, latency))
    }

    /// Remove and return every request that waited too long
    pub fn expire(&mut self, now: Instant) -> Vec<PendingRequest> {
        let timeout = self.timeout;
        let (expired, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.is_timed_out(now, timeout));
        self.pending = waiting.into();
        expired
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
