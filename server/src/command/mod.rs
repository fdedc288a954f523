//! Requests sent by the GCS monitor
//!
//! This module handles:
//! - Tracking pending requests until their COMMAND_ACK arrives
//! - Measuring ACK latency
//! - Expiring requests that were never acknowledged

mod tracker;

pub use tracker::{PendingRequest, RequestTracker};
