//! Component tracking for the GCS monitor
//!
//! This module handles:
//! - Recording every (system, component) that sends a heartbeat
//! - Detecting first sightings
//! - Dropping components that went silent

mod registry;

pub use registry::{ComponentKey, ComponentRegistry};
