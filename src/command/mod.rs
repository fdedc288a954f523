//! Inbound command handling
//!
//! This module handles:
//! - Draining inbound records without blocking the control loop
//! - Dispatching COMMAND_LONG to the matching handler
//! - Sending exactly one COMMAND_ACK per command

pub mod handlers;
mod responder;

pub use responder::{CommandResponder, CommandResult};
