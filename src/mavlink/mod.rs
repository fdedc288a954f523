//! MAVLink Link Module
//!
//! UDP endpoint towards the GCS, the outbound sink seam and builders for
//! the records this simulator announces.

mod connection;
pub mod messages;
mod traits;

pub use connection::{InboundReceiver, MavEndpoint};
pub use traits::MessageSink;

#[cfg(test)]
pub mod testing;
