//! Test double recording everything sent through it

use super::MessageSink;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mavlink::ardupilotmega::MavMessage;
use mavlink::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(u8, MavMessage)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything sent so far, as (source component, message)
    pub fn sent(&self) -> Vec<(u8, MavMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// Message names in send order
    pub fn names(&self) -> Vec<&'static str> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, msg)| msg.message_name())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| **n == name).count()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_from(&self, component_id: u8, msg: &MavMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("link down"));
        }
        self.sent.lock().unwrap().push((component_id, msg.clone()));
        Ok(())
    }

    fn system_id(&self) -> u8 {
        1
    }
}
