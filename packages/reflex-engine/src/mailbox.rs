//! Single-slot mailboxes connecting the foreground to the I/O loops.

use std::sync::Mutex;

use tokio::sync::Notify;

use reflex_protocol::packets::{PACKET_SIZE, Packet};

/// A single-slot, latest-value-wins mailbox for one transfer direction.
///
/// There is no queue: `send` overwrites whatever the consumer has not yet
/// taken, so at most one report is logically in flight. The lock makes
/// `send` and `latest` atomic with respect to each other, so a reader can
/// never observe a half-written report. The notify permit lets the write
/// loop park between commands instead of polling the slot.
#[derive(Debug)]
pub struct FrameMailbox {
    slot: Mutex<Packet>,
    ready: Notify,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new([0u8; PACKET_SIZE]),
            ready: Notify::new(),
        }
    }

    /// Replaces the slot contents and raises the ready signal. An
    /// unconsumed previous value is silently discarded.
    pub fn send(&self, frame: &Packet) {
        *self.slot.lock().expect("mailbox lock poisoned") = *frame;
        self.ready.notify_one();
    }

    /// Copies out the current slot contents. Does not clear the ready
    /// signal, so callers may sample the same report repeatedly.
    pub fn latest(&self) -> Packet {
        *self.slot.lock().expect("mailbox lock poisoned")
    }

    /// Waits until `send` publishes new work.
    pub async fn ready(&self) {
        self.ready.notified().await;
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}
