//! Inbound event queue: BLE stack → main loop.
//!
//! Bluedroid invokes its GATTS/GAP callbacks on its own task.  Those
//! callbacks never touch controller state; they copy what happened into
//! an [`Event`] and push it here.  The main loop is the only consumer.
//!
//! ```text
//! ┌──────────────────┐  Event  ┌──────────────┐  Event  ┌──────────────┐
//! │ Bluedroid task   │────────▶│  EventQueue  │────────▶│  Main Loop   │
//! │ (GATTS callback) │         │ (embassy-sync│         │  (consumer)  │
//! └──────────────────┘         │  Channel)    │         └──────────────┘
//!                              └──────────────┘
//! ```
//!
//! Nothing blocks: a full queue drops the event with a warning.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::gatt::Characteristic;

/// Queue depth.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Largest write payload copied out of the stack.  Longer writes keep
/// their original length so they are still rejected as malformed.
pub const MAX_WRITE_LEN: usize = 16;

/// A client write, copied out of the BLE callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattWrite {
    pub characteristic: Characteristic,
    /// Length as sent by the client.
    pub len: usize,
    /// The first `MAX_WRITE_LEN` bytes of the payload.
    pub data: heapless::Vec<u8, MAX_WRITE_LEN>,
}

impl GattWrite {
    pub fn new(characteristic: Characteristic, payload: &[u8]) -> Self {
        let kept = &payload[..payload.len().min(MAX_WRITE_LEN)];
        Self {
            characteristic,
            len: payload.len(),
            data: heapless::Vec::from_slice(kept).unwrap_or_default(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.len > self.data.len()
    }
}

/// Prepared-write fragments held until the client executes or cancels.
///
/// Long and reliable writes arrive as offset fragments; on execute each
/// characteristic yields one [`GattWrite`] carrying the assembled length,
/// so the write takes the same validation path as a plain write.
#[derive(Debug, Default)]
pub struct PreparedWrites {
    pending: heapless::Vec<GattWrite, { Characteristic::COUNT }>,
}

impl PreparedWrites {
    pub const fn new() -> Self {
        Self {
            pending: heapless::Vec::new(),
        }
    }

    /// Queue `fragment` at `offset` into the pending write for `ch`.
    pub fn prepare(&mut self, ch: Characteristic, offset: usize, fragment: &[u8]) {
        let index = match self.pending.iter().position(|w| w.characteristic == ch) {
            Some(index) => index,
            None => {
                // One slot per characteristic, so this always fits.
                let _ = self.pending.push(GattWrite::new(ch, &[]));
                self.pending.len() - 1
            }
        };
        let write = &mut self.pending[index];

        for (at, &b) in (offset..).zip(fragment).take_while(|(at, _)| *at < MAX_WRITE_LEN) {
            while write.data.len() < at {
                let _ = write.data.push(0);
            }
            match write.data.get_mut(at) {
                Some(slot) => *slot = b,
                None => {
                    let _ = write.data.push(b);
                }
            }
        }
        write.len = write.len.max(offset + fragment.len());
    }

    /// Commit every pending write, in first-prepared order.
    pub fn execute(&mut self, handler: impl FnMut(GattWrite)) {
        core::mem::take(&mut self.pending).into_iter().for_each(handler);
    }

    /// Drop every pending write.
    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Events produced outside the main task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClientConnected,
    ClientDisconnected,
    CharacteristicWritten(GattWrite),
}

/// Bounded multi-producer, single-consumer event queue.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event.  Safe to call from any task; never blocks.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("events: queue full, event dropped");
                false
            }
        }
    }

    /// Pop the next event, `None` when empty.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// The firmware's single inbound queue.
pub static EVENTS: EventQueue = EventQueue::new();

/// Push onto [`EVENTS`].
pub fn push_event(event: Event) -> bool {
    EVENTS.push(event)
}

/// Drain [`EVENTS`].  Main loop only.
pub fn drain_events(handler: impl FnMut(Event)) {
    EVENTS.drain(handler);
}
