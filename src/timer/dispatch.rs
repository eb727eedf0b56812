use super::pending::{PendingEntry, PendingEventStack};
use crate::clock::MonotonicClock;
use crate::midi::{Event, MidiMessage, Result, Transport};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sends notes through the transport and registers each one as pending.
///
/// Shared by the generator and the drain loop. The stack lock is never held
/// across the transport call.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    stack: Arc<PendingEventStack>,
    clock: MonotonicClock,
    channel: u8,
    dispatched: AtomicU64,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        stack: Arc<PendingEventStack>,
        clock: MonotonicClock,
        channel: u8,
    ) -> Self {
        Dispatcher {
            transport,
            stack,
            clock,
            channel,
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn note_on(&self, key: u8, velocity: u8) -> Result<Event> {
        self.dispatch(MidiMessage::note_on(self.channel, key, velocity))
    }

    pub fn note_off(&self, key: u8) -> Result<Event> {
        self.dispatch(MidiMessage::note_off(self.channel, key))
    }

    /// Stamps, sends, then registers `message`. Nothing is registered if
    /// the send fails.
    pub fn dispatch(&self, message: MidiMessage) -> Result<Event> {
        let event = Event::new(message, self.clock.now());
        self.transport.send(&message)?;
        self.stack.push(PendingEntry::from(&event));
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        debug!("Dispatched {:?} at {:.4}s", message, event.timestamp);
        Ok(event)
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }

    pub fn clock(&self) -> MonotonicClock {
        self.clock
    }
}
