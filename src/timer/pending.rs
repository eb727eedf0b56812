use crate::midi::{Event, NoteKind};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// A dispatched note still waiting for its echo.
///
/// Entries carry no dispatch id: two notes with the same (key, velocity)
/// are only told apart by registration order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEntry {
    pub kind: NoteKind,
    pub key: u8,
    pub velocity: u8,
    pub timestamp: f64,
}

impl PendingEntry {
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.key == key && self.velocity == velocity
    }
}

impl From<&Event> for PendingEntry {
    fn from(event: &Event) -> Self {
        PendingEntry {
            kind: event.kind(),
            key: event.key(),
            velocity: event.velocity(),
            timestamp: event.timestamp,
        }
    }
}

/// Dispatched-but-unconfirmed notes in registration order, behind one lock.
#[derive(Debug, Default)]
pub struct PendingEventStack {
    entries: Mutex<VecDeque<PendingEntry>>,
}

impl PendingEventStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: PendingEntry) {
        self.lock().push_back(entry);
    }

    /// Removes and returns the oldest entry matching (key, velocity).
    pub fn take_first_match(&self, key: u8, velocity: u8) -> Option<PendingEntry> {
        let mut entries = self.lock();
        let index = entries.iter().position(|e| e.matches(key, velocity))?;
        entries.remove(index)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<PendingEntry> {
        self.lock().iter().copied().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u8, velocity: u8, timestamp: f64) -> PendingEntry {
        PendingEntry {
            kind: if velocity == 0 { NoteKind::Off } else { NoteKind::On },
            key,
            velocity,
            timestamp,
        }
    }

    #[test]
    fn test_take_oldest_match_first() {
        let stack = PendingEventStack::new();
        stack.push(entry(60, 100, 1.0));
        stack.push(entry(61, 100, 1.5));
        stack.push(entry(60, 100, 2.0));

        assert_eq!(stack.take_first_match(60, 100).unwrap().timestamp, 1.0);
        assert_eq!(stack.take_first_match(60, 100).unwrap().timestamp, 2.0);
        assert!(stack.take_first_match(60, 100).is_none());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_miss_leaves_stack_unchanged() {
        let stack = PendingEventStack::new();
        stack.push(entry(60, 100, 1.0));
        stack.push(entry(60, 0, 1.2));

        assert!(stack.take_first_match(60, 99).is_none());
        assert!(stack.take_first_match(61, 0).is_none());
        assert_eq!(stack.snapshot(), vec![entry(60, 100, 1.0), entry(60, 0, 1.2)]);
    }

    #[test]
    fn test_velocity_distinguishes_on_from_off() {
        let stack = PendingEventStack::new();
        stack.push(entry(42, 80, 1.0));
        stack.push(entry(42, 0, 1.1));

        let off = stack.take_first_match(42, 0).unwrap();
        assert_eq!(off.kind, NoteKind::Off);
        assert_eq!(stack.snapshot(), vec![entry(42, 80, 1.0)]);
    }
}
