use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A deferred Note Off for `key`, due at `due` seconds on the run clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledOff {
    pub key: u8,
    pub due: f64,
    seq: u64,
}

impl Eq for ScheduledOff {}

impl Ord for ScheduledOff {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledOff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct QueueState {
    heap: BinaryHeap<Reverse<ScheduledOff>>,
    next_seq: u64,
}

/// Pending note-off dispatches ordered by due time, behind their own lock.
///
/// Items with equal due times come out in scheduling order.
#[derive(Debug, Default)]
pub struct DelayedDispatchQueue {
    state: Mutex<QueueState>,
}

impl DelayedDispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, key: u8, due: f64) {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Reverse(ScheduledOff { key, due, seq }));
    }

    /// Removes every item due at or before `now` and returns their keys in
    /// due order; later items stay queued.
    pub fn drain_due(&self, now: f64) -> Vec<u8> {
        let mut state = self.lock();
        let mut due = Vec::new();
        while let Some(Reverse(next)) = state.heap.peek() {
            if next.due > now {
                break;
            }
            if let Some(Reverse(item)) = state.heap.pop() {
                due.push(item.key);
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<f64> {
        self.lock().heap.peek().map(|Reverse(item)| item.due)
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_due_partitions_queue() {
        let queue = DelayedDispatchQueue::new();
        queue.schedule(10, 0.5);
        queue.schedule(11, 0.2);
        queue.schedule(12, 0.9);

        assert_eq!(queue.drain_due(0.5), vec![11, 10]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(0.9));
        assert!(queue.drain_due(0.8).is_empty());
        assert_eq!(queue.drain_due(1.0), vec![12]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_due_times_keep_schedule_order() {
        let queue = DelayedDispatchQueue::new();
        for key in [30, 20, 40] {
            queue.schedule(key, 1.0);
        }
        assert_eq!(queue.drain_due(1.0), vec![30, 20, 40]);
    }
}
