use super::dispatch::Dispatcher;
use super::queue::DelayedDispatchQueue;
use crate::error::{Result, TimerError};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const DRAIN_LOOP: &str = "note-off-drain";

/// Polls the note-off queue and dispatches whatever has come due.
///
/// Keeps running after deactivation until the queue is empty, so every
/// scheduled Note Off is eventually sent.
pub struct DispatchDrainLoop {
    queue: Arc<DelayedDispatchQueue>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
}

impl DispatchDrainLoop {
    pub fn new(
        queue: Arc<DelayedDispatchQueue>,
        dispatcher: Arc<Dispatcher>,
        poll_interval: Duration,
    ) -> Self {
        DispatchDrainLoop {
            queue,
            dispatcher,
            poll_interval,
        }
    }

    /// Returns once `deactivated` is set and the queue is empty.
    pub fn run(&self, deactivated: &AtomicBool) -> Result<()> {
        info!("Drain loop started");
        let mut sent = 0u64;

        loop {
            sent += self.tick()?;

            if deactivated.load(Ordering::SeqCst) && self.queue.is_empty() {
                break;
            }
            thread::sleep(self.poll_interval);
        }

        info!("Drain loop stopped after {} note offs", sent);
        Ok(())
    }

    /// Dispatches every note off due now; returns how many were sent.
    pub fn tick(&self) -> Result<u64> {
        let now = self.dispatcher.clock().now();
        let keys = self.queue.drain_due(now);
        if !keys.is_empty() {
            debug!("{} note offs due at {:.4}s", keys.len(), now);
        }

        for key in &keys {
            self.dispatcher
                .note_off(*key)
                .map_err(|e| TimerError::loop_fault(DRAIN_LOOP, e))?;
        }
        Ok(keys.len() as u64)
    }
}
