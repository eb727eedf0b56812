use super::pending::PendingEventStack;
use super::stats::{DeltaSample, StatisticsCollector, StatisticsSummary};
use crate::midi::Event;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Matches echoes from the transport against pending dispatches.
pub struct CorrelationEngine {
    stack: Arc<PendingEventStack>,
    stats: Mutex<StatisticsCollector>,
    matched: AtomicU64,
    spurious: AtomicU64,
}

impl CorrelationEngine {
    pub fn new(stack: Arc<PendingEventStack>) -> Self {
        CorrelationEngine {
            stack,
            stats: Mutex::new(StatisticsCollector::new()),
            matched: AtomicU64::new(0),
            spurious: AtomicU64::new(0),
        }
    }

    /// Consumes the oldest pending entry matching `echo` and records its
    /// delta under the dispatched kind. Returns `None` for a spurious echo,
    /// which leaves the stack untouched.
    pub fn on_echo(&self, echo: &Event) -> Option<DeltaSample> {
        let (key, velocity) = (echo.key(), echo.velocity());

        let Some(pending) = self.stack.take_first_match(key, velocity) else {
            self.spurious.fetch_add(1, Ordering::SeqCst);
            warn!("Spurious echo {:?} at {:.4}s", echo.message, echo.timestamp);
            return None;
        };

        let sample = DeltaSample {
            kind: pending.kind,
            delta: echo.timestamp - pending.timestamp,
        };
        debug!(
            "Matched {} note {} vel {}: {:.4}s - {:.4}s",
            pending.kind.label(),
            key,
            velocity,
            echo.timestamp,
            pending.timestamp
        );
        self.stats().record(sample);
        self.matched.fetch_add(1, Ordering::SeqCst);
        Some(sample)
    }

    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::SeqCst)
    }

    pub fn spurious(&self) -> u64 {
        self.spurious.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> StatisticsSummary {
        self.stats().finalize()
    }

    fn stats(&self) -> MutexGuard<'_, StatisticsCollector> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
