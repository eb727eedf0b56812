//! Round-trip latency timer
//!
//! The generator loop sends random Note Ons and schedules their Note Offs on
//! the [`DelayedDispatchQueue`]; the drain loop sends those Note Offs when due.
//! Every dispatch is registered in the [`PendingEventStack`], and the
//! [`CorrelationEngine`] turns echoes from the transport into delta samples.
//! [`TimerController`] owns all of it and runs the lifecycle.
//!
mod controller;
mod correlation;
mod dispatch;
mod drain;
mod generator;
mod pending;
mod queue;
mod report;
pub mod stats;

pub use controller::{Progress, TimerController, TimerState};
pub use correlation::CorrelationEngine;
pub use dispatch::Dispatcher;
pub use drain::{DispatchDrainLoop, DRAIN_LOOP};
pub use generator::{GeneratorLoop, GENERATOR_LOOP};
pub use pending::{PendingEntry, PendingEventStack};
pub use queue::{DelayedDispatchQueue, ScheduledOff};
pub use report::RunReport;
pub use stats::{CategoryStats, DeltaSample, StatisticsCollector, StatisticsSummary};
