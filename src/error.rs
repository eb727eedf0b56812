use crate::midi::MidiError;
use crate::timer::TimerState;
use thiserror::Error;

/// Errors surfaced by the latency timer.
///
/// An echo without a pending entry and a run without samples are normal
/// outcomes and are reported through counters and the statistics summary.
#[derive(Debug, Error)]
pub enum TimerError {
    /// No usable transport at startup; nothing has been started
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[source] MidiError),

    /// A generator or drain loop failed; the run is aborted
    #[error("{name} loop failed: {reason}")]
    LoopFault { name: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: TimerState,
    },

    #[error("failed to start {name} loop: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl TimerError {
    pub fn loop_fault(name: &'static str, err: MidiError) -> Self {
        TimerError::LoopFault {
            name,
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;
