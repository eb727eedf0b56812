//! Terminal feedback for a timed run
//!
//! Built on indicatif; the controller reports [`Progress`](crate::timer::Progress)
//! periodically and the bar mirrors it.

mod progress;

pub use progress::{create_run_progress, update_run_progress};
