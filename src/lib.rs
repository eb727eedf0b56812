pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod midi;
pub mod monitor;
pub mod scheduler;
pub mod timer;
pub mod ui;

pub use cli::Args;
pub use config::{GeneratorConfig, TimerConfig};
pub use error::TimerError;
pub use scheduler::{Scheduler, ThreadScheduler};
pub use timer::{RunReport, TimerController, TimerState};
