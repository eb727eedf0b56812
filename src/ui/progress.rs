use crate::timer::Progress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bar counting elapsed milliseconds of a timed run.
pub fn create_run_progress(duration: Duration) -> ProgressBar {
    let pb = ProgressBar::new(duration.as_millis() as u64);
    let style = ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan}] {elapsed_precise} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("⣿⣦ ");
    pb.set_style(style);
    pb.set_prefix("Timing");
    pb
}

pub fn update_run_progress(pb: &ProgressBar, progress: &Progress) {
    pb.set_position(progress.elapsed.as_millis() as u64);
    pb.set_message(format!(
        "sent {} | matched {} | pending {}",
        progress.dispatched, progress.matched, progress.pending
    ));
}
