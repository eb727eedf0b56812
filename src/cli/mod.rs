use crate::config::DEFAULT_DURATION_SECS;
use clap::Parser;
use std::path::PathBuf;

/// Measures round-trip latency of a MIDI loopback by sending random notes
/// and timing their echoes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Run length in seconds
    #[arg(short, long, default_value_t = DEFAULT_DURATION_SECS)]
    pub duration: f64,

    /// MIDI channel (0-15) used for dispatched notes
    #[arg(short, long, default_value_t = 0)]
    pub channel: u8,

    /// Seed for the note generator, for reproducible workloads
    #[arg(long)]
    pub seed: Option<u64>,

    /// List available MIDI devices
    #[arg(long)]
    pub list_devices: bool,

    /// Input port to listen on (substring match); first port if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Output port to send to (substring match); first port if omitted
    #[arg(long)]
    pub output: Option<String>,

    /// Choose ports interactively
    #[arg(long)]
    pub select: bool,

    /// Use an in-process loopback with this latency instead of a device
    #[arg(long, value_name = "MS")]
    pub loopback_ms: Option<u64>,

    /// Only print incoming note events
    #[arg(long)]
    pub monitor: bool,

    /// How long to wait for late echoes after the last note-off
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub echo_grace_ms: u64,

    /// Log every dispatch and echo
    #[arg(short, long)]
    pub verbose: bool,

    /// Also append debug logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
