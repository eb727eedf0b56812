//! MIDI plumbing for the latency timer
//!
//! This module provides:
//! - Note message and event types, and the error type for MIDI operations
//! - The [`Transport`] trait the timer dispatches through and listens on
//! - Real MIDI device communication via midir
//! - An in-process loopback transport for dry runs and tests
//! - Port enumeration and selection
//!
mod engine;
pub mod loopback;
pub mod midir_engine;
pub mod ports;

pub use engine::{EchoHandler, Event, MidiError, MidiMessage, NoteKind, Result, Transport};

pub use loopback::LoopbackTransport;
pub use midir_engine::MidirTransport;
pub use ports::{list_devices, select_port, PortChoice};
