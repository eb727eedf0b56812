use thiserror::Error;

/// Custom error type for MIDI operations
#[derive(Debug, Error)]
pub enum MidiError {
    /// No usable input or output port was found
    #[error("no MIDI device available: {0}")]
    NoDevice(String),
    /// Error when sending a MIDI message
    #[error("MIDI send error: {0}")]
    SendError(String),
    /// Error when receiving a MIDI message
    #[error("MIDI receive error: {0}")]
    RecvError(String),
    /// Error when connecting to a MIDI device
    #[error("MIDI connection error: {0}")]
    ConnectionError(String),
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Which half of a note a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

impl NoteKind {
    pub fn label(&self) -> &'static str {
        match self {
            NoteKind::On => "on",
            NoteKind::Off => "off",
        }
    }
}

/// A channel note message as sent to or received from a transport.
///
/// Note Off carries no velocity: it is always transmitted as 0, so an Off
/// with a nonzero velocity cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On message with note number and velocity
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off message with note number
    NoteOff { channel: u8, note: u8 },
}

impl MidiMessage {
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        MidiMessage::NoteOn {
            channel: channel & 0x0F,
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        MidiMessage::NoteOff {
            channel: channel & 0x0F,
            note: note & 0x7F,
        }
    }

    pub fn kind(&self) -> NoteKind {
        match self {
            MidiMessage::NoteOn { .. } => NoteKind::On,
            MidiMessage::NoteOff { .. } => NoteKind::Off,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { channel, .. } | MidiMessage::NoteOff { channel, .. } => *channel,
        }
    }

    pub fn key(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { note, .. } | MidiMessage::NoteOff { note, .. } => *note,
        }
    }

    /// Velocity used for matching; always 0 for Note Off.
    pub fn velocity(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { velocity, .. } => *velocity,
            MidiMessage::NoteOff { .. } => 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), *note, *velocity],
            MidiMessage::NoteOff { channel, note } => [0x80 | (channel & 0x0F), *note, 0],
        }
    }

    /// Parses a raw channel message, keeping only Note On / Note Off.
    ///
    /// A Note On with velocity 0 stays a Note On here; it still matches a
    /// pending Note Off because matching only looks at (key, velocity).
    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        if data.len() < 3 {
            return None;
        }

        match data[0] & 0xF0 {
            0x90 => Some(MidiMessage::NoteOn {
                channel: data[0] & 0x0F,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            0x80 => Some(MidiMessage::NoteOff {
                channel: data[0] & 0x0F,
                note: data[1] & 0x7F,
            }),
            _ => None,
        }
    }
}

/// A note message stamped with the monotonic time it was sent or received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub message: MidiMessage,
    /// Seconds since the run's clock origin
    pub timestamp: f64,
}

impl Event {
    pub fn new(message: MidiMessage, timestamp: f64) -> Self {
        Self { message, timestamp }
    }

    pub fn kind(&self) -> NoteKind {
        self.message.kind()
    }

    pub fn key(&self) -> u8 {
        self.message.key()
    }

    pub fn velocity(&self) -> u8 {
        self.message.velocity()
    }
}

/// Callback invoked by a transport for every incoming note message.
pub type EchoHandler = Box<dyn FnMut(MidiMessage) + Send + 'static>;

/// Trait defining the interface for MIDI transports
///
/// Implementations only forward Note On / Note Off messages to the
/// subscribed handler, which may run on a transport-owned thread.
pub trait Transport: Send + Sync {
    /// Sends a MIDI message to the device
    fn send(&self, msg: &MidiMessage) -> Result<()>;

    /// Starts delivering incoming note messages to `handler`
    fn subscribe(&self, handler: EchoHandler) -> Result<()>;

    /// Stops delivering incoming messages; a no-op when not subscribed
    fn unsubscribe(&self) -> Result<()>;
}
