use crate::midi::ports::{input_port_names, output_port_names, select_port, PortChoice};
use crate::midi::{EchoHandler, MidiError, MidiMessage, Result, Transport};
use log::{debug, info};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection};
use std::sync::{Mutex, PoisonError};

enum InputState {
    Idle(MidiInput),
    Listening(MidiInputConnection<()>),
    // Only seen if a connection attempt consumed the MidiInput and failed
    Lost,
}

/// Hardware transport: one output connection and one input port whose
/// incoming note messages are forwarded to the subscribed handler.
pub struct MidirTransport {
    input: Mutex<InputState>,
    input_port: MidiInputPort,
    output: Mutex<MidiOutputConnection>,
    input_name: String,
    output_name: String,
}

impl MidirTransport {
    pub fn connect(input: &PortChoice, output: &PortChoice) -> Result<Self> {
        let mut midi_in = MidiInput::new("miditimer-in")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let in_ports = midi_in.ports();
        let in_index = select_port(&input_port_names(&midi_in), input, "input")?;
        let input_port = in_ports
            .get(in_index)
            .cloned()
            .ok_or_else(|| MidiError::NoDevice("input port disappeared".to_string()))?;
        let input_name = midi_in
            .port_name(&input_port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let midi_out = MidiOutput::new("miditimer-out")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        let out_ports = midi_out.ports();
        let out_index = select_port(&output_port_names(&midi_out), output, "output")?;
        let out_port = out_ports
            .get(out_index)
            .ok_or_else(|| MidiError::NoDevice("output port disappeared".to_string()))?;
        let output_name = midi_out
            .port_name(out_port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        info!("Connecting to MIDI output port: {}", output_name);
        let output = midi_out
            .connect(out_port, "miditimer-output")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        Ok(MidirTransport {
            input: Mutex::new(InputState::Idle(midi_in)),
            input_port,
            output: Mutex::new(output),
            input_name,
            output_name,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl Transport for MidirTransport {
    fn send(&self, msg: &MidiMessage) -> Result<()> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output
            .send(&msg.to_bytes())
            .map_err(|e| MidiError::SendError(e.to_string()))
    }

    fn subscribe(&self, handler: EchoHandler) -> Result<()> {
        let mut state = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        let midi_in = match std::mem::replace(&mut *state, InputState::Lost) {
            InputState::Idle(midi_in) => midi_in,
            InputState::Listening(conn) => {
                *state = InputState::Listening(conn);
                return Err(MidiError::ConnectionError(
                    "input is already subscribed".to_string(),
                ));
            }
            InputState::Lost => {
                return Err(MidiError::ConnectionError(
                    "input port is no longer available".to_string(),
                ))
            }
        };

        info!("Listening on MIDI input port: {}", self.input_name);
        let mut handler = handler;
        let result = midi_in.connect(
            &self.input_port,
            "miditimer-input",
            move |stamp, bytes, _| {
                if let Some(msg) = MidiMessage::parse(bytes) {
                    debug!("Received {:?} (device stamp {}us)", msg, stamp);
                    handler(msg);
                }
            },
            (),
        );

        match result {
            Ok(conn) => {
                *state = InputState::Listening(conn);
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                *state = InputState::Idle(err.into_inner());
                Err(MidiError::ConnectionError(reason))
            }
        }
    }

    fn unsubscribe(&self) -> Result<()> {
        let mut state = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, InputState::Listening(_)) {
            return Ok(());
        }
        if let InputState::Listening(conn) = std::mem::replace(&mut *state, InputState::Lost) {
            let (midi_in, _) = conn.close();
            *state = InputState::Idle(midi_in);
            info!("Closed MIDI input port: {}", self.input_name);
        }
        Ok(())
    }
}
