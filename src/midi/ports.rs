use crate::midi::{MidiError, Result};
use dialoguer::Select;
use log::{debug, info};
use midir::{MidiInput, MidiOutput};

/// How a port is picked from the list a backend reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PortChoice {
    /// First available port
    #[default]
    First,
    /// First port whose name contains the given text
    Named(String),
    /// Ask on the terminal
    Interactive,
}

impl PortChoice {
    pub fn from_args(name: Option<String>, interactive: bool) -> Self {
        match (name, interactive) {
            (Some(name), _) => PortChoice::Named(name),
            (None, true) => PortChoice::Interactive,
            (None, false) => PortChoice::First,
        }
    }
}

/// Resolves `choice` to an index into `names`.
///
/// `direction` is only used in messages ("input" / "output").
pub fn select_port(names: &[String], choice: &PortChoice, direction: &str) -> Result<usize> {
    if names.is_empty() {
        return Err(MidiError::NoDevice(format!("no MIDI {} ports", direction)));
    }

    match choice {
        PortChoice::First => Ok(0),
        PortChoice::Named(wanted) => names
            .iter()
            .position(|name| name.contains(wanted.as_str()))
            .ok_or_else(|| {
                let mut msg = format!("{} port '{}' not found in:", direction, wanted);
                for name in names {
                    msg.push_str(&format!("\n  - {}", name));
                }
                MidiError::NoDevice(msg)
            }),
        PortChoice::Interactive => Select::new()
            .with_prompt(format!("Select MIDI {} port", direction))
            .items(names)
            .default(0)
            .interact()
            .map_err(|e| MidiError::ConnectionError(e.to_string())),
    }
}

pub fn input_port_names(midi_in: &MidiInput) -> Vec<String> {
    midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect()
}

pub fn output_port_names(midi_out: &MidiOutput) -> Vec<String> {
    midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect()
}

/// Lists (inputs, outputs) visible to the system MIDI backend.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>)> {
    let midi_in = MidiInput::new("miditimer-list-in")
        .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
    let midi_out = MidiOutput::new("miditimer-list-out")
        .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

    let inputs = input_port_names(&midi_in);
    let outputs = output_port_names(&midi_out);
    debug!("MIDI inputs: {:?}", inputs);
    debug!("MIDI outputs: {:?}", outputs);
    info!(
        "Found {} input and {} output ports",
        inputs.len(),
        outputs.len()
    );
    Ok((inputs, outputs))
}
