//! Transports carrying probes and replies
//!
//! Every transport exposes the same small surface through [`Transport`]:
//! send a message, wait a bounded time for the input side to become readable,
//! and read one message. The sampler never knows which variant it drives.
//!
//! - [`SequencerTransport`] talks to sequencer ports through midir
//! - [`RawMidiTransport`] reads and writes raw MIDI device nodes
//! - [`SerialTransport`] uses a serial line as a MIDI UART
//! - [`ScriptedTransport`] replays canned replies for tests

mod mock;
mod rawmidi;
mod sequencer;
mod serial;
mod stream;

use crate::config::TransportSpec;
use crate::error::Result;
use crate::midi::MidiMessage;
use log::info;
use std::time::Duration;

pub use mock::{ScriptedTransport, Step};
pub use rawmidi::{list_raw_devices, RawMidiTransport};
pub use sequencer::{list_sequencer_ports, SequencerTransport};
pub use serial::SerialTransport;

/// Outcome of waiting for the input side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one byte or message can be read
    Ready,
    /// The whole timeout passed with nothing to read
    TimedOut,
    /// The wait was cut short by a signal
    Interrupted,
    /// The input reported an error or invalid state
    Hangup,
}

pub trait Transport {
    /// Sends a message to the output port
    fn send(&mut self, msg: &MidiMessage) -> Result<()>;

    /// Blocks until input is readable or `timeout` elapses
    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness>;

    /// Reads one message, `None` if the bytes read so far do not complete one
    fn read_message(&mut self) -> Result<Option<MidiMessage>>;

    /// Human readable `output and input` route, used in error messages
    fn describe(&self) -> String;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens the transport selected on the command line
pub fn open(spec: &TransportSpec) -> Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match spec {
        TransportSpec::Sequencer { output, input } => {
            Box::new(SequencerTransport::connect(output, input)?)
        }
        TransportSpec::Raw { output, input } => Box::new(RawMidiTransport::open(output, input)?),
        TransportSpec::Serial { device, baud } => Box::new(SerialTransport::open(device, *baud)?),
    };
    info!("Opened transport: {}", transport.describe());
    Ok(transport)
}

/// Ports and devices available for `--output` and `--input`
#[derive(Debug, Default)]
pub struct PortListing {
    pub sequencer_outputs: Vec<String>,
    pub sequencer_inputs: Vec<String>,
    pub raw_devices: Vec<String>,
}

pub fn list_ports() -> PortListing {
    let (sequencer_outputs, sequencer_inputs) = list_sequencer_ports();
    PortListing {
        sequencer_outputs,
        sequencer_inputs,
        raw_devices: list_raw_devices(),
    }
}
