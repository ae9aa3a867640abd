use super::{Readiness, Transport};
use crate::error::{Error, Result};
use crate::midi::{MidiMessage, RawMessage};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Duration;

const CLIENT_NAME: &str = "midi-latency-test";

/// Replies queued between the midir callback and the sampler
const REPLY_QUEUE_DEPTH: usize = 256;

/// Sequencer ports reached through midir
pub struct SequencerTransport {
    _input: MidiInputConnection<()>,
    output: MidiOutputConnection,
    rx: Receiver<RawMessage>,
    pending: Option<RawMessage>,
    route: String,
}

impl SequencerTransport {
    /// Connects to the first output and input ports whose names contain the
    /// given strings.
    pub fn connect(output_name: &str, input_name: &str) -> Result<Self> {
        let mut midi_in =
            MidiInput::new(CLIENT_NAME).map_err(|e| Error::setup("open sequencer", e))?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(input_name)
            })
            .ok_or_else(|| {
                Error::setup(
                    "parse input port",
                    format!("no port matches '{}'", input_name),
                )
            })?;
        let in_port_name = midi_in
            .port_name(in_port)
            .map_err(|e| Error::setup("get input port info", e))?;

        let (tx, rx) = bounded(REPLY_QUEUE_DEPTH);
        let input = midi_in
            .connect(
                in_port,
                "midi-latency-test-input",
                move |_stamp, message, _| {
                    if tx.try_send(RawMessage::new(message)).is_err() {
                        warn!("Reply queue full, dropping incoming message");
                    }
                },
                (),
            )
            .map_err(|e| Error::setup("connect input port", e))?;
        info!("Connected input port: {}", in_port_name);

        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| Error::setup("open sequencer", e))?;
        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(output_name)
            })
            .ok_or_else(|| {
                Error::setup(
                    "parse output port",
                    format!("no port matches '{}'", output_name),
                )
            })?;
        let out_port_name = midi_out
            .port_name(out_port)
            .map_err(|e| Error::setup("get output port info", e))?;
        let output = midi_out
            .connect(out_port, "midi-latency-test-output")
            .map_err(|e| Error::setup("connect output port", e))?;
        info!("Connected output port: {}", out_port_name);

        Ok(SequencerTransport {
            _input: input,
            output,
            rx,
            pending: None,
            route: format!("{} and {}", output_name, input_name),
        })
    }
}

impl Transport for SequencerTransport {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        let bytes = msg.to_bytes();
        self.output
            .send(bytes.as_slice())
            .map_err(|e| Error::Send(e.to_string()))
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness> {
        if self.pending.is_some() {
            return Ok(Readiness::Ready);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(raw) => {
                self.pending = Some(raw);
                Ok(Readiness::Ready)
            }
            Err(RecvTimeoutError::Timeout) => Ok(Readiness::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Ok(Readiness::Hangup),
        }
    }

    fn read_message(&mut self) -> Result<Option<MidiMessage>> {
        let raw = match self.pending.take() {
            Some(raw) => raw,
            None => match self.rx.try_recv() {
                Ok(raw) => raw,
                Err(_) => return Ok(None),
            },
        };
        let msg = MidiMessage::parse(raw.as_slice());
        if msg.is_none() {
            debug!("Ignoring unrecognised message {:02X?}", raw.as_slice());
        }
        Ok(msg)
    }

    fn describe(&self) -> String {
        self.route.clone()
    }
}

/// Names of the sequencer output and input ports, in that order
pub fn list_sequencer_ports() -> (Vec<String>, Vec<String>) {
    let mut outputs = Vec::new();
    let mut inputs = Vec::new();

    if let Ok(midi_out) = MidiOutput::new("midi-latency-test-list") {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                outputs.push(name);
            }
        }
    }

    if let Ok(midi_in) = MidiInput::new("midi-latency-test-list") {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                inputs.push(name);
            }
        }
    }

    (outputs, inputs)
}
