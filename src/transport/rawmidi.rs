use super::stream::ByteStream;
use super::{Readiness, Transport};
use crate::error::{Error, Result};
use crate::midi::MidiMessage;
use log::info;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::time::Duration;

const RAW_DEVICE_DIR: &str = "/dev/snd";

/// Raw MIDI device nodes, e.g. `/dev/snd/midiC1D0`
pub struct RawMidiTransport {
    stream: ByteStream,
    route: String,
}

impl RawMidiTransport {
    pub fn open(output: &Path, input: &Path) -> Result<Self> {
        let out = OpenOptions::new()
            .write(true)
            .open(output)
            .map_err(|e| {
                Error::setup(
                    "open raw output device",
                    format!("{}: {}", output.display(), e),
                )
            })?;
        let inp = OpenOptions::new()
            .read(true)
            .open(input)
            .map_err(|e| {
                Error::setup("open raw input device", format!("{}: {}", input.display(), e))
            })?;
        info!(
            "Opened raw MIDI devices {} -> {}",
            output.display(),
            input.display()
        );

        Ok(RawMidiTransport {
            stream: ByteStream::new(out, inp),
            route: format!("{} and {}", output.display(), input.display()),
        })
    }
}

impl Transport for RawMidiTransport {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        self.stream.send(msg)
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness> {
        self.stream.wait_readable(timeout)
    }

    fn read_message(&mut self) -> Result<Option<MidiMessage>> {
        self.stream.read_message()
    }

    fn describe(&self) -> String {
        self.route.clone()
    }
}

/// Raw MIDI device nodes present on this system, sorted by path
pub fn list_raw_devices() -> Vec<String> {
    let entries = match fs::read_dir(RAW_DEVICE_DIR) {
        Ok(entries) => entries,
        Err(_) => return vec![],
    };

    let mut devices: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("midi"))
        .map(|entry| entry.path().display().to_string())
        .collect();
    devices.sort();
    devices
}
