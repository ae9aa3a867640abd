/// Represents a MIDI message that can be sent or received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On message with note number and velocity
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off message with note number and velocity
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change message with controller number and value
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// Program Change message with program number
    ProgramChange { channel: u8, program: u8 },
    /// MIDI Clock timing message
    Clock,
    /// MIDI Start message
    Start,
    /// MIDI Stop message
    Stop,
    /// MIDI Continue message
    Continue,
}

/// Note played by the probe (middle C)
pub const PROBE_NOTE: u8 = 60;
pub const PROBE_VELOCITY: u8 = 127;

impl MidiMessage {
    /// The outbound test message
    pub fn probe() -> Self {
        MidiMessage::NoteOn {
            channel: 0,
            note: PROBE_NOTE,
            velocity: PROBE_VELOCITY,
        }
    }

    /// Whether a received message acknowledges a probe
    pub fn is_probe_reply(&self) -> bool {
        matches!(self, MidiMessage::NoteOn { .. })
    }

    /// Flips the lowest channel bit so consecutive probes are never
    /// byte-identical and cannot be merged by running status.
    pub fn toggle_channel(&mut self) {
        match self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. } => *channel ^= 1,
            _ => {}
        }
    }

    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        if data.is_empty() {
            return None;
        }

        match data[0] & 0xF0 {
            0x90 if data.len() >= 3 => Some(MidiMessage::NoteOn {
                channel: data[0] & 0x0F,
                note: data[1],
                velocity: data[2],
            }),
            0x80 if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel: data[0] & 0x0F,
                note: data[1],
                velocity: data[2],
            }),
            0xB0 if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel: data[0] & 0x0F,
                controller: data[1],
                value: data[2],
            }),
            0xC0 if data.len() >= 2 => Some(MidiMessage::ProgramChange {
                channel: data[0] & 0x0F,
                program: data[1],
            }),
            0xF0 => match data[0] {
                0xF8 => Some(MidiMessage::Clock),
                0xFA => Some(MidiMessage::Start),
                0xFC => Some(MidiMessage::Stop),
                0xFB => Some(MidiMessage::Continue),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> RawMessage {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => RawMessage::new(&[0x90 | (channel & 0x0F), note, velocity]),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => RawMessage::new(&[0x80 | (channel & 0x0F), note, velocity]),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => RawMessage::new(&[0xB0 | (channel & 0x0F), controller, value]),
            MidiMessage::ProgramChange { channel, program } => {
                RawMessage::new(&[0xC0 | (channel & 0x0F), program])
            }
            MidiMessage::Clock => RawMessage::new(&[0xF8]),
            MidiMessage::Start => RawMessage::new(&[0xFA]),
            MidiMessage::Stop => RawMessage::new(&[0xFC]),
            MidiMessage::Continue => RawMessage::new(&[0xFB]),
        }
    }
}

/// Up to three bytes of a short MIDI message, stored inline.
///
/// Longer input (sysex) is truncated; only the status and the first two
/// data bytes matter for matching replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawMessage {
    bytes: [u8; 3],
    len: u8,
}

impl RawMessage {
    pub fn new(data: &[u8]) -> Self {
        let len = data.len().min(3);
        let mut bytes = [0u8; 3];
        bytes[..len].copy_from_slice(&data[..len]);
        RawMessage {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }
}
