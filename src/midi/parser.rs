use super::MidiMessage;

/// Incremental decoder for raw MIDI byte streams.
///
/// Tracks running status, lets realtime bytes pass through the middle of a
/// message, and drops running status on system common and sysex bytes.
#[derive(Debug, Default)]
pub struct StreamParser {
    status: u8,
    data: [u8; 2],
    len: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte, returning a message once it is complete
    pub fn feed(&mut self, byte: u8) -> Option<MidiMessage> {
        if byte >= 0xF8 {
            return MidiMessage::parse(&[byte]);
        }

        if byte & 0x80 != 0 {
            self.len = 0;
            // System common and sysex cancel running status
            self.status = if byte >= 0xF0 { 0 } else { byte };
            return None;
        }

        if self.status == 0 {
            return None;
        }

        self.data[self.len] = byte;
        self.len += 1;
        if self.len < data_length(self.status) {
            return None;
        }

        self.len = 0;
        let expected = data_length(self.status);
        let mut message = [self.status, 0, 0];
        message[1..=expected].copy_from_slice(&self.data[..expected]);
        MidiMessage::parse(&message[..=expected])
    }
}

fn data_length(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}
