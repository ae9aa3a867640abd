use super::Readiness;
use crate::error::{Error, Result};
use crate::midi::{MidiMessage, StreamParser};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

const READ_CHUNK: usize = 64;

/// Byte-stream plumbing shared by the raw MIDI and serial transports.
///
/// Bytes read from the input are buffered inline and decoded one message at
/// a time, so buffered bytes are drained before the descriptor is polled
/// again.
pub struct ByteStream {
    output: File,
    input: File,
    parser: StreamParser,
    buf: [u8; READ_CHUNK],
    pos: usize,
    len: usize,
}

impl ByteStream {
    pub fn new(output: File, input: File) -> Self {
        ByteStream {
            output,
            input,
            parser: StreamParser::new(),
            buf: [0; READ_CHUNK],
            pos: 0,
            len: 0,
        }
    }

    pub fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        let bytes = msg.to_bytes();
        self.output
            .write_all(bytes.as_slice())
            .and_then(|_| self.output.flush())
            .map_err(|e| Error::Send(e.to_string()))
    }

    pub fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness> {
        if self.pos < self.len {
            return Ok(Readiness::Ready);
        }

        let mut fds = [libc::pollfd {
            fd: self.input.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        // Round up so a sub-millisecond remainder still waits
        let timeout_ms = ((timeout.as_nanos() + 999_999) / 1_000_000).min(i32::MAX as u128)
            as libc::c_int;
        // SAFETY: `fds` is a valid array of one pollfd for the duration of the call.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, timeout_ms) };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Readiness::Interrupted);
            }
            return Err(Error::Wait(err.to_string()));
        }
        if rc == 0 {
            return Ok(Readiness::TimedOut);
        }

        let revents = fds[0].revents;
        if revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
            return Ok(Readiness::Hangup);
        }
        if revents & libc::POLLIN != 0 {
            return Ok(Readiness::Ready);
        }
        if revents & libc::POLLHUP != 0 {
            return Ok(Readiness::Hangup);
        }
        Ok(Readiness::Interrupted)
    }

    pub fn read_message(&mut self) -> Result<Option<MidiMessage>> {
        if self.pos >= self.len {
            let n = self
                .input
                .read(&mut self.buf)
                .map_err(|e| Error::Receive(e.to_string()))?;
            self.pos = 0;
            self.len = n;
        }

        while self.pos < self.len {
            let byte = self.buf[self.pos];
            self.pos += 1;
            if let Some(msg) = self.parser.feed(byte) {
                return Ok(Some(msg));
            }
        }
        Ok(None)
    }
}
