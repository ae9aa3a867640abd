use super::stream::ByteStream;
use super::{Readiness, Transport};
use crate::error::{Error, Result};
use crate::midi::MidiMessage;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::Duration;

/// A serial line used as a MIDI UART in both directions
pub struct SerialTransport {
    stream: ByteStream,
    route: String,
}

impl SerialTransport {
    pub fn open(device: &Path, baud: u32) -> Result<Self> {
        let speed = baud_constant(baud).ok_or_else(|| {
            Error::setup("configure serial line", format!("unsupported baud rate {}", baud))
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(device)
            .map_err(|e| {
                Error::setup("open serial device", format!("{}: {}", device.display(), e))
            })?;
        configure_raw(&file, speed).map_err(|e| Error::setup("configure serial line", e))?;
        debug!("Configured {} for raw mode at {} baud", device.display(), baud);

        let input = file
            .try_clone()
            .map_err(|e| Error::setup("open serial device", e))?;
        info!("Opened serial MIDI device {}", device.display());

        Ok(SerialTransport {
            stream: ByteStream::new(file, input),
            route: format!("{} and {}", device.display(), device.display()),
        })
    }
}

impl Transport for SerialTransport {
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

fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    match baud {
        9600 => Some(libc::B9600),
        19200 => Some(libc::B19200),
        38400 => Some(libc::B38400),
        57600 => Some(libc::B57600),
        115200 => Some(libc::B115200),
        _ => None,
    }
}

fn configure_raw(file: &File, speed: libc::speed_t) -> io::Result<()> {
    let fd = file.as_raw_fd();
    // SAFETY: termios is plain data, fully overwritten by tcgetattr below.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` stays open for the lifetime of `file` and `tio` is a valid termios.
    unsafe {
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut tio);
        tio.c_cflag |= libc::CLOCAL | libc::CREAD;
        tio.c_cc[libc::VMIN] = 1;
        tio.c_cc[libc::VTIME] = 0;
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(io::Error::last_os_error());
        }
        libc::tcflush(fd, libc::TCIOFLUSH);
    }
    Ok(())
}
