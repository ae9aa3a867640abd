// clock.rs

use log::warn;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Resolution coarser than this cannot resolve MIDI roundtrips
pub const HIGH_RESOLUTION_LIMIT: Duration = Duration::from_millis(1);

/// Monotonic time source used to bound and measure each roundtrip
pub trait Clock {
    /// Nanoseconds since an arbitrary, fixed origin
    fn now(&self) -> u64;

    fn resolution(&self) -> Duration;
}

/// The system monotonic clock
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn resolution(&self) -> Duration {
        let mut res = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `res` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_getres(libc::CLOCK_MONOTONIC, &mut res) };
        if rc != 0 {
            warn!("clock_getres(CLOCK_MONOTONIC) failed, assuming 1 ns resolution");
            return Duration::from_nanos(1);
        }
        Duration::new(res.tv_sec as u64, res.tv_nsec as u32)
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    resolution: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Cell::new(0),
            resolution: Duration::from_nanos(1),
        }
    }

    pub fn with_resolution(resolution: Duration) -> Self {
        ManualClock {
            now: Cell::new(0),
            resolution,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_nanos() as u64);
    }

    pub fn set(&self, nanos: u64) {
        self.now.set(nanos);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }

    fn resolution(&self) -> Duration {
        self.resolution
    }
}

pub fn is_high_resolution(resolution: Duration) -> bool {
    resolution <= HIGH_RESOLUTION_LIMIT
}

/// Formats a resolution the way the run header prints it, e.g. `0.000000001 s`
pub fn format_resolution(resolution: Duration) -> String {
    format!("{}.{:09} s", resolution.as_secs(), resolution.subsec_nanos())
}
