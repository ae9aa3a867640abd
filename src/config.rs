// config.rs

use std::path::PathBuf;
use std::time::Duration;

/// Roundtrip latency above this fails the run (6 ms)
pub const PASS_THRESHOLD_NS: u64 = 6_000_000;

/// Histogram bucket width at precision 1 (0.1 ms)
pub const BASE_BUCKET_WIDTH_NS: u64 = 100_000;

/// Bucket count at precision 1, covering 100 ms
pub const HISTOGRAM_BASE_BUCKETS: usize = 1000;

/// Upper bound on histogram size at any precision
pub const MAX_HISTOGRAM_BUCKETS: usize = 1_000_000;

/// Recorded in place of a delay when the two timestamps are more than
/// two seconds apart.
pub const DELAY_OVERFLOW_NS: u64 = u32::MAX as u64;

pub const DEFAULT_SAMPLES: u32 = 10_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_BAUD: u32 = 38_400;

/// Longest inter-sample wait accepted on the command line (one day)
pub const MAX_WAIT_MS: f64 = 86_400_000.0;

/// Longest reply timeout whose nanosecond value still fits in a `u64`
pub const MAX_TIMEOUT_MS: u64 = u64::MAX / 1_000_000;

/// Histogram resolution, 1 (0.1 ms buckets) through 6 (1 ns buckets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision(u8);

impl Precision {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Precision(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// 1, 10, 100, ... 100000
    pub fn multiplier(self) -> u64 {
        10u64.pow(u32::from(self.0 - 1))
    }

    pub fn bucket_width_ns(self) -> u64 {
        BASE_BUCKET_WIDTH_NS / self.multiplier()
    }

    pub fn bucket_count(self) -> usize {
        let wanted = HISTOGRAM_BASE_BUCKETS.saturating_mul(self.multiplier() as usize);
        wanted.min(MAX_HISTOGRAM_BUCKETS)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision(1)
    }
}

/// Which transport carries the probes, resolved once from the command line
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSpec {
    /// Sequencer ports, matched by name
    Sequencer { output: String, input: String },
    /// Raw MIDI device nodes
    Raw { output: PathBuf, input: PathBuf },
    /// A serial line used for both directions
    Serial { device: PathBuf, baud: u32 },
}

/// Settings for one run. Built once and never mutated while sampling.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub samples: u32,
    pub skip: u32,
    pub wait_ms: f64,
    pub random_wait: bool,
    pub timeout: Duration,
    pub grace: u32,
    pub precision: Precision,
    pub verbose: bool,
    pub realtime: bool,
    pub priority: i32,
    pub transport: TransportSpec,
}

impl RunConfig {
    /// Default settings against the given transport
    pub fn new(transport: TransportSpec) -> Self {
        RunConfig {
            samples: DEFAULT_SAMPLES,
            skip: 0,
            wait_ms: 0.0,
            random_wait: false,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            grace: 0,
            precision: Precision::default(),
            verbose: true,
            realtime: false,
            priority: 0,
            transport,
        }
    }

    /// Delays at or above this count towards the grace limit
    pub fn near_timeout_ns(&self) -> u64 {
        self.timeout_ns() / 2
    }

    /// Reply timeout in nanoseconds, saturating at `u64::MAX`
    pub fn timeout_ns(&self) -> u64 {
        u64::try_from(self.timeout.as_nanos()).unwrap_or(u64::MAX)
    }
}
