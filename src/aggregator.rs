//! Statistics and histogram over a finished sample set

use crate::config::{Precision, PASS_THRESHOLD_NS};
use log::info;

/// Fixed-width latency histogram.
///
/// Bucket `i` counts delays that round to `i * bucket_width_ns`. Delays past
/// the last bucket land in the last bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    buckets: Vec<u64>,
    bucket_width_ns: u64,
}

impl Histogram {
    pub fn new(precision: Precision) -> Self {
        Histogram {
            buckets: vec![0; precision.bucket_count()],
            bucket_width_ns: precision.bucket_width_ns(),
        }
    }

    /// Bucket index for a delay, rounded half up and clamped to the top bucket
    pub fn index_for(&self, delay_ns: u64) -> usize {
        let index = delay_ns.saturating_add(self.bucket_width_ns / 2) / self.bucket_width_ns;
        usize::try_from(index)
            .unwrap_or(usize::MAX)
            .min(self.buckets.len() - 1)
    }

    pub fn record(&mut self, delay_ns: u64) {
        let index = self.index_for(delay_ns);
        self.buckets[index] += 1;
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    pub fn bucket_width_ns(&self) -> u64 {
        self.bucket_width_ns
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }

    /// Count of the fullest bucket
    pub fn peak(&self) -> u64 {
        self.buckets.iter().copied().max().unwrap_or(0)
    }

    /// Non-empty buckets as `(index, count)`, in ascending order
    pub fn populated(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.buckets
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, count)| count > 0)
    }
}

/// Min, mean and max over the non-skipped samples, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub min_ns: u64,
    pub mean_ns: u64,
    pub max_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Worst latency at or below 6 ms
    Pass,
    /// Worst latency above 6 ms
    Fail,
    /// Every delay was zero; the clock cannot resolve the roundtrip
    NoDelayMeasured,
    /// No samples remained after skipping
    NoMeasurements,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }

    /// True for the outcomes where no pass/fail decision could be made
    pub fn is_degenerate(self) -> bool {
        matches!(self, Verdict::NoDelayMeasured | Verdict::NoMeasurements)
    }

    pub fn for_max_delay(max_ns: u64) -> Self {
        if max_ns <= PASS_THRESHOLD_NS {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Everything derived from one sample set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub samples_taken: usize,
    pub skipped: usize,
    pub stats: Option<LatencyStats>,
    pub histogram: Histogram,
    pub verdict: Verdict,
}

impl RunResult {
    /// Number of samples feeding the statistics
    pub fn included(&self) -> usize {
        self.samples_taken - self.skipped
    }
}

/// Builds statistics and the histogram from `delays`, ignoring the first
/// `skip` entries.
pub fn aggregate(delays: &[u64], skip: usize, precision: Precision) -> RunResult {
    let skipped = skip.min(delays.len());
    let included = &delays[skipped..];
    let mut histogram = Histogram::new(precision);

    for &delay in included {
        histogram.record(delay);
    }

    let stats = compute_stats(included);
    let verdict = match stats {
        None => Verdict::NoMeasurements,
        Some(stats) if stats.max_ns == 0 => Verdict::NoDelayMeasured,
        Some(stats) => Verdict::for_max_delay(stats.max_ns),
    };

    info!(
        "Aggregated {} samples ({} skipped): {:?}, {:?}",
        delays.len(),
        skipped,
        stats,
        verdict
    );

    RunResult {
        samples_taken: delays.len(),
        skipped,
        stats,
        histogram,
        verdict,
    }
}

fn compute_stats(included: &[u64]) -> Option<LatencyStats> {
    let min_ns = *included.iter().min()?;
    let max_ns = *included.iter().max()?;
    let sum: u128 = included.iter().map(|&d| u128::from(d)).sum();
    let mean_ns = (sum / included.len() as u128) as u64;
    Some(LatencyStats {
        min_ns,
        mean_ns,
        max_ns,
    })
}
