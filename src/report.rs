//! Text rendering of a finished run
//!
//! Everything here returns strings so the binary decides where they go.

use crate::aggregator::{Histogram, RunResult, Verdict};
use crate::clock::{format_resolution, is_high_resolution, Clock};
use crate::config::{Precision, RunConfig};
use crate::sampler::{SampleSet, StopReason};
use std::fmt::Write;

/// Width of the fullest histogram bar, in characters
pub const BAR_WIDTH: u64 = 50;

const FAIL_HINTS: &str = "  - if your hardware uses shared IRQs - `watch -n 1 cat /proc/interrupts`
    while running this test to see, which IRQs the OS is using for your midi hardware,

  - if you're running this test on a realtime OS - `uname -a` should contain '-rt',

  - your OS' scheduling priorities - `chrt -p [pidof process name|IRQ-?]`.

 Have a look at
  http://www.linuxaudio.org/mailarchive/lat/
 to find out, howto fix issues with high midi latencies.
";

pub fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

/// Scales `count` against the fullest bucket, never below one character
pub fn bar_width(count: u64, peak: u64) -> u64 {
    if peak == 0 || count == 0 {
        return 0;
    }
    ((count * BAR_WIDTH + peak / 2) / peak).max(1)
}

/// One line per populated bucket, `...` marking skipped empty buckets.
///
/// Bucket labels use as many decimals as the precision level.
pub fn render_histogram(histogram: &Histogram, precision: Precision) -> String {
    let peak = histogram.peak();
    let decimals = usize::from(precision.level());
    let field = decimals + 4;
    let width_ms = ns_to_ms(histogram.bucket_width_ns());

    let mut out = String::new();
    let mut next_expected = 0;
    for (index, count) in histogram.populated() {
        if index > next_expected {
            out.push_str("...\n");
        }
        next_expected = index + 1;

        let lower = index as f64 * width_ms;
        let upper = lower + width_ms * 0.9;
        let _ = write!(
            out,
            "{:>field$.decimals$} -{:>field$.decimals$} ms: {:>8} ",
            lower,
            upper,
            count,
            field = field,
            decimals = decimals
        );
        for _ in 0..bar_width(count, peak) {
            out.push('#');
        }
        out.push('\n');
    }
    out
}

/// Verdict block printed after the histogram
pub fn render_verdict(result: &RunResult) -> String {
    let stats = match (result.verdict, result.stats) {
        (Verdict::NoMeasurements, _) | (_, None) => return "(no measurements)\n".to_string(),
        (Verdict::NoDelayMeasured, _) => {
            return "no delay was measured; clock has too low resolution\n".to_string()
        }
        (_, Some(stats)) => stats,
    };

    let best = ns_to_ms(stats.min_ns);
    let worst = ns_to_ms(stats.max_ns);
    if result.verdict.is_pass() {
        format!(
            "\n> SUCCESS\n\n best latency was {:.2} ms\n worst latency was {:.2} ms, which is great.\n",
            best, worst
        )
    } else {
        format!(
            "\n> FAIL\n\n best latency was {:.2} ms\n worst latency was {:.2} ms, which is too much. Please check:\n\n{}",
            best, worst, FAIL_HINTS
        )
    }
}

/// Clock resolution line for the run header, with a warning when the clock
/// is too coarse to resolve MIDI roundtrips
pub fn clock_header<C: Clock + ?Sized>(clock: &C) -> String {
    let resolution = clock.resolution();
    let mut out = format!("> clock resolution: {}\n", format_resolution(resolution));
    if !is_high_resolution(resolution) {
        out.push_str("WARNING: You do not have a high-resolution clock!\n");
    }
    out
}

/// Explains an early stop, `None` when every sample was taken
pub fn stop_message(samples: &SampleSet, requested: u32) -> Option<String> {
    match samples.stop_reason() {
        StopReason::Completed => None,
        StopReason::Aborted => Some(format!(
            "> aborted after {} of {} samples",
            samples.len(),
            requested
        )),
        StopReason::NoReply => Some(format!(
            "> no matching reply to sample {}, stopping early",
            samples.len()
        )),
        StopReason::GraceExceeded => Some(format!(
            "> stopping early: {} samples took at least half the timeout (grace limit reached)",
            samples.near_timeouts()
        )),
    }
}

/// The one-line machine readable summary:
/// `samples, realtime, priority, skip, wait_ms, random, min_ms, mean_ms, max_ms`
pub fn terse_line(config: &RunConfig, result: &RunResult) -> String {
    let (min, mean, max) = result
        .stats
        .map(|s| (ns_to_ms(s.min_ns), ns_to_ms(s.mean_ns), ns_to_ms(s.max_ns)))
        .unwrap_or((0.0, 0.0, 0.0));
    format!(
        "{}, {}, {}, {}, {:.3}, {}, {:.3}, {:.3}, {:.3}",
        result.samples_taken,
        u8::from(config.realtime),
        config.priority,
        config.skip,
        config.wait_ms,
        u8::from(config.random_wait),
        min,
        mean,
        max
    )
}

/// Histogram and verdict as printed in verbose mode
pub fn render_report(result: &RunResult, precision: Precision) -> String {
    let mut out = String::from("\n> latency distribution:\n");
    if !result.verdict.is_degenerate() {
        out.push_str(&render_histogram(&result.histogram, precision));
    }
    out.push_str(&render_verdict(result));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_rounds_and_has_minimum() {
        assert_eq!(bar_width(100, 100), 50);
        assert_eq!(bar_width(1, 1000), 1);
        assert_eq!(bar_width(50, 100), 25);
        assert_eq!(bar_width(0, 100), 0);
    }

    #[test]
    fn test_ns_to_ms() {
        assert_eq!(ns_to_ms(6_000_000), 6.0);
        assert_eq!(ns_to_ms(250_000), 0.25);
    }
}
