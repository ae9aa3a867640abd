use crate::report::ns_to_ms;
use crate::sampler::{ProgressSink, SampleEvent};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt::Write;

/// Room for one worst-case line, reserved up front
const LINE_CAPACITY: usize = 64;

/// Live view of the sampling loop.
///
/// Shows a bar over the requested sample count and logs a
/// `sample; latency_ms; latency_ms_worst` line every time the worst case grows.
pub struct SampleProgress {
    bar: ProgressBar,
    line: String,
}

impl SampleProgress {
    pub fn new(total: u64) -> Self {
        Self::with_draw_target(total, ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(total: u64, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), target);
        let style = ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ ");
        bar.set_style(style);
        bar.set_prefix("Sampling");
        bar.println("\nsample; latency_ms; latency_ms_worst");
        SampleProgress {
            bar,
            line: String::with_capacity(LINE_CAPACITY),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for SampleProgress {
    fn on_sample(&mut self, event: &SampleEvent) {
        self.bar.inc(1);
        if event.new_worst {
            write_worst_line(&mut self.line, event);
            self.bar.println(&self.line);
        }
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Formats `sample; latency_ms; latency_ms_worst` into `line`, reusing its buffer
fn write_worst_line(line: &mut String, event: &SampleEvent) {
    line.clear();
    // Writing to a String cannot fail
    let _ = write!(
        line,
        "{:6}; {:10.2}; {:10.2}",
        event.index,
        ns_to_ms(event.delay_ns),
        ns_to_ms(event.worst_ns)
    );
}
