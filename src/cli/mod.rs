use crate::config::{
    Precision, RunConfig, TransportSpec, DEFAULT_BAUD, DEFAULT_SAMPLES, DEFAULT_TIMEOUT_MS,
    MAX_TIMEOUT_MS, MAX_WAIT_MS,
};
use crate::error::{Error, Result};
use crate::priority::{clamp_priority, priority_range};
use crate::transport::PortListing;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Measures MIDI roundtrip latency between an output and an input port",
    long_about = None
)]
pub struct Args {
    /// Port to send events to (sequencer port name, or device path with --raw)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Port to receive events from (sequencer port name, or device path with --raw)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Treat --output and --input as raw MIDI device paths
    #[arg(short, long)]
    pub raw: bool,

    /// Use this serial device as a MIDI UART for both directions
    #[arg(short, long, value_name = "DEVICE")]
    pub uart: Option<PathBuf>,

    /// Serial line speed, used with --uart
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// List available MIDI input/output ports
    #[arg(short, long)]
    pub list: bool,

    /// Use realtime scheduling
    #[arg(short = 'R', long)]
    pub realtime: bool,

    /// Scheduling priority, use with -R (default: maximum)
    #[arg(short = 'P', long, allow_negative_numbers = true)]
    pub priority: Option<i32>,

    /// Number of samples to take for the measurement
    #[arg(
        short = 'S',
        long,
        default_value_t = i64::from(DEFAULT_SAMPLES),
        allow_negative_numbers = true
    )]
    pub samples: i64,

    /// Number of samples to skip at the beginning
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub skip: i64,

    /// Milliseconds to wait between samples
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub wait: f64,

    /// Wait a random time between --wait and twice --wait
    #[arg(short = 'x', long)]
    pub random_wait: bool,

    /// Milliseconds to wait for each reply
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS as i64, allow_negative_numbers = true)]
    pub timeout: i64,

    /// Stop after this many replies took at least half the timeout (0 = never)
    #[arg(short, long, default_value_t = 0)]
    pub grace: u32,

    /// Histogram resolution, 1 (0.1 ms) to 6 (0.000001 ms)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=6))]
    pub precision: u8,

    /// Print a single comma separated summary line instead of the report
    #[arg(short = 'q', long)]
    pub terse: bool,
}

impl Args {
    /// Resolves the arguments into a run configuration.
    ///
    /// Out-of-range numbers are clamped rather than rejected; each
    /// adjustment is returned as a warning.
    pub fn into_run_config(self) -> Result<(RunConfig, Vec<String>)> {
        let mut warnings = Vec::new();
        let transport = self.transport_spec()?;
        debug!("Resolved transport: {:?}", transport);

        let samples = if self.samples <= 0 {
            warnings.push(
                "Given number of samples to take is less or equal zero! Setting nr of samples to take to 1."
                    .to_string(),
            );
            1
        } else {
            u32::try_from(self.samples).unwrap_or(u32::MAX)
        };

        let skip = if self.skip < 0 {
            warnings.push(
                "Given number of events to skip cannot be smaller than zero! Setting nr of skip events to zero."
                    .to_string(),
            );
            0
        } else {
            u32::try_from(self.skip).unwrap_or(u32::MAX)
        };

        let wait_ms = if self.wait < 0.0 || self.wait.is_nan() {
            warnings.push(
                "Given wait time is not a positive number! Not waiting between samples.".to_string(),
            );
            0.0
        } else if self.wait > MAX_WAIT_MS {
            warnings.push(format!(
                "Given wait time is too large! Setting wait time to {} ms.",
                MAX_WAIT_MS
            ));
            MAX_WAIT_MS
        } else {
            self.wait
        };

        let timeout_ms = if self.timeout < 1 {
            warnings
                .push("Given timeout is smaller than 1 ms! Setting timeout to 1 ms.".to_string());
            1
        } else if self.timeout as u64 > MAX_TIMEOUT_MS {
            warnings.push(format!(
                "Given timeout is too large! Setting timeout to {} ms.",
                MAX_TIMEOUT_MS
            ));
            MAX_TIMEOUT_MS
        } else {
            self.timeout as u64
        };

        let range = priority_range();
        let priority = match self.priority {
            Some(requested) => {
                let (priority, warning) = clamp_priority(requested, range);
                warnings.extend(warning);
                priority
            }
            None => range.1,
        };

        let precision = Precision::new(self.precision).unwrap_or_default();

        let config = RunConfig {
            samples,
            skip,
            wait_ms,
            random_wait: self.random_wait,
            timeout: Duration::from_millis(timeout_ms),
            grace: self.grace,
            precision,
            verbose: !self.terse,
            realtime: self.realtime,
            priority,
            transport,
        };
        info!("Run configuration: {:?}", config);
        Ok((config, warnings))
    }

    /// UART wins over raw devices, raw devices over sequencer ports
    fn transport_spec(&self) -> Result<TransportSpec> {
        if let Some(device) = &self.uart {
            return Ok(TransportSpec::Serial {
                device: device.clone(),
                baud: self.baud,
            });
        }

        let output = self
            .output
            .clone()
            .ok_or(Error::MissingPort { direction: "output" })?;
        let input = self
            .input
            .clone()
            .ok_or(Error::MissingPort { direction: "input" })?;

        if self.raw {
            Ok(TransportSpec::Raw {
                output: PathBuf::from(output),
                input: PathBuf::from(input),
            })
        } else {
            Ok(TransportSpec::Sequencer { output, input })
        }
    }
}

/// Text printed for `--list`
pub fn format_port_listing(listing: &PortListing) -> String {
    let mut out = String::new();
    let sections = [
        ("Sequencer output ports:", &listing.sequencer_outputs),
        ("Sequencer input ports:", &listing.sequencer_inputs),
        ("Raw MIDI devices:", &listing.raw_devices),
    ];
    for (title, entries) in sections {
        out.push_str(title);
        out.push('\n');
        if entries.is_empty() {
            out.push_str("  (none)\n");
        }
        for entry in entries {
            out.push_str(&format!("  - {}\n", entry));
        }
    }
    out
}
