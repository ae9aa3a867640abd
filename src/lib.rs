pub mod aggregator;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod midi;
pub mod priority;
pub mod report;
pub mod sampler;
pub mod signal;
pub mod transport;
pub mod ui;

pub use aggregator::{aggregate, Histogram, LatencyStats, RunResult, Verdict};
pub use cli::Args;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Precision, RunConfig, TransportSpec};
pub use error::{Error, Result};
pub use sampler::{NoProgress, ProgressSink, SampleSet, Sampler, StopReason};
pub use signal::AbortSignal;
pub use transport::Transport;
