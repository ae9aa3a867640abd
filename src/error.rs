use thiserror::Error;

/// Errors that end a latency run.
///
/// Every variant is fatal: a run that hits one of these has no trustworthy
/// latency data left to report. Early stops that still leave usable samples
/// (abort, grace limit, missing reply) are reported through
/// [`crate::sampler::StopReason`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, connecting or configuring a transport failed
    #[error("cannot {operation} - {cause}")]
    Setup {
        operation: &'static str,
        cause: String,
    },
    /// The probe could not be transmitted
    #[error("cannot output MIDI event - {0}")]
    Send(String),
    /// Waiting for the input port failed
    #[error("poll error: {0}")]
    Wait(String),
    /// Reading a reply from the input port failed
    #[error("cannot input MIDI event - {0}")]
    Receive(String),
    /// Nothing at all arrived within the timeout
    #[error("timeout: there seems to be no connection between ports {route}")]
    NoConnection { route: String },
    /// A required port was not given on the command line
    #[error("Please specify an {direction} port with --{direction}.  Use -l to get a list.")]
    MissingPort { direction: &'static str },
    /// Installing the abort handler failed
    #[error("cannot install signal handler - {0}")]
    Signal(String),
}

impl Error {
    pub fn setup(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Error::Setup {
            operation,
            cause: cause.to_string(),
        }
    }
}

/// Result type for latency test operations
pub type Result<T> = std::result::Result<T, Error>;
