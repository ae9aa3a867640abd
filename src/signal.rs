use crate::error::{Error, Result};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide request to stop sampling early.
///
/// Cloning shares the same flag. The handler installed by [`AbortSignal::install`]
/// does nothing but raise it; the sampler checks it between steps.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    raised: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal raised by SIGINT and SIGTERM
    pub fn install() -> Result<Self> {
        let signal = AbortSignal::new();
        let handler_flag = signal.raised.clone();
        ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
            .map_err(|e| Error::Signal(e.to_string()))?;
        info!("Installed SIGINT/SIGTERM handler");
        Ok(signal)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
