//! The measurement loop
//!
//! Each iteration optionally sleeps, timestamps, sends one probe, waits for
//! its echo within the timeout and records the difference. Only the
//! transport wait blocks; nothing inside the timed window allocates.

use crate::clock::Clock;
use crate::config::{RunConfig, DELAY_OVERFLOW_NS, MAX_WAIT_MS};
use crate::error::{Error, Result};
use crate::midi::MidiMessage;
use crate::signal::AbortSignal;
use crate::transport::{Readiness, Transport};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::Duration;

/// Timestamps further apart than this are treated as a clock anomaly
const MAX_PLAUSIBLE_DELAY_NS: u64 = 2_000_000_000;

/// Why the sampling loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All requested samples were taken
    Completed,
    /// SIGINT or SIGTERM arrived
    Aborted,
    /// A probe got no matching reply
    NoReply,
    /// Too many replies took at least half the timeout
    GraceExceeded,
}

/// Delays collected by one run, in the order they were measured
#[derive(Debug, Clone)]
pub struct SampleSet {
    delays: Vec<u64>,
    skip: usize,
    best: Option<u64>,
    worst: u64,
    near_timeouts: u32,
    stop: StopReason,
}

impl SampleSet {
    fn with_capacity(capacity: usize, skip: usize) -> Self {
        SampleSet {
            delays: Vec::with_capacity(capacity),
            skip,
            best: None,
            worst: 0,
            near_timeouts: 0,
            stop: StopReason::Completed,
        }
    }

    /// Appends a delay, returning true when it is a new worst case
    fn record(&mut self, delay_ns: u64) -> bool {
        let counted = self.delays.len() >= self.skip;
        self.delays.push(delay_ns);
        if !counted {
            return false;
        }
        self.best = Some(self.best.map_or(delay_ns, |best| best.min(delay_ns)));
        if delay_ns > self.worst {
            self.worst = delay_ns;
            return true;
        }
        false
    }

    /// All delays in nanoseconds, skipped ones included
    pub fn delays(&self) -> &[u64] {
        &self.delays
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Smallest non-skipped delay seen while sampling
    pub fn best(&self) -> Option<u64> {
        self.best
    }

    /// Largest non-skipped delay seen while sampling
    pub fn worst(&self) -> u64 {
        self.worst
    }

    /// Non-skipped delays that reached half the timeout
    pub fn near_timeouts(&self) -> u32 {
        self.near_timeouts
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop
    }
}

/// One recorded sample, as reported to a [`ProgressSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEvent {
    pub index: usize,
    pub delay_ns: u64,
    pub worst_ns: u64,
    pub skipped: bool,
    pub new_worst: bool,
}

/// Receives live progress from the sampling loop
pub trait ProgressSink {
    fn on_sample(&mut self, event: &SampleEvent);

    fn finish(&mut self) {}
}

/// Discards progress; used in terse mode and tests
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_sample(&mut self, _event: &SampleEvent) {}
}

enum Reply {
    Matched,
    Missing,
    Aborted,
}

pub struct Sampler<'a, C: Clock + ?Sized> {
    config: &'a RunConfig,
    clock: &'a C,
    abort: &'a AbortSignal,
    rng: StdRng,
}

impl<'a, C: Clock + ?Sized> Sampler<'a, C> {
    pub fn new(config: &'a RunConfig, clock: &'a C, abort: &'a AbortSignal) -> Self {
        Sampler {
            config,
            clock,
            abort,
            rng: StdRng::from_entropy(),
        }
    }

    /// Makes randomized waits reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Takes up to `config.samples` measurements through `transport`.
    ///
    /// Early stops (abort, missing reply, grace limit) still return the
    /// samples collected so far; only transport failures and a dead
    /// connection are errors.
    pub fn run<T, P>(&mut self, transport: &mut T, progress: &mut P) -> Result<SampleSet>
    where
        T: Transport + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let config = self.config;
        let mut samples = SampleSet::with_capacity(config.samples as usize, config.skip as usize);
        let mut probe = MidiMessage::probe();
        let timeout_ns = config.timeout_ns();
        let near_timeout_ns = config.near_timeout_ns();

        info!(
            "Sampling {} values, skipping {}, timeout {:?}, grace {}",
            config.samples, config.skip, config.timeout, config.grace
        );

        for index in 0..config.samples as usize {
            if config.wait_ms > 0.0 {
                thread::sleep(self.inter_sample_wait());
            }
            if self.abort.is_raised() {
                samples.stop = StopReason::Aborted;
                break;
            }

            let t_send = self.clock.now();
            transport.send(&probe)?;

            match self.await_reply(transport, t_send, timeout_ns)? {
                Reply::Matched => {}
                Reply::Missing => {
                    samples.stop = StopReason::NoReply;
                    break;
                }
                Reply::Aborted => {
                    samples.stop = StopReason::Aborted;
                    break;
                }
            }

            let t_recv = self.clock.now();
            let delay_ns = delay_between(t_send, t_recv);
            let skipped = index < samples.skip;
            let new_worst = samples.record(delay_ns);
            trace!("sample {}: {} ns", index, delay_ns);

            progress.on_sample(&SampleEvent {
                index,
                delay_ns,
                worst_ns: samples.worst,
                skipped,
                new_worst,
            });

            probe.toggle_channel();

            if !skipped && delay_ns >= near_timeout_ns {
                samples.near_timeouts += 1;
                debug!(
                    "Sample {} took {} ns, {} near-timeouts so far",
                    index, delay_ns, samples.near_timeouts
                );
                if config.grace > 0 && samples.near_timeouts >= config.grace {
                    samples.stop = StopReason::GraceExceeded;
                    break;
                }
            }
        }

        progress.finish();
        info!(
            "Sampling stopped after {} samples: {:?}",
            samples.len(),
            samples.stop
        );
        Ok(samples)
    }

    fn inter_sample_wait(&mut self) -> Duration {
        let base_ms = self.config.wait_ms.min(MAX_WAIT_MS);
        let wait_ms = if self.config.random_wait {
            self.rng.gen_range(base_ms..2.0 * base_ms)
        } else {
            base_ms
        };
        Duration::try_from_secs_f64(wait_ms / 1000.0).unwrap_or(Duration::ZERO)
    }

    /// Waits for a Note On echo, discarding anything else that arrives
    fn await_reply<T>(&self, transport: &mut T, t_send: u64, timeout_ns: u64) -> Result<Reply>
    where
        T: Transport + ?Sized,
    {
        let mut received_any = false;
        loop {
            let elapsed = self.clock.now().saturating_sub(t_send);
            let remaining = timeout_ns.saturating_sub(elapsed);
            let waited = if remaining == 0 {
                Ok(Readiness::TimedOut)
            } else {
                transport.wait_readable(Duration::from_nanos(remaining))
            };

            if self.abort.is_raised() {
                return Ok(Reply::Aborted);
            }

            match waited? {
                Readiness::Ready => match transport.read_message()? {
                    Some(msg) if msg.is_probe_reply() => return Ok(Reply::Matched),
                    Some(msg) => {
                        trace!("Ignoring reply {:?}", msg);
                        received_any = true;
                    }
                    None => received_any = true,
                },
                Readiness::TimedOut if received_any => return Ok(Reply::Missing),
                Readiness::TimedOut => {
                    return Err(Error::NoConnection {
                        route: transport.describe(),
                    })
                }
                Readiness::Hangup => return Ok(Reply::Missing),
                Readiness::Interrupted => {}
            }
        }
    }
}

/// Nanoseconds from `t_send` to `t_recv`, or [`DELAY_OVERFLOW_NS`] when the
/// timestamps are implausibly far apart or out of order
pub fn delay_between(t_send: u64, t_recv: u64) -> u64 {
    match t_recv.checked_sub(t_send) {
        Some(delay) if delay <= MAX_PLAUSIBLE_DELAY_NS => delay,
        _ => DELAY_OVERFLOW_NS,
    }
}
