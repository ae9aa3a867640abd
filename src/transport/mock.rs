use super::{Readiness, Transport};
use crate::clock::ManualClock;
use crate::error::{Error, Result};
use crate::midi::MidiMessage;
use crate::signal::AbortSignal;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// One scripted event on the input side
#[derive(Debug, Clone)]
pub enum Step {
    /// `message` arrives `after` the wait started
    Reply { after: Duration, message: MidiMessage },
    /// Nothing arrives; the wait runs out
    Silence,
    /// The input reports an error state
    Hangup,
    /// The abort signal is raised while waiting
    Abort,
    /// The wait itself fails
    WaitError,
}

impl Step {
    /// A Note On echo arriving after `after`
    pub fn echo(after: Duration) -> Self {
        Step::Reply {
            after,
            message: MidiMessage::probe(),
        }
    }
}

/// Deterministic transport that replays a script against a [`ManualClock`].
///
/// Each call to `wait_readable` consumes one step and advances the shared
/// clock by the time that step takes. Once the script runs out every wait
/// times out.
pub struct ScriptedTransport {
    clock: Rc<ManualClock>,
    steps: VecDeque<Step>,
    pending: Option<MidiMessage>,
    abort: Option<AbortSignal>,
    fail_send_at: Option<usize>,
    sent: Vec<MidiMessage>,
}

impl ScriptedTransport {
    pub fn new(clock: Rc<ManualClock>, steps: impl IntoIterator<Item = Step>) -> Self {
        ScriptedTransport {
            clock,
            steps: steps.into_iter().collect(),
            pending: None,
            abort: None,
            fail_send_at: None,
            sent: Vec::new(),
        }
    }

    /// Raise `abort` when an [`Step::Abort`] is reached
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Fail the send of the probe with this 0-based index
    pub fn fail_send_at(mut self, index: usize) -> Self {
        self.fail_send_at = Some(index);
        self
    }

    /// Every message sent so far, in order
    pub fn sent(&self) -> &[MidiMessage] {
        &self.sent
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        if self.fail_send_at == Some(self.sent.len()) {
            return Err(Error::Send("scripted send failure".to_string()));
        }
        self.sent.push(*msg);
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness> {
        if self.pending.is_some() {
            return Ok(Readiness::Ready);
        }
        match self.steps.pop_front().unwrap_or(Step::Silence) {
            Step::Reply { after, message } if after < timeout => {
                self.clock.advance(after);
                self.pending = Some(message);
                Ok(Readiness::Ready)
            }
            Step::Reply { .. } | Step::Silence => {
                self.clock.advance(timeout);
                Ok(Readiness::TimedOut)
            }
            Step::Hangup => Ok(Readiness::Hangup),
            Step::Abort => {
                if let Some(abort) = &self.abort {
                    abort.raise();
                }
                Ok(Readiness::Interrupted)
            }
            Step::WaitError => Err(Error::Wait("scripted wait failure".to_string())),
        }
    }

    fn read_message(&mut self) -> Result<Option<MidiMessage>> {
        Ok(self.pending.take())
    }

    fn describe(&self) -> String {
        "scripted-out and scripted-in".to_string()
    }
}
