use midi_latency_test::midi::MidiMessage;
use midi_latency_test::sampler::SampleEvent;
use midi_latency_test::transport::{ScriptedTransport, Step};
use midi_latency_test::{
    AbortSignal, Error, ManualClock, NoProgress, ProgressSink, RunConfig, SampleSet, Sampler,
    StopReason, TransportSpec,
};
use std::rc::Rc;
use std::time::Duration;

fn config(samples: u32) -> RunConfig {
    let mut config = RunConfig::new(TransportSpec::Sequencer {
        output: "out".to_string(),
        input: "in".to_string(),
    });
    config.samples = samples;
    config
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn run_script(
    config: &RunConfig,
    steps: Vec<Step>,
) -> (Result<SampleSet, Error>, ScriptedTransport) {
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    let mut transport = ScriptedTransport::new(clock.clone(), steps).with_abort(abort.clone());
    let result = Sampler::new(config, &*clock, &abort).run(&mut transport, &mut NoProgress);
    (result, transport)
}

#[test]
fn test_collects_every_requested_sample() {
    let steps = (1..=5).map(|n| Step::echo(ms(n))).collect();
    let (result, _) = run_script(&config(5), steps);
    let samples = result.unwrap();

    assert_eq!(samples.stop_reason(), StopReason::Completed);
    assert_eq!(
        samples.delays(),
        &[1_000_000, 2_000_000, 3_000_000, 4_000_000, 5_000_000]
    );
    assert_eq!(samples.best(), Some(1_000_000));
    assert_eq!(samples.worst(), 5_000_000);
}

#[test]
fn test_skipped_samples_are_still_collected() {
    let mut config = config(5);
    config.skip = 2;
    let steps = (1..=5).map(|n| Step::echo(ms(n))).collect();
    let (result, _) = run_script(&config, steps);
    let samples = result.unwrap();

    assert_eq!(samples.len(), 5);
    assert_eq!(samples.skip(), 2);
    assert_eq!(samples.best(), Some(3_000_000));
}

#[test]
fn test_unmatched_reply_ends_run_early() {
    let steps = vec![
        Step::echo(ms(1)),
        Step::echo(ms(1)),
        Step::Reply {
            after: ms(1),
            message: MidiMessage::NoteOff {
                channel: 0,
                note: 60,
                velocity: 0,
            },
        },
        Step::Silence,
    ];
    let (result, transport) = run_script(&config(10), steps);
    let samples = result.unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples.stop_reason(), StopReason::NoReply);
    assert_eq!(transport.sent().len(), 3);
}

#[test]
fn test_non_matching_messages_are_skipped_within_timeout() {
    let steps = vec![
        Step::Reply {
            after: ms(1),
            message: MidiMessage::Clock,
        },
        Step::echo(ms(2)),
    ];
    let (result, _) = run_script(&config(1), steps);
    let samples = result.unwrap();

    assert_eq!(samples.delays(), &[3_000_000]);
    assert_eq!(samples.stop_reason(), StopReason::Completed);
}

#[test]
fn test_grace_limit_stops_run() {
    let mut config = config(10);
    config.grace = 2;
    config.timeout = ms(1000);
    let steps = vec![
        Step::echo(ms(600)),
        Step::echo(ms(1)),
        Step::echo(ms(500)),
        Step::echo(ms(1)),
    ];
    let (result, _) = run_script(&config, steps);
    let samples = result.unwrap();

    assert_eq!(samples.len(), 3);
    assert_eq!(samples.near_timeouts(), 2);
    assert_eq!(samples.stop_reason(), StopReason::GraceExceeded);
}

#[test]
fn test_grace_disabled_counts_but_never_stops() {
    let mut config = config(3);
    config.timeout = ms(1000);
    let steps = vec![Step::echo(ms(700)), Step::echo(ms(800)), Step::echo(ms(900))];
    let (result, _) = run_script(&config, steps);
    let samples = result.unwrap();

    assert_eq!(samples.stop_reason(), StopReason::Completed);
    assert_eq!(samples.near_timeouts(), 3);
}

#[test]
fn test_skipped_slow_samples_do_not_count_towards_grace() {
    let mut config = config(3);
    config.skip = 1;
    config.grace = 1;
    let steps = vec![Step::echo(ms(600)), Step::echo(ms(1)), Step::echo(ms(1))];
    let (result, _) = run_script(&config, steps);
    let samples = result.unwrap();

    assert_eq!(samples.stop_reason(), StopReason::Completed);
    assert_eq!(samples.near_timeouts(), 0);
}

#[test]
fn test_silence_means_no_connection() {
    let steps = vec![Step::echo(ms(1)), Step::Silence];
    let (result, _) = run_script(&config(5), steps);

    match result {
        Err(Error::NoConnection { route }) => assert_eq!(route, "scripted-out and scripted-in"),
        other => panic!("Expected NoConnection, got {:?}", other),
    }
}

#[test]
fn test_reply_after_timeout_means_no_connection() {
    let steps = vec![Step::echo(ms(1500))];
    let (result, _) = run_script(&config(1), steps);
    assert!(matches!(result, Err(Error::NoConnection { .. })));
}

#[test]
fn test_abort_while_waiting_keeps_collected_samples() {
    let steps = vec![Step::echo(ms(1)), Step::echo(ms(1)), Step::Abort];
    let (result, _) = run_script(&config(10), steps);
    let samples = result.unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples.stop_reason(), StopReason::Aborted);
}

#[test]
fn test_abort_before_first_sample_sends_nothing() {
    let config = config(10);
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    abort.raise();
    let mut transport = ScriptedTransport::new(clock.clone(), vec![Step::echo(ms(1))]);

    let samples = Sampler::new(&config, &*clock, &abort)
        .run(&mut transport, &mut NoProgress)
        .unwrap();

    assert!(samples.is_empty());
    assert_eq!(samples.stop_reason(), StopReason::Aborted);
    assert!(transport.sent().is_empty());
}

#[test]
fn test_hangup_ends_run_without_error() {
    let steps = vec![Step::echo(ms(1)), Step::Hangup];
    let (result, _) = run_script(&config(5), steps);
    let samples = result.unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples.stop_reason(), StopReason::NoReply);
}

#[test]
fn test_send_failure_is_fatal() {
    let config = config(5);
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    let steps: Vec<Step> = (0..5).map(|_| Step::echo(ms(1))).collect();
    let mut transport = ScriptedTransport::new(clock.clone(), steps).fail_send_at(2);

    let result = Sampler::new(&config, &*clock, &abort).run(&mut transport, &mut NoProgress);
    assert!(matches!(result, Err(Error::Send(_))));
}

#[test]
fn test_wait_failure_is_fatal() {
    let (result, _) = run_script(&config(5), vec![Step::WaitError]);
    assert!(matches!(result, Err(Error::Wait(_))));
}

#[test]
fn test_probe_channel_alternates() {
    let steps = (0..4).map(|_| Step::echo(ms(1))).collect();
    let (result, transport) = run_script(&config(4), steps);
    assert!(result.is_ok());

    let channels: Vec<u8> = transport
        .sent()
        .iter()
        .map(|msg| match msg {
            MidiMessage::NoteOn { channel, .. } => *channel,
            other => panic!("Unexpected probe {:?}", other),
        })
        .collect();
    assert_eq!(channels, vec![0, 1, 0, 1]);
}

#[test]
fn test_random_wait_completes() {
    let mut config = config(3);
    config.wait_ms = 0.01;
    config.random_wait = true;
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    let steps: Vec<Step> = (0..3).map(|_| Step::echo(ms(2))).collect();
    let mut transport = ScriptedTransport::new(clock.clone(), steps);

    let samples = Sampler::new(&config, &*clock, &abort)
        .with_seed(7)
        .run(&mut transport, &mut NoProgress)
        .unwrap();

    assert_eq!(samples.delays(), &[2_000_000, 2_000_000, 2_000_000]);
}

#[derive(Default)]
struct RecordingProgress {
    events: Vec<SampleEvent>,
    finished: bool,
}

impl ProgressSink for RecordingProgress {
    fn on_sample(&mut self, event: &SampleEvent) {
        self.events.push(*event);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn test_progress_reports_new_worst_cases() {
    let mut config = config(4);
    config.skip = 1;
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    let steps = vec![
        Step::echo(ms(9)),
        Step::echo(ms(2)),
        Step::echo(ms(1)),
        Step::echo(ms(3)),
    ];
    let mut transport = ScriptedTransport::new(clock.clone(), steps);
    let mut progress = RecordingProgress::default();

    Sampler::new(&config, &*clock, &abort)
        .run(&mut transport, &mut progress)
        .unwrap();

    assert!(progress.finished);
    let flags: Vec<(bool, bool)> = progress
        .events
        .iter()
        .map(|e| (e.skipped, e.new_worst))
        .collect();
    assert_eq!(
        flags,
        vec![(true, false), (false, true), (false, false), (false, true)]
    );
    assert_eq!(progress.events[3].worst_ns, 3_000_000);
}

/// Raises the abort signal once `after` samples have been recorded
struct AbortAfter {
    abort: AbortSignal,
    after: usize,
}

impl ProgressSink for AbortAfter {
    fn on_sample(&mut self, event: &SampleEvent) {
        if event.index + 1 == self.after {
            self.abort.raise();
        }
    }
}

#[test]
fn test_abort_between_samples_is_seen_after_the_wait() {
    let mut config = config(10);
    config.wait_ms = 0.05;
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();
    let steps: Vec<Step> = (0..10).map(|_| Step::echo(ms(1))).collect();
    let mut transport = ScriptedTransport::new(clock.clone(), steps);
    let mut progress = AbortAfter {
        abort: abort.clone(),
        after: 2,
    };

    let samples = Sampler::new(&config, &*clock, &abort)
        .run(&mut transport, &mut progress)
        .unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples.stop_reason(), StopReason::Aborted);
    assert_eq!(transport.sent().len(), 2);
}

#[test]
fn test_huge_timeout_still_measures_replies() {
    let mut config = config(1);
    config.timeout = Duration::from_millis(18_446_744_073_710);
    let (result, _) = run_script(&config, vec![Step::echo(ms(1))]);
    let samples = result.unwrap();

    assert_eq!(samples.delays(), &[1_000_000]);
    assert_eq!(samples.stop_reason(), StopReason::Completed);
}
