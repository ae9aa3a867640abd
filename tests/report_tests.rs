use midi_latency_test::report::{
    clock_header, render_histogram, render_report, render_verdict, stop_message, terse_line,
};
use midi_latency_test::transport::{ScriptedTransport, Step};
use midi_latency_test::{
    aggregate, AbortSignal, ManualClock, NoProgress, Precision, RunConfig, Sampler, TransportSpec,
};
use std::rc::Rc;
use std::time::Duration;

const MS: u64 = 1_000_000;

fn config() -> RunConfig {
    RunConfig::new(TransportSpec::Sequencer {
        output: "out".to_string(),
        input: "in".to_string(),
    })
}

#[test]
fn test_histogram_lines_and_gaps() {
    let result = aggregate(&[MS, MS, 2 * MS], 0, Precision::default());
    let rendered = render_histogram(&result.histogram, Precision::default());
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "...");
    assert_eq!(lines[1], format!("  1.0 -  1.1 ms:        2 {}", "#".repeat(50)));
    assert_eq!(lines[2], "...");
    assert_eq!(lines[3], format!("  2.0 -  2.1 ms:        1 {}", "#".repeat(25)));
}

#[test]
fn test_histogram_labels_follow_precision() {
    let precision = Precision::new(3).unwrap();
    let result = aggregate(&[250_000], 0, precision);
    let rendered = render_histogram(&result.histogram, precision);

    assert!(rendered.starts_with("...\n"));
    assert!(rendered.contains("  0.250 -  0.251 ms:        1 "));
}

#[test]
fn test_adjacent_buckets_have_no_gap_marker() {
    let result = aggregate(&[0, 0, 1], 0, Precision::default());
    let rendered = render_histogram(&result.histogram, Precision::default());
    assert!(!rendered.contains("..."));
}

#[test]
fn test_success_verdict() {
    let result = aggregate(&[MS, 5 * MS], 0, Precision::default());
    let text = render_verdict(&result);

    assert!(text.contains("> SUCCESS"));
    assert!(text.contains("best latency was 1.00 ms"));
    assert!(text.contains("worst latency was 5.00 ms, which is great."));
}

#[test]
fn test_fail_verdict_includes_hints() {
    let result = aggregate(&[MS, 7 * MS], 0, Precision::default());
    let text = render_verdict(&result);

    assert!(text.contains("> FAIL"));
    assert!(text.contains("worst latency was 7.00 ms, which is too much."));
    assert!(text.contains("/proc/interrupts"));
}

#[test]
fn test_zero_delays_render_no_bars() {
    let result = aggregate(&[0, 0, 0], 0, Precision::default());
    let text = render_report(&result, Precision::default());

    assert!(text.contains("no delay was measured; clock has too low resolution"));
    assert!(!text.contains('#'));
    assert!(!text.contains("SUCCESS"));
    assert!(!text.contains("FAIL"));
}

#[test]
fn test_empty_run_reports_no_measurements() {
    let result = aggregate(&[], 0, Precision::default());
    assert_eq!(render_verdict(&result), "(no measurements)\n");
}

#[test]
fn test_terse_line_format() {
    let mut config = config();
    config.samples = 5;
    let delays: Vec<u64> = (1..=5).map(|n| n * MS).collect();
    let result = aggregate(&delays, 0, config.precision);

    assert_eq!(
        terse_line(&config, &result),
        "5, 0, 0, 0, 0.000, 0, 1.000, 3.000, 5.000"
    );
}

#[test]
fn test_terse_line_reports_flags() {
    let mut config = config();
    config.realtime = true;
    config.priority = 99;
    config.skip = 1;
    config.wait_ms = 2.5;
    config.random_wait = true;
    let result = aggregate(&[9 * MS, 250_000, 750_000], 1, config.precision);

    assert_eq!(
        terse_line(&config, &result),
        "3, 1, 99, 1, 2.500, 1, 0.250, 0.500, 0.750"
    );
}

#[test]
fn test_stop_messages() {
    let mut config = config();
    config.samples = 10;
    config.grace = 1;
    let clock = Rc::new(ManualClock::new());
    let abort = AbortSignal::new();

    let mut transport =
        ScriptedTransport::new(clock.clone(), vec![Step::echo(Duration::from_millis(700))]);
    let samples = Sampler::new(&config, &*clock, &abort)
        .run(&mut transport, &mut NoProgress)
        .unwrap();
    let message = stop_message(&samples, config.samples).unwrap();
    assert!(message.contains("grace limit reached"));

    config.grace = 0;
    config.samples = 1;
    let mut transport =
        ScriptedTransport::new(clock.clone(), vec![Step::echo(Duration::from_millis(1))]);
    let samples = Sampler::new(&config, &*clock, &abort)
        .run(&mut transport, &mut NoProgress)
        .unwrap();
    assert!(stop_message(&samples, config.samples).is_none());
}

#[test]
fn test_clock_header_warns_on_coarse_clock() {
    let fine = ManualClock::new();
    assert_eq!(clock_header(&fine), "> clock resolution: 0.000000001 s\n");

    let coarse = ManualClock::with_resolution(Duration::from_millis(4));
    let header = clock_header(&coarse);
    assert!(header.starts_with("> clock resolution: 0.004000000 s\n"));
    assert!(header.contains("WARNING: You do not have a high-resolution clock!"));
}
