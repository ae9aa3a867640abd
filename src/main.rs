use clap::Parser;
use midi_latency_test::{
    aggregate,
    cli::{format_port_listing, Args},
    logging,
    priority::set_realtime_priority,
    report, transport,
    ui::SampleProgress,
    AbortSignal, Clock, MonotonicClock, NoProgress, ProgressSink, Result, RunConfig, Sampler,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    initialize_logging();
    let args = Args::parse();

    if args.list {
        print!("{}", format_port_listing(&transport::list_ports()));
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn initialize_logging() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Warning: logging disabled: {}", e);
        return;
    }
    log::info!("midi-latency-test {} starting", env!("CARGO_PKG_VERSION"));
}

fn run(args: Args) -> Result<ExitCode> {
    let (config, warnings) = args.into_run_config()?;
    for warning in &warnings {
        log::warn!("{}", warning);
        if config.verbose {
            println!("> Warning: {}", warning);
        }
    }

    let mut transport = transport::open(&config.transport)?;

    if config.verbose {
        println!("> {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }

    if config.realtime {
        if config.verbose {
            print!("> set_realtime_priority(SCHED_FIFO, {}).. ", config.priority);
        }
        match set_realtime_priority(config.priority) {
            Ok(()) if config.verbose => println!("done."),
            Ok(()) => {}
            Err(e) if config.verbose => println!("failed: {}", e),
            Err(_) => {}
        }
    }

    let clock = MonotonicClock::new();
    report_clock_resolution(&clock, &config);

    let abort = AbortSignal::install()?;

    if config.verbose {
        println!(
            "\n> sampling {} midi latency values - please wait ...",
            config.samples
        );
        println!("> press Ctrl+C to abort test");
        match config.skip {
            0 => {}
            1 => println!("> skipping first latency sample"),
            n => println!("> skipping first {} latency samples", n),
        }
    }

    let mut progress: Box<dyn ProgressSink> = if config.verbose {
        Box::new(SampleProgress::new(u64::from(config.samples)))
    } else {
        Box::new(NoProgress)
    };

    let samples = Sampler::new(&config, &clock, &abort).run(&mut *transport, &mut *progress)?;
    if let Err(e) = transport.close() {
        log::warn!("Closing transport failed: {}", e);
    }

    let result = aggregate(samples.delays(), samples.skip(), config.precision);

    if config.verbose {
        if let Some(message) = report::stop_message(&samples, config.samples) {
            println!("{}", message);
        }
        println!("\n> done.");
        print!("{}", report::render_report(&result, config.precision));
    } else {
        println!("{}", report::terse_line(&config, &result));
    }

    log::info!("Run finished: {:?}", result.verdict);
    Ok(if result.verdict.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report_clock_resolution(clock: &MonotonicClock, config: &RunConfig) {
    log::info!("Clock resolution: {:?}", clock.resolution());
    if config.verbose {
        print!("{}", report::clock_header(clock));
    }
}
