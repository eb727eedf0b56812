use clap::Parser;
use miditimer::{
    cli::Args,
    logging,
    midi::{list_devices, LoopbackTransport, MidirTransport, PortChoice, Transport},
    monitor,
    ui::{create_run_progress, update_run_progress},
    TimerConfig, TimerController, TimerError,
};
use indicatif::ProgressBar;
use std::fmt::Display;
use std::process;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let args = parse_command_line_arguments();
    initialize_logging(&args);

    if args.list_devices {
        list_available_devices();
        return;
    }

    let config = TimerConfig::from_args(&args).unwrap_or_else(|e| fail(e));
    let transport = create_transport(&args).unwrap_or_else(|e| fail(e));

    if args.monitor {
        run_monitor(transport.as_ref(), config.duration);
        return;
    }

    run_timer(transport, config, !args.no_progress);
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn initialize_logging(args: &Args) {
    if let Err(e) = logging::init_logger(args.verbose, args.log_file.as_deref()) {
        eprintln!("Logger initialization failed: {}", e);
        process::exit(1);
    }
    log::info!("Application starting");
}

fn list_available_devices() {
    match list_devices() {
        Ok((inputs, outputs)) => {
            println!("Available MIDI inputs:");
            for device in &inputs {
                println!("  - {}", device);
            }
            println!("Available MIDI outputs:");
            for device in &outputs {
                println!("  - {}", device);
            }
        }
        Err(e) => fail(e),
    }
}

fn create_transport(args: &Args) -> Result<Arc<dyn Transport>, TimerError> {
    if let Some(ms) = args.loopback_ms {
        let transport = LoopbackTransport::new(Duration::from_millis(ms))
            .map_err(TimerError::TransportUnavailable)?;
        return Ok(Arc::new(transport));
    }

    let input = PortChoice::from_args(args.input.clone(), args.select);
    let output = PortChoice::from_args(args.output.clone(), args.select);
    let transport =
        MidirTransport::connect(&input, &output).map_err(TimerError::TransportUnavailable)?;
    println!(
        "Listening on '{}', sending to '{}'",
        transport.input_name(),
        transport.output_name()
    );
    Ok(Arc::new(transport))
}

fn run_monitor(transport: &dyn Transport, duration: Duration) {
    if let Err(e) = monitor::run(transport, Some(duration)) {
        fail(e);
    }
}

fn run_timer(transport: Arc<dyn Transport>, config: TimerConfig, show_progress: bool) {
    let duration = config.duration;
    let mut controller = TimerController::new(transport, config).unwrap_or_else(|e| fail(e));

    let pb = if show_progress {
        create_run_progress(duration)
    } else {
        ProgressBar::hidden()
    };

    let result = controller.run_with(duration, |progress| update_run_progress(&pb, progress));
    pb.finish_and_clear();

    match result {
        Ok(report) => println!("{}", report),
        Err(e) => fail(e),
    }
}

fn fail<E: Display>(error: E) -> ! {
    let error_msg = format!("Error: {}", error);
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    process::exit(1);
}
