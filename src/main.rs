use meter_sim::logging::log_filter;
use meter_sim::{await_device, Engine, SerialTransport, SimulatorConfig, SimulatorError};
use std::env;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// The main entry point for the simulator binary.
fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimulatorError> {
    let config = SimulatorConfig::load()?;

    // Ctrl+C or SIGTERM stops the loop between polls.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    info!("Starting simulator on {}...", config.device_path.display());

    if !await_device(&config.device_path, config.device_wait_interval, &shutdown) {
        info!("Shutdown requested before {} appeared", config.device_path.display());
        return Ok(());
    }

    let transport = SerialTransport::open(&config)?;
    let name = transport
        .name()
        .unwrap_or_else(|| config.device_path.display().to_string());
    info!("Connected to {} at {} baud", name, config.baud_rate);

    Engine::new(transport, config.poll_interval).run(&shutdown)
}
