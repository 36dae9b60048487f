mod config;
mod devices;
mod session;

use config::LoggerConfig;
use devices::{SampleSource, SensorBoard};
use session::writer::SampleWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive so buffered log lines reach the file on exit
    let _guard = setup_logging();
    info!("Starting application");

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match LoggerConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            return Err(Box::new(e));
        }
    };
    info!("Using configuration: {:?}", config);

    let mut board = SensorBoard::new(&config.port, config.baud_rate, config.read_timeout());
    if let Err(e) = board.connect(config.settle_delay()) {
        eprintln!("Failed to connect to sensor board on {}: {}", board.port_name(), e);
        return Err(Box::new(e));
    }

    let label = {
        let stdin = std::io::stdin();
        session::prompt_label(&mut stdin.lock(), &mut std::io::stdout())?
    };

    let mut writer = SampleWriter::create(&config.output_path)?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    let mut stdout = std::io::stdout();
    let outcome = session::run_session(
        &mut board,
        &mut writer,
        &mut stdout,
        &label,
        config.poll_interval(),
        &running,
    );
    match outcome {
        Ok(summary) => session::report_stopped(&mut stdout, &summary, &config.output_path)?,
        Err(e) => {
            error!("Logging session failed: {}", e);
            eprintln!("Logging session failed: {}", e);
            return Err(Box::new(e));
        }
    }

    info!("Serial connection closed: {}", !board.is_connected());
    info!("Application shutting down");
    Ok(())
}

fn setup_logging() -> WorkerGuard {
    // Set up file-based logging with rotation
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false) // Disable ANSI colors in log files
        .with_level(true)
        .init();

    guard
}
