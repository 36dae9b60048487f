pub mod record;
pub mod writer;

use crate::devices::{SampleSource, SensorBoardError};
use record::{SampleRecord, parse_line};
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use writer::SampleWriter;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Sensor board error: {0}")]
    Device(#[from] SensorBoardError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No label entered")]
    NoLabel,
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub rows_written: usize,
    pub lines_rejected: usize,
}

/// Ask once for the label applied to every sample of this session.
pub fn prompt_label<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "Input perfume type: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SessionError::NoLabel);
    }
    let label = line.trim();
    if label.is_empty() {
        return Err(SessionError::NoLabel);
    }
    info!("Session label: {}", label);
    Ok(label.to_string())
}

/// Closes the source when dropped, whichever way the loop ends.
struct CloseOnExit<'a, S: SampleSource>(&'a mut S);

impl<S: SampleSource> Deref for CloseOnExit<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.0
    }
}

impl<S: SampleSource> DerefMut for CloseOnExit<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.0
    }
}

impl<S: SampleSource> Drop for CloseOnExit<'_, S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Poll `source` for sample lines and append them, labelled, to `writer`
/// until `running` is cleared. Each written row is echoed to `echo`.
///
/// `running` is only checked between iterations, and every iteration ends with
/// a `poll_interval` sleep. The source is closed before this returns, on
/// success or error.
pub fn run_session<S, W, E>(
    source: &mut S,
    writer: &mut SampleWriter<W>,
    echo: &mut E,
    label: &str,
    poll_interval: Duration,
    running: &AtomicBool,
) -> Result<SessionSummary>
where
    S: SampleSource,
    W: Write,
    E: Write,
{
    let mut source = CloseOnExit(source);
    writer.write_header()?;

    info!("Logging samples labelled {:?}, polling every {:?}", label, poll_interval);
    let mut summary = SessionSummary::default();

    while running.load(Ordering::SeqCst) {
        if source.bytes_available()? > 0 {
            if let Some(raw) = source.read_line()? {
                handle_line(&raw, label, writer, echo, &mut summary)?;
            }
        }
        std::thread::sleep(poll_interval);
    }

    info!(
        "Logging stopped: {} rows written, {} lines rejected",
        summary.rows_written, summary.lines_rejected
    );
    Ok(summary)
}

fn handle_line<W: Write, E: Write>(
    raw: &[u8],
    label: &str,
    writer: &mut SampleWriter<W>,
    echo: &mut E,
    summary: &mut SessionSummary,
) -> Result<()> {
    let readings = match parse_line(raw) {
        Ok(Some(readings)) => readings,
        Ok(None) => {
            debug!("Skipping blank line");
            return Ok(());
        }
        Err(e) => {
            warn!("Rejected line: {}", e);
            summary.lines_rejected += 1;
            return Ok(());
        }
    };

    let record = SampleRecord::new(readings, label);
    writer.append(&record)?;
    summary.rows_written += 1;

    debug!("Wrote row {}: {:?}", summary.rows_written, record);
    writeln!(echo, "[{}]", record.fields().join(", "))?;
    echo.flush()?;
    Ok(())
}

/// Termination message printed once the loop has stopped.
pub fn report_stopped<W: Write>(
    output: &mut W,
    summary: &SessionSummary,
    output_path: &str,
) -> Result<()> {
    writeln!(output, "Data logging stopped.")?;
    writeln!(
        output,
        "{} rows written to {} ({} lines rejected)",
        summary.rows_written, output_path, summary.lines_rejected
    )?;
    Ok(())
}
