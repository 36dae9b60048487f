pub mod sensor_board;

pub use sensor_board::{Result, SensorBoard, SensorBoardError};

/// A line-oriented byte stream the logging loop polls for samples.
pub trait SampleSource {
    /// Number of unread bytes waiting, without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one line, excluding the `\n` terminator and any trailing `\r`.
    ///
    /// Returns `None` when the read timeout elapses before a newline arrives.
    /// Bytes read so far are kept and completed by the next call.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the underlying connection. Calling it again is a no-op.
    fn close(&mut self);

    fn is_connected(&self) -> bool;
}
