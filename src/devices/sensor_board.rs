use super::SampleSource;
use serialport::SerialPort;
use std::io::{ErrorKind, Read};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SensorBoardError {
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, SensorBoardError>;

/// Microcontroller streaming MQ-3, MQ-4 and MQ-135 readings over a serial link.
pub struct SensorBoard {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
    baud_rate: u32,
    read_timeout: Duration,
    pending: Vec<u8>,
}

impl SensorBoard {
    pub fn new(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Self {
        info!("Initializing sensor board on {} at {} baud", port_name, baud_rate);
        SensorBoard {
            port: None,
            port_name: port_name.to_string(),
            baud_rate,
            read_timeout,
            pending: Vec::new(),
        }
    }

    /// Open the port, then wait `settle_delay` for the board to come out of
    /// the reset triggered by opening it.
    pub fn connect(&mut self, settle_delay: Duration) -> Result<()> {
        info!("Attempting to connect to sensor board at {}", self.port_name);
        let port = serialport::new(&self.port_name, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| {
                error!("Failed to open {}: {}", self.port_name, e);
                e
            })?;
        self.port = Some(port);
        self.pending.clear();

        std::thread::sleep(settle_delay);
        info!("Sensor board connected on {}", self.port_name);
        Ok(())
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl SampleSource for SensorBoard {
    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port.as_mut().ok_or(SensorBoardError::NotConnected)?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let port = self.port.as_mut().ok_or(SensorBoardError::NotConnected)?;
        let line = read_line_into(port, &mut self.pending)?;
        if line.is_none() {
            debug!(
                "Read timed out with {} bytes of a partial line buffered",
                self.pending.len()
            );
        }
        Ok(line)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            self.pending.clear();
            info!("Serial connection to {} closed", self.port_name);
        }
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SensorBoard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pull bytes one at a time until `\n`. A timeout leaves the partial line in
/// `pending` and yields `None`. A zero-byte read means the device is gone.
fn read_line_into<R: Read + ?Sized>(
    reader: &mut R,
    pending: &mut Vec<u8>,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "serial device returned no data",
                ));
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    let mut line = std::mem::take(pending);
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Ok(Some(line));
                }
                pending.push(byte[0]);
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Yields its chunks in order, reporting a timeout between each one.
    struct ChunkedReader {
        chunks: Vec<Vec<u8>>,
        current: Cursor<Vec<u8>>,
    }

    impl ChunkedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            let mut chunks: Vec<Vec<u8>> = chunks.iter().map(|c| c.to_vec()).collect();
            chunks.reverse();
            let first = chunks.pop().unwrap_or_default();
            ChunkedReader { chunks, current: Cursor::new(first) }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.current.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            match self.chunks.pop() {
                Some(next) => {
                    self.current = Cursor::new(next);
                    Err(std::io::Error::new(ErrorKind::TimedOut, "timed out"))
                }
                None => Ok(0),
            }
        }
    }

    #[test]
    fn reads_one_line_at_a_time() {
        let mut reader = Cursor::new(b"120, 80, 45\n121, 79, 46\n".to_vec());
        let mut pending = Vec::new();

        assert_eq!(read_line_into(&mut reader, &mut pending).unwrap().unwrap(), b"120, 80, 45");
        assert_eq!(read_line_into(&mut reader, &mut pending).unwrap().unwrap(), b"121, 79, 46");
    }

    #[test]
    fn zero_byte_read_is_end_of_stream() {
        let mut reader = Cursor::new(b"120, 8".to_vec());
        let mut pending = Vec::new();

        let err = read_line_into(&mut reader, &mut pending).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(pending, b"120, 8");
    }

    #[test]
    fn strips_carriage_return() {
        let mut reader = Cursor::new(b"1, 2, 3\r\n".to_vec());
        let mut pending = Vec::new();
        assert_eq!(read_line_into(&mut reader, &mut pending).unwrap().unwrap(), b"1, 2, 3");
    }

    #[test]
    fn partial_line_survives_timeout() {
        let mut reader = ChunkedReader::new(&[b"120, 8", b"0, 45\n"]);
        let mut pending = Vec::new();

        assert_eq!(read_line_into(&mut reader, &mut pending).unwrap(), None);
        assert_eq!(pending, b"120, 8");
        assert_eq!(read_line_into(&mut reader, &mut pending).unwrap().unwrap(), b"120, 80, 45");
        assert!(pending.is_empty());
    }

    #[test]
    fn unconnected_board_refuses_io() {
        let mut board = SensorBoard::new("/dev/null-board", 115_200, Duration::from_millis(10));
        assert!(!board.is_connected());
        assert!(matches!(board.bytes_available(), Err(SensorBoardError::NotConnected)));
        assert!(matches!(board.read_line(), Err(SensorBoardError::NotConnected)));
        board.close();
        assert!(!board.is_connected());
    }
}
