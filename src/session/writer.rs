use super::record::{HEADER, SampleRecord};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// CSV sink for labelled samples. Every row is flushed as soon as it is written.
pub struct SampleWriter<W: Write> {
    inner: Writer<W>,
    header_written: bool,
}

impl SampleWriter<File> {
    /// Create `path`, truncating anything already there.
    pub fn create(path: impl AsRef<Path>) -> csv::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        info!("Writing samples to {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> SampleWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        // The header is written explicitly so it exists even if no sample arrives.
        let inner = WriterBuilder::new().has_headers(false).from_writer(writer);
        SampleWriter { inner, header_written: false }
    }

    pub fn write_header(&mut self) -> csv::Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.inner.write_record(HEADER)?;
        self.inner.flush()?;
        self.header_written = true;
        Ok(())
    }

    pub fn append(&mut self, record: &SampleRecord) -> csv::Result<()> {
        self.write_header()?;
        self.inner.serialize(record)?;
        self.inner.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> std::io::Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))
    }
}
