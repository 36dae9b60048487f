use serde::Serialize;
use thiserror::Error;

pub const HEADER: [&str; 4] = ["MQ-3", "MQ-4", "MQ-135", "Label"];

/// Separator the board firmware prints between readings.
pub const FIELD_DELIMITER: &str = ", ";

pub const SENSOR_FIELDS: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum LineError {
    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("expected 3 readings, found {found} in {line:?}")]
    FieldCount { found: usize, line: String },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SampleRecord {
    #[serde(rename = "MQ-3")]
    pub mq3: String,
    #[serde(rename = "MQ-4")]
    pub mq4: String,
    #[serde(rename = "MQ-135")]
    pub mq135: String,
    #[serde(rename = "Label")]
    pub label: String,
}

impl SampleRecord {
    pub fn new(readings: [String; SENSOR_FIELDS], label: &str) -> Self {
        let [mq3, mq4, mq135] = readings;
        SampleRecord { mq3, mq4, mq135, label: label.to_string() }
    }

    pub fn fields(&self) -> [&str; 4] {
        [self.mq3.as_str(), self.mq4.as_str(), self.mq135.as_str(), self.label.as_str()]
    }
}

/// Decode and split one serial line into its three readings.
///
/// Blank lines give `Ok(None)`. Readings are kept as sent; only the count is checked.
pub fn parse_line(raw: &[u8]) -> Result<Option<[String; SENSOR_FIELDS]>, LineError> {
    let text = std::str::from_utf8(raw).map_err(|_| LineError::NotUtf8)?.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let fields: Vec<String> = text.split(FIELD_DELIMITER).map(str::to_string).collect();
    let found = fields.len();
    let readings: [String; SENSOR_FIELDS] = fields
        .try_into()
        .map_err(|_| LineError::FieldCount { found, line: text.to_string() })?;
    Ok(Some(readings))
}
