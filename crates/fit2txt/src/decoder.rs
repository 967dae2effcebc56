//! Decoder abstraction.
//!
//! The binary format itself is handled by an external library; this module
//! defines the seam the rest of the crate talks to ([`Decoder`]) and the
//! production implementation backed by `fitparser` ([`FitDecoder`]).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::Utc;
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};
use tracing::{debug, trace};

use crate::error::{ConversionError, ConversionResult};
use crate::record::{FieldValue, Record, RecordKind};

/// A lazy, finite sequence of decoded records.
pub type RecordStream<'a> = Box<dyn Iterator<Item = ConversionResult<Record>> + Send + 'a>;

/// Something that can turn an input file into records.
///
/// Implementations must yield records in the order they appear in the file.
/// The stream is consumed once.
pub trait Decoder: Send + Sync {
    /// The name of this decoder (for logging).
    fn name(&self) -> &'static str;

    /// Open `path` and return its records.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Decode`] if the file cannot be opened or
    /// is not a valid input. Errors found later surface as items of the stream.
    fn open(&self, path: &Path) -> ConversionResult<RecordStream<'_>>;
}

/// Decoder for Garmin FIT files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitDecoder;

impl FitDecoder {
    /// Create a new FIT decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FitDecoder {
    fn name(&self) -> &'static str {
        "fitparser"
    }

    fn open(&self, path: &Path) -> ConversionResult<RecordStream<'_>> {
        let file = File::open(path).map_err(|e| ConversionError::decode(path, e.to_string()))?;
        let mut reader = BufReader::new(file);

        let messages = fitparser::from_reader(&mut reader)
            .map_err(|e| ConversionError::decode(path, e.to_string()))?;
        debug!(file = %path.display(), messages = messages.len(), "decoded FIT file");

        Ok(Box::new(messages.into_iter().map(|m| {
            Ok::<_, ConversionError>(convert_message(&m))
        })))
    }
}

/// Convert one `fitparser` message into a [`Record`].
fn convert_message(message: &FitDataRecord) -> Record {
    let kind = match message.kind() {
        MesgNum::Session => RecordKind::Session,
        MesgNum::Lap => RecordKind::Lap,
        MesgNum::Record => RecordKind::Point,
        other => RecordKind::Other(format!("{other:?}")),
    };

    let mut record = Record::new(kind);
    for field in message.fields() {
        match convert_value(field.value()) {
            Some(value) => record.insert(field.name(), value),
            None => trace!(field = field.name(), "dropping absent value"),
        }
    }
    record
}

/// Map a `fitparser` value to a [`FieldValue`]; `None` means absent.
fn convert_value(value: &Value) -> Option<FieldValue> {
    let converted = match value {
        Value::Timestamp(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
        Value::Byte(v) | Value::Enum(v) | Value::UInt8(v) | Value::UInt8z(v) => {
            FieldValue::UInt(u64::from(*v))
        }
        Value::UInt16(v) | Value::UInt16z(v) => FieldValue::UInt(u64::from(*v)),
        Value::UInt32(v) | Value::UInt32z(v) => FieldValue::UInt(u64::from(*v)),
        Value::UInt64(v) | Value::UInt64z(v) => FieldValue::UInt(*v),
        Value::SInt8(v) => FieldValue::Int(i64::from(*v)),
        Value::SInt16(v) => FieldValue::Int(i64::from(*v)),
        Value::SInt32(v) => FieldValue::Int(i64::from(*v)),
        Value::SInt64(v) => FieldValue::Int(*v),
        Value::Float32(v) => FieldValue::Float(f64::from(*v)),
        Value::Float64(v) => FieldValue::Float(*v),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Array(items) => {
            let rendered: Vec<String> = items
                .iter()
                .filter_map(convert_value)
                .map(|v| v.to_string())
                .collect();
            if rendered.is_empty() {
                return None;
            }
            FieldValue::Text(format!("({})", rendered.join(", ")))
        }
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(converted)
}
