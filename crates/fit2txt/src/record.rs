//! Decoded record types.
//!
//! A [`Record`] is one message handed over by a [`crate::decoder::Decoder`]:
//! a kind tag plus the ordered list of fields that carried a value.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default rendering for timestamp values.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The kind of message a record was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Whole-activity summary.
    Session,
    /// One lap summary.
    Lap,
    /// A single time-series sample (`record` messages in FIT files).
    Point,
    /// Any other message; ignored by the report.
    Other(String),
}

impl RecordKind {
    /// Map a FIT message name to a record kind.
    #[must_use]
    pub fn from_message_name(name: &str) -> Self {
        match name {
            "session" => Self::Session,
            "lap" => Self::Lap,
            "record" => Self::Point,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Lap => write!(f, "lap"),
            Self::Point => write!(f, "record"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A present field value.
///
/// Absent values never become a `FieldValue`; decoders drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Point in time, kept in UTC.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Render the value, formatting timestamps with `timestamp_format`.
    ///
    /// # Errors
    ///
    /// Returns [`fmt::Error`] if `timestamp_format` is not a usable strftime format.
    pub fn render(&self, timestamp_format: &str) -> Result<String, fmt::Error> {
        match self {
            Self::Timestamp(ts) => {
                let mut text = String::new();
                write!(text, "{}", ts.format(timestamp_format))?;
                Ok(text)
            }
            other => Ok(other.to_string()),
        }
    }

    /// Render the value the way it appears inside a full point mapping:
    /// text and timestamps are quoted, numbers are bare.
    ///
    /// # Errors
    ///
    /// Same as [`FieldValue::render`].
    pub fn render_quoted(&self, timestamp_format: &str) -> Result<String, fmt::Error> {
        match self {
            Self::Text(_) | Self::Timestamp(_) => {
                Ok(format!("'{}'", self.render(timestamp_format)?))
            }
            other => other.render(timestamp_format),
        }
    }

    /// Check if this is a timestamp.
    #[must_use]
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Timestamp(_))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            // Whole floats keep a decimal so they read as measurements: `0.0`, not `0`.
            Self::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(DEFAULT_TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// One decoded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// What kind of message this is.
    pub kind: RecordKind,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create an empty record of the given kind.
    #[must_use]
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Builder-style [`Record::insert`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field.
    ///
    /// A name seen before keeps its original position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate fields in decode order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterate field names in decode order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
