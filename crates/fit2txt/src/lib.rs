//! `fit2txt` - Convert FIT activity files into readable text reports
//!
//! This library decodes FIT files through a pluggable [`Decoder`], groups the
//! decoded records into session, laps and points, and writes one plain-text
//! report per input file. Batches run sequentially, either on the calling
//! thread ([`run_batch`]) or on a background worker that reports progress
//! over a channel ([`spawn_batch`]).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod batch;
pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod record;
pub mod report;
pub mod scan;

pub use batch::{run_batch, spawn_batch, BatchConfig, BatchEvent, BatchHandle, BatchSummary};
pub use config::Config;
pub use decoder::{Decoder, FitDecoder};
pub use error::{ConversionError, Error, Result};
pub use logging::init_logging;
pub use record::{FieldValue, Record, RecordKind};
pub use report::{ActivityReport, PointStyle};
