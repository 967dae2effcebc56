//! Batch conversion.
//!
//! A batch converts every discovered input file, one at a time and in
//! discovery order, into a `<stem>.txt` report. A failing file is logged and
//! counted; it never stops the batch. Progress is reported as
//! [`BatchEvent`]s, either through a callback ([`run_batch`]) or over a
//! channel from a background worker ([`spawn_batch`]).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{Config, ReportConfig};
use crate::decoder::Decoder;
use crate::error::{ConversionError, ConversionResult, Error, Result};
use crate::report::ActivityReport;
use crate::scan;

/// Source of the "conversion date" written in each report header.
pub type Clock = fn() -> NaiveDateTime;

/// The wall clock, in local time.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Everything a batch needs to know, fixed before it starts.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// File or directory to convert.
    pub input: PathBuf,
    /// Where reports go; `None` means next to the input.
    pub output_dir: Option<PathBuf>,
    /// Descend into subdirectories of `input`.
    pub recursive: bool,
    /// Input file extension, without the dot.
    pub extension: String,
    /// Report layout.
    pub report: ReportConfig,
    /// Conversion date source.
    pub clock: Clock,
}

impl BatchConfig {
    /// Create a batch for `input` with default settings.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self::from_config(input, &Config::default())
    }

    /// Create a batch for `input` using loaded configuration.
    #[must_use]
    pub fn from_config(input: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            input: input.into(),
            output_dir: None,
            recursive: config.scan.recursive,
            extension: config.scan.extension.clone(),
            report: config.report.clone(),
            clock: local_now,
        }
    }

    /// Write reports to `dir` instead of next to the input.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Enable or disable recursive scanning.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replace the report layout.
    #[must_use]
    pub fn with_report(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }

    /// Replace the conversion date source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The directory reports are written to.
    #[must_use]
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| scan::default_output_dir(&self.input))
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Inputs were discovered; `total` files will be processed.
    Started {
        /// Number of input files.
        total: usize,
    },
    /// Conversion of one file begins (1-based `index`).
    FileStarted {
        /// Position of this file in the batch.
        index: usize,
        /// Number of input files.
        total: usize,
        /// The input file.
        path: PathBuf,
    },
    /// A file was converted.
    FileConverted {
        /// The input file.
        path: PathBuf,
        /// The report written for it.
        output: PathBuf,
    },
    /// A file could not be converted.
    FileFailed {
        /// The input file.
        path: PathBuf,
        /// What went wrong.
        error: String,
    },
    /// The batch stopped early after `processed` files.
    Cancelled {
        /// Files handled before cancellation was noticed.
        processed: usize,
    },
    /// The batch is over.
    Finished(BatchSummary),
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// The input file.
    pub input: PathBuf,
    /// The report written, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// The failure message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    /// Check if the file was converted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Files converted.
    pub succeeded: usize,
    /// Files that failed.
    pub failed: usize,
    /// Whether the batch stopped before handling every file.
    pub cancelled: bool,
    /// Per-file outcomes in processing order.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    /// Number of files handled.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Check if every handled file was converted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, input: &Path, result: &ConversionResult<PathBuf>) {
        let outcome = match result {
            Ok(output) => {
                self.succeeded += 1;
                FileOutcome {
                    input: input.to_path_buf(),
                    output: Some(output.clone()),
                    error: None,
                }
            }
            Err(err) => {
                self.failed += 1;
                FileOutcome {
                    input: input.to_path_buf(),
                    output: None,
                    error: Some(err.to_string()),
                }
            }
        };
        self.outcomes.push(outcome);
    }
}

/// A cloneable handle used to ask a running batch to stop.
///
/// The batch checks it between files; a file in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a new, untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the batch to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Name of the report written for `input`.
#[must_use]
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    output_dir.join(format!("{stem}.txt"))
}

/// Convert one file and write its report into `output_dir`.
///
/// The report is rendered in memory first, so a decode failure never leaves
/// a file behind; a failed write removes the partial output.
///
/// # Errors
///
/// Returns [`ConversionError::Decode`] if the decoder fails,
/// [`ConversionError::Render`] if the report text cannot be produced and
/// [`ConversionError::Write`] if the report cannot be written.
pub fn convert_file<D: Decoder + ?Sized>(
    decoder: &D,
    input: &Path,
    output_dir: &Path,
    report_config: &ReportConfig,
    converted_at: NaiveDateTime,
) -> ConversionResult<PathBuf> {
    let stream = decoder.open(input)?;
    let report = ActivityReport::collect(stream)?;
    debug!(
        file = %input.display(),
        laps = report.laps().len(),
        points = report.points().len(),
        ignored = report.ignored(),
        "records collected"
    );

    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = report
        .render(&source_name, converted_at, report_config)
        .map_err(|_| ConversionError::render(input))?;

    let output = output_path_for(input, output_dir);
    write_report(&output, &text)?;
    Ok(output)
}

fn write_report(output: &Path, text: &str) -> ConversionResult<()> {
    let mut file = File::create(output).map_err(|e| ConversionError::write(output, e))?;
    if let Err(e) = file.write_all(text.as_bytes()).and_then(|()| file.flush()) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(output) {
            warn!(file = %output.display(), error = %remove_err, "could not remove partial report");
        }
        return Err(ConversionError::write(output, e));
    }
    Ok(())
}

/// Run a batch to completion on the current thread.
///
/// # Errors
///
/// Returns an error if the input does not exist, cannot be scanned, or the
/// output directory cannot be created. Per-file failures are not errors;
/// they are counted in the returned summary.
pub fn run_batch<D, F>(config: &BatchConfig, decoder: &D, on_event: F) -> Result<BatchSummary>
where
    D: Decoder + ?Sized,
    F: FnMut(BatchEvent),
{
    run_batch_with_cancel(config, decoder, &CancelHandle::new(), on_event)
}

/// Like [`run_batch`], stopping between files once `cancel` is triggered.
///
/// # Errors
///
/// Same as [`run_batch`].
pub fn run_batch_with_cancel<D, F>(
    config: &BatchConfig,
    decoder: &D,
    cancel: &CancelHandle,
    mut on_event: F,
) -> Result<BatchSummary>
where
    D: Decoder + ?Sized,
    F: FnMut(BatchEvent),
{
    let files = scan::discover(&config.input, &config.extension, config.recursive)?;

    let output_dir = config.resolved_output_dir();
    fs::create_dir_all(&output_dir).map_err(|source| Error::DirectoryCreate {
        path: output_dir.clone(),
        source,
    })?;

    let total = files.len();
    if total == 0 {
        info!(input = %config.input.display(), "no .{} files found", config.extension);
    } else {
        info!(count = total, decoder = decoder.name(), "found files to convert");
    }
    on_event(BatchEvent::Started { total });

    let mut summary = BatchSummary::default();
    for (index, path) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(processed = index, total, "batch cancelled");
            summary.cancelled = true;
            on_event(BatchEvent::Cancelled { processed: index });
            break;
        }

        on_event(BatchEvent::FileStarted {
            index: index + 1,
            total,
            path: path.clone(),
        });

        let result = convert_file(decoder, path, &output_dir, &config.report, (config.clock)());
        summary.record(path, &result);
        match result {
            Ok(output) => {
                info!(file = %path.display(), output = %output.display(), "converted");
                on_event(BatchEvent::FileConverted {
                    path: path.clone(),
                    output,
                });
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "conversion failed");
                on_event(BatchEvent::FileFailed {
                    path: path.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    on_event(BatchEvent::Finished(summary.clone()));
    Ok(summary)
}

/// A batch running on a background thread.
#[derive(Debug)]
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancelHandle,
    worker: JoinHandle<Result<BatchSummary>>,
}

impl BatchHandle {
    /// The event channel. It closes when the worker is done.
    pub fn events(&mut self) -> &mut mpsc::UnboundedReceiver<BatchEvent> {
        &mut self.events
    }

    /// Block until the next event; `None` once the worker is done.
    ///
    /// Must not be called from inside an async runtime.
    pub fn next_event_blocking(&mut self) -> Option<BatchEvent> {
        self.events.blocking_recv()
    }

    /// Ask the batch to stop after the current file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that can cancel this batch from elsewhere.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the worker and return its summary.
    ///
    /// # Errors
    ///
    /// Returns the batch's setup error, or [`Error::Internal`] if the worker
    /// panicked.
    pub fn join(self) -> Result<BatchSummary> {
        self.worker
            .join()
            .map_err(|_| Error::internal("batch worker panicked"))?
    }
}

/// Start a batch on a background thread.
///
/// # Errors
///
/// Returns an error if the worker thread cannot be spawned.
pub fn spawn_batch<D>(config: BatchConfig, decoder: D) -> Result<BatchHandle>
where
    D: Decoder + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancelHandle::new();
    let worker_cancel = cancel.clone();

    let worker = thread::Builder::new()
        .name("fit2txt-batch".to_string())
        .spawn(move || {
            run_batch_with_cancel(&config, &decoder, &worker_cancel, |event| {
                // The receiver may be gone; the batch still runs to completion.
                let _ = tx.send(event);
            })
        })?;

    Ok(BatchHandle {
        events: rx,
        cancel,
        worker,
    })
}
