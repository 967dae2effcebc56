//! Console output for the `fit2txt` binary.
//!
//! Turns batch events into the progress lines and final tally printed on
//! stdout, or a single JSON document when `--json` is given.

use std::io::Write;

use crate::batch::{BatchEvent, BatchSummary};
use crate::error::Result;

const RULE_WIDTH: usize = 40;

/// Renders batch progress to a writer.
#[derive(Debug)]
pub struct Console<W: Write> {
    out: W,
    json: bool,
    current: Option<(usize, usize, String)>,
}

impl<W: Write> Console<W> {
    /// Create a console writing to `out`. In JSON mode only the summary is printed.
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            current: None,
        }
    }

    /// Print the title banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn banner(&mut self) -> Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "\nFIT to TXT Converter")?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Print whatever `event` calls for.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn handle(&mut self, event: &BatchEvent) -> Result<()> {
        if self.json {
            return Ok(());
        }
        match event {
            BatchEvent::FileStarted { index, total, path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.current = Some((*index, *total, name));
            }
            BatchEvent::FileConverted { .. } => self.finish_file("✓")?,
            BatchEvent::FileFailed { .. } => self.finish_file("✗")?,
            BatchEvent::Cancelled { processed } => {
                writeln!(self.out, "Conversione interrotta dopo {processed} file")?;
            }
            BatchEvent::Started { .. } | BatchEvent::Finished(_) => {}
        }
        Ok(())
    }

    fn finish_file(&mut self, mark: &str) -> Result<()> {
        if let Some((index, total, name)) = self.current.take() {
            writeln!(self.out, "[{index}/{total}] Conversione di {name}... {mark}")?;
        }
        Ok(())
    }

    /// Print the final tally (or the JSON summary).
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails or the summary cannot be serialized.
    pub fn summary(&mut self, summary: &BatchSummary) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(summary)?)?;
            return Ok(());
        }
        writeln!(self.out, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "CONVERSIONE COMPLETATA")?;
        writeln!(self.out, "✓ Successo: {} file", summary.succeeded)?;
        if summary.failed > 0 {
            writeln!(self.out, "✗ Falliti: {} file", summary.failed)?;
        }
        Ok(())
    }

    /// Take back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    fn started(index: usize, name: &str) -> BatchEvent {
        BatchEvent::FileStarted {
            index,
            total: 2,
            path: PathBuf::from("/rides").join(name),
        }
    }

    #[test]
    fn test_banner() {
        let mut console = Console::new(Vec::new(), false);
        console.banner().unwrap();
        let text = output(console);
        assert!(text.contains("FIT to TXT Converter\n"));
        assert!(text.contains(&"=".repeat(40)));
    }

    #[test]
    fn test_progress_lines() {
        let mut console = Console::new(Vec::new(), false);
        console.handle(&BatchEvent::Started { total: 2 }).unwrap();
        console.handle(&started(1, "a.fit")).unwrap();
        console
            .handle(&BatchEvent::FileConverted {
                path: PathBuf::from("/rides/a.fit"),
                output: PathBuf::from("/rides/a.txt"),
            })
            .unwrap();
        console.handle(&started(2, "b.fit")).unwrap();
        console
            .handle(&BatchEvent::FileFailed {
                path: PathBuf::from("/rides/b.fit"),
                error: "bad header".to_string(),
            })
            .unwrap();

        assert_eq!(
            output(console),
            "[1/2] Conversione di a.fit... ✓\n[2/2] Conversione di b.fit... ✗\n"
        );
    }

    #[test]
    fn test_summary_with_failures() {
        let mut console = Console::new(Vec::new(), false);
        let summary = BatchSummary {
            succeeded: 3,
            failed: 1,
            ..BatchSummary::default()
        };
        console.summary(&summary).unwrap();

        let text = output(console);
        assert!(text.contains("CONVERSIONE COMPLETATA\n"));
        assert!(text.contains("✓ Successo: 3 file\n"));
        assert!(text.contains("✗ Falliti: 1 file\n"));
    }

    #[test]
    fn test_summary_without_failures_omits_failed_line() {
        let mut console = Console::new(Vec::new(), false);
        console.summary(&BatchSummary::default()).unwrap();
        assert!(!output(console).contains("Falliti"));
    }

    #[test]
    fn test_json_mode_prints_only_summary() {
        let mut console = Console::new(Vec::new(), true);
        console.banner().unwrap();
        console.handle(&started(1, "a.fit")).unwrap();
        console
            .summary(&BatchSummary {
                succeeded: 1,
                ..BatchSummary::default()
            })
            .unwrap();

        let text = output(console);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 0);
    }
}
