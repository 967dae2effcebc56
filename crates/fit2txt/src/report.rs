//! Report building.
//!
//! Records are bucketed by kind into an [`ActivityReport`], which is then
//! rendered to the plain-text layout written next to each converted file.
//! Rendering is pure: the conversion time is passed in, so the same records
//! always produce the same text.

use std::fmt::{self, Write as _};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::error::ConversionResult;
use crate::record::{Record, RecordKind};

const HEADER_RULE_WIDTH: usize = 60;
const SECTION_RULE_WIDTH: usize = 30;

/// How each point is printed in the preview windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStyle {
    /// Only the configured interesting fields, `name=value | name=value`.
    #[default]
    Compact,
    /// The whole field mapping, `{'name': value, ...}`.
    Full,
}

impl fmt::Display for PointStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Records of one input file, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityReport {
    session: Option<Record>,
    laps: Vec<Record>,
    points: Vec<Record>,
    ignored: usize,
}

impl ActivityReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain a record stream into a report.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the stream.
    pub fn collect<I>(records: I) -> ConversionResult<Self>
    where
        I: IntoIterator<Item = ConversionResult<Record>>,
    {
        let mut report = Self::new();
        for record in records {
            report.push(record?);
        }
        Ok(report)
    }

    /// Add one record. A later session replaces an earlier one.
    pub fn push(&mut self, record: Record) {
        match record.kind {
            RecordKind::Session => self.session = Some(record),
            RecordKind::Lap => self.laps.push(record),
            RecordKind::Point => self.points.push(record),
            RecordKind::Other(_) => self.ignored += 1,
        }
    }

    /// The session summary, if the file had one.
    #[must_use]
    pub fn session(&self) -> Option<&Record> {
        self.session.as_ref()
    }

    /// Laps in file order.
    #[must_use]
    pub fn laps(&self) -> &[Record] {
        &self.laps
    }

    /// Points in file order.
    #[must_use]
    pub fn points(&self) -> &[Record] {
        &self.points
    }

    /// Number of records of any other kind that were skipped.
    #[must_use]
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Render the report text.
    ///
    /// # Errors
    ///
    /// Returns [`fmt::Error`] if a value cannot be formatted, for example a
    /// timestamp format asking for a UTC offset on the local conversion date.
    pub fn render(
        &self,
        source_name: &str,
        converted_at: NaiveDateTime,
        config: &ReportConfig,
    ) -> Result<String, fmt::Error> {
        let view = ReportView {
            report: self,
            source_name,
            converted_at,
            config,
        };
        let mut text = String::new();
        write!(text, "{view}")?;
        Ok(text)
    }
}

struct ReportView<'a> {
    report: &'a ActivityReport,
    source_name: &'a str,
    converted_at: NaiveDateTime,
    config: &'a ReportConfig,
}

impl ReportView<'_> {
    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Conversione file FIT: {} ===", self.source_name)?;
        writeln!(
            f,
            "Data conversione: {}",
            self.converted_at.format(&self.config.timestamp_format)
        )?;
        writeln!(f, "{}", "=".repeat(HEADER_RULE_WIDTH))?;
        writeln!(f)
    }

    fn write_session(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INFORMAZIONI SESSIONE")?;
        writeln!(f, "{}", "-".repeat(SECTION_RULE_WIDTH))?;
        if let Some(session) = &self.report.session {
            for (name, value) in session.fields() {
                writeln!(f, "{name}: {}", value.render(&self.config.timestamp_format)?)?;
            }
        }
        Ok(())
    }

    fn write_laps(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.laps.is_empty() {
            return Ok(());
        }
        write!(f, "\n\nDATI LAP\n")?;
        writeln!(f, "{}", "-".repeat(SECTION_RULE_WIDTH))?;
        for (index, lap) in self.report.laps.iter().enumerate() {
            write!(f, "\nLap {}:\n", index + 1)?;
            for (name, value) in lap.fields() {
                writeln!(f, "  {name}: {}", value.render(&self.config.timestamp_format)?)?;
            }
        }
        Ok(())
    }

    fn write_points(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points = &self.report.points;
        let Some(first) = points.first() else {
            return Ok(());
        };
        let window = self.config.preview_points;

        write!(f, "\n\nPUNTI DATI REGISTRATI\n")?;
        writeln!(f, "{}", "-".repeat(SECTION_RULE_WIDTH))?;
        write!(f, "Totale punti: {}\n\n", points.len())?;

        let names: Vec<&str> = first.field_names().collect();
        write!(f, "Campi disponibili: {}\n\n", names.join(", "))?;

        writeln!(f, "Primi {window} record:")?;
        for point in points.iter().take(window) {
            self.write_point(f, point)?;
        }

        // Trailing window only when it cannot overlap the leading one.
        if points.len() > window.saturating_mul(2) {
            write!(f, "\n... [record intermedi omessi] ...\n\n")?;
            writeln!(f, "Ultimi {window} record:")?;
            for point in &points[points.len() - window..] {
                self.write_point(f, point)?;
            }
        }
        Ok(())
    }

    fn write_point(&self, f: &mut fmt::Formatter<'_>, point: &Record) -> fmt::Result {
        let format = &self.config.timestamp_format;
        match self.config.point_style {
            PointStyle::Compact => {
                let parts: Vec<String> = point
                    .fields()
                    .filter(|(name, _)| {
                        self.config
                            .interesting_fields
                            .iter()
                            .any(|field| field.as_str() == *name)
                    })
                    .map(|(name, value)| Ok(format!("{name}={}", value.render(format)?)))
                    .collect::<Result<_, fmt::Error>>()?;
                writeln!(f, "  {}", parts.join(" | "))
            }
            PointStyle::Full => {
                let parts: Vec<String> = point
                    .fields()
                    .map(|(name, value)| Ok(format!("'{name}': {}", value.render_quoted(format)?)))
                    .collect::<Result<_, fmt::Error>>()?;
                writeln!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_session(f)?;
        self.write_laps(f)?;
        self.write_points(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use std::path::Path;

    fn converted_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 30, 8, 0, 0).unwrap()
    }

    fn point(i: i64) -> Record {
        Record::new(RecordKind::Point)
            .with_field("timestamp", start() + Duration::seconds(i))
            .with_field("heart_rate", 100_u64 + i as u64)
            .with_field("temperature", 21_i64)
    }

    fn sample(points: i64) -> Vec<Record> {
        let mut records = vec![
            Record::new(RecordKind::Other("file_id".into())).with_field("serial_number", 42_u64),
            Record::new(RecordKind::Session)
                .with_field("start_time", start())
                .with_field("total_distance", 1000_u64),
            Record::new(RecordKind::Lap).with_field("total_elapsed_time", 600.5_f64),
        ];
        records.extend((0..points).map(point));
        records
    }

    fn render(records: Vec<Record>, config: &ReportConfig) -> String {
        let report = ActivityReport::collect(records.into_iter().map(Ok)).unwrap();
        report.render("ride.fit", converted_at(), config).unwrap()
    }

    fn point_lines(text: &str) -> usize {
        text.lines().filter(|l| l.starts_with("  timestamp=")).count()
    }

    #[test]
    fn test_partition_by_kind() {
        let report = ActivityReport::collect(sample(3).into_iter().map(Ok)).unwrap();
        assert!(report.session().is_some());
        assert_eq!(report.laps().len(), 1);
        assert_eq!(report.points().len(), 3);
        assert_eq!(report.ignored(), 1);
    }

    #[test]
    fn test_last_session_wins() {
        let mut report = ActivityReport::new();
        report.push(Record::new(RecordKind::Session).with_field("sport", "running"));
        report.push(Record::new(RecordKind::Session).with_field("sport", "cycling"));

        let session = report.session().unwrap();
        assert_eq!(session.get("sport").unwrap().to_string(), "cycling");
    }

    #[test]
    fn test_collect_stops_on_error() {
        let stream = vec![
            Ok(Record::new(RecordKind::Lap)),
            Err(ConversionError::decode(Path::new("ride.fit"), "crc mismatch")),
            Ok(Record::new(RecordKind::Lap)),
        ];
        let result = ActivityReport::collect(stream);
        assert!(matches!(result, Err(ConversionError::Decode { .. })));
    }

    #[test]
    fn test_render_header() {
        let text = render(Vec::new(), &ReportConfig::default());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=== Conversione file FIT: ride.fit ===");
        assert_eq!(lines[1], "Data conversione: 2024-06-01 12:00:00");
        assert_eq!(lines[2], "=".repeat(60));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "INFORMAZIONI SESSIONE");
        assert_eq!(lines[5], "-".repeat(30));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_render_session_and_lap() {
        let text = render(sample(0), &ReportConfig::default());

        assert!(text.contains("start_time: 2024-05-30 08:00:00\n"));
        assert!(text.contains("total_distance: 1000\n"));
        assert!(text.contains("\n\nDATI LAP\n"));
        assert_eq!(text.matches("Lap 1:").count(), 1);
        assert!(text.contains("\nLap 1:\n  total_elapsed_time: 600.5\n"));
        assert!(!text.contains("PUNTI DATI REGISTRATI"));
        assert!(!text.contains("serial_number"));
    }

    #[test]
    fn test_render_25_points_has_both_windows() {
        let text = render(sample(25), &ReportConfig::default());

        assert!(text.contains("Totale punti: 25\n"));
        assert!(text.contains("Campi disponibili: timestamp, heart_rate, temperature\n"));

        let lines: Vec<&str> = text.lines().collect();
        let head = lines.iter().position(|l| *l == "Primi 10 record:").unwrap();
        for line in &lines[head + 1..=head + 10] {
            assert!(line.starts_with("  timestamp="), "unexpected line {line:?}");
        }
        assert_eq!(lines[head + 11], "");
        assert_eq!(lines[head + 12], "... [record intermedi omessi] ...");
        assert_eq!(lines[head + 13], "");
        assert_eq!(lines[head + 14], "Ultimi 10 record:");
        for line in &lines[head + 15..] {
            assert!(line.starts_with("  timestamp="), "unexpected line {line:?}");
        }
        assert_eq!(lines.len(), head + 25);
        assert_eq!(point_lines(&text), 20);

        // Trailing window ends with the last point.
        assert_eq!(
            *lines.last().unwrap(),
            "  timestamp=2024-05-30 08:00:24 | heart_rate=124"
        );
    }

    #[test]
    fn test_render_between_window_sizes_has_no_trailing_window() {
        let text = render(sample(15), &ReportConfig::default());

        assert!(text.contains("Totale punti: 15\n"));
        assert!(!text.contains("omessi"));
        assert!(!text.contains("Ultimi"));
        assert_eq!(point_lines(&text), 10);
    }

    #[test]
    fn test_render_exactly_double_window() {
        let text = render(sample(20), &ReportConfig::default());
        assert!(!text.contains("omessi"));
        assert_eq!(point_lines(&text), 10);

        let text = render(sample(21), &ReportConfig::default());
        assert!(text.contains("omessi"));
        assert_eq!(point_lines(&text), 20);
    }

    #[test]
    fn test_compact_style_filters_and_omits_missing() {
        let text = render(sample(1), &ReportConfig::default());
        assert!(text.contains("  timestamp=2024-05-30 08:00:00 | heart_rate=100\n"));
        assert!(!text.contains("temperature="));
    }

    #[test]
    fn test_full_style_renders_mapping() {
        let config = ReportConfig {
            point_style: PointStyle::Full,
            ..ReportConfig::default()
        };
        let text = render(sample(1), &config);
        assert!(text.contains(
            "{'timestamp': '2024-05-30 08:00:00', 'heart_rate': 100, 'temperature': 21}\n"
        ));
    }

    #[test]
    fn test_custom_preview_window() {
        let config = ReportConfig {
            preview_points: 2,
            ..ReportConfig::default()
        };
        let text = render(sample(5), &config);
        assert!(text.contains("Primi 2 record:"));
        assert!(text.contains("Ultimi 2 record:"));
        assert_eq!(point_lines(&text), 4);
    }

    #[test]
    fn test_huge_preview_window_prints_leading_only() {
        let config = ReportConfig {
            preview_points: usize::MAX,
            ..ReportConfig::default()
        };
        let text = render(sample(3), &config);
        assert!(!text.contains("Ultimi"));
        assert_eq!(point_lines(&text), 3);
    }

    #[test]
    fn test_render_offset_format_on_conversion_date_fails() {
        let config = ReportConfig {
            timestamp_format: "%Y-%m-%d %H:%M:%S %z".to_string(),
            ..ReportConfig::default()
        };
        let report = ActivityReport::collect(sample(1).into_iter().map(Ok)).unwrap();
        assert!(report.render("ride.fit", converted_at(), &config).is_err());
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = ReportConfig::default();
        assert_eq!(render(sample(30), &config), render(sample(30), &config));
    }

    #[test]
    fn test_point_style_serde() {
        assert_eq!(serde_json::to_string(&PointStyle::Full).unwrap(), "\"full\"");
        let style: PointStyle = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(style, PointStyle::Compact);
        assert_eq!(PointStyle::default(), PointStyle::Compact);
        assert_eq!(PointStyle::Full.to_string(), "full");
    }
}
