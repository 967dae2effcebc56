//! Configuration management for fit2txt.
//!
//! This module provides configuration loading and validation using figment,
//! supporting a TOML config file, environment variables, and defaults.
//! Command-line flags are applied on top by the binary.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::DEFAULT_TIMESTAMP_FORMAT;
use crate::report::PointStyle;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name.
const CONFIG_DIR_NAME: &str = "fit2txt";

/// Environment variable prefix.
const ENV_PREFIX: &str = "FIT2TXT_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FIT2TXT_`, sections split on `__`)
/// 2. TOML config file at `~/.config/fit2txt/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report layout configuration.
    pub report: ReportConfig,
    /// Input discovery configuration.
    pub scan: ScanConfig,
}

/// How reports are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// How individual points are printed.
    pub point_style: PointStyle,
    /// How many points to show at the start and at the end of the point list.
    pub preview_points: usize,
    /// Fields kept by the compact point style, in no particular order.
    pub interesting_fields: Vec<String>,
    /// strftime format used for timestamps and the conversion date.
    pub timestamp_format: String,
}

/// Which files are picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// File extension to look for, compared case-insensitively, without the dot.
    pub extension: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            point_style: PointStyle::Compact,
            preview_points: 10,
            interesting_fields: default_interesting_fields(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            extension: "fit".to_string(),
        }
    }
}

/// Fields shown for each point in compact style.
#[must_use]
pub fn default_interesting_fields() -> Vec<String> {
    [
        "timestamp",
        "position_lat",
        "position_long",
        "altitude",
        "heart_rate",
        "power",
        "cadence",
        "speed",
        "distance",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.report.preview_points == 0 {
            return Err(Error::config_validation(
                "preview_points must be greater than 0",
            ));
        }

        if self.report.point_style == PointStyle::Compact
            && self.report.interesting_fields.is_empty()
        {
            return Err(Error::config_validation(
                "interesting_fields cannot be empty with the compact point style",
            ));
        }

        if !is_local_timestamp_format(&self.report.timestamp_format) {
            return Err(Error::config_validation(format!(
                "invalid timestamp_format: {:?}",
                self.report.timestamp_format
            )));
        }

        let ext = &self.scan.extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(Error::config_validation(format!(
                "extension must be a bare file extension such as \"fit\", got {ext:?}"
            )));
        }

        Ok(())
    }
}

/// Check that `format` parses and can be applied to a date without an offset.
///
/// The conversion date is local wall-clock time, so `%z` and friends fail
/// there even though they parse.
fn is_local_timestamp_format(format: &str) -> bool {
    if format.is_empty() || StrftimeItems::new(format).any(|i| i == Item::Error) {
        return false;
    }
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    sample.is_some_and(|dt| write!(String::new(), "{}", dt.format(format)).is_ok())
}
