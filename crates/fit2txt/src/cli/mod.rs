//! Command-line interface for fit2txt.
//!
//! This module provides the argument structure of the `fit2txt` binary and
//! the console rendering of batch progress.

mod args;
mod display;

use std::path::PathBuf;

use clap::Parser;

pub use args::PointStyleArg;
pub use display::Console;

use crate::batch::BatchConfig;
use crate::config::Config;
use crate::logging::Verbosity;

const EXAMPLES: &str = "\
Examples:
  # Convert a single file
  fit2txt path/to/ride.fit

  # Convert every file in a folder
  fit2txt path/to/folder/

  # Include subfolders
  fit2txt -r path/to/folder/

  # Write reports somewhere else
  fit2txt path/to/input/ -o path/to/output/

  # Quiet mode
  fit2txt -q path/to/folder/";

/// fit2txt - Convert FIT activity files into readable text reports
///
/// Each input file produces a `<name>.txt` report with the session summary,
/// every lap, and a preview of the recorded points.
#[derive(Debug, Parser)]
#[command(name = "fit2txt")]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    /// A .fit file or a folder containing .fit files
    pub input: PathBuf,

    /// Output folder (default: the input's own folder)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Also look for .fit files in subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Suppress all logging except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How points are printed (overrides the configuration file)
    #[arg(short, long, value_enum)]
    pub style: Option<PointStyleArg>,

    /// Print the final summary as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// Build the batch settings: configuration first, flags on top.
    #[must_use]
    pub fn batch_config(&self, config: &Config) -> BatchConfig {
        let mut batch = BatchConfig::from_config(&self.input, config)
            .with_recursive(self.recursive || config.scan.recursive);
        if let Some(dir) = &self.output {
            batch = batch.with_output_dir(dir);
        }
        if let Some(style) = self.style {
            batch.report.point_style = style.into();
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PointStyle;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "fit2txt");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["fit2txt"]).is_err());
    }

    #[test]
    fn test_parse_defaults() {
        let cli = parse(&["fit2txt", "rides/"]);
        assert_eq!(cli.input, PathBuf::from("rides/"));
        assert!(cli.output.is_none());
        assert!(!cli.recursive);
        assert!(!cli.quiet);
        assert!(!cli.json);
        assert!(cli.style.is_none());
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = parse(&[
            "fit2txt", "-r", "-q", "-o", "out", "-c", "cfg.toml", "-s", "full", "--json", "in",
        ]);
        assert!(cli.recursive);
        assert!(cli.quiet);
        assert!(cli.json);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(cli.style, Some(PointStyleArg::Full));
    }

    #[test]
    fn test_parse_long_flags() {
        let cli = parse(&["fit2txt", "--recursive", "--output", "out", "--quiet", "in"]);
        assert!(cli.recursive);
        assert!(cli.quiet);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["fit2txt", "in"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["fit2txt", "-v", "in"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["fit2txt", "-vv", "in"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["fit2txt", "-q", "-v", "in"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_batch_config_uses_configuration() {
        let mut config = Config::default();
        config.scan.recursive = true;
        config.report.point_style = PointStyle::Full;

        let batch = parse(&["fit2txt", "in"]).batch_config(&config);
        assert!(batch.recursive);
        assert_eq!(batch.report.point_style, PointStyle::Full);
        assert!(batch.output_dir.is_none());
    }

    #[test]
    fn test_batch_config_flags_override() {
        let config = Config::default();
        let batch =
            parse(&["fit2txt", "-r", "-o", "out", "-s", "full", "in"]).batch_config(&config);

        assert!(batch.recursive);
        assert_eq!(batch.output_dir, Some(PathBuf::from("out")));
        assert_eq!(batch.report.point_style, PointStyle::Full);
        assert_eq!(batch.input, PathBuf::from("in"));
    }
}
