//! CLI argument value types.

use clap::ValueEnum;

use crate::report::PointStyle;

/// Point style argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PointStyleArg {
    /// Only the interesting fields of each point
    Compact,
    /// Every field of each point
    Full,
}

impl From<PointStyleArg> for PointStyle {
    fn from(arg: PointStyleArg) -> Self {
        match arg {
            PointStyleArg::Compact => Self::Compact,
            PointStyleArg::Full => Self::Full,
        }
    }
}
