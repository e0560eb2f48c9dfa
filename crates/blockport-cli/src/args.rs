//! Command-line argument definitions for the Blockport CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the inputs and where programs are
//! written, the configuration file, the input format and logging verbosity.

use clap::{Parser, ValueEnum};

use blockport::InputFormat;

/// Command-line arguments for the Blockport converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Paths to block diagrams (.svg) or project archives
    #[arg(required = true, help = "Paths to the input files")]
    pub inputs: Vec<String>,

    /// Path to the output Python file (single input only)
    #[arg(short, long, conflicts_with = "out_dir")]
    pub output: Option<String>,

    /// Directory to write one `<stem>.py` per input into
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// How inputs are read
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,
}

/// Input format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Diagram for `.svg` files, archive otherwise
    Auto,
    /// Vector-graphics block diagram
    Diagram,
    /// Project archive
    Archive,
}

impl Format {
    /// Resolves the format for one input path.
    pub fn resolve(self, path: &std::path::Path) -> InputFormat {
        match self {
            Format::Auto => InputFormat::from_path(path),
            Format::Diagram => InputFormat::Diagram,
            Format::Archive => InputFormat::Archive,
        }
    }
}
