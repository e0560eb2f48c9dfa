//! Error types for Blockport operations.
//!
//! Recognition problems never surface here; they are warnings attached to a
//! [`Conversion`](crate::Conversion). [`BlockportError`] covers the cases
//! where no program can be produced at all.

use std::io;

use thiserror::Error;

use blockport_parser::ExtractError;

/// The main error type for Blockport operations.
#[derive(Debug, Error)]
pub enum BlockportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
