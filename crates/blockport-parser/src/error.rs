//! Error and diagnostic system for Blockport.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into diagram markup
//! - Severity levels
//! - A diagnostic collector for accumulating warnings across stages
//! - [`ExtractError`], the single fatal error of the pipeline
//!
//! # Overview
//!
//! Recognition problems are expected, common outcomes on hand-edited or
//! partially corrupted sources. They are reported as warning
//! [`Diagnostic`]s alongside a best-effort result. Only a source that cannot
//! be read at all produces an [`ExtractError`].
//!
//! # Example
//!
//! ```
//! # use blockport_parser::error::{Diagnostic, ErrorCode};
//! # use blockport_core::span::Span;
//! let diag = Diagnostic::warning("unrecognized block `do a barrel roll`")
//!     .with_code(ErrorCode::W200)
//!     .with_label(Span::new(120..160), "kept as a comment")
//!     .with_help("add a pattern rule for this block kind");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod extract_error;
mod label;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use extract_error::ExtractError;
pub use label::Label;
pub use severity::Severity;
