//! # Blockport Parser
//!
//! Turns block-program sources into unordered [`RawBlockRecord`]s:
//!
//! 1. **Archives** - [`extract`] searches a project archive (through the
//!    [`ArchiveSource`] trait) for block metadata, falling back to diagrams.
//! 2. **Diagrams** - [`parse_diagram`] walks vector-graphics markup and
//!    groups text by enclosing shape, resolving ancestor transforms.
//!
//! Only an unusable archive is an error ([`ExtractError`]). Malformed markup
//! and skipped entries are reported as warning [`Diagnostic`]s next to a
//! best-effort result.
//!
//! ## Usage
//!
//! ```
//! # use blockport_parser::{extract, ExtractError, MemoryArchive, SyntheticLayout};
//! fn main() -> Result<(), ExtractError> {
//!     let svg = r#"<svg><text x="0" y="0">when program starts</text></svg>"#;
//!     let mut archive = MemoryArchive::new().with_entry("program.svg", svg);
//!
//!     let extraction = extract(&mut archive, SyntheticLayout::default())?;
//!     assert_eq!(extraction.records()[0].text(), "when program starts");
//!     Ok(())
//! }
//! ```
//!
//! [`RawBlockRecord`]: blockport_core::block::RawBlockRecord

pub mod archive;
pub mod diagram;
pub mod error;
pub mod extract;
pub mod transform;

pub use archive::{ArchiveSource, EntryError, MemoryArchive, ZipArchiveSource};
pub use diagram::{ParsedDiagram, parse_diagram};
pub use error::{Diagnostic, ErrorCode, ExtractError, Severity};
pub use extract::{DiagramSource, Extraction, SyntheticLayout, extract};
