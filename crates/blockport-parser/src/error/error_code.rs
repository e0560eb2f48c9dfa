//! Error codes for the Blockport diagnostic system.
//!
//! Codes are organized by pipeline stage:
//! - `E0xx` - Extraction errors (fatal for the source)
//! - `W1xx` - Markup and metadata warnings
//! - `W2xx` - Classification warnings
//! - `W3xx` - Parameter warnings

use std::fmt;

/// Codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Extraction Errors (E0xx)
    // =========================================================================
    /// The archive lists no entries at all.
    E001,

    /// The archive container could not be opened or read.
    E002,

    /// The archive has entries, but none holds block metadata or a diagram.
    E003,

    // =========================================================================
    // Markup Warnings (W1xx)
    // =========================================================================
    /// Malformed diagram markup.
    ///
    /// The document could not be parsed; it contributes no blocks.
    W100,

    /// Unsupported or malformed `transform` attribute.
    ///
    /// The element is treated as untransformed.
    W101,

    /// An archive entry could not be read or decoded and was skipped.
    W102,

    /// A metadata entry is not valid JSON and was skipped.
    W103,

    // =========================================================================
    // Classification Warnings (W2xx)
    // =========================================================================
    /// No rule matched the block text; it is kept as a comment.
    W200,

    /// Control blocks nested too deep; their bodies were flattened.
    W201,

    // =========================================================================
    // Parameter Warnings (W3xx)
    // =========================================================================
    /// A parameter was missing from the block text and was defaulted.
    W300,

    /// A port letter outside `A`–`F` was kept verbatim.
    W301,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::W100 => "W100",
            ErrorCode::W101 => "W101",
            ErrorCode::W102 => "W102",
            ErrorCode::W103 => "W103",
            ErrorCode::W200 => "W200",
            ErrorCode::W201 => "W201",
            ErrorCode::W300 => "W300",
            ErrorCode::W301 => "W301",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "empty archive",
            ErrorCode::E002 => "unreadable archive",
            ErrorCode::E003 => "no recognizable entries",
            ErrorCode::W100 => "malformed markup",
            ErrorCode::W101 => "unsupported transform",
            ErrorCode::W102 => "unreadable entry",
            ErrorCode::W103 => "invalid metadata",
            ErrorCode::W200 => "unrecognized block",
            ErrorCode::W201 => "nesting too deep",
            ErrorCode::W300 => "defaulted parameter",
            ErrorCode::W301 => "port out of range",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
