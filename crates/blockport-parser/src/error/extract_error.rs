//! The fatal error of the extraction stage.

use thiserror::Error;

use crate::error::{Diagnostic, ErrorCode};

/// A source could not be turned into block records.
///
/// This is the only failure the pipeline reports to callers; every later
/// stage degrades instead of failing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive contains no entries")]
    NoEntries,

    #[error("archive is unreadable: {0}")]
    Unreadable(String),

    #[error("archive contains no block metadata or diagram entries (found: {})", .entries.join(", "))]
    NoRecognizableEntries { entries: Vec<String> },
}

impl ExtractError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractError::NoEntries => ErrorCode::E001,
            ExtractError::Unreadable(_) => ErrorCode::E002,
            ExtractError::NoRecognizableEntries { .. } => ErrorCode::E003,
        }
    }

    /// Converts this error into an error-severity [`Diagnostic`].
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string()).with_code(self.code());
        match self {
            ExtractError::NoRecognizableEntries { .. } => diagnostic
                .with_help("expected a project `.json` with block definitions or an `.svg` diagram"),
            _ => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_codes() {
        assert_eq!(ExtractError::NoEntries.code(), ErrorCode::E001);
        assert_eq!(
            ExtractError::Unreadable("bad header".into()).code(),
            ErrorCode::E002
        );
    }

    #[test]
    fn test_extract_error_display_lists_entries() {
        let err = ExtractError::NoRecognizableEntries {
            entries: vec!["icon.png".into(), "readme.txt".into()],
        };
        assert_eq!(
            err.to_string(),
            "archive contains no block metadata or diagram entries (found: icon.png, readme.txt)"
        );
    }

    #[test]
    fn test_extract_error_to_diagnostic() {
        let diag = ExtractError::NoEntries.to_diagnostic();
        assert_eq!(diag.severity(), crate::error::Severity::Error);
        assert_eq!(diag.to_string(), "error[E001]: archive contains no entries");
    }
}
