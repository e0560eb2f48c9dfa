//! The core diagnostic type for the Blockport error system.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, labeled source spans, and help text.

use std::fmt;

use blockport_core::span::Span;

use crate::error::{Severity, error_code::ErrorCode, label::Label};

/// A diagnostic message with optional source location information.
///
/// # Example
///
/// ```text
/// warning[W200]: unrecognized block `turn the turtle`
///    |
/// 12 |     <text x="0" y="20">turn the turtle</text>
///    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ kept as a comment
///    |
///    = help: add a pattern rule for this block kind
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use blockport_parser::error::{Diagnostic, ErrorCode};
    /// let diag = Diagnostic::error("archive contains no entries")
    ///     .with_code(ErrorCode::E001);
    /// assert_eq!(diag.to_string(), "error[E001]: archive contains no entries");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use blockport_parser::error::{Diagnostic, Severity};
    /// # use blockport_core::span::Span;
    /// let diag = Diagnostic::warning("unrecognized block `zap`")
    ///     .with_label(Span::new(0..10), "kept as a comment");
    /// assert_eq!(diag.severity(), Severity::Warning);
    /// ```
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a primary label when a span is available.
    ///
    /// Archive records have no markup to point at; their diagnostics are
    /// reported without labels.
    pub fn with_optional_label(self, span: Option<Span>, message: impl Into<String>) -> Self {
        match span {
            Some(span) => self.with_label(span, message),
            None => self,
        }
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "warning[W200]: message" or "warning: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_label() {
        let diag = Diagnostic::warning("malformed transform")
            .with_label(Span::new(10..20), "ignored");

        assert_eq!(diag.labels().len(), 1);
        assert!(diag.labels()[0].is_primary());
        assert_eq!(diag.labels()[0].message(), "ignored");
    }

    #[test]
    fn test_diagnostic_with_optional_label() {
        let with = Diagnostic::warning("w").with_optional_label(Some(Span::new(0..1)), "here");
        let without = Diagnostic::warning("w").with_optional_label(None, "here");

        assert_eq!(with.labels().len(), 1);
        assert!(without.labels().is_empty());
    }

    #[test]
    fn test_diagnostic_with_secondary_label() {
        let diag = Diagnostic::warning("unrecognized block")
            .with_label(Span::new(10..20), "this text")
            .with_secondary_label(Span::new(0..40), "in this group");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[1].is_secondary());
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::warning("port `Z` is out of range").with_code(ErrorCode::W301);

        assert_eq!(diag.to_string(), "warning[W301]: port `Z` is out of range");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::error("archive is unreadable");

        assert_eq!(diag.to_string(), "error: archive is unreadable");
    }
}
