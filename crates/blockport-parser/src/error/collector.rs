//! Collector for accumulating diagnostics during a conversion.
//!
//! Every stage after extraction is total, so problems are gathered here
//! as warnings instead of aborting the pipeline.

use crate::error::Diagnostic;

/// A collector for accumulating diagnostics across pipeline stages.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Emit every diagnostic from `diagnostics`, preserving their order.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Finish collection and return every diagnostic in emission order.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_new_is_empty() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn test_collector_counts_diagnostics() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("warning 1"));
        collector.emit(Diagnostic::error("error 1"));

        assert_eq!(collector.len(), 2);
        assert!(!collector.is_empty());
    }

    #[test]
    fn test_collector_preserves_order() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("first"));
        collector.extend(vec![
            Diagnostic::warning("second"),
            Diagnostic::warning("third"),
        ]);

        let messages: Vec<_> = collector
            .finish()
            .iter()
            .map(|d| d.message().to_string())
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }
}
