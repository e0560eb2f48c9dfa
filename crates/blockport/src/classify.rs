//! Block classification.
//!
//! Maps each [`RawBlockRecord`] to a [`BlockKind`] and its parameters.
//!
//! Archive records carry an explicit opcode, which is looked up in the
//! opcode table first. Everything else (and opcodes the table does not
//! know) goes through the ordered [pattern rules](rules::rules): the text is
//! normalized and the first matching rule wins. A miss is not an error; the
//! record becomes an [`BlockKind::Unknown`] block and is kept.

pub mod params;
pub mod rules;

use log::{debug, trace};

use blockport_core::{
    block::{BlockKind, ClassifiedBlock, RawBlockRecord},
    param::Parameters,
};
use blockport_parser::error::{Diagnostic, DiagnosticCollector, ErrorCode};

use params::{ParamIssue, extract_parameters, normalize};
use rules::{PatternRule, is_untranslatable, kind_for_opcode, rule_for, rules};

/// The outcome of recognizing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Matched {
        kind: BlockKind,
        parameters: Parameters,
        confidence: f32,
        issues: Vec<ParamIssue>,
    },
    Unrecognized(String),
}

/// Recognizes a record's kind and parameters.
///
/// # Examples
///
/// ```
/// # use blockport::classify::{recognize, Recognition};
/// # use blockport_core::block::{BlockKind, RawBlockRecord, SourceKind};
/// # use blockport_core::geometry::{Point, Size};
/// let record = RawBlockRecord::new(
///     "motor A stop",
///     Point::default(),
///     Size::default(),
///     SourceKind::Diagram,
/// );
///
/// let Recognition::Matched { kind, .. } = recognize(&record) else {
///     panic!("expected a match");
/// };
/// assert_eq!(kind, BlockKind::MotorStop);
/// ```
pub fn recognize(record: &RawBlockRecord) -> Recognition {
    let tagged = record
        .source()
        .definition()
        .and_then(|definition| Some((definition.opcode(), kind_for_opcode(definition.opcode())?)));

    if let Some((opcode, kind)) = tagged {
        trace!(opcode, kind:% = kind; "Opcode tagged");
        return match rule_for(kind) {
            Some(rule) => matched(rule, record, 1.0),
            None => Recognition::Unrecognized(record.text().to_string()),
        };
    }

    let normalized = normalize(record.text());
    if is_untranslatable(&normalized) {
        trace!(text = normalized.as_str(); "Block has no translation");
        return Recognition::Unrecognized(record.text().to_string());
    }
    match rules().iter().find(|rule| rule.matches(&normalized)) {
        Some(rule) => matched(rule, record, rule.confidence(&normalized)),
        None => Recognition::Unrecognized(record.text().to_string()),
    }
}

fn matched(rule: &PatternRule, record: &RawBlockRecord, confidence: f32) -> Recognition {
    let (parameters, issues) =
        extract_parameters(rule.params(), record.text(), record.source().definition());
    Recognition::Matched {
        kind: rule.kind(),
        parameters,
        confidence,
        issues,
    }
}

/// Classifies one record, reporting misses and parameter issues.
pub fn classify(record: RawBlockRecord, diagnostics: &mut DiagnosticCollector) -> ClassifiedBlock {
    match recognize(&record) {
        Recognition::Matched {
            kind,
            parameters,
            confidence,
            issues,
        } => {
            trace!(kind:% = kind, confidence; "Block classified");
            for issue in issues {
                diagnostics.emit(issue_diagnostic(&record, kind, issue));
            }
            ClassifiedBlock::new(record, kind, parameters, confidence)
        }
        Recognition::Unrecognized(text) => {
            debug!(text = text.as_str(); "Block not recognized, keeping as comment");
            diagnostics.emit(
                Diagnostic::warning(format!("unrecognized block `{text}`"))
                    .with_code(ErrorCode::W200)
                    .with_optional_label(record.span(), "kept as a comment")
                    .with_help("the block is preserved as a comment in the generated program"),
            );
            ClassifiedBlock::unknown(record)
        }
    }
}

/// Classifies every record, keeping their order.
pub fn classify_all(
    records: Vec<RawBlockRecord>,
    diagnostics: &mut DiagnosticCollector,
) -> Vec<ClassifiedBlock> {
    records
        .into_iter()
        .map(|record| classify(record, diagnostics))
        .collect()
}

fn issue_diagnostic(record: &RawBlockRecord, kind: BlockKind, issue: ParamIssue) -> Diagnostic {
    match issue {
        ParamIssue::Defaulted { name, value } => Diagnostic::warning(format!(
            "{kind} block `{}` has no `{name}`, using {value:?}",
            record.text()
        ))
        .with_code(ErrorCode::W300)
        .with_optional_label(record.span(), "default substituted"),
        ParamIssue::InvalidPort { name, port } => Diagnostic::warning(format!(
            "{kind} block `{}` uses port {port} for `{name}`; valid ports are A to F",
            record.text()
        ))
        .with_code(ErrorCode::W301)
        .with_optional_label(record.span(), "port kept as written"),
    }
}
