//! Source extraction: project archives to raw block records.
//!
//! An archive is searched, recursing into embedded archives, for project
//! metadata (`*.json`) and diagrams (`*.svg`). Metadata wins: when any JSON
//! entry holds block definitions, the records come from those definitions
//! and diagrams are ignored. Otherwise the first diagram that yields records
//! is handed to the [diagram parser](crate::diagram).
//!
//! # Metadata records
//!
//! Block definitions live in JSON object maps named `blocks`, keyed by block
//! id. Each script starts at a top-level definition; scripts are visited in
//! their stored `(y, x)` order and walked along their `next` chain, entering
//! `SUBSTACK` (and `SUBSTACK2`, the `else` branch) one level deeper. The
//! `else` branch is opened by an extra [`ELSE_OPCODE`] record.
//!
//! Metadata carries no usable geometry, so each record gets a synthetic
//! position: one row per record and one indentation unit per nesting level.
//! The structure builder then recovers nesting exactly as it does for
//! diagrams.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use serde_json::{Map, Value};

use blockport_core::{
    block::{BlockDefinition, RawBlockRecord, SourceKind},
    geometry::{Point, Size},
};

use crate::{
    archive::ArchiveSource,
    diagram::parse_diagram,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ExtractError},
};

/// How deep embedded archives are followed.
const MAX_NESTING: usize = 4;

/// Synthetic record width per character, matching diagram estimates.
const CHAR_WIDTH: f32 = 7.0;

/// Opcode of the record opening an if/else's `else` branch.
///
/// The branch is expressed as a second conditional on the negated
/// condition, so it keeps its meaning without an `else` block kind.
pub const ELSE_OPCODE: &str = "control_else";

/// Binary reporter opcodes rendered as infix expressions.
const INFIX_OPERATORS: [(&str, &str); 9] = [
    ("operator_gt", ">"),
    ("operator_lt", "<"),
    ("operator_equals", "=="),
    ("operator_and", "and"),
    ("operator_or", "or"),
    ("operator_add", "+"),
    ("operator_subtract", "-"),
    ("operator_multiply", "*"),
    ("operator_divide", "/"),
];

/// Geometry used to lay out metadata records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticLayout {
    indent_unit: f32,
    row_height: f32,
}

impl SyntheticLayout {
    pub fn new(indent_unit: f32, row_height: f32) -> Self {
        Self {
            indent_unit,
            row_height,
        }
    }

    pub fn indent_unit(&self) -> f32 {
        self.indent_unit
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    fn position(&self, depth: usize, row: usize) -> Point {
        Point::new(
            depth as f32 * self.indent_unit,
            row as f32 * self.row_height,
        )
    }
}

impl Default for SyntheticLayout {
    fn default() -> Self {
        Self::new(20.0, 40.0)
    }
}

/// A diagram entry that records were taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSource {
    name: String,
    text: String,
}

impl DiagramSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The records recovered from one archive.
#[derive(Debug, Default)]
pub struct Extraction {
    records: Vec<RawBlockRecord>,
    diagnostics: Vec<Diagnostic>,
    diagram: Option<DiagramSource>,
}

impl Extraction {
    pub fn records(&self) -> &[RawBlockRecord] {
        &self.records
    }

    /// Warnings about skipped entries and degraded markup.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagram the records came from, when metadata was absent.
    ///
    /// Record spans index into this text.
    pub fn diagram(&self) -> Option<&DiagramSource> {
        self.diagram.as_ref()
    }

    pub fn into_parts(self) -> (Vec<RawBlockRecord>, Vec<Diagnostic>, Option<DiagramSource>) {
        (self.records, self.diagnostics, self.diagram)
    }
}

/// Extracts raw block records from an archive.
///
/// # Errors
///
/// * [`ExtractError::NoEntries`] if the archive has no entries.
/// * [`ExtractError::NoRecognizableEntries`] if no entry holds block
///   definitions or a diagram with text.
///
/// An unreadable container is reported when it is opened (see
/// [`ZipArchiveSource::new`](crate::archive::ZipArchiveSource::new)).
/// Unreadable individual entries are skipped with a warning diagnostic.
pub fn extract(
    archive: &mut dyn ArchiveSource,
    layout: SyntheticLayout,
) -> Result<Extraction, ExtractError> {
    let names = archive.entry_names();
    if names.is_empty() {
        return Err(ExtractError::NoEntries);
    }

    info!(entries = names.len(); "Extracting archive");

    let mut diagnostics = DiagnosticCollector::new();
    let mut contents = Contents::default();
    contents.collect(archive, "", 0, &mut diagnostics);

    debug!(
        metadata = contents.metadata.len(),
        diagrams = contents.diagrams.len();
        "Archive entries collected"
    );

    let mut reader = MetadataReader::new(layout);
    for (name, document) in &contents.metadata {
        let before = reader.records.len();
        for blocks in find_block_maps(document) {
            reader.read_blocks(blocks);
        }
        debug!(
            entry = name.as_str(),
            records = reader.records.len() - before;
            "Metadata entry read"
        );
    }

    if reader.found_definitions {
        return Ok(Extraction {
            records: reader.records,
            diagnostics: diagnostics.finish(),
            diagram: None,
        });
    }

    for (name, text) in contents.diagrams {
        let (records, diagram_diagnostics) = parse_diagram(&text).into_parts();
        diagnostics.extend(diagram_diagnostics);
        if records.is_empty() {
            debug!(entry = name.as_str(); "Diagram entry has no text records");
            continue;
        }

        info!(entry = name.as_str(), records = records.len(); "Using diagram entry");
        return Ok(Extraction {
            records,
            diagnostics: diagnostics.finish(),
            diagram: Some(DiagramSource { name, text }),
        });
    }

    warn!(entries:? = names; "No recognizable entries in archive");
    Err(ExtractError::NoRecognizableEntries { entries: names })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Metadata,
    Diagram,
    Nested,
    Other,
}

impl EntryKind {
    fn of(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".json") {
            EntryKind::Metadata
        } else if lower.ends_with(".svg") {
            EntryKind::Diagram
        } else if [".sb3", ".llsp3", ".llsp", ".zip"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            EntryKind::Nested
        } else {
            EntryKind::Other
        }
    }
}

/// Decoded entries of an archive and everything nested inside it.
#[derive(Default)]
struct Contents {
    metadata: Vec<(String, Value)>,
    diagrams: Vec<(String, String)>,
}

impl Contents {
    fn collect(
        &mut self,
        archive: &mut dyn ArchiveSource,
        prefix: &str,
        nesting: usize,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for name in archive.entry_names() {
            let kind = EntryKind::of(&name);
            if kind == EntryKind::Other {
                trace!(entry = name.as_str(); "Skipping entry");
                continue;
            }

            let path = format!("{prefix}{name}");
            let bytes = match archive.read_entry(&name) {
                Ok(bytes) => bytes,
                Err(err) => {
                    diagnostics.emit(unreadable_entry(&path, &err.to_string()));
                    continue;
                }
            };

            match kind {
                EntryKind::Metadata => match serde_json::from_slice::<Value>(&bytes) {
                    Ok(value) => self.metadata.push((path, value)),
                    Err(err) => diagnostics.emit(
                        Diagnostic::warning(format!("entry `{path}` is not valid JSON: {err}"))
                            .with_code(ErrorCode::W103),
                    ),
                },
                EntryKind::Diagram => match String::from_utf8(bytes) {
                    Ok(text) => self.diagrams.push((path, text)),
                    Err(err) => diagnostics.emit(unreadable_entry(&path, &err.to_string())),
                },
                EntryKind::Nested if nesting < MAX_NESTING => {
                    match archive.open_nested(bytes) {
                        Ok(mut nested) => {
                            debug!(entry = path.as_str(); "Entering nested archive");
                            let prefix = format!("{path}/");
                            self.collect(nested.as_mut(), &prefix, nesting + 1, diagnostics);
                        }
                        Err(err) => diagnostics.emit(unreadable_entry(&path, &err.to_string())),
                    }
                }
                EntryKind::Nested => {
                    debug!(entry = path.as_str(); "Nested archive too deep, skipped");
                }
                EntryKind::Other => {}
            }
        }
    }
}

fn unreadable_entry(path: &str, reason: &str) -> Diagnostic {
    Diagnostic::warning(format!("skipped unreadable entry `{path}`: {reason}"))
        .with_code(ErrorCode::W102)
}

/// Finds every `blocks` map whose values look like block definitions.
fn find_block_maps(value: &Value) -> Vec<&Map<String, Value>> {
    let mut found = Vec::new();
    visit_block_maps(value, &mut found);
    found
}

fn visit_block_maps<'v>(value: &'v Value, found: &mut Vec<&'v Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::Object(blocks) if key == "blocks" && holds_definitions(blocks) => {
                        found.push(blocks);
                    }
                    _ => visit_block_maps(child, found),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| visit_block_maps(item, found)),
        _ => {}
    }
}

fn holds_definitions(blocks: &Map<String, Value>) -> bool {
    blocks
        .values()
        .any(|block| block.get("opcode").and_then(Value::as_str).is_some())
}

/// Work left while reading a stack.
enum Pending<'b> {
    /// A chain of blocks linked by `next`, starting at the id.
    Chain(&'b str, usize),
    /// The `else` marker of an if/else block, then its alternative body.
    Else {
        condition: Option<String>,
        body: &'b str,
        depth: usize,
    },
}

/// Walks block maps, emitting one record per stack block.
struct MetadataReader {
    layout: SyntheticLayout,
    records: Vec<RawBlockRecord>,
    found_definitions: bool,
}

impl MetadataReader {
    fn new(layout: SyntheticLayout) -> Self {
        Self {
            layout,
            records: Vec::new(),
            found_definitions: false,
        }
    }

    fn read_blocks(&mut self, blocks: &Map<String, Value>) {
        self.found_definitions = true;

        let mut tops: Vec<(&str, f64, f64)> = blocks
            .iter()
            .filter(|(_, block)| is_top_level(block) && !is_shadow(block))
            .map(|(id, block)| {
                let x = block.get("x").and_then(Value::as_f64).unwrap_or(0.0);
                let y = block.get("y").and_then(Value::as_f64).unwrap_or(0.0);
                (id.as_str(), y, x)
            })
            .collect();
        tops.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

        let mut visited = HashSet::new();
        for (id, _, _) in tops {
            self.read_chain(blocks, id, &mut visited);
        }
    }

    /// Emits a stack and everything nested in it, depth first.
    ///
    /// Nesting is followed with an explicit work list, so arbitrarily deep
    /// `SUBSTACK` chains cannot exhaust the call stack.
    fn read_chain<'b>(
        &mut self,
        blocks: &'b Map<String, Value>,
        first: &'b str,
        visited: &mut HashSet<&'b str>,
    ) {
        let mut pending = vec![Pending::Chain(first, 0)];

        while let Some(step) = pending.pop() {
            let (id, depth) = match step {
                Pending::Chain(id, depth) => (id, depth),
                Pending::Else {
                    condition,
                    body,
                    depth,
                } => {
                    let mut values = IndexMap::new();
                    if let Some(condition) = condition {
                        values.insert("CONDITION".to_string(), condition);
                    }
                    self.push(ELSE_OPCODE, values, depth);
                    pending.push(Pending::Chain(body, depth + 1));
                    continue;
                }
            };

            if !visited.insert(id) {
                debug!(block = id; "Block chain revisits a block, stopping");
                continue;
            }
            let Some(block) = blocks.get(id) else {
                debug!(block = id; "Block chain references a missing block");
                continue;
            };
            let Some(opcode) = block.get("opcode").and_then(Value::as_str) else {
                continue;
            };

            let values = block_values(blocks, block);
            let negated = values
                .get("CONDITION")
                .map(|condition| format!("not ({condition})"));
            self.push(opcode, values, depth);

            // Pushed in reverse of emission order.
            if let Some(next) = block.get("next").and_then(Value::as_str) {
                pending.push(Pending::Chain(next, depth));
            }
            if let Some(body) = substack(block, "SUBSTACK2") {
                pending.push(Pending::Else {
                    condition: negated,
                    body,
                    depth,
                });
            }
            if let Some(body) = substack(block, "SUBSTACK") {
                pending.push(Pending::Chain(body, depth + 1));
            }
        }
    }

    fn push(&mut self, opcode: &str, values: IndexMap<String, String>, depth: usize) {
        let text = synthesize_text(opcode, &values);
        let position = self.layout.position(depth, self.records.len());
        let size = Size::new(
            text.chars().count() as f32 * CHAR_WIDTH,
            self.layout.row_height(),
        );

        trace!(opcode, depth, text = text.as_str(); "Metadata record");

        let definition = BlockDefinition::new(opcode, values);
        self.records.push(RawBlockRecord::new(
            text,
            position,
            size,
            SourceKind::Archive(definition),
        ));
    }
}

fn is_top_level(block: &Value) -> bool {
    block.get("topLevel").and_then(Value::as_bool).unwrap_or(false)
}

fn is_shadow(block: &Value) -> bool {
    block.get("shadow").and_then(Value::as_bool).unwrap_or(false)
}

/// The id of the first block of a statement input.
fn substack<'b>(block: &'b Value, input: &str) -> Option<&'b str> {
    block
        .get("inputs")?
        .get(input)?
        .as_array()?
        .get(1)?
        .as_str()
}

/// Resolves a block's fields and non-statement inputs to display values.
fn block_values(blocks: &Map<String, Value>, block: &Value) -> IndexMap<String, String> {
    let mut values = IndexMap::new();

    if let Some(fields) = block.get("fields").and_then(Value::as_object) {
        for (name, field) in fields {
            if let Some(value) = field.as_array().and_then(|f| f.first()).and_then(scalar) {
                values.insert(name.clone(), value);
            }
        }
    }

    if let Some(inputs) = block.get("inputs").and_then(Value::as_object) {
        for (name, input) in inputs {
            if name.starts_with("SUBSTACK") {
                continue;
            }
            if let Some(value) = input_value(blocks, input, 0) {
                values.insert(name.clone(), value);
            }
        }
    }

    values
}

/// Resolves an input slot `[shadow_kind, value, obscured_shadow?]`.
fn input_value(blocks: &Map<String, Value>, input: &Value, depth: usize) -> Option<String> {
    let slot = input.as_array()?;
    slot.iter()
        .skip(1)
        .find_map(|value| slot_value(blocks, value, depth))
}

fn slot_value(blocks: &Map<String, Value>, value: &Value, depth: usize) -> Option<String> {
    match value {
        Value::String(id) => reporter_value(blocks, id, depth),
        // Literal `[type, value, ...]`; variables and lists carry their name.
        Value::Array(literal) => literal.get(1).and_then(scalar),
        _ => None,
    }
}

/// Renders a referenced block (menu, variable or reporter) as text.
fn reporter_value(blocks: &Map<String, Value>, id: &str, depth: usize) -> Option<String> {
    if depth > 16 {
        return None;
    }
    let block = blocks.get(id)?;
    let opcode = block.get("opcode").and_then(Value::as_str).unwrap_or_default();
    let input = |name: &str| {
        block
            .get("inputs")
            .and_then(|inputs| inputs.get(name))
            .and_then(|input| input_value(blocks, input, depth + 1))
    };

    if let Some((_, operator)) = INFIX_OPERATORS.iter().find(|(op, _)| *op == opcode) {
        let left = input("OPERAND1").or_else(|| input("NUM1"))?;
        let right = input("OPERAND2").or_else(|| input("NUM2"))?;
        return Some(format!("{left} {operator} {right}"));
    }
    if opcode == "operator_not" {
        return input("OPERAND").map(|operand| format!("not {operand}"));
    }

    let field = block
        .get("fields")
        .and_then(Value::as_object)
        .and_then(|fields| fields.values().next())
        .and_then(|field| field.as_array())
        .and_then(|field| field.first())
        .and_then(scalar);

    field.or_else(|| (!opcode.is_empty()).then(|| opcode.to_string()))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Builds the human-readable text of a metadata record.
///
/// The opcode's words come first, then each value under its key. Values that
/// are neither numbers nor single letters are quoted so free text stays
/// delimited.
fn synthesize_text(opcode: &str, values: &IndexMap<String, String>) -> String {
    let mut text = opcode.replace('_', " ");
    for (key, value) in values {
        text.push(' ');
        text.push_str(key);
        text.push(' ');
        if value.parse::<f64>().is_ok() || is_single_letter(value) {
            text.push_str(value);
        } else {
            text.push('"');
            text.push_str(value);
            text.push('"');
        }
    }
    text
}

fn is_single_letter(value: &str) -> bool {
    let mut chars = value.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}
