//! Diagram parser: vector-graphics markup to raw block records.
//!
//! The parser walks the element tree in document order, accumulating
//! `transform` translations from root to leaf. Every `<text>` element
//! contributes a text fragment. Fragments that share an enclosing shape (the
//! nearest `<g>` that directly draws a shape such as a `<rect>` or `<path>`)
//! are concatenated into a single record; a `<text>` outside any such group
//! is a record of its own.
//!
//! Records are returned in document order. Spatial ordering is established
//! later by the structure builder.

use indexmap::IndexMap;
use log::{debug, trace};
use roxmltree::{Document, Node, NodeId, ParsingOptions, TextPos};

use blockport_core::{
    block::{RawBlockRecord, SourceKind},
    geometry::{Point, Size},
    span::Span,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    transform::{parse_length, parse_transform, total_offset},
};

/// Estimated glyph advance used when a record has no drawn shape.
const CHAR_WIDTH: f32 = 7.0;
/// Estimated line height used when a record has no drawn shape.
const LINE_HEIGHT: f32 = 16.0;

const SHAPE_ELEMENTS: [&str; 6] = ["rect", "path", "polygon", "polyline", "circle", "ellipse"];

/// Deepest element nesting accepted; the markup parser recurses per level.
const MAX_MARKUP_DEPTH: usize = 256;

/// Subtrees that are never rendered directly.
const SKIPPED_ELEMENTS: [&str; 5] = ["defs", "style", "script", "metadata", "title"];

/// The outcome of parsing one diagram.
///
/// Parsing never fails: malformed markup yields no records and a warning.
#[derive(Debug, Default)]
pub struct ParsedDiagram {
    records: Vec<RawBlockRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl ParsedDiagram {
    pub fn records(&self) -> &[RawBlockRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<RawBlockRecord>, Vec<Diagnostic>) {
        (self.records, self.diagnostics)
    }
}

/// Parses diagram markup into raw block records.
///
/// # Examples
///
/// ```
/// # use blockport_parser::diagram::parse_diagram;
/// let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
///   <g transform="translate(10, 20)">
///     <rect width="120" height="30"/>
///     <text x="5" y="15">motor A run</text>
///     <text x="60" y="15">for 3 seconds</text>
///   </g>
/// </svg>"#;
///
/// let parsed = parse_diagram(svg);
/// let record = &parsed.records()[0];
/// assert_eq!(record.text(), "motor A run for 3 seconds");
/// assert_eq!(record.position().x(), 15.0);
/// assert_eq!(record.position().y(), 35.0);
/// ```
pub fn parse_diagram(source: &str) -> ParsedDiagram {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };

    if let Some(offset) = too_deep_at(source, MAX_MARKUP_DEPTH) {
        debug!(max = MAX_MARKUP_DEPTH; "Diagram markup nested too deep, no records produced");
        let diagnostic = Diagnostic::warning(format!(
            "malformed diagram markup: elements nested deeper than {MAX_MARKUP_DEPTH} levels"
        ))
        .with_code(ErrorCode::W100)
        .with_label(Span::new(offset..offset), "limit exceeded here")
        .with_help("the diagram was skipped");
        return ParsedDiagram {
            records: Vec::new(),
            diagnostics: vec![diagnostic],
        };
    }

    let document = match Document::parse_with_options(source, options) {
        Ok(document) => document,
        Err(err) => {
            debug!(error:% = err; "Diagram markup is malformed, no records produced");
            let offset = byte_offset(source, err.pos());
            let diagnostic = Diagnostic::warning(format!("malformed diagram markup: {err}"))
                .with_code(ErrorCode::W100)
                .with_label(Span::new(offset..offset), "parsing stopped here")
                .with_help("the diagram was skipped; check that every element is closed");
            return ParsedDiagram {
                records: Vec::new(),
                diagnostics: vec![diagnostic],
            };
        }
    };

    let mut walker = Walker::default();
    walker.walk(document.root_element());

    let records: Vec<_> = walker
        .groups
        .into_values()
        .filter_map(TextGroup::into_record)
        .collect();

    debug!(records = records.len(); "Diagram parsed");

    ParsedDiagram {
        records,
        diagnostics: walker.diagnostics.finish(),
    }
}

/// Text collected for one enclosing shape.
#[derive(Debug, Default)]
struct TextGroup {
    fragments: Vec<String>,
    anchor: Option<Point>,
    shape_size: Option<Size>,
    span: Option<Span>,
}

impl TextGroup {
    fn push(&mut self, text: String, anchor: Point, span: Span) {
        self.anchor.get_or_insert(anchor);
        self.span = Some(self.span.map_or(span, |s| s.union(span)));
        self.fragments.push(text);
    }

    fn into_record(self) -> Option<RawBlockRecord> {
        let text = collapse_whitespace(&self.fragments.join(" "));
        if text.is_empty() {
            return None;
        }

        let size = self.shape_size.unwrap_or_else(|| {
            Size::new(text.chars().count() as f32 * CHAR_WIDTH, LINE_HEIGHT)
        });
        let position = self.anchor.unwrap_or_default();

        trace!(text = text.as_str(), x = position.x(), y = position.y(); "Diagram record");

        let record = RawBlockRecord::new(text, position, size, SourceKind::Diagram);
        Some(match self.span {
            Some(span) => record.with_span(span),
            None => record,
        })
    }
}

#[derive(Default)]
struct Walker {
    groups: IndexMap<NodeId, TextGroup>,
    diagnostics: DiagnosticCollector,
}

impl Walker {
    /// Visits elements in document order with their accumulated offset and
    /// enclosing shape group.
    fn walk(&mut self, root: Node<'_, '_>) {
        let mut pending: Vec<(Node<'_, '_>, Point, Option<NodeId>)> =
            vec![(root, Point::default(), None)];

        while let Some((node, parent_offset, group)) = pending.pop() {
            let name = node.tag_name().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }

            let offset = parent_offset.add_point(self.element_offset(node));

            if name == "text" {
                self.collect_text(node, offset, group);
                continue;
            }

            let group = if name == "g" && draws_shape(node) {
                let size = shape_size(node);
                let entry = self.groups.entry(node.id()).or_default();
                entry.shape_size = size;
                Some(node.id())
            } else {
                group
            };

            pending.extend(
                node.children()
                    .filter(Node::is_element)
                    .rev()
                    .map(|child| (child, offset, group)),
            );
        }
    }

    /// Translation contributed by this element's own `transform`.
    fn element_offset(&mut self, node: Node<'_, '_>) -> Point {
        let Some(attribute) = node.attribute("transform") else {
            return Point::default();
        };

        match parse_transform(attribute) {
            Ok(transforms) => total_offset(&transforms),
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::warning(err.to_string())
                        .with_code(ErrorCode::W101)
                        .with_label(Span::new(node.range()), "transform ignored"),
                );
                Point::default()
            }
        }
    }

    fn collect_text(&mut self, node: Node<'_, '_>, offset: Point, group: Option<NodeId>) {
        let text: String = node
            .descendants()
            .filter(Node::is_text)
            .filter_map(|n| n.text())
            .collect::<Vec<_>>()
            .join(" ");
        let text = collapse_whitespace(&text);
        if text.is_empty() {
            return;
        }

        let anchor = offset.add_point(text_anchor(node));
        let key = group.unwrap_or_else(|| node.id());
        self.groups
            .entry(key)
            .or_default()
            .push(text, anchor, Span::new(node.range()));
    }
}

/// Position of a `<text>` element relative to its coordinate system.
///
/// Falls back to the first positioned `<tspan>` and then to the origin.
fn text_anchor(node: Node<'_, '_>) -> Point {
    let read = |n: Node<'_, '_>| {
        let x = n.attribute("x").and_then(parse_length);
        let y = n.attribute("y").and_then(parse_length);
        (x.is_some() || y.is_some()).then(|| Point::new(x.unwrap_or(0.0), y.unwrap_or(0.0)))
    };

    read(node)
        .or_else(|| {
            node.descendants()
                .filter(|n| n.has_tag_name("tspan"))
                .find_map(read)
        })
        .unwrap_or_default()
}

fn draws_shape(node: Node<'_, '_>) -> bool {
    node.children()
        .any(|child| SHAPE_ELEMENTS.contains(&child.tag_name().name()))
}

fn shape_size(node: Node<'_, '_>) -> Option<Size> {
    let rect = node.children().find(|child| child.has_tag_name("rect"))?;
    let width = rect.attribute("width").and_then(parse_length)?;
    let height = rect.attribute("height").and_then(parse_length)?;
    Some(Size::new(width, height))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first element opened deeper than `limit`, if any.
///
/// A lightweight tag scan run before full parsing. Comments, CDATA,
/// declarations and processing instructions do not count.
fn too_deep_at(source: &str, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find('<') {
        let start = cursor + found;
        let rest = &source[start..];
        let close = if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<![CDATA[") {
            "]]>"
        } else {
            ">"
        };
        let end = rest.find(close)?;
        let tag = &rest[..end];

        if tag.starts_with("</") {
            depth = depth.saturating_sub(1);
        } else if !tag.starts_with("<!") && !tag.starts_with("<?") && !tag.ends_with('/') {
            depth += 1;
            if depth > limit {
                return Some(start);
            }
        }
        cursor = start + end + close.len();
    }
    None
}

/// Converts a 1-based row/column position into a byte offset.
fn byte_offset(source: &str, pos: TextPos) -> usize {
    let row = pos.row.saturating_sub(1) as usize;
    let col = pos.col.saturating_sub(1) as usize;

    let line_start: usize = source
        .split_inclusive('\n')
        .take(row)
        .map(str::len)
        .sum();
    let line = &source[line_start.min(source.len())..];
    let within = line
        .char_indices()
        .nth(col)
        .map_or(line.len(), |(index, _)| index);

    (line_start + within).min(source.len())
}
