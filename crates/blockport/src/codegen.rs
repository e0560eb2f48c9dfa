//! Program text generation.
//!
//! Walks a [`ProgramTree`] and renders every node through its
//! [template](templates::CodeTemplate) at an indentation equal to its depth.
//! The body is then wrapped in a fixed program skeleton: an optional header,
//! the sorted import lines, the hub setup when a hub import is needed, a
//! single `main` entry point and a guarded call to it.

pub mod templates;

use std::{collections::BTreeSet, fmt};

use log::{debug, trace};

use blockport_core::{
    block::{BlockKind, ClassifiedBlock},
    param::ParamValue,
};

use crate::{
    classify::params::NOTE_PARAM,
    config::CodegenConfig,
    structure::{NodeId, ProgramTree},
};

use templates::{PRIME_HUB_IMPORT, template_for};

const HEADER: &str = "#!/usr/bin/env python3\n\"\"\"\nGenerated Python code from SPIKE block program\n\"\"\"\n";
const HUB_SETUP: &str = "# Initialize the SPIKE Prime hub\nhub = PrimeHub()\n";
const MAIN_DOC: &str = "\"\"\"Main program entry point\"\"\"";
const ENTRY_GUARD: &str = "if __name__ == \"__main__\":\n";
const PASS: &str = "pass";

/// The generated program and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    source: String,
    body: Vec<String>,
    imports: BTreeSet<String>,
    blocks: usize,
}

impl GeneratedProgram {
    /// The complete program text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The unindented lines of the entry point body. A `pass` emitted for an
    /// empty `main` is not included.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Number of blocks that produced a statement or comment line.
    pub fn block_count(&self) -> usize {
        self.blocks
    }
}

impl fmt::Display for GeneratedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Renders program trees as target source.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    indent_width: usize,
    header: bool,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(&CodegenConfig::default())
    }
}

impl CodeGenerator {
    pub fn new(config: &CodegenConfig) -> Self {
        Self {
            indent_width: config.indent_width().max(1),
            header: config.header(),
        }
    }

    /// Generates the full program for `tree`.
    pub fn generate(&self, tree: &ProgramTree) -> GeneratedProgram {
        let mut emitter = Emitter::new(tree);
        let has_statement = emitter.emit_all(tree.roots());

        let Emitter {
            lines,
            imports,
            blocks,
            ..
        } = emitter;

        debug!(
            blocks,
            lines = lines.len(),
            imports = imports.len();
            "Program generated"
        );

        let source = self.assemble(&lines, &imports, has_statement);
        GeneratedProgram {
            source,
            body: lines.into_iter().map(|line| line.text).collect(),
            imports,
            blocks,
        }
    }

    fn assemble(&self, lines: &[Line], imports: &BTreeSet<String>, has_statement: bool) -> String {
        let indent = " ".repeat(self.indent_width);
        let mut out = String::new();

        if self.header {
            out.push_str(HEADER);
            out.push('\n');
        }

        if !imports.is_empty() {
            for import in imports {
                out.push_str(import);
                out.push('\n');
            }
            out.push('\n');
        }

        if imports.contains(PRIME_HUB_IMPORT) {
            out.push_str(HUB_SETUP);
            out.push('\n');
        }

        out.push_str("def main():\n");
        out.push_str(&indent);
        out.push_str(MAIN_DOC);
        out.push('\n');

        for line in lines {
            out.push_str(&indent.repeat(line.depth + 1));
            out.push_str(&line.text);
            out.push('\n');
        }
        if !has_statement {
            out.push_str(&indent);
            out.push_str(PASS);
            out.push('\n');
        }

        out.push('\n');
        out.push_str(ENTRY_GUARD);
        out.push_str(&indent);
        out.push_str("main()\n");
        out
    }
}

#[derive(Debug)]
struct Line {
    depth: usize,
    text: String,
}

/// Work left while emitting a tree.
enum Step {
    Node(NodeId, usize),
    /// Ends a control body at `depth`; `mark` is the statement count when
    /// the body opened.
    Close { depth: usize, mark: usize },
}

struct Emitter<'a> {
    tree: &'a ProgramTree,
    lines: Vec<Line>,
    imports: BTreeSet<String>,
    blocks: usize,
    statements: usize,
}

impl<'a> Emitter<'a> {
    fn new(tree: &'a ProgramTree) -> Self {
        Self {
            tree,
            lines: Vec::with_capacity(tree.len()),
            imports: BTreeSet::new(),
            blocks: 0,
            statements: 0,
        }
    }

    /// Emits `roots` and everything below them in program order, returning
    /// whether any executable statement was written.
    fn emit_all(&mut self, roots: &[NodeId]) -> bool {
        let mut pending: Vec<Step> = roots.iter().rev().map(|&id| Step::Node(id, 0)).collect();

        while let Some(step) = pending.pop() {
            match step {
                Step::Node(id, depth) => self.emit(id, depth, &mut pending),
                Step::Close { depth, mark } => {
                    if self.statements == mark {
                        self.push(depth, PASS.to_string());
                    }
                }
            }
        }
        self.statements > 0
    }

    fn emit(&mut self, id: NodeId, depth: usize, pending: &mut Vec<Step>) {
        let tree = self.tree;
        let node = tree.node(id);
        let block = node.block();
        self.blocks += 1;

        let Some(template) = template_for(block.kind()) else {
            trace!(depth, text = block.text(); "Unknown block kept as comment");
            self.push(depth, format!("# {}", single_line(block.text())));
            return;
        };

        self.imports
            .extend(template.imports().iter().map(|import| import.to_string()));
        let text = with_note(template.render(block.parameters()), block);
        trace!(depth, kind:% = block.kind(), text = text.as_str(); "Statement emitted");
        self.push(depth, text);

        let body_depth = match block.kind() {
            BlockKind::ProgramStart => depth,
            kind if kind.is_control() => {
                self.statements += 1;
                pending.push(Step::Close {
                    depth: depth + 1,
                    mark: self.statements,
                });
                depth + 1
            }
            _ => {
                self.statements += 1;
                return;
            }
        };
        pending.extend(
            node.children()
                .iter()
                .rev()
                .map(|&child| Step::Node(child, body_depth)),
        );
    }

    fn push(&mut self, depth: usize, text: String) {
        self.lines.push(Line { depth, text });
    }
}

/// Appends the block's note, if any, as a trailing comment.
fn with_note(mut text: String, block: &ClassifiedBlock) -> String {
    if let Some(ParamValue::Text(note)) = block.parameters().get(NOTE_PARAM) {
        text.push_str("  # ");
        text.push_str(&single_line(note));
    }
    text
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
