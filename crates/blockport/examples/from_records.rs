//! Example: Generating a program from classified blocks
//!
//! This example builds blocks by hand instead of reading a diagram, then
//! runs the structure builder and code generator directly.

use blockport::{
    block::{BlockKind, ClassifiedBlock, RawBlockRecord, SourceKind},
    classify::{self, Recognition},
    codegen::CodeGenerator,
    geometry::{Point, Size},
    structure::ProgramTree,
};

fn main() {
    println!("Building a program from block text...\n");

    // Each line is (text, column, row); columns are indentation levels
    let lines = [
        ("when program starts", 0, 0),
        ("repeat 3 times", 0, 1),
        ("motor B run for 2 rotations", 1, 2),
        ("play beep 523 for 0.25", 1, 3),
        ("if distance < 15 then", 1, 4),
        ("led set to green", 2, 5),
        ("print \"finished\"", 0, 6),
    ];

    let blocks: Vec<ClassifiedBlock> = lines
        .iter()
        .map(|&(text, column, row)| {
            let record = RawBlockRecord::new(
                text,
                Point::new(column as f32 * 20.0, row as f32 * 40.0),
                Size::default(),
                SourceKind::Diagram,
            );
            match classify::recognize(&record) {
                Recognition::Matched {
                    kind,
                    parameters,
                    confidence,
                    ..
                } => {
                    println!("{text:<30} -> {kind} ({confidence:.2})");
                    ClassifiedBlock::new(record, kind, parameters, confidence)
                }
                Recognition::Unrecognized(_) => {
                    println!("{text:<30} -> {}", BlockKind::Unknown);
                    ClassifiedBlock::unknown(record)
                }
            }
        })
        .collect();

    let tree = ProgramTree::build(blocks, 20.0);
    let program = CodeGenerator::default().generate(&tree);

    println!("\n{program}");
}
