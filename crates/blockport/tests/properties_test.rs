//! Property tests for structure building and generation.

use proptest::prelude::*;

use blockport::{
    block::{BlockKind, ClassifiedBlock, RawBlockRecord, SourceKind},
    codegen::CodeGenerator,
    geometry::{Point, Size},
    param::Parameters,
    structure::ProgramTree,
};

const INDENT: f32 = 20.0;
const ROW: f32 = 40.0;

// ===================
// Strategies
// ===================

fn block(kind: BlockKind, row: usize, level: u8) -> ClassifiedBlock {
    let position = Point::new(f32::from(level) * INDENT, row as f32 * ROW);
    let record = RawBlockRecord::new(
        format!("block {row}"),
        position,
        Size::default(),
        SourceKind::Diagram,
    );
    ClassifiedBlock::new(record, kind, Parameters::new(), 1.0)
}

/// Blocks on distinct rows at random indentation, in shuffled input order.
fn blocks_strategy() -> impl Strategy<Value = Vec<ClassifiedBlock>> {
    prop::collection::vec((0..BlockKind::ALL.len(), 0u8..4), 0..24)
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(row, (kind, level))| block(BlockKind::ALL[kind], row, level))
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

// ===================
// Property Test Functions
// ===================

/// Blocks on higher rows always come first in program order.
fn check_program_order_follows_rows(blocks: Vec<ClassifiedBlock>) -> Result<(), TestCaseError> {
    let tree = ProgramTree::build(blocks, INDENT);
    let rows: Vec<f32> = tree.blocks().map(|block| block.position().y()).collect();

    for pair in rows.windows(2) {
        prop_assert!(pair[0] < pair[1], "rows out of order: {rows:?}");
    }
    Ok(())
}

/// Children of a control block sit below it and at least one unit right of it.
fn check_nesting_is_sound(blocks: Vec<ClassifiedBlock>) -> Result<(), TestCaseError> {
    let tree = ProgramTree::build(blocks, INDENT);

    for (id, _) in tree.walk() {
        let node = tree.node(id);
        if !node.kind().is_control() {
            prop_assert!(
                node.kind() == BlockKind::ProgramStart || node.children().is_empty(),
                "leaf {} has children",
                node.kind()
            );
            continue;
        }

        let parent = node.block().position();
        for &child in node.children() {
            let child = tree.node(child).block().position();
            prop_assert!(child.y() > parent.y());
            prop_assert!(child.x() - parent.x() >= INDENT);
        }
    }
    Ok(())
}

/// Every block yields exactly one line besides empty-body placeholders.
fn check_no_block_is_lost(blocks: Vec<ClassifiedBlock>) -> Result<(), TestCaseError> {
    let count = blocks.len();
    let tree = ProgramTree::build(blocks, INDENT);
    prop_assert_eq!(tree.len(), count);

    let program = CodeGenerator::default().generate(&tree);
    let lines = program
        .body()
        .iter()
        .filter(|line| line.as_str() != "pass")
        .count();

    prop_assert_eq!(program.block_count(), count);
    prop_assert_eq!(lines, count);
    prop_assert!(
        !program.source().contains('{'),
        "unresolved placeholder in {}",
        program.source()
    );
    Ok(())
}

/// The same blocks in any input order produce the same program.
fn check_generation_is_deterministic(
    blocks: Vec<ClassifiedBlock>,
) -> Result<(), TestCaseError> {
    let mut reversed = blocks.clone();
    reversed.reverse();

    let generator = CodeGenerator::default();
    let first = generator.generate(&ProgramTree::build(blocks, INDENT));
    let second = generator.generate(&ProgramTree::build(reversed, INDENT));

    prop_assert_eq!(first, second);
    Ok(())
}

proptest! {
    #[test]
    fn program_order_follows_rows(blocks in blocks_strategy()) {
        check_program_order_follows_rows(blocks)?;
    }

    #[test]
    fn nesting_is_sound(blocks in blocks_strategy()) {
        check_nesting_is_sound(blocks)?;
    }

    #[test]
    fn no_block_is_lost(blocks in blocks_strategy()) {
        check_no_block_is_lost(blocks)?;
    }

    #[test]
    fn generation_is_deterministic(blocks in blocks_strategy()) {
        check_generation_is_deterministic(blocks)?;
    }
}
