//! Spatial sequencing and structure building.
//!
//! Blocks are first put in reading order (top to bottom, then left to
//! right). Nesting is then inferred from indentation alone: a block belongs
//! to the innermost open control block (`repeat`, `forever`, `if`) that it
//! sits below and is indented past by at least one indentation unit. When a
//! block fails that test the control block is closed for good; there is no
//! backtracking, so ambiguous layouts resolve by the reading order.
//!
//! A program start opens a new script at the root. Every following block
//! until the next program start belongs to it. Blocks before the first
//! program start stay at the root.
//!
//! Control blocks nest at most [`MAX_NESTING`] deep. A control block at
//! the last level keeps its place but opens no body, so the blocks indented
//! under it become its siblings.
//!
//! The resulting [`ProgramTree`] is an arena: nodes live in one vector and
//! refer to their children by [`NodeId`].

use log::{debug, trace, warn};

use blockport_core::block::{BlockKind, ClassifiedBlock};

/// Deepest nesting of control blocks; CPython rejects more than 20
/// statically nested loops.
pub const MAX_NESTING: usize = 20;

/// Index of a node in a [`ProgramTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One block and its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramNode {
    block: ClassifiedBlock,
    children: Vec<NodeId>,
}

impl ProgramNode {
    pub fn block(&self) -> &ClassifiedBlock {
        &self.block
    }

    pub fn kind(&self) -> BlockKind {
        self.block.kind()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The nested program recovered from flat, positioned blocks.
///
/// The root is implicit: [`ProgramTree::roots`] lists the top-level nodes in
/// program order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramTree {
    nodes: Vec<ProgramNode>,
    roots: Vec<NodeId>,
    flattened: Vec<NodeId>,
}

impl ProgramTree {
    /// Orders the blocks and infers nesting.
    ///
    /// `indent_unit` is the horizontal offset that opens a nesting level.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockport::structure::ProgramTree;
    /// # use blockport_core::block::{BlockKind, ClassifiedBlock, RawBlockRecord, SourceKind};
    /// # use blockport_core::geometry::{Point, Size};
    /// # use blockport_core::param::Parameters;
    /// let block = |kind, x, y| {
    ///     let record = RawBlockRecord::new("", Point::new(x, y), Size::default(), SourceKind::Diagram);
    ///     ClassifiedBlock::new(record, kind, Parameters::default(), 1.0)
    /// };
    ///
    /// let tree = ProgramTree::build(
    ///     vec![
    ///         block(BlockKind::Wait, 20.0, 40.0),
    ///         block(BlockKind::Forever, 0.0, 0.0),
    ///     ],
    ///     20.0,
    /// );
    ///
    /// let root = tree.node(tree.roots()[0]);
    /// assert_eq!(root.kind(), BlockKind::Forever);
    /// assert_eq!(tree.node(root.children()[0]).kind(), BlockKind::Wait);
    /// ```
    pub fn build(mut blocks: Vec<ClassifiedBlock>, indent_unit: f32) -> Self {
        blocks.sort_by(|a, b| a.position().reading_order(b.position()));

        let mut tree = Self {
            nodes: Vec::with_capacity(blocks.len()),
            roots: Vec::new(),
            flattened: Vec::new(),
        };
        let mut open_controls: Vec<NodeId> = Vec::new();
        let mut script: Option<NodeId> = None;

        for block in blocks {
            let kind = block.kind();
            let id = tree.push(block);

            if kind == BlockKind::ProgramStart {
                open_controls.clear();
                script = Some(id);
                tree.roots.push(id);
                trace!(node = id.0; "Script opened");
                continue;
            }

            while let Some(&top) = open_controls.last() {
                if tree.contains(top, id, indent_unit) {
                    break;
                }
                open_controls.pop();
            }

            match open_controls.last().copied().or(script) {
                Some(parent) => tree.nodes[parent.0].children.push(id),
                None => tree.roots.push(id),
            }

            if kind.is_control() {
                if open_controls.len() + 1 < MAX_NESTING {
                    open_controls.push(id);
                } else {
                    tree.flattened.push(id);
                }
            }
        }

        if !tree.flattened.is_empty() {
            warn!(
                controls = tree.flattened.len(),
                max = MAX_NESTING;
                "Nesting too deep, bodies flattened"
            );
        }
        debug!(nodes = tree.nodes.len(), roots = tree.roots.len(); "Program tree built");
        tree
    }

    fn push(&mut self, block: ClassifiedBlock) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ProgramNode {
            block,
            children: Vec::new(),
        });
        id
    }

    /// Whether `candidate` lies in the body of the control block `control`.
    fn contains(&self, control: NodeId, candidate: NodeId, indent_unit: f32) -> bool {
        let parent = self.nodes[control.0].block.position();
        let child = self.nodes[candidate.0].block.position();
        child.y() > parent.y() && child.x() - parent.x() >= indent_unit
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Control blocks at the last nesting level, which opened no body.
    pub fn flattened(&self) -> &[NodeId] {
        &self.flattened
    }

    pub fn node(&self, id: NodeId) -> &ProgramNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, which equals the number of input blocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order with their depth below the root.
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut pending: Vec<(NodeId, usize)> =
            self.roots.iter().rev().map(|&id| (id, 0)).collect();

        while let Some((id, depth)) = pending.pop() {
            out.push((id, depth));
            pending.extend(
                self.nodes[id.0]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, depth + 1)),
            );
        }
        out
    }

    /// Iterates blocks in program order.
    pub fn blocks(&self) -> impl Iterator<Item = &ClassifiedBlock> {
        self.walk()
            .into_iter()
            .map(move |(id, _)| &self.nodes[id.0].block)
    }
}

#[cfg(test)]
mod tests {
    use blockport_core::{
        block::{RawBlockRecord, SourceKind},
        geometry::{Point, Size},
        param::Parameters,
    };

    use super::*;

    fn block(kind: BlockKind, text: &str, x: f32, y: f32) -> ClassifiedBlock {
        let record = RawBlockRecord::new(text, Point::new(x, y), Size::default(), SourceKind::Diagram);
        ClassifiedBlock::new(record, kind, Parameters::default(), 1.0)
    }

    fn texts(tree: &ProgramTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| tree.node(id).block().text().to_string())
            .collect()
    }

    #[test]
    fn test_scenario_b_loop_body() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Wait, "b", 20.0, 80.0),
                block(BlockKind::Repeat, "repeat 5 times", 0.0, 0.0),
                block(BlockKind::LedSet, "a", 20.0, 40.0),
            ],
            20.0,
        );

        assert_eq!(tree.roots().len(), 1);
        let repeat = tree.node(tree.roots()[0]);
        assert_eq!(repeat.kind(), BlockKind::Repeat);
        assert_eq!(texts(&tree, repeat.children()), vec!["a", "b"]);
    }

    #[test]
    fn test_dedent_closes_control() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Forever, "loop", 0.0, 0.0),
                block(BlockKind::Wait, "inside", 20.0, 40.0),
                block(BlockKind::Print, "after", 0.0, 80.0),
            ],
            20.0,
        );
        assert_eq!(texts(&tree, tree.roots()), vec!["loop", "after"]);
    }

    #[test]
    fn test_partial_indent_is_not_nested() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::If, "if", 0.0, 0.0),
                block(BlockKind::Wait, "shallow", 10.0, 40.0),
            ],
            20.0,
        );
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn test_nesting_stops_at_max_depth() {
        let extra = 5;
        let blocks = (0..MAX_NESTING + extra)
            .map(|i| block(BlockKind::Forever, "forever", i as f32 * 20.0, i as f32 * 40.0))
            .collect();
        let tree = ProgramTree::build(blocks, 20.0);

        let depths: Vec<_> = tree.walk().into_iter().map(|(_, depth)| depth).collect();
        assert_eq!(depths.iter().max(), Some(&(MAX_NESTING - 1)));
        assert_eq!(tree.flattened().len(), extra + 1);
        for &id in tree.flattened() {
            assert!(tree.node(id).children().is_empty());
        }
    }

    #[test]
    fn test_nested_controls() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Forever, "forever", 0.0, 0.0),
                block(BlockKind::If, "if", 20.0, 40.0),
                block(BlockKind::Wait, "deep", 40.0, 80.0),
                block(BlockKind::Print, "mid", 20.0, 120.0),
            ],
            20.0,
        );

        let depths: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|(id, depth)| (tree.node(id).block().text().to_string(), depth))
            .collect();
        assert_eq!(
            depths,
            vec![
                ("forever".to_string(), 0),
                ("if".to_string(), 1),
                ("deep".to_string(), 2),
                ("mid".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_adjacent_sibling_controls_resolve_by_order() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Repeat, "first", 0.0, 0.0),
                block(BlockKind::Repeat, "second", 0.0, 40.0),
                block(BlockKind::Wait, "body", 20.0, 80.0),
            ],
            20.0,
        );

        assert_eq!(texts(&tree, tree.roots()), vec!["first", "second"]);
        let second = tree.node(tree.roots()[1]);
        assert_eq!(texts(&tree, second.children()), vec!["body"]);
        assert!(tree.node(tree.roots()[0]).children().is_empty());
    }

    #[test]
    fn test_program_start_owns_following_blocks() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Print, "loose", 0.0, -40.0),
                block(BlockKind::ProgramStart, "start 1", 0.0, 0.0),
                block(BlockKind::Wait, "w1", 0.0, 40.0),
                block(BlockKind::Repeat, "r", 0.0, 80.0),
                block(BlockKind::Wait, "in r", 20.0, 120.0),
                block(BlockKind::ProgramStart, "start 2", 0.0, 160.0),
                block(BlockKind::Wait, "w2", 20.0, 200.0),
            ],
            20.0,
        );

        assert_eq!(texts(&tree, tree.roots()), vec!["loose", "start 1", "start 2"]);
        let first = tree.node(tree.roots()[1]);
        assert_eq!(texts(&tree, first.children()), vec!["w1", "r"]);
        let second = tree.node(tree.roots()[2]);
        assert_eq!(texts(&tree, second.children()), vec!["w2"]);
    }

    #[test]
    fn test_same_row_orders_left_to_right() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Print, "right", 200.0, 0.0),
                block(BlockKind::Print, "left", 0.0, 0.0),
            ],
            20.0,
        );
        assert_eq!(texts(&tree, tree.roots()), vec!["left", "right"]);
    }

    #[test]
    fn test_leaves_never_have_children() {
        let tree = ProgramTree::build(
            vec![
                block(BlockKind::Wait, "leaf", 0.0, 0.0),
                block(BlockKind::Print, "indented", 20.0, 40.0),
            ],
            20.0,
        );
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.len(), 2);
    }
}
