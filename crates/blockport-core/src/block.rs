//! Block records and their classified form.
//!
//! A [`RawBlockRecord`] is what extraction recovers from a source: the
//! visible text of one block and where it sits. Classification turns it into
//! a [`ClassifiedBlock`] with a [`BlockKind`] and typed parameters. Both are
//! immutable once built.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    geometry::{Point, Size},
    param::Parameters,
    span::Span,
};

/// The closed set of block kinds Blockport understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    ProgramStart,
    Repeat,
    Forever,
    If,
    MotorRun,
    MotorStop,
    LedSet,
    Wait,
    Print,
    SoundBeep,
    SensorRead,
    ButtonPress,
    VariableAssign,
    Unknown,
}

impl BlockKind {
    /// Every kind, in declaration order.
    pub const ALL: [BlockKind; 14] = [
        BlockKind::ProgramStart,
        BlockKind::Repeat,
        BlockKind::Forever,
        BlockKind::If,
        BlockKind::MotorRun,
        BlockKind::MotorStop,
        BlockKind::LedSet,
        BlockKind::Wait,
        BlockKind::Print,
        BlockKind::SoundBeep,
        BlockKind::SensorRead,
        BlockKind::ButtonPress,
        BlockKind::VariableAssign,
        BlockKind::Unknown,
    ];

    /// Returns `true` for kinds that open a nested body.
    ///
    /// Only control kinds may own children through indentation.
    /// [`BlockKind::ProgramStart`] is a container too, but its body is
    /// delimited by the next program start rather than by indentation.
    pub fn is_control(self) -> bool {
        matches!(self, BlockKind::Repeat | BlockKind::Forever | BlockKind::If)
    }

    /// Stable snake_case name used in logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            BlockKind::ProgramStart => "program_start",
            BlockKind::Repeat => "repeat",
            BlockKind::Forever => "forever",
            BlockKind::If => "if",
            BlockKind::MotorRun => "motor_run",
            BlockKind::MotorStop => "motor_stop",
            BlockKind::LedSet => "led_set",
            BlockKind::Wait => "wait",
            BlockKind::Print => "print",
            BlockKind::SoundBeep => "sound_beep",
            BlockKind::SensorRead => "sensor_read",
            BlockKind::ButtonPress => "button_press",
            BlockKind::VariableAssign => "variable_assign",
            BlockKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A block definition read from project metadata.
///
/// Holds the explicit kind tag (`opcode`) and the block's resolved field
/// and input values, keyed by their upper-case metadata names.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    opcode: String,
    values: IndexMap<String, String>,
}

impl BlockDefinition {
    pub fn new(opcode: impl Into<String>, values: IndexMap<String, String>) -> Self {
        Self {
            opcode: opcode.into(),
            values,
        }
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }

    /// Returns the value stored under `key`, if any.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Where a record came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// A text-bearing shape in a vector diagram.
    Diagram,
    /// A block definition in project metadata.
    Archive(BlockDefinition),
}

impl SourceKind {
    pub fn is_diagram(&self) -> bool {
        matches!(self, SourceKind::Diagram)
    }

    /// Returns the metadata definition for archive records.
    pub fn definition(&self) -> Option<&BlockDefinition> {
        match self {
            SourceKind::Diagram => None,
            SourceKind::Archive(definition) => Some(definition),
        }
    }
}

/// One block as recovered from a source, before classification.
///
/// `position` is in diagram coordinates after resolving all ancestor
/// transforms, or a synthetic `(depth, row)` key for archive records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlockRecord {
    text: String,
    position: Point,
    size: Size,
    source: SourceKind,
    span: Option<Span>,
}

impl RawBlockRecord {
    pub fn new(text: impl Into<String>, position: Point, size: Size, source: SourceKind) -> Self {
        Self {
            text: text.into(),
            position,
            size,
            source,
            span: None,
        }
    }

    /// Attach the source span of the element this record was built from.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn source(&self) -> &SourceKind {
        &self.source
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }
}

/// A record together with its recognised kind and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedBlock {
    record: RawBlockRecord,
    kind: BlockKind,
    parameters: Parameters,
    confidence: f32,
}

impl ClassifiedBlock {
    /// Creates a classified block.
    ///
    /// `confidence` is clamped to `0.0..=1.0`; it is diagnostic only.
    pub fn new(
        record: RawBlockRecord,
        kind: BlockKind,
        parameters: Parameters,
        confidence: f32,
    ) -> Self {
        Self {
            record,
            kind,
            parameters,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Creates an [`BlockKind::Unknown`] block that keeps the record's text.
    pub fn unknown(record: RawBlockRecord) -> Self {
        Self::new(record, BlockKind::Unknown, Parameters::default(), 0.0)
    }

    pub fn record(&self) -> &RawBlockRecord {
        &self.record
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn text(&self) -> &str {
        self.record.text()
    }

    pub fn position(&self) -> Point {
        self.record.position()
    }
}
