//! The pattern-rule and opcode tables.
//!
//! Rules are held in a single list ordered by descending priority and are
//! tried in that order; the first match wins. Adding a block kind means
//! adding one [`PatternRule`] here (and one template in
//! [`crate::codegen::templates`]).

use once_cell::sync::Lazy;
use regex::Regex;

use blockport_core::block::BlockKind;

use super::params::{Extractor, ParamSpec};

/// A priority-ordered matcher for one block kind.
#[derive(Debug)]
pub struct PatternRule {
    kind: BlockKind,
    priority: u32,
    matcher: Regex,
    required_tokens: &'static [&'static str],
    params: &'static [ParamSpec],
}

impl PatternRule {
    fn new(
        kind: BlockKind,
        priority: u32,
        pattern: &str,
        required_tokens: &'static [&'static str],
        params: &'static [ParamSpec],
    ) -> Self {
        Self {
            kind,
            priority,
            matcher: Regex::new(pattern).expect("built-in rule pattern is valid"),
            required_tokens,
            params,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        self.params
    }

    /// Tests the rule against normalized text.
    pub fn matches(&self, normalized: &str) -> bool {
        self.matcher.is_match(normalized)
    }

    /// Fraction of the rule's required tokens present in normalized text.
    pub fn confidence(&self, normalized: &str) -> f32 {
        if self.required_tokens.is_empty() {
            return 1.0;
        }
        let found = self
            .required_tokens
            .iter()
            .filter(|token| {
                normalized
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == **token)
            })
            .count();
        found as f32 / self.required_tokens.len() as f32
    }
}

const PORT: ParamSpec = ParamSpec::new("port", Extractor::Port, &["PORT"]);

const BUTTON_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "button",
    Extractor::Choice {
        options: &[("left", "left"), ("right", "right")],
        default: "left",
    },
    &["BUTTON"],
)];

const REPEAT_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "count",
    Extractor::Count { default: 10 },
    &["TIMES"],
)];

const IF_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "condition",
    Extractor::Condition,
    &["CONDITION"],
)];

const MOTOR_STOP_PARAMS: &[ParamSpec] = &[PORT];

const MOTOR_RUN_PARAMS: &[ParamSpec] = &[
    PORT,
    ParamSpec::new(
        "duration",
        Extractor::Seconds { default: 1.0 },
        &["VALUE", "DURATION"],
    ),
    ParamSpec::new(
        "unit",
        Extractor::Choice {
            options: &[
                ("seconds", "seconds"),
                ("second", "seconds"),
                ("sec", "seconds"),
                ("rotations", "rotations"),
                ("rotation", "rotations"),
                ("degrees", "degrees"),
                ("degree", "degrees"),
            ],
            default: "seconds",
        },
        &["UNIT"],
    ),
];

const SENSOR_PARAMS: &[ParamSpec] = &[
    PORT,
    ParamSpec::new(
        "sensor",
        Extractor::Choice {
            options: &[
                ("distance", "distance"),
                ("ultrasonic", "distance"),
                ("color", "color"),
                ("colour", "color"),
                ("force", "force"),
                ("pressure", "force"),
            ],
            default: "distance",
        },
        &[],
    ),
];

const LED_PARAMS: &[ParamSpec] = &[ParamSpec::new("color", Extractor::Color, &["COLOR"])];

const BEEP_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("frequency", Extractor::Frequency, &["FREQUENCY", "NOTE"]),
    ParamSpec::new(
        "duration",
        Extractor::Number {
            index: 1,
            default: 0.5,
        },
        &["DURATION"],
    ),
];

const WAIT_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "duration",
    Extractor::Seconds { default: 1.0 },
    &["DURATION"],
)];

const PRINT_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "text",
    Extractor::Text,
    &["TEXT", "MESSAGE"],
)];

const ASSIGN_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("name", Extractor::Identifier, &["VARIABLE"]),
    ParamSpec::new("value", Extractor::Value, &["VALUE"]),
];

static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            BlockKind::ProgramStart,
            130,
            r"\bwhen\b.*\bstart(?:s|ed)?\b|\bgreen flag\b|\bwhen flag clicked\b",
            &["when", "program", "starts"],
            &[],
        ),
        PatternRule::new(
            BlockKind::ButtonPress,
            120,
            r"\bbutton\b.*\bpressed\b",
            &["button", "pressed"],
            BUTTON_PARAMS,
        ),
        PatternRule::new(BlockKind::Forever, 110, r"\bforever\b", &["forever"], &[]),
        PatternRule::new(
            BlockKind::Repeat,
            100,
            r"\b(?:repeat|loop)\b.*(?:\d|\btimes\b)",
            &["repeat", "times"],
            REPEAT_PARAMS,
        ),
        PatternRule::new(BlockKind::If, 90, r"\bif\b", &["if", "then"], IF_PARAMS),
        PatternRule::new(
            BlockKind::MotorStop,
            80,
            r"\bmotor\b.*\bstop\b|\bstop\b.*\bmotor\b",
            &["motor", "stop"],
            MOTOR_STOP_PARAMS,
        ),
        PatternRule::new(
            BlockKind::MotorRun,
            70,
            r"\bmotor\b.*\b(?:run|runs|start|turn|go)\b|\b(?:run|start|turn)\b.*\bmotor\b",
            &["motor", "run"],
            MOTOR_RUN_PARAMS,
        ),
        PatternRule::new(
            BlockKind::SensorRead,
            60,
            r"\bsensor\b|\b(?:distance|ultrasonic|force)\b",
            &["sensor"],
            SENSOR_PARAMS,
        ),
        PatternRule::new(BlockKind::LedSet, 50, r"\bled\b|\blight\b", &["led"], LED_PARAMS),
        PatternRule::new(
            BlockKind::SoundBeep,
            40,
            r"\bbeep\b|\bsound\b|\bplay\b.*\bnote\b",
            &["beep"],
            BEEP_PARAMS,
        ),
        PatternRule::new(
            BlockKind::Wait,
            30,
            r"\b(?:wait|sleep|pause)\b",
            &["wait", "seconds"],
            WAIT_PARAMS,
        ),
        PatternRule::new(
            BlockKind::Print,
            20,
            r"\b(?:print|say|says|display|show|write)\b",
            &["print"],
            PRINT_PARAMS,
        ),
        PatternRule::new(
            BlockKind::VariableAssign,
            10,
            r"\bset\b.+\bto\b",
            &["set", "to"],
            ASSIGN_PARAMS,
        ),
    ]
});

/// Block text with no faithful translation, matching the opcode fragments
/// tagged [`BlockKind::Unknown`] below.
static UNTRANSLATABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:repeat|wait)\s+until\b|\bmotor\b.*\bset\b.*\bspeed\b")
        .expect("built-in rule pattern is valid")
});

/// Opcode fragments and the kind they tag, tried in order.
///
/// Matching is by substring of the lower-cased opcode, so more specific
/// fragments come first. Fragments tagged [`BlockKind::Unknown`] stop the
/// text rules from guessing at blocks that have no faithful translation.
const OPCODE_KINDS: &[(&str, BlockKind)] = &[
    ("whenprogramstarts", BlockKind::ProgramStart),
    ("whenflagclicked", BlockKind::ProgramStart),
    ("whenbutton", BlockKind::ButtonPress),
    ("control_forever", BlockKind::Forever),
    ("repeat_until", BlockKind::Unknown),
    ("control_repeat", BlockKind::Repeat),
    ("control_if", BlockKind::If),
    ("control_else", BlockKind::If),
    ("motorsetspeed", BlockKind::Unknown),
    ("motorstop", BlockKind::MotorStop),
    ("stopmove", BlockKind::MotorStop),
    ("motor", BlockKind::MotorRun),
    ("displaytext", BlockKind::Print),
    ("light", BlockKind::LedSet),
    ("wait_until", BlockKind::Unknown),
    ("control_wait", BlockKind::Wait),
    ("beep", BlockKind::SoundBeep),
    ("flippersensors_", BlockKind::SensorRead),
    ("sensor", BlockKind::SensorRead),
    ("data_setvariableto", BlockKind::VariableAssign),
    ("looks_say", BlockKind::Print),
    ("print", BlockKind::Print),
];

/// All rules, highest priority first.
pub fn rules() -> &'static [PatternRule] {
    &RULES
}

/// The rule declaring `kind`, if any.
pub fn rule_for(kind: BlockKind) -> Option<&'static PatternRule> {
    rules().iter().find(|rule| rule.kind == kind)
}

/// Whether normalized text names a block that must stay unrecognized.
pub fn is_untranslatable(normalized: &str) -> bool {
    UNTRANSLATABLE.is_match(normalized)
}

/// Looks up the kind tagged by a metadata opcode.
pub fn kind_for_opcode(opcode: &str) -> Option<BlockKind> {
    let opcode = opcode.to_ascii_lowercase();
    OPCODE_KINDS
        .iter()
        .find(|(fragment, _)| opcode.contains(fragment))
        .map(|(_, kind)| *kind)
}
