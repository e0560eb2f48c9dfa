//! Per-kind code templates.
//!
//! A template is one line of target source with `{name}` placeholders that
//! are filled from the block's parameters, plus the import lines the
//! statement needs.

use log::debug;

use blockport_core::{
    block::BlockKind,
    param::{ParamValue, Parameters},
};

use crate::classify::{params::string_literal, rules::rule_for};

pub const PRIME_HUB_IMPORT: &str = "from spike import PrimeHub";
pub const TIME_IMPORT: &str = "import time";

/// The statement emitted for one block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeTemplate {
    kind: BlockKind,
    text: &'static str,
    imports: &'static [&'static str],
}

impl CodeTemplate {
    const fn new(kind: BlockKind, text: &'static str, imports: &'static [&'static str]) -> Self {
        Self {
            kind,
            text,
            imports,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn imports(&self) -> &'static [&'static str] {
        self.imports
    }

    /// Fills every `{name}` placeholder from `parameters`.
    ///
    /// A placeholder without a parameter takes the default its pattern rule
    /// declares, so the output never contains an unresolved placeholder.
    pub fn render(&self, parameters: &Parameters) -> String {
        let mut out = String::with_capacity(self.text.len() + 16);
        let mut rest = self.text;

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            out.push_str(&rest[..open]);

            let name = &rest[open + 1..close];
            match parameters.get(name) {
                Some(value) => out.push_str(&render_value(value)),
                None => {
                    debug!(kind:% = self.kind, placeholder = name; "Template parameter defaulted");
                    let value = default_parameter(self.kind, name);
                    out.push_str(&value.as_ref().map_or_else(|| "None".to_string(), render_value));
                }
            }
            rest = &rest[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

const HUB: &[&str] = &[PRIME_HUB_IMPORT];

const TEMPLATES: &[CodeTemplate] = &[
    CodeTemplate::new(BlockKind::ProgramStart, "# when program starts", &[]),
    CodeTemplate::new(
        BlockKind::ButtonPress,
        "hub.{button}_button.wait_until_pressed()",
        HUB,
    ),
    CodeTemplate::new(BlockKind::Forever, "while True:", &[]),
    CodeTemplate::new(BlockKind::Repeat, "for _ in range({count}):", &[]),
    CodeTemplate::new(BlockKind::If, "if {condition}:", &[]),
    CodeTemplate::new(BlockKind::MotorStop, "hub.port.{port}.motor.stop()", HUB),
    CodeTemplate::new(
        BlockKind::MotorRun,
        "hub.port.{port}.motor.run_for_{unit}({duration})",
        HUB,
    ),
    CodeTemplate::new(
        BlockKind::SensorRead,
        "{sensor} = hub.port.{port}.device.get()",
        HUB,
    ),
    CodeTemplate::new(BlockKind::LedSet, "hub.led({color})", HUB),
    CodeTemplate::new(
        BlockKind::SoundBeep,
        "hub.sound.beep({frequency}, {duration})",
        HUB,
    ),
    CodeTemplate::new(BlockKind::Wait, "time.sleep({duration})", &[TIME_IMPORT]),
    CodeTemplate::new(BlockKind::Print, "print({text})", &[]),
    CodeTemplate::new(BlockKind::VariableAssign, "{name} = {value}", &[]),
];

/// The template for `kind`; [`BlockKind::Unknown`] has none.
pub fn template_for(kind: BlockKind) -> Option<&'static CodeTemplate> {
    TEMPLATES.iter().find(|template| template.kind == kind)
}

/// The default a block kind's rule declares for parameter `name`.
fn default_parameter(kind: BlockKind, name: &str) -> Option<ParamValue> {
    rule_for(kind)?
        .params()
        .iter()
        .find(|spec| spec.name() == name)
        .map(|spec| spec.extractor().default_value())
}

/// Renders a parameter value as target source.
pub fn render_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Number(n) => format!("{n:?}"),
        ParamValue::Integer(n) => n.to_string(),
        ParamValue::Port(port) => port.to_string(),
        ParamValue::Color(color) => string_literal(color.name()),
        ParamValue::Text(text) => string_literal(text),
        ParamValue::Identifier(name) | ParamValue::Expression(name) => name.clone(),
    }
}
