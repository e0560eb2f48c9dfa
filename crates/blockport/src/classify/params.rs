//! Parameter extraction.
//!
//! Every pattern rule declares an ordered list of [`ParamSpec`]s. A spec
//! names the parameter, the [`Extractor`] that reads it from block text, and
//! the metadata keys that carry it in project archives.
//!
//! Extraction is total: when a value cannot be found, the extractor's
//! documented default is substituted and a [`ParamIssue::Defaulted`] is
//! reported, so a partial block still yields a compilable statement.

use once_cell::sync::Lazy;
use regex::Regex;

use blockport_core::{
    block::BlockDefinition,
    param::{Color, ParamValue, Parameters, Port},
};

/// Parameter carrying a trailing comment for the rendered statement.
pub const NOTE_PARAM: &str = "note";

const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

static NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"-?\d+(?:\.\d+)?"));
static SECONDS: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:seconds?|secs?|s)\b"));
static NAMED_PORT: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(?:port|motor|sensor)\s+([a-z])\b"));
static BARE_PORT: Lazy<Regex> = Lazy::new(|| compile(r"\b([A-Z])\b"));
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| compile(r#""([^"]*)""#));
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| compile(r"'([^']*)'"));
static PRINT_TAIL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\b(?:print|say|display|show|write)\s+(?:text\s+)?(.+)$"));
static CONDITION: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\bif\s+(.+?)(?:\s+then\b.*)?$"));
static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\bset\s+(.+?)\s+to\s+(.+)$"));
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z_][A-Za-z0-9_]*$"));
static LITERAL: Lazy<Regex> = Lazy::new(|| compile(r"^-?\d+(?:\.\d+)?$"));
static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    let operand = r#"[A-Za-z_][A-Za-z0-9_]*|-?\d+(?:\.\d+)?|'[^']*'|"[^"]*""#;
    compile(&format!(
        r"^({operand})(?:\s*(==|!=|<=|>=|<|>|=)\s*({operand}))?$"
    ))
});
static ARITHMETIC: Lazy<Regex> =
    Lazy::new(|| compile(r"^[A-Za-z0-9_.]+(?:\s*[-+*/%]\s*[A-Za-z0-9_.]+)*$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in parameter pattern is valid")
}

/// How a parameter value is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extractor {
    /// A duration in seconds; the first number when no unit is given.
    Seconds { default: f64 },
    /// A hub port letter.
    Port,
    /// A palette color name.
    Color,
    /// A whole repeat count.
    Count { default: i64 },
    /// The `index`-th number in the text.
    Number { index: usize, default: f64 },
    /// A tone frequency in hertz; metadata notes are MIDI numbers.
    Frequency,
    /// Free text, preferably quoted.
    Text,
    /// The condition of an `if` block.
    Condition,
    /// The assignment target of a `set … to …` block.
    Identifier,
    /// The assigned value of a `set … to …` block.
    Value,
    /// One of a fixed set of words; each option is `(spelling, canonical)`.
    Choice {
        options: &'static [(&'static str, &'static str)],
        default: &'static str,
    },
}

impl Extractor {
    /// The value substituted when extraction fails.
    pub fn default_value(&self) -> ParamValue {
        match *self {
            Extractor::Seconds { default } | Extractor::Number { default, .. } => {
                ParamValue::Number(default)
            }
            Extractor::Port => ParamValue::Port(Port::default()),
            Extractor::Color => ParamValue::Color(Color::default()),
            Extractor::Count { default } => ParamValue::Integer(default),
            Extractor::Frequency => ParamValue::Number(440.0),
            Extractor::Text => ParamValue::Text(String::new()),
            Extractor::Condition => ParamValue::Expression("True".to_string()),
            Extractor::Identifier => ParamValue::Identifier("variable".to_string()),
            Extractor::Value => ParamValue::Expression("0".to_string()),
            Extractor::Choice { default, .. } => ParamValue::Identifier(default.to_string()),
        }
    }

    /// Reads the value from block text.
    ///
    /// `text` is whitespace-collapsed with its original case; `normalized`
    /// is the same text lower-cased.
    fn from_text(&self, text: &str, normalized: &str) -> Option<Extracted> {
        match *self {
            Extractor::Seconds { .. } => capture(&SECONDS, normalized)
                .or_else(|| first_match(&NUMBER, normalized))
                .and_then(|n| n.parse().ok())
                .map(|n| Extracted::plain(ParamValue::Number(n))),
            Extractor::Port => capture(&NAMED_PORT, text)
                .or_else(|| capture(&BARE_PORT, text))
                .and_then(|letter| letter.chars().next())
                .map(|letter| Extracted::plain(ParamValue::Port(Port::new(letter)))),
            Extractor::Color => Color::ALL
                .into_iter()
                .find(|color| contains_word(normalized, color.name()))
                .map(|color| Extracted::plain(ParamValue::Color(color))),
            Extractor::Count { .. } => first_match(&NUMBER, normalized)
                .and_then(|n| n.parse::<f64>().ok())
                .map(|n| Extracted::plain(ParamValue::Integer(n.trunc() as i64))),
            Extractor::Number { index, .. } => NUMBER
                .find_iter(normalized)
                .nth(index)
                .and_then(|m| m.as_str().parse().ok())
                .map(|n| Extracted::plain(ParamValue::Number(n))),
            Extractor::Frequency => first_match(&NUMBER, normalized)
                .and_then(|n| n.parse().ok())
                .map(|n| Extracted::plain(ParamValue::Number(n))),
            Extractor::Text => capture(&DOUBLE_QUOTED, text)
                .or_else(|| capture(&SINGLE_QUOTED, text))
                .or_else(|| capture(&PRINT_TAIL, text))
                .map(|s| Extracted::plain(ParamValue::Text(s.to_string()))),
            Extractor::Condition => capture(&CONDITION, text).map(condition),
            Extractor::Identifier => ASSIGNMENT
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| identifier(m.as_str()))
                .map(|name| Extracted::plain(ParamValue::Identifier(name))),
            Extractor::Value => ASSIGNMENT
                .captures(text)
                .and_then(|caps| caps.get(2))
                .map(|m| Extracted::plain(ParamValue::Expression(expression(m.as_str())))),
            Extractor::Choice { options, .. } => options
                .iter()
                .find(|(spelling, _)| contains_word(normalized, spelling))
                .map(|(_, canonical)| {
                    Extracted::plain(ParamValue::Identifier(canonical.to_string()))
                }),
        }
    }

    /// Reads the value from one resolved metadata value.
    fn from_metadata(&self, key: &str, value: &str) -> Option<Extracted> {
        let value = value.trim();
        match *self {
            Extractor::Text => Some(Extracted::plain(ParamValue::Text(value.to_string()))),
            Extractor::Condition => (!value.is_empty()).then(|| condition(value)),
            Extractor::Identifier => {
                identifier(value).map(|name| Extracted::plain(ParamValue::Identifier(name)))
            }
            Extractor::Value => (!value.is_empty())
                .then(|| Extracted::plain(ParamValue::Expression(expression(value)))),
            Extractor::Frequency if key == "NOTE" => value
                .parse::<f64>()
                .ok()
                .map(|note| Extracted::plain(ParamValue::Number(midi_to_hertz(note)))),
            _ => self.from_text(value, &value.to_lowercase()),
        }
    }
}

/// One declared parameter of a pattern rule.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    name: &'static str,
    extractor: Extractor,
    metadata_keys: &'static [&'static str],
}

impl ParamSpec {
    pub const fn new(
        name: &'static str,
        extractor: Extractor,
        metadata_keys: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            extractor,
            metadata_keys,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn extractor(&self) -> Extractor {
        self.extractor
    }
}

/// A problem found while extracting parameters; never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamIssue {
    /// No value was found and the default was substituted.
    Defaulted { name: &'static str, value: ParamValue },
    /// A port letter outside `A`–`F`, kept as written.
    InvalidPort { name: &'static str, port: Port },
}

/// Extracts every declared parameter.
///
/// Metadata values (when `definition` is given) take precedence over text.
/// Returns the parameters in declaration order plus any issues.
pub fn extract_parameters(
    specs: &[ParamSpec],
    text: &str,
    definition: Option<&BlockDefinition>,
) -> (Parameters, Vec<ParamIssue>) {
    let text = collapse_whitespace(text);
    let normalized = text.to_lowercase();

    let mut parameters = Parameters::new();
    let mut issues = Vec::new();
    let mut notes = Vec::new();

    for spec in specs {
        let from_metadata = definition.and_then(|definition| {
            spec.metadata_keys.iter().find_map(|key| {
                definition
                    .value(key)
                    .and_then(|value| spec.extractor.from_metadata(key, value))
            })
        });

        let extracted = from_metadata.or_else(|| spec.extractor.from_text(&text, &normalized));
        let value = match extracted {
            Some(extracted) => {
                notes.extend(extracted.note);
                extracted.value
            }
            None => {
                let value = spec.extractor.default_value();
                issues.push(ParamIssue::Defaulted {
                    name: spec.name,
                    value: value.clone(),
                });
                value
            }
        };

        if let Some(port) = value.as_port().filter(|port| !port.is_valid()) {
            issues.push(ParamIssue::InvalidPort {
                name: spec.name,
                port,
            });
        }

        parameters.insert(spec.name, value);
    }

    if !notes.is_empty() {
        parameters.insert(NOTE_PARAM, ParamValue::Text(notes.join("; ")));
    }

    (parameters, issues)
}

/// Lower-cases and collapses whitespace for rule matching.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Extracted {
    value: ParamValue,
    note: Option<String>,
}

impl Extracted {
    fn plain(value: ParamValue) -> Self {
        Self { value, note: None }
    }
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn first_match<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern.find(text).map(|m| m.as_str())
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

/// Keeps simple comparisons and names; anything else becomes `True` with
/// the original text preserved as a note.
fn condition(raw: &str) -> Extracted {
    let raw = raw.trim();
    let (negated, body) = match raw.strip_prefix("not ") {
        Some(rest) => (true, rest.trim()),
        None => (false, raw),
    };
    let body = body
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .map_or(body, str::trim);

    let Some(caps) = COMPARISON.captures(body).filter(|caps| {
        [1, 3]
            .iter()
            .filter_map(|&i| caps.get(i))
            .all(|operand| !is_reserved(operand.as_str()))
    }) else {
        return Extracted {
            value: ParamValue::Expression("True".to_string()),
            note: Some(raw.to_string()),
        };
    };

    let left = &caps[1];
    let rendered = match (caps.get(2), caps.get(3)) {
        (Some(op), Some(right)) => {
            let op = if op.as_str() == "=" { "==" } else { op.as_str() };
            format!("{left} {op} {}", right.as_str())
        }
        _ => left.to_string(),
    };

    let rendered = if negated {
        format!("not ({rendered})")
    } else {
        rendered
    };
    Extracted::plain(ParamValue::Expression(rendered))
}

/// Keywords that cannot stand as an operand; the constants can.
fn is_reserved(word: &str) -> bool {
    PYTHON_KEYWORDS.contains(&word) && !matches!(word, "True" | "False" | "None")
}

/// Lowers a display name to a `snake_case` identifier.
fn identifier(raw: &str) -> Option<String> {
    let mut name = String::new();
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('_') && !name.is_empty() {
            name.push('_');
        }
    }
    let name = name.trim_end_matches('_').to_string();

    if name.is_empty() {
        return None;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(format!("_{name}"));
    }
    if PYTHON_KEYWORDS.contains(&name.as_str()) {
        return Some(format!("{name}_"));
    }
    Some(name)
}

/// Renders an assigned value as a Python expression.
fn expression(raw: &str) -> String {
    let raw = raw.trim();
    if LITERAL.is_match(raw) || (IDENTIFIER.is_match(raw) && !PYTHON_KEYWORDS.contains(&raw)) {
        return raw.to_string();
    }
    if let Some(text) = capture(&DOUBLE_QUOTED, raw).or_else(|| capture(&SINGLE_QUOTED, raw)) {
        return string_literal(text);
    }
    if ARITHMETIC.is_match(raw) {
        return collapse_whitespace(raw);
    }
    string_literal(raw)
}

/// An escaped single-quoted Python string literal.
pub fn string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('\'');
    for c in text.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}

fn midi_to_hertz(note: f64) -> f64 {
    let hertz = 440.0 * 2f64.powf((note - 69.0) / 12.0);
    (hertz * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    const SECONDS_SPEC: ParamSpec =
        ParamSpec::new("duration", Extractor::Seconds { default: 1.0 }, &["DURATION"]);
    const PORT_SPEC: ParamSpec = ParamSpec::new("port", Extractor::Port, &["PORT"]);

    fn one(spec: ParamSpec, text: &str) -> (ParamValue, Vec<ParamIssue>) {
        let (params, issues) = extract_parameters(&[spec], text, None);
        let value = params.get(spec.name()).cloned().unwrap();
        (value, issues)
    }

    #[test]
    fn test_seconds_with_and_without_unit() {
        assert_eq!(one(SECONDS_SPEC, "wait 2.5 seconds").0, ParamValue::Number(2.5));
        assert_eq!(one(SECONDS_SPEC, "motor A run 3 rotations for 4s").0, ParamValue::Number(4.0));
        assert_eq!(one(SECONDS_SPEC, "pause 7").0, ParamValue::Number(7.0));
    }

    #[test]
    fn test_missing_duration_defaults() {
        let (value, issues) = one(SECONDS_SPEC, "wait seconds");
        assert_eq!(value, ParamValue::Number(1.0));
        assert_eq!(
            issues,
            vec![ParamIssue::Defaulted {
                name: "duration",
                value: ParamValue::Number(1.0)
            }]
        );
    }

    #[test]
    fn test_port_named_and_bare() {
        assert_eq!(one(PORT_SPEC, "motor b run").0, ParamValue::Port(Port::new('B')));
        assert_eq!(one(PORT_SPEC, "run C for 2").0, ParamValue::Port(Port::new('C')));
    }

    #[test]
    fn test_out_of_range_port_is_kept_and_flagged() {
        let (value, issues) = one(PORT_SPEC, "motor Z stop");
        assert_eq!(value, ParamValue::Port(Port::new('Z')));
        assert!(matches!(issues.as_slice(), [ParamIssue::InvalidPort { name: "port", .. }]));
    }

    #[test]
    fn test_color_and_choice() {
        let color = ParamSpec::new("color", Extractor::Color, &[]);
        assert_eq!(one(color, "LED set to Red").0, ParamValue::Color(Color::Red));
        assert_eq!(one(color, "light on").0, ParamValue::Color(Color::White));

        let sensor = ParamSpec::new(
            "sensor",
            Extractor::Choice {
                options: &[("distance", "distance"), ("colour", "color")],
                default: "distance",
            },
            &[],
        );
        assert_eq!(
            one(sensor, "read colour sensor").0,
            ParamValue::Identifier("color".into())
        );
    }

    #[test]
    fn test_text_sources() {
        let text = ParamSpec::new("text", Extractor::Text, &[]);
        assert_eq!(one(text, r#"print "Hello, hub""#).0, ParamValue::Text("Hello, hub".into()));
        assert_eq!(one(text, "say 'hi'").0, ParamValue::Text("hi".into()));
        assert_eq!(one(text, "display text Ready").0, ParamValue::Text("Ready".into()));
        assert_eq!(one(text, "print").0, ParamValue::Text(String::new()));
    }

    #[test]
    fn test_condition_simple_and_complex() {
        let spec = ParamSpec::new("condition", Extractor::Condition, &["CONDITION"]);

        let (params, _) = extract_parameters(&[spec], "if distance < 10 then", None);
        assert_eq!(params.get("condition"), Some(&ParamValue::Expression("distance < 10".into())));
        assert!(params.get(NOTE_PARAM).is_none());

        let (params, _) = extract_parameters(&[spec], "if x = 3", None);
        assert_eq!(params.get("condition"), Some(&ParamValue::Expression("x == 3".into())));

        let (params, _) = extract_parameters(&[spec], "if color sensor sees red then", None);
        assert_eq!(params.get("condition"), Some(&ParamValue::Expression("True".into())));
        assert_eq!(
            params.get(NOTE_PARAM),
            Some(&ParamValue::Text("color sensor sees red".into()))
        );
    }

    #[test]
    fn test_keyword_operands_fall_back_to_true() {
        for raw in ["pass", "while", "x < lambda", "not (in)"] {
            let extracted = condition(raw);
            assert_eq!(extracted.value, ParamValue::Expression("True".into()), "{raw}");
            assert_eq!(extracted.note.as_deref(), Some(raw));
        }

        assert_eq!(
            condition("ready == True").value,
            ParamValue::Expression("ready == True".into())
        );
        assert_eq!(condition("None").value, ParamValue::Expression("None".into()));
    }

    #[test]
    fn test_negated_condition() {
        let extracted = condition("not (distance > 10)");
        assert_eq!(extracted.value, ParamValue::Expression("not (distance > 10)".into()));
        assert!(extracted.note.is_none());
    }

    #[test]
    fn test_assignment_parts() {
        let specs = [
            ParamSpec::new("name", Extractor::Identifier, &[]),
            ParamSpec::new("value", Extractor::Value, &[]),
        ];
        let (params, issues) = extract_parameters(&specs, "set My Speed to 50", None);
        assert_eq!(params.get("name"), Some(&ParamValue::Identifier("my_speed".into())));
        assert_eq!(params.get("value"), Some(&ParamValue::Expression("50".into())));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_identifier_lowering() {
        assert_eq!(identifier("Lap Count!").as_deref(), Some("lap_count"));
        assert_eq!(identifier("2nd try").as_deref(), Some("_2nd_try"));
        assert_eq!(identifier("class").as_deref(), Some("class_"));
        assert_eq!(identifier("!!"), None);
    }

    #[test]
    fn test_expression_rendering() {
        assert_eq!(expression("-4.5"), "-4.5");
        assert_eq!(expression("speed"), "speed");
        assert_eq!(expression("speed  +  1"), "speed + 1");
        assert_eq!(expression("\"fast\""), "'fast'");
        assert_eq!(expression("very fast"), "'very fast'");
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal(r"it's a \ test"), r"'it\'s a \\ test'");
    }

    #[test]
    fn test_metadata_values_take_precedence() {
        let mut values = IndexMap::new();
        values.insert("PORT".to_string(), "E".to_string());
        values.insert("NOTE".to_string(), "69".to_string());
        let definition = BlockDefinition::new("flippersound_beepForTime", values);

        let specs = [
            PORT_SPEC,
            ParamSpec::new("frequency", Extractor::Frequency, &["FREQUENCY", "NOTE"]),
        ];
        let (params, issues) =
            extract_parameters(&specs, "flippersound beepForTime PORT E NOTE 69", Some(&definition));

        assert_eq!(params.port("port"), Some(Port::new('E')));
        assert_eq!(params.number("frequency"), Some(440.0));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Motor   A\tRUN "), "motor a run");
    }
}
