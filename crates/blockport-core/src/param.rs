//! Typed block parameters.
//!
//! Parameters are extracted from block text (or metadata fields) and keyed
//! by name. Insertion order is preserved so that iteration, and therefore
//! generated output, is deterministic.

use std::fmt;

use indexmap::IndexMap;

/// A hub port letter.
///
/// Valid ports are `A` through `F`. Letters outside that range are kept as
/// written (upper-cased) and reported as invalid rather than corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    letter: char,
}

impl Port {
    /// Creates a port from a letter, upper-casing it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockport_core::param::Port;
    /// let port = Port::new('b');
    /// assert_eq!(port.letter(), 'B');
    /// assert!(port.is_valid());
    ///
    /// assert!(!Port::new('Z').is_valid());
    /// ```
    pub fn new(letter: char) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
        }
    }

    pub fn letter(self) -> char {
        self.letter
    }

    /// Returns `true` if the letter names a physical port (`A`–`F`).
    pub fn is_valid(self) -> bool {
        ('A'..='F').contains(&self.letter)
    }
}

impl Default for Port {
    fn default() -> Self {
        Self { letter: 'A' }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter)
    }
}

/// The fixed LED color palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    #[default]
    White,
    Black,
    Orange,
    Purple,
    Pink,
    Cyan,
}

impl Color {
    pub const ALL: [Color; 10] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::White,
        Color::Black,
        Color::Orange,
        Color::Purple,
        Color::Pink,
        Color::Cyan,
    ];

    /// Looks up a palette color by its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::White => "white",
            Color::Black => "black",
            Color::Orange => "orange",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Cyan => "cyan",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A floating point quantity such as a duration in seconds.
    Number(f64),
    /// A whole number such as a repeat count.
    Integer(i64),
    Port(Port),
    Color(Color),
    /// Free text, emitted as a string literal.
    Text(String),
    /// A bare name, emitted verbatim.
    Identifier(String),
    /// An expression, emitted verbatim.
    Expression(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(value) => Some(*value),
            ParamValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_port(&self) -> Option<Port> {
        match self {
            ParamValue::Port(port) => Some(*port),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            ParamValue::Color(color) => Some(*color),
            _ => None,
        }
    }

    /// Returns the textual payload of text-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) | ParamValue::Identifier(s) | ParamValue::Expression(s) => Some(s),
            _ => None,
        }
    }
}

/// Named parameters of one block, in extraction order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_number)
    }

    pub fn port(&self, name: &str) -> Option<Port> {
        self.get(name).and_then(ParamValue::as_port)
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(ParamValue::as_color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
