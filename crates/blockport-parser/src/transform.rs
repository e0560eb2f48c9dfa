//! Parsers for SVG presentation attributes.
//!
//! Only the parts of an element's geometry that affect block placement are
//! understood: the `transform` attribute (as a list of transform functions)
//! and plain length attributes such as `x="20px"`.
//!
//! Translations compose additively from root to leaf. `matrix(a b c d e f)`
//! contributes its `(e, f)` translation. Scaling, rotation and skew do not
//! move a block's reading position and contribute nothing.

use thiserror::Error;
use winnow::{
    ModalResult, Parser as _,
    ascii::{digit0, digit1, multispace0, multispace1},
    combinator::{alt, delimited, opt, preceded, repeat, separated, terminated},
    token::{one_of, take_while},
};

use blockport_core::geometry::Point;

/// A single transform function from a `transform` attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(Point),
    Matrix([f32; 6]),
    /// `scale`, `rotate`, `skewX` or `skewY`.
    Linear,
}

impl Transform {
    /// The translation this transform contributes.
    pub fn offset(self) -> Point {
        match self {
            Transform::Translate(offset) => offset,
            Transform::Matrix([_, _, _, _, e, f]) => Point::new(e, f),
            Transform::Linear => Point::default(),
        }
    }
}

/// A `transform` attribute that could not be understood.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("invalid transform syntax in `{0}`")]
    Syntax(String),

    #[error("unknown transform function `{0}`")]
    UnknownFunction(String),

    #[error("`{name}` expects {expected} argument(s), found {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },
}

/// Parses a `transform` attribute into its transform functions.
///
/// # Examples
///
/// ```
/// # use blockport_parser::transform::{parse_transform, Transform};
/// # use blockport_core::geometry::Point;
/// let list = parse_transform("translate(50, 100) scale(2)").unwrap();
/// assert_eq!(list[0], Transform::Translate(Point::new(50.0, 100.0)));
/// assert_eq!(list[1], Transform::Linear);
/// ```
///
/// # Errors
///
/// Returns [`TransformError`] for malformed syntax, unknown function names,
/// or a wrong number of arguments.
pub fn parse_transform(attribute: &str) -> Result<Vec<Transform>, TransformError> {
    let raw = transform_list
        .parse(attribute)
        .map_err(|_| TransformError::Syntax(attribute.to_string()))?;

    raw.into_iter()
        .map(|(name, args)| to_transform(name, &args))
        .collect()
}

/// Sums the translations of a transform list.
pub fn total_offset(transforms: &[Transform]) -> Point {
    transforms
        .iter()
        .fold(Point::default(), |acc, t| acc.add_point(t.offset()))
}

/// Parses a length attribute, ignoring any unit suffix.
///
/// Coordinate lists (`x="10 20 30"`, used for per-glyph placement) yield
/// their first value. Returns `None` if the value does not start with a
/// finite number.
///
/// ```
/// # use blockport_parser::transform::parse_length;
/// assert_eq!(parse_length("20px"), Some(20.0));
/// assert_eq!(parse_length(" 1.5e1 3 4"), Some(15.0));
/// assert_eq!(parse_length("auto"), None);
/// ```
pub fn parse_length(value: &str) -> Option<f32> {
    let mut input = value;
    preceded(multispace0, number)
        .parse_next(&mut input)
        .ok()
        .filter(|v| v.is_finite())
}

fn to_transform(name: &str, args: &[f32]) -> Result<Transform, TransformError> {
    let arity = |expected: &'static str| TransformError::Arity {
        name: name.to_string(),
        expected,
        found: args.len(),
    };

    match name {
        "translate" => match *args {
            [tx] => Ok(Transform::Translate(Point::new(tx, 0.0))),
            [tx, ty] => Ok(Transform::Translate(Point::new(tx, ty))),
            _ => Err(arity("1 or 2")),
        },
        "matrix" => match *args {
            [a, b, c, d, e, f] => Ok(Transform::Matrix([a, b, c, d, e, f])),
            _ => Err(arity("6")),
        },
        "scale" | "rotate" | "skewX" | "skewY" => {
            if args.is_empty() || args.len() > 3 {
                Err(arity("1 to 3"))
            } else {
                Ok(Transform::Linear)
            }
        }
        other => Err(TransformError::UnknownFunction(other.to_string())),
    }
}

/// A decimal number. An `e` only starts an exponent when digits follow,
/// so font-relative units (`1em`, `2ex`) end the number.
fn number(input: &mut &str) -> ModalResult<f32> {
    (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .try_map(str::parse::<f32>)
        .parse_next(input)
}

/// Comma and/or whitespace; always consumes at least one character.
fn separator(input: &mut &str) -> ModalResult<()> {
    alt(((multispace0, ',', multispace0).void(), multispace1.void())).parse_next(input)
}

fn function_name<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn arguments(input: &mut &str) -> ModalResult<Vec<f32>> {
    delimited(
        ('(', multispace0),
        separated(0.., number, separator),
        (multispace0, ')'),
    )
    .parse_next(input)
}

fn transform_function<'s>(input: &mut &'s str) -> ModalResult<(&'s str, Vec<f32>)> {
    (function_name, preceded(multispace0, arguments)).parse_next(input)
}

fn transform_list<'s>(input: &mut &'s str) -> ModalResult<Vec<(&'s str, Vec<f32>)>> {
    preceded(
        multispace0,
        repeat(0.., terminated(transform_function, opt(separator))),
    )
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_translate_two_args() {
        let list = parse_transform("translate(50, 100)").unwrap();
        assert_eq!(list, vec![Transform::Translate(Point::new(50.0, 100.0))]);
    }

    #[test]
    fn test_translate_single_arg_defaults_y() {
        let list = parse_transform("translate(12.5)").unwrap();
        assert_eq!(list, vec![Transform::Translate(Point::new(12.5, 0.0))]);
    }

    #[test]
    fn test_translate_whitespace_separated() {
        let list = parse_transform("  translate( -4 8 )  ").unwrap();
        assert_eq!(list, vec![Transform::Translate(Point::new(-4.0, 8.0))]);
    }

    #[test]
    fn test_list_composes_additively() {
        let list = parse_transform("translate(10,20) scale(2) translate(5 5)").unwrap();
        let offset = total_offset(&list);
        assert!(approx_eq!(f32, offset.x(), 15.0));
        assert!(approx_eq!(f32, offset.y(), 25.0));
    }

    #[test]
    fn test_adjacent_functions_without_separator() {
        let list = parse_transform("translate(1,2)translate(3,4)").unwrap();
        assert_eq!(total_offset(&list), Point::new(4.0, 6.0));
    }

    #[test]
    fn test_matrix_contributes_translation() {
        let list = parse_transform("matrix(1 0 0 1 30 40)").unwrap();
        assert_eq!(total_offset(&list), Point::new(30.0, 40.0));
    }

    #[test]
    fn test_empty_attribute() {
        assert_eq!(parse_transform("").unwrap(), vec![]);
        assert_eq!(parse_transform("   ").unwrap(), vec![]);
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            parse_transform("warp(1)"),
            Err(TransformError::UnknownFunction("warp".into()))
        );
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse_transform("translate(1, 2, 3)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "`translate` expects 1 or 2 argument(s), found 3"
        );
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_transform("translate(1, 2"),
            Err(TransformError::Syntax(_))
        ));
    }

    #[test]
    fn test_parse_length_units_and_lists() {
        assert_eq!(parse_length("20"), Some(20.0));
        assert_eq!(parse_length("20px"), Some(20.0));
        assert_eq!(parse_length("-3.5em"), Some(-3.5));
        assert_eq!(parse_length("1em"), Some(1.0));
        assert_eq!(parse_length("2ex"), Some(2.0));
        assert_eq!(parse_length("1.5e1em"), Some(15.0));
        assert_eq!(parse_length("2E-1"), Some(0.2));
        assert_eq!(parse_length(".5"), Some(0.5));
        assert_eq!(parse_length("10 20 30"), Some(10.0));
        assert_eq!(parse_length(""), None);
        assert_eq!(parse_length("px"), None);
    }
}
