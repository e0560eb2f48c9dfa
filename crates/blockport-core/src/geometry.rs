//! Geometric primitives for block positions.
//!
//! Block records carry a position and a bounding size in the diagram's
//! coordinate space. Blockport follows the SVG convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward; a larger `x` means deeper indentation
//! - **Y-axis**: Increases downward; a larger `y` means later in the program

use std::cmp::Ordering;

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use blockport_core::geometry::Point;
/// let group = Point::new(50.0, 100.0);
/// let text = Point::new(0.0, 20.0);
///
/// let absolute = group.add_point(text);
/// assert_eq!(absolute.x(), 50.0);
/// assert_eq!(absolute.y(), 120.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Reading order of two points: top-to-bottom, then left-to-right.
    ///
    /// Uses [`f32::total_cmp`] so the order is total even for NaN
    /// coordinates, which keeps block sorting deterministic.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::cmp::Ordering;
    /// # use blockport_core::geometry::Point;
    /// let upper = Point::new(300.0, 10.0);
    /// let lower = Point::new(0.0, 20.0);
    /// assert_eq!(upper.reading_order(lower), Ordering::Less);
    ///
    /// let left = Point::new(0.0, 20.0);
    /// assert_eq!(lower.reading_order(left), Ordering::Equal);
    /// ```
    pub fn reading_order(self, other: Point) -> Ordering {
        self.y
            .total_cmp(&other.y)
            .then_with(|| self.x.total_cmp(&other.x))
    }
}

/// Width and height of a block's bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width component of the size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height component of the size
    pub fn height(self) -> f32 {
        self.height
    }
}
