//! User-space geometry.
//!
//! Units are points (1/72 inch); y grows upward from the lower-left corner
//! of the page (ISO 32000-1:2008 Section 8.3.2.3).

/// A position in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Point at (`x`, `y`).
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box anchored at its lower-left corner.
///
/// ```
/// use pdf_seal::geometry::Rect;
///
/// let field = Rect::new(324.0, 144.0, 216.0, 72.0);
/// assert_eq!((field.right(), field.top()), (540.0, 216.0));
/// assert_eq!(field.at_origin(), Rect::new(0.0, 0.0, 216.0, 72.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower-left x
    pub x: f32,
    /// Lower-left y
    pub y: f32,
    /// Extent along x
    pub width: f32,
    /// Extent along y
    pub height: f32,
}

impl Rect {
    /// Box with lower-left corner (`x`, `y`) and the given extents.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Same extents, moved to the origin.
    ///
    /// A Form XObject for a widget at `rect` is drawn in `rect.at_origin()`.
    pub fn at_origin(&self) -> Self {
        Self { x: 0.0, y: 0.0, ..*self }
    }

    /// Minimum x.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Maximum x.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Minimum y.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Maximum y.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Move every edge outward by `dx` horizontally and `dy` vertically.
    ///
    /// Negative values shrink the box, possibly to nothing.
    ///
    /// ```
    /// use pdf_seal::geometry::Rect;
    ///
    /// let inner = Rect::new(0.0, 0.0, 216.0, 72.0).inflate(-4.0, -4.0);
    /// assert_eq!(inner, Rect::new(4.0, 4.0, 208.0, 64.0));
    /// ```
    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x - dx,
            y: self.y - dy,
            width: self.width + dx * 2.0,
            height: self.height + dy * 2.0,
        }
    }

    /// No positive area. NaN extents count as degenerate.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Every coordinate and edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.right().is_finite() && self.top().is_finite()
    }
}
