//! Appearance builder for signature widgets.
//!
//! An [`AppearanceObject`] is a finished, immutable Form XObject body: a
//! bounding box plus the content stream that paints it. It is produced by
//! replaying a list of [`DrawInstruction`]s against a
//! [`CompositionSurface`] and is then shared (never copied) with the
//! signature fields that display it.
//!
//! # Example
//!
//! ```
//! use pdf_seal::appearance::{
//!     build_appearance, DrawInstruction, ShapeKind, ShapeStyle, TextAlignment, TextStyle,
//! };
//! use pdf_seal::geometry::Rect;
//! use pdf_seal::layout::Color;
//!
//! let bounds = Rect::new(0.0, 0.0, 216.0, 72.0);
//! let appearance = build_appearance(
//!     bounds,
//!     &[
//!         DrawInstruction::shape(
//!             ShapeKind::Ellipse,
//!             bounds.inflate(-4.0, -5.0),
//!             ShapeStyle::filled(Color::cornflower_blue()),
//!         ),
//!         DrawInstruction::text("Signed", TextStyle::default(), bounds, TextAlignment::centered()),
//!     ],
//! )
//! .unwrap();
//! assert_eq!(appearance.bounds(), bounds);
//! ```

pub mod surface;

pub use surface::{CompositionSurface, FormXObjectSurface};
pub use crate::writer::StandardFont;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::Color;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outline of a shape primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    /// Axis-aligned rectangle
    Rectangle,
    /// Ellipse inscribed in the bounds
    Ellipse,
    /// Rectangle with rounded corners of the given radius
    RoundedRectangle(f32),
}

/// Outline stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// Stroke color
    pub color: Color,
    /// Line width in points
    pub width: f32,
}

impl Stroke {
    /// Create a stroke.
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

/// How a shape is painted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeStyle {
    /// Interior fill, if any
    pub fill: Option<Color>,
    /// Outline, if any
    pub stroke: Option<Stroke>,
}

impl ShapeStyle {
    /// Fill only.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    /// Outline only.
    pub fn stroked(color: Color, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(Stroke::new(color, width)),
        }
    }

    /// Add an outline to this style.
    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(Stroke::new(color, width));
        self
    }
}

/// Font, size and color of drawn text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Base-14 font
    pub font: StandardFont,
    /// Font size in points
    pub size: f32,
    /// Text color
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            size: 10.0,
            color: Color::black(),
        }
    }
}

impl TextStyle {
    /// Create a text style.
    pub fn new(font: StandardFont, size: f32, color: Color) -> Self {
        Self { font, size, color }
    }
}

/// Horizontal placement of text lines inside their bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

/// Vertical placement of a text block inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    /// Against the top edge
    #[default]
    Top,
    /// Centered
    Middle,
    /// Against the bottom edge
    Bottom,
}

/// Text alignment inside a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextAlignment {
    /// Horizontal alignment
    pub horizontal: HorizontalAlignment,
    /// Vertical alignment
    pub vertical: VerticalAlignment,
}

impl TextAlignment {
    /// Create an alignment.
    pub fn new(horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Centered on both axes.
    pub fn centered() -> Self {
        Self::new(HorizontalAlignment::Center, VerticalAlignment::Middle)
    }
}

/// A single drawing primitive of an appearance.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawInstruction {
    /// Paint a shape
    Shape {
        /// Outline
        kind: ShapeKind,
        /// Box the shape fills
        bounds: Rect,
        /// Fill and stroke
        style: ShapeStyle,
    },
    /// Draw one or more lines of text
    Text {
        /// Text; `\n` and `\r\n` start new lines
        text: String,
        /// Font, size and color
        style: TextStyle,
        /// Box the text is laid out and clipped in
        bounds: Rect,
        /// Placement inside `bounds`
        alignment: TextAlignment,
    },
}

impl DrawInstruction {
    /// Shorthand for [`DrawInstruction::Shape`].
    pub fn shape(kind: ShapeKind, bounds: Rect, style: ShapeStyle) -> Self {
        DrawInstruction::Shape {
            kind,
            bounds,
            style,
        }
    }

    /// Shorthand for [`DrawInstruction::Text`].
    pub fn text(
        text: impl Into<String>,
        style: TextStyle,
        bounds: Rect,
        alignment: TextAlignment,
    ) -> Self {
        DrawInstruction::Text {
            text: text.into(),
            style,
            bounds,
            alignment,
        }
    }

    /// Replay this instruction on a surface.
    pub fn apply<S: CompositionSurface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        match self {
            DrawInstruction::Shape {
                kind,
                bounds,
                style,
            } => surface.draw_shape(*kind, *bounds, style),
            DrawInstruction::Text {
                text,
                style,
                bounds,
                alignment,
            } => surface.draw_text(text, style, *bounds, *alignment),
        }
    }
}

/// A pre-rendered, immutable visual fragment.
///
/// Cloning the `Arc` returned by [`build_appearance`] is how an appearance
/// is shared between fields; the object itself is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceObject {
    bounds: Rect,
    content: Bytes,
    fonts: BTreeSet<StandardFont>,
}

impl AppearanceObject {
    pub(crate) fn new(bounds: Rect, content: Bytes, fonts: BTreeSet<StandardFont>) -> Self {
        Self {
            bounds,
            content,
            fonts,
        }
    }

    /// An appearance that paints nothing.
    pub fn empty(bounds: Rect) -> Result<Arc<Self>> {
        ensure_bounds(bounds)?;
        Ok(Arc::new(Self::new(bounds, Bytes::new(), BTreeSet::new())))
    }

    /// Bounding box (the Form XObject `/BBox`).
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Content stream bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Fonts referenced by the content stream.
    pub fn fonts(&self) -> impl Iterator<Item = StandardFont> + '_ {
        self.fonts.iter().copied()
    }
}

/// Compose an appearance from drawing instructions.
///
/// Fails with [`Error::InvalidBounds`] if `bounds` (or any shape's bounds)
/// has no drawable area or a coordinate that is not finite.
pub fn build_appearance(bounds: Rect, instructions: &[DrawInstruction]) -> Result<Arc<AppearanceObject>> {
    let mut surface = FormXObjectSurface::new();
    build_appearance_on(&mut surface, bounds, instructions)
}

/// Compose an appearance on a caller-supplied surface.
pub fn build_appearance_on<S: CompositionSurface + ?Sized>(
    surface: &mut S,
    bounds: Rect,
    instructions: &[DrawInstruction],
) -> Result<Arc<AppearanceObject>> {
    ensure_bounds(bounds)?;
    for instruction in instructions {
        instruction.apply(surface)?;
    }
    surface.capture_as_appearance(bounds).map(Arc::new)
}

pub(crate) fn ensure_bounds(bounds: Rect) -> Result<()> {
    if bounds.is_degenerate() || !bounds.is_finite() {
        return Err(Error::InvalidBounds {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        });
    }
    Ok(())
}
