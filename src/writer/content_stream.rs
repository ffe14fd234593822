//! Content stream assembly (ISO 32000-1:2008 Sections 8 and 9).
//!
//! Operators are recorded as [`ContentStreamOp`] values and written one per
//! line. Text operators are kept inside a `BT`/`ET` pair automatically.

use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::Color;
use std::io::Write;

/// Bézier control distance for a quarter circle, 4/3 * (sqrt(2) - 1).
const KAPPA: f32 = 0.552_284_8;

/// One content stream operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// `q`
    SaveState,
    /// `Q`
    RestoreState,
    /// `BT`
    BeginText,
    /// `ET`
    EndText,
    /// `/name size Tf`
    SetFont(String, f32),
    /// `x y Tm` with an identity scale
    TextPosition(f32, f32),
    /// `(text) Tj`
    ShowText(String),
    /// `r g b rg`
    FillColor(Color),
    /// `r g b RG`
    StrokeColor(Color),
    /// `w`
    LineWidth(f32),
    /// `m`
    MoveTo(f32, f32),
    /// `l`
    LineTo(f32, f32),
    /// `c`
    CurveTo([f32; 6]),
    /// `re`
    Rectangle(Rect),
    /// `h`
    ClosePath,
    /// `S`
    Stroke,
    /// `f`
    Fill,
    /// `B`
    FillStroke,
    /// `W n`
    ClipToPath,
}

impl ContentStreamOp {
    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let (operands, operator): (Vec<f32>, &str) = match self {
            Self::SaveState => (vec![], "q"),
            Self::RestoreState => (vec![], "Q"),
            Self::BeginText => (vec![], "BT"),
            Self::EndText => (vec![], "ET"),
            Self::SetFont(name, size) => return write!(w, "/{} {} Tf", name, size),
            Self::TextPosition(x, y) => (vec![1.0, 0.0, 0.0, 1.0, *x, *y], "Tm"),
            Self::ShowText(text) => {
                w.write_all(b"(")?;
                write_win_ansi(w, text)?;
                return w.write_all(b") Tj");
            },
            Self::FillColor(c) => (vec![c.r, c.g, c.b], "rg"),
            Self::StrokeColor(c) => (vec![c.r, c.g, c.b], "RG"),
            Self::LineWidth(width) => (vec![*width], "w"),
            Self::MoveTo(x, y) => (vec![*x, *y], "m"),
            Self::LineTo(x, y) => (vec![*x, *y], "l"),
            Self::CurveTo(points) => (points.to_vec(), "c"),
            Self::Rectangle(r) => (vec![r.x, r.y, r.width, r.height], "re"),
            Self::ClosePath => (vec![], "h"),
            Self::Stroke => (vec![], "S"),
            Self::Fill => (vec![], "f"),
            Self::FillStroke => (vec![], "B"),
            Self::ClipToPath => return w.write_all(b"W\nn"),
        };
        for value in operands {
            write!(w, "{} ", value)?;
        }
        w.write_all(operator.as_bytes())
    }
}

/// Records drawing and text operators for a page or Form XObject.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    ops: Vec<ContentStreamOp>,
    in_text: bool,
    font: Option<(String, f32)>,
}

impl ContentStreamBuilder {
    /// Empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw operator.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Operators recorded so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.ops
    }

    /// Open a text object unless one is already open.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text {
            self.in_text = true;
            self.op(ContentStreamOp::BeginText);
        }
        self
    }

    /// Close the open text object, if any.
    ///
    /// The font selection does not survive `ET`.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text {
            self.in_text = false;
            self.font = None;
            self.op(ContentStreamOp::EndText);
        }
        self
    }

    /// Select a font; repeated selections of the same font are skipped.
    pub fn set_font(&mut self, resource_name: &str, size: f32) -> &mut Self {
        let wanted = (resource_name.to_string(), size);
        if self.font.as_ref() != Some(&wanted) {
            self.op(ContentStreamOp::SetFont(resource_name.to_string(), size));
            self.font = Some(wanted);
        }
        self
    }

    /// Show `text` with its baseline origin at (`x`, `y`).
    pub fn text(&mut self, text: &str, x: f32, y: f32) -> &mut Self {
        self.begin_text()
            .op(ContentStreamOp::TextPosition(x, y))
            .op(ContentStreamOp::ShowText(text.to_string()))
    }

    /// Non-stroking RGB color.
    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::FillColor(color))
    }

    /// Stroking RGB color.
    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::StrokeColor(color))
    }

    /// Line width in points.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.op(ContentStreamOp::LineWidth(width))
    }

    /// Rectangle path.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(Rect::new(x, y, width, height)))
    }

    /// Stroke the current path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Fill the current path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Intersect the clipping path with `rect`.
    pub fn clip_rect(&mut self, rect: Rect) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(rect))
            .op(ContentStreamOp::ClipToPath)
    }

    /// `q`
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// `Q`
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// Closed path of four Bézier arcs inscribed in `bounds`.
    pub fn ellipse(&mut self, bounds: Rect) -> &mut Self {
        let c = bounds.center();
        let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        self.op(ContentStreamOp::MoveTo(c.x + rx, c.y))
            .op(ContentStreamOp::CurveTo([c.x + rx, c.y + ky, c.x + kx, c.y + ry, c.x, c.y + ry]))
            .op(ContentStreamOp::CurveTo([c.x - kx, c.y + ry, c.x - rx, c.y + ky, c.x - rx, c.y]))
            .op(ContentStreamOp::CurveTo([c.x - rx, c.y - ky, c.x - kx, c.y - ry, c.x, c.y - ry]))
            .op(ContentStreamOp::CurveTo([c.x + kx, c.y - ry, c.x + rx, c.y - ky, c.x + rx, c.y]))
            .op(ContentStreamOp::ClosePath)
    }

    /// Rectangle path with quarter-circle corners.
    ///
    /// The radius is clamped to half the shorter side.
    pub fn rounded_rect(&mut self, bounds: Rect, radius: f32) -> &mut Self {
        let r = radius.max(0.0).min(bounds.width.min(bounds.height) / 2.0);
        let k = r * KAPPA;
        let (x0, y0, x1, y1) = (bounds.left(), bounds.bottom(), bounds.right(), bounds.top());

        self.op(ContentStreamOp::MoveTo(x0 + r, y0))
            .op(ContentStreamOp::LineTo(x1 - r, y0))
            .op(ContentStreamOp::CurveTo([x1 - r + k, y0, x1, y0 + r - k, x1, y0 + r]))
            .op(ContentStreamOp::LineTo(x1, y1 - r))
            .op(ContentStreamOp::CurveTo([x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1]))
            .op(ContentStreamOp::LineTo(x0 + r, y1))
            .op(ContentStreamOp::CurveTo([x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r]))
            .op(ContentStreamOp::LineTo(x0, y0 + r))
            .op(ContentStreamOp::CurveTo([x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0]))
            .op(ContentStreamOp::ClosePath)
    }

    /// Encode the recorded operators, closing a dangling text object.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for op in &self.ops {
            op.write_to(&mut buf)?;
            buf.push(b'\n');
        }
        if self.in_text {
            buf.extend_from_slice(b"ET\n");
        }
        Ok(buf)
    }
}

/// Literal string body for a WinAnsi-encoded base font.
///
/// Latin-1 characters become octal escapes; anything beyond is `?`.
fn write_win_ansi<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => write!(w, "\\{}", ch)?,
            '\n' => w.write_all(b"\\n")?,
            '\r' => w.write_all(b"\\r")?,
            '\t' => w.write_all(b"\\t")?,
            ' '..='~' => w.write_all(&[ch as u8])?,
            '\u{a0}'..='\u{ff}' => write!(w, "\\{:03o}", u32::from(ch))?,
            _ => w.write_all(b"?")?,
        }
    }
    Ok(())
}
