//! Composition surfaces that appearances are drawn on.

use super::{
    ensure_bounds, AppearanceObject, HorizontalAlignment, ShapeKind, ShapeStyle, StandardFont,
    TextAlignment, TextStyle, VerticalAlignment,
};
use crate::error::Result;
use crate::geometry::Rect;
use crate::writer::content_stream::{ContentStreamBuilder, ContentStreamOp};
use bytes::Bytes;
use std::collections::BTreeSet;

/// A drawing target that can be captured as an [`AppearanceObject`].
pub trait CompositionSurface {
    /// Paint a shape inside `bounds`.
    fn draw_shape(&mut self, kind: ShapeKind, bounds: Rect, style: &ShapeStyle) -> Result<()>;

    /// Lay out `text` inside `bounds`.
    fn draw_text(
        &mut self,
        text: &str,
        style: &TextStyle,
        bounds: Rect,
        alignment: TextAlignment,
    ) -> Result<()>;

    /// Freeze everything drawn so far into an appearance and start over.
    fn capture_as_appearance(&mut self, bounds: Rect) -> Result<AppearanceObject>;
}

/// Surface that records PDF content stream operators for a Form XObject.
#[derive(Debug, Default)]
pub struct FormXObjectSurface {
    content: ContentStreamBuilder,
    fonts: BTreeSet<StandardFont>,
}

impl FormXObjectSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompositionSurface for FormXObjectSurface {
    fn draw_shape(&mut self, kind: ShapeKind, bounds: Rect, style: &ShapeStyle) -> Result<()> {
        ensure_bounds(bounds)?;

        let paint = match (style.fill.is_some(), style.stroke.is_some()) {
            (true, true) => ContentStreamOp::FillStroke,
            (true, false) => ContentStreamOp::Fill,
            (false, true) => ContentStreamOp::Stroke,
            (false, false) => return Ok(()),
        };

        self.content.save_state();
        if let Some(fill) = style.fill {
            self.content.fill_color(fill);
        }
        if let Some(stroke) = style.stroke {
            self.content.stroke_color(stroke.color).set_line_width(stroke.width);
        }
        match kind {
            ShapeKind::Rectangle => self.content.rect(bounds.x, bounds.y, bounds.width, bounds.height),
            ShapeKind::Ellipse => self.content.ellipse(bounds),
            ShapeKind::RoundedRectangle(radius) => self.content.rounded_rect(bounds, radius),
        };
        self.content.op(paint).restore_state();
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        style: &TextStyle,
        bounds: Rect,
        alignment: TextAlignment,
    ) -> Result<()> {
        ensure_bounds(bounds)?;

        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return Ok(());
        }

        let line_height = style.font.line_height(style.size);
        let block_height = line_height * lines.len() as f32;
        let block_top = match alignment.vertical {
            VerticalAlignment::Top => bounds.top(),
            VerticalAlignment::Middle => bounds.center().y + block_height / 2.0,
            VerticalAlignment::Bottom => bounds.bottom() + block_height,
        };

        self.fonts.insert(style.font);
        self.content.save_state().clip_rect(bounds).fill_color(style.color);
        self.content.begin_text().set_font(&style.font.resource_name(), style.size);

        for (i, line) in lines.iter().enumerate() {
            let width = style.font.text_width(line, style.size);
            let x = match alignment.horizontal {
                HorizontalAlignment::Left => bounds.left(),
                HorizontalAlignment::Center => bounds.left() + (bounds.width - width) / 2.0,
                HorizontalAlignment::Right => bounds.right() - width,
            };
            // Baseline sits one font size below the top of its line box.
            let y = block_top - line_height * i as f32 - style.size;
            self.content.text(line, x, y);
        }

        self.content.end_text().restore_state();
        Ok(())
    }

    fn capture_as_appearance(&mut self, bounds: Rect) -> Result<AppearanceObject> {
        ensure_bounds(bounds)?;
        let content = std::mem::take(&mut self.content).build()?;
        let fonts = std::mem::take(&mut self.fonts);
        Ok(AppearanceObject::new(bounds, Bytes::from(content), fonts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Color;

    fn content_of(surface: &mut FormXObjectSurface) -> String {
        let appearance = surface
            .capture_as_appearance(Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        String::from_utf8(appearance.content().to_vec()).unwrap()
    }

    #[test]
    fn test_filled_and_stroked_rectangle() {
        let mut surface = FormXObjectSurface::new();
        surface
            .draw_shape(
                ShapeKind::Rectangle,
                Rect::new(1.0, 2.0, 3.0, 4.0),
                &ShapeStyle::filled(Color::white()).with_stroke(Color::black(), 0.5),
            )
            .unwrap();

        let content = content_of(&mut surface);
        assert_eq!(content, "q\n1 1 1 rg\n0 0 0 RG\n0.5 w\n1 2 3 4 re\nB\nQ\n");
    }

    #[test]
    fn test_unpainted_shape_draws_nothing() {
        let mut surface = FormXObjectSurface::new();
        surface
            .draw_shape(ShapeKind::Ellipse, Rect::new(0.0, 0.0, 10.0, 10.0), &ShapeStyle::default())
            .unwrap();
        assert!(content_of(&mut surface).is_empty());
    }

    #[test]
    fn test_multiline_text_is_laid_out_per_line() {
        let mut surface = FormXObjectSurface::new();
        surface
            .draw_text(
                "first\r\nsecond",
                &TextStyle::new(StandardFont::Courier, 10.0, Color::black()),
                Rect::new(0.0, 0.0, 100.0, 100.0),
                TextAlignment::default(),
            )
            .unwrap();

        let content = content_of(&mut surface);
        assert!(content.contains("/Courier 10 Tf"));
        assert!(content.contains("1 0 0 1 0 90 Tm\n(first) Tj"));
        assert!(content.contains("1 0 0 1 0 78 Tm\n(second) Tj"));
        assert!(content.contains("0 0 100 100 re\nW\nn"));
    }

    #[test]
    fn test_right_aligned_text() {
        let mut surface = FormXObjectSurface::new();
        surface
            .draw_text(
                "abcd",
                &TextStyle::new(StandardFont::Courier, 10.0, Color::black()),
                Rect::new(0.0, 0.0, 100.0, 20.0),
                TextAlignment::new(HorizontalAlignment::Right, VerticalAlignment::Top),
            )
            .unwrap();
        assert!(content_of(&mut surface).contains("1 0 0 1 76 10 Tm"));
    }

    #[test]
    fn test_capture_resets_surface() {
        let mut surface = FormXObjectSurface::new();
        surface
            .draw_text("x", &TextStyle::default(), Rect::new(0.0, 0.0, 10.0, 10.0), TextAlignment::default())
            .unwrap();
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let first = surface.capture_as_appearance(bounds).unwrap();
        let second = surface.capture_as_appearance(bounds).unwrap();
        assert!(!first.content().is_empty());
        assert!(second.content().is_empty());
        assert_eq!(second.fonts().count(), 0);
    }
}
