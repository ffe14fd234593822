//! Standard (Base-14) text fonts available to page and appearance content.
//!
//! Every document the writer produces declares the same fixed set of Type1
//! fonts, in the same order, so object numbering never depends on which
//! fonts a page happens to use.

/// One of the twelve Base-14 text fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StandardFont {
    /// Helvetica
    #[default]
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-Oblique
    HelveticaOblique,
    /// Helvetica-BoldOblique
    HelveticaBoldOblique,
    /// Times-Roman
    TimesRoman,
    /// Times-Bold
    TimesBold,
    /// Times-Italic
    TimesItalic,
    /// Times-BoldItalic
    TimesBoldItalic,
    /// Courier
    Courier,
    /// Courier-Bold
    CourierBold,
    /// Courier-Oblique
    CourierOblique,
    /// Courier-BoldOblique
    CourierBoldOblique,
}

impl StandardFont {
    /// All fonts in declaration order.
    pub const ALL: [StandardFont; 12] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
        StandardFont::HelveticaBoldOblique,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::TimesItalic,
        StandardFont::TimesBoldItalic,
        StandardFont::Courier,
        StandardFont::CourierBold,
        StandardFont::CourierOblique,
        StandardFont::CourierBoldOblique,
    ];

    /// PostScript name used as `/BaseFont`.
    pub fn base_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Key under `/Resources /Font` (the base name without hyphens).
    pub fn resource_name(&self) -> String {
        self.base_name().replace('-', "")
    }

    /// Look a font up by its PostScript name.
    pub fn from_base_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.base_name() == name)
    }

    /// Estimated advance width of `text` at `font_size`.
    ///
    /// Uses the flat 0.6 em average glyph width; exact for Courier and a
    /// slight overestimate for the proportional families.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 3.0 / 5.0
    }

    /// Baseline-to-baseline distance for `font_size`.
    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * 6.0 / 5.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_are_unique() {
        let mut names: Vec<String> = StandardFont::ALL.iter().map(|f| f.resource_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
        assert_eq!(StandardFont::TimesBoldItalic.resource_name(), "TimesBoldItalic");
    }

    #[test]
    fn test_from_base_name() {
        assert_eq!(StandardFont::from_base_name("Courier-Bold"), Some(StandardFont::CourierBold));
        assert_eq!(StandardFont::from_base_name("Symbol"), None);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(StandardFont::Courier.text_width("abcd", 10.0), 24.0);
        assert_eq!(StandardFont::Helvetica.text_width("", 10.0), 0.0);
    }
}
