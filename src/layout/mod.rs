//! Colors used by the drawing primitives.

/// RGB color representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel (0.0 - 1.0)
    pub r: f32,
    /// Green channel (0.0 - 1.0)
    pub g: f32,
    /// Blue channel (0.0 - 1.0)
    pub b: f32,
}

impl Color {
    /// Create a new color.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_seal::layout::Color;
    ///
    /// let red = Color::new(1.0, 0.0, 0.0);
    /// assert_eq!(red.g, 0.0);
    /// ```
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from 8-bit channels.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_seal::layout::Color;
    ///
    /// let white = Color::from_rgb8(255, 255, 255);
    /// assert_eq!(white, Color::white());
    /// ```
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Create a black color.
    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Create a white color.
    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// CSS `navy`.
    pub fn navy() -> Self {
        Self::from_rgb8(0, 0, 128)
    }

    /// CSS `cornflowerblue`.
    pub fn cornflower_blue() -> Self {
        Self::from_rgb8(100, 149, 237)
    }

    /// CSS `royalblue`.
    pub fn royal_blue() -> Self {
        Self::from_rgb8(65, 105, 225)
    }

    /// CSS `lightsteelblue`.
    pub fn light_steel_blue() -> Self {
        Self::from_rgb8(176, 196, 222)
    }

    /// CSS `peachpuff`.
    pub fn peach_puff() -> Self {
        Self::from_rgb8(255, 218, 185)
    }

    /// CSS `saddlebrown`.
    pub fn saddle_brown() -> Self {
        Self::from_rgb8(139, 69, 19)
    }
}
