//! Form XObject encoding for widget appearances.
//!
//! PDF Spec: ISO 32000-1:2008, Section 12.5.5 (Appearance Streams) and
//! Section 8.10 (Form XObjects).
//!
//! A signature widget's `/AP` dictionary only carries a normal (`/N`)
//! appearance; rollover and down states are not used for signatures.

use crate::appearance::AppearanceObject;
use crate::geometry::Rect;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::writer::StandardFont;

/// Builder for creating PDF appearance streams.
///
/// Appearance streams are Form XObjects that define the visual representation
/// of annotations. This builder generates the content stream bytes and the
/// Form XObject dictionary.
#[derive(Debug, Clone)]
pub struct AppearanceStreamBuilder {
    /// Bounding box for the appearance
    bbox: Rect,
    /// Content stream operations as bytes
    content: Vec<u8>,
    /// Font resources (resource name -> font object)
    fonts: Dictionary,
}

impl AppearanceStreamBuilder {
    /// Create a new, empty appearance stream with the given bounding box.
    pub fn new(bbox: Rect) -> Self {
        Self {
            bbox,
            content: Vec::new(),
            fonts: Dictionary::new(),
        }
    }

    /// Encode a composed appearance.
    ///
    /// `font_ref` resolves each font the appearance uses to the document's
    /// font object.
    pub fn for_appearance(
        appearance: &AppearanceObject,
        font_ref: impl Fn(StandardFont) -> ObjectRef,
    ) -> Self {
        let fonts = appearance
            .fonts()
            .map(|font| (font.resource_name(), Object::Reference(font_ref(font))))
            .collect();
        Self {
            bbox: appearance.bounds(),
            content: appearance.content().to_vec(),
            fonts,
        }
    }

    /// Build the appearance stream as a Form XObject stream object.
    pub fn build(&self) -> Object {
        let mut resources = Dictionary::new();
        if !self.fonts.is_empty() {
            resources.insert("Font".to_string(), Object::Dictionary(self.fonts.clone()));
        }

        let dict: Dictionary = [
            ("Type", Object::name("XObject")),
            ("Subtype", Object::name("Form")),
            ("FormType", Object::Integer(1)),
            ("BBox", Object::rect(self.bbox)),
            ("Resources", Object::Dictionary(resources)),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        Object::Stream {
            dict,
            data: bytes::Bytes::from(self.content.clone()),
        }
    }

    /// Get the bounding box.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }
}
