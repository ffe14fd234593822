//! AcroForm dictionary for documents carrying signature fields.
//!
//! Implements the document-level AcroForm dictionary per ISO 32000-1:2008
//! Section 12.7.2. Signature widgets always ship their own appearance
//! streams, so `/NeedAppearances` is never requested from the viewer.

use crate::object::{Dictionary, Object, ObjectRef};

/// `/SigFlags` bit 1: the document contains at least one signature.
pub const SIG_FLAG_SIGNATURES_EXIST: u32 = 1;
/// `/SigFlags` bit 2: the document shall only be saved incrementally.
pub const SIG_FLAG_APPEND_ONLY: u32 = 2;

/// Collects widget references and signature flags for `/AcroForm`.
#[derive(Debug, Clone, Default)]
pub struct AcroFormBuilder {
    fields: Vec<ObjectRef>,
    sig_flags: Option<u32>,
}

impl AcroFormBuilder {
    /// Form with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a terminal field.
    pub fn add_field(&mut self, field_ref: ObjectRef) {
        self.fields.push(field_ref);
    }

    /// Replace `/SigFlags` (ISO 32000-1 Table 219).
    pub fn with_sig_flags(mut self, flags: u32) -> Self {
        self.sig_flags = Some(flags);
        self
    }

    /// Mark the document as signed and append-only.
    pub fn signed(self) -> Self {
        let flags = self.sig_flags.unwrap_or(0);
        self.with_sig_flags(flags | SIG_FLAG_SIGNATURES_EXIST | SIG_FLAG_APPEND_ONLY)
    }

    /// True once a field is registered.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Number of registered fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// `/Fields`, plus `/SigFlags` when set.
    pub fn build(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert(
            "Fields".to_string(),
            Object::Array(self.fields.iter().copied().map(Object::Reference).collect()),
        );
        if let Some(flags) = self.sig_flags {
            dict.insert("SigFlags".to_string(), Object::Integer(i64::from(flags)));
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acroform_add_fields() {
        let mut builder = AcroFormBuilder::new();
        assert!(!builder.has_fields());

        builder.add_field(ObjectRef::new(10, 0));
        builder.add_field(ObjectRef::new(11, 0));
        assert_eq!(builder.field_count(), 2);

        let dict = builder.build();
        let fields = dict.get("Fields").and_then(Object::as_array).unwrap();
        assert_eq!(fields[1].as_reference(), Some(ObjectRef::new(11, 0)));
    }

    #[test]
    fn test_unsigned_form_has_no_sig_flags() {
        let dict = AcroFormBuilder::new().build();
        assert!(!dict.contains_key("SigFlags"));
    }

    #[test]
    fn test_signed_sets_both_flags() {
        let dict = AcroFormBuilder::new().signed().build();
        assert_eq!(dict.get("SigFlags").and_then(Object::as_integer), Some(3));
    }
}
