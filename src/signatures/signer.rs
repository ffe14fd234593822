//! PDF signing entry points.

use super::atomic::{AtomicFileSink, OutputSink};
use super::field::SignatureField;
use super::identity::SigningIdentity;
use super::pipeline::SigningPipeline;
use super::types::{SignOptions, SignatureAppearance, SignatureProperties, SigningReport};
use crate::error::Result;
use crate::writer::PdfWriter;
use std::path::Path;

/// Sign `document` as described by `properties` and commit it to `sink`.
///
/// Returns the page count of the signed document. The sink receives the
/// complete signed document or nothing.
///
/// # Example
///
/// ```no_run
/// use pdf_seal::geometry::Rect;
/// use pdf_seal::signatures::{sign, KeyStore, SignatureField, SignatureProperties};
/// use pdf_seal::writer::PdfWriter;
///
/// # fn main() -> pdf_seal::Result<()> {
/// let identity = KeyStore::from_pem_files("chain.pem", "key.pem", Some("qq"))?;
///
/// let mut document = PdfWriter::new();
/// document.add_letter_page().finish();
/// let field = SignatureField::new(Rect::new(324.0, 144.0, 216.0, 72.0), 0)?;
/// document.add_signature_field(&field)?;
///
/// let properties = SignatureProperties::new(&field, identity)
///     .with_location("Los Angeles, CA")
///     .with_reason("Approval");
/// let mut output = Vec::new();
/// let pages = sign(&document, &properties, &mut output)?;
/// assert_eq!(pages, 1);
/// # Ok(())
/// # }
/// ```
pub fn sign<S: OutputSink + ?Sized>(
    document: &PdfWriter,
    properties: &SignatureProperties,
    sink: &mut S,
) -> Result<usize> {
    Ok(sign_with_report(document, properties, sink)?.page_count)
}

/// Like [`sign`], returning the full [`SigningReport`].
pub fn sign_with_report<S: OutputSink + ?Sized>(
    document: &PdfWriter,
    properties: &SignatureProperties,
    sink: &mut S,
) -> Result<SigningReport> {
    let finalized = SigningPipeline::new(document, properties)?
        .reserve()?
        .digest()?
        .sign()?
        .finalize(sink)?;
    Ok(finalized.into_report())
}

/// Signs documents with one identity and a fixed set of options.
#[derive(Debug, Clone)]
pub struct PdfSigner {
    identity: SigningIdentity,
    options: SignOptions,
    appearance: Option<SignatureAppearance>,
    reason: Option<String>,
    location: Option<String>,
}

impl PdfSigner {
    /// Create a signer with default options.
    pub fn new(identity: SigningIdentity) -> Self {
        Self {
            identity,
            options: SignOptions::default(),
            appearance: None,
            reason: None,
            location: None,
        }
    }

    /// Replace the signing options.
    pub fn with_options(mut self, options: SignOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate widget appearances for every signature.
    pub fn with_appearance(mut self, appearance: SignatureAppearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// Reason recorded in every signature.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Location recorded in every signature.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Identity used to sign.
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Signing options.
    pub fn options(&self) -> &SignOptions {
        &self.options
    }

    /// Properties for signing `field` with this signer's settings.
    pub fn properties(&self, field: &SignatureField) -> SignatureProperties {
        let mut properties =
            SignatureProperties::new(field, self.identity.clone()).with_options(self.options.clone());
        if let Some(appearance) = &self.appearance {
            properties = properties.with_appearance(appearance.clone());
        }
        if let Some(reason) = &self.reason {
            properties = properties.with_reason(reason.clone());
        }
        if let Some(location) = &self.location {
            properties = properties.with_location(location.clone());
        }
        properties
    }

    /// Sign `field` of `document` into `sink`.
    pub fn sign<S: OutputSink + ?Sized>(
        &self,
        document: &PdfWriter,
        field: &SignatureField,
        sink: &mut S,
    ) -> Result<SigningReport> {
        sign_with_report(document, &self.properties(field), sink)
    }

    /// Sign into a new buffer.
    pub fn sign_to_vec(&self, document: &PdfWriter, field: &SignatureField) -> Result<(Vec<u8>, SigningReport)> {
        let mut output = Vec::new();
        let report = self.sign(document, field, &mut output)?;
        Ok((output, report))
    }

    /// Sign and atomically replace the file at `path`.
    pub fn sign_to_file(
        &self,
        document: &PdfWriter,
        field: &SignatureField,
        path: impl AsRef<Path>,
    ) -> Result<SigningReport> {
        let mut sink = AtomicFileSink::new(path);
        self.sign(document, field, &mut sink)
    }
}
