//! Options, properties and reports exchanged with the signing pipeline.

use super::byterange::ByteRangeSpec;
use super::field::SignatureField;
use super::identity::SigningIdentity;
use crate::appearance::{
    build_appearance, AppearanceObject, DrawInstruction, HorizontalAlignment, ShapeKind,
    ShapeStyle, Stroke, TextAlignment, TextStyle, VerticalAlignment,
};
use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::Color;
use crate::writer::StandardFont;
use chrono::{DateTime, Utc};
use der::asn1::ObjectIdentifier;
use serde::Serialize;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::sync::Arc;
use std::time::Duration;

/// Hash applied to the byte ranges and the signed attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DigestAlgorithm {
    /// SHA-256
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
    /// SHA-384
    #[serde(rename = "SHA-384")]
    Sha384,
    /// SHA-512
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl DigestAlgorithm {
    /// NIST hash algorithm identifier (RFC 5754).
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha256 => ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1"),
            DigestAlgorithm::Sha384 => ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2"),
            DigestAlgorithm::Sha512 => ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3"),
        }
    }

    /// Display name, e.g. `SHA-256`.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Digest a single buffer.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        self.digest_chunks(std::iter::once(data))
    }

    /// Digest the concatenation of several buffers without copying them.
    pub fn digest_chunks<'a>(&self, chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
        fn run<'a, D: Digest>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
            let mut hasher = D::new();
            for chunk in chunks {
                hasher.update(chunk);
            }
            hasher.finalize().to_vec()
        }

        match self {
            DigestAlgorithm::Sha256 => run::<Sha256>(chunks),
            DigestAlgorithm::Sha384 => run::<Sha384>(chunks),
            DigestAlgorithm::Sha512 => run::<Sha512>(chunks),
        }
    }
}

/// Value of `/SubFilter`, which selects the container profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SignatureSubFilter {
    /// `adbe.pkcs7.detached`
    #[default]
    #[serde(rename = "adbe.pkcs7.detached")]
    Pkcs7Detached,
    /// `ETSI.CAdES.detached`; adds ESS signing-certificate-v2
    #[serde(rename = "ETSI.CAdES.detached")]
    CadesDetached,
}

impl SignatureSubFilter {
    /// Name as written after `/SubFilter`.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            SignatureSubFilter::Pkcs7Detached => "adbe.pkcs7.detached",
            SignatureSubFilter::CadesDetached => "ETSI.CAdES.detached",
        }
    }

    /// Inverse of [`as_pdf_name`](Self::as_pdf_name).
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "adbe.pkcs7.detached" => Some(SignatureSubFilter::Pkcs7Detached),
            "ETSI.CAdES.detached" => Some(SignatureSubFilter::CadesDetached),
            _ => None,
        }
    }
}

/// Knobs for one signing operation beyond the signer's metadata.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Hash for byte ranges and signed attributes
    pub digest_algorithm: DigestAlgorithm,
    /// Container profile
    pub sub_filter: SignatureSubFilter,
    /// `/ContactInfo`
    pub contact_info: Option<String>,
    /// Minimum container budget in bytes; the computed estimate wins if larger
    pub reserved_size: Option<usize>,
    /// Use `reserved_size` as is, even when it is below the estimate
    pub exact_reservation: bool,
    /// Fixed signing time; the current time is used when unset
    pub signing_time: Option<DateTime<Utc>>,
    /// Upper bound on the signing capability call
    pub signing_timeout: Option<Duration>,
    /// Serialize twice during reservation and fail on any difference
    pub verify_serialization: bool,
}

impl SignOptions {
    /// Select the digest algorithm.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Select the signature format.
    pub fn with_sub_filter(mut self, sub_filter: SignatureSubFilter) -> Self {
        self.sub_filter = sub_filter;
        self
    }

    /// Set contact information.
    pub fn with_contact_info(mut self, contact_info: impl Into<String>) -> Self {
        self.contact_info = Some(contact_info.into());
        self
    }

    /// Request at least `bytes` of container space.
    pub fn with_reserved_size(mut self, bytes: usize) -> Self {
        self.reserved_size = Some(bytes);
        self
    }

    /// Reserve exactly `bytes` of container space.
    pub fn with_exact_reservation(mut self, bytes: usize) -> Self {
        self.reserved_size = Some(bytes);
        self.exact_reservation = true;
        self
    }

    /// Pin the signing time.
    pub fn with_signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.signing_time = Some(time);
        self
    }

    /// Bound the signing capability call.
    pub fn with_signing_timeout(mut self, timeout: Duration) -> Self {
        self.signing_timeout = Some(timeout);
        self
    }

    /// Enable the double-serialization check.
    pub fn with_verify_serialization(mut self, verify: bool) -> Self {
        self.verify_serialization = verify;
        self
    }
}

/// Generated, properties-level signature appearance.
///
/// When set on [`SignatureProperties`], it replaces whatever appearance is
/// attached to the field for that signing operation.
#[derive(Debug, Clone)]
pub struct SignatureAppearance {
    /// "Digitally signed by" line
    pub show_name: bool,
    /// "Date:" line
    pub show_date: bool,
    /// "Reason:" line, when a reason is set
    pub show_reason: bool,
    /// "Location:" line, when a location is set
    pub show_location: bool,
    /// Font of the text block
    pub font: StandardFont,
    /// Font size in points
    pub font_size: f32,
    /// Fill color of the text
    pub text_color: Color,
    /// Background fill
    pub background: Option<Color>,
    /// Border around the widget
    pub border: Option<Stroke>,
}

impl Default for SignatureAppearance {
    fn default() -> Self {
        Self {
            show_name: true,
            show_date: true,
            show_reason: true,
            show_location: true,
            font: StandardFont::Helvetica,
            font_size: 10.0,
            text_color: Color::black(),
            background: None,
            border: Some(Stroke::new(Color::black(), 1.0)),
        }
    }
}

impl SignatureAppearance {
    /// Drawing instructions for a widget of size `bounds`.
    pub fn instructions(
        &self,
        bounds: Rect,
        signer_name: Option<&str>,
        reason: Option<&str>,
        location: Option<&str>,
        signing_time: &DateTime<Utc>,
    ) -> Vec<DrawInstruction> {
        let mut instructions = Vec::new();

        if self.background.is_some() || self.border.is_some() {
            instructions.push(DrawInstruction::shape(
                ShapeKind::Rectangle,
                bounds,
                ShapeStyle {
                    fill: self.background,
                    stroke: self.border,
                },
            ));
        }

        let mut lines = Vec::new();
        if let (true, Some(name)) = (self.show_name, signer_name) {
            lines.push(format!("Digitally signed by {}", name));
        }
        if self.show_date {
            lines.push(format!("Date: {}", signing_time.format("%Y.%m.%d %H:%M:%S UTC")));
        }
        if let (true, Some(reason)) = (self.show_reason, reason) {
            lines.push(format!("Reason: {}", reason));
        }
        if let (true, Some(location)) = (self.show_location, location) {
            lines.push(format!("Location: {}", location));
        }

        let text_bounds = bounds.inflate(-2.0, -2.0);
        if !lines.is_empty() && !text_bounds.is_degenerate() {
            instructions.push(DrawInstruction::text(
                lines.join("\n"),
                TextStyle::new(self.font, self.font_size, self.text_color),
                text_bounds,
                TextAlignment::new(HorizontalAlignment::Left, VerticalAlignment::Middle),
            ));
        }

        instructions
    }

    /// Compose the appearance for `bounds`.
    pub fn render(
        &self,
        bounds: Rect,
        signer_name: Option<&str>,
        reason: Option<&str>,
        location: Option<&str>,
        signing_time: &DateTime<Utc>,
    ) -> Result<Arc<AppearanceObject>> {
        let instructions = self.instructions(bounds, signer_name, reason, location, signing_time);
        build_appearance(bounds, &instructions)
    }
}

/// The signer's declared metadata for one signing operation.
///
/// References exactly one [`SignatureField`] and one [`SigningIdentity`].
/// A field can only be in use by one signing operation at a time; the
/// check happens when the operation starts, not when the properties are
/// built.
#[derive(Debug, Clone)]
pub struct SignatureProperties {
    field: SignatureField,
    identity: SigningIdentity,
    signer_name: Option<String>,
    location: Option<String>,
    reason: Option<String>,
    appearance: Option<SignatureAppearance>,
    options: SignOptions,
}

impl SignatureProperties {
    /// Properties signing `field` with `identity`.
    pub fn new(field: &SignatureField, identity: SigningIdentity) -> Self {
        Self {
            field: field.clone(),
            identity,
            signer_name: None,
            location: None,
            reason: None,
            appearance: None,
            options: SignOptions::default(),
        }
    }

    /// Set the signer name (`/Name`); defaults to the identity's name.
    pub fn with_signer_name(mut self, name: impl Into<String>) -> Self {
        self.signer_name = Some(name.into());
        self
    }

    /// `/Location`
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// `/Reason`
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Generate the widget appearance from these properties.
    pub fn with_appearance(mut self, appearance: SignatureAppearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// Replace the signing options.
    pub fn with_options(mut self, options: SignOptions) -> Self {
        self.options = options;
        self
    }

    /// Field being signed.
    pub fn field(&self) -> &SignatureField {
        &self.field
    }

    /// Identity used to sign.
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Effective signer name.
    pub fn signer_name(&self) -> Option<&str> {
        self.signer_name
            .as_deref()
            .or_else(|| self.identity.signer_name())
    }

    /// Signing location.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Reason for signing.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Properties-level appearance, if any.
    pub fn appearance(&self) -> Option<&SignatureAppearance> {
        self.appearance.as_ref()
    }

    /// Signing options.
    pub fn options(&self) -> &SignOptions {
        &self.options
    }
}

/// Summary of a completed signing operation.
#[derive(Debug, Clone, Serialize)]
pub struct SigningReport {
    /// Pages in the signed document
    pub page_count: usize,
    /// Name of the signed field
    pub field_name: String,
    /// Bytes covered by the digest
    pub byte_range: ByteRangeSpec,
    /// Total length of the signed document
    pub document_len: usize,
    /// Container budget reserved in `/Contents`, in bytes
    pub reserved_size: usize,
    /// DER length of the embedded container
    pub container_size: usize,
    /// Digest algorithm
    pub digest_algorithm: DigestAlgorithm,
    /// Signature format
    pub sub_filter: SignatureSubFilter,
    /// Signing time embedded in `/M` and the CMS signed attributes
    pub signing_time: DateTime<Utc>,
}

impl SigningReport {
    /// Render as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
