//! ByteRange reservation and digesting for PDF signatures.
//!
//! PDF digital signatures use a ByteRange array to specify which portions
//! of the document are covered by the signature. The signature itself is
//! stored in a placeholder that is excluded from the signed bytes.
//!
//! ## ByteRange Format
//!
//! The ByteRange is an array of four integers:
//! `[offset1, length1, offset2, length2]`
//!
//! Where:
//! - `offset1` = 0 (start of file)
//! - `length1` = byte offset where the signature value begins
//! - `offset2` = byte offset where the signature value ends
//! - `length2` = remaining bytes to end of file
//!
//! The signature value is a hex-encoded string within `<` and `>` delimiters.
//! The document is serialized exactly once with that placeholder; the
//! ByteRange array itself is reserved at a fixed width and patched in place,
//! so the file length never changes after reservation.

use super::identity::SigningIdentity;
use super::types::{DigestAlgorithm, SignatureSubFilter};
use crate::error::{Error, Result};
use crate::writer::{PdfWriter, PlaceholderLocation, SignatureSlot};
use serde::Serialize;

/// Fixed overhead of the SignedData and SignerInfo structures.
const CONTAINER_OVERHEAD: usize = 256;
/// Signed attributes, algorithm identifiers and outer headers.
const ATTRIBUTE_OVERHEAD: usize = 512;
/// DER tag and length bytes around each certificate.
const CERTIFICATE_FRAMING: usize = 4;

/// One contiguous run of signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteSpan {
    /// Start offset
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
}

impl ByteSpan {
    /// Create a span.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Offset one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// The byte spans covered by a signature.
///
/// Covers every document byte except the `/Contents` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteRangeSpec {
    spans: Vec<ByteSpan>,
}

impl ByteRangeSpec {
    /// Spans covering `[0, file_len)` minus `hole_len` bytes at `hole_offset`.
    pub fn excluding(file_len: usize, hole_offset: usize, hole_len: usize) -> Result<Self> {
        let hole_end = hole_offset
            .checked_add(hole_len)
            .filter(|end| *end <= file_len)
            .ok_or_else(|| {
                Error::InvalidPdf(format!(
                    "placeholder {}+{} exceeds file size {}",
                    hole_offset, hole_len, file_len
                ))
            })?;
        Ok(Self {
            spans: vec![
                ByteSpan::new(0, hole_offset),
                ByteSpan::new(hole_end, file_len - hole_end),
            ],
        })
    }

    /// Parse a `/ByteRange` array.
    pub fn from_array(byte_range: &[i64; 4]) -> Result<Self> {
        let to_usize = |value: i64| {
            usize::try_from(value)
                .map_err(|_| Error::InvalidPdf(format!("negative ByteRange entry {}", value)))
        };
        Ok(Self {
            spans: vec![
                ByteSpan::new(to_usize(byte_range[0])?, to_usize(byte_range[1])?),
                ByteSpan::new(to_usize(byte_range[2])?, to_usize(byte_range[3])?),
            ],
        })
    }

    /// Covered spans in file order.
    pub fn spans(&self) -> &[ByteSpan] {
        &self.spans
    }

    /// Total number of covered bytes.
    pub fn covered_len(&self) -> usize {
        self.spans.iter().map(|span| span.length).sum()
    }

    /// The `/ByteRange` array values.
    pub fn to_array(&self) -> [i64; 4] {
        let mut array = [0i64; 4];
        for (i, span) in self.spans.iter().take(2).enumerate() {
            array[i * 2] = span.offset as i64;
            array[i * 2 + 1] = span.length as i64;
        }
        array
    }

    /// Format as a PDF array, e.g. `[0 100 200 300]`.
    pub fn to_pdf_array(&self) -> String {
        let array = self.to_array();
        format!("[{} {} {} {}]", array[0], array[1], array[2], array[3])
    }

    /// Check that the spans cover a file of `file_len` bytes with a single
    /// gap.
    ///
    /// A valid ByteRange should:
    /// - Start at offset 0
    /// - End at the file size
    /// - Have no gaps except for the signature placeholder
    pub fn validate(&self, file_len: usize) -> Result<()> {
        let [first, second] = self.spans.as_slice() else {
            return Err(Error::InvalidPdf(format!(
                "ByteRange must have two spans, got {}",
                self.spans.len()
            )));
        };

        if first.offset != 0 {
            return Err(Error::InvalidPdf(format!(
                "ByteRange must start at 0, got {}",
                first.offset
            )));
        }

        if second.end() != file_len {
            return Err(Error::InvalidPdf(format!(
                "ByteRange must end at file size {}, got {}",
                file_len,
                second.end()
            )));
        }

        if first.end() > second.offset {
            return Err(Error::InvalidPdf(format!(
                "ByteRange first range ({}) overlaps with second range start ({})",
                first.end(),
                second.offset
            )));
        }

        Ok(())
    }

    /// Concatenate the covered bytes of `data`.
    pub fn extract(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut signed = Vec::with_capacity(self.covered_len());
        for chunk in self.chunks(data)? {
            signed.extend_from_slice(chunk);
        }
        Ok(signed)
    }

    /// Digest the covered bytes of `data` without copying them.
    pub fn digest(&self, data: &[u8], algorithm: DigestAlgorithm) -> Result<Vec<u8>> {
        Ok(algorithm.digest_chunks(self.chunks(data)?))
    }

    fn chunks<'a>(&self, data: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        self.spans
            .iter()
            .map(|span| {
                data.get(span.offset..span.end()).ok_or_else(|| {
                    Error::InvalidPdf(format!(
                        "ByteRange span {}+{} exceeds file size {}",
                        span.offset,
                        span.length,
                        data.len()
                    ))
                })
            })
            .collect()
    }
}

/// Calculator for PDF signature byte ranges.
#[derive(Debug, Clone, Copy)]
pub struct ByteRangeCalculator {
    /// Size of the placeholder for the signature value (hex digits + 2 for angle brackets)
    placeholder_size: usize,
}

impl ByteRangeCalculator {
    /// Create a calculator for a container budget of `container_len` bytes.
    ///
    /// The placeholder size is `container_len * 2 + 2` because the
    /// container is hex-encoded and enclosed in angle brackets.
    pub fn new(container_len: usize) -> Self {
        Self {
            placeholder_size: container_len * 2 + 2,
        }
    }

    /// Get the placeholder size (for the /Contents value).
    pub fn placeholder_size(&self) -> usize {
        self.placeholder_size
    }

    /// Container bytes that fit in the placeholder.
    pub fn container_capacity(&self) -> usize {
        (self.placeholder_size - 2) / 2
    }

    /// Calculate the ByteRange given the position of the /Contents value.
    ///
    /// `contents_offset` is the offset of the opening `<`.
    pub fn calculate_byte_range(&self, file_size: usize, contents_offset: usize) -> Result<ByteRangeSpec> {
        ByteRangeSpec::excluding(file_size, contents_offset, self.placeholder_size)
    }

    /// Overwrite the reserved `/ByteRange` array with the real values,
    /// padding with spaces so no other byte moves.
    pub fn patch_byte_range(
        bytes: &mut [u8],
        location: &PlaceholderLocation,
        byte_range: &ByteRangeSpec,
    ) -> Result<()> {
        let formatted = byte_range.to_pdf_array();
        if formatted.len() > location.byte_range_width {
            return Err(Error::InvalidPdf(format!(
                "ByteRange {} does not fit in {} reserved bytes",
                formatted, location.byte_range_width
            )));
        }

        let target = bytes
            .get_mut(location.byte_range_offset..location.byte_range_offset + location.byte_range_width)
            .ok_or_else(|| Error::InvalidPdf("ByteRange slot exceeds file bounds".to_string()))?;
        target.fill(b' ');
        target[..formatted.len()].copy_from_slice(formatted.as_bytes());
        Ok(())
    }

    /// Replace the placeholder with the hex-encoded container.
    ///
    /// Shorter containers are zero-padded; DER decoders stop at the end of
    /// the outer structure.
    pub fn insert_container(
        &self,
        bytes: &mut [u8],
        contents_offset: usize,
        container: &[u8],
    ) -> Result<()> {
        if container.len() > self.container_capacity() {
            return Err(Error::PlaceholderOverflow {
                needed: container.len(),
                reserved: self.container_capacity(),
            });
        }

        let target = bytes
            .get_mut(contents_offset..contents_offset + self.placeholder_size)
            .ok_or_else(|| {
                Error::InvalidPdf("Signature insertion would exceed file bounds".to_string())
            })?;
        if target.first() != Some(&b'<') || target.last() != Some(&b'>') {
            return Err(Error::InvalidPdf(
                "/Contents placeholder is not delimited by < and >".to_string(),
            ));
        }

        let hex = bytes_to_hex(container);
        let digits = &mut target[1..self.placeholder_size - 1];
        digits[..hex.len()].copy_from_slice(hex.as_bytes());
        digits[hex.len()..].fill(b'0');
        Ok(())
    }
}

/// Upper bound on the DER size of a container for `identity`.
///
/// Accounts for every certificate in the chain, the signer certificate a
/// second time (its issuer name is repeated in the signer identifier), the
/// largest signature the key can produce and the signed attributes.
pub fn estimate_container_size(
    identity: &SigningIdentity,
    digest: DigestAlgorithm,
    sub_filter: SignatureSubFilter,
) -> usize {
    let chain: usize = identity
        .certificate_chain()
        .iter()
        .map(|cert| cert.len() + CERTIFICATE_FRAMING)
        .sum();
    let signer = identity.signer_certificate().len();
    let signature = identity.key_algorithm().max_signature_len();
    let ess = match sub_filter {
        SignatureSubFilter::Pkcs7Detached => 0,
        SignatureSubFilter::CadesDetached => digest.output_len() + 64,
    };

    chain + signer + signature + CONTAINER_OVERHEAD + 2 * digest.output_len() + ATTRIBUTE_OVERHEAD + ess
}

fn compare_passes(first: &[u8], second: &[u8]) -> Result<()> {
    if first.len() != second.len() {
        return Err(Error::SerializationDrift {
            expected: first.len(),
            actual: second.len(),
        });
    }
    match first.iter().zip(second).position(|(a, b)| a != b) {
        Some(offset) => Err(Error::SerializationMismatch { offset }),
        None => Ok(()),
    }
}

/// A serialized document with its signature placeholder in place.
#[derive(Debug, Clone)]
pub struct ReservedDocument {
    bytes: Vec<u8>,
    page_count: usize,
    location: PlaceholderLocation,
    byte_range: ByteRangeSpec,
    calculator: ByteRangeCalculator,
}

impl ReservedDocument {
    /// Serialize `document` once with a placeholder for `slot`, then patch
    /// the `/ByteRange` array.
    ///
    /// With `verify_serialization`, the document is serialized a second
    /// time; a length change fails with [`Error::SerializationDrift`] and a
    /// content change with [`Error::SerializationMismatch`].
    pub fn reserve(document: &PdfWriter, slot: &SignatureSlot, verify_serialization: bool) -> Result<Self> {
        let serialized = document.serialize(Some(slot))?;
        let location = serialized.placeholder.ok_or_else(|| {
            Error::InvalidPdf("serializer did not emit a signature placeholder".to_string())
        })?;

        if verify_serialization {
            let second = document.serialize(Some(slot))?;
            compare_passes(&serialized.bytes, &second.bytes)?;
        }

        let calculator = ByteRangeCalculator::new(slot.container_len);
        if location.contents_len != calculator.placeholder_size() {
            return Err(Error::SerializationDrift {
                expected: calculator.placeholder_size(),
                actual: location.contents_len,
            });
        }

        let mut bytes = serialized.bytes;
        let byte_range = calculator.calculate_byte_range(bytes.len(), location.contents_offset)?;
        ByteRangeCalculator::patch_byte_range(&mut bytes, &location, &byte_range)?;
        byte_range.validate(bytes.len())?;

        log::debug!(
            "Reserved {} container bytes, ByteRange {}",
            slot.container_len,
            byte_range.to_pdf_array()
        );

        Ok(Self {
            bytes,
            page_count: serialized.page_count,
            location,
            byte_range,
            calculator,
        })
    }

    /// Document bytes with the empty placeholder.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total length; fixed from here on.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a reserved document holds at least the placeholder.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Pages written.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Placeholder offsets.
    pub fn location(&self) -> &PlaceholderLocation {
        &self.location
    }

    /// Signed byte spans.
    pub fn byte_range(&self) -> &ByteRangeSpec {
        &self.byte_range
    }

    /// Container budget in bytes.
    pub fn container_capacity(&self) -> usize {
        self.calculator.container_capacity()
    }

    /// Digest over the signed spans.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Result<Vec<u8>> {
        self.byte_range.digest(&self.bytes, algorithm)
    }

    pub(crate) fn calculator(&self) -> &ByteRangeCalculator {
        &self.calculator
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Uppercase hex encoding.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0F) as usize] as char);
    }
    out
}
