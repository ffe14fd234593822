//! Error types for the signing library.
//!
//! Every failure aborts the signing operation that raised it and is handed
//! back to the caller unchanged. Nothing in this crate retries or falls back.

use std::time::Duration;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by a [`SigningCapability`](crate::signatures::SigningCapability).
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// Error types that can occur while composing or signing a document.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Appearance bounds with zero, negative or non-finite geometry
    #[error("Invalid appearance bounds: {width}x{height} at ({x}, {y}) (coordinates must be finite, width and height positive)")]
    InvalidBounds {
        /// Requested lower-left x
        x: f32,
        /// Requested lower-left y
        y: f32,
        /// Requested width
        width: f32,
        /// Requested height
        height: f32,
    },

    /// The field is held by a signing operation that has not finished
    #[error("Signature field '{0}' is already bound to an in-progress signing operation")]
    FieldAlreadyBound(String),

    /// Serialized length changed between reservation and finalization.
    ///
    /// The emitted signature would not verify; this is never recoverable.
    #[error("Serialization drift: reserved {expected} bytes, got {actual} bytes")]
    SerializationDrift {
        /// Length fixed at reservation time
        expected: usize,
        /// Length observed afterwards
        actual: usize,
    },

    /// Two serialization passes had the same length but different bytes.
    #[error("Serialization drift: passes differ at byte {offset}")]
    SerializationMismatch {
        /// Offset of the first differing byte
        offset: usize,
    },

    /// The delegated signing primitive failed
    #[error("Signing capability failed: {0}")]
    SigningCapability(#[source] CapabilityError),

    /// Key material could not be loaded
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// The signing primitive did not answer in time
    #[error("Signing operation timed out after {0:?}")]
    Timeout(Duration),

    /// The signature container does not fit the reserved placeholder
    #[error("Signature container needs {needed} bytes but only {reserved} were reserved")]
    PlaceholderOverflow {
        /// Bytes the container actually needs
        needed: usize,
        /// Bytes reserved in the document
        reserved: usize,
    },

    /// Digest length does not match the digest algorithm
    #[error("Invalid digest: expected {expected} bytes, got {actual}")]
    InvalidDigest {
        /// Output length of the algorithm
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Certificate that is not usable for signing
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Invalid document structure
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ASN.1 DER encoding or decoding error
    #[error("DER error: {0}")]
    Der(#[from] der::Error),
}
