//! PDF Digital Signatures module.
//!
//! This module signs PDF documents according to the PDF specification and
//! PAdES (PDF Advanced Electronic Signatures) baseline rules.
//!
//! ## Pipeline
//!
//! ```text
//! SignatureField + SignatureProperties
//!     ↓ reserve   serialize once with a /Contents placeholder, fix /ByteRange
//!     ↓ digest    hash the bytes outside the placeholder
//!     ↓ sign      build the CMS container through the SigningCapability
//!     ↓ finalize  splice the container, commit to the OutputSink
//! signed PDF bytes
//! ```
//!
//! ## Signature Types Supported
//!
//! - PKCS#7 detached signatures (adbe.pkcs7.detached)
//! - PAdES signatures (ETSI.CAdES.detached)
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ETSI TS 102 778 - PAdES
//! - RFC 5652 - Cryptographic Message Syntax

mod atomic;
mod byterange;
mod cms;
mod field;
mod identity;
mod keystore;
pub mod pipeline;
mod signer;
mod types;

pub use atomic::{AtomicFileSink, AtomicWriter, OutputSink, WriterSink};
pub use byterange::{
    bytes_to_hex, estimate_container_size, ByteRangeCalculator, ByteRangeSpec, ByteSpan,
    ReservedDocument,
};
pub use cms::{ContainerBuilder, SignatureContainer};
pub use field::SignatureField;
pub use identity::{KeyAlgorithm, SigningCapability, SigningIdentity, SoftwareKey};
pub use keystore::KeyStore;
pub use pipeline::{PipelineState, SigningPipeline};
pub use signer::{sign, sign_with_report, PdfSigner};
pub use types::{
    DigestAlgorithm, SignOptions, SignatureAppearance, SignatureProperties, SignatureSubFilter,
    SigningReport,
};
