// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::new_without_default)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Seal
//!
//! Visible digital signatures for PDF documents.
//!
//! ## Core Features
//!
//! - **Appearance composition**: shapes and multi-line text captured as a
//!   reusable Form XObject ([`appearance`])
//! - **Signature fields**: widget annotations with a shared, replaceable
//!   appearance that is frozen while a signature is in progress
//! - **Byte-range reservation**: single-pass serialization with an exact,
//!   pessimistically sized `/Contents` placeholder
//! - **CMS containers**: detached `adbe.pkcs7.detached` and
//!   `ETSI.CAdES.detached` signatures over RSA (2048-4096) and ECDSA
//!   (P-256, P-384) keys
//! - **Atomic output**: the sink receives the complete signed document or
//!   nothing
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_seal::appearance::{build_appearance, DrawInstruction, ShapeKind, ShapeStyle, TextAlignment, TextStyle};
//! use pdf_seal::geometry::Rect;
//! use pdf_seal::layout::Color;
//! use pdf_seal::signatures::{sign, AtomicFileSink, KeyStore, SignatureField, SignatureProperties};
//! use pdf_seal::writer::{PdfWriter, StandardFont};
//!
//! # fn main() -> pdf_seal::Result<()> {
//! let identity = KeyStore::from_pem_files("signer-chain.pem", "signer-key.pem", Some("qq"))?;
//!
//! let mut document = PdfWriter::new();
//! let mut page = document.add_letter_page();
//! page.add_text("Please sign below.", 72.0, 720.0, StandardFont::Helvetica, 12.0);
//! page.finish();
//!
//! let rect = Rect::new(324.0, 144.0, 216.0, 72.0);
//! let bounds = rect.at_origin();
//! let appearance = build_appearance(
//!     bounds,
//!     &[
//!         DrawInstruction::shape(
//!             ShapeKind::Ellipse,
//!             bounds.inflate(-4.0, -5.0),
//!             ShapeStyle::filled(Color::cornflower_blue()).with_stroke(Color::navy(), 1.0),
//!         ),
//!         DrawInstruction::text("Signed", TextStyle::default(), bounds, TextAlignment::centered()),
//!     ],
//! )?;
//!
//! let field = SignatureField::new(rect, 0)?;
//! field.attach_appearance(appearance)?;
//! document.add_signature_field(&field)?;
//!
//! let properties = SignatureProperties::new(&field, identity)
//!     .with_location("Los Angeles, CA")
//!     .with_reason("Approval");
//! let pages = sign(&document, &properties, &mut AtomicFileSink::new("signed.pdf"))?;
//! assert_eq!(pages, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Object model
pub mod object;

// Geometry and color
pub mod geometry;
pub mod layout;

// PDF writing
pub mod writer;

// Signature appearances
pub mod appearance;

// Digital signatures
pub mod signatures;

// Re-exports
pub use error::{Error, Result};
pub use signatures::{sign, SignatureField, SignatureProperties, SigningIdentity};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
