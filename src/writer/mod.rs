//! PDF writing module for generating PDF files.
//!
//! ## Architecture
//!
//! ```text
//! [PageBuilder] / [SignatureField]
//!     ↓
//! [ContentStreamBuilder] (drawing operations → content stream bytes)
//!     ↓
//! [PdfWriter] (assembles complete PDF structure, reserves signature slot)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```
//! use pdf_seal::writer::{PdfWriter, StandardFont};
//!
//! let mut writer = PdfWriter::new();
//! let mut page = writer.add_letter_page();
//! page.add_text("Hello, World!", 72.0, 720.0, StandardFont::Helvetica, 12.0);
//! page.finish();
//! let bytes = writer.finish().unwrap();
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! ```

mod acroform;
mod appearance_stream;
pub mod content_stream;
mod font_manager;
mod object_serializer;
mod pdf_writer;

pub use acroform::{AcroFormBuilder, SIG_FLAG_APPEND_ONLY, SIG_FLAG_SIGNATURES_EXIST};
pub use appearance_stream::AppearanceStreamBuilder;
pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use font_manager::StandardFont;
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{
    pdf_date, PageBuilder, PdfWriter, PdfWriterConfig, PlaceholderLocation, SerializedDocument,
    SignatureSlot, BYTE_RANGE_WIDTH,
};
