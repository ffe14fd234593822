//! Whole-document serialization.
//!
//! A [`PdfWriter`] holds pages and signature fields and turns them into a
//! complete classic-xref PDF file. Serialization is a pure function of the
//! writer: two passes over the same writer yield identical bytes. When a
//! [`SignatureSlot`] is supplied the signature dictionary carries a
//! fixed-width `/ByteRange` and a zero-filled `/Contents` hex string whose
//! offsets come back in [`PlaceholderLocation`].

use super::acroform::AcroFormBuilder;
use super::appearance_stream::AppearanceStreamBuilder;
use super::content_stream::ContentStreamBuilder;
use super::font_manager::StandardFont;
use super::object_serializer::ObjectSerializer;
use crate::appearance::AppearanceObject;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::Color;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::signatures::SignatureField;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;

/// Width of the `/ByteRange` array as reserved in the signature dictionary.
///
/// Four integers of up to ten digits each plus separators and brackets.
pub const BYTE_RANGE_WIDTH: usize = 36;

/// `/F` annotation flag: print.
const ANNOT_FLAG_PRINT: i64 = 4;

/// Document-level settings.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// Header version, e.g. "1.7"
    pub version: String,
    /// `/Title` in the info dictionary
    pub title: Option<String>,
    /// `/Author` in the info dictionary
    pub author: Option<String>,
    /// `/Subject` in the info dictionary
    pub subject: Option<String>,
    /// `/Creator` in the info dictionary
    pub creator: Option<String>,
    /// FlateDecode page content streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            subject: None,
            creator: Some(concat!("pdf_seal ", env!("CARGO_PKG_VERSION")).to_string()),
            compress: false,
        }
    }
}

impl PdfWriterConfig {
    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Compress page content streams.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn info(&self) -> Object {
        let entries = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Creator", &self.creator),
        ];
        Object::dict(
            entries
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| (key, Object::string(v)))),
        )
    }
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Format a timestamp as a PDF date string (ISO 32000-1 Section 7.9.4).
pub fn pdf_date(time: &DateTime<Utc>) -> String {
    format!("D:{}+00'00'", time.format("%Y%m%d%H%M%S"))
}

/// Signature dictionary to embed for one field.
#[derive(Debug, Clone)]
pub struct SignatureSlot {
    /// Field the signature value is attached to
    pub field: SignatureField,
    /// `/SubFilter` name
    pub sub_filter: String,
    /// Container budget in bytes; `/Contents` holds twice as many hex digits
    pub container_len: usize,
    /// `/Name`
    pub signer_name: Option<String>,
    /// `/Location`
    pub location: Option<String>,
    /// `/Reason`
    pub reason: Option<String>,
    /// `/ContactInfo`
    pub contact_info: Option<String>,
    /// `/M`
    pub signing_time: DateTime<Utc>,
    /// Appearance that overrides the field's own
    pub appearance: Option<Arc<AppearanceObject>>,
}

/// Where the signature placeholder landed in a serialized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderLocation {
    /// Offset of the `[` opening the `/ByteRange` array
    pub byte_range_offset: usize,
    /// Reserved width of the `/ByteRange` array
    pub byte_range_width: usize,
    /// Offset of the `<` opening the `/Contents` hex string
    pub contents_offset: usize,
    /// Length of the hex string including both delimiters
    pub contents_len: usize,
}

/// Output of one serialization pass.
#[derive(Debug, Clone)]
pub struct SerializedDocument {
    /// Complete file bytes
    pub bytes: Vec<u8>,
    /// Number of pages written
    pub page_count: usize,
    /// Placeholder offsets when a signature slot was requested
    pub placeholder: Option<PlaceholderLocation>,
}

/// Drawing handle for one page, returned by [`PdfWriter::add_page`].
pub struct PageBuilder<'a> {
    writer: &'a mut PdfWriter,
    page_index: usize,
}

impl<'a> PageBuilder<'a> {
    fn content(&mut self) -> &mut ContentStreamBuilder {
        &mut self.writer.pages[self.page_index].content
    }

    /// Zero-based index of this page.
    pub fn index(&self) -> usize {
        self.page_index
    }

    /// Show `text` with its baseline starting at (`x`, `y`).
    pub fn add_text(&mut self, text: &str, x: f32, y: f32, font: StandardFont, font_size: f32) -> &mut Self {
        self.content()
            .begin_text()
            .set_font(&font.resource_name(), font_size)
            .text(text, x, y);
        self
    }

    /// Fill color for subsequent text and shapes.
    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.content().fill_color(color);
        self
    }

    /// Stroke color for subsequent outlines.
    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.content().end_text().stroke_color(color);
        self
    }

    /// Line width for subsequent outlines.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.content().end_text().set_line_width(width);
        self
    }

    /// Outline a rectangle.
    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.content().end_text().rect(x, y, width, height).stroke();
        self
    }

    /// Fill a rectangle with the current fill color.
    pub fn fill_rect(&mut self, rect: Rect) -> &mut Self {
        self.content()
            .end_text()
            .rect(rect.x, rect.y, rect.width, rect.height)
            .fill();
        self
    }

    /// Outline the ellipse inscribed in `rect`.
    pub fn draw_ellipse(&mut self, rect: Rect) -> &mut Self {
        self.content().end_text().ellipse(rect).stroke();
        self
    }

    /// Close any open text object and hand the writer back.
    pub fn finish(self) -> &'a mut PdfWriter {
        self.writer.pages[self.page_index].content.end_text();
        self.writer
    }
}

#[derive(Debug)]
struct Page {
    media_box: Rect,
    content: ContentStreamBuilder,
}

/// Object numbers for one serialization pass.
///
/// Numbering depends only on page count, field count and whether a
/// signature is reserved, so repeated passes agree.
struct ObjectNumbers {
    catalog: u32,
    pages: u32,
    fonts: Vec<(StandardFont, u32)>,
    /// (page, content stream)
    page_objects: Vec<(u32, u32)>,
    /// (widget, normal appearance)
    field_objects: Vec<(u32, u32)>,
    signature: Option<u32>,
    info: u32,
    size: u32,
}

impl ObjectNumbers {
    fn assign(page_count: usize, field_count: usize, signed: bool) -> Self {
        let mut counter = 1u32..;
        let mut next = move || counter.next().unwrap_or(u32::MAX);

        let catalog = next();
        let pages = next();
        let fonts = StandardFont::ALL.iter().map(|font| (*font, next())).collect();
        let page_objects = (0..page_count).map(|_| (next(), next())).collect();
        let field_objects = (0..field_count).map(|_| (next(), next())).collect();
        let signature = if signed { Some(next()) } else { None };
        let info = next();
        let size = next();

        Self {
            catalog,
            pages,
            fonts,
            page_objects,
            field_objects,
            signature,
            info,
            size,
        }
    }

    fn font(&self, font: StandardFont) -> ObjectRef {
        let id = self
            .fonts
            .iter()
            .find_map(|(f, id)| (*f == font).then_some(*id))
            .unwrap_or(self.fonts[0].1);
        ObjectRef::new(id, 0)
    }

    fn font_resources(&self) -> Dictionary {
        self.fonts
            .iter()
            .map(|(font, id)| (font.resource_name(), Object::reference(*id)))
            .collect()
    }
}

/// Output buffer that remembers where each indirect object starts.
struct Emitter {
    out: Vec<u8>,
    offsets: Vec<(u32, usize)>,
    serializer: ObjectSerializer,
}

impl Emitter {
    fn new(version: &str) -> Result<Self> {
        let mut out = Vec::new();
        writeln!(out, "%PDF-{}", version)?;
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Ok(Self {
            out,
            offsets: Vec::new(),
            serializer: ObjectSerializer::new(),
        })
    }

    fn mark(&mut self, id: u32) {
        self.offsets.push((id, self.out.len()));
    }

    fn object(&mut self, id: u32, obj: &Object) -> Result<()> {
        self.mark(id);
        self.serializer.write_indirect(&mut self.out, id, 0, obj)?;
        Ok(())
    }

    /// Cross-reference table and trailer; consumes the emitter.
    fn finish(mut self, size: u32, root: u32, info: u32) -> Result<Vec<u8>> {
        let xref_start = self.out.len();
        self.offsets.sort_unstable_by_key(|(id, _)| *id);

        writeln!(self.out, "xref\n0 {}", size)?;
        writeln!(self.out, "0000000000 65535 f ")?;
        for (_, offset) in &self.offsets {
            writeln!(self.out, "{:010} 00000 n ", offset)?;
        }

        let trailer = Object::dict([
            ("Size", Object::Integer(i64::from(size))),
            ("Root", Object::reference(root)),
            ("Info", Object::reference(info)),
        ]);
        writeln!(self.out, "trailer")?;
        self.serializer.write_object(&mut self.out, &trailer)?;
        write!(self.out, "\nstartxref\n{}\n%%EOF", xref_start)?;
        Ok(self.out)
    }
}

/// Builds a complete PDF document with pages, fonts, content and
/// signature fields.
#[derive(Debug)]
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<Page>,
    fields: Vec<SignatureField>,
}

impl PdfWriter {
    /// Create a writer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a writer with `config`.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Append a page of `width` x `height` points.
    pub fn add_page(&mut self, width: f32, height: f32) -> PageBuilder<'_> {
        self.pages.push(Page {
            media_box: Rect::new(0.0, 0.0, width, height),
            content: ContentStreamBuilder::new(),
        });
        let page_index = self.pages.len() - 1;
        PageBuilder {
            writer: self,
            page_index,
        }
    }

    /// Append a US Letter page.
    pub fn add_letter_page(&mut self) -> PageBuilder<'_> {
        self.add_page(612.0, 792.0)
    }

    /// Append an A4 page.
    pub fn add_a4_page(&mut self) -> PageBuilder<'_> {
        self.add_page(595.0, 842.0)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Register a signature field.
    ///
    /// The field's page must already exist and its name must be unique.
    pub fn add_signature_field(&mut self, field: &SignatureField) -> Result<()> {
        if field.page() >= self.pages.len() {
            return Err(Error::InvalidPdf(format!(
                "signature field '{}' is on page {} but the document has {} page(s)",
                field.name(),
                field.page() + 1,
                self.pages.len()
            )));
        }
        if self.fields.iter().any(|f| f.name() == field.name()) {
            return Err(Error::InvalidPdf(format!("duplicate signature field name '{}'", field.name())));
        }
        self.fields.push(field.clone());
        Ok(())
    }

    /// Registered signature fields.
    pub fn signature_fields(&self) -> &[SignatureField] {
        &self.fields
    }

    /// True if `field` is registered with this document.
    pub fn contains_field(&self, field: &SignatureField) -> bool {
        self.fields.iter().any(|f| f.same_field(field))
    }

    /// Serialize without a signature.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.serialize(None)?.bytes)
    }

    /// Serialize without a signature and write the result to `path`.
    pub fn save(self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the document, optionally reserving a signature placeholder.
    pub fn serialize(&self, slot: Option<&SignatureSlot>) -> Result<SerializedDocument> {
        let signed_index = slot
            .map(|slot| {
                self.fields
                    .iter()
                    .position(|f| f.same_field(&slot.field))
                    .ok_or_else(|| {
                        Error::InvalidPdf(format!(
                            "signature field '{}' is not part of the document",
                            slot.field.name()
                        ))
                    })
            })
            .transpose()?;

        let ids = ObjectNumbers::assign(self.pages.len(), self.fields.len(), slot.is_some());
        let mut emitter = Emitter::new(&self.config.version)?;

        emitter.object(ids.catalog, &self.catalog(&ids, slot.is_some()))?;
        emitter.object(
            ids.pages,
            &Object::dict([
                ("Type", Object::name("Pages")),
                (
                    "Kids",
                    Object::Array(ids.page_objects.iter().map(|(page, _)| Object::reference(*page)).collect()),
                ),
                ("Count", Object::Integer(self.pages.len() as i64)),
            ]),
        )?;

        for (font, id) in &ids.fonts {
            emitter.object(
                *id,
                &Object::dict([
                    ("Type", Object::name("Font")),
                    ("Subtype", Object::name("Type1")),
                    ("BaseFont", Object::name(font.base_name())),
                    ("Encoding", Object::name("WinAnsiEncoding")),
                ]),
            )?;
        }

        let font_resources = ids.font_resources();
        for (index, (page, (page_id, content_id))) in self.pages.iter().zip(&ids.page_objects).enumerate() {
            let mut entries = vec![
                ("Type", Object::name("Page")),
                ("Parent", Object::reference(ids.pages)),
                ("MediaBox", Object::rect(page.media_box)),
                ("Contents", Object::reference(*content_id)),
                (
                    "Resources",
                    Object::dict([("Font", Object::Dictionary(font_resources.clone()))]),
                ),
            ];
            let annots: Vec<Object> = self
                .fields
                .iter()
                .zip(&ids.field_objects)
                .filter(|(field, _)| field.page() == index)
                .map(|(_, (widget, _))| Object::reference(*widget))
                .collect();
            if !annots.is_empty() {
                entries.push(("Annots", Object::Array(annots)));
            }
            emitter.object(*page_id, &Object::dict(entries))?;
            emitter.object(*content_id, &self.content_stream(page)?)?;
        }

        for (index, (field, (widget_id, ap_id))) in self.fields.iter().zip(&ids.field_objects).enumerate() {
            let active_slot = slot.filter(|_| signed_index == Some(index));
            let mut widget = vec![
                ("Type", Object::name("Annot")),
                ("Subtype", Object::name("Widget")),
                ("FT", Object::name("Sig")),
                ("T", Object::string(field.name())),
                ("Rect", Object::rect(field.rect())),
                ("F", Object::Integer(ANNOT_FLAG_PRINT)),
                ("P", Object::reference(ids.page_objects[field.page()].0)),
                ("AP", Object::dict([("N", Object::reference(*ap_id))])),
            ];
            if let (Some(_), Some(sig_id)) = (active_slot, ids.signature) {
                widget.push(("V", Object::reference(sig_id)));
            }
            emitter.object(*widget_id, &Object::dict(widget))?;

            // Slot appearance, then the field's own, then a blank form.
            let appearance = active_slot
                .and_then(|s| s.appearance.clone())
                .or_else(|| field.appearance());
            let stream = match appearance {
                Some(appearance) => AppearanceStreamBuilder::for_appearance(&appearance, |font| ids.font(font)),
                None => AppearanceStreamBuilder::new(field.rect().at_origin()),
            };
            emitter.object(*ap_id, &stream.build())?;
        }

        let placeholder = match (slot, ids.signature) {
            (Some(slot), Some(sig_id)) => {
                emitter.mark(sig_id);
                Some(write_signature_dictionary(&mut emitter.out, &emitter.serializer, sig_id, slot)?)
            },
            _ => None,
        };

        emitter.object(ids.info, &self.config.info())?;
        let bytes = emitter.finish(ids.size, ids.catalog, ids.info)?;

        Ok(SerializedDocument {
            bytes,
            page_count: self.pages.len(),
            placeholder,
        })
    }

    fn catalog(&self, ids: &ObjectNumbers, signed: bool) -> Object {
        let mut entries = vec![("Type", Object::name("Catalog")), ("Pages", Object::reference(ids.pages))];
        if !self.fields.is_empty() {
            let mut acroform = AcroFormBuilder::new();
            for (widget, _) in &ids.field_objects {
                acroform.add_field(ObjectRef::new(*widget, 0));
            }
            if signed {
                acroform = acroform.signed();
            }
            entries.push(("AcroForm", Object::Dictionary(acroform.build())));
        }
        Object::dict(entries)
    }

    fn content_stream(&self, page: &Page) -> Result<Object> {
        let raw = page.content.build()?;
        let mut dict = Dictionary::new();
        let data = if self.config.compress {
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            deflate(&raw)?
        } else {
            raw
        };
        Ok(Object::Stream {
            dict,
            data: bytes::Bytes::from(data),
        })
    }
}

/// Write the signature dictionary with its keys in a fixed order,
/// recording where `/ByteRange` and `/Contents` start.
fn write_signature_dictionary(
    output: &mut Vec<u8>,
    serializer: &ObjectSerializer,
    id: u32,
    slot: &SignatureSlot,
) -> Result<PlaceholderLocation> {
    writeln!(output, "{} 0 obj", id)?;
    write!(output, "<</Type /Sig/Filter /Adobe.PPKLite/SubFilter ")?;
    serializer.write_object(output, &Object::name(&slot.sub_filter))?;

    write!(output, "/ByteRange ")?;
    let byte_range_offset = output.len();
    write!(output, "[0 {:010} {:010} {:010}]", 0, 0, 0)?;
    debug_assert_eq!(output.len() - byte_range_offset, BYTE_RANGE_WIDTH);

    write!(output, "/Contents ")?;
    let contents_offset = output.len();
    output.push(b'<');
    output.resize(output.len() + slot.container_len * 2, b'0');
    output.push(b'>');
    let contents_len = output.len() - contents_offset;

    let optional = [
        ("Name", &slot.signer_name),
        ("Location", &slot.location),
        ("Reason", &slot.reason),
        ("ContactInfo", &slot.contact_info),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            write!(output, "/{} ", key)?;
            serializer.write_object(output, &Object::string(value))?;
        }
    }
    write!(output, "/M ")?;
    serializer.write_object(output, &Object::string(&pdf_date(&slot.signing_time)))?;
    write!(output, ">>\nendobj\n")?;

    Ok(PlaceholderLocation {
        byte_range_offset,
        byte_range_width: BYTE_RANGE_WIDTH,
        contents_offset,
        contents_len,
    })
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot_for(field: &SignatureField) -> SignatureSlot {
        SignatureSlot {
            field: field.clone(),
            sub_filter: "adbe.pkcs7.detached".to_string(),
            container_len: 16,
            signer_name: Some("Jaime Smith".to_string()),
            location: Some("Los Angeles, CA".to_string()),
            reason: None,
            contact_info: Some("/Contents (fake)".to_string()),
            signing_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            appearance: None,
        }
    }

    fn one_page_with_field() -> (PdfWriter, SignatureField) {
        let mut writer = PdfWriter::new();
        let mut page = writer.add_letter_page();
        page.add_text("Hello, World!", 72.0, 720.0, StandardFont::Helvetica, 12.0);
        page.finish();
        let field = SignatureField::with_name("Sig1", Rect::new(324.0, 144.0, 216.0, 72.0), 0).unwrap();
        writer.add_signature_field(&field).unwrap();
        (writer, field)
    }

    #[test]
    fn test_create_empty_pdf() {
        let mut writer = PdfWriter::new();
        writer.add_letter_page().finish();
        let bytes = writer.finish().unwrap();

        let content = String::from_utf8_lossy(&bytes);
        assert!(content.starts_with("%PDF-1.7"));
        assert!(content.contains("/Type /Catalog"));
        assert!(content.contains("/Type /Pages"));
        assert!(content.contains("/Type /Page"));
        assert!(!content.contains("/AcroForm"));
        assert!(content.ends_with("%%EOF"));
    }

    #[test]
    fn test_pdf_with_text() {
        let mut writer = PdfWriter::new();
        let mut page = writer.add_letter_page();
        page.add_text("Hello, World!", 72.0, 720.0, StandardFont::TimesBold, 12.0);
        page.finish();

        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);

        assert!(content.contains("/BaseFont /Times-Bold"));
        assert!(content.contains("/TimesBold 12 Tf"));
        assert!(content.contains("(Hello, World!) Tj"));
    }

    #[test]
    fn test_pdf_with_metadata() {
        let config = PdfWriterConfig::default()
            .with_title("Test Document")
            .with_author("Test Author");

        let mut writer = PdfWriter::with_config(config);
        writer.add_letter_page().finish();

        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);

        assert!(content.contains("/Title (Test Document)"));
        assert!(content.contains("/Author (Test Author)"));
    }

    #[test]
    fn test_multiple_pages() {
        let mut writer = PdfWriter::new();
        writer.add_letter_page().finish();
        writer.add_a4_page().finish();
        assert_eq!(writer.page_count(), 2);

        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);

        assert!(content.contains("/Count 2"));
        assert!(content.contains("[0 0 612 792]"));
        assert!(content.contains("[0 0 595 842]"));
    }

    #[test]
    fn test_compressed_content() {
        let mut writer = PdfWriter::with_config(PdfWriterConfig::default().with_compress(true));
        let mut page = writer.add_letter_page();
        page.add_text("compressed", 72.0, 720.0, StandardFont::Courier, 12.0);
        page.finish();
        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/Filter /FlateDecode"));
        assert!(!content.contains("(compressed) Tj"));
    }

    #[test]
    fn test_field_on_missing_page_rejected() {
        let mut writer = PdfWriter::new();
        writer.add_letter_page().finish();
        let field = SignatureField::new(Rect::new(0.0, 0.0, 10.0, 10.0), 1).unwrap();
        assert!(matches!(writer.add_signature_field(&field), Err(Error::InvalidPdf(_))));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let (mut writer, _) = one_page_with_field();
        let twin = SignatureField::with_name("Sig1", Rect::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        assert!(matches!(writer.add_signature_field(&twin), Err(Error::InvalidPdf(_))));
    }

    #[test]
    fn test_unsigned_field_gets_empty_appearance() {
        let (writer, _) = one_page_with_field();
        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);

        assert!(content.contains("/FT /Sig"));
        assert!(content.contains("/T (Sig1)"));
        assert!(content.contains("/Annots ["));
        assert!(content.contains("/BBox [0 0 216 72]"));
        assert!(content.contains("/AcroForm <</Fields ["));
        assert!(!content.contains("/SigFlags"));
        assert!(!content.contains("/Type /Sig/"));
    }

    #[test]
    fn test_placeholder_offsets_are_exact() {
        let (writer, field) = one_page_with_field();
        let doc = writer.serialize(Some(&slot_for(&field))).unwrap();
        let location = doc.placeholder.unwrap();
        let bytes = &doc.bytes;

        assert_eq!(
            &bytes[location.byte_range_offset..location.byte_range_offset + location.byte_range_width],
            b"[0 0000000000 0000000000 0000000000]"
        );
        let contents = &bytes[location.contents_offset..location.contents_offset + location.contents_len];
        assert_eq!(contents.len(), 16 * 2 + 2);
        assert_eq!(contents[0], b'<');
        assert_eq!(contents[contents.len() - 1], b'>');
        assert!(contents[1..contents.len() - 1].iter().all(|&b| b == b'0'));

        let content = String::from_utf8_lossy(bytes);
        assert!(content.contains("/SigFlags 3"));
        assert!(content.contains("/Name (Jaime Smith)/Location (Los Angeles, CA)"));
        assert!(content.contains("/M (D:20240301123000+00'00')"));
        assert_eq!(doc.page_count, 1);
    }

    #[test]
    fn test_serialization_is_repeatable() {
        let (writer, field) = one_page_with_field();
        let slot = slot_for(&field);
        let first = writer.serialize(Some(&slot)).unwrap();
        let second = writer.serialize(Some(&slot)).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.placeholder, second.placeholder);
    }

    #[test]
    fn test_unregistered_field_cannot_be_signed() {
        let (writer, _) = one_page_with_field();
        let stranger = SignatureField::with_name("Other", Rect::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        let err = writer.serialize(Some(&slot_for(&stranger))).unwrap_err();
        assert!(matches!(err, Error::InvalidPdf(_)));
    }

    #[test]
    fn test_pdf_date() {
        let time = Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(pdf_date(&time), "D:20301231235958+00'00'");
    }
}
