//! PDF object serialization (ISO 32000-1:2008 Section 7.3).
//!
//! Output is compact and deterministic: the same object always produces
//! the same bytes. Dictionary order comes from [`Dictionary`] itself.

use crate::object::{Dictionary, Object};
use std::io::{self, Write};

/// Delimiters and whitespace that may not appear unescaped in a name.
const NAME_SPECIAL: &[u8] = b"()<>[]{}/%#";

/// Writes [`Object`]s in PDF syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Create a serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize an object into a new buffer.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec<u8> cannot fail.
        let _ = self.write_object(&mut buf, obj);
        buf
    }

    /// `{id} {gen} obj ... endobj`
    pub fn write_indirect<W: Write>(&self, w: &mut W, id: u32, gen: u16, obj: &Object) -> io::Result<()> {
        writeln!(w, "{} {} obj", id, gen)?;
        self.write_object(w, obj)?;
        w.write_all(b"\nendobj\n")
    }

    /// Write one object.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> io::Result<()> {
        match obj {
            Object::Null => w.write_all(b"null"),
            Object::Boolean(value) => w.write_all(if *value { b"true" } else { b"false" }),
            Object::Integer(value) => write!(w, "{}", value),
            Object::Real(value) => write_real(w, *value),
            Object::String(data) => write_string(w, data),
            Object::Name(name) => write_name(w, name),
            Object::Array(items) => {
                w.write_all(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.write_all(b" ")?;
                    }
                    self.write_object(w, item)?;
                }
                w.write_all(b"]")
            },
            Object::Dictionary(dict) => self.write_dictionary(w, dict, None),
            Object::Stream { dict, data } => {
                self.write_dictionary(w, dict, Some(data.len()))?;
                w.write_all(b"\nstream\n")?;
                w.write_all(data)?;
                w.write_all(b"\nendstream")
            },
            Object::Reference(r) => write!(w, "{}", r),
        }
    }

    /// `stream_len` overrides any `/Length` already in `dict`.
    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary, stream_len: Option<usize>) -> io::Result<()> {
        w.write_all(b"<<")?;
        let mut length_written = false;
        for (key, value) in dict {
            if key == "Length" && stream_len.is_some() {
                continue;
            }
            if let (Some(len), false, true) = (stream_len, length_written, key.as_str() > "Length") {
                write!(w, "/Length {}", len)?;
                length_written = true;
            }
            write_name(w, key)?;
            w.write_all(b" ")?;
            self.write_object(w, value)?;
        }
        if let (Some(len), false) = (stream_len, length_written) {
            write!(w, "/Length {}", len)?;
        }
        w.write_all(b">>")
    }
}

/// Up to five decimals, trailing zeros dropped, never `-0`.
fn write_real<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    let rounded = (value * 100_000.0).round() / 100_000.0;
    if rounded == 0.0 {
        return w.write_all(b"0");
    }
    if rounded.fract() == 0.0 {
        return write!(w, "{}", rounded as i64);
    }
    let text = format!("{:.5}", rounded);
    w.write_all(text.trim_end_matches('0').as_bytes())
}

/// Literal `( )` syntax for printable ASCII, hex `< >` otherwise.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    let printable = data
        .iter()
        .all(|&b| matches!(b, b'\n' | b'\r' | b'\t' | 0x20..=0x7E));
    if !printable {
        w.write_all(b"<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        return w.write_all(b">");
    }

    w.write_all(b"(")?;
    for &byte in data {
        let escaped: &[u8] = match byte {
            b'(' => b"\\(",
            b')' => b"\\)",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            _ => {
                w.write_all(&[byte])?;
                continue;
            },
        };
        w.write_all(escaped)?;
    }
    w.write_all(b")")
}

/// `/Name` with `#xx` escapes for anything outside the regular characters.
fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    w.write_all(b"/")?;
    for byte in name.bytes() {
        if (0x21..=0x7E).contains(&byte) && !NAME_SPECIAL.contains(&byte) {
            w.write_all(&[byte])?;
        } else {
            write!(w, "#{:02X}", byte)?;
        }
    }
    Ok(())
}
