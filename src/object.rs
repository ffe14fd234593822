//! PDF object model.
//!
//! The subset of ISO 32000-1:2008 Section 7.3 objects the writer emits.
//! Dictionaries are ordered maps so that serialization order is a property
//! of the data, not of the serializer.

use crate::geometry::Rect;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// Dictionary entries, ordered by key.
pub type Dictionary = BTreeMap<String, Object>;

/// A direct PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// String, written literal when printable and hex otherwise
    String(Vec<u8>),
    /// Name, without the leading `/`
    Name(String),
    /// Array
    Array(Vec<Object>),
    /// Dictionary
    Dictionary(Dictionary),
    /// Stream; `/Length` is filled in by the serializer
    Stream {
        /// Stream dictionary
        dict: Dictionary,
        /// Raw (already filtered) stream data
        data: Bytes,
    },
    /// Indirect reference
    Reference(ObjectRef),
}

/// `id gen R`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Reference to object `id` generation `gen`.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// `/name`
    pub fn name(name: &str) -> Self {
        Object::Name(name.to_string())
    }

    /// Text string (ISO 32000-1:2008 Section 7.9.2.2).
    ///
    /// ASCII text is stored as is. Anything else becomes UTF-16BE behind a
    /// `FE FF` byte-order mark, surrogate pairs included.
    pub fn string(text: &str) -> Self {
        if text.is_ascii() {
            return Object::String(text.as_bytes().to_vec());
        }
        let mut bytes = Vec::with_capacity(2 + text.len() * 2);
        bytes.extend_from_slice(&[0xFE, 0xFF]);
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes)
    }

    /// Generation-zero reference to object `id`.
    pub fn reference(id: u32) -> Self {
        Object::Reference(ObjectRef::new(id, 0))
    }

    /// Dictionary from `(key, value)` pairs.
    pub fn dict<'a>(entries: impl IntoIterator<Item = (&'a str, Object)>) -> Self {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    /// Rectangle array `[llx lly urx ury]`.
    pub fn rect(rect: Rect) -> Self {
        Object::Array(
            [rect.left(), rect.bottom(), rect.right(), rect.top()]
                .into_iter()
                .map(|v| Object::Real(v as f64))
                .collect(),
        )
    }

    /// Integer value, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Object::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Name without the slash, if this is a name.
    pub fn as_name(&self) -> Option<&str> {
        if let Object::Name(name) = self {
            Some(name)
        } else {
            None
        }
    }

    /// Elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Object]> {
        if let Object::Array(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Dictionary of a dictionary or stream.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) | Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Target, if this is a reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        if let Object::Reference(r) = self {
            Some(*r)
        } else {
            None
        }
    }

    /// Look up `key` in a dictionary or stream dictionary.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|dict| dict.get(key))
    }
}
