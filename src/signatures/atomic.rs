//! Atomic splice-and-write of signed documents.
//!
//! The container is spliced into the reserved placeholder in memory and the
//! complete document is then handed to an [`OutputSink`] in a single
//! commit. Nothing reaches the sink before every earlier stage succeeded.

use super::byterange::ReservedDocument;
use super::cms::SignatureContainer;
use crate::error::{Error, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination of a signed document.
///
/// `commit` receives the whole document at once and reports how many bytes
/// were persisted.
pub trait OutputSink {
    /// Persist `document`.
    fn commit(&mut self, document: &[u8]) -> io::Result<u64>;
}

impl OutputSink for Vec<u8> {
    fn commit(&mut self, document: &[u8]) -> io::Result<u64> {
        self.extend_from_slice(document);
        Ok(document.len() as u64)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn commit(&mut self, document: &[u8]) -> io::Result<u64> {
        (**self).commit(document)
    }
}

/// Sink over any [`Write`].
///
/// The document is written with one `write_all` followed by `flush`. A
/// plain writer cannot roll back, so an I/O error part way through may
/// leave a prefix behind; use [`AtomicFileSink`] for files.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn commit(&mut self, document: &[u8]) -> io::Result<u64> {
        self.inner.write_all(document)?;
        self.inner.flush()?;
        Ok(document.len() as u64)
    }
}

/// File sink that never exposes a partial document.
///
/// Writes to a temporary file in the destination directory, syncs it and
/// renames it over the destination.
#[derive(Debug, Clone)]
pub struct AtomicFileSink {
    path: PathBuf,
}

impl AtomicFileSink {
    /// Sink writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for AtomicFileSink {
    fn commit(&mut self, document: &[u8]) -> io::Result<u64> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(document)?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        let file = temp.persist(&self.path).map_err(|e| e.error)?;
        let written = file.metadata()?.len();

        log::debug!("Persisted {} bytes to {}", written, self.path.display());
        Ok(written)
    }
}

/// Final stage of the signing pipeline.
pub struct AtomicWriter;

impl AtomicWriter {
    /// Splice `container` into the reserved placeholder.
    ///
    /// Only placeholder bytes change. Fails with
    /// [`Error::PlaceholderOverflow`] if the container does not fit and
    /// with [`Error::SerializationDrift`] if the length moved.
    pub fn finalize(reserved: ReservedDocument, container: &SignatureContainer) -> Result<Vec<u8>> {
        let expected = reserved.len();
        let contents_offset = reserved.location().contents_offset;
        let calculator = *reserved.calculator();
        let byte_range = reserved.byte_range().clone();

        let mut bytes = reserved.into_bytes();
        calculator.insert_container(&mut bytes, contents_offset, container.as_bytes())?;

        if bytes.len() != expected {
            return Err(Error::SerializationDrift {
                expected,
                actual: bytes.len(),
            });
        }
        byte_range.validate(bytes.len())?;
        Ok(bytes)
    }

    /// Hand the finished document to `sink` and confirm the written length.
    pub fn commit<S: OutputSink + ?Sized>(document: &[u8], sink: &mut S) -> Result<u64> {
        let written = sink.commit(document)?;
        if written != document.len() as u64 {
            return Err(Error::SerializationDrift {
                expected: document.len(),
                actual: written as usize,
            });
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortSink;

    impl OutputSink for ShortSink {
        fn commit(&mut self, document: &[u8]) -> io::Result<u64> {
            Ok(document.len() as u64 - 1)
        }
    }

    #[test]
    fn test_vec_sink() {
        let mut sink = Vec::new();
        assert_eq!(AtomicWriter::commit(b"%PDF-1.7", &mut sink).unwrap(), 8);
        assert_eq!(sink, b"%PDF-1.7");
    }

    #[test]
    fn test_short_write_is_drift() {
        let err = AtomicWriter::commit(b"%PDF-1.7", &mut ShortSink).unwrap_err();
        assert!(matches!(err, Error::SerializationDrift { expected: 8, actual: 7 }));
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(io::Cursor::new(Vec::new()));
        sink.commit(b"abc").unwrap();
        assert_eq!(sink.into_inner().into_inner(), b"abc");
    }

    #[test]
    fn test_atomic_file_sink_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        let mut sink = AtomicFileSink::new(&path);
        assert_eq!(sink.commit(b"new").unwrap(), 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_atomic_file_sink_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.pdf");
        assert!(AtomicFileSink::new(&path).commit(b"x").is_err());
        assert!(!path.exists());
    }
}
