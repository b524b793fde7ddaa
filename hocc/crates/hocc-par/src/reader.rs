//! The source-reading seam.
//!
//! The core never touches the filesystem or the network itself. An
//! `include` directive hands its link to a [`SourceReader`] supplied by
//! the embedder; the driver crate provides file and HTTP readers, tests
//! use [`MapReader`].

use rustc_hash::FxHashMap;
use thiserror::Error;

/// How an include named its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeKind {
    /// `include file("...")`
    File,
    /// `include url("...")`
    Url,
    /// Bare `include "..."`; the reader decides what the link means.
    Heuristic,
}

/// Failures reading a referenced source.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("source not found: {0}")]
    NotFound(String),
    #[error("failed to read {link}: {reason}")]
    Io { link: String, reason: String },
    #[error("unsupported source kind for {0}")]
    Unsupported(String),
}

/// Reads referenced sources for `include` directives.
pub trait SourceReader {
    fn read(&self, link: &str, kind: IncludeKind) -> Result<String, ReadError>;
}

/// A reader that finds nothing. Non-required includes become empty
/// objects, required ones fail.
pub struct NullReader;

impl SourceReader for NullReader {
    fn read(&self, link: &str, _kind: IncludeKind) -> Result<String, ReadError> {
        Err(ReadError::NotFound(link.to_string()))
    }
}

/// An in-memory reader mapping links to source text.
#[derive(Default)]
pub struct MapReader {
    sources: FxHashMap<String, String>,
}

impl MapReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, link: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(link.into(), source.into());
    }

    pub fn with(mut self, link: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(link, source);
        self
    }
}

impl SourceReader for MapReader {
    fn read(&self, link: &str, _kind: IncludeKind) -> Result<String, ReadError> {
        self.sources
            .get(link)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(link.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_reader() {
        let err = NullReader.read("x.conf", IncludeKind::Heuristic).unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }

    #[test]
    fn test_map_reader() {
        let reader = MapReader::new().with("a.conf", "x = 1");
        assert_eq!(reader.read("a.conf", IncludeKind::File).unwrap(), "x = 1");
        assert!(reader.read("b.conf", IncludeKind::File).is_err());
    }
}
