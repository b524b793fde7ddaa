//! Source readers for include directives.
//!
//! [`FsReader`] resolves file links relative to a base directory
//! (normally the directory of the primary source) and fetches
//! `url(...)` links over HTTP. A bare `include "..."` is heuristic: a
//! link that looks like an HTTP URL is fetched, anything else is a
//! file.

use std::path::{Path, PathBuf};

use hocc_par::reader::{IncludeKind, ReadError, SourceReader};

/// Filesystem-and-HTTP reader.
pub struct FsReader {
    base: PathBuf,
}

impl FsReader {
    /// A reader resolving relative links against `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// A reader resolving relative links against the working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn read_file(&self, link: &str) -> Result<String, ReadError> {
        let path = Path::new(link);
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        std::fs::read_to_string(&full).map_err(|e| ReadError::Io {
            link: link.to_string(),
            reason: e.to_string(),
        })
    }
}

impl SourceReader for FsReader {
    fn read(&self, link: &str, kind: IncludeKind) -> Result<String, ReadError> {
        let resolved = match kind {
            IncludeKind::Heuristic => {
                if link.starts_with("http://") || link.starts_with("https://") {
                    IncludeKind::Url
                } else {
                    IncludeKind::File
                }
            }
            other => other,
        };
        match resolved {
            IncludeKind::Url => http_get(link),
            _ => self.read_file(link),
        }
    }
}

fn http_get(url: &str) -> Result<String, ReadError> {
    let response = ureq::get(url).call().map_err(|e| ReadError::Io {
        link: url.to_string(),
        reason: e.to_string(),
    })?;
    response.into_string().map_err(|e| ReadError::Io {
        link: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_read_relative_to_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("base.conf");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "x = 1").expect("write");

        let reader = FsReader::new(dir.path());
        let text = reader.read("base.conf", IncludeKind::File).expect("read");
        assert_eq!(text.trim(), "x = 1");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = FsReader::new(dir.path());
        assert!(reader.read("nope.conf", IncludeKind::File).is_err());
    }

    #[test]
    fn test_heuristic_link_is_a_file_when_not_http() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("h.conf");
        std::fs::write(&path, "y = 2").expect("write");

        let reader = FsReader::new(dir.path());
        assert!(reader.read("h.conf", IncludeKind::Heuristic).is_ok());
    }
}
