//! Input validation before any engine runs.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Verify that `path` exists and starts with the PDF magic.
///
/// A missing file is a [`Error::MissingInput`] — signaled immediately,
/// fatal to the operation. A present file with the wrong magic is
/// [`Error::UnknownFormat`].
pub fn ensure_pdf<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let mut header = [0u8; 8];
    let n = File::open(path)?.read(&mut header)?;
    if is_pdf_bytes(&header[..n]) {
        Ok(())
    } else {
        Err(Error::UnknownFormat)
    }
}

/// Read the header version of a PDF file (e.g. "1.7").
pub fn pdf_version<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let mut header = [0u8; 8];
    let n = File::open(path)?.read(&mut header)?;
    version_from_bytes(&header[..n]).ok_or(Error::UnknownFormat)
}

/// Check whether a byte slice starts like a PDF with a plausible version.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    version_from_bytes(data).is_some()
}

fn version_from_bytes(data: &[u8]) -> Option<String> {
    let rest = data.strip_prefix(PDF_MAGIC)?;
    // Version is "D.D" right after the magic
    if rest.len() < 3 {
        return None;
    }
    let (major, dot, minor) = (rest[0], rest[1], rest[2]);
    if major.is_ascii_digit() && dot == b'.' && minor.is_ascii_digit() {
        Some(format!("{}.{}", major as char, minor as char))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_version_from_bytes() {
        assert_eq!(version_from_bytes(b"%PDF-1.7\n%x"), Some("1.7".into()));
        assert_eq!(version_from_bytes(b"%PDF-2.0\n"), Some("2.0".into()));
        assert_eq!(version_from_bytes(b"%PDF-x.0"), None);
        assert_eq!(version_from_bytes(b"%PDF-"), None);
        assert_eq!(version_from_bytes(b"<!DOCTYPE html>"), None);
        assert_eq!(version_from_bytes(b""), None);
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\ntest"));
        assert!(!is_pdf_bytes(b"Not a PDF file"));
    }

    #[test]
    fn test_ensure_pdf_missing_input() {
        let result = ensure_pdf("definitely/not/here.pdf");
        assert!(matches!(result, Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_ensure_pdf_wrong_magic() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let result = ensure_pdf(f.path());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_pdf_version_reads_header() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.5\n%binary").unwrap();
        assert_eq!(pdf_version(f.path()).unwrap(), "1.5");
    }
}
