//! Source files: the opaque blobs a batch operates on.
//!
//! A [`SourceFile`] pairs raw bytes with the filename and declared media
//! type the user supplied. It is immutable once selected and owned
//! exclusively by the current batch — [`crate::convert::run_batch`] takes
//! the files by value and drops them when the batch completes.

use crate::error::ConvertError;
use std::path::Path;
use tracing::debug;

/// An input file: name, declared media type, and raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Filename as supplied by the user (no directory component expected).
    pub name: String,
    /// Declared media type, e.g. `image/png`. Informational only — the
    /// validator keys off the name extension, the decoders off content.
    pub media_type: String,
    /// The file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Build a source file from in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type_for(&name).to_string();
        Self {
            name,
            media_type,
            bytes,
        }
    }

    /// Read a source file from disk, mapping I/O failures to the
    /// user-facing error variants.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Loaded '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    /// Lower-cased filename extension, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// Filename with the extension replaced, e.g. `photo.png` → `photo.jpg`.
    /// A name without an extension just gains one.
    pub fn with_extension(&self, ext: &str) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, _)) => format!("{stem}.{ext}"),
            None => format!("{}.{ext}", self.name),
        }
    }

    /// Filename with a suffix inserted before the extension,
    /// e.g. `photo.png` + `_640x480` → `photo_640x480.png`.
    pub fn with_suffix(&self, suffix: &str) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}{suffix}.{ext}"),
            None => format!("{}{suffix}", self.name),
        }
    }

    /// Whether the content starts with the `%PDF` magic bytes.
    pub fn has_pdf_magic(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    /// First four content bytes, for diagnostics on magic mismatches.
    pub fn magic(&self) -> [u8; 4] {
        let mut magic = [0u8; 4];
        for (i, b) in self.bytes.iter().take(4).enumerate() {
            magic[i] = *b;
        }
        magic
    }
}

/// Map a filename extension to a declared media type.
fn media_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_inferred_from_name() {
        assert_eq!(SourceFile::new("a.pdf", vec![]).media_type, "application/pdf");
        assert_eq!(SourceFile::new("a.JPG", vec![]).media_type, "image/jpeg");
        assert_eq!(SourceFile::new("a.jpeg", vec![]).media_type, "image/jpeg");
        assert_eq!(SourceFile::new("a.png", vec![]).media_type, "image/png");
        assert_eq!(
            SourceFile::new("a.txt", vec![]).media_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            SourceFile::new("Photo.PNG", vec![]).extension().as_deref(),
            Some("png")
        );
        assert_eq!(SourceFile::new("noext", vec![]).extension(), None);
        assert_eq!(SourceFile::new("trailing.", vec![]).extension(), None);
    }

    #[test]
    fn name_derivations() {
        let f = SourceFile::new("photo.archive.png", vec![]);
        assert_eq!(f.with_extension("jpg"), "photo.archive.jpg");
        assert_eq!(f.with_suffix("_640x480"), "photo.archive_640x480.png");

        let bare = SourceFile::new("photo", vec![]);
        assert_eq!(bare.with_extension("jpg"), "photo.jpg");
        assert_eq!(bare.with_suffix("_1x1"), "photo_1x1");
    }

    #[test]
    fn pdf_magic_detection() {
        let pdf = SourceFile::new("d.pdf", b"%PDF-1.7\n...".to_vec());
        assert!(pdf.has_pdf_magic());
        assert_eq!(&pdf.magic(), b"%PDF");

        let not_pdf = SourceFile::new("d.pdf", b"GIF8".to_vec());
        assert!(!not_pdf.has_pdf_magic());

        let short = SourceFile::new("d.pdf", b"%P".to_vec());
        assert!(!short.has_pdf_magic());
        assert_eq!(short.magic(), [b'%', b'P', 0, 0]);
    }

    #[test]
    fn from_path_missing_file() {
        let err = SourceFile::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn from_path_reads_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let f = SourceFile::from_path(&path).expect("read");
        assert_eq!(f.name, "sample.png");
        assert_eq!(f.media_type, "image/png");
        assert_eq!(f.bytes, b"not really a png");
    }
}
