//! Batch validation: the all-or-nothing gate in front of staging.
//!
//! Validation is deliberately strict: if even one file of the selection
//! falls outside the mode's allow-list the entire batch is rejected.
//! Silently dropping the invalid subset would convert a different batch
//! than the one the user thinks they selected. The same policy applies to
//! file count — the single-document modes refuse multi-file drops with a
//! distinct error instead of truncating to the first file.

use crate::error::ConvertError;
use crate::input::SourceFile;
use crate::mode::ConversionMode;
use tracing::debug;

/// Check a selection against a mode's contract.
///
/// Returns `Ok(())` only when every file is acceptable; the first
/// offending file (or the count mismatch) is reported otherwise and no
/// partial batch is ever staged.
pub fn validate(files: &[SourceFile], mode: ConversionMode) -> Result<(), ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::EmptyBatch);
    }

    if mode.single_file() && files.len() > 1 {
        return Err(ConvertError::TooManyFiles {
            mode: mode.label(),
            count: files.len(),
        });
    }

    let allowed = mode.allowed_extensions();
    for file in files {
        let ok = file
            .extension()
            .map(|ext| allowed.contains(&ext.as_str()))
            .unwrap_or(false);
        if !ok {
            return Err(ConvertError::UnsupportedFile {
                name: file.name.clone(),
                mode: mode.label(),
                allowed: mode.allowed_label(),
            });
        }
    }

    debug!("Validated {} file(s) for {}", files.len(), mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SourceFile {
        SourceFile::new(name, vec![0u8; 4])
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(matches!(
            validate(&[], ConversionMode::SwapImageFormat),
            Err(ConvertError::EmptyBatch)
        ));
    }

    #[test]
    fn one_bad_file_rejects_the_whole_batch() {
        let files = vec![file("a.jpg"), file("b.png"), file("notes.txt")];
        let err = validate(&files, ConversionMode::ImagesToPdf).unwrap_err();
        match err {
            ConvertError::UnsupportedFile { name, .. } => assert_eq!(name, "notes.txt"),
            other => panic!("expected UnsupportedFile, got {other:?}"),
        }
    }

    #[test]
    fn extensions_match_case_insensitively() {
        let files = vec![file("A.JPG"), file("b.Jpeg"), file("C.PnG")];
        assert!(validate(&files, ConversionMode::SwapImageFormat).is_ok());
    }

    #[test]
    fn pdf_modes_reject_images() {
        let err = validate(&[file("photo.png")], ConversionMode::RasterizeToJpg).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFile { .. }));
    }

    #[test]
    fn pdf_modes_reject_multi_file_drops() {
        let files = vec![file("a.pdf"), file("b.pdf")];
        let err = validate(&files, ConversionMode::RasterizeToPng).unwrap_err();
        assert!(matches!(err, ConvertError::TooManyFiles { count: 2, .. }));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = validate(&[file("README")], ConversionMode::ResizeImage).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFile { .. }));
    }

    #[test]
    fn valid_single_pdf_passes() {
        assert!(validate(&[file("doc.pdf")], ConversionMode::RasterizeToJpg).is_ok());
    }
}
