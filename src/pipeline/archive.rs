//! ZIP assembly: gather successful transform results into one in-memory
//! archive.
//!
//! Skipped results contribute nothing. Duplicate entry names are allowed
//! and resolved last-writer-wins, matching what most extractors do with
//! repeated names.

use crate::error::ConvertError;
use crate::output::TransformResult;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Serialise every non-skipped result into a deflate-compressed ZIP.
///
/// Returns [`ConvertError::NoOutput`] when no result carries bytes, so an
/// empty archive is never produced.
pub fn build_archive(results: &[TransformResult]) -> Result<Vec<u8>, ConvertError> {
    let survivors: Vec<&TransformResult> = results.iter().filter(|r| !r.is_skipped()).collect();
    if survivors.is_empty() {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref().map(|e| e.to_string()))
            .unwrap_or_default();
        return Err(ConvertError::NoOutput {
            total: results.len(),
            first_error,
        });
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for result in &survivors {
        writer
            .start_file(result.output_name.as_str(), options)
            .map_err(|e| ConvertError::ArchiveWrite {
                detail: format!("'{}': {e}", result.output_name),
            })?;
        writer
            .write_all(&result.bytes)
            .map_err(|e| ConvertError::ArchiveWrite {
                detail: format!("'{}': {e}", result.output_name),
            })?;
    }

    let cursor = writer.finish().map_err(|e| ConvertError::ArchiveWrite {
        detail: e.to_string(),
    })?;
    let bytes = cursor.into_inner();
    debug!(
        "Archived {} entr{} ({} bytes)",
        survivors.len(),
        if survivors.len() == 1 { "y" } else { "ies" },
        bytes.len()
    );
    Ok(bytes)
}
