//! Output types: per-item results, batch statistics, and the emitted
//! download.

use crate::error::{ConvertError, ItemError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The outcome of transforming one item (one file, or one PDF page).
///
/// Ownership of the bytes transfers to the archive assembler as soon as
/// the result is produced; a skipped item carries its error and an empty
/// buffer.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// 0-based position of the item in the input order (file index, or
    /// page index for the rasterisation modes). Output ordering is keyed
    /// off this, never off completion order.
    pub index: usize,
    /// Name of the produced entry (archive modes). For the merged-PDF
    /// mode this is the source filename, kept for reporting.
    pub output_name: String,
    /// Encoded output bytes; empty when the item was skipped.
    pub bytes: Vec<u8>,
    /// Local failure, if the item was skipped.
    pub error: Option<ItemError>,
}

impl TransformResult {
    /// A successful transform.
    pub fn ok(index: usize, output_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            index,
            output_name: output_name.into(),
            bytes,
            error: None,
        }
    }

    /// A skipped item.
    pub fn skipped(index: usize, output_name: impl Into<String>, error: ItemError) -> Self {
        Self {
            index,
            output_name: output_name.into(),
            bytes: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

/// The single downloadable artefact a batch emits: raw bytes plus the
/// deterministic suggested filename.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub suggested_name: String,
}

impl Download {
    /// Write the download into `dir` under its suggested name, atomically
    /// (temp file + rename) so a crash never leaves a partial file.
    /// An existing file of the same name is replaced.
    pub async fn emit_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ConvertError::EmitFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;

        let path = dir.join(&self.suggested_name);
        let tmp_path = path.with_extension("part");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(|e| ConvertError::EmitFailed {
                path: path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ConvertError::EmitFailed {
                path: path.clone(),
                source: e,
            })?;

        Ok(path)
    }
}

/// Statistics for one completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    /// Items attempted (files, or pages for the rasterisation modes).
    pub total_items: usize,
    /// Items that produced output.
    pub converted_items: usize,
    /// Items skipped after a local failure.
    pub skipped_items: usize,
    /// Time spent in decode/transform/encode.
    pub transform_duration_ms: u64,
    /// Time spent assembling the archive or document.
    pub assemble_duration_ms: u64,
    /// Wall-clock time for the whole batch.
    pub total_duration_ms: u64,
}

/// Everything a completed batch hands back to the caller.
#[derive(Debug)]
pub struct BatchOutput {
    /// The downloadable archive or merged document.
    pub download: Download,
    /// Per-batch statistics.
    pub stats: BatchStats,
    /// Errors of the items that were skipped, in input order.
    pub skipped: Vec<ItemError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_result_constructors() {
        let ok = TransformResult::ok(2, "page-3.jpg", vec![1, 2, 3]);
        assert!(!ok.is_skipped());
        assert_eq!(ok.index, 2);
        assert_eq!(ok.output_name, "page-3.jpg");

        let skipped = TransformResult::skipped(
            0,
            "page-1.jpg",
            ItemError::RenderFailed {
                page: 1,
                detail: "oom".into(),
            },
        );
        assert!(skipped.is_skipped());
        assert!(skipped.bytes.is_empty());
    }

    #[tokio::test]
    async fn emit_writes_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");

        let first = Download {
            bytes: b"first".to_vec(),
            suggested_name: "converted.pdf".to_string(),
        };
        let path = first.emit_to_dir(dir.path()).await.expect("emit");
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        let second = Download {
            bytes: b"second".to_vec(),
            suggested_name: "converted.pdf".to_string(),
        };
        let path2 = second.emit_to_dir(dir.path()).await.expect("emit again");
        assert_eq!(path, path2);
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        // No leftover temp file
        assert!(!dir.path().join("converted.part").exists());
    }

    #[tokio::test]
    async fn emit_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("out/deep");

        let dl = Download {
            bytes: vec![0u8; 8],
            suggested_name: "converted_images.zip".to_string(),
        };
        let path = dl.emit_to_dir(&nested).await.expect("emit");
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[test]
    fn stats_serialise() {
        let stats = BatchStats {
            total_items: 3,
            converted_items: 2,
            skipped_items: 1,
            transform_duration_ms: 10,
            assemble_duration_ms: 2,
            total_duration_ms: 13,
        };
        let json = serde_json::to_string(&stats).expect("serialise");
        assert!(json.contains("\"converted_items\":2"));
    }
}
