//! Error types for the batchconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the batch cannot proceed at all
//!   (rejected file selection, corrupt PDF, archive cannot be written).
//!   Returned as `Err(ConvertError)` from [`crate::convert::run_batch`]
//!   and the [`crate::batch::Batch`] methods.
//!
//! * [`ItemError`] — **Non-fatal**: a single file or page failed to decode
//!   or encode but the rest of the batch is fine. Stored inside
//!   [`crate::output::TransformResult`] so the batch continues with
//!   whatever succeeded rather than losing the whole download to one
//!   bad item.
//!
//! The separation keeps the state machine honest: validation and fatal
//! errors interrupt the user flow, item errors only affect how many
//! entries end up in the emitted archive.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the batchconv library.
///
/// Item-level failures use [`ItemError`] and are stored in
/// [`crate::output::TransformResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The selection contained no files at all.
    #[error("No files selected")]
    EmptyBatch,

    /// At least one file in the selection has an extension outside the
    /// mode's allow-list. The whole batch is rejected, never a subset.
    #[error("'{name}' is not accepted for {mode}: only {allowed} files can be converted")]
    UnsupportedFile {
        name: String,
        mode: &'static str,
        allowed: &'static str,
    },

    /// A single-file mode received more than one file.
    #[error("{mode} converts one file at a time ({count} selected)")]
    TooManyFiles { mode: &'static str, count: usize },

    // ── State-machine errors ──────────────────────────────────────────────
    /// `stage` was called while a conversion is still in flight.
    #[error("A conversion is already in progress; wait for it to finish")]
    BatchBusy,

    /// `begin_convert` was called without a staged selection.
    #[error("No staged files to convert")]
    NotStaged,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file carries a .pdf extension but does not start with `%PDF`.
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The PDF header/xref is corrupt and pdfium cannot open it.
    /// Aborts the whole batch; the state machine still returns to idle.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// Every item of the batch failed; there is nothing to download.
    #[error("All {total} items failed to convert.\nFirst error: {first_error}")]
    NoOutput { total: usize, first_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The zip container could not be assembled.
    #[error("Failed to build the download archive: {detail}")]
    ArchiveWrite { detail: String },

    /// The merged PDF document could not be serialised.
    #[error("Failed to build the output document: {detail}")]
    DocumentWrite { detail: String },

    /// Could not write the emitted download to disk.
    #[error("Failed to write '{path}': {source}")]
    EmitFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (task panic, tempfile failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file or page.
///
/// Stored alongside [`crate::output::TransformResult`] when an item fails.
/// The batch continues unless ALL items fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// The source image could not be decoded.
    #[error("'{name}': decode failed: {detail}")]
    DecodeFailed { name: String, detail: String },

    /// The transformed surface could not be re-encoded.
    #[error("'{name}': encode failed: {detail}")]
    EncodeFailed { name: String, detail: String },

    /// A single PDF page failed to rasterise; other pages are unaffected.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },
}
