//! Pipeline stages for batch conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap a codec binding (renderer, PDF builder, archiver) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! files ──▶ rasterize ─┐
//!       ──▶ reencode ──┼──▶ archive   (zip of named entries)
//!       ──▶ build_pdf ─┴──▶ download  (single merged document)
//! ```
//!
//! 1. [`rasterize`] — PDF pages → JPG/PNG buffers; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`build_pdf`] — JPG/PNG files → one merged PDF, input order
//! 3. [`reencode`]  — per-image format swap or resize
//! 4. [`encode`]    — shared raster-surface → buffer encoding
//! 5. [`archive`]   — pack named buffers into the downloadable zip

pub mod archive;
pub mod build_pdf;
pub mod encode;
pub mod rasterize;
pub mod reencode;
