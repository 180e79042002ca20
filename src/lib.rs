//! # batchconv
//!
//! Batch conversion between PDF documents and raster images.
//!
//! ## Why this crate?
//!
//! The same handful of conversions comes up everywhere documents are
//! handled: split a PDF into page images, merge photos into one PDF, flip
//! an image batch between PNG and JPEG, or resample everything to a fixed
//! resolution. This crate runs those as validated, single-download
//! batches — per-item failures are skipped and reported instead of
//! aborting the whole run.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Validate  all-or-nothing extension check per mode
//!  ├─ 2. Stage     optional paced progress ticks (Batch only)
//!  ├─ 3. Transform rasterise / merge / swap / resize (CPU-bound,
//!  │               spawn_blocking, bounded concurrency)
//!  ├─ 4. Assemble  zip archive or single PDF document
//!  └─ 5. Output    Download bytes + suggested name + per-batch stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batchconv::{run_batch, ConversionMode, ConvertConfig, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConvertConfig::default();
//!     let files = vec![SourceFile::from_path("scan.pdf")?];
//!     let output = run_batch(files, ConversionMode::RasterizeToJpg, &config).await?;
//!     output.download.emit_to_dir(".").await?;
//!     eprintln!(
//!         "{}/{} pages converted",
//!         output.stats.converted_items, output.stats.total_items
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `batchconv` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! batchconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod input;
pub mod mode;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{Batch, BatchStateKind};
pub use config::{ConvertConfig, ConvertConfigBuilder, ResizeSpec};
pub use convert::{run_batch, run_batch_sync};
pub use error::{ConvertError, ItemError};
pub use input::SourceFile;
pub use mode::{ContainerKind, ConversionMode};
pub use output::{BatchOutput, BatchStats, Download, TransformResult};
pub use progress::{BatchProgressCallback, NoopProgressCallback};
pub use report::UsageReporter;
