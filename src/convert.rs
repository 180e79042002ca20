//! Eager batch-conversion entry points.
//!
//! [`run_batch`] validates a set of input files against a
//! [`ConversionMode`], runs the mode's transform, bundles the survivors
//! into a single download and returns it with per-batch statistics. Use
//! [`crate::batch::Batch`] instead when you need staged inputs and
//! single-flight state tracking around the same pipeline.

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::input::SourceFile;
use crate::mode::ConversionMode;
use crate::output::{BatchOutput, BatchStats, Download, TransformResult};
use crate::pipeline::encode::RasterFormat;
use crate::pipeline::{archive, build_pdf, rasterize, reencode};
use crate::validate;
use std::time::Instant;
use tracing::info;

/// Run one conversion batch to completion.
///
/// # Returns
/// `Ok(BatchOutput)` on success, even if some items were skipped
/// (check `output.stats.skipped_items`).
///
/// # Errors
/// Returns `Err(ConvertError)` only for fatal conditions:
/// - Empty batch or inputs the mode does not accept
/// - A corrupt or non-PDF document in a rasterisation mode
/// - Every item failed and no download could be produced
pub async fn run_batch(
    files: Vec<SourceFile>,
    mode: ConversionMode,
    config: &ConvertConfig,
) -> Result<BatchOutput, ConvertError> {
    let total_start = Instant::now();
    info!("Starting {} batch: {} file(s)", mode, files.len());

    // ── Step 1: Validate inputs ──────────────────────────────────────────
    validate::validate(&files, mode)?;

    // ── Step 2: Transform ────────────────────────────────────────────────
    let transform_start = Instant::now();
    let (results, merged_document) = transform(files, mode, config).await?;
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let total = results.len();
    let skipped: Vec<_> = results.iter().filter_map(|r| r.error.clone()).collect();
    let converted = total - skipped.len();
    info!(
        "Transformed {}/{} item(s) in {}ms",
        converted, total, transform_duration_ms
    );

    // ── Step 3: Assemble the download ────────────────────────────────────
    let assemble_start = Instant::now();
    let bytes = match merged_document {
        Some(document) => document,
        None => {
            // Deflate over potentially many megabytes stays off the
            // async workers.
            let archived = tokio::task::spawn_blocking(move || archive::build_archive(&results))
                .await
                .map_err(|e| ConvertError::Internal(format!("Archive task panicked: {e}")))??;
            archived
        }
    };
    let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

    // ── Step 4: Stats and completion callback ────────────────────────────
    let stats = BatchStats {
        total_items: total,
        converted_items: converted,
        skipped_items: skipped.len(),
        transform_duration_ms,
        assemble_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    if let Some(ref cb) = config.progress {
        cb.on_convert_complete(total, converted);
    }

    let suggested_name = mode.suggested_filename(config.resize.as_ref());
    info!(
        "Batch complete: '{}', {} bytes, {}ms total",
        suggested_name,
        bytes.len(),
        stats.total_duration_ms
    );

    Ok(BatchOutput {
        download: Download {
            bytes,
            suggested_name,
        },
        stats,
        skipped,
    })
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(
    files: Vec<SourceFile>,
    mode: ConversionMode,
    config: &ConvertConfig,
) -> Result<BatchOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(run_batch(files, mode, config))
}

/// Dispatch to the mode's transform.
///
/// Returns the per-item results plus, for the merge mode, the assembled
/// document bytes (other modes bundle their results into an archive in
/// the caller).
async fn transform(
    files: Vec<SourceFile>,
    mode: ConversionMode,
    config: &ConvertConfig,
) -> Result<(Vec<TransformResult>, Option<Vec<u8>>), ConvertError> {
    match mode {
        ConversionMode::RasterizeToJpg | ConversionMode::RasterizeToPng => {
            let format = if mode == ConversionMode::RasterizeToJpg {
                RasterFormat::Jpeg
            } else {
                RasterFormat::Png
            };
            // Validation guarantees exactly one file for these modes.
            let file = files
                .into_iter()
                .next()
                .ok_or(ConvertError::EmptyBatch)?;
            let results = rasterize::rasterize_pdf(file, format, config).await?;
            Ok((results, None))
        }
        ConversionMode::ImagesToPdf => {
            let progress = config.progress.clone();
            let (bytes, results) = tokio::task::spawn_blocking(move || {
                let built = build_pdf::build_pdf(&files)?;
                build_pdf::report_results(&built.1, progress.as_ref());
                Ok::<_, ConvertError>(built)
            })
            .await
            .map_err(|e| ConvertError::Internal(format!("Document task panicked: {e}")))??;
            Ok((results, Some(bytes)))
        }
        ConversionMode::SwapImageFormat => {
            let results = reencode::swap_formats(files, config).await;
            Ok((results, None))
        }
        ConversionMode::ResizeImage => {
            let spec = config.resize.clone().ok_or_else(|| {
                ConvertError::InvalidConfig(
                    "resize mode requires target dimensions (ConvertConfigBuilder::resize)"
                        .to_string(),
                )
            })?;
            let results = reencode::resize_images(files, spec, config).await;
            Ok((results, None))
        }
    }
}
