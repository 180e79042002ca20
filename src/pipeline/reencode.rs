//! Per-image transforms: format swap (png ↔ jpeg) and resize.
//!
//! Both operations decode, transform and re-encode each file
//! independently, so they fan out across the blocking pool with
//! [`futures::stream::StreamExt::buffer_unordered`] bounded by
//! `config.concurrency`. A file that fails to decode or encode becomes a
//! skipped [`TransformResult`]; the batch carries on.

use crate::config::{ConvertConfig, ResizeSpec};
use crate::error::ItemError;
use crate::input::SourceFile;
use crate::output::TransformResult;
use crate::pipeline::encode::{encode_surface, RasterFormat};
use futures::stream::{self, StreamExt};
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Swap every file between PNG and JPEG, keeping the basename.
/// `photo.png` becomes `photo.jpg` and vice versa; `.jpeg` inputs take
/// the canonical `.jpg` extension on the way out.
pub async fn swap_formats(
    files: Vec<SourceFile>,
    config: &ConvertConfig,
) -> Vec<TransformResult> {
    run_per_file(files, config, move |file, quality| {
        let source = file
            .extension()
            .as_deref()
            .and_then(RasterFormat::from_ext)
            .ok_or_else(|| {
                decode_error(file, format!("unrecognized extension on '{}'", file.name))
            })?;
        let target = source.swapped();
        let img = image::load_from_memory(&file.bytes).map_err(|e| decode_error(file, e))?;
        let bytes = encode_surface(&img, target, quality).map_err(|e| encode_error(file, e))?;
        Ok((file.with_extension(target.ext()), bytes))
    })
    .await
}

/// Resize every file to `spec`, keeping its format and appending a
/// `_<width>x<height>` suffix to the basename.
pub async fn resize_images(
    files: Vec<SourceFile>,
    spec: ResizeSpec,
    config: &ConvertConfig,
) -> Vec<TransformResult> {
    let (width, height) = (spec.width(), spec.height());
    run_per_file(files, config, move |file, quality| {
        let format = file
            .extension()
            .as_deref()
            .and_then(RasterFormat::from_ext)
            .ok_or_else(|| {
                decode_error(file, format!("unrecognized extension on '{}'", file.name))
            })?;
        let img = image::load_from_memory(&file.bytes).map_err(|e| decode_error(file, e))?;
        // Triangle (bilinear) matches quality expectations at batch speed.
        let resized = img.resize_exact(width, height, FilterType::Triangle);
        let bytes = encode_surface(&resized, format, quality).map_err(|e| encode_error(file, e))?;
        Ok((file.with_suffix(&format!("_{width}x{height}")), bytes))
    })
    .await
}

fn decode_error(file: &SourceFile, detail: impl ToString) -> ItemError {
    ItemError::DecodeFailed {
        name: file.name.clone(),
        detail: detail.to_string(),
    }
}

fn encode_error(file: &SourceFile, detail: impl ToString) -> ItemError {
    ItemError::EncodeFailed {
        name: file.name.clone(),
        detail: detail.to_string(),
    }
}

/// Shared fan-out: run `transform` for each file on the blocking pool,
/// bounded by `config.concurrency`, and return results sorted by input
/// index. The transform returns `(output_name, bytes)` or the item error
/// to record.
async fn run_per_file<F>(
    files: Vec<SourceFile>,
    config: &ConvertConfig,
    transform: F,
) -> Vec<TransformResult>
where
    F: Fn(&SourceFile, u8) -> Result<(String, Vec<u8>), ItemError> + Clone + Send + 'static,
{
    let total = files.len();
    if let Some(ref cb) = config.progress {
        cb.on_convert_start(total);
    }

    let quality = config.jpeg_quality;
    let mut results: Vec<TransformResult> = stream::iter(files.into_iter().enumerate().map(
        |(idx, file)| {
            let transform = transform.clone();
            let progress = config.progress.clone();
            async move {
                let name = file.name.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || transform(&file, quality)).await;

                let result = match outcome {
                    Ok(Ok((output_name, bytes))) => {
                        debug!("Transformed '{}' -> '{}'", name, output_name);
                        TransformResult::ok(idx, output_name, bytes)
                    }
                    Ok(Err(error)) => {
                        warn!("Skipping '{}': {}", name, error);
                        TransformResult::skipped(idx, name, error)
                    }
                    Err(e) => TransformResult::skipped(
                        idx,
                        name.clone(),
                        ItemError::DecodeFailed {
                            name,
                            detail: format!("transform task panicked: {e}"),
                        },
                    ),
                };

                if let Some(cb) = progress {
                    match &result.error {
                        None => cb.on_item_complete(idx, total, &result.output_name),
                        Some(e) => cb.on_item_skipped(idx, total, e.to_string()),
                    }
                }
                result
            }
        },
    ))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    results.sort_by_key(|r| r.index);
    results
}
