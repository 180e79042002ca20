//! PDF rasterisation: render every page of one document to image buffers
//! via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the
//! blocking thread pool, preventing the Tokio worker threads from
//! stalling during CPU-heavy rendering.
//!
//! ## Failure model
//!
//! Opening the document is the only fatal step — a corrupt PDF aborts the
//! whole batch. Everything after that is per-page: a page that fails to
//! render or encode becomes a skipped [`TransformResult`] and the archive
//! proceeds with the pages that succeeded.

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ItemError};
use crate::input::SourceFile;
use crate::output::TransformResult;
use crate::pipeline::encode::{encode_surface, RasterFormat};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rasterise all pages of `file` and encode each one as `format`.
///
/// Entries are named `page-<1-based index>.<ext>` and returned sorted by
/// page index regardless of encode completion order.
pub async fn rasterize_pdf(
    file: SourceFile,
    format: RasterFormat,
    config: &ConvertConfig,
) -> Result<Vec<TransformResult>, ConvertError> {
    if !file.has_pdf_magic() {
        return Err(ConvertError::NotAPdf {
            name: file.name.clone(),
            magic: file.magic(),
        });
    }

    let name = file.name.clone();
    let scale = config.scale;

    // ── Render all pages inside one blocking task ────────────────────────
    // pdfium keeps per-document state, so pages of one document are
    // rendered from a single thread; the per-page encodes below fan out.
    let rendered = tokio::task::spawn_blocking(move || render_all_pages(&file, scale))
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {e}")))??;

    let total = rendered.len();
    info!("Rendered {} page(s) of '{}' at {}x scale", total, name, scale);
    if let Some(ref cb) = config.progress {
        cb.on_convert_start(total);
    }

    // ── Encode pages concurrently ────────────────────────────────────────
    let quality = config.jpeg_quality;
    let mut results: Vec<TransformResult> = stream::iter(rendered.into_iter().map(
        |(idx, surface)| {
            let progress = config.progress.clone();
            async move {
                let entry_name = format!("page-{}.{}", idx + 1, format.ext());
                let encode_name = entry_name.clone();
                let result = match surface {
                    Err(detail) => TransformResult::skipped(
                        idx,
                        encode_name,
                        ItemError::RenderFailed { page: idx + 1, detail },
                    ),
                    Ok(surface) => {
                        let encoded = tokio::task::spawn_blocking(move || {
                            encode_surface(&surface, format, quality)
                        })
                        .await;
                        match encoded {
                            Ok(Ok(bytes)) => TransformResult::ok(idx, entry_name, bytes),
                            Ok(Err(e)) => {
                                warn!("Page {} encode failed: {}", idx + 1, e);
                                TransformResult::skipped(
                                    idx,
                                    encode_name,
                                    ItemError::RenderFailed {
                                        page: idx + 1,
                                        detail: format!("encoding failed: {e}"),
                                    },
                                )
                            }
                            Err(e) => TransformResult::skipped(
                                idx,
                                encode_name,
                                ItemError::RenderFailed {
                                    page: idx + 1,
                                    detail: format!("encode task panicked: {e}"),
                                },
                            ),
                        }
                    }
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
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Restore page order: completion order is unconstrained.
    results.sort_by_key(|r| r.index);
    Ok(results)
}

/// Page surface or the reason it could not be produced.
type PageSurface = Result<DynamicImage, String>;

/// Blocking implementation: open the document and render every page.
///
/// Returns one `(page_index_0based, surface)` entry per page, failures
/// included, so the caller can account for skipped pages.
fn render_all_pages(
    file: &SourceFile,
    scale: f32,
) -> Result<Vec<(usize, PageSurface)>, ConvertError> {
    // pdfium opens documents from a filesystem path; stage the bytes
    // through a tempfile that is cleaned up when this function returns.
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ConvertError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(&file.bytes)
        .map_err(|e| ConvertError::Internal(format!("tempfile write: {e}")))?;

    render_from_path(tmp.path(), &file.name, scale)
}

fn render_from_path(
    path: &Path,
    name: &str,
    scale: f32,
) -> Result<Vec<(usize, PageSurface)>, ConvertError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| ConvertError::CorruptPdf {
            name: name.to_string(),
            detail: format!("{e:?}"),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

    let pages = document.pages();
    let mut surfaces = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        match page.render_with_config(&render_config) {
            Ok(bitmap) => {
                let surface = bitmap.as_image();
                debug!(
                    "Rendered page {} -> {}x{} px",
                    idx + 1,
                    surface.width(),
                    surface.height()
                );
                surfaces.push((idx, Ok(surface)));
            }
            Err(e) => {
                warn!("Page {} of '{}' failed to render: {:?}", idx + 1, name, e);
                surfaces.push((idx, Err(format!("{e:?}"))));
            }
        }
    }

    Ok(surfaces)
}
