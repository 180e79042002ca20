//! Progress-callback trait for per-item batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConvertConfigBuilder::progress`] to receive events as
//! the pipeline stages files and processes each item.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, or a terminal progress
//! bar without the library knowing how the host application communicates.
//! The trait is `Send + Sync` so it works correctly when items are
//! transformed concurrently.

use std::sync::Arc;

/// Called by the staging and conversion pipeline as the batch progresses.
///
/// Implementations must be `Send + Sync` (items may complete concurrently
/// on blocking-pool threads). All methods have default no-op
/// implementations so callers only override what they care about.
///
/// For the PDF rasterisation modes `total` counts pages of the single
/// input document; for every other mode it counts input files.
pub trait BatchProgressCallback: Send + Sync {
    /// Cosmetic staging progression (0–100). Fired a fixed number of
    /// times by [`crate::batch::Batch::stage`]; decoupled from any real
    /// I/O and never load-bearing.
    fn on_stage_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called once when the item count of the batch is known.
    fn on_convert_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when an item's transform succeeds.
    ///
    /// `index` is the item's 0-based position in the input order, which
    /// may differ from completion order under concurrency.
    fn on_item_complete(&self, index: usize, total: usize, output_name: &str) {
        let _ = (index, total, output_name);
    }

    /// Called when an item is skipped after a local decode/encode failure.
    fn on_item_skipped(&self, index: usize, total: usize, error: String) {
        let _ = (index, total, error);
    }

    /// Called once after every item has been attempted, before the
    /// download is assembled.
    fn on_convert_complete(&self, total: usize, converted: usize) {
        let _ = (total, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConvertConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
