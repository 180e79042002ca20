//! Configuration types for batch conversion.
//!
//! All conversion behaviour is controlled through [`ConvertConfig`], built
//! via its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across widget instances and to diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A constructor with ten positional fields is unreadable and breaks on
//! every new field. The builder lets callers set only what they care about
//! and rely on documented defaults for the rest.

use crate::error::ConvertError;
use crate::progress::BatchProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a conversion batch.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use batchconv::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .concurrency(4)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConvertConfig {
    /// Upscaling factor applied when rasterising PDF pages. Default: 2.0.
    ///
    /// 2× is the point where rendered text survives JPEG compression
    /// legibly; larger factors grow memory quadratically for little
    /// visible gain on screen-resolution output.
    pub scale: f32,

    /// Number of per-item transforms in flight at once. Default: 8.
    ///
    /// Decode and encode are CPU-bound and run on the blocking thread
    /// pool; 8 keeps a typical desktop saturated without ballooning peak
    /// memory on large image batches. Ordering of the output never
    /// depends on this value — results are re-keyed by input position.
    pub concurrency: usize,

    /// JPEG encoder quality (1–100). Default: 90.
    pub jpeg_quality: u8,

    /// Target resolution for [`crate::ConversionMode::ResizeImage`].
    ///
    /// Required when running that mode; ignored by every other mode.
    pub resize: Option<ResizeSpec>,

    /// Usage-log endpoint, e.g. `https://example.com/backend/log.php`.
    ///
    /// When `None`, no usage reporting happens at all.
    pub report_url: Option<String>,

    /// Number of cosmetic staging-progress ticks fired by
    /// [`crate::batch::Batch::stage`]. Default: 5.
    ///
    /// Purely visual feedback before the real conversion starts; it never
    /// gates the staged state.
    pub stage_ticks: u32,

    /// Delay between staging ticks in milliseconds. Default: 0.
    ///
    /// Zero makes staging instantaneous; a front end that wants a visible
    /// staging animation opts into a per-tick pause (the CLI uses 300 ms).
    pub stage_tick_ms: u64,

    /// Progress callback invoked as items complete. Default: none.
    pub progress: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            concurrency: 8,
            jpeg_quality: 90,
            resize: None,
            report_url: None,
            stage_ticks: 5,
            stage_tick_ms: 0,
            progress: None,
        }
    }
}

impl fmt::Debug for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertConfig")
            .field("scale", &self.scale)
            .field("concurrency", &self.concurrency)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("resize", &self.resize)
            .field("report_url", &self.report_url)
            .field("stage_ticks", &self.stage_ticks)
            .field("stage_tick_ms", &self.stage_tick_ms)
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn resize(mut self, spec: ResizeSpec) -> Self {
        self.config.resize = Some(spec);
        self
    }

    pub fn report_url(mut self, url: impl Into<String>) -> Self {
        self.config.report_url = Some(url.into());
        self
    }

    pub fn stage_ticks(mut self, ticks: u32) -> Self {
        self.config.stage_ticks = ticks;
        self
    }

    pub fn stage_tick_ms(mut self, ms: u64) -> Self {
        self.config.stage_tick_ms = ms;
        self
    }

    pub fn progress(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "jpeg_quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if !(c.scale > 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "scale must be positive, got {}",
                c.scale
            )));
        }
        Ok(self.config)
    }
}

// ── Resize specification ─────────────────────────────────────────────────

/// Target resolution for the resize mode.
///
/// The aspect ratio is captured once, at construction, from the intrinsic
/// dimensions of the first accepted file. When `lock_aspect` is on,
/// editing one dimension recomputes the other from that *original* ratio —
/// never from the current width/height, so repeated edits cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeSpec {
    width: u32,
    height: u32,
    lock_aspect: bool,
    /// Original width / height, captured at construction.
    aspect: f64,
}

impl ResizeSpec {
    /// Create a spec with an explicit target resolution; aspect unlocked.
    pub fn new(width: u32, height: u32) -> Result<Self, ConvertError> {
        if width == 0 || height == 0 {
            return Err(ConvertError::InvalidConfig(format!(
                "resize dimensions must be ≥ 1, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            lock_aspect: false,
            aspect: f64::from(width) / f64::from(height),
        })
    }

    /// Create a spec from a file's intrinsic dimensions; aspect locked.
    ///
    /// This is the starting state after upload: the target equals the
    /// source resolution and the lock preserves its shape under edits.
    pub fn from_intrinsic(width: u32, height: u32) -> Result<Self, ConvertError> {
        let mut spec = Self::new(width, height)?;
        spec.lock_aspect = true;
        Ok(spec)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn lock_aspect(&self) -> bool {
        self.lock_aspect
    }

    /// Set the target width; recomputes height from the captured aspect
    /// ratio when the lock is on.
    pub fn set_width(&mut self, width: u32) {
        self.width = width.max(1);
        if self.lock_aspect {
            self.height = ((f64::from(self.width) / self.aspect).round() as u32).max(1);
        }
    }

    /// Set the target height; recomputes width from the captured aspect
    /// ratio when the lock is on.
    pub fn set_height(&mut self, height: u32) {
        self.height = height.max(1);
        if self.lock_aspect {
            self.width = ((f64::from(self.height) * self.aspect).round() as u32).max(1);
        }
    }

    /// Toggle the aspect lock. The captured ratio is left untouched, so
    /// re-enabling the lock resumes from the original shape.
    pub fn set_lock_aspect(&mut self, lock: bool) {
        self.lock_aspect = lock;
    }

    /// Filename suffix for resized outputs, e.g. `_640x480`.
    pub fn suffix(&self) -> String {
        format!("_{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_out_of_range_values() {
        let config = ConvertConfig::builder()
            .concurrency(0)
            .jpeg_quality(250)
            .scale(100.0)
            .build()
            .expect("clamped values must build");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.jpeg_quality, 100);
        assert!(config.scale <= 8.0);
    }

    #[test]
    fn default_config_builds() {
        let config = ConvertConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.scale, 2.0);
        assert!(config.resize.is_none());
        assert!(config.report_url.is_none());
    }

    #[test]
    fn resize_spec_rejects_zero_dimensions() {
        assert!(ResizeSpec::new(0, 100).is_err());
        assert!(ResizeSpec::new(100, 0).is_err());
    }

    #[test]
    fn locked_width_edit_recomputes_height() {
        // 800×600, set width 400 → height 300
        let mut spec = ResizeSpec::from_intrinsic(800, 600).unwrap();
        assert!(spec.lock_aspect());
        spec.set_width(400);
        assert_eq!(spec.height(), 300);
    }

    #[test]
    fn lock_toggle_keeps_original_aspect() {
        // Toggling the lock off and back on, then editing height, must
        // recompute width from the ORIGINAL 800:600 ratio, not from
        // whatever the dimensions were while unlocked.
        let mut spec = ResizeSpec::from_intrinsic(800, 600).unwrap();
        spec.set_lock_aspect(false);
        spec.set_width(123); // distorts freely while unlocked
        assert_eq!(spec.height(), 600);
        spec.set_lock_aspect(true);
        spec.set_height(150);
        assert_eq!(spec.width(), 200); // 800 * 150 / 600
    }

    #[test]
    fn unlocked_edits_are_independent() {
        let mut spec = ResizeSpec::new(512, 512).unwrap();
        spec.set_width(1024);
        assert_eq!(spec.height(), 512);
        spec.set_height(256);
        assert_eq!(spec.width(), 1024);
    }

    #[test]
    fn suffix_embeds_dimensions() {
        let spec = ResizeSpec::new(640, 480).unwrap();
        assert_eq!(spec.suffix(), "_640x480");
    }
}
