//! Conversion modes and their per-mode contracts.
//!
//! A [`ConversionMode`] is fixed when a widget (or CLI invocation) is
//! created and determines everything else about the batch: which file
//! extensions pass validation, whether a single file or many are accepted,
//! whether the outputs are bundled into an archive or merged into one
//! document, the suggested download filename, and which usage counter the
//! reporter increments.

use crate::config::ResizeSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five supported conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionMode {
    /// Rasterise every page of a single PDF to JPG images.
    RasterizeToJpg,
    /// Rasterise every page of a single PDF to PNG images.
    RasterizeToPng,
    /// Merge JPG/PNG images into one PDF, one page per image.
    ImagesToPdf,
    /// Re-encode each image to the opposite format (png ↔ jpeg).
    SwapImageFormat,
    /// Resample each image to a target resolution, keeping its format.
    ResizeImage,
}

/// Shape of the emitted download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    /// A zip archive with one entry per successful [`crate::output::TransformResult`].
    Archive,
    /// A single merged document produced cumulatively by the engine.
    SingleDocument,
}

impl ConversionMode {
    /// Lower-case filename extensions accepted by this mode.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ConversionMode::RasterizeToJpg | ConversionMode::RasterizeToPng => &["pdf"],
            ConversionMode::ImagesToPdf
            | ConversionMode::SwapImageFormat
            | ConversionMode::ResizeImage => &["jpg", "jpeg", "png"],
        }
    }

    /// Human-readable description of the accepted input types, used in
    /// validation error messages.
    pub fn allowed_label(&self) -> &'static str {
        match self {
            ConversionMode::RasterizeToJpg | ConversionMode::RasterizeToPng => "PDF",
            _ => "JPG/PNG",
        }
    }

    /// Whether this mode accepts exactly one input file.
    ///
    /// The PDF rasterisation modes operate on one document; a multi-file
    /// drop is rejected outright rather than silently truncated.
    pub fn single_file(&self) -> bool {
        matches!(
            self,
            ConversionMode::RasterizeToJpg | ConversionMode::RasterizeToPng
        )
    }

    /// How the batch's outputs are bundled.
    pub fn container_kind(&self) -> ContainerKind {
        match self {
            ConversionMode::ImagesToPdf => ContainerKind::SingleDocument,
            _ => ContainerKind::Archive,
        }
    }

    /// Deterministic suggested filename for the emitted download.
    ///
    /// `resize` is consulted only by [`ConversionMode::ResizeImage`], whose
    /// archive name embeds the target dimensions.
    pub fn suggested_filename(&self, resize: Option<&ResizeSpec>) -> String {
        match self {
            ConversionMode::RasterizeToJpg => "converted_images.zip".to_string(),
            ConversionMode::RasterizeToPng => "converted_images_png.zip".to_string(),
            ConversionMode::ImagesToPdf => "converted.pdf".to_string(),
            ConversionMode::SwapImageFormat => "converted_images.zip".to_string(),
            ConversionMode::ResizeImage => match resize {
                Some(spec) => format!("resized_images_{}x{}.zip", spec.width(), spec.height()),
                None => "resized_images.zip".to_string(),
            },
        }
    }

    /// JSON field name of this mode's usage counter on the log endpoint.
    pub fn counter_field(&self) -> &'static str {
        match self {
            ConversionMode::RasterizeToJpg => "use_pdftojpg",
            ConversionMode::RasterizeToPng => "use_pdftopng",
            ConversionMode::ImagesToPdf => "use_imgtopdf",
            ConversionMode::SwapImageFormat => "use_changeimg",
            ConversionMode::ResizeImage => "use_imgresizer",
        }
    }

    /// Short display name for logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionMode::RasterizeToJpg => "PDF to JPG",
            ConversionMode::RasterizeToPng => "PDF to PNG",
            ConversionMode::ImagesToPdf => "JPG/PNG to PDF",
            ConversionMode::SwapImageFormat => "image format swap",
            ConversionMode::ResizeImage => "image resize",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
