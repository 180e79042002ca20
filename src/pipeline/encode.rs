//! Image encoding: raster surface → output buffer.
//!
//! One shared helper for every stage that turns a decoded surface back
//! into bytes. JPEG cannot carry an alpha channel, so surfaces are
//! flattened to RGB before JPEG encoding; PNG keeps whatever channels the
//! surface has.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Output raster formats supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    /// Filename extension for this format.
    pub fn ext(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Png => "png",
        }
    }

    /// The opposite format, for the swap mode.
    pub fn swapped(&self) -> RasterFormat {
        match self {
            RasterFormat::Jpeg => RasterFormat::Png,
            RasterFormat::Png => RasterFormat::Jpeg,
        }
    }

    /// Map a lower-cased filename extension to a format.
    pub fn from_ext(ext: &str) -> Option<RasterFormat> {
        match ext {
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "png" => Some(RasterFormat::Png),
            _ => None,
        }
    }
}

/// Encode a surface into the given format.
pub fn encode_surface(
    img: &DynamicImage,
    format: RasterFormat,
    jpeg_quality: u8,
) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        RasterFormat::Jpeg => {
            // Flatten alpha: the JPEG encoder rejects RGBA surfaces.
            let rgb = img.to_rgb8();
            let mut cursor = Cursor::new(&mut buf);
            let encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);
            rgb.write_with_encoder(encoder)?;
        }
    }
    debug!("Encoded {}x{} surface → {} bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn surface() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encodes_png_round_trip() {
        let bytes = encode_surface(&surface(), RasterFormat::Png, 90).expect("encode");
        let back = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((back.width(), back.height()), (8, 6));
    }

    #[test]
    fn encodes_rgba_surface_as_jpeg() {
        // Would fail without alpha flattening.
        let bytes = encode_surface(&surface(), RasterFormat::Jpeg, 90).expect("encode");
        let back = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).expect("decode");
        assert_eq!((back.width(), back.height()), (8, 6));
    }

    #[test]
    fn format_mapping() {
        assert_eq!(RasterFormat::from_ext("jpg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_ext("jpeg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_ext("png"), Some(RasterFormat::Png));
        assert_eq!(RasterFormat::from_ext("webp"), None);

        assert_eq!(RasterFormat::Jpeg.swapped(), RasterFormat::Png);
        assert_eq!(RasterFormat::Png.swapped(), RasterFormat::Jpeg);
        assert_eq!(RasterFormat::Jpeg.ext(), "jpg");
        assert_eq!(RasterFormat::Png.ext(), "png");
    }
}
