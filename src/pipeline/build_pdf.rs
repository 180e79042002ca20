//! Image → PDF assembly via `lopdf`.
//!
//! Each input image becomes one page sized to its pixel dimensions, in
//! input order. JPEG bytes are embedded untouched behind a `DCTDecode`
//! filter; everything else is decoded, flattened to RGB and re-compressed
//! with `FlateDecode` (zlib).
//!
//! A file that fails to decode is skipped and the document is built from
//! the survivors. Only an empty result set or a PDF serialisation failure
//! is fatal.

use crate::error::{ConvertError, ItemError};
use crate::input::SourceFile;
use crate::output::TransformResult;
use crate::progress::ProgressCallback;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use tracing::{debug, warn};

/// One image prepared for embedding.
struct EmbeddedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    filter: &'static str,
    color_space: &'static str,
}

/// Build a single PDF from `files`, one page per image, preserving input
/// order. Returns the serialised document bytes plus one
/// [`TransformResult`] per input so callers can report skipped files.
pub fn build_pdf(files: &[SourceFile]) -> Result<(Vec<u8>, Vec<TransformResult>), ConvertError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids: Vec<Object> = Vec::with_capacity(files.len());
    let mut results: Vec<TransformResult> = Vec::with_capacity(files.len());

    for (idx, file) in files.iter().enumerate() {
        let outcome = embed_image(file)
            .map_err(|detail| ItemError::DecodeFailed {
                name: file.name.clone(),
                detail,
            })
            .and_then(|embedded| {
                add_page(&mut doc, pages_id, &embedded)
                    .map(|page_id| (embedded, page_id))
                    .map_err(|detail| ItemError::EncodeFailed {
                        name: file.name.clone(),
                        detail,
                    })
            });
        match outcome {
            Ok((embedded, page_id)) => {
                debug!(
                    "Embedded '{}' as page {} ({}x{} px, {})",
                    file.name,
                    idx + 1,
                    embedded.width,
                    embedded.height,
                    embedded.filter
                );
                page_ids.push(page_id.into());
                results.push(TransformResult::ok(idx, file.name.clone(), Vec::new()));
            }
            Err(error) => {
                warn!("Skipping '{}': {}", file.name, error);
                results.push(TransformResult::skipped(idx, file.name.clone(), error));
            }
        }
    }

    if page_ids.is_empty() {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref().map(|e| e.to_string()))
            .unwrap_or_default();
        return Err(ConvertError::NoOutput {
            total: files.len(),
            first_error,
        });
    }

    let count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ConvertError::DocumentWrite {
            detail: e.to_string(),
        })?;

    Ok((bytes, results))
}

/// Notify the progress callback about per-file outcomes after the fact.
/// PDF assembly is synchronous, so the callback fires as one sweep.
pub fn report_results(results: &[TransformResult], progress: Option<&ProgressCallback>) {
    let Some(cb) = progress else { return };
    let total = results.len();
    cb.on_convert_start(total);
    for r in results {
        match &r.error {
            None => cb.on_item_complete(r.index, total, &r.output_name),
            Some(e) => cb.on_item_skipped(r.index, total, e.to_string()),
        }
    }
}

fn embed_image(file: &SourceFile) -> Result<EmbeddedImage, String> {
    if is_jpeg(&file.bytes) {
        // JPEG streams are valid DCTDecode payloads as-is; only the pixel
        // dimensions and colour model need decoding.
        let img = image::load_from_memory(&file.bytes).map_err(|e| e.to_string())?;
        let (width, height) = img.dimensions();
        let color_space = if img.color().has_color() {
            "DeviceRGB"
        } else {
            "DeviceGray"
        };
        return Ok(EmbeddedImage {
            width,
            height,
            data: file.bytes.clone(),
            filter: "DCTDecode",
            color_space,
        });
    }

    // PNG (and anything else image can open): flatten to 8-bit RGB and
    // zlib-compress the raw samples.
    let img = image::load_from_memory(&file.bytes).map_err(|e| e.to_string())?;
    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw()).map_err(|e| e.to_string())?;
    let data = encoder.finish().map_err(|e| e.to_string())?;

    Ok(EmbeddedImage {
        width,
        height,
        data,
        filter: "FlateDecode",
        color_space: "DeviceRGB",
    })
}

fn add_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    img: &EmbeddedImage,
) -> Result<lopdf::ObjectId, String> {
    // Serialise the page content first: a failure here must skip the
    // whole page, not leave a blank one behind.
    let w = img.width as f32;
    let h = img.height as f32;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| e.to_string())?;

    // The payload is already compressed; lopdf must not re-encode it.
    let xobject = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => img.width as i64,
            "Height" => img.height as i64,
            "ColorSpace" => img.color_space,
            "BitsPerComponent" => 8,
            "Filter" => img.filter,
        },
        img.data.clone(),
    )
    .with_compression(false);
    let xobject_id = doc.add_object(xobject);
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => xobject_id },
        },
    }))
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([10, 200, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb([120, 60, 90]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn builds_document_with_one_page_per_image() {
        let files = vec![
            SourceFile::new("a.png", png_bytes(4, 3)),
            SourceFile::new("b.jpg", jpeg_bytes(8, 5)),
        ];
        let (bytes, results) = build_pdf(&files).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_skipped()));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn pages_follow_input_order_and_pixel_dimensions() {
        let files = vec![
            SourceFile::new("wide.png", png_bytes(10, 2)),
            SourceFile::new("tall.png", png_bytes(2, 10)),
        ];
        let (bytes, _) = build_pdf(&files).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        let boxes: Vec<Vec<f32>> = doc
            .page_iter()
            .map(|id| {
                let page = doc.get_dictionary(id).unwrap();
                page.get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|o| o.as_float().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(boxes[0], vec![0.0, 0.0, 10.0, 2.0]);
        assert_eq!(boxes[1], vec![0.0, 0.0, 2.0, 10.0]);
    }

    #[test]
    fn undecodable_file_is_skipped_not_fatal() {
        let files = vec![
            SourceFile::new("ok.png", png_bytes(4, 4)),
            SourceFile::new("junk.png", vec![0, 1, 2, 3]),
        ];
        let (bytes, results) = build_pdf(&files).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(results[1].is_skipped());
    }

    #[test]
    fn every_page_carries_a_drawing_content_stream() {
        // A page whose content failed to serialise must be skipped, never
        // emitted blank.
        let files = vec![SourceFile::new("a.jpg", jpeg_bytes(6, 4))];
        let (bytes, results) = build_pdf(&files).unwrap();
        assert!(!results[0].is_skipped());

        let doc = Document::load_mem(&bytes).unwrap();
        for id in doc.page_iter() {
            let content = doc.get_page_content(id).unwrap();
            let ops = Content::decode(&content).unwrap().operations;
            assert!(ops.iter().any(|op| op.operator == "Do"));
        }
    }

    #[test]
    fn all_undecodable_is_fatal() {
        let files = vec![SourceFile::new("junk.png", vec![0, 1, 2, 3])];
        let err = build_pdf(&files).unwrap_err();
        assert!(matches!(err, ConvertError::NoOutput { total: 1, .. }));
    }
}
