//! The variation rendering utility.
//!
//! [`render_variations`] consumes one [`RenditionRequest`]: it reads the
//! source file through the storage backend, decodes it at most once, and
//! writes every configured variation that is missing (or all of them when
//! `replace` is set). Variations are re-encoded in the source's own format.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory_with_format` |
//! | Fit-resize | `image::DynamicImage::resize` (Lanczos3, never upscales) |
//! | Crop-resize | `image::DynamicImage::resize_to_fill` (Lanczos3) |
//! | Encode | `image` codecs; JPEG at quality 90 |
//!
//! A missing source surfaces as [`RenderError::MissingSource`]; callers
//! decide whether that is fatal (the batch renderer escalates it unless
//! `--ignore-missing` is set).

use crate::field::{Variation, variation_file_name};
use crate::storage::Storage;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::io::Cursor;
use thiserror::Error;

/// JPEG encoding quality for rendered variations.
const JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("source file not found: {0}")]
    MissingSource(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot determine image format of {0:?}")]
    UnknownFormat(String),
    #[error("failed to decode {0}: {1}")]
    Decode(String, #[source] image::ImageError),
    #[error("failed to encode {0}: {1}")]
    Encode(String, #[source] image::ImageError),
}

/// Transient parameter bundle for rendering one source file's variations.
/// Constructed per record, consumed once, never persisted.
#[derive(Clone, Copy)]
pub struct RenditionRequest<'a> {
    pub file_name: &'a str,
    pub variations: &'a [Variation],
    pub replace: bool,
    pub storage: &'a dyn Storage,
}

/// Render every configured variation of the request's source file.
///
/// Existing variation files are left alone unless `replace` is set, which
/// makes repeat runs on an unchanged dataset error-free. The source is read
/// unconditionally (so a missing source is reported even when every
/// variation already exists) but decoded only if something needs rendering.
///
/// Returns the number of variation files written.
pub fn render_variations(request: &RenditionRequest<'_>) -> Result<usize, RenderError> {
    let format = source_format(request.file_name)?;
    let bytes = match request.storage.read(request.file_name) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RenderError::MissingSource(request.file_name.to_string()));
        }
        Err(e) => return Err(RenderError::Io(e)),
    };

    let mut decoded: Option<DynamicImage> = None;
    let mut written = 0;

    for variation in request.variations {
        let target = variation_file_name(request.file_name, &variation.name);
        if !request.replace && request.storage.exists(&target) {
            debug!("{target}: exists, skipping");
            continue;
        }

        if decoded.is_none() {
            decoded = Some(
                image::load_from_memory_with_format(&bytes, format)
                    .map_err(|e| RenderError::Decode(request.file_name.to_string(), e))?,
            );
        }
        let source = decoded.as_ref().unwrap();

        let resized = resize_variation(source, variation);
        let data = encode(&resized, format, &target)?;
        request.storage.write(&target, &data)?;
        debug!("{target}: written ({}x{})", resized.width(), resized.height());
        written += 1;
    }

    Ok(written)
}

/// Scale a source image for one variation spec.
///
/// Crop variations fill-resize and center-crop to the exact box. Plain
/// variations fit within the box preserving aspect ratio and are never
/// upscaled beyond the source dimensions.
fn resize_variation(source: &DynamicImage, variation: &Variation) -> DynamicImage {
    if variation.crop {
        source.resize_to_fill(variation.width, variation.height, FilterType::Lanczos3)
    } else if source.width() > variation.width || source.height() > variation.height {
        source.resize(variation.width, variation.height, FilterType::Lanczos3)
    } else {
        source.clone()
    }
}

/// Map a file name's extension to its image format.
fn source_format(name: &str) -> Result<ImageFormat, RenderError> {
    let extension = name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.contains('/') && *ext != name)
        .unwrap_or("");
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(RenderError::UnknownFormat(name.to_string())),
    }
}

/// Encode an image in the given format, returning the encoded bytes.
fn encode(img: &DynamicImage, format: ImageFormat, target: &str) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
        }
        _ => img.write_to(&mut buffer, format),
    };
    result.map_err(|e| RenderError::Encode(target.to_string(), e))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use image::RgbImage;

    /// Encode a synthetic gradient image as PNG bytes.
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn variations() -> Vec<Variation> {
        vec![
            Variation {
                name: "thumbnail".into(),
                width: 40,
                height: 30,
                crop: true,
            },
            Variation {
                name: "medium".into(),
                width: 100,
                height: 100,
                crop: false,
            },
        ]
    }

    #[test]
    fn renders_every_missing_variation() {
        let storage = MemoryStorage::new();
        storage.insert("photos/a.png", png_bytes(200, 160));
        let variations = variations();

        let written = render_variations(&RenditionRequest {
            file_name: "photos/a.png",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap();

        assert_eq!(written, 2);
        assert!(storage.exists("photos/a.thumbnail.png"));
        assert!(storage.exists("photos/a.medium.png"));

        // Crop variation hits the exact box
        let thumb = image::load_from_memory(&storage.read("photos/a.thumbnail.png").unwrap())
            .unwrap();
        assert_eq!((thumb.width(), thumb.height()), (40, 30));

        // Plain variation fits within the box, aspect preserved
        let medium =
            image::load_from_memory(&storage.read("photos/a.medium.png").unwrap()).unwrap();
        assert_eq!((medium.width(), medium.height()), (100, 80));
    }

    #[test]
    fn plain_variation_never_upscales() {
        let storage = MemoryStorage::new();
        storage.insert("small.png", png_bytes(50, 40));
        let variations = vec![Variation {
            name: "medium".into(),
            width: 400,
            height: 300,
            crop: false,
        }];

        render_variations(&RenditionRequest {
            file_name: "small.png",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap();

        let out = image::load_from_memory(&storage.read("small.medium.png").unwrap()).unwrap();
        assert_eq!((out.width(), out.height()), (50, 40));
    }

    #[test]
    fn existing_variations_are_skipped_without_replace() {
        let storage = MemoryStorage::new();
        storage.insert("a.png", png_bytes(100, 100));
        storage.insert("a.thumbnail.png", b"sentinel".to_vec());
        let variations = variations();

        let written = render_variations(&RenditionRequest {
            file_name: "a.png",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap();

        assert_eq!(written, 1);
        // The pre-existing file was not touched
        assert_eq!(storage.read("a.thumbnail.png").unwrap(), b"sentinel");
        assert!(storage.exists("a.medium.png"));
    }

    #[test]
    fn replace_rewrites_existing_variations() {
        let storage = MemoryStorage::new();
        storage.insert("a.png", png_bytes(100, 100));
        storage.insert("a.thumbnail.png", b"sentinel".to_vec());
        let variations = variations();

        let written = render_variations(&RenditionRequest {
            file_name: "a.png",
            variations: &variations,
            replace: true,
            storage: &storage,
        })
        .unwrap();

        assert_eq!(written, 2);
        assert_ne!(storage.read("a.thumbnail.png").unwrap(), b"sentinel");
    }

    #[test]
    fn missing_source_is_its_own_error_kind() {
        let storage = MemoryStorage::new();
        let variations = variations();

        let err = render_variations(&RenditionRequest {
            file_name: "gone.png",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap_err();

        assert!(matches!(err, RenderError::MissingSource(name) if name == "gone.png"));
    }

    #[test]
    fn missing_source_reported_even_when_variations_exist() {
        let storage = MemoryStorage::new();
        storage.insert("a.thumbnail.png", vec![0]);
        storage.insert("a.medium.png", vec![0]);
        let variations = variations();

        let err = render_variations(&RenditionRequest {
            file_name: "a.png",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap_err();

        assert!(matches!(err, RenderError::MissingSource(_)));
    }

    #[test]
    fn unsupported_extension_errors() {
        let storage = MemoryStorage::new();
        storage.insert("doc.pdf", vec![0]);
        let variations = variations();

        let err = render_variations(&RenditionRequest {
            file_name: "doc.pdf",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap_err();
        assert!(matches!(err, RenderError::UnknownFormat(_)));

        let err = render_variations(&RenditionRequest {
            file_name: "no-extension",
            variations: &variations,
            replace: false,
            storage: &storage,
        })
        .unwrap_err();
        assert!(matches!(err, RenderError::UnknownFormat(_)));
    }

    #[test]
    fn empty_variation_list_touches_nothing() {
        let storage = MemoryStorage::new();
        storage.insert("a.png", png_bytes(10, 10));

        let written = render_variations(&RenditionRequest {
            file_name: "a.png",
            variations: &[],
            replace: false,
            storage: &storage,
        })
        .unwrap();

        assert_eq!(written, 0);
        assert_eq!(storage.names(), ["a.png"]);
    }
}
