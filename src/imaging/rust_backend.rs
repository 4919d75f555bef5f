//! Pure Rust compositing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Crop anchor | [`saliency::attention_offset`](super::saliency::attention_offset) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Background fill | `image::imageops::overlay` onto an opaque canvas |
//! | Encode → JPEG | `jpeg-encoder` via [`encode_jpeg`](super::encode::encode_jpeg) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{ProcessingStrategy, center_offsets, crop_dimensions, fit_inside};
use super::encode::encode_jpeg;
use super::params::ComposeParams;
use super::saliency::{attention_offset, center_offset};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageReader, Rgba, RgbaImage};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn image_error(path: &Path, err: ImageError) -> BackendError {
    match err {
        ImageError::IoError(e) => BackendError::io(path, e),
        other => BackendError::failed(path, format!("Failed to decode: {other}")),
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(|e| BackendError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| BackendError::io(path, e))?
        .decode()
        .map_err(|e| image_error(path, e))
}

/// Apply the strategy's crop, if any.
fn crop_region(img: DynamicImage, strategy: ProcessingStrategy, smart: bool) -> DynamicImage {
    match strategy {
        ProcessingStrategy::Fit => img,
        ProcessingStrategy::Crop {
            target_aspect_ratio,
        } => {
            let (width, height) = (img.width(), img.height());
            let (crop_w, crop_h) = crop_dimensions(width, height, target_aspect_ratio);
            if (crop_w, crop_h) == (width, height) {
                return img;
            }
            let (x, y) = if smart {
                attention_offset(&img.to_rgb8(), crop_w, crop_h)
            } else {
                center_offset(width, height, crop_w, crop_h)
            };
            img.crop_imm(x, y, crop_w, crop_h)
        }
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| image_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn compose(&self, params: &ComposeParams) -> Result<Vec<u8>, BackendError> {
        let source = &params.source;
        let decoded = load_image(source)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(BackendError::failed(source, "image has no pixels"));
        }

        let region = crop_region(decoded, params.strategy, params.smart_crop).to_rgba8();
        let canvas = params.canvas;
        let (fit_w, fit_h) = fit_inside(region.width(), region.height(), canvas);
        let photo = if (fit_w, fit_h) == region.dimensions() {
            region
        } else {
            imageops::resize(&region, fit_w, fit_h, FilterType::Lanczos3)
        };

        let (left, top) = center_offsets(fit_w, fit_h, canvas);
        let [r, g, b] = params.background;
        let mut card = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([r, g, b, 255]));
        imageops::overlay(&mut card, &photo, left as i64, top as i64);

        let rgb = DynamicImage::ImageRgba8(card).to_rgb8();
        encode_jpeg(rgb.as_raw(), canvas.width, canvas.height, params.quality)
            .map_err(|e| BackendError::failed(source, e.to_string()))
    }
}
