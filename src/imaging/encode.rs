//! Output encoders for finished cards.
//!
//! | Output | Crate | Notes |
//! |---|---|---|
//! | Template card | `png` | indexed when ≤ 256 colours, RGB otherwise |
//! | Photo card | `jpeg-encoder` | progressive, optimized Huffman tables |

use super::params::{PngParams, Quality};
use crate::config::PngCompression;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("PNG encode failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("JPEG encode failed: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),
    #[error("{width}x{height} buffer does not match {len} bytes of pixel data")]
    BufferSize { width: u32, height: u32, len: usize },
    #[error("{width}x{height} exceeds the JPEG size limit")]
    TooLarge { width: u32, height: u32 },
}

/// Encode opaque RGBA pixels as PNG. Alpha is discarded.
pub fn encode_png(
    rgba: &[u8],
    width: u32,
    height: u32,
    params: PngParams,
) -> Result<Vec<u8>, EncodeError> {
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(EncodeError::BufferSize {
            width,
            height,
            len: rgba.len(),
        });
    }

    let indexed = if params.palette {
        index_colors(rgba)
    } else {
        None
    };

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(match params.compression {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        });

        match indexed {
            Some((palette, indices)) => {
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_palette(palette);
                let mut writer = encoder.write_header()?;
                writer.write_image_data(&indices)?;
                writer.finish()?;
            }
            None => {
                encoder.set_color(png::ColorType::Rgb);
                let rgb: Vec<u8> = rgba
                    .chunks_exact(4)
                    .flat_map(|p| [p[0], p[1], p[2]])
                    .collect();
                let mut writer = encoder.write_header()?;
                writer.write_image_data(&rgb)?;
                writer.finish()?;
            }
        }
    }
    Ok(out)
}

/// Exact palette for images with at most 256 distinct colours.
fn index_colors(rgba: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(rgba.len() / 4);

    for px in rgba.chunks_exact(4) {
        let color = [px[0], px[1], px[2]];
        let index = match lookup.get(&color) {
            Some(&i) => i,
            None => {
                if lookup.len() == 256 {
                    return None;
                }
                let i = lookup.len() as u8;
                lookup.insert(color, i);
                palette.extend_from_slice(&color);
                i
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

/// Encode RGB pixels as a progressive JPEG.
pub fn encode_jpeg(
    rgb: &[u8],
    width: u32,
    height: u32,
    quality: Quality,
) -> Result<Vec<u8>, EncodeError> {
    if rgb.len() != width as usize * height as usize * 3 {
        return Err(EncodeError::BufferSize {
            width,
            height,
            len: rgb.len(),
        });
    }
    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(EncodeError::TooLarge { width, height }),
    };

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality.value() as u8);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder.encode(rgb, w, h, jpeg_encoder::ColorType::Rgb)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_rgba(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        (0..width * height)
            .flat_map(|_| [color[0], color[1], color[2], 255])
            .collect()
    }

    fn decoded_color_type(bytes: &[u8]) -> png::ColorType {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        reader.info().color_type
    }

    #[test]
    fn few_colors_use_palette() {
        let mut px = solid_rgba(20, 10, [248, 248, 247]);
        px[0..4].copy_from_slice(&[47, 124, 171, 255]);

        let bytes = encode_png(&px, 20, 10, PngParams::default()).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decoded_color_type(&bytes), png::ColorType::Indexed);

        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(0, 0).0, [47, 124, 171]);
        assert_eq!(img.get_pixel(5, 5).0, [248, 248, 247]);
    }

    #[test]
    fn many_colors_fall_back_to_rgb() {
        let px: Vec<u8> = (0..32u32 * 32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8 * 40, 7, 255])
            .collect();
        let bytes = encode_png(&px, 32, 32, PngParams::default()).unwrap();
        assert_eq!(decoded_color_type(&bytes), png::ColorType::Rgb);

        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(3, 0).0, [3, 0, 7]);
    }

    #[test]
    fn palette_can_be_disabled() {
        let px = solid_rgba(4, 4, [1, 2, 3]);
        let params = PngParams {
            compression: PngCompression::Fast,
            palette: false,
        };
        let bytes = encode_png(&px, 4, 4, params).unwrap();
        assert_eq!(decoded_color_type(&bytes), png::ColorType::Rgb);
    }

    #[test]
    fn exactly_256_colors_stay_indexed() {
        let px: Vec<u8> = (0..256u32).flat_map(|i| [i as u8, 0, 0, 255]).collect();
        let bytes = encode_png(&px, 16, 16, PngParams::default()).unwrap();
        assert_eq!(decoded_color_type(&bytes), png::ColorType::Indexed);
    }

    #[test]
    fn png_rejects_short_buffer() {
        let err = encode_png(&[0; 10], 4, 4, PngParams::default()).unwrap_err();
        assert!(matches!(err, EncodeError::BufferSize { .. }));
    }

    #[test]
    fn jpeg_roundtrips_dimensions() {
        let rgb = vec![200u8; 64 * 32 * 3];
        let bytes = encode_jpeg(&rgb, 64, 32, Quality::new(85)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (64, 32));
    }

    #[test]
    fn jpeg_rejects_oversized_canvas() {
        let err = encode_jpeg(&[], 70_000, 0, Quality::default()).unwrap_err();
        assert!(matches!(err, EncodeError::TooLarge { .. }));
    }
}
