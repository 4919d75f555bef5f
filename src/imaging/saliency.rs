//! Attention-based crop anchoring.
//!
//! The source is downscaled to a small analysis size and every pixel is
//! scored for visual interest:
//!
//! | Signal | Measure |
//! |---|---|
//! | Edges | luminance difference to the left and upper neighbours |
//! | Saturation | `(max − min) / max` of the RGB channels |
//! | Skin tone | classic RGB skin rule |
//!
//! The crop window with the highest total score wins, found through a
//! summed-area table. Ties go to the window closest to the center, so a
//! featureless image is center-cropped.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Longer edge of the analysis image.
const ANALYSIS_SIZE: u32 = 128;

const EDGE_WEIGHT: f64 = 1.0;
const SATURATION_WEIGHT: f64 = 0.5;
const SKIN_WEIGHT: f64 = 0.8;

/// Top-left corner of the most salient `crop_width × crop_height` window.
pub fn attention_offset(img: &RgbImage, crop_width: u32, crop_height: u32) -> (u32, u32) {
    let (width, height) = img.dimensions();
    let crop_width = crop_width.min(width);
    let crop_height = crop_height.min(height);
    if crop_width == width && crop_height == height {
        return (0, 0);
    }

    let scale = (ANALYSIS_SIZE as f64 / width.max(height) as f64).min(1.0);
    let sw = ((width as f64 * scale).round() as u32).max(1);
    let sh = ((height as f64 * scale).round() as u32).max(1);
    let small = if scale < 1.0 {
        imageops::resize(img, sw, sh, FilterType::Triangle)
    } else {
        img.clone()
    };

    let table = SummedArea::new(&score_map(&small), sw as usize, sh as usize);
    let ww = ((crop_width as f64 * scale).round() as usize).clamp(1, sw as usize);
    let wh = ((crop_height as f64 * scale).round() as usize).clamp(1, sh as usize);

    let center_x = (sw as usize - ww) as f64 / 2.0;
    let center_y = (sh as usize - wh) as f64 / 2.0;
    let mut best = (0usize, 0usize);
    let mut best_score = f64::NEG_INFINITY;
    let mut best_distance = f64::INFINITY;
    for y in 0..=(sh as usize - wh) {
        for x in 0..=(sw as usize - ww) {
            let score = table.sum(x, y, ww, wh);
            let distance = (x as f64 - center_x).powi(2) + (y as f64 - center_y).powi(2);
            let better = score > best_score + 1e-9
                || ((score - best_score).abs() <= 1e-9 && distance < best_distance);
            if better {
                best = (x, y);
                best_score = score;
                best_distance = distance;
            }
        }
    }

    let x = ((best.0 as f64 / scale).round() as u32).min(width - crop_width);
    let y = ((best.1 as f64 / scale).round() as u32).min(height - crop_height);
    (x, y)
}

/// Offset of a centered crop window.
pub fn center_offset(width: u32, height: u32, crop_width: u32, crop_height: u32) -> (u32, u32) {
    (
        width.saturating_sub(crop_width) / 2,
        height.saturating_sub(crop_height) / 2,
    )
}

fn score_map(img: &RgbImage) -> Vec<f64> {
    let (w, h) = img.dimensions();
    let luma: Vec<f64> = img
        .pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .collect();

    let mut scores = Vec::with_capacity(luma.len());
    for y in 0..h as usize {
        for x in 0..w as usize {
            let i = y * w as usize + x;
            let mut edge = 0.0;
            if x > 0 {
                edge += (luma[i] - luma[i - 1]).abs();
            }
            if y > 0 {
                edge += (luma[i] - luma[i - w as usize]).abs();
            }
            let p = img.get_pixel(x as u32, y as u32);
            let (r, g, b) = (p[0], p[1], p[2]);
            let skin = if is_skin(r, g, b) { 1.0 } else { 0.0 };
            scores.push(
                EDGE_WEIGHT * edge / 255.0 + SATURATION_WEIGHT * saturation(r, g, b) + SKIN_WEIGHT * skin,
            );
        }
    }
    scores
}

fn saturation(r: u8, g: u8, b: u8) -> f64 {
    let max = r.max(g).max(b);
    if max == 0 {
        return 0.0;
    }
    let min = r.min(g).min(b);
    (max - min) as f64 / max as f64
}

fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let (ri, gi, bi) = (r as i32, g as i32, b as i32);
    ri > 95
        && gi > 40
        && bi > 20
        && ri > gi
        && ri > bi
        && (ri - gi).abs() > 15
        && ri.max(gi).max(bi) - ri.min(gi).min(bi) > 15
}

/// Summed-area table over a row-major score map.
struct SummedArea {
    stride: usize,
    sums: Vec<f64>,
}

impl SummedArea {
    fn new(values: &[f64], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += values[y * width + x];
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    fn sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        self.sums[(y + h) * s + x + w] - self.sums[y * s + x + w] - self.sums[(y + h) * s + x]
            + self.sums[y * s + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn uniform_image_crops_center() {
        let img = RgbImage::from_pixel(400, 800, Rgb([128, 128, 128]));
        assert_eq!(attention_offset(&img, 400, 400), (0, 200));
    }

    #[test]
    fn follows_salient_region_vertically() {
        // Gray portrait with a saturated, textured block near the bottom.
        let img = RgbImage::from_fn(200, 600, |x, y| {
            if y >= 450 && y < 550 {
                if (x / 4 + y / 4) % 2 == 0 {
                    Rgb([230, 40, 30])
                } else {
                    Rgb([20, 40, 200])
                }
            } else {
                Rgb([120, 120, 120])
            }
        });
        let (x, y) = attention_offset(&img, 200, 200);
        assert_eq!(x, 0);
        assert!(y >= 350 && y <= 450, "window at y={y} misses the block");
    }

    #[test]
    fn follows_salient_region_horizontally() {
        let img = RgbImage::from_fn(600, 200, |x, _| {
            if x < 100 {
                Rgb([200, 140, 110])
            } else {
                Rgb([10, 10, 10])
            }
        });
        let (x, y) = attention_offset(&img, 200, 200);
        assert_eq!(y, 0);
        assert!(x <= 20, "window at x={x} should cover the left edge");
    }

    #[test]
    fn full_size_crop_is_origin() {
        let img = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        assert_eq!(attention_offset(&img, 50, 50), (0, 0));
    }

    #[test]
    fn window_stays_inside_image() {
        let img = RgbImage::from_fn(333, 977, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 9]));
        let (x, y) = attention_offset(&img, 333, 250);
        assert_eq!(x, 0);
        assert!(y + 250 <= 977);
    }

    #[test]
    fn center_offset_math() {
        assert_eq!(center_offset(2000, 4000, 2000, 2000), (0, 1000));
        assert_eq!(center_offset(100, 100, 100, 100), (0, 0));
    }

    #[test]
    fn skin_rule() {
        assert!(is_skin(224, 172, 105));
        assert!(!is_skin(30, 30, 30));
        assert!(!is_skin(100, 100, 100));
    }
}
