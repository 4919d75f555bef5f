//! Pure calculation functions for photo cards.
//!
//! All functions here are pure and testable without any I/O or images:
//! the fit-or-crop decision, source candidate selection, and the geometry
//! the compositor applies.

use super::params::Canvas;
use crate::types::Candidate;
use std::fmt;
use std::path::Path;

/// Extensions the compositor can decode.
pub const DECODABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// How a photo is placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStrategy {
    /// Fit the whole photo inside the canvas.
    Fit,
    /// Crop to `target_aspect_ratio` (width / height) first, then fit.
    Crop { target_aspect_ratio: f64 },
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStrategy::Fit => f.write_str("fit"),
            ProcessingStrategy::Crop {
                target_aspect_ratio,
            } => write!(f, "crop {target_aspect_ratio:.2}"),
        }
    }
}

/// Decide between fitting and cropping from the photo's aspect ratio.
///
/// Photos at least as wide as `threshold` are fitted; narrower ones are
/// cropped to exactly `threshold`. A square photo with a threshold of 1.0
/// is fitted.
///
/// # Examples
/// ```
/// # use ogcard::imaging::{ProcessingStrategy, choose_strategy};
/// assert_eq!(choose_strategy(4000, 2000, 1.0), ProcessingStrategy::Fit);
/// assert_eq!(
///     choose_strategy(2000, 4000, 1.0),
///     ProcessingStrategy::Crop { target_aspect_ratio: 1.0 }
/// );
/// ```
pub fn choose_strategy(width: u32, height: u32, threshold: f64) -> ProcessingStrategy {
    let aspect = width as f64 / height as f64;
    if aspect >= threshold {
        ProcessingStrategy::Fit
    } else {
        ProcessingStrategy::Crop {
            target_aspect_ratio: threshold,
        }
    }
}

/// Pick a source from candidates sorted ascending by width.
///
/// Returns the first candidate at least `target_width` wide, else the
/// largest one. `None` only for an empty list.
pub fn select_candidate(candidates: &[Candidate], target_width: u32) -> Option<&Candidate> {
    candidates
        .iter()
        .find(|c| c.width >= target_width)
        .or_else(|| candidates.last())
}

/// Whether the compositor has a decoder for this candidate's format.
pub fn is_decodable(candidate: &Candidate) -> bool {
    let path = candidate.path.split(['?', '#']).next().unwrap_or_default();
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            DECODABLE_EXTENSIONS
                .iter()
                .any(|ok| e.eq_ignore_ascii_case(ok))
        })
}

/// Keep only candidates the compositor can decode, preserving order.
pub fn decodable_candidates(candidates: &[Candidate]) -> Vec<Candidate> {
    candidates.iter().filter(|c| is_decodable(c)).cloned().collect()
}

/// Crop size reaching `ratio` by narrowing one dimension.
///
/// Narrows the width to `round(height × ratio)` when that is no wider than
/// the image, otherwise narrows the height to `round(width / ratio)`.
pub fn crop_dimensions(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    let target_width = (height as f64 * ratio).round() as u32;
    if target_width <= width {
        (target_width.max(1), height)
    } else {
        let target_height = (width as f64 / ratio).round() as u32;
        (width, target_height.clamp(1, height))
    }
}

/// Largest size with the source aspect that fits inside the canvas.
///
/// Enlarges small sources.
pub fn fit_inside(width: u32, height: u32, canvas: Canvas) -> (u32, u32) {
    let scale = (canvas.width as f64 / width as f64).min(canvas.height as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, canvas.width);
    let h = ((height as f64 * scale).round() as u32).clamp(1, canvas.height);
    (w, h)
}

/// Offsets that center an image of `width × height` on the canvas.
pub fn center_offsets(width: u32, height: u32, canvas: Canvas) -> (u32, u32) {
    let left = (canvas.width.saturating_sub(width) as f64 / 2.0).round() as u32;
    let top = (canvas.height.saturating_sub(height) as f64 / 2.0).round() as u32;
    (left, top)
}

/// Source width needed so the fitted photo is drawn at 1:1 or downscaled.
///
/// `width × height` is the photo's intrinsic size; the result is in the same
/// units and is used as the candidate target width.
pub fn required_source_width(
    width: u32,
    height: u32,
    strategy: ProcessingStrategy,
    canvas: Canvas,
) -> u32 {
    let (crop_w, crop_h) = match strategy {
        ProcessingStrategy::Fit => (width, height),
        ProcessingStrategy::Crop {
            target_aspect_ratio,
        } => crop_dimensions(width, height, target_aspect_ratio),
    };
    let (fitted_w, _) = fit_inside(crop_w, crop_h, canvas);
    let scale = fitted_w as f64 / crop_w as f64;
    (width as f64 * scale).round() as u32
}
