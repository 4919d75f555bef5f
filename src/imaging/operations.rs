//! High-level photo card operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute parameters, and call the backend:
//!
//! 1. [`plan_photo`] picks the strategy from the page's intrinsic size,
//!    selects a decodable srcset candidate large enough for the canvas and
//!    identifies it (memoized per source file).
//! 2. [`render_photo`] hands the plan to the backend and returns JPEG bytes.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    ProcessingStrategy, choose_strategy, crop_dimensions, decodable_candidates,
    required_source_width, select_candidate,
};
use super::params::{Canvas, ComposeParams, Quality};
use crate::cache::SingleFlight;
use crate::config::{OgConfig, parse_hex_color};
use crate::types::{Candidate, PhotoMetadata};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Source dimensions shared by all workers of one batch.
pub type DimensionCache = SingleFlight<PathBuf, Dimensions>;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("no decodable image among {0} srcset candidates")]
    NoDecodableCandidate(usize),
    #[error("candidate path escapes the output directory: {0}")]
    UnsafeCandidatePath(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Photo card settings resolved from config.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSettings {
    pub canvas: Canvas,
    pub crop_threshold: f64,
    pub candidate_min_width: u32,
    pub quality: Quality,
    pub background: [u8; 3],
    pub smart_crop: bool,
}

impl PhotoSettings {
    pub fn from_config(config: &OgConfig) -> Self {
        Self {
            canvas: config.canvas.into(),
            crop_threshold: config.photo.crop_threshold,
            candidate_min_width: config.photo.candidate_min_width,
            quality: Quality::new(config.photo.jpeg_quality),
            background: parse_hex_color(&config.photo.background).unwrap_or([255, 255, 255]),
            smart_crop: config.photo.smart_crop,
        }
    }
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self::from_config(&OgConfig::default())
    }
}

/// Everything decided about a photo card before any pixels move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoPlan {
    #[serde(serialize_with = "serialize_strategy")]
    pub strategy: ProcessingStrategy,
    /// Width the chosen candidate had to reach.
    pub target_width: u32,
    pub candidate: Candidate,
    /// Candidate file under the output root.
    pub source: PathBuf,
    pub source_width: u32,
    pub source_height: u32,
    /// Region of the source kept before fitting.
    pub crop: (u32, u32),
}

fn serialize_strategy<S: serde::Serializer>(
    strategy: &ProcessingStrategy,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(strategy)
}

/// Map a site-absolute candidate URL to a file under `dist_root`.
///
/// Only plain path segments are accepted; `..`, `.` and drive prefixes are
/// rejected so the result stays inside `dist_root`.
pub fn candidate_source_path(dist_root: &Path, candidate: &Candidate) -> Result<PathBuf, PhotoError> {
    let path = candidate.path.split(['?', '#']).next().unwrap_or_default();
    let relative = Path::new(path.trim_start_matches('/'));
    let normal = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !normal || relative.as_os_str().is_empty() {
        return Err(PhotoError::UnsafeCandidatePath(candidate.path.clone()));
    }
    Ok(dist_root.join(relative))
}

/// Choose strategy and source for a photo page.
pub fn plan_photo(
    backend: &impl ImageBackend,
    photo: &PhotoMetadata,
    dist_root: &Path,
    settings: &PhotoSettings,
    dimensions: &DimensionCache,
) -> Result<PhotoPlan, PhotoError> {
    let strategy = choose_strategy(photo.width, photo.height, settings.crop_threshold);
    let decodable = decodable_candidates(&photo.candidates);
    let target_width = required_source_width(photo.width, photo.height, strategy, settings.canvas)
        .max(settings.candidate_min_width);
    let candidate = select_candidate(&decodable, target_width)
        .ok_or(PhotoError::NoDecodableCandidate(photo.candidates.len()))?
        .clone();

    let source = candidate_source_path(dist_root, &candidate)?;
    let dims = dimensions.get_or_try_init(&source, || backend.identify(&source))?;
    let crop = match strategy {
        ProcessingStrategy::Fit => (dims.width, dims.height),
        ProcessingStrategy::Crop {
            target_aspect_ratio,
        } => crop_dimensions(dims.width, dims.height, target_aspect_ratio),
    };

    Ok(PhotoPlan {
        strategy,
        target_width,
        candidate,
        source,
        source_width: dims.width,
        source_height: dims.height,
        crop,
    })
}

/// Composite the planned photo card and return JPEG bytes.
pub fn render_photo(
    backend: &impl ImageBackend,
    plan: &PhotoPlan,
    settings: &PhotoSettings,
) -> Result<Vec<u8>, PhotoError> {
    let params = ComposeParams {
        source: plan.source.clone(),
        strategy: plan.strategy,
        canvas: settings.canvas,
        background: settings.background,
        quality: settings.quality,
        smart_crop: settings.smart_crop,
    };
    Ok(backend.compose(&params)?)
}
