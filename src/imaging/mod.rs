//! Photo cards and output encoding. Pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Smart crop** | saliency window over a downscaled copy |
//! | **Fit + centre** | Lanczos3 resize, overlay onto an opaque canvas |
//! | **Encode** | `jpeg-encoder` (photo cards), `png` (template cards) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for strategy and geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod encode;
pub mod operations;
mod params;
pub mod rust_backend;
mod saliency;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    DECODABLE_EXTENSIONS, ProcessingStrategy, center_offsets, choose_strategy, crop_dimensions,
    decodable_candidates, fit_inside, is_decodable, required_source_width, select_candidate,
};
pub use encode::{EncodeError, encode_jpeg, encode_png};
pub use operations::{
    DimensionCache, PhotoError, PhotoPlan, PhotoSettings, plan_photo, render_photo,
};
pub use params::{Canvas, ComposeParams, PngParams, Quality};
pub use rust_backend::RustBackend;
pub use saliency::attention_offset;
