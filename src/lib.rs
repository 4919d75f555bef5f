//! # ogcard
//!
//! OpenGraph preview images for a statically built blog and photo site. The
//! site generator's output is the data source: every `index.html` becomes a
//! card written next to it, styled after the page's kind.
//!
//! # Architecture: Per-Page Pipeline
//!
//! ```text
//! 1. Discover  dist/**/index.html  →  routes          (walkdir, file-name order)
//! 2. Extract   index.html          →  PageMetadata    (DOM selectors)
//! 3. Build     PageMetadata        →  Scene           (pure layout, text fitting)
//! 4. Render    Scene               →  og.png          (resvg rasterizer)
//!    or        photo page          →  og.jpg          (crop, fit, center)
//! ```
//!
//! Steps 2–4 run independently per page on a worker pool. Layout is plain
//! data: template tests check positions and wrapped lines without rasterizing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the build output and produces one route per page index |
//! | [`extract`] | Reads title, description, tags, dates and photo sources from rendered HTML |
//! | [`entities`] | Decodes the HTML entities site generators escape twice |
//! | [`text_fit`] | Estimates text width, picks font sizes, wraps and truncates lines |
//! | [`templates`] | General, blog and gallery card layouts |
//! | [`scene`] | Vector scene model and its SVG serialization |
//! | [`render`] | Rasterizes scenes to PNG, embeds the logo |
//! | [`fonts`] | Shared font database, loaded once |
//! | [`imaging`] | Photo strategy, candidate selection and the pure-Rust compositor |
//! | [`cache`] | Compute-once memo shared by workers |
//! | [`process`] | Batch orchestration: worker pool, skip rules, fallbacks, summary |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | Shared types (`RouteInfo`, `PageMetadata`, `PhotoMetadata`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Estimated Text Metrics
//!
//! Font sizes and line breaks are chosen from character-class width weights,
//! not from shaped glyph runs. The estimate is deterministic, needs no font
//! files, and is good enough to choose between a handful of sizes. Cards
//! carry generous padding for the cases where it is off.
//!
//! ## Photo Cards Skip the Template
//!
//! A photo page's card is the photo itself: fitted inside the canvas when it
//! is landscape, cropped square when it is portrait. The smallest decodable
//! `srcset` candidate that still covers the canvas is used, so nothing is
//! upscaled and no full-size original is decoded. When anything about the
//! photo fails the page still gets the general template card.
//!
//! ## Pure-Rust Imaging
//!
//! Rasterization (`resvg`), decoding and resampling (`image`), and encoding
//! (`png`, `jpeg-encoder`) are all pure Rust. No headless browser, no
//! ImageMagick: the binary is self-contained.

pub mod cache;
pub mod config;
pub mod entities;
pub mod extract;
pub mod fonts;
pub mod imaging;
pub mod output;
pub mod process;
pub mod render;
pub mod scan;
pub mod scene;
pub mod templates;
pub mod text_fit;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
