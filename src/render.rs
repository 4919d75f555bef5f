//! Scene rasterization.
//!
//! ```text
//! Scene ──to_svg──▶ SVG text ──usvg──▶ Tree ──resvg──▶ Pixmap ──png──▶ bytes
//! ```
//!
//! The renderer owns the [`FontLibrary`]; every render shares the same
//! font database. The logo is read once at setup and embedded into scenes
//! as a base64 `data:` URL.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fonts::{FontError, FontLibrary};
use crate::imaging::{EncodeError, PngParams, encode_png};
use crate::scene::Scene;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("invalid scene SVG: {0}")]
    Svg(#[from] usvg::Error),
    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Error, Debug)]
#[error("cannot read logo {path}: {source}")]
pub struct LogoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Rasterizes template scenes to PNG.
#[derive(Debug)]
pub struct Renderer {
    fonts: FontLibrary,
    png: PngParams,
}

impl Renderer {
    pub fn new(fonts: FontLibrary, png: PngParams) -> Self {
        Self { fonts, png }
    }

    /// Rasterize at the scene's exact size.
    pub fn render_pixmap(&self, scene: &Scene) -> Result<Pixmap, RenderError> {
        let options = usvg::Options {
            fontdb: self.fonts.database()?,
            ..Default::default()
        };
        let svg = scene.to_svg();
        let tree = usvg::Tree::from_str(&svg, &options)?;

        let mut pixmap = Pixmap::new(scene.width, scene.height).ok_or(RenderError::Pixmap {
            width: scene.width,
            height: scene.height,
        })?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        Ok(pixmap)
    }

    /// Rasterize and encode as PNG.
    pub fn render_png(&self, scene: &Scene) -> Result<Vec<u8>, RenderError> {
        let pixmap = self.render_pixmap(scene)?;
        // Scenes paint an opaque background, so premultiplied equals straight RGBA.
        let bytes = encode_png(pixmap.data(), pixmap.width(), pixmap.height(), self.png)?;
        debug!("Rendered {}x{} card, {} bytes", pixmap.width(), pixmap.height(), bytes.len());
        Ok(bytes)
    }
}

/// Remove every `<style>…</style>` element, dropping dark-mode rules so the
/// logo always renders in its light colours.
pub fn strip_style_blocks(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(start) = rest.find("<style") {
        let Some(len) = rest[start..].find("</style>") else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + len + "</style>".len()..];
    }
    out.push_str(rest);
    out
}

/// `data:image/svg+xml;base64,…`
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Read the logo SVG and turn it into an embeddable data URL.
pub fn load_logo(path: &Path) -> Result<String, LogoError> {
    let svg = std::fs::read_to_string(path).map_err(|source| LogoError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(svg_data_url(&strip_style_blocks(&svg)))
}
