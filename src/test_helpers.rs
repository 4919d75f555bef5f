//! Shared test utilities for the ogcard test suite.
//!
//! Builders for the rendered pages the extractor and the batch read, plus
//! small filesystem fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let html = HtmlPage::new("Post | kadykov.com")
//!     .tags(&["rust", "svg"])
//!     .published("2024-01-05")
//!     .to_html();
//! write_page(&tmp.path().join("dist/blog/post/index.html"), &html);
//! ```

use std::fmt::Write as _;
use std::path::Path;

use crate::config::OgConfig;

// =========================================================================
// Page builders
// =========================================================================

/// A rendered page as the site layout writes it. Values are inserted into
/// the markup as given, so tests can pass pre-escaped text.
#[derive(Debug, Clone, Default)]
pub struct HtmlPage {
    title: String,
    description: Option<String>,
    tags: Vec<String>,
    published: Option<String>,
    modified: Option<String>,
    body: String,
}

impl HtmlPage {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// `article:tag` meta entries.
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn published(mut self, date: &str) -> Self {
        self.published = Some(date.to_string());
        self
    }

    pub fn modified(mut self, date: &str) -> Self {
        self.modified = Some(date.to_string());
        self
    }

    pub fn to_html(&self) -> String {
        let mut head = format!("<title>{}</title>", self.title);
        if let Some(d) = &self.description {
            let _ = write!(head, r#"<meta name="description" content="{d}">"#);
        }
        for tag in &self.tags {
            let _ = write!(head, r#"<meta property="article:tag" content="{tag}">"#);
        }
        if let Some(d) = &self.published {
            let _ = write!(head, r#"<meta property="article:published_time" content="{d}">"#);
        }
        if let Some(d) = &self.modified {
            let _ = write!(head, r#"<meta property="article:modified_time" content="{d}">"#);
        }
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">{head}</head><body>{}</body></html>",
            self.body
        )
    }
}

/// An individual photo page: the photo in `figure#photo` with a `srcset`,
/// a "Date taken" entry and two tag links.
pub fn photo_page_html(title: &str, width: u32, height: u32, candidates: &[(&str, u32)]) -> String {
    let srcset: Vec<String> = candidates
        .iter()
        .map(|(path, w)| format!("{path} {w}w"))
        .collect();
    let src = candidates.first().map(|(path, _)| *path).unwrap_or_default();
    let body = format!(
        r##"<main><figure id="photo"><img src="{src}" srcset="{}" sizes="100vw" width="{width}" height="{height}" alt=""></figure>
<dl><dt>Camera</dt><dd>Nikon D750</dd><dt>Date taken</dt><dd><a href="/photos/dates/2023">June 3, 2023</a></dd></dl>
<ul><li><a href="/photos/tags/landscape">#landscape</a></li><li><a href="/photos/tags/sea">sea</a></li></ul></main>"##,
        srcset.join(", ")
    );
    HtmlPage::new(title).body(&body).to_html()
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write `html` to `path`, creating parent directories.
pub fn write_page(path: &Path, html: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, html).unwrap();
}

/// A JPEG with a red/green gradient and constant blue 128: never white, never black.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Config for batch tests: a half-size canvas, no fonts, two workers, and a
/// logo written to `config_dir/icon.svg`.
pub fn test_config(config_dir: &Path) -> OgConfig {
    std::fs::write(
        config_dir.join("icon.svg"),
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><style>@media (prefers-color-scheme: dark) { rect { fill: #fff } }</style><rect width="10" height="10" fill="#2f7cab"/></svg>"##,
    )
    .unwrap();

    let mut config = OgConfig::default();
    config.canvas.width = 600;
    config.canvas.height = 315;
    config.assets.logo = "icon.svg".into();
    config.assets.fonts = Vec::new();
    config.processing.max_processes = Some(2);
    config
}
