//! Types shared between discovery, extraction, and rendering.
//!
//! Everything here lives for one batch run. The serde derives exist for the
//! `check --json` report.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// Layout variant of a page, decided from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    General,
    Blog,
    Photo,
    Gallery,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PageType::General => "general",
            PageType::Blog => "blog",
            PageType::Photo => "photo",
            PageType::Gallery => "gallery",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata scraped from one rendered page.
///
/// The page type is fixed at construction; there is no way to change it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMetadata {
    /// `<title>` with the site suffix removed.
    pub title: String,
    pub description: String,
    page_type: PageType,
    /// Card headline override (`data-og-headline`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    /// Card subtitle override (`data-og-subtitle`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<NaiveDate>,
}

impl PageMetadata {
    pub fn new(title: String, description: String, page_type: PageType) -> Self {
        Self {
            title,
            description,
            page_type,
            headline: None,
            subtitle: None,
            tags: Vec::new(),
            pub_date: None,
            updated_date: None,
        }
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    /// Text shown as the card title.
    pub fn display_headline(&self) -> &str {
        self.headline.as_deref().unwrap_or(&self.title)
    }
}

/// One `srcset` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Site-absolute URL path, e.g. `/_astro/DSC_1244.webp`.
    pub path: String,
    pub width: u32,
}

/// Metadata of an individual photo page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoMetadata {
    pub title: String,
    pub description: String,
    /// Responsive sources, ascending by width.
    pub candidates: Vec<Candidate>,
    /// Intrinsic size from the `<img>` attributes; both positive.
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A discovered page and where its image goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// `/` for the root page, otherwise `/a/b` without a trailing slash.
    pub url_path: String,
    pub html_path: PathBuf,
    /// PNG destination next to the page index.
    pub og_path: PathBuf,
}

impl RouteInfo {
    /// JPEG destination used for photo pages.
    pub fn jpeg_path(&self, jpeg_name: &str) -> PathBuf {
        self.og_path.with_file_name(jpeg_name)
    }
}
