//! Page metadata extraction from rendered HTML.
//!
//! Pages are parsed into a DOM with `scraper` and read through a small set of
//! selectors. What the site layout exposes:
//!
//! | Field | Source |
//! |---|---|
//! | title | `<title>`, minus ` \| <site name>` |
//! | description | `meta[name="description"]` |
//! | headline / subtitle | `data-og-headline` / `data-og-subtitle` on any element |
//! | tags (blog) | `meta[property="article:tag"]`, else `data-og-tags` (comma separated) |
//! | published (blog) | `meta[property="article:published_time"]`, else `data-og-date` |
//! | updated (blog) | `meta[property="article:modified_time"]`, else `data-og-updated` |
//!
//! Photo pages additionally expose the photo itself: an `<img srcset>` inside
//! `figure#photo` with intrinsic `width`/`height`, a "Date taken" entry in a
//! description list, and tag links under `/photos/tags/`.
//!
//! Every extracted string goes through [`decode_html_entities`] after the
//! parser's own decoding.

use crate::entities::decode_html_entities;
use crate::types::{Candidate, PageMetadata, PageType, PhotoMetadata};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, error};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Directory the site generator writes optimized images to.
const ASSET_URL_PREFIX: &str = "/_astro/";

/// Page index file name, ignored when classifying file paths.
const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn first<'a>(doc: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, ExtractError> {
    Ok(doc.select(&selector(css)?).next())
}

/// Non-empty attribute of the first element matching `css`.
fn first_attr(doc: &Html, css: &str, attr: &str) -> Result<Option<String>, ExtractError> {
    Ok(first(doc, css)?
        .and_then(|el| el.value().attr(attr))
        .map(|v| decode_html_entities(v.trim()))
        .filter(|v| !v.is_empty()))
}

fn element_text(el: ElementRef<'_>) -> String {
    decode_html_entities(el.text().collect::<String>().trim())
}

// =============================================================================
// Page type
// =============================================================================

/// Classify a page by the shape of its path.
///
/// Precedence: a `blog` segment followed by at least one more segment (the
/// blog index itself is a general page), then a `photo` segment without any
/// `photos` segment, then a `photos` segment. Everything else is general.
/// Accepts URL paths and file paths; a trailing `index.html` is ignored.
pub fn classify_page_type(path: &str) -> PageType {
    let mut segments: Vec<&str> = path.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
    if segments.last() == Some(&INDEX_FILE) {
        segments.pop();
    }

    let is_blog_post = segments
        .iter()
        .position(|s| *s == "blog")
        .is_some_and(|i| i + 1 < segments.len());
    let has_photos = segments.contains(&"photos");
    let has_photo = segments.contains(&"photo");

    if is_blog_post {
        PageType::Blog
    } else if has_photo && !has_photos {
        PageType::Photo
    } else if has_photos {
        PageType::Gallery
    } else {
        PageType::General
    }
}

// =============================================================================
// Page metadata
// =============================================================================

/// Extract card metadata from a rendered page.
///
/// `page_path` decides the page type. `site_name` is stripped from the title
/// suffix and stands in for a missing title. Returns `None` only when
/// extraction itself breaks; the failure is logged with the path.
pub fn extract_page_meta(html: &str, page_path: &str, site_name: &str) -> Option<PageMetadata> {
    let doc = Html::parse_document(html);
    page_meta_from_document(&doc, page_path, site_name)
}

/// [`extract_page_meta`] on an already parsed document.
pub fn page_meta_from_document(
    doc: &Html,
    page_path: &str,
    site_name: &str,
) -> Option<PageMetadata> {
    match try_page_meta(doc, page_path, site_name) {
        Ok(meta) => Some(meta),
        Err(e) => {
            error!("Failed to extract metadata from {page_path}: {e}");
            None
        }
    }
}

fn try_page_meta(
    doc: &Html,
    page_path: &str,
    site_name: &str,
) -> Result<PageMetadata, ExtractError> {
    let page_type = classify_page_type(page_path);
    let title = page_title(doc, site_name)?;
    let description =
        first_attr(doc, r#"meta[name="description"]"#, "content")?.unwrap_or_default();

    let mut meta = PageMetadata::new(title, description, page_type);
    meta.headline = first_attr(doc, "[data-og-headline]", "data-og-headline")?;
    meta.subtitle = first_attr(doc, "[data-og-subtitle]", "data-og-subtitle")?;

    if page_type == PageType::Blog {
        meta.tags = blog_tags(doc)?;
        meta.pub_date = blog_date(
            doc,
            r#"meta[property="article:published_time"]"#,
            "data-og-date",
        )?;
        meta.updated_date = blog_date(
            doc,
            r#"meta[property="article:modified_time"]"#,
            "data-og-updated",
        )?;
    }

    debug!(
        "{page_path}: {} page, title {:?}, {} tags",
        page_type,
        meta.title,
        meta.tags.len()
    );
    Ok(meta)
}

/// `<title>` text without the site suffix; the bare site name when missing.
fn page_title(doc: &Html, site_name: &str) -> Result<String, ExtractError> {
    let raw = first(doc, "title")?.map(element_text).unwrap_or_default();
    let suffix = format!(" | {site_name}");
    let title = raw.strip_suffix(&suffix).unwrap_or(&raw).trim();
    if title.is_empty() {
        Ok(site_name.to_string())
    } else {
        Ok(title.to_string())
    }
}

fn blog_tags(doc: &Html) -> Result<Vec<String>, ExtractError> {
    let tags: Vec<String> = doc
        .select(&selector(r#"meta[property="article:tag"]"#)?)
        .filter_map(|el| el.value().attr("content"))
        .map(|v| decode_html_entities(v.trim()))
        .filter(|v| !v.is_empty())
        .collect();
    if !tags.is_empty() {
        return Ok(tags);
    }
    Ok(first_attr(doc, "[data-og-tags]", "data-og-tags")?
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// Date from a meta tag, falling back to a data attribute.
fn blog_date(
    doc: &Html,
    meta_css: &str,
    data_attr: &str,
) -> Result<Option<NaiveDate>, ExtractError> {
    let raw = match first_attr(doc, meta_css, "content")? {
        Some(v) => Some(v),
        None => first_attr(doc, &format!("[{data_attr}]"), data_attr)?,
    };
    Ok(raw.and_then(|v| {
        let parsed = parse_date(&v);
        if parsed.is_none() {
            debug!("Ignoring unparsable date {v:?}");
        }
        parsed
    }))
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS`, or a plain
/// `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = value.parse::<NaiveDateTime>() {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// =============================================================================
// Photo pages
// =============================================================================

/// Parse a `srcset` attribute into candidates sorted ascending by width.
///
/// Only site-absolute URLs with a `w` descriptor are kept.
pub fn parse_srcset(srcset: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = srcset
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let path = parts.next()?;
            let width = parts.next()?.strip_suffix('w')?.parse().ok()?;
            path.starts_with('/').then(|| Candidate {
                path: path.to_string(),
                width,
            })
        })
        .collect();
    candidates.sort_by_key(|c| c.width);
    candidates
}

/// Extract the photo of an individual photo page.
///
/// Returns `None` when the page has no usable image: no matching `<img>`,
/// no parsable candidates, or a missing or zero intrinsic size.
pub fn extract_photo_meta(html: &str, site_name: &str) -> Option<PhotoMetadata> {
    let doc = Html::parse_document(html);
    photo_meta_from_document(&doc, site_name)
}

/// [`extract_photo_meta`] on an already parsed document.
pub fn photo_meta_from_document(doc: &Html, site_name: &str) -> Option<PhotoMetadata> {
    match try_photo_meta(doc, site_name) {
        Ok(meta) => meta,
        Err(e) => {
            error!("Failed to extract photo metadata: {e}");
            None
        }
    }
}

fn try_photo_meta(doc: &Html, site_name: &str) -> Result<Option<PhotoMetadata>, ExtractError> {
    let Some(img) = photo_image(doc)? else {
        debug!("No photo image with srcset found");
        return Ok(None);
    };

    let candidates = parse_srcset(img.value().attr("srcset").unwrap_or_default());
    let dimension = |name| {
        img.value()
            .attr(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
    };
    let (Some(width), Some(height)) = (dimension("width"), dimension("height")) else {
        debug!("Photo image has no usable width/height");
        return Ok(None);
    };
    if candidates.is_empty() {
        debug!("Photo srcset has no usable candidates");
        return Ok(None);
    }

    let title = page_title(doc, site_name)?;
    let description =
        first_attr(doc, r#"meta[name="description"]"#, "content")?.unwrap_or_default();

    Ok(Some(PhotoMetadata {
        title,
        description,
        candidates,
        width,
        height,
        date_taken: date_taken(doc)?,
        tags: photo_tags(doc)?,
    }))
}

/// The main photo: `figure#photo img[srcset]`, else the first `img[srcset]`
/// pointing into the asset directory.
fn photo_image(doc: &Html) -> Result<Option<ElementRef<'_>>, ExtractError> {
    if let Some(img) = first(doc, "figure#photo img[srcset]")? {
        return Ok(Some(img));
    }
    Ok(doc.select(&selector("img[srcset]")?).find(|img| {
        img.value()
            .attr("srcset")
            .is_some_and(|s| s.contains(ASSET_URL_PREFIX))
    }))
}

/// Text of the `<dd>` following the `<dt>Date taken</dt>` entry.
fn date_taken(doc: &Html) -> Result<Option<String>, ExtractError> {
    for dt in doc.select(&selector("dt")?) {
        if element_text(dt) != "Date taken" {
            continue;
        }
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|el| el.value().name() == "dd");
        return Ok(dd.map(element_text).filter(|t| !t.is_empty()));
    }
    Ok(None)
}

fn photo_tags(doc: &Html) -> Result<Vec<String>, ExtractError> {
    Ok(doc
        .select(&selector(r#"a[href^="/photos/tags/"]"#)?)
        .map(|a| element_text(a).trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{HtmlPage, photo_page_html};

    const SITE: &str = "kadykov.com";

    // =========================================================================
    // classify_page_type
    // =========================================================================

    #[test]
    fn classify_blog_post() {
        assert_eq!(classify_page_type("/blog/my-post"), PageType::Blog);
        assert_eq!(
            classify_page_type("dist/blog/my-post/index.html"),
            PageType::Blog
        );
    }

    #[test]
    fn classify_blog_index_is_general() {
        assert_eq!(classify_page_type("/blog"), PageType::General);
        assert_eq!(classify_page_type("/blog/"), PageType::General);
        assert_eq!(classify_page_type("blog/index.html"), PageType::General);
    }

    #[test]
    fn classify_photo_and_gallery() {
        assert_eq!(classify_page_type("/photo/dsc-1244"), PageType::Photo);
        assert_eq!(classify_page_type("/photos"), PageType::Gallery);
        assert_eq!(classify_page_type("/photos/tags/street"), PageType::Gallery);
        // plural wins over singular
        assert_eq!(classify_page_type("/photos/photo/x"), PageType::Gallery);
    }

    #[test]
    fn classify_matches_whole_segments_only() {
        assert_eq!(classify_page_type("/blogroll/x"), PageType::General);
        assert_eq!(classify_page_type("/photography"), PageType::General);
        assert_eq!(classify_page_type("/"), PageType::General);
    }

    #[test]
    fn classify_blog_takes_precedence() {
        assert_eq!(classify_page_type("/blog/photo/x"), PageType::Blog);
    }

    // =========================================================================
    // extract_page_meta
    // =========================================================================

    #[test]
    fn general_page_fields() {
        let html = HtmlPage::new("About | kadykov.com")
            .description("Who I am &amp; what I do")
            .to_html();
        let meta = extract_page_meta(&html, "/about", SITE).unwrap();
        assert_eq!(meta.title, "About");
        assert_eq!(meta.description, "Who I am & what I do");
        assert_eq!(meta.page_type(), PageType::General);
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn missing_title_yields_site_name() {
        let html = "<html><head></head><body><p>hi</p></body></html>";
        let meta = extract_page_meta(html, "/", SITE).unwrap();
        assert_eq!(meta.title, SITE);
    }

    #[test]
    fn bare_site_title_kept() {
        let html = HtmlPage::new("kadykov.com").to_html();
        let meta = extract_page_meta(&html, "/", SITE).unwrap();
        assert_eq!(meta.title, SITE);
    }

    #[test]
    fn double_escaped_entities_decoded() {
        // The generator escaped `It&#39;s` once more.
        let html = r#"<html><head><title>It&amp;#39;s here | kadykov.com</title>
            <meta name="description" content="Tom &amp;amp; Jerry"></head><body></body></html>"#;
        let meta = extract_page_meta(html, "/x", SITE).unwrap();
        assert_eq!(meta.title, "It's here");
        assert_eq!(meta.description, "Tom & Jerry");
    }

    #[test]
    fn headline_and_subtitle_overrides() {
        let html = HtmlPage::new("Post | kadykov.com")
            .body(r#"<article data-og-headline="Big &amp; Bold" data-og-subtitle="Small"></article>"#)
            .to_html();
        let meta = extract_page_meta(&html, "/about", SITE).unwrap();
        assert_eq!(meta.headline.as_deref(), Some("Big & Bold"));
        assert_eq!(meta.subtitle.as_deref(), Some("Small"));
        assert_eq!(meta.display_headline(), "Big & Bold");
    }

    #[test]
    fn blog_tags_and_dates_from_meta() {
        let html = HtmlPage::new("Post | kadykov.com")
            .tags(&["rust", "c&amp;c"])
            .published("2024-01-05T10:00:00.000Z")
            .modified("2024-03-02")
            .to_html();
        let meta = extract_page_meta(&html, "/blog/post", SITE).unwrap();
        assert_eq!(meta.page_type(), PageType::Blog);
        assert_eq!(meta.tags, vec!["rust", "c&c"]);
        assert_eq!(meta.pub_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(meta.updated_date, NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn blog_fallback_attributes() {
        let html = HtmlPage::new("Post | kadykov.com")
            .body(r#"<div data-og-tags="one, two ,, three" data-og-date="2023-12-31" data-og-updated="2024-02-01"></div>"#)
            .to_html();
        let meta = extract_page_meta(&html, "/blog/post", SITE).unwrap();
        assert_eq!(meta.tags, vec!["one", "two", "three"]);
        assert_eq!(meta.pub_date, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(meta.updated_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn blog_fields_ignored_on_other_pages() {
        let html = HtmlPage::new("About | kadykov.com")
            .tags(&["rust"])
            .published("2024-01-05")
            .to_html();
        let meta = extract_page_meta(&html, "/about", SITE).unwrap();
        assert!(meta.tags.is_empty());
        assert!(meta.pub_date.is_none());
    }

    #[test]
    fn unparsable_date_ignored() {
        let html = HtmlPage::new("Post | kadykov.com")
            .published("last tuesday")
            .to_html();
        let meta = extract_page_meta(&html, "/blog/post", SITE).unwrap();
        assert!(meta.pub_date.is_none());
    }

    #[test]
    fn parse_date_formats() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date("2024-01-05"), jan5);
        assert_eq!(parse_date("2024-01-05T23:00:00+02:00"), jan5);
        assert_eq!(parse_date("2024-01-05T08:30:00"), jan5);
        assert_eq!(parse_date(" 2024-01-05 "), jan5);
        assert_eq!(parse_date("05/01/2024"), None);
    }

    // =========================================================================
    // srcset / photo pages
    // =========================================================================

    #[test]
    fn srcset_sorted_ascending() {
        let c = parse_srcset("/_astro/b.webp 1080w, /_astro/a.webp 350w,/_astro/c.webp 640w");
        let widths: Vec<u32> = c.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![350, 640, 1080]);
        assert_eq!(c[0].path, "/_astro/a.webp");
    }

    #[test]
    fn srcset_skips_relative_and_density_entries() {
        let c = parse_srcset("a.webp 350w, /_astro/b.webp 2x, /_astro/c.webp 640w, ");
        assert_eq!(
            c,
            vec![Candidate {
                path: "/_astro/c.webp".into(),
                width: 640
            }]
        );
    }

    #[test]
    fn photo_meta_from_figure() {
        let html = photo_page_html("Sunset | kadykov.com", 4000, 2000, &[
            ("/_astro/sunset_a.jpg", 450),
            ("/_astro/sunset_b.jpg", 1200),
        ]);
        let photo = extract_photo_meta(&html, SITE).unwrap();
        assert_eq!(photo.title, "Sunset");
        assert_eq!((photo.width, photo.height), (4000, 2000));
        assert_eq!(photo.candidates.len(), 2);
        assert_eq!(photo.date_taken.as_deref(), Some("June 3, 2023"));
        assert_eq!(photo.tags, vec!["landscape", "sea"]);
    }

    #[test]
    fn photo_meta_falls_back_to_asset_img() {
        let html = r#"<html><head><title>P | kadykov.com</title></head><body>
            <img src="/logo.svg" srcset="/logo-2x.svg 200w" width="10" height="10">
            <img srcset="/_astro/p.jpg 800w" width="800" height="600">
            </body></html>"#;
        let photo = extract_photo_meta(html, SITE).unwrap();
        assert_eq!(photo.candidates[0].path, "/_astro/p.jpg");
        assert_eq!((photo.width, photo.height), (800, 600));
        assert!(photo.date_taken.is_none());
        assert!(photo.tags.is_empty());
    }

    #[test]
    fn photo_meta_requires_positive_dimensions() {
        let html = r#"<html><body><figure id="photo">
            <img srcset="/_astro/p.jpg 800w" width="0" height="600"></figure></body></html>"#;
        assert!(extract_photo_meta(html, SITE).is_none());
        let html = r#"<html><body><figure id="photo">
            <img srcset="/_astro/p.jpg 800w"></figure></body></html>"#;
        assert!(extract_photo_meta(html, SITE).is_none());
    }

    #[test]
    fn photo_meta_none_without_image() {
        let html = HtmlPage::new("P | kadykov.com").to_html();
        assert!(extract_photo_meta(&html, SITE).is_none());
    }
}
