//! Batch card generation.
//!
//! Takes the routes found by [`scan`](crate::scan) and writes one card per
//! page next to its `index.html`.
//!
//! ## Per-page flow
//!
//! ```text
//! index.html ──extract──▶ PageMetadata ──skip rules──▶ Skipped
//!                              │
//!                              ├─ photo page ──plan/compose──▶ og.jpg
//!                              │        └─ any failure ──┐
//!                              └─ other pages ───────────┴──▶ template ──▶ og.png
//! ```
//!
//! A page is skipped when extraction yields nothing or its title is empty or
//! the bare site name (the site's own landing pages carry no useful title).
//!
//! ## Parallel Processing
//!
//! Pages run on a dedicated [rayon](https://docs.rs/rayon) pool sized by
//! [`effective_threads`]. All routes are queued up front on one
//! `crossbeam-channel` in discovery order; each worker takes the next route
//! until the queue is empty, so dequeue order is discovery order while
//! completion order is not. Errors and panics are caught at the page
//! boundary: one bad page never stops the batch.
//!
//! Shared state is read-only apart from two single-flight memos: the font
//! database and the source image dimensions.
//!
//! ## Setup failures
//!
//! A missing output directory, an unreadable logo, or an unreadable font file
//! aborts the whole run before any page is touched.

use crate::config::{OgConfig, effective_threads};
use crate::extract::{classify_page_type, page_meta_from_document, photo_meta_from_document};
use crate::fonts::{FontError, FontLibrary};
use crate::imaging::{
    DimensionCache, ImageBackend, PhotoSettings, PngParams, RustBackend, plan_photo, render_photo,
};
use crate::render::{LogoError, RenderError, Renderer, load_logo};
use crate::scan::{ScanError, discover_pages};
use crate::templates::{Template, TemplateContext, build_scene};
use crate::types::{PageMetadata, PageType, RouteInfo};
use log::{debug, error, info, warn};
use scraper::Html;
use serde::Serialize;
use std::any::Any;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure that aborts the whole batch.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Logo(#[from] LogoError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure confined to one page.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

// ============================================================================
// Outcomes and events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Extraction returned nothing.
    NoMetadata,
    /// Empty title, or the bare site name.
    NoTitle,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::NoMetadata => "could not extract metadata",
            SkipReason::NoTitle => "no title",
        })
    }
}

/// Which kind of card a page received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Template(Template),
    Photo,
    /// Photo page rendered with the general template.
    PhotoFallback,
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardKind::Template(t) => write!(f, "{t}"),
            CardKind::Photo => f.write_str("photo"),
            CardKind::PhotoFallback => f.write_str("photo fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Generated { output: PathBuf, kind: CardKind },
    Skipped(SkipReason),
    Failed(String),
}

/// Progress of a batch, sent while it runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { pages: usize, workers: usize },
    PageFinished { url_path: String, outcome: PageOutcome },
    Finished(BatchSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatchSummary {
    pub discovered: usize,
    pub generated: usize,
    /// Includes failed pages.
    pub skipped: usize,
    pub failed: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.generated as f64 / secs
        } else {
            0.0
        }
    }
}

/// Counters of one worker, merged by the caller once all workers finish.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    generated: usize,
    skipped: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::Generated { .. } => self.generated += 1,
            PageOutcome::Skipped(_) => self.skipped += 1,
            PageOutcome::Failed(_) => {
                self.skipped += 1;
                self.failed += 1;
            }
        }
    }

    fn merge(self, other: Tally) -> Tally {
        Tally {
            generated: self.generated + other.generated,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }
}

// ============================================================================
// Batch entry points
// ============================================================================

/// Generate cards for every page under `dist_root` with the pure-Rust
/// compositor.
///
/// Asset paths in `config` are resolved against `config_dir`.
pub fn run(
    dist_root: &Path,
    config: &OgConfig,
    config_dir: &Path,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, ProcessError> {
    run_with_backend(&RustBackend::new(), dist_root, config, config_dir, events)
}

pub fn run_with_backend(
    backend: &impl ImageBackend,
    dist_root: &Path,
    config: &OgConfig,
    config_dir: &Path,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, ProcessError> {
    let start = Instant::now();
    let routes = discover_pages(dist_root, &config.discovery)?;
    let generator = Generator::new(backend, dist_root, config, config_dir)?;
    let workers = effective_threads(&config.processing);
    info!(
        "Found {} pages under {}, {workers} workers",
        routes.len(),
        dist_root.display()
    );

    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            // A closed receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    };
    emit(BatchEvent::Started {
        pages: routes.len(),
        workers,
    });

    let discovered = routes.len();
    let tally = generator.run_pool(routes, workers, events.as_ref())?;
    debug!("Measured {} distinct photo sources", generator.dimensions.len());

    let summary = BatchSummary {
        discovered,
        generated: tally.generated,
        skipped: tally.skipped,
        failed: tally.failed,
        workers,
        elapsed: start.elapsed(),
    };
    info!(
        "Generated {} images, skipped {} ({} failed) in {:.2}s",
        summary.generated,
        summary.skipped,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );
    emit(BatchEvent::Finished(summary));
    Ok(summary)
}

// ============================================================================
// Generator
// ============================================================================

/// Everything a worker needs to turn a route into a card. Built once per
/// batch and shared by reference.
pub struct Generator<'a, B: ImageBackend> {
    backend: &'a B,
    dist_root: PathBuf,
    site_name: String,
    jpeg_name: String,
    renderer: Renderer,
    templates: TemplateContext,
    photo: PhotoSettings,
    dimensions: DimensionCache,
}

impl<'a, B: ImageBackend> Generator<'a, B> {
    /// Read the logo and load fonts. Both failures are fatal.
    pub fn new(
        backend: &'a B,
        dist_root: &Path,
        config: &OgConfig,
        config_dir: &Path,
    ) -> Result<Self, ProcessError> {
        let assets = config.assets.resolved(config_dir);
        let logo = load_logo(&assets.logo)?;
        let fonts = FontLibrary::new(&assets, &config.typography);
        fonts.database()?;

        Ok(Self {
            backend,
            dist_root: dist_root.to_path_buf(),
            site_name: config.site_name.clone(),
            jpeg_name: config.discovery.jpeg_name.clone(),
            renderer: Renderer::new(fonts, PngParams::from(config.png)),
            templates: TemplateContext::from_config(config, Some(logo)),
            photo: PhotoSettings::from_config(config),
            dimensions: DimensionCache::new(),
        })
    }

    fn run_pool(
        &self,
        routes: Vec<RouteInfo>,
        workers: usize,
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<Tally, ProcessError> {
        use rayon::prelude::*;

        let (tx, queue) = crossbeam_channel::unbounded();
        for route in routes {
            // The receiver is alive until the end of this function.
            let _ = tx.send(route);
        }
        drop(tx);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ogcard-worker-{i}"))
            .build()?;
        Ok(pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|_| {
                    let mut tally = Tally::default();
                    while let Ok(route) = queue.recv() {
                        let outcome = self.process_isolated(&route);
                        tally.record(&outcome);
                        if let Some(tx) = events {
                            let _ = tx.send(BatchEvent::PageFinished {
                                url_path: route.url_path.clone(),
                                outcome,
                            });
                        }
                    }
                    tally
                })
                .reduce(Tally::default, Tally::merge)
        }))
    }

    /// [`process_page`](Self::process_page) with errors and panics turned
    /// into [`PageOutcome::Failed`].
    pub fn process_isolated(&self, route: &RouteInfo) -> PageOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.process_page(route))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("Failed to generate OG image for {}: {e}", route.url_path);
                PageOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                error!("Panic while generating OG image for {}: {message}", route.url_path);
                PageOutcome::Failed(format!("panic: {message}"))
            }
        }
    }

    /// Generate the card for one page.
    pub fn process_page(&self, route: &RouteInfo) -> Result<PageOutcome, PageError> {
        let html = fs::read_to_string(&route.html_path).map_err(|source| PageError::Read {
            path: route.html_path.clone(),
            source,
        })?;
        let doc = Html::parse_document(&html);
        let meta = match card_metadata(&doc, &route.url_path, &self.site_name) {
            Ok(meta) => meta,
            Err(reason) => {
                warn!("Skipping {}: {reason}", route.url_path);
                return Ok(PageOutcome::Skipped(reason));
            }
        };

        let page_type = meta.page_type();
        if page_type == PageType::Photo {
            match self.photo_card(&doc) {
                Ok(bytes) => {
                    let output = route.jpeg_path(&self.jpeg_name);
                    write_output(&output, &bytes)?;
                    info!("Generated: {} -> {} (photo)", route.url_path, file_name(&output));
                    return Ok(PageOutcome::Generated {
                        output,
                        kind: CardKind::Photo,
                    });
                }
                Err(reason) => {
                    warn!("{}: {reason}; using general template", route.url_path);
                }
            }
        }

        let template = Template::for_page(page_type, &meta);
        let scene = build_scene(page_type, &meta, &self.templates);
        let png = self.renderer.render_png(&scene)?;
        write_output(&route.og_path, &png)?;

        let kind = if page_type == PageType::Photo {
            CardKind::PhotoFallback
        } else {
            CardKind::Template(template)
        };
        info!(
            "Generated: {} -> {} ({kind})",
            route.url_path,
            file_name(&route.og_path)
        );
        Ok(PageOutcome::Generated {
            output: route.og_path.clone(),
            kind,
        })
    }

    /// JPEG bytes of a photo card, or why there is none.
    fn photo_card(&self, doc: &Html) -> Result<Vec<u8>, String> {
        let photo = photo_meta_from_document(doc, &self.site_name)
            .ok_or_else(|| "no photo found".to_string())?;
        let plan = plan_photo(
            self.backend,
            &photo,
            &self.dist_root,
            &self.photo,
            &self.dimensions,
        )
        .map_err(|e| e.to_string())?;
        debug!(
            "{}: {} from {}x{}, target width {}",
            plan.candidate.path, plan.strategy, plan.source_width, plan.source_height, plan.target_width
        );
        render_photo(self.backend, &plan, &self.photo).map_err(|e| e.to_string())
    }
}

/// Metadata of a page that gets a card, or the reason it is skipped.
fn card_metadata(doc: &Html, url_path: &str, site_name: &str) -> Result<PageMetadata, SkipReason> {
    let meta = page_meta_from_document(doc, url_path, site_name).ok_or(SkipReason::NoMetadata)?;
    let title = meta.title.trim();
    if title.is_empty() || title == site_name {
        return Err(SkipReason::NoTitle);
    }
    Ok(meta)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), PageError> {
    fs::write(path, bytes).map_err(|source| PageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

// ============================================================================
// Dry run
// ============================================================================

/// What a batch would do with one page, without rendering anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub url_path: String,
    pub page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Layout for the PNG card; photo pages try a JPEG card first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Photo pages: the "Date taken" entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    /// Photo pages: tag links below the photo.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Discover and extract every page, reporting the decisions a batch would
/// make.
pub fn inspect(dist_root: &Path, config: &OgConfig) -> Result<Vec<PageReport>, ScanError> {
    let routes = discover_pages(dist_root, &config.discovery)?;
    Ok(routes
        .iter()
        .map(|route| inspect_page(route, &config.site_name))
        .collect())
}

pub fn inspect_page(route: &RouteInfo, site_name: &str) -> PageReport {
    let mut report = PageReport {
        url_path: route.url_path.clone(),
        page_type: classify_page_type(&route.url_path),
        title: None,
        template: None,
        skipped: None,
        error: None,
        date_taken: None,
        tags: Vec::new(),
    };
    let html = match fs::read_to_string(&route.html_path) {
        Ok(html) => html,
        Err(e) => {
            report.error = Some(format!("cannot read {}: {e}", route.html_path.display()));
            return report;
        }
    };
    let doc = Html::parse_document(&html);
    match card_metadata(&doc, &route.url_path, site_name) {
        Ok(meta) => {
            report.template = Some(Template::for_page(meta.page_type(), &meta));
            report.title = Some(meta.display_headline().to_string());
            let photo = (meta.page_type() == PageType::Photo)
                .then(|| photo_meta_from_document(&doc, site_name))
                .flatten();
            if let Some(photo) = photo {
                report.date_taken = photo.date_taken;
                report.tags = photo.tags;
            }
        }
        Err(reason) => report.skipped = Some(reason),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_JPEG, MockBackend, RecordedOp};
    use crate::imaging::{Dimensions, ProcessingStrategy};
    use crate::test_helpers::{HtmlPage, photo_page_html, test_config, write_page};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn generator<'a>(backend: &'a MockBackend, tmp: &TempDir) -> Generator<'a, MockBackend> {
        let config = test_config(tmp.path());
        Generator::new(backend, &tmp.path().join("dist"), &config, tmp.path()).unwrap()
    }

    fn route(tmp: &TempDir, url_path: &str) -> RouteInfo {
        let dir = tmp.path().join("dist").join(url_path.trim_start_matches('/'));
        RouteInfo {
            url_path: url_path.to_string(),
            html_path: dir.join("index.html"),
            og_path: dir.join("og.png"),
        }
    }

    fn sea_photo(width: u32, height: u32) -> String {
        photo_page_html("Sea | kadykov.com", width, height, &[
            ("/_astro/sea_small.jpg", 450),
            ("/_astro/sea_large.jpg", 2400),
        ])
    }

    // =========================================================================
    // Skip rules
    // =========================================================================

    #[test]
    fn bare_site_name_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/");
        write_page(&r.html_path, &HtmlPage::new("kadykov.com").to_html());

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert_eq!(outcome, PageOutcome::Skipped(SkipReason::NoTitle));
        assert!(!r.og_path.exists());
    }

    #[test]
    fn missing_title_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/empty");
        write_page(&r.html_path, "<html><head></head><body></body></html>");

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert_eq!(outcome, PageOutcome::Skipped(SkipReason::NoTitle));
    }

    // =========================================================================
    // Template cards
    // =========================================================================

    #[test]
    fn general_page_gets_png_at_canvas_size() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/about");
        write_page(
            &r.html_path,
            &HtmlPage::new("About | kadykov.com").description("Hello").to_html(),
        );

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert_eq!(
            outcome,
            PageOutcome::Generated {
                output: r.og_path.clone(),
                kind: CardKind::Template(Template::General),
            }
        );
        let img = image::open(&r.og_path).unwrap();
        assert_eq!((img.width(), img.height()), (600, 315));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn dated_blog_post_uses_blog_template() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/blog/post");
        write_page(
            &r.html_path,
            &HtmlPage::new("Post | kadykov.com")
                .published("2024-01-05")
                .tags(&["rust"])
                .to_html(),
        );

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert!(matches!(
            outcome,
            PageOutcome::Generated {
                kind: CardKind::Template(Template::Blog),
                ..
            }
        ));
    }

    // =========================================================================
    // Photo cards
    // =========================================================================

    #[test]
    fn photo_page_writes_jpeg() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2400,
            height: 1200,
        }]);
        let r = route(&tmp, "/photo/sea");
        write_page(&r.html_path, &sea_photo(4000, 2000));

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        let jpeg = r.jpeg_path("og.jpg");
        assert_eq!(
            outcome,
            PageOutcome::Generated {
                output: jpeg.clone(),
                kind: CardKind::Photo,
            }
        );
        assert_eq!(fs::read(&jpeg).unwrap(), MOCK_JPEG);
        assert!(!r.og_path.exists());

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p.ends_with("_astro/sea_large.jpg")));
        assert!(matches!(
            &ops[1],
            RecordedOp::Compose {
                strategy: ProcessingStrategy::Fit,
                canvas: (600, 315),
                ..
            }
        ));
    }

    #[test]
    fn tall_photo_is_cropped_square() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2400,
            height: 4800,
        }]);
        let r = route(&tmp, "/photo/tall");
        write_page(&r.html_path, &sea_photo(2000, 4000));

        generator(&backend, &tmp).process_page(&r).unwrap();
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Compose {
                strategy: ProcessingStrategy::Crop { target_aspect_ratio },
                ..
            } if (*target_aspect_ratio - 1.0).abs() < 1e-9
        ));
    }

    #[test]
    fn shared_photo_source_is_measured_once() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2400,
            height: 1200,
        }]);
        let first = route(&tmp, "/photo/sea");
        let second = route(&tmp, "/photo/sea-again");
        write_page(&first.html_path, &sea_photo(4000, 2000));
        write_page(&second.html_path, &sea_photo(4000, 2000));

        let generator = generator(&backend, &tmp);
        for r in [&first, &second] {
            assert!(matches!(
                generator.process_page(r).unwrap(),
                PageOutcome::Generated { kind: CardKind::Photo, .. }
            ));
        }
        assert_eq!(generator.dimensions.len(), 1);
        let identified = backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Identify(_)))
            .count();
        assert_eq!(identified, 1);
    }

    #[test]
    fn compositor_failure_falls_back_to_general_png() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend {
            fail_compose: true,
            ..MockBackend::with_dimensions(vec![Dimensions {
                width: 2400,
                height: 1200,
            }])
        };
        let r = route(&tmp, "/photo/sea");
        write_page(&r.html_path, &sea_photo(4000, 2000));

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert_eq!(
            outcome,
            PageOutcome::Generated {
                output: r.og_path.clone(),
                kind: CardKind::PhotoFallback,
            }
        );
        assert!(r.og_path.exists());
        assert!(!r.jpeg_path("og.jpg").exists());
    }

    #[test]
    fn photo_page_without_photo_falls_back() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/photo/missing");
        write_page(&r.html_path, &HtmlPage::new("Missing | kadykov.com").to_html());

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert!(matches!(
            outcome,
            PageOutcome::Generated {
                kind: CardKind::PhotoFallback,
                ..
            }
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn undecodable_candidates_fall_back() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/photo/avif");
        write_page(
            &r.html_path,
            &photo_page_html("Avif | kadykov.com", 4000, 2000, &[("/_astro/a.avif", 2400)]),
        );

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert!(matches!(
            outcome,
            PageOutcome::Generated {
                kind: CardKind::PhotoFallback,
                ..
            }
        ));
    }

    #[test]
    fn candidate_outside_dist_falls_back() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2400,
            height: 1200,
        }]);
        let r = route(&tmp, "/photo/escape");
        write_page(
            &r.html_path,
            &photo_page_html("Escape | kadykov.com", 4000, 2000, &[("/../../secret.jpg", 2400)]),
        );

        let outcome = generator(&backend, &tmp).process_page(&r).unwrap();
        assert!(matches!(
            outcome,
            PageOutcome::Generated {
                kind: CardKind::PhotoFallback,
                ..
            }
        ));
        assert!(backend.get_operations().is_empty());
        assert!(r.og_path.exists());
    }

    // =========================================================================
    // Isolation
    // =========================================================================

    #[test]
    fn unreadable_page_is_failed_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let r = route(&tmp, "/gone");

        let outcome = generator(&backend, &tmp).process_isolated(&r);
        match outcome {
            PageOutcome::Failed(message) => assert!(message.contains("index.html")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn tally_counts_failures_as_skipped() {
        let mut tally = Tally::default();
        tally.record(&PageOutcome::Failed("x".into()));
        tally.record(&PageOutcome::Skipped(SkipReason::NoTitle));
        tally.record(&PageOutcome::Generated {
            output: PathBuf::from("og.png"),
            kind: CardKind::Photo,
        });
        assert_eq!((tally.generated, tally.skipped, tally.failed), (1, 2, 1));
        let merged = tally.merge(tally);
        assert_eq!((merged.generated, merged.skipped, merged.failed), (2, 4, 2));
    }

    #[test]
    fn panic_message_from_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }

    // =========================================================================
    // Batch
    // =========================================================================

    #[test]
    fn batch_emits_events_and_summary() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let dist = tmp.path().join("dist");
        write_page(&dist.join("index.html"), &HtmlPage::new("kadykov.com").to_html());
        write_page(
            &dist.join("about/index.html"),
            &HtmlPage::new("About | kadykov.com").to_html(),
        );
        write_page(
            &dist.join("blog/post/index.html"),
            &HtmlPage::new("Post | kadykov.com").published("2024-01-05").to_html(),
        );

        let (tx, rx) = mpsc::channel();
        let backend = MockBackend::new();
        let summary = run_with_backend(&backend, &dist, &config, tmp.path(), Some(tx)).unwrap();
        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.generated, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], BatchEvent::Started { pages: 3, .. }));
        assert!(matches!(events[4], BatchEvent::Finished(s) if s.generated == 2));
        let finished = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::PageFinished { .. }))
            .count();
        assert_eq!(finished, 3);
    }

    #[test]
    fn missing_logo_aborts() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.assets.logo = PathBuf::from("missing.svg");
        fs::create_dir_all(tmp.path().join("dist")).unwrap();

        let err = run_with_backend(
            &MockBackend::new(),
            &tmp.path().join("dist"),
            &config,
            tmp.path(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Logo(_)));
    }

    #[test]
    fn missing_font_aborts() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.assets.fonts = vec![PathBuf::from("fonts/Bitter.ttf")];
        fs::create_dir_all(tmp.path().join("dist")).unwrap();

        let err = run_with_backend(
            &MockBackend::new(),
            &tmp.path().join("dist"),
            &config,
            tmp.path(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Font(FontError::Io { .. })));
    }

    #[test]
    fn missing_dist_aborts() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let err = run_with_backend(
            &MockBackend::new(),
            &tmp.path().join("nope"),
            &config,
            tmp.path(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Scan(ScanError::MissingRoot(_))));
    }

    // =========================================================================
    // Dry run
    // =========================================================================

    #[test]
    fn inspect_reports_without_writing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let dist = tmp.path().join("dist");
        write_page(&dist.join("index.html"), &HtmlPage::new("kadykov.com").to_html());
        write_page(
            &dist.join("blog/post/index.html"),
            &HtmlPage::new("Post | kadykov.com").published("2024-01-05").to_html(),
        );
        write_page(&dist.join("photo/sea/index.html"), &sea_photo(4000, 2000));

        let reports = inspect(&dist, &config).unwrap();
        assert_eq!(reports.len(), 3);

        let post = &reports[0];
        assert_eq!(post.url_path, "/blog/post");
        assert_eq!(post.template, Some(Template::Blog));
        assert_eq!(post.title.as_deref(), Some("Post"));

        let home = &reports[1];
        assert_eq!(home.skipped, Some(SkipReason::NoTitle));
        assert!(home.template.is_none());

        let photo = &reports[2];
        assert_eq!(photo.page_type, PageType::Photo);
        assert_eq!(photo.template, Some(Template::General));
        assert_eq!(photo.date_taken.as_deref(), Some("June 3, 2023"));
        assert_eq!(photo.tags, vec!["landscape", "sea"]);
        assert!(post.date_taken.is_none());
        assert!(post.tags.is_empty());

        assert!(!dist.join("blog/post/og.png").exists());
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(json[1]["skipped"], "no_title");
        assert_eq!(json[0]["page_type"], "blog");
        assert!(json[0].get("tags").is_none());
        assert_eq!(json[2]["date_taken"], "June 3, 2023");
    }
}
