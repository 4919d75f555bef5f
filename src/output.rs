//! CLI output formatting for batch runs and dry runs.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! 12 pages, 4 workers
//! /about → about/og.png (general)
//! /blog/my-post → blog/my-post/og.png (blog)
//! /photo/dsc-1244 → photo/dsc-1244/og.jpg (photo)
//! / skipped: no title
//! /broken FAILED: cannot read dist/broken/index.html: ...
//!
//! Generated 10 images, skipped 2 (1 failed)
//! Total time: 3.42s (2.9 images/sec)
//! ```
//!
//! ## Check
//!
//! ```text
//! /about [general] About
//! /blog/my-post [blog] My post
//! / skipped: no title
//!
//! 3 pages, 2 would get a card
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::process::{BatchEvent, BatchSummary, PageOutcome, PageReport};
use std::path::Path;

/// Output path relative to the output root, for display.
fn relative(path: &Path, dist_root: &Path) -> String {
    path.strip_prefix(dist_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Generate
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent, dist_root: &Path) -> Vec<String> {
    match event {
        BatchEvent::Started { pages, workers } => {
            vec![format!("{pages} pages, {workers} workers")]
        }
        BatchEvent::PageFinished { url_path, outcome } => {
            let line = match outcome {
                PageOutcome::Generated { output, kind } => {
                    format!("{url_path} \u{2192} {} ({kind})", relative(output, dist_root))
                }
                PageOutcome::Skipped(reason) => format!("{url_path} skipped: {reason}"),
                PageOutcome::Failed(error) => format!("{url_path} FAILED: {error}"),
            };
            vec![line]
        }
        BatchEvent::Finished(summary) => {
            let mut lines = vec![String::new()];
            lines.extend(format_summary(summary));
            lines
        }
    }
}

/// Counts and throughput of a finished batch.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let skipped = if summary.failed > 0 {
        format!("skipped {} ({} failed)", summary.skipped, summary.failed)
    } else {
        format!("skipped {}", summary.skipped)
    };
    vec![
        format!("Generated {} images, {skipped}", summary.generated),
        format!(
            "Total time: {:.2}s ({:.1} images/sec)",
            summary.elapsed.as_secs_f64(),
            summary.pages_per_second()
        ),
    ]
}

pub fn print_batch_event(event: &BatchEvent, dist_root: &Path) {
    for line in format_batch_event(event, dist_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(reports: &[PageReport]) -> Vec<String> {
    let mut lines = Vec::with_capacity(reports.len() + 2);
    for report in reports {
        let url = &report.url_path;
        let line = match (&report.error, report.skipped, report.template) {
            (Some(error), _, _) => format!("{url} FAILED: {error}"),
            (None, Some(reason), _) => format!("{url} skipped: {reason}"),
            (None, None, Some(template)) => {
                let title = report.title.as_deref().unwrap_or_default();
                if report.page_type == crate::types::PageType::Photo {
                    let mut line = format!("{url} [photo, fallback {template}] {title}");
                    if let Some(taken) = &report.date_taken {
                        line.push_str(&format!(" \u{00b7} {taken}"));
                    }
                    if !report.tags.is_empty() {
                        line.push_str(&format!(" \u{00b7} {}", report.tags.join(", ")));
                    }
                    line
                } else {
                    format!("{url} [{template}] {title}")
                }
            }
            (None, None, None) => url.to_string(),
        };
        lines.push(line);
    }

    let cards = reports.iter().filter(|r| r.template.is_some()).count();
    lines.push(String::new());
    lines.push(format!(
        "{} pages, {cards} would get a card",
        reports.len()
    ));
    lines
}

pub fn print_check_report(reports: &[PageReport]) {
    for line in format_check_report(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
