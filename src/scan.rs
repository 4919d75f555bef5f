//! Page discovery.
//!
//! Walks the build output and turns every page index into a [`RouteInfo`].
//! Nothing is read besides directory entries; whether a page actually gets
//! a card is decided later, per page.
//!
//! ## Directory Structure
//!
//! ```text
//! dist/                          # Output root
//! ├── index.html                 # → /
//! ├── about/index.html           # → /about
//! ├── blog/
//! │   ├── index.html             # → /blog
//! │   └── my-post/index.html     # → /blog/my-post
//! ├── photos/index.html          # → /photos
//! ├── photo/dsc-1244/index.html  # → /photo/dsc-1244
//! ├── _astro/                    # Asset directory, never entered
//! └── og/                        # Excluded
//! ```
//!
//! Entries are visited in file-name order so runs are reproducible.

use crate::config::DiscoveryConfig;
use crate::types::RouteInfo;
use log::warn;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("output directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Find every page index under `root`.
pub fn discover_pages(root: &Path, discovery: &DiscoveryConfig) -> Result<Vec<RouteInfo>, ScanError> {
    if !root.exists() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut routes = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, &discovery.excluded_dirs));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == discovery.page_index.as_str() {
            routes.push(route_for(root, entry.path(), &discovery.png_name));
        }
    }
    Ok(routes)
}

fn is_excluded(entry: &DirEntry, excluded: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excluded.iter().any(|e| e == name))
}

/// Route for the page index at `html_path`.
pub fn route_for(root: &Path, html_path: &Path, png_name: &str) -> RouteInfo {
    let dir = html_path.parent().unwrap_or(root);
    RouteInfo {
        url_path: url_path(root, dir),
        html_path: html_path.to_path_buf(),
        og_path: dir.join(png_name),
    }
}

/// `/` for the root, `/a/b` for `root/a/b`.
fn url_path(root: &Path, dir: &Path) -> String {
    let segments: Vec<String> = dir
        .strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", segments.join("/"))
}
