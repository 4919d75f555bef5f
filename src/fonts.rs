//! Font set used by the rasterizer.
//!
//! Configured font files are read into one `fontdb::Database` the first time
//! any worker needs it. The load goes through a [`OnceCell`]: concurrent
//! first callers block on the same load and then share the same
//! `Arc<Database>`. Nothing mutates the database afterwards.
//!
//! A missing or unreadable font file is an error, surfaced at batch setup.
//! An empty font list is allowed (with a warning) so that tests and CI can
//! rasterize cards without shipping font files; text then renders nothing.

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use resvg::usvg::fontdb::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AssetsConfig, TypographyConfig};

#[derive(Error, Debug)]
pub enum FontError {
    #[error("cannot read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} contains no usable font faces")]
    NoFaces(PathBuf),
}

/// Lazily loaded, shared font database.
#[derive(Debug)]
pub struct FontLibrary {
    files: Vec<PathBuf>,
    system_fonts: bool,
    sans_family: String,
    serif_family: String,
    db: OnceCell<Arc<Database>>,
}

impl FontLibrary {
    /// `assets` paths must already be resolved against the config directory.
    pub fn new(assets: &AssetsConfig, typography: &TypographyConfig) -> Self {
        Self {
            files: assets.fonts.clone(),
            system_fonts: assets.system_fonts,
            sans_family: typography.sans_family.clone(),
            serif_family: typography.serif_family.clone(),
            db: OnceCell::new(),
        }
    }

    /// The shared database, loading it on first use.
    pub fn database(&self) -> Result<Arc<Database>, FontError> {
        self.db
            .get_or_try_init(|| self.load().map(Arc::new))
            .cloned()
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        self.db.get().is_some()
    }

    fn load(&self) -> Result<Database, FontError> {
        let mut db = Database::new();
        for path in &self.files {
            load_font_file(&mut db, path)?;
        }
        if self.system_fonts {
            db.load_system_fonts();
        }
        if db.is_empty() {
            warn!("No fonts loaded; card text will not be drawn");
        }

        db.set_sans_serif_family(self.sans_family.clone());
        db.set_serif_family(self.serif_family.clone());
        info!("Loaded {} font faces", db.len());
        Ok(db)
    }
}

fn load_font_file(db: &mut Database, path: &Path) -> Result<(), FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let before = db.len();
    db.load_font_data(data);
    let added = db.len() - before;
    if added == 0 {
        return Err(FontError::NoFaces(path.to_path_buf()));
    }
    debug!("{}: {added} faces", path.display());
    Ok(())
}
