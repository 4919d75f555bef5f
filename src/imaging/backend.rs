//! Image compositing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations photo cards need:
//! identify (read a source's dimensions) and compose (crop, fit, center,
//! encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked. Tests use a mock that records calls.

use super::params::ComposeParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Compositor failure. Every variant names the source image.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Processing {path} failed: {message}")]
    ProcessingFailed { path: PathBuf, message: String },
}

impl BackendError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        BackendError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn failed(path: &Path, message: impl Into<String>) -> Self {
        BackendError::ProcessingFailed {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// The source image the failure concerns.
    pub fn path(&self) -> &Path {
        match self {
            BackendError::Io { path, .. } | BackendError::ProcessingFailed { path, .. } => path,
        }
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image compositing backends.
///
/// `Sync` so one backend instance can be shared by every worker.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Build a photo card and return the encoded JPEG bytes.
    fn compose(&self, params: &ComposeParams) -> Result<Vec<u8>, BackendError>;
}
