//! Generator configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML value and the user's file is merged on top key by key,
//! so a config file only needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "kadykov.com"   # Bare site name; also the `<title>` suffix
//!
//! [canvas]
//! width = 1200
//! height = 630
//!
//! [discovery]
//! page_index = "index.html"
//! excluded_dirs = ["og", "_astro"]
//! png_name = "og.png"
//! jpeg_name = "og.jpg"
//!
//! [assets]
//! logo = "public/icon.svg"
//! fonts = []
//! system_fonts = false
//!
//! [photo]
//! crop_threshold = 1.0
//! candidate_min_width = 450
//! jpeg_quality = 85
//! background = "#ffffff"
//! smart_crop = true
//!
//! [png]
//! compression = "best"      # fast | default | best
//! palette = true
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::text_fit::CharWidthWeights;

/// File name looked up in the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OgConfig {
    /// Bare site name. A page whose title is exactly this is skipped, and
    /// ` | <site_name>` is stripped from page titles.
    pub site_name: String,
    pub canvas: CanvasConfig,
    pub discovery: DiscoveryConfig,
    pub assets: AssetsConfig,
    pub typography: TypographyConfig,
    /// Per-character-class width weights for the text-fit estimator.
    pub text: CharWidthWeights,
    pub photo: PhotoConfig,
    pub png: PngConfig,
    pub colors: Palette,
    pub processing: ProcessingConfig,
}

impl Default for OgConfig {
    fn default() -> Self {
        Self {
            site_name: "kadykov.com".to_string(),
            canvas: CanvasConfig::default(),
            discovery: DiscoveryConfig::default(),
            assets: AssetsConfig::default(),
            typography: TypographyConfig::default(),
            text: CharWidthWeights::default(),
            photo: PhotoConfig::default(),
            png: PngConfig::default(),
            colors: Palette::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OgConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Validation(
                "canvas.width and canvas.height must be non-zero".into(),
            ));
        }
        // JPEG frame headers store 16-bit dimensions.
        let max = u32::from(u16::MAX);
        if self.canvas.width > max || self.canvas.height > max {
            return Err(ConfigError::Validation(format!(
                "canvas.width and canvas.height must be at most {max}"
            )));
        }
        if !(1..=100).contains(&self.photo.jpeg_quality) {
            return Err(ConfigError::Validation(
                "photo.jpeg_quality must be 1-100".into(),
            ));
        }
        if !(self.photo.crop_threshold.is_finite() && self.photo.crop_threshold > 0.0) {
            return Err(ConfigError::Validation(
                "photo.crop_threshold must be a positive number".into(),
            ));
        }
        let w = &self.text;
        if [w.wide, w.narrow, w.upper, w.normal]
            .iter()
            .any(|v| !(v.is_finite() && *v > 0.0))
        {
            return Err(ConfigError::Validation(
                "text weights must be positive numbers".into(),
            ));
        }
        if self.discovery.page_index.is_empty() {
            return Err(ConfigError::Validation(
                "discovery.page_index must not be empty".into(),
            ));
        }
        parse_hex_color(&self.photo.background).ok_or_else(|| {
            ConfigError::Validation(format!(
                "photo.background is not a hex color: {}",
                self.photo.background
            ))
        })?;
        for (key, value) in self.colors.entries() {
            if parse_hex_color(value).is_none() {
                return Err(ConfigError::Validation(format!(
                    "colors.{key} is not a hex color: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Output canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
        }
    }
}

/// Which files in the build output count as pages and where images go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// File name that marks a routable page.
    pub page_index: String,
    /// Directory names never descended into (generated assets).
    pub excluded_dirs: Vec<String>,
    /// Output file name for template cards, next to the page index.
    pub png_name: String,
    /// Output file name for photo cards, next to the page index.
    pub jpeg_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_index: "index.html".to_string(),
            excluded_dirs: vec!["og".to_string(), "_astro".to_string()],
            png_name: "og.png".to_string(),
            jpeg_name: "og.jpg".to_string(),
        }
    }
}

/// Logo and font files, relative to the config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub logo: PathBuf,
    /// Font files (TTF/OTF) registered with the rasterizer.
    pub fonts: Vec<PathBuf>,
    /// Also register the fonts installed on the host.
    pub system_fonts: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            logo: PathBuf::from("public/icon.svg"),
            fonts: Vec::new(),
            system_fonts: false,
        }
    }
}

impl AssetsConfig {
    /// Resolve relative asset paths against `base`.
    pub fn resolved(&self, base: &Path) -> AssetsConfig {
        AssetsConfig {
            logo: base.join(&self.logo),
            fonts: self.fonts.iter().map(|f| base.join(f)).collect(),
            system_fonts: self.system_fonts,
        }
    }
}

/// Font families used by the card templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypographyConfig {
    /// Headings, tags, dates.
    pub sans_family: String,
    /// Descriptions and subtitles.
    pub serif_family: String,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            sans_family: "Source Sans 3".to_string(),
            serif_family: "Bitter".to_string(),
        }
    }
}

/// Photo page rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoConfig {
    /// Photos with `width / height` at or above this are fitted as-is;
    /// narrower ones are cropped to exactly this ratio first.
    pub crop_threshold: f64,
    /// Lower bound for the srcset candidate width.
    pub candidate_min_width: u32,
    pub jpeg_quality: u32,
    /// Canvas colour behind the fitted photo.
    pub background: String,
    /// Attention-based crop anchor; `false` crops around the centre.
    pub smart_crop: bool,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            crop_threshold: 1.0,
            candidate_min_width: 450,
            jpeg_quality: 85,
            background: "#ffffff".to_string(),
            smart_crop: true,
        }
    }
}

/// zlib effort for template PNGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PngConfig {
    pub compression: PngCompression,
    /// Write an indexed PNG when the card has at most 256 colours.
    pub palette: bool,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: PngCompression::Best,
            palette: true,
        }
    }
}

/// Card colours (hex).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub background: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub brand_primary: String,
    pub brand_accent: String,
    pub surface: String,
    pub tag_background: String,
    /// Fill of the background pattern shapes.
    pub pattern: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: "#f8f8f7".to_string(),
            text_primary: "#363636".to_string(),
            text_secondary: "#666666".to_string(),
            brand_primary: "#2f7cab".to_string(),
            brand_accent: "#feae39".to_string(),
            surface: "#ffffff".to_string(),
            tag_background: "#f0f0f0".to_string(),
            pattern: "#ececea".to_string(),
        }
    }
}

impl Palette {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("background", &self.background),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("brand_primary", &self.brand_primary),
            ("brand_accent", &self.brand_accent),
            ("surface", &self.surface),
            ("tag_background", &self.tag_background),
            ("pattern", &self.pattern),
        ]
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
///
/// Never returns zero.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.min(cores))
        .unwrap_or(cores)
        .max(1)
}

/// Parse `#rgb` or `#rrggbb` into RGB bytes.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 16 + v;
            }
            Some(rgb)
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(rgb)
        }
        _ => None,
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(OgConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the base, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<OgConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OgConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<OgConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ogcard configuration
# ====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Bare site name. Pages whose <title> is exactly this are skipped, and
# " | <site_name>" is stripped from every page title.
site_name = "kadykov.com"

# ---------------------------------------------------------------------------
# Output canvas
# ---------------------------------------------------------------------------
[canvas]
width = 1200
height = 630

# ---------------------------------------------------------------------------
# Page discovery in the build output
# ---------------------------------------------------------------------------
[discovery]
# Every file with this name is one page.
page_index = "index.html"
# Directories that hold generated assets, never scanned.
excluded_dirs = ["og", "_astro"]
# Output names, written next to the page index.
png_name = "og.png"
jpeg_name = "og.jpg"

# ---------------------------------------------------------------------------
# Assets (paths relative to this file)
# ---------------------------------------------------------------------------
[assets]
logo = "public/icon.svg"
# TTF/OTF files for the card typography, e.g.
# fonts = ["fonts/SourceSans3-ExtraLight.ttf", "fonts/Bitter-Medium.ttf"]
fonts = []
# Also use fonts installed on this machine.
system_fonts = false

[typography]
sans_family = "Source Sans 3"
serif_family = "Bitter"

# ---------------------------------------------------------------------------
# Text-fit width estimation: relative width of character classes
# ---------------------------------------------------------------------------
[text]
wide = 1.3      # m w M W @
narrow = 0.4    # i l I j . , ; : ' " ! |
upper = 1.1     # other uppercase letters
normal = 1.0    # everything else

# ---------------------------------------------------------------------------
# Photo pages (rendered as JPEG straight from the photo)
# ---------------------------------------------------------------------------
[photo]
# Photos at least this wide (width / height) are fitted as they are;
# narrower photos are cropped to exactly this ratio first.
crop_threshold = 1.0
# Smallest srcset candidate width worth considering.
candidate_min_width = 450
jpeg_quality = 85
background = "#ffffff"
# Attention-based crop anchor; false crops around the centre.
smart_crop = true

# ---------------------------------------------------------------------------
# Template card PNG encoding
# ---------------------------------------------------------------------------
[png]
compression = "best"   # fast | default | best
palette = true         # indexed PNG when the card has <= 256 colours

[colors]
background = "#f8f8f7"
text_primary = "#363636"
text_secondary = "#666666"
brand_primary = "#2f7cab"
brand_accent = "#feae39"
surface = "#ffffff"
tag_background = "#f0f0f0"
pattern = "#ececea"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
