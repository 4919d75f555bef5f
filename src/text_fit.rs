//! Text fitting without font metrics.
//!
//! Rendered width is approximated from character classes: each character
//! contributes a class weight, the sum is scaled by `size × char_width_ratio`,
//! and letter spacing adds `size × letter_spacing` between adjacent characters.
//! Line counts come from simulating greedy word wrap with that estimate.
//!
//! | Class | Characters | Default weight |
//! |---|---|---|
//! | wide | `m w M W @` | 1.3 |
//! | narrow | `i l I j . , ; : ' " ! \|` | 0.4 |
//! | upper | other `A`–`Z` | 1.1 |
//! | normal | everything else | 1.0 |
//!
//! The weights are configuration (`[text]` in `config.toml`). Nothing here
//! can fail: when no candidate size fits, the smallest one is used and the
//! text overflows its box.

use serde::{Deserialize, Serialize};

/// Ellipsis appended to truncated text.
pub const ELLIPSIS: &str = "…";

/// Relative width of each character class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CharWidthWeights {
    pub wide: f32,
    pub narrow: f32,
    pub upper: f32,
    pub normal: f32,
}

impl Default for CharWidthWeights {
    fn default() -> Self {
        Self {
            wide: 1.3,
            narrow: 0.4,
            upper: 1.1,
            normal: 1.0,
        }
    }
}

impl CharWidthWeights {
    fn weight(&self, c: char) -> f32 {
        match c {
            'm' | 'w' | 'M' | 'W' | '@' => self.wide,
            'i' | 'l' | 'I' | 'j' | '.' | ',' | ';' | ':' | '\'' | '"' | '!' | '|' => self.narrow,
            'A'..='Z' => self.upper,
            _ => self.normal,
        }
    }
}

/// Size-dependent inputs of the width estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub size: f32,
    /// Average glyph advance as a fraction of `size`.
    pub char_width_ratio: f32,
    /// Extra advance between characters, in em.
    pub letter_spacing: f32,
}

/// One row of the title size table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizeCandidate {
    pub size: f32,
    pub weight: u16,
    pub char_width_ratio: f32,
    pub line_height: f32,
    pub letter_spacing: f32,
}

impl FontSizeCandidate {
    pub fn metrics(&self) -> TextMetrics {
        TextMetrics {
            size: self.size,
            char_width_ratio: self.char_width_ratio,
            letter_spacing: self.letter_spacing,
        }
    }

    /// Height of `lines` lines set at this size.
    pub fn block_height(&self, lines: usize) -> f32 {
        lines as f32 * self.size * self.line_height
    }
}

/// Title sizes, largest first. Larger sizes use lighter weights so stroke
/// thickness stays roughly constant; heavier weights set wider.
pub static FONT_SIZE_CANDIDATES: [FontSizeCandidate; 5] = [
    FontSizeCandidate {
        size: 80.0,
        weight: 200,
        char_width_ratio: 0.48,
        line_height: 1.15,
        letter_spacing: -0.02,
    },
    FontSizeCandidate {
        size: 72.0,
        weight: 300,
        char_width_ratio: 0.50,
        line_height: 1.15,
        letter_spacing: -0.02,
    },
    FontSizeCandidate {
        size: 64.0,
        weight: 400,
        char_width_ratio: 0.52,
        line_height: 1.15,
        letter_spacing: -0.02,
    },
    FontSizeCandidate {
        size: 56.0,
        weight: 500,
        char_width_ratio: 0.54,
        line_height: 1.15,
        letter_spacing: -0.02,
    },
    FontSizeCandidate {
        size: 48.0,
        weight: 600,
        char_width_ratio: 0.56,
        line_height: 1.15,
        letter_spacing: -0.02,
    },
];

/// Estimated rendered width of `text` in pixels.
pub fn estimate_text_width(text: &str, metrics: &TextMetrics, weights: &CharWidthWeights) -> f32 {
    let mut effective = 0.0f32;
    let mut chars = 0usize;
    for c in text.chars() {
        effective += weights.weight(c);
        chars += 1;
    }
    let spacing = chars.saturating_sub(1) as f32 * metrics.size * metrics.letter_spacing;
    effective * metrics.size * metrics.char_width_ratio + spacing
}

/// Greedy word wrap against the width estimate.
///
/// A word too long for any line gets a line of its own; words are never split.
pub fn wrap_words(
    text: &str,
    max_width: f32,
    metrics: &TextMetrics,
    weights: &CharWidthWeights,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if estimate_text_width(&candidate, metrics, weights) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Number of lines `text` wraps to; zero for blank text.
pub fn estimate_line_count(
    text: &str,
    max_width: f32,
    metrics: &TextMetrics,
    weights: &CharWidthWeights,
) -> usize {
    wrap_words(text, max_width, metrics, weights).len()
}

/// Pick the largest table size at which `text` fits.
///
/// A size fits when it wraps to at most `max_lines` lines and, when
/// `max_height` is given, those lines are no taller than it. Falls back to
/// the smallest size.
pub fn select_font_size(
    text: &str,
    max_width: f32,
    max_lines: usize,
    max_height: Option<f32>,
    weights: &CharWidthWeights,
) -> &'static FontSizeCandidate {
    let smallest = &FONT_SIZE_CANDIDATES[FONT_SIZE_CANDIDATES.len() - 1];
    FONT_SIZE_CANDIDATES
        .iter()
        .find(|candidate| {
            let lines = estimate_line_count(text, max_width, &candidate.metrics(), weights);
            lines <= max_lines
                && max_height.is_none_or(|limit| candidate.block_height(lines) <= limit)
        })
        .unwrap_or(smallest)
}

/// Longest word-boundary prefix of `text` that still fits in `max_lines`
/// once an ellipsis is appended.
///
/// Returns `text` (minus trailing whitespace) when every word fits. The
/// result is always a slice of the input; the ellipsis is not included.
pub fn truncate_to_fit(
    text: &str,
    max_width: f32,
    max_lines: usize,
    metrics: &TextMetrics,
    weights: &CharWidthWeights,
) -> String {
    if max_lines == 0 {
        return String::new();
    }
    let mut end = 0;
    for (_, word_end) in word_spans(text) {
        let prefix = &text[..word_end];
        let with_ellipsis = format!("{prefix}{ELLIPSIS}");
        if estimate_line_count(&with_ellipsis, max_width, metrics, weights) > max_lines {
            return text[..end].to_string();
        }
        end = word_end;
    }
    text[..end].to_string()
}

/// `text` if it already fits in `max_lines`, otherwise the truncated prefix
/// followed by an ellipsis.
pub fn ellipsize(
    text: &str,
    max_width: f32,
    max_lines: usize,
    metrics: &TextMetrics,
    weights: &CharWidthWeights,
) -> String {
    if estimate_line_count(text, max_width, metrics, weights) <= max_lines {
        return text.to_string();
    }
    let prefix = truncate_to_fit(text, max_width, max_lines, metrics, weights);
    let prefix = prefix.trim_end();
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}{ELLIPSIS}")
    }
}

/// Byte spans of the whitespace-separated words of `text`.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}
