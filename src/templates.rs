//! Card layouts per page type.
//!
//! [`build_scene`] is pure: metadata and context in, [`Scene`] out. All
//! measuring goes through the estimator in [`text_fit`](crate::text_fit), so
//! layout decisions are made before any font is loaded.
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │  ┌──────────────────────────────────────────────┐  │  pattern background
//! │  │         ┃ KICKER (gallery)                   │  │  card inset 30
//! │  │  LOGO   ┃ Title, auto-sized                  │  │
//! │  │ 140×140 ┃ Subtitle / description (serif)     │  │  text column 880 wide
//! │  │           January 5, 2024                    │  │
//! │  │           [tag] [tag] [+2 more]              │  │
//! │  └──────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Blocks are stacked with a fixed gap and centered vertically in the content
//! area. The title gets whatever height the other blocks leave, so its size
//! depends on how long the subtitle turned out.

use crate::config::{OgConfig, Palette};
use crate::imaging::Canvas;
use crate::scene::{FontSpec, Image, Node, Rect, Scene, Text};
use crate::text_fit::{
    CharWidthWeights, TextMetrics, ellipsize, estimate_text_width, select_font_size, wrap_words,
};
use crate::types::{PageMetadata, PageType};
use chrono::NaiveDate;
use serde::Serialize;

const CARD_INSET: f32 = 30.0;
const CARD_RADIUS: f32 = 8.0;
const PADDING: f32 = 60.0;
const LOGO_SIZE: f32 = 140.0;
const LOGO_GAP: f32 = 40.0;
const BAR_WIDTH: f32 = 4.0;
const BAR_MARGIN: f32 = 16.0;
const BLOCK_GAP: f32 = 16.0;

const BODY: Style = Style {
    size: 22.0,
    weight: 500,
    char_width_ratio: 0.5,
    line_height: 1.5,
    letter_spacing: 0.0,
};
const DATE: Style = Style {
    size: 16.0,
    weight: 400,
    char_width_ratio: 0.5,
    line_height: 1.5,
    letter_spacing: 0.0,
};
const KICKER: Style = Style {
    size: 16.0,
    weight: 700,
    char_width_ratio: 0.56,
    line_height: 1.5,
    letter_spacing: 0.08,
};
const PILL: Style = Style {
    size: 14.0,
    weight: 600,
    char_width_ratio: 0.56,
    line_height: 1.2,
    letter_spacing: 0.0,
};
const PILL_PAD_X: f32 = 12.0;
const PILL_PAD_Y: f32 = 6.0;
const PILL_GAP: f32 = 8.0;
const PILL_RADIUS: f32 = 4.0;
/// Gap between the date line and the tag row.
const META_GAP: f32 = 10.0;

const GALLERY_KICKER: &str = "Photo gallery";

/// Layout actually used for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    General,
    Blog,
    Gallery,
}

impl Template {
    /// Blog pages without a publish date and photo pages use the general
    /// layout.
    pub fn for_page(page_type: PageType, meta: &PageMetadata) -> Self {
        match page_type {
            PageType::Blog if meta.pub_date.is_some() => Template::Blog,
            PageType::Gallery => Template::Gallery,
            _ => Template::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Template::General => "general",
            Template::Blog => "blog",
            Template::Gallery => "gallery",
        }
    }

    fn max_title_lines(self) -> usize {
        match self {
            Template::General => 3,
            Template::Blog | Template::Gallery => 2,
        }
    }

    fn max_body_lines(self) -> usize {
        match self {
            Template::General => 4,
            Template::Blog | Template::Gallery => 3,
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a template needs besides the page itself.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub canvas: Canvas,
    pub colors: Palette,
    pub sans_family: String,
    pub serif_family: String,
    pub weights: CharWidthWeights,
    /// Logo as a `data:` URL.
    pub logo: Option<String>,
    pub max_tags: usize,
}

impl TemplateContext {
    pub fn from_config(config: &OgConfig, logo: Option<String>) -> Self {
        Self {
            canvas: config.canvas.into(),
            colors: config.colors.clone(),
            sans_family: config.typography.sans_family.clone(),
            serif_family: config.typography.serif_family.clone(),
            weights: config.text,
            logo,
            max_tags: 4,
        }
    }

    fn text_x(&self) -> f32 {
        PADDING + LOGO_SIZE + LOGO_GAP + BAR_WIDTH + BAR_MARGIN
    }

    fn text_width(&self) -> f32 {
        self.canvas.width as f32 - self.text_x() - PADDING
    }

    fn content_height(&self) -> f32 {
        self.canvas.height as f32 - 2.0 * PADDING
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    size: f32,
    weight: u16,
    char_width_ratio: f32,
    line_height: f32,
    letter_spacing: f32,
}

impl Style {
    fn metrics(&self) -> TextMetrics {
        TextMetrics {
            size: self.size,
            char_width_ratio: self.char_width_ratio,
            letter_spacing: self.letter_spacing,
        }
    }

    fn line_px(&self) -> f32 {
        self.size * self.line_height
    }

    fn text(&self, x: f32, lines: Vec<String>, family: &str, fill: &str) -> Text {
        Text {
            x,
            y: 0.0,
            lines,
            font: FontSpec {
                family: family.to_string(),
                size: self.size,
                weight: self.weight,
            },
            fill: fill.to_string(),
            line_height: self.line_px(),
            letter_spacing: self.letter_spacing,
        }
    }
}

/// Nodes laid out from `y = 0`, moved into place once all heights are known.
struct Block {
    height: f32,
    nodes: Vec<Node>,
    is_title: bool,
}

impl Block {
    fn text(text: Text) -> Self {
        Self {
            height: text.height(),
            nodes: vec![Node::Text(text)],
            is_title: false,
        }
    }

    fn place(self, top: f32) -> Vec<Node> {
        self.nodes
            .into_iter()
            .map(|mut node| {
                match &mut node {
                    Node::Rect(r) => r.y += top,
                    Node::Text(t) => t.y += top,
                    Node::Image(i) => i.y += top,
                }
                node
            })
            .collect()
    }
}

/// Build the card for one page.
pub fn build_scene(page_type: PageType, meta: &PageMetadata, ctx: &TemplateContext) -> Scene {
    let template = Template::for_page(page_type, meta);
    let colors = &ctx.colors;
    let (width, height) = (ctx.canvas.width as f32, ctx.canvas.height as f32);

    let mut nodes = vec![Node::Rect(
        Rect::new(
            CARD_INSET,
            CARD_INSET,
            width - 2.0 * CARD_INSET,
            height - 2.0 * CARD_INSET,
            &colors.surface,
        )
        .rounded(CARD_RADIUS)
        .with_shadow(),
    )];
    if let Some(logo) = &ctx.logo {
        nodes.push(Node::Image(Image {
            x: PADDING,
            y: (height - LOGO_SIZE) / 2.0,
            width: LOGO_SIZE,
            height: LOGO_SIZE,
            href: logo.clone(),
        }));
    }

    let mut before_title = Vec::new();
    let mut after_title = Vec::new();
    match template {
        Template::General => {
            after_title.extend(body_block(&meta.description, template, ctx));
        }
        Template::Blog => {
            let subtitle = meta.subtitle.as_deref().unwrap_or(&meta.description);
            after_title.extend(body_block(subtitle, template, ctx));
            if let Some(published) = meta.pub_date {
                after_title.push(meta_block(published, meta.updated_date, &meta.tags, ctx));
            }
        }
        Template::Gallery => {
            before_title.push(kicker_block(ctx));
            after_title.extend(body_block(&meta.description, template, ctx));
        }
    }

    let block_count = before_title.len() + 1 + after_title.len();
    let others: f32 = before_title
        .iter()
        .chain(after_title.iter())
        .map(|b| b.height)
        .sum();
    let gaps = BLOCK_GAP * (block_count - 1) as f32;
    let title_budget = ctx.content_height() - others - gaps;
    let title = title_block(meta.display_headline(), template, title_budget, ctx);

    let blocks: Vec<Block> = before_title
        .into_iter()
        .chain(std::iter::once(title))
        .chain(after_title)
        .collect();
    let total = blocks.iter().map(|b| b.height).sum::<f32>() + gaps;
    let mut y = PADDING + ((ctx.content_height() - total) / 2.0).max(0.0);
    for block in blocks {
        let block_height = block.height;
        if block.is_title {
            nodes.push(Node::Rect(
                Rect::new(
                    ctx.text_x() - BAR_MARGIN - BAR_WIDTH,
                    y,
                    BAR_WIDTH,
                    block_height,
                    &colors.brand_primary,
                )
                .rounded(BAR_WIDTH / 2.0),
            ));
        }
        nodes.extend(block.place(y));
        y += block_height + BLOCK_GAP;
    }

    Scene {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        background: colors.background.clone(),
        pattern: Some(colors.pattern.clone()),
        nodes,
    }
}

fn title_block(headline: &str, template: Template, budget: f32, ctx: &TemplateContext) -> Block {
    let max_width = ctx.text_width();
    let max_lines = template.max_title_lines();
    let size = select_font_size(headline, max_width, max_lines, Some(budget), &ctx.weights);
    let metrics = size.metrics();
    let line_px = size.size * size.line_height;
    // Even the smallest size may not fit; cut the text to what the budget holds.
    let allowed = ((budget / line_px).floor() as usize).clamp(1, max_lines);

    let mut lines = wrap_words(headline, max_width, &metrics, &ctx.weights);
    if lines.len() > allowed {
        let cut = ellipsize(headline, max_width, allowed, &metrics, &ctx.weights);
        lines = wrap_words(&cut, max_width, &metrics, &ctx.weights);
    }

    let text = Text {
        x: ctx.text_x(),
        y: 0.0,
        lines,
        font: FontSpec {
            family: ctx.sans_family.clone(),
            size: size.size,
            weight: size.weight,
        },
        fill: ctx.colors.text_primary.clone(),
        line_height: line_px,
        letter_spacing: size.letter_spacing,
    };
    Block {
        is_title: true,
        ..Block::text(text)
    }
}

fn body_block(text: &str, template: Template, ctx: &TemplateContext) -> Option<Block> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let max_width = ctx.text_width();
    let metrics = BODY.metrics();
    let fitted = ellipsize(text, max_width, template.max_body_lines(), &metrics, &ctx.weights);
    let lines = wrap_words(&fitted, max_width, &metrics, &ctx.weights);
    if lines.is_empty() {
        return None;
    }
    Some(Block::text(BODY.text(
        ctx.text_x(),
        lines,
        &ctx.serif_family,
        &ctx.colors.text_secondary,
    )))
}

fn kicker_block(ctx: &TemplateContext) -> Block {
    Block::text(KICKER.text(
        ctx.text_x(),
        vec![GALLERY_KICKER.to_uppercase()],
        &ctx.sans_family,
        &ctx.colors.brand_primary,
    ))
}

/// `January 5, 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Date line, optionally with the update date.
pub fn date_line(published: NaiveDate, updated: Option<NaiveDate>) -> String {
    match updated {
        Some(updated) if updated != published => format!(
            "{} · Updated {}",
            format_long_date(published),
            format_long_date(updated)
        ),
        _ => format_long_date(published),
    }
}

/// Leading tags that fit in `available` together with a `+K more` pill
/// counting the rest. At most `max` tags are shown. `pill_width` measures
/// one pill including its padding.
pub fn visible_tags<'a>(
    tags: &'a [String],
    max: usize,
    available: f32,
    pill_width: impl Fn(&str) -> f32,
) -> &'a [String] {
    let row_width = |shown: usize| {
        let mut width: f32 = tags[..shown].iter().map(|t| pill_width(t.as_str())).sum();
        let mut pills = shown;
        if shown < tags.len() {
            width += pill_width(overflow_label(tags.len() - shown).as_str());
            pills += 1;
        }
        width + PILL_GAP * pills.saturating_sub(1) as f32
    };
    let shown = (0..=tags.len().min(max))
        .rev()
        .find(|&shown| row_width(shown) <= available)
        .unwrap_or(0);
    &tags[..shown]
}

/// `+3 more`
pub fn overflow_label(hidden: usize) -> String {
    format!("+{hidden} more")
}

fn meta_block(
    published: NaiveDate,
    updated: Option<NaiveDate>,
    tags: &[String],
    ctx: &TemplateContext,
) -> Block {
    let x = ctx.text_x();
    let date = DATE.text(
        x,
        vec![date_line(published, updated)],
        &ctx.sans_family,
        &ctx.colors.text_secondary,
    );
    let mut height = date.height();
    let mut nodes = vec![Node::Text(date)];

    if !tags.is_empty() {
        let pill_width = |label: &str| {
            estimate_text_width(label, &PILL.metrics(), &ctx.weights) + 2.0 * PILL_PAD_X
        };
        let shown = visible_tags(tags, ctx.max_tags, ctx.text_width(), &pill_width);
        let hidden = tags.len() - shown.len();

        // Tags in the tag style, the overflow count in the accent color.
        let colors = &ctx.colors;
        let mut pills: Vec<(String, &str, &str)> = shown
            .iter()
            .map(|t| (t.clone(), colors.tag_background.as_str(), colors.brand_primary.as_str()))
            .collect();
        if hidden > 0 {
            pills.push((
                overflow_label(hidden),
                colors.brand_accent.as_str(),
                colors.text_primary.as_str(),
            ));
        }

        let top = height + META_GAP;
        let pill_height = PILL.line_px() + 2.0 * PILL_PAD_Y;
        let mut cursor = x;
        for (label, fill, ink) in pills {
            let width = pill_width(&label);
            nodes.push(Node::Rect(
                Rect::new(cursor, top, width, pill_height, fill).rounded(PILL_RADIUS),
            ));
            let mut text = PILL.text(cursor + PILL_PAD_X, vec![label], &ctx.sans_family, ink);
            text.y = top;
            text.line_height = pill_height;
            nodes.push(Node::Text(text));
            cursor += width + PILL_GAP;
        }
        height = top + pill_height;
    }

    Block {
        height,
        nodes,
        is_title: false,
    }
}
