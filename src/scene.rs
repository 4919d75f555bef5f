//! Vector description of a template card.
//!
//! Templates produce a [`Scene`]: a flat list of rectangles, pre-wrapped text
//! blocks and images in canvas pixels. [`Scene::to_svg`] serializes it for the
//! rasterizer. Keeping the scene as data lets template tests assert on layout
//! without rasterizing anything.

use std::fmt::Write as _;

/// Id of the card drop-shadow filter in `<defs>`.
const SHADOW_ID: &str = "og-shadow";

/// Background tiles: two overlapping golden-ratio rectangle motifs.
/// `(id, viewBox width, viewBox height, tile width, tile height, path)`.
const PATTERN_TILES: [(&str, u32, u32, u32, u32, &str); 2] = [
    (
        "og-pattern-small",
        26,
        16,
        260,
        160,
        "M10 0v5h3V3h8V0zM0 0v5h8V0zm3 8v5h2V8zm10 3v2H5v3h11v-5zm8-8v5h2V3zm-3 8v5h8v-5z",
    ),
    (
        "og-pattern-large",
        42,
        26,
        420,
        260,
        "M37 21v2h5v-2zm-3-8v8h3v-8zM29 0v8h13V0zm-8 10v3h5v-3zm0 3h-5v3h5zM5 3H0v2h5zm0 2v8h3V5zM0 18v8h13v-8zm16 0v8h18v-5H21v-3zM8 0v5h13v3h5V0z",
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: String,
    /// Fill of the background pattern, if any.
    pub pattern: Option<String>,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rect(Rect),
    Text(Text),
    Image(Image),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: String,
    pub radius: f32,
    pub shadow: bool,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, fill: &str) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            radius: 0.0,
            shadow: false,
        }
    }

    pub fn rounded(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16,
}

/// A block of already wrapped lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub x: f32,
    /// Top edge of the block.
    pub y: f32,
    pub lines: Vec<String>,
    pub font: FontSpec,
    pub fill: String,
    /// Line height in pixels.
    pub line_height: f32,
    /// Letter spacing in em.
    pub letter_spacing: f32,
}

impl Text {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    /// Baseline of line `index`: the line box is centered on the cap height.
    pub fn baseline(&self, index: usize) -> f32 {
        self.y + index as f32 * self.line_height + (self.line_height + 0.7 * self.font.size) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// `data:` URL.
    pub href: String,
}

impl Scene {
    pub fn texts(&self) -> impl Iterator<Item = &Text> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );

        let shadow = self
            .nodes
            .iter()
            .any(|n| matches!(n, Node::Rect(r) if r.shadow));
        if shadow || self.pattern.is_some() {
            svg.push_str("<defs>");
            if let Some(color) = &self.pattern {
                for (id, vw, vh, tw, th, path) in PATTERN_TILES {
                    let _ = write!(
                        svg,
                        r#"<pattern id="{id}" width="{tw}" height="{th}" patternUnits="userSpaceOnUse" viewBox="0 0 {vw} {vh}"><path fill="{fill}" d="{path}"/></pattern>"#,
                        fill = escape(color),
                    );
                }
            }
            if shadow {
                let _ = write!(
                    svg,
                    r##"<filter id="{SHADOW_ID}" x="-10%" y="-10%" width="120%" height="130%"><feDropShadow dx="0" dy="6" stdDeviation="12" flood-color="#000000" flood-opacity="0.08"/></filter>"##,
                );
            }
            svg.push_str("</defs>");
        }

        let _ = write!(
            svg,
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            self.width,
            self.height,
            escape(&self.background)
        );
        if self.pattern.is_some() {
            for (id, ..) in PATTERN_TILES {
                let _ = write!(
                    svg,
                    r#"<rect width="{}" height="{}" fill="url(#{id})"/>"#,
                    self.width, self.height
                );
            }
        }

        for node in &self.nodes {
            match node {
                Node::Rect(r) => write_rect(&mut svg, r),
                Node::Text(t) => write_text(&mut svg, t),
                Node::Image(i) => write_image(&mut svg, i),
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

fn write_rect(svg: &mut String, r: &Rect) {
    let _ = write!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}""#,
        r.x,
        r.y,
        r.width,
        r.height,
        escape(&r.fill)
    );
    if r.radius > 0.0 {
        let _ = write!(svg, r#" rx="{0}" ry="{0}""#, r.radius);
    }
    if r.shadow {
        let _ = write!(svg, r#" filter="url(#{SHADOW_ID})""#);
    }
    svg.push_str("/>");
}

fn write_text(svg: &mut String, t: &Text) {
    let spacing = t.letter_spacing * t.font.size;
    for (i, line) in t.lines.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" letter-spacing="{}" fill="{}" xml:space="preserve">{}</text>"#,
            t.x,
            t.baseline(i),
            escape(&t.font.family),
            t.font.size,
            t.font.weight,
            spacing,
            escape(&t.fill),
            escape(line)
        );
    }
}

fn write_image(svg: &mut String, i: &Image) {
    let _ = write!(
        svg,
        r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" xlink:href="{}"/>"#,
        i.x,
        i.y,
        i.width,
        i.height,
        escape(&i.href)
    );
}

/// Escape text for XML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
