//! Text box layout.
//!
//! Breaks text into lines that fit a width and places each glyph on its
//! line. Break opportunities come from the Unicode line breaking algorithm;
//! there is no shaping, every character maps to one glyph.
use crate::face::Glyph;
use crate::font::Font;
use crate::format::DrawOptions;
use crate::BASE_SIZE;
use glm::{IVec2, Vec2};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A box dimension of `GROW` is unbounded.
pub const GROW: f32 = 0.0;
const MAX_SIZE: f32 = 1_000_000.0;

/// Glyph lookup and advances (26.6 fixed point) for layout.
pub trait Advances {
    fn glyph(&self, c: char) -> Glyph;
    fn advance(&self, glyph: Glyph) -> IVec2;
}

/// The vertical metrics layout needs, at the base size except for `size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub size: f32,
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
}

impl From<&Font> for FontMetrics {
    fn from(font: &Font) -> Self {
        FontMetrics {
            size: font.size(),
            ascent: font.ascent(),
            descent: font.descent(),
            leading: font.leading(),
        }
    }
}

impl FontMetrics {
    pub fn line_height(&self, options: &DrawOptions) -> f32 {
        let scale = self.size / BASE_SIZE;
        scale * (self.ascent + self.descent + self.leading + options.leading)
    }
}

pub struct TextBox {
    text: String,
    size: Vec2,
    metrics: FontMetrics,
}

impl TextBox {
    pub fn new(metrics: FontMetrics) -> TextBox {
        TextBox {
            text: String::new(),
            size: Vec2::new(GROW, GROW),
            metrics,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    fn max_width(&self) -> f32 {
        if self.size.x > 0.0 {
            self.size.x
        } else {
            MAX_SIZE
        }
    }

    /// Splits the text into lines no wider than the box.
    ///
    /// Lines end at mandatory breaks (newlines) or at the last break
    /// opportunity that still fits. A single word wider than the box is
    /// split between characters.
    pub fn line_breaks<A: Advances + ?Sized>(&self, advances: &A) -> Vec<String> {
        let text = self.text.as_str();
        let width = self.max_width();
        let fits = |s: &str| width >= MAX_SIZE || measure(advances, trim(s)) <= width;

        let mut lines = vec![];
        let mut start = 0;
        let mut end = None;
        // Set when the current line was wrapped, so a wrap that used up the
        // whole line does not leave an empty line before the newline.
        let mut wrapped = false;
        for (pos, opportunity) in linebreaks(text) {
            if !fits(&text[start..pos]) {
                if let Some(e) = end.take() {
                    lines.push(trim(&text[start..e]).to_string());
                    start = e;
                    wrapped = true;
                }
                while !fits(&text[start..pos]) {
                    let split = start + fitting_prefix(advances, &text[start..pos], width);
                    lines.push(trim(&text[start..split]).to_string());
                    start = split;
                    wrapped = true;
                }
            }
            end = Some(pos);

            if opportunity == BreakOpportunity::Mandatory {
                let rest = trim(&text[start..pos]);
                if !(wrapped && rest.is_empty()) {
                    lines.push(rest.to_string());
                }
                start = pos;
                end = None;
                wrapped = false;
            }
        }
        lines
    }

    /// Pen positions of every glyph, in pixels at the font's size. Lines
    /// are stacked downwards from y = 0.
    pub fn measure_glyphs<A: Advances + ?Sized>(
        &self,
        advances: &A,
        options: &DrawOptions,
    ) -> Vec<(Glyph, Vec2)> {
        if self.text.is_empty() {
            return vec![];
        }

        let line_height = self.metrics.line_height(options);
        let mut result = vec![];
        let mut y = 0.0;
        for line in self.line_breaks(advances) {
            let mut pen = IVec2::zeros();
            for c in line.chars() {
                let glyph = advances.glyph(c);
                let x = pen.x as f32 / 64.0 + 0.5;
                result.push((glyph, Vec2::new(x, y)));
                pen += advances.advance(glyph);
            }
            y += line_height;
        }
        result
    }
}

fn trim(s: &str) -> &str {
    s.trim_end_matches(char::is_whitespace)
}

/// Width in whole pixels.
fn measure<A: Advances + ?Sized>(advances: &A, s: &str) -> f32 {
    let pen: i32 = s.chars().map(|c| advances.advance(advances.glyph(c)).x).sum();
    (pen >> 6) as f32
}

/// Byte length of the longest prefix of `s` that fits `width`, at least one
/// character.
fn fitting_prefix<A: Advances + ?Sized>(advances: &A, s: &str, width: f32) -> usize {
    let mut pen = 0;
    let mut len = 0;
    for (i, c) in s.char_indices() {
        pen += advances.advance(advances.glyph(c)).x;
        if len > 0 && (pen >> 6) as f32 > width {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}
