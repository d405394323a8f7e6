//! SDF text.
//!
//! [`SdfText`] ties a font to its atlas. It lays text out into glyph
//! placements and turns placements into textured quads, one batch per atlas
//! page. The renderer in [`crate::gpu`] draws the batches.
use crate::atlas::TextureAtlas;
use crate::cache::AtlasCache;
use crate::error::Result;
use crate::face::{FontFace, Glyph};
use crate::font::Font;
use crate::format::{DrawOptions, Format};
use crate::layout::{Advances, FontMetrics, TextBox, GROW};
use crate::sdf::SdfRasterizer;
use crate::texture::TextureUpload;
use crate::BASE_SIZE;
use glm::{IVec2, Vec2};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    /// Pen advance in 26.6 fixed point.
    pub advance: IVec2,
}

/// Axis aligned rectangle in screen space, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl ScreenRect {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> ScreenRect {
        ScreenRect { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn upper_left(&self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    fn offset(self, d: Vec2) -> ScreenRect {
        ScreenRect::new(self.x1 + d.x, self.y1 + d.y, self.x2 + d.x, self.y2 + d.y)
    }
}

/// Quads for the glyphs on one atlas page. Every glyph adds four vertices
/// and two triangles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuadBatch {
    pub texture_index: usize,
    pub positions: Vec<[f32; 2]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Empty unless per-glyph colors were given.
    pub colors: Vec<[u8; 4]>,
    pub indices: Vec<u32>,
}

impl QuadBatch {
    fn push(&mut self, dest: ScreenRect, tex: ScreenRect, color: Option<[u8; 4]>) {
        let base = self.positions.len() as u32;
        self.positions.extend([
            [dest.x2, dest.y1],
            [dest.x1, dest.y1],
            [dest.x2, dest.y2],
            [dest.x1, dest.y2],
        ]);
        self.tex_coords.extend([
            [tex.x2, tex.y1],
            [tex.x1, tex.y1],
            [tex.x2, tex.y2],
            [tex.x1, tex.y2],
        ]);
        if let Some(color) = color {
            self.colors.extend([color; 4]);
        }
        self.indices
            .extend([base, base + 1, base + 2, base + 2, base + 1, base + 3]);
    }

    pub fn glyph_count(&self) -> usize {
        self.positions.len() / 4
    }
}

/// Where the glyph quads are anchored.
#[derive(Clone, Copy)]
enum Anchor {
    /// Pen positions are relative to a baseline point.
    Baseline(Vec2),
    /// Pen positions are relative to the top left of a box, glyphs outside
    /// `clip` are cut.
    Clipped { clip: ScreenRect, offset: Vec2 },
}

/// A font bound to its glyph atlas.
pub struct SdfText<T> {
    metrics: FontMetrics,
    format: Format,
    atlas: Arc<TextureAtlas<T>>,
    glyph_metrics: HashMap<Glyph, GlyphMetrics>,
}

impl<T> SdfText<T> {
    pub fn new<U, R>(
        font: &Font,
        format: &Format,
        utf8_chars: &str,
        cache: &mut AtlasCache<U, R>,
    ) -> Result<SdfText<T>>
    where
        U: TextureUpload<Texture = T>,
        R: SdfRasterizer,
    {
        let face = font.face()?;
        SdfText::with_face(&face, FontMetrics::from(font), format, utf8_chars, cache)
    }

    /// Like [`SdfText::new`] for any glyph source.
    pub fn with_face<F, U, R>(
        face: &F,
        metrics: FontMetrics,
        format: &Format,
        utf8_chars: &str,
        cache: &mut AtlasCache<U, R>,
    ) -> Result<SdfText<T>>
    where
        F: FontFace + ?Sized,
        U: TextureUpload<Texture = T>,
        R: SdfRasterizer,
    {
        let atlas = cache.get(face, format, utf8_chars)?;
        let glyph_metrics = atlas
            .char_map()
            .values()
            .map(|&glyph| {
                let advance = face.advance(glyph, metrics.size);
                (glyph, GlyphMetrics { advance })
            })
            .collect();

        Ok(SdfText {
            metrics,
            format: format.clone(),
            atlas,
            glyph_metrics,
        })
    }

    /// The characters atlases are built for when nothing else is asked for.
    pub fn default_chars() -> &'static str {
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890().?!,:;'\"&*=+-/\\@#_[]<>%^llflfiphrids\u{e9}\u{e1}\u{e8}\u{e0}"
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn atlas(&self) -> &Arc<TextureAtlas<T>> {
        &self.atlas
    }

    pub fn texture_count(&self) -> usize {
        self.atlas.textures().len()
    }

    pub fn texture(&self, n: usize) -> Option<&T> {
        self.atlas.textures().get(n)
    }

    pub fn glyph_metrics(&self, glyph: Glyph) -> Option<&GlyphMetrics> {
        self.glyph_metrics.get(&glyph)
    }

    fn text_box(&self, text: &str, width: f32, height: f32) -> TextBox {
        TextBox::new(self.metrics).text(text).size(width, height)
    }

    /// Glyphs of a single unbounded line per paragraph.
    pub fn glyph_placements(&self, text: &str, options: &DrawOptions) -> Vec<(Glyph, Vec2)> {
        self.text_box(text, GROW, GROW)
            .measure_glyphs(self, options)
    }

    /// Placements for text drawn into `fit`; lines are not wrapped.
    pub fn glyph_placements_in(
        &self,
        text: &str,
        fit: ScreenRect,
        options: &DrawOptions,
    ) -> Vec<(Glyph, Vec2)> {
        self.text_box(text, GROW, fit.height())
            .measure_glyphs(self, options)
    }

    /// Placements for text wrapped to the width of `fit`.
    pub fn glyph_placements_wrapped(
        &self,
        text: &str,
        fit: ScreenRect,
        options: &DrawOptions,
    ) -> Vec<(Glyph, Vec2)> {
        self.text_box(text, fit.width(), fit.height())
            .measure_glyphs(self, options)
    }

    /// Extent of `text`: the pen position of the last glyph plus its origin
    /// offset and cell size.
    pub fn measure_string(&self, text: &str, options: &DrawOptions) -> Vec2 {
        let placements = self.glyph_placements(text, options);
        let Some(&(glyph, pos)) = placements.last() else {
            return Vec2::zeros();
        };
        match self.atlas.glyph_info(glyph) {
            Some(info) => pos + info.origin_offset + info.area.size(),
            None => pos,
        }
    }

    /// Quads for placements relative to `baseline`.
    ///
    /// `colors` is either empty or holds one color per placement.
    pub fn quads(
        &self,
        placements: &[(Glyph, Vec2)],
        baseline: Vec2,
        options: &DrawOptions,
        colors: &[[u8; 4]],
    ) -> Vec<QuadBatch> {
        self.batches(placements, Anchor::Baseline(baseline), options, colors)
    }

    /// Quads for placements relative to `clip`'s top left corner plus
    /// `offset`, cut to `clip` on the axes `options` ask for.
    pub fn quads_clipped(
        &self,
        placements: &[(Glyph, Vec2)],
        clip: ScreenRect,
        offset: Vec2,
        options: &DrawOptions,
        colors: &[[u8; 4]],
    ) -> Vec<QuadBatch> {
        let anchor = Anchor::Clipped {
            clip,
            offset: clip.upper_left() + offset,
        };
        self.batches(placements, anchor, options, colors)
    }

    fn batches(
        &self,
        placements: &[(Glyph, Vec2)],
        anchor: Anchor,
        options: &DrawOptions,
        colors: &[[u8; 4]],
    ) -> Vec<QuadBatch> {
        let colors: &[[u8; 4]] = if colors.is_empty() || colors.len() == placements.len() {
            colors
        } else {
            log::warn!(
                "got {} colors for {} glyphs, ignoring colors",
                colors.len(),
                placements.len()
            );
            &[]
        };

        let font_scale = self.metrics.size / BASE_SIZE;
        let scale = options.scale;
        let padding = self.atlas.sdf_padding();
        let sdf_scale = self.atlas.sdf_scale();
        let page = self.atlas.page_size();
        let page = Vec2::new(page.x as f32, page.y as f32);

        let snap = |v: Vec2| {
            if options.pixel_snap {
                v.map(f32::floor)
            } else {
                v
            }
        };
        let anchor = match anchor {
            Anchor::Baseline(baseline) => Anchor::Baseline(snap(baseline)),
            Anchor::Clipped { clip, offset } => Anchor::Clipped {
                clip,
                offset: snap(offset),
            },
        };

        let mut batches: Vec<QuadBatch> = (0..self.texture_count())
            .map(|texture_index| QuadBatch {
                texture_index,
                ..QuadBatch::default()
            })
            .collect();

        for (i, &(glyph, pos)) in placements.iter().enumerate() {
            let Some(info) = self.atlas.glyph_info(glyph) else {
                continue;
            };

            // Cell pixels back to outline units, then to the font's size.
            let cell = info.area.size().component_div(&sdf_scale) * font_scale;
            let origin = info.origin_offset * font_scale;

            let mut dest = ScreenRect::new(0.0, 0.0, cell.x * scale, cell.y * scale);
            dest = dest.offset(pos * scale);
            dest = match anchor {
                Anchor::Baseline(baseline) => {
                    dest.offset(Vec2::new(baseline.x, baseline.y - cell.y))
                }
                Anchor::Clipped { offset, .. } => dest.offset(offset),
            };
            dest = dest.offset(Vec2::new((origin.x + 0.5).floor(), (-origin.y).floor()) * scale);
            let pad_y = match anchor {
                Anchor::Baseline(_) => padding.y,
                Anchor::Clipped { .. } => -padding.y,
            };
            dest = dest.offset(font_scale * Vec2::new(-padding.x, pad_y));
            if options.pixel_snap {
                let fract = Vec2::new(dest.x1 - dest.x1.floor(), dest.y1 - dest.y1.floor());
                dest = dest.offset(-fract);
            }

            let mut tex = ScreenRect::new(
                info.area.x1 as f32 / page.x,
                info.area.y1 as f32 / page.y,
                info.area.x2 as f32 / page.x,
                info.area.y2 as f32 / page.y,
            );

            if let Anchor::Clipped { clip, .. } = anchor {
                let mut clipped = dest;
                if options.clip_horizontal {
                    clipped.x1 = f32::max(dest.x1, clip.x1);
                    clipped.x2 = f32::min(dest.x2, clip.x2);
                }
                if options.clip_vertical {
                    clipped.y1 = f32::max(dest.y1, clip.y1);
                    clipped.y2 = f32::min(dest.y2, clip.y2);
                }
                if clipped.x1 >= clipped.x2 || clipped.y1 >= clipped.y2 {
                    continue;
                }

                let coord_scale = Vec2::new(tex.width() / dest.width(), tex.height() / dest.height());
                let x1 = tex.x1 + (clipped.x1 - dest.x1) * coord_scale.x;
                let y1 = tex.y1 + (clipped.y1 - dest.y1) * coord_scale.y;
                tex = ScreenRect::new(
                    x1,
                    y1,
                    x1 + clipped.width() * coord_scale.x,
                    y1 + clipped.height() * coord_scale.y,
                );
                dest = clipped;
            }

            let color = colors.get(i).copied();
            batches[info.texture_index].push(dest, tex, color);
        }

        batches.retain(|b| !b.indices.is_empty());
        batches
    }
}

impl<T> Advances for SdfText<T> {
    /// Characters outside the atlas fall back to glyph 0.
    fn glyph(&self, c: char) -> Glyph {
        self.atlas.char_map().get(&c).copied().unwrap_or(0)
    }

    fn advance(&self, glyph: Glyph) -> IVec2 {
        self.glyph_metrics
            .get(&glyph)
            .map(|m| m.advance)
            .unwrap_or_else(IVec2::zeros)
    }
}
