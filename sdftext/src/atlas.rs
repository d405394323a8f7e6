//! The glyph atlas.
//!
//! Every glyph of a character set gets a cell of the same size, large enough
//! for the biggest glyph plus padding. Cells are laid out row by row with a
//! one pixel gutter on fixed-size pages, and each page is uploaded as soon as
//! all of its glyphs are rendered.
use crate::error::{Error, Result};
use crate::face::{FontFace, Glyph};
use crate::format::Format;
use crate::outline::Outline;
use crate::sdf::SdfRasterizer;
use crate::texture::TextureUpload;
use glm::{UVec2, Vec2};
use image::{Rgb, RgbImage};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Pixel rectangle on a page, `x2` and `y2` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Area {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Area {
    pub fn new(position: UVec2, size: UVec2) -> Area {
        Area {
            x1: position.x,
            y1: position.y,
            x2: position.x + size.x,
            y2: position.y + size.y,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    pub fn intersects(&self, other: &Area) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }
}

/// Where a glyph lives in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInfo {
    /// Index of the page (texture) holding the glyph.
    pub texture_index: usize,
    pub area: Area,
    /// Lower left corner of the glyph's bounds relative to the pen origin,
    /// in outline units.
    pub origin_offset: Vec2,
}

/// Size of the cell every glyph is rendered into: `round(scale * (max + 2 * padding))`.
pub fn cell_size(scale: Vec2, padding: Vec2, max_glyph_size: Vec2) -> UVec2 {
    let size = scale.component_mul(&(max_glyph_size + 2.0 * padding));
    let round = |v: f32| f32::max(0.0, f32::floor(v + 0.5)) as u32;
    UVec2::new(round(size.x), round(size.y))
}

/// Decodes the requested characters, adding a space if there is none.
pub fn char_set(utf8_chars: &str) -> Vec<char> {
    let mut chars: Vec<char> = utf8_chars.chars().collect();
    if !chars.contains(&' ') {
        chars.push(' ');
    }
    chars
}

/// Largest outline width and height over the character set (space included).
pub fn max_glyph_size<F: FontFace + ?Sized>(face: &F, utf8_chars: &str) -> Vec2 {
    char_set(utf8_chars)
        .into_iter()
        .filter_map(|c| face.load_outline(face.glyph_index(c)))
        .fold(Vec2::zeros(), |max, outline| {
            let b = outline.bounds();
            Vec2::new(f32::max(max.x, b.width()), f32::max(max.y, b.height()))
        })
}

/// Grid of cells on one page. The gutter after every cell must fit too.
fn grid(cell: UVec2, page: UVec2) -> (u32, u32) {
    let fit = |cell: u32, page: u32| {
        let n = (page / cell).saturating_sub(1);
        u32::min(n, page.saturating_add(1) / cell.saturating_add(1))
    };
    (fit(cell.x, page.x), fit(cell.y, page.y))
}

/// Assigns the glyphs to pages and cell positions, row-major.
pub fn plan_pages(glyphs: &[Glyph], cell: UVec2, page: UVec2) -> Result<Vec<Vec<(Glyph, UVec2)>>> {
    if cell.x == 0 || cell.y == 0 {
        return Err(Error::DegenerateCell {
            cell: (cell.x, cell.y),
        });
    }

    let (columns, rows) = grid(cell, page);
    let per_page = columns as usize * rows as usize;
    if per_page == 0 {
        return Err(Error::AtlasTooSmall {
            cell: (cell.x, cell.y),
            page: (page.x, page.y),
        });
    }
    log::debug!(
        "atlas grid {}x{} of {}x{} cells, {} glyphs per page",
        columns,
        rows,
        cell.x,
        cell.y,
        per_page
    );

    let pages = glyphs
        .chunks(per_page)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .map(|(i, &glyph)| {
                    let i = i as u32;
                    let x = (i % columns) * (cell.x + 1);
                    let y = (i / columns) * (cell.y + 1);
                    (glyph, UVec2::new(x, y))
                })
                .collect()
        })
        .collect();
    Ok(pages)
}

/// Bounds gathered from the outlines before anything is rendered.
struct Scan {
    outlines: HashMap<Glyph, Option<Outline>>,
    origins: HashMap<Glyph, Vec2>,
    max_glyph_size: Vec2,
    max_ascent: f32,
    max_descent: f32,
}

fn scan<F: FontFace + ?Sized>(face: &F, glyphs: &BTreeSet<Glyph>) -> Scan {
    let mut scan = Scan {
        outlines: HashMap::new(),
        origins: HashMap::new(),
        max_glyph_size: Vec2::zeros(),
        max_ascent: 0.0,
        max_descent: 0.0,
    };

    for &glyph in glyphs {
        let outline = face.load_outline(glyph);
        if let Some(outline) = &outline {
            let b = outline.bounds();
            scan.origins.insert(glyph, Vec2::new(b.x0, b.y0));
            scan.max_glyph_size.x = f32::max(scan.max_glyph_size.x, b.width());
            scan.max_glyph_size.y = f32::max(scan.max_glyph_size.y, b.height());
            scan.max_ascent = f32::max(scan.max_ascent, b.y1);
            scan.max_descent = f32::max(scan.max_descent, b.y0.abs());
        }
        scan.outlines.insert(glyph, outline);
    }
    scan
}

/// Float channel to byte.
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Glyph textures plus the maps needed to find a glyph in them.
pub struct TextureAtlas<T> {
    textures: Vec<T>,
    char_map: BTreeMap<char, Glyph>,
    glyph_map: BTreeMap<Glyph, GlyphInfo>,
    page_size: UVec2,
    cell_size: UVec2,
    sdf_scale: Vec2,
    sdf_padding: Vec2,
    max_glyph_size: Vec2,
    max_ascent: f32,
    max_descent: f32,
}

impl<T> TextureAtlas<T> {
    /// Renders every glyph of `utf8_chars` (and the space) and uploads the pages.
    ///
    /// Fails if the cell size is degenerate or a single cell does not fit a
    /// page. A glyph whose outline can't be loaded keeps its (blank) cell.
    pub fn build<F, U, R>(
        face: &F,
        format: &Format,
        utf8_chars: &str,
        uploader: &mut U,
        rasterizer: &R,
    ) -> Result<TextureAtlas<T>>
    where
        F: FontFace + ?Sized,
        U: TextureUpload<Texture = T> + ?Sized,
        R: SdfRasterizer + ?Sized,
    {
        let mut char_map = BTreeMap::new();
        let mut glyphs = BTreeSet::new();
        for c in char_set(utf8_chars) {
            let glyph = face.glyph_index(c);
            char_map.insert(c, glyph);
            glyphs.insert(glyph);
        }

        let scan = scan(face, &glyphs);
        let scale = format.scale();
        let padding = format.padding();
        let page_size = format.page_size();
        let cell = cell_size(scale, padding, scan.max_glyph_size);

        let glyphs: Vec<Glyph> = glyphs.into_iter().collect();
        let pages = plan_pages(&glyphs, cell, page_size)?;

        let mut glyph_map = BTreeMap::new();
        let mut textures = Vec::with_capacity(pages.len());
        let mut surface = RgbImage::new(page_size.x, page_size.y);

        for (texture_index, page) in pages.iter().enumerate() {
            for &(glyph, position) in page {
                let origin_offset = scan.origins.get(&glyph).copied().unwrap_or_else(Vec2::zeros);
                let area = Area::new(position, cell);
                glyph_map.insert(
                    glyph,
                    GlyphInfo {
                        texture_index,
                        area,
                        origin_offset,
                    },
                );

                let Some(Some(outline)) = scan.outlines.get(&glyph) else {
                    log::warn!("glyph {} has no loadable outline, leaving its cell blank", glyph);
                    continue;
                };
                let bounds = outline.bounds();
                if bounds.width() == 0.0 || bounds.height() == 0.0 {
                    continue;
                }

                let translate = Vec2::new(padding.x, origin_offset.y.abs() + padding.y);
                let bitmap = rasterizer.rasterize(outline, scale, translate, (cell.x, cell.y));
                if bitmap.dimensions() != (cell.x, cell.y) {
                    log::warn!(
                        "glyph {} rasterized to {:?}, expected {}x{}; cropping to the cell",
                        glyph,
                        bitmap.dimensions(),
                        cell.x,
                        cell.y
                    );
                }
                let (w, h) = (bitmap.width().min(cell.x), bitmap.height().min(cell.y));
                for y in 0..h {
                    for x in 0..w {
                        let px = bitmap.get_pixel(x, y);
                        surface.put_pixel(position.x + x, position.y + y, Rgb(px.0.map(to_u8)));
                    }
                }
                log::trace!("glyph {} on page {} at {:?}", glyph, texture_index, area);
            }

            textures.push(uploader.upload(&surface)?);
            surface.pixels_mut().for_each(|px| *px = Rgb([0, 0, 0]));
        }

        log::debug!(
            "built atlas: {} glyphs on {} page(s) of {}x{}, cell {}x{}",
            glyph_map.len(),
            textures.len(),
            page_size.x,
            page_size.y,
            cell.x,
            cell.y
        );

        Ok(TextureAtlas {
            textures,
            char_map,
            glyph_map,
            page_size,
            cell_size: cell,
            sdf_scale: scale,
            sdf_padding: padding,
            max_glyph_size: scan.max_glyph_size,
            max_ascent: scan.max_ascent,
            max_descent: scan.max_descent,
        })
    }

    pub fn textures(&self) -> &[T] {
        &self.textures
    }

    pub fn char_map(&self) -> &BTreeMap<char, Glyph> {
        &self.char_map
    }

    pub fn glyph_map(&self) -> &BTreeMap<Glyph, GlyphInfo> {
        &self.glyph_map
    }

    pub fn glyph_info(&self, glyph: Glyph) -> Option<&GlyphInfo> {
        self.glyph_map.get(&glyph)
    }

    pub fn page_size(&self) -> UVec2 {
        self.page_size
    }

    pub fn cell_size(&self) -> UVec2 {
        self.cell_size
    }

    pub fn sdf_scale(&self) -> Vec2 {
        self.sdf_scale
    }

    pub fn sdf_padding(&self) -> Vec2 {
        self.sdf_padding
    }

    pub fn max_glyph_size(&self) -> Vec2 {
        self.max_glyph_size
    }

    pub fn max_ascent(&self) -> f32 {
        self.max_ascent
    }

    pub fn max_descent(&self) -> f32 {
        self.max_descent
    }

    /// A serializable summary of the atlas layout.
    pub fn descriptor(&self) -> AtlasDescriptor {
        AtlasDescriptor {
            page_size: [self.page_size.x, self.page_size.y],
            cell_size: [self.cell_size.x, self.cell_size.y],
            sdf_scale: [self.sdf_scale.x, self.sdf_scale.y],
            sdf_padding: [self.sdf_padding.x, self.sdf_padding.y],
            pages: self.textures.len(),
            max_ascent: self.max_ascent,
            max_descent: self.max_descent,
            glyphs: self
                .glyph_map
                .iter()
                .map(|(&glyph, info)| GlyphDescriptor {
                    glyph,
                    page: info.texture_index,
                    area: info.area,
                    origin_offset: [info.origin_offset.x, info.origin_offset.y],
                })
                .collect(),
            chars: self
                .char_map
                .iter()
                .map(|(&ch, &glyph)| CharDescriptor { ch, glyph })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtlasDescriptor {
    pub page_size: [u32; 2],
    pub cell_size: [u32; 2],
    pub sdf_scale: [f32; 2],
    pub sdf_padding: [f32; 2],
    pub pages: usize,
    pub max_ascent: f32,
    pub max_descent: f32,
    pub glyphs: Vec<GlyphDescriptor>,
    pub chars: Vec<CharDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphDescriptor {
    pub glyph: Glyph,
    pub page: usize,
    pub area: Area,
    pub origin_offset: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharDescriptor {
    pub ch: char,
    pub glyph: Glyph,
}
