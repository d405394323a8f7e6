use sdftext::{
    AtlasCache, CpuTextures, DrawOptions, Font, FontFace, FontMetrics, Format, Glyph, Msdf,
    Outline, ScreenRect, SdfText, TextureAtlas,
};
use nalgebra_glm::{IVec2, Vec2};
use std::sync::Arc;
use ttf_parser::OutlineBuilder;

/// Every letter is a box whose width grows with its position in the
/// alphabet. Anything else is glyph 0, an empty outline.
struct Boxes;

impl FontFace for Boxes {
    fn family_name(&self) -> &str {
        "Boxes"
    }

    fn style_name(&self) -> &str {
        "Regular"
    }

    fn glyph_index(&self, c: char) -> Glyph {
        if c.is_ascii_lowercase() {
            c as Glyph - 'a' as Glyph + 1
        } else {
            0
        }
    }

    fn load_outline(&self, glyph: Glyph) -> Option<Outline> {
        let mut b = Outline::builder(1.0);
        if glyph > 0 {
            let w = 4.0 + glyph as f32 / 2.0;
            b.move_to(0.0, 0.0);
            b.line_to(w, 0.0);
            b.line_to(w, 16.0);
            b.line_to(0.0, 16.0);
            b.close();
        }
        Some(b.build())
    }

    fn advance(&self, glyph: Glyph, size: f32) -> IVec2 {
        let w = if glyph > 0 { 6.0 + glyph as f32 / 2.0 } else { 8.0 };
        IVec2::new((w * size / 32.0 * 64.0).round() as i32, 0)
    }
}

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

fn build(format: &Format, chars: &str) -> TextureAtlas<image::RgbImage> {
    TextureAtlas::build(&Boxes, format, chars, &mut CpuTextures::new(), &Msdf::default()).unwrap()
}

#[test]
fn every_char_and_glyph_is_covered() {
    let format = Format::new().texture_size(128, 128);
    let atlas = build(&format, ALPHABET);
    assert_eq!(atlas.char_map().len(), 27);
    for (c, glyph) in atlas.char_map() {
        let info = atlas
            .glyph_info(*glyph)
            .unwrap_or_else(|| panic!("no glyph info for {:?}", c));
        assert!(info.texture_index < atlas.textures().len());
    }
}

#[test]
fn cells_stay_inside_their_page_and_do_not_overlap() {
    let format = Format::new().texture_size(96, 96);
    let atlas = build(&format, ALPHABET);
    assert!(atlas.textures().len() > 1);

    let infos: Vec<_> = atlas.glyph_map().values().collect();
    for (i, a) in infos.iter().enumerate() {
        assert!(a.area.x2 <= 96 && a.area.y2 <= 96);
        assert_eq!(a.area.width(), atlas.cell_size().x);
        for b in &infos[i + 1..] {
            if a.texture_index == b.texture_index {
                assert!(!a.area.intersects(&b.area), "{:?} overlaps {:?}", a, b);
            }
        }
    }
}

#[test]
fn the_cache_shares_atlases() {
    let format = Format::new().texture_size(128, 128);
    let mut cache = AtlasCache::new(CpuTextures::new());
    let a = cache.get(&Boxes, &format, "abc").unwrap();
    let b = cache.get(&Boxes, &format, "abc").unwrap();
    let c = cache.get(&Boxes, &format, "abcd").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 2);
}

#[test]
fn builds_are_deterministic() {
    let format = Format::new().texture_size(128, 128).sdf_scale(1.5, 1.5);
    let a = build(&format, "hello");
    let b = build(&format, "hello");
    assert_eq!(a.textures(), b.textures());
    assert_eq!(a.descriptor(), b.descriptor());
}

#[test]
fn text_end_to_end() {
    let metrics = FontMetrics {
        size: 16.0,
        ascent: 16.0,
        descent: 4.0,
        leading: 0.0,
    };
    let format = Format::new().texture_size(256, 256);
    let mut cache = AtlasCache::new(CpuTextures::new());
    let text = SdfText::with_face(&Boxes, metrics, &format, ALPHABET, &mut cache).unwrap();

    let options = DrawOptions::default();
    let fit = ScreenRect::new(0.0, 0.0, 12.0, 0.0);
    let placed = text.glyph_placements_wrapped("abc abc abc", fit, &options);
    assert_eq!(placed.len(), 9);
    let lines: Vec<f32> = placed.iter().map(|(_, p)| p.y).collect();
    assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    assert!(lines[8] > 0.0);

    let batches = text.quads(&placed, Vec2::new(10.0, 20.0), &options, &[]);
    let glyphs: usize = batches.iter().map(|b| b.glyph_count()).sum();
    assert_eq!(glyphs, 9);
    for batch in &batches {
        assert_eq!(batch.indices.len(), batch.glyph_count() * 6);
        for [u, v] in &batch.tex_coords {
            assert!((0.0..=1.0).contains(u) && (0.0..=1.0).contains(v));
        }
    }
}

/// Any TrueType font commonly found on Linux machines.
fn system_font() -> Option<&'static str> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ]
    .into_iter()
    .find(|p| std::path::Path::new(p).exists())
}

#[test]
fn real_font() {
    let Some(path) = system_font() else {
        return;
    };
    let font = Font::from_file(path, 24.0).unwrap();
    assert!(font.ascent() > 0.0 && font.descent() > 0.0);
    assert!(font.glyph('A').unwrap() != 0);

    let format = Format::new().texture_size(256, 256);
    let mut cache = AtlasCache::new(CpuTextures::new());
    let text = SdfText::new(&font, &format, "Hgy", &mut cache).unwrap();

    // 'g' and 'y' hang below the baseline.
    let g = text.atlas().glyph_info(font.glyph('g').unwrap()).unwrap();
    assert!(g.origin_offset.y < 0.0);
    assert!(text.atlas().max_descent() > 0.0);

    let size = text.measure_string("Hgy", &DrawOptions::default());
    assert!(size.x > 0.0 && size.y > 0.0);
}
