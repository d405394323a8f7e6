//! Glyph shape source.
//!
//! [`FontFace`] is everything the atlas builder needs to know about a font:
//! names for the cache key, the charmap, glyph outlines and advances.
//! [`TtfFace`] implements it on top of ttf-parser.
use crate::error::{Error, Result};
use crate::outline::{Builder, Outline};
use crate::BASE_SIZE;
use glm::IVec2;
use ttf_parser as ttf;

/// Glyph index, scoped to one face. Glyph 0 is the "missing glyph".
pub type Glyph = u32;

pub trait FontFace {
    fn family_name(&self) -> &str;

    fn style_name(&self) -> &str;

    /// Charmap lookup. Code points the face does not cover map to glyph 0.
    fn glyph_index(&self, c: char) -> Glyph;

    /// The glyph's outline at [`BASE_SIZE`] pixels per em, or `None` if the
    /// glyph cannot be loaded. Glyphs without contours (space) load as an
    /// empty outline.
    fn load_outline(&self, glyph: Glyph) -> Option<Outline>;

    /// Pen advance in 26.6 fixed point at `size` pixels per em.
    fn advance(&self, glyph: Glyph, size: f32) -> IVec2;
}

/// A parsed TrueType/OpenType face borrowing its font data.
pub struct TtfFace<'a> {
    face: ttf::Face<'a>,
    family: String,
    style: String,
}

impl<'a> TtfFace<'a> {
    pub fn parse(data: &'a [u8]) -> Result<TtfFace<'a>> {
        let face = ttf::Face::parse(data, 0)?;
        if face.units_per_em() == 0 {
            return Err(Error::NullFace);
        }

        let family = name(&face, ttf::name_id::FAMILY).unwrap_or_default();
        let style = name(&face, ttf::name_id::SUBFAMILY).unwrap_or_default();

        Ok(TtfFace {
            face,
            family,
            style,
        })
    }

    /// The full font name from the `name` table, if it has a readable one.
    pub fn full_name(&self) -> Option<String> {
        name(&self.face, ttf::name_id::FULL_NAME)
    }

    pub fn inner(&self) -> &ttf::Face<'a> {
        &self.face
    }

    fn units_to_base(&self) -> f32 {
        BASE_SIZE / self.face.units_per_em() as f32
    }
}

/// ttf-parser reports both "no contours" and "broken glyph data" as a
/// failed outline. Only a glyph that produced no commands at all is empty;
/// anything else was cut short and must not be rendered.
fn finish_outline(glyph: Glyph, parsed: bool, builder: Builder) -> Option<Outline> {
    if !parsed && !builder.is_empty() {
        log::warn!("outline of glyph {} is malformed", glyph);
        return None;
    }
    Some(builder.build())
}

/// First unicode entry for `id` in the name table.
fn name(face: &ttf::Face, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == id)
        .find_map(|n| n.to_string())
}

impl<'a> FontFace for TtfFace<'a> {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn style_name(&self) -> &str {
        &self.style
    }

    fn glyph_index(&self, c: char) -> Glyph {
        self.face.glyph_index(c).map(|id| id.0 as Glyph).unwrap_or(0)
    }

    fn load_outline(&self, glyph: Glyph) -> Option<Outline> {
        if glyph >= self.face.number_of_glyphs() as Glyph {
            return None;
        }
        let mut builder = Outline::builder(self.units_to_base());
        let parsed = self
            .face
            .outline_glyph(ttf::GlyphId(glyph as u16), &mut builder)
            .is_some();
        finish_outline(glyph, parsed, builder)
    }

    fn advance(&self, glyph: Glyph, size: f32) -> IVec2 {
        let units = self
            .face
            .glyph_hor_advance(ttf::GlyphId(glyph as u16))
            .unwrap_or(0) as f32;
        let upem = self.face.units_per_em() as f32;
        IVec2::new(f32::round(units * size * 64.0 / upem) as i32, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::OutlineBuilder;

    #[test]
    fn glyph_without_contours_is_empty() {
        let outline = finish_outline(3, false, Outline::builder(1.0)).unwrap();
        assert!(outline.is_empty());
    }

    #[test]
    fn truncated_outline_is_rejected() {
        let mut builder = Outline::builder(1.0);
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        assert!(!builder.is_empty());
        assert!(finish_outline(3, false, builder).is_none());
    }

    #[test]
    fn parsed_outline_is_kept() {
        let mut builder = Outline::builder(1.0);
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        builder.close();
        let outline = finish_outline(3, true, builder).unwrap();
        assert_eq!(outline.contours().len(), 1);
    }

    #[test]
    fn garbage_is_not_a_face() {
        let bytes = [0u8; 64];
        assert!(matches!(TtfFace::parse(&bytes), Err(Error::FaceParsing(_))));
    }

    #[test]
    fn empty_data_is_not_a_face() {
        assert!(TtfFace::parse(&[]).is_err());
    }
}
