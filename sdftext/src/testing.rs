//! Synthetic faces for unit tests.
use crate::face::{FontFace, Glyph};
use crate::outline::Outline;
use crate::BASE_SIZE;
use glm::IVec2;
use std::collections::HashMap;
use ttf_parser::OutlineBuilder;

/// Counter-clockwise rectangle from (x0, y0) to (x1, y1).
pub fn rect_outline(x0: f32, y0: f32, x1: f32, y1: f32) -> Outline {
    let mut b = Outline::builder(1.0);
    b.move_to(x0, y0);
    b.line_to(x1, y0);
    b.line_to(x1, y1);
    b.line_to(x0, y1);
    b.close();
    b.build()
}

/// A face whose glyphs are rectangles. Glyph 0 is a 10x20 box, the space is
/// glyph 1 with an empty outline.
pub struct FakeFace {
    family: String,
    style: String,
    chars: HashMap<char, Glyph>,
    outlines: HashMap<Glyph, Option<Outline>>,
    advances: HashMap<Glyph, f32>,
}

impl FakeFace {
    pub fn new(family: &str) -> FakeFace {
        let mut face = FakeFace {
            family: family.to_string(),
            style: "Regular".to_string(),
            chars: HashMap::new(),
            outlines: HashMap::new(),
            advances: HashMap::new(),
        };
        face.outlines.insert(0, Some(rect_outline(1.0, 0.0, 11.0, 20.0)));
        face.advances.insert(0, 12.0);
        face.with_outline(' ', Outline::empty(), 8.0)
    }

    pub fn style(mut self, style: &str) -> FakeFace {
        self.style = style.to_string();
        self
    }

    /// Adds `c` as a w x h box sitting on the baseline.
    pub fn with_rect(self, c: char, w: f32, h: f32) -> FakeFace {
        self.with_outline(c, rect_outline(0.0, 0.0, w, h), w + 2.0)
    }

    pub fn with_outline(mut self, c: char, outline: Outline, advance: f32) -> FakeFace {
        let glyph = self.next_glyph();
        self.chars.insert(c, glyph);
        self.outlines.insert(glyph, Some(outline));
        self.advances.insert(glyph, advance);
        self
    }

    /// Adds `c` with an outline that fails to load.
    pub fn with_broken(mut self, c: char) -> FakeFace {
        let glyph = self.next_glyph();
        self.chars.insert(c, glyph);
        self.outlines.insert(glyph, None);
        self
    }

    fn next_glyph(&self) -> Glyph {
        self.outlines.len() as Glyph
    }
}

impl FontFace for FakeFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn style_name(&self) -> &str {
        &self.style
    }

    fn glyph_index(&self, c: char) -> Glyph {
        self.chars.get(&c).copied().unwrap_or(0)
    }

    fn load_outline(&self, glyph: Glyph) -> Option<Outline> {
        self.outlines.get(&glyph).cloned().flatten()
    }

    fn advance(&self, glyph: Glyph, size: f32) -> IVec2 {
        let base = self.advances.get(&glyph).copied().unwrap_or(0.0);
        IVec2::new((base * size / BASE_SIZE * 64.0).round() as i32, 0)
    }
}
