//! Atlas and drawing configuration.
//!
//! Both structs deserialize from partial TOML tables; anything left out
//! keeps its default.
use glm::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

/// How an atlas is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    pub texture_width: u32,
    pub texture_height: u32,
    /// Multiplies the base size of 32 px per em. 2.0 renders glyphs at 64 px per em.
    pub sdf_scale: [f32; 2],
    /// Empty border around each glyph, in outline units, before scaling.
    pub sdf_padding: [f32; 2],
}

impl Default for Format {
    fn default() -> Self {
        Self {
            texture_width: 1024,
            texture_height: 1024,
            sdf_scale: [1.0, 1.0],
            sdf_padding: [2.0, 2.0],
        }
    }
}

impl Format {
    pub fn new() -> Format {
        Format::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Format, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn texture_size(mut self, width: u32, height: u32) -> Self {
        self.texture_width = width;
        self.texture_height = height;
        self
    }

    pub fn sdf_scale(mut self, x: f32, y: f32) -> Self {
        self.sdf_scale = [x, y];
        self
    }

    pub fn sdf_padding(mut self, x: f32, y: f32) -> Self {
        self.sdf_padding = [x, y];
        self
    }

    pub fn page_size(&self) -> UVec2 {
        UVec2::new(self.texture_width, self.texture_height)
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.sdf_scale[0], self.sdf_scale[1])
    }

    pub fn padding(&self) -> Vec2 {
        Vec2::new(self.sdf_padding[0], self.sdf_padding[1])
    }
}

/// How placed glyphs are turned into quads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    pub scale: f32,
    /// Extra space between lines, added to the font's own leading.
    pub leading: f32,
    pub pixel_snap: bool,
    pub clip_horizontal: bool,
    pub clip_vertical: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            leading: 0.0,
            pixel_snap: true,
            clip_horizontal: true,
            clip_vertical: true,
        }
    }
}

impl DrawOptions {
    pub fn new() -> DrawOptions {
        DrawOptions::default()
    }

    pub fn from_toml_str(s: &str) -> Result<DrawOptions, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn leading(mut self, leading: f32) -> Self {
        self.leading = leading;
        self
    }

    pub fn pixel_snap(mut self, snap: bool) -> Self {
        self.pixel_snap = snap;
        self
    }

    pub fn clip_horizontal(mut self, clip: bool) -> Self {
        self.clip_horizontal = clip;
        self
    }

    pub fn clip_vertical(mut self, clip: bool) -> Self {
        self.clip_vertical = clip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let f = Format::default();
        assert_eq!(f.page_size(), UVec2::new(1024, 1024));
        assert_eq!(f.scale(), Vec2::new(1.0, 1.0));
        assert_eq!(f.padding(), Vec2::new(2.0, 2.0));

        let o = DrawOptions::default();
        assert_eq!(o.scale, 1.0);
        assert!(o.pixel_snap && o.clip_horizontal && o.clip_vertical);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let f = Format::from_toml_str("texture_width = 256\nsdf_scale = [2.0, 2.0]\n").unwrap();
        assert_eq!(f.texture_width, 256);
        assert_eq!(f.texture_height, 1024);
        assert_eq!(f.scale(), Vec2::new(2.0, 2.0));
        assert_eq!(f.sdf_padding, [2.0, 2.0]);

        let o = DrawOptions::from_toml_str("pixel_snap = false").unwrap();
        assert!(!o.pixel_snap);
        assert_eq!(o.leading, 0.0);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(Format::from_toml_str("texture_width = \"wide\"").is_err());
    }

    #[test]
    fn builders_chain() {
        let f = Format::new().texture_size(128, 64).sdf_padding(1.0, 3.0);
        assert_eq!(f.page_size(), UVec2::new(128, 64));
        assert_eq!(f.padding(), Vec2::new(1.0, 3.0));
    }
}
