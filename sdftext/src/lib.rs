//! Multi-channel signed distance field text.
//!
//! Glyph outlines are rasterized into MSDF cells, packed into fixed-size
//! texture pages and looked up by glyph index at draw time. The pieces, from
//! the bottom up:
//!
//! - [`face`]: the glyph shape source (charmap lookup, outlines, names).
//! - [`sdf`]: the multi-channel distance field generator.
//! - [`atlas`]: cell sizing, page packing and compositing.
//! - [`cache`]: memoization of finished atlases.
//! - [`layout`]: line breaking and glyph placement.
//! - [`text`]: glyph metrics, placement and quad generation.
//! - [`font`], [`library`]: loading fonts by file or by installed name.
//! - [`gpu`]: the OpenGL backend (texture upload, shader, renderer).
extern crate nalgebra_glm as glm;

pub mod atlas;
pub mod cache;
pub mod error;
pub mod face;
pub mod font;
pub mod format;
pub mod gpu;
pub mod layout;
pub mod library;
pub mod outline;
pub mod polynomial;
pub mod resolve;
pub mod sdf;
pub mod text;
pub mod texture;

#[cfg(test)]
pub(crate) mod testing;

pub use atlas::{cell_size, AtlasDescriptor, Area, GlyphInfo, TextureAtlas};
pub use cache::{AtlasCache, CacheKey};
pub use error::{Error, Result};
pub use face::{FontFace, Glyph, TtfFace};
pub use font::Font;
pub use format::{DrawOptions, Format};
pub use layout::{Advances, FontMetrics, TextBox, GROW};
pub use library::FontLibrary;
pub use outline::{Outline, Point};
pub use resolve::{DirectoryScanner, FontInfo, FontResolver};
pub use sdf::{Msdf, SdfRasterizer};
pub use text::{GlyphMetrics, QuadBatch, ScreenRect, SdfText};
pub use texture::{CpuTextures, TextureUpload};

/// Outline coordinates are expressed at this many pixels per em.
pub const BASE_SIZE: f32 = 32.0;

/// Loose float comparison used by the geometry code.
pub(crate) fn approx(a: f32, b: f32) -> bool {
    f32::abs(a - b) < 1e-6
}
