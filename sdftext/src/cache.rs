//! Atlas cache.
//!
//! Building an atlas renders every glyph, so texts that share a face, a
//! character set and a format share one atlas. Entries live until
//! [`AtlasCache::clear`] or until the cache is dropped.
use crate::atlas::{cell_size, max_glyph_size, TextureAtlas};
use crate::error::Result;
use crate::face::FontFace;
use crate::format::Format;
use crate::sdf::{Msdf, SdfRasterizer};
use crate::texture::TextureUpload;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies an atlas. The character string is compared as given, so the
/// same characters in a different order make a different atlas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub family: String,
    pub style: String,
    pub utf8_chars: String,
    pub texture_size: (u32, u32),
    pub cell_size: (u32, u32),
}

impl CacheKey {
    /// Computes the key, scanning the outlines for the cell size.
    pub fn new<F: FontFace + ?Sized>(face: &F, format: &Format, utf8_chars: &str) -> CacheKey {
        let max = max_glyph_size(face, utf8_chars);
        let cell = cell_size(format.scale(), format.padding(), max);
        CacheKey {
            family: face.family_name().to_string(),
            style: face.style_name().to_string(),
            utf8_chars: utf8_chars.to_string(),
            texture_size: (format.texture_width, format.texture_height),
            cell_size: (cell.x, cell.y),
        }
    }
}

pub struct AtlasCache<U: TextureUpload, R = Msdf> {
    uploader: U,
    rasterizer: R,
    atlases: HashMap<CacheKey, Arc<TextureAtlas<U::Texture>>>,
}

impl<U: TextureUpload> AtlasCache<U, Msdf> {
    pub fn new(uploader: U) -> Self {
        AtlasCache::with_rasterizer(uploader, Msdf::default())
    }
}

impl<U: TextureUpload, R: SdfRasterizer> AtlasCache<U, R> {
    pub fn with_rasterizer(uploader: U, rasterizer: R) -> Self {
        AtlasCache {
            uploader,
            rasterizer,
            atlases: HashMap::new(),
        }
    }

    /// The atlas for `utf8_chars` in `face`, built on first request.
    pub fn get<F: FontFace + ?Sized>(
        &mut self,
        face: &F,
        format: &Format,
        utf8_chars: &str,
    ) -> Result<Arc<TextureAtlas<U::Texture>>> {
        let key = CacheKey::new(face, format, utf8_chars);
        if let Some(atlas) = self.atlases.get(&key) {
            log::debug!("atlas cache hit for {} {}", key.family, key.style);
            return Ok(Arc::clone(atlas));
        }

        log::info!(
            "building atlas for {} {} ({} chars, {}x{} pages)",
            key.family,
            key.style,
            utf8_chars.chars().count(),
            key.texture_size.0,
            key.texture_size.1
        );
        let atlas = Arc::new(TextureAtlas::build(
            face,
            format,
            utf8_chars,
            &mut self.uploader,
            &self.rasterizer,
        )?);
        self.atlases.insert(key, Arc::clone(&atlas));
        Ok(atlas)
    }

    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    /// Drops every cached atlas. Atlases still held elsewhere stay alive.
    pub fn clear(&mut self) {
        self.atlases.clear();
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn uploader_mut(&mut self) -> &mut U {
        &mut self.uploader
    }
}
