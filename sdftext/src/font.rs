//! Font loading.
//!
//! A [`Font`] is a size plus shared, reference counted font data. The data
//! is registered with the [`FontLibrary`] while it is alive. ttf-parser
//! faces borrow their bytes, so a face is parsed on demand with
//! [`Font::face`]; parsing is lazy and cheap.
use crate::error::{Error, Result};
use crate::face::{FontFace, Glyph, TtfFace};
use crate::library::FontLibrary;
use crate::BASE_SIZE;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(0);

/// Font file contents and the metrics read from them.
pub struct FontData {
    id: u64,
    bytes: Vec<u8>,
    full_name: Option<String>,
    family: String,
    style: String,
    // In font units.
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    height: f32,
}

impl FontData {
    fn new(bytes: Vec<u8>) -> Result<Arc<FontData>> {
        let face = TtfFace::parse(&bytes)?;
        let inner = face.inner();
        let full_name = face.full_name();
        let family = face.family_name().to_string();
        let style = face.style_name().to_string();
        let units_per_em = inner.units_per_em() as f32;
        let ascender = inner.ascender() as f32;
        let descender = inner.descender() as f32;
        let height = inner.height() as f32;

        let id = NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed);
        FontLibrary::face_created(id);

        Ok(Arc::new(FontData {
            id,
            bytes,
            full_name,
            family,
            style,
            units_per_em,
            ascender,
            descender,
            height,
        }))
    }

    fn to_base(&self, units: f32) -> f32 {
        units * BASE_SIZE / self.units_per_em
    }
}

impl Drop for FontData {
    fn drop(&mut self) {
        FontLibrary::face_destroyed(self.id);
    }
}

#[derive(Clone)]
pub struct Font {
    name: String,
    size: f32,
    data: Arc<FontData>,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

impl Font {
    /// Looks `name` up among the installed fonts. When nothing matches, the
    /// platform's default font file is used.
    pub fn from_name(name: &str, size: f32) -> Result<Font> {
        let info = FontLibrary::with(|lib| lib.font_info(name));
        if !info.path.exists() {
            return Err(Error::FontNotFound {
                name: name.to_string(),
                path: info.path,
            });
        }
        let mut font = Font::from_file(&info.path, size)?;
        font.name = name.to_string();
        Ok(font)
    }

    pub fn from_file(path: impl AsRef<Path>, size: f32) -> Result<Font> {
        let bytes = std::fs::read(path)?;
        Font::from_bytes(bytes, size)
    }

    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Font> {
        let data = FontData::new(bytes)?;
        let name = data
            .full_name
            .clone()
            .unwrap_or_else(|| "(Unknown)".to_string());
        Ok(Font { name, size, data })
    }

    /// The platform default font at size 32, loaded once.
    pub fn default_font() -> Result<Font> {
        if let Some(font) = FontLibrary::with(|lib| lib.cached_default()) {
            return Ok(font);
        }
        let family = FontLibrary::with(|lib| lib.default_family());
        let font = Font::from_name(&family, BASE_SIZE)?;
        Ok(FontLibrary::store_default(font))
    }

    /// Names of the installed fonts.
    pub fn names(force_refresh: bool) -> Vec<String> {
        FontLibrary::with(|lib| lib.names(force_refresh).to_vec())
    }

    /// A parsed view of the font data.
    pub fn face(&self) -> Result<TtfFace<'_>> {
        TtfFace::parse(&self.data.bytes)
    }

    /// The same font at another size.
    pub fn with_size(&self, size: f32) -> Font {
        Font {
            size,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> &str {
        &self.data.family
    }

    pub fn style(&self) -> &str {
        &self.data.style
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Distance from the baseline to the top, at the base size.
    pub fn ascent(&self) -> f32 {
        self.data.to_base(self.data.ascender.abs())
    }

    /// Distance from the baseline to the bottom (positive), at the base size.
    pub fn descent(&self) -> f32 {
        self.data.to_base(self.data.descender.abs())
    }

    pub fn height(&self) -> f32 {
        self.data.to_base(self.data.height)
    }

    /// Line gap: the part of the line height not covered by ascent and descent.
    pub fn leading(&self) -> f32 {
        let d = &self.data;
        d.to_base(d.height - (d.ascender.abs() + d.descender.abs()))
    }

    pub fn glyph(&self, c: char) -> Result<Glyph> {
        Ok(self.face()?.glyph_index(c))
    }

    pub fn glyphs(&self, utf8_chars: &str) -> Result<Vec<Glyph>> {
        let face = self.face()?;
        Ok(utf8_chars.chars().map(|c| face.glyph_index(c)).collect())
    }

    /// Glyph indices are plain integers; this just converts.
    pub fn glyph_index(&self, idx: usize) -> Glyph {
        idx as Glyph
    }
}
