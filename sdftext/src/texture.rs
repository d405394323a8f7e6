//! Texture upload.
//!
//! Finished atlas pages are handed to a [`TextureUpload`] which turns them
//! into whatever the renderer draws with. The OpenGL backend lives in
//! [`crate::gpu`]; [`CpuTextures`] keeps the images themselves.
use crate::error::Result;
use image::RgbImage;

pub trait TextureUpload {
    type Texture;

    fn upload(&mut self, page: &RgbImage) -> Result<Self::Texture>;
}

/// Keeps each page as an image. Used for tooling and tests.
#[derive(Debug, Default)]
pub struct CpuTextures {
    uploads: usize,
}

impl CpuTextures {
    pub fn new() -> CpuTextures {
        CpuTextures::default()
    }

    /// Number of pages uploaded so far.
    pub fn uploads(&self) -> usize {
        self.uploads
    }
}

impl TextureUpload for CpuTextures {
    type Texture = RgbImage;

    fn upload(&mut self, page: &RgbImage) -> Result<RgbImage> {
        self.uploads += 1;
        Ok(page.clone())
    }
}
