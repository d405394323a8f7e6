//! GPU Module
//!
//! Everything that feeds the GPU: atlas page textures, vertex buffers and
//! the SDF text shader.
//!
//! The wrappers are deliberately thin. They are newtypes around OpenGL names with methods that
//! fill in default parameters, so it is always clear which `gl` calls are made. That means
//! `unsafe` everywhere in here, but nowhere else in the crate.
//!
//! This does not provide an OpenGL context. The client must create one (with glutin or similar)
//! and load the function pointers with `gl::load_with` before using anything in this module.
pub mod shader;
pub mod text;

use crate::error::{Error, Result};
use crate::texture::TextureUpload;
use gl::types::*;
use image::RgbImage;
use std::ptr;

/// # Render
///
/// A renderer bundles everything needed to draw one part of the application: shaders, buffers and
/// the content submitted to it. The bundle decides exactly which `gl` calls are made.
pub trait Render {
    type State;
    unsafe fn invoke(&self, state: &Self::State);
}

//
// Video memory management.
//

pub struct Vao<const N: u32> {
    array: GLuint,
}

pub struct Vbo {
    buffer: GLuint,
}

pub struct Ibo {
    buffer: GLuint,
}

/// An RGB8 texture holding one atlas page.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture2D {
    pub tex: GLuint,
    pub width: u32,
    pub height: u32,
}

//
// Utility functions.
//

// Get # of bytes in an array.
#[inline(always)]
pub fn gl_buf_size<T>(val: &[T]) -> GLsizeiptr {
    std::mem::size_of_val(val) as GLsizeiptr
}

// Get the OpenGL-compatible pointer to an arbitrary array of numbers
#[inline(always)]
pub fn gl_ptr<T>(val: &[T]) -> *const GLvoid {
    val.as_ptr() as *const GLvoid
}

//
// Implementations
//

impl<const N: u32> Vao<N> {
    #[inline(always)]
    pub unsafe fn gen() -> Self {
        let mut array = 0;
        gl::GenVertexArrays(1, &mut array);
        Vao { array }
    }

    #[inline(always)]
    pub unsafe fn enable_attrib_arrays(&self) {
        gl::BindVertexArray(self.array);
        for i in 0..N {
            gl::EnableVertexAttribArray(i);
        }
    }

    /// Points attribute `index` at the currently bound array buffer.
    #[inline(always)]
    pub unsafe fn attrib_ptr(&self, index: GLuint, size: GLsizei, ty: GLenum, normalized: bool) {
        gl::BindVertexArray(self.array);
        let stride = 0; // Tightly packed atributes.
        let pointer = ptr::null(); // No offset in the buffer.
        let normalized = if normalized { gl::TRUE } else { gl::FALSE };
        gl::VertexAttribPointer(index, size, ty, normalized, stride, pointer);
    }

    #[inline(always)]
    pub unsafe fn enable_attrib(&self, index: GLuint, enable: bool) {
        gl::BindVertexArray(self.array);
        if enable {
            gl::EnableVertexAttribArray(index);
        } else {
            gl::DisableVertexAttribArray(index);
        }
    }

    #[inline(always)]
    pub unsafe fn bind(&self) {
        gl::BindVertexArray(self.array);
    }
}

impl Vbo {
    #[inline(always)]
    pub unsafe fn gen() -> Vbo {
        let mut buffer = 0;
        gl::GenBuffers(1, &mut buffer);
        Vbo { buffer }
    }

    #[inline(always)]
    pub unsafe fn bind(&self) {
        gl::BindBuffer(gl::ARRAY_BUFFER, self.buffer);
    }

    /// Replaces the buffer contents. Text changes from frame to frame, so
    /// the buffer is hinted as dynamic.
    #[inline(always)]
    pub unsafe fn data<T>(&self, vertices: &[T]) {
        gl::BindBuffer(gl::ARRAY_BUFFER, self.buffer);
        gl::BufferData(
            gl::ARRAY_BUFFER,
            gl_buf_size(vertices),
            gl_ptr(vertices),
            gl::DYNAMIC_DRAW,
        );
    }
}

impl Ibo {
    #[inline(always)]
    pub unsafe fn gen() -> Ibo {
        let mut buffer = 0;
        gl::GenBuffers(1, &mut buffer);
        Ibo { buffer }
    }

    #[inline(always)]
    pub unsafe fn bind(&self) {
        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.buffer);
    }

    #[inline(always)]
    pub unsafe fn data(&self, indices: &[u32]) {
        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.buffer);
        gl::BufferData(
            gl::ELEMENT_ARRAY_BUFFER,
            gl_buf_size(indices),
            gl_ptr(indices),
            gl::DYNAMIC_DRAW,
        );
    }
}

impl Texture2D {
    /// Uploads an RGB8 image with linear filtering and edges clamped.
    pub unsafe fn rgb(image: &RgbImage) -> Texture2D {
        let mut tex = 0;
        gl::GenTextures(1, &mut tex);
        gl::BindTexture(gl::TEXTURE_2D, tex);

        // Rows of RGB8 pixels are not 4-byte aligned in general.
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::RGB8 as GLint,
            image.width() as GLsizei,
            image.height() as GLsizei,
            0,
            gl::RGB,
            gl::UNSIGNED_BYTE,
            image.as_raw().as_ptr() as *const GLvoid,
        );

        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);

        gl::BindTexture(gl::TEXTURE_2D, 0);
        Texture2D {
            tex,
            width: image.width(),
            height: image.height(),
        }
    }

    #[inline(always)]
    pub unsafe fn bind(&self, unit: u32) {
        gl::ActiveTexture(gl::TEXTURE0 + unit);
        gl::BindTexture(gl::TEXTURE_2D, self.tex);
    }

    /// Frees the texture. Textures are not freed on drop since dropping may
    /// happen without a current context.
    pub unsafe fn delete(&self) {
        gl::DeleteTextures(1, &self.tex);
    }
}

/// Uploads atlas pages as OpenGL textures.
pub struct GlTextureUpload {
    _private: (),
}

impl GlTextureUpload {
    /// # Safety
    ///
    /// An OpenGL context must be current on this thread whenever the
    /// uploader is used.
    pub unsafe fn new() -> GlTextureUpload {
        GlTextureUpload { _private: () }
    }
}

impl TextureUpload for GlTextureUpload {
    type Texture = Texture2D;

    fn upload(&mut self, page: &RgbImage) -> Result<Texture2D> {
        // Safe by the contract of `GlTextureUpload::new`.
        unsafe {
            let texture = Texture2D::rgb(page);
            let err = gl::GetError();
            if err != gl::NO_ERROR {
                texture.delete();
                return Err(Error::Upload(format!("glTexImage2D error 0x{:x}", err)));
            }
            log::trace!("uploaded {}x{} page as texture {}", page.width(), page.height(), texture.tex);
            Ok(texture)
        }
    }
}
