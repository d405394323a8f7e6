//! # SDF text renderer.
use crate::atlas::TextureAtlas;
use crate::error::Result;
use crate::gpu::{shader::*, Ibo, Render, Texture2D, Vao, Vbo};
use crate::text::QuadBatch;
use std::sync::Arc;

/// Quads of one piece of text plus the atlas they sample.
pub struct TextElement {
    pub atlas: Arc<TextureAtlas<Texture2D>>,
    pub batches: Vec<QuadBatch>,
    /// Used for glyphs without a color of their own.
    pub color: [f32; 4],
}

pub struct SdfTextRendererState {
    // The current dimensions of the window.
    pub win_dims: (u32, u32),
    /// What the glyph edges blend into.
    pub background: [f32; 4],
}

pub struct SdfTextRenderer {
    // Text elements. (Scene graph)
    content: Vec<TextElement>,
    shader: Shader,
    u_mvp: UniformMat4,
    u_bg: UniformVec4,
    u_atlas: UniformSampler2D,
    // Attributes: position, tex coord, color.
    vao: Vao<3>,
    positions: Vbo,
    tex_coords: Vbo,
    colors: Vbo,
    ibo: Ibo,
}

const COLOR_ATTRIB: u32 = 2;

impl SdfTextRenderer {
    /// Compiles the shader and sets up the buffers. Needs a current context.
    pub unsafe fn new() -> Result<Self> {
        let shader = Shader::sdf()?;
        let u_mvp = shader.uniform_mat4("mvp")?;
        let u_bg = shader.uniform_vec4("bg")?;
        let u_atlas = shader.uniform_sampler2d("atlas")?;

        let vao = Vao::<3>::gen();
        vao.enable_attrib_arrays();

        let positions = Vbo::gen();
        positions.bind();
        vao.attrib_ptr(0, 2, gl::FLOAT, false);

        let tex_coords = Vbo::gen();
        tex_coords.bind();
        vao.attrib_ptr(1, 2, gl::FLOAT, false);

        let colors = Vbo::gen();
        colors.bind();
        vao.attrib_ptr(COLOR_ATTRIB, 4, gl::UNSIGNED_BYTE, true);

        let ibo = Ibo::gen();
        vao.bind();
        ibo.bind();

        Ok(SdfTextRenderer {
            content: vec![],
            shader,
            u_mvp,
            u_bg,
            u_atlas,
            vao,
            positions,
            tex_coords,
            colors,
            ibo,
        })
    }

    pub fn submit(&mut self, text: TextElement) {
        self.content.push(text);
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    unsafe fn draw_batch(&self, batch: &QuadBatch, texture: &Texture2D, color: [f32; 4]) {
        self.positions.data(&batch.positions);
        self.tex_coords.data(&batch.tex_coords);

        if batch.colors.is_empty() {
            // One color for the whole batch, as a constant attribute.
            self.vao.enable_attrib(COLOR_ATTRIB, false);
            gl::VertexAttrib4f(COLOR_ATTRIB, color[0], color[1], color[2], color[3]);
        } else {
            self.vao.enable_attrib(COLOR_ATTRIB, true);
            self.colors.data(&batch.colors);
        }

        self.ibo.data(&batch.indices);
        texture.bind(0);
        gl::DrawElements(
            gl::TRIANGLES,
            batch.indices.len() as i32,
            gl::UNSIGNED_INT,
            std::ptr::null(),
        );
    }
}

impl Render for SdfTextRenderer {
    type State = SdfTextRendererState;

    unsafe fn invoke(&self, state: &Self::State) {
        // Screen space with y pointing down, like the quads.
        let (win_w, win_h) = state.win_dims;
        let mvp = glm::ortho(0.0, win_w as f32, win_h as f32, 0.0, -1.0, 1.0);

        self.shader.bind();
        self.u_mvp.data(&mvp);
        self.u_bg.data(state.background);
        self.u_atlas.data(0);

        gl::Enable(gl::BLEND);
        gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        self.vao.bind();

        for text in &self.content {
            for batch in &text.batches {
                let Some(texture) = text.atlas.textures().get(batch.texture_index) else {
                    log::warn!("batch refers to missing page {}", batch.texture_index);
                    continue;
                };
                self.draw_batch(batch, texture, text.color);
            }
        }

        gl::Disable(gl::BLEND);
    }
}
