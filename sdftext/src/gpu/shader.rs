//! Shader abstraction.
use crate::error::{Error, Result};
use gl::{types::*, FRAGMENT_SHADER, VERTEX_SHADER};
use std::ffi::CString;
use std::ptr;

/// A shader is just a wrapper around its program ID.
pub struct Shader {
    pub shader: GLuint,
}

//
// Uniform types.
//
pub struct UniformMat4(pub GLint);
pub struct UniformVec4(pub GLint);
pub struct UniformSampler2D(pub GLint);

impl UniformMat4 {
    pub unsafe fn data(&self, m: &glm::Mat4) {
        gl::UniformMatrix4fv(self.0, 1, gl::FALSE, m.as_ptr());
    }
}

impl UniformVec4 {
    pub unsafe fn data(&self, v: [f32; 4]) {
        gl::Uniform4f(self.0, v[0], v[1], v[2], v[3]);
    }
}

impl UniformSampler2D {
    pub unsafe fn data(&self, unit: u32) {
        gl::Uniform1i(self.0, unit as GLint);
    }
}

// Shaders programs:
// I just include them in the binary, so the binary is portable.
const TXT_SDF_FRAG: &str = include_str!("sdf.frag.glsl");
const TXT_SDF_VERT: &str = include_str!("sdf.vert.glsl");

impl Shader {
    /// The MSDF text program.
    pub unsafe fn sdf() -> Result<Shader> {
        Shader::program(TXT_SDF_VERT, TXT_SDF_FRAG)
    }

    unsafe fn program(vert_src: &str, frag_src: &str) -> Result<Shader> {
        let vert = Shader::compile(VERTEX_SHADER, vert_src)?;
        let frag = match Shader::compile(FRAGMENT_SHADER, frag_src) {
            Ok(frag) => frag,
            Err(e) => {
                gl::DeleteShader(vert);
                return Err(e);
            }
        };
        let program = gl::CreateProgram();
        gl::AttachShader(program, vert);
        gl::AttachShader(program, frag);
        let linked = Shader::link(program);
        gl::DeleteShader(vert);
        gl::DeleteShader(frag);
        if let Err(e) = linked {
            gl::DeleteProgram(program);
            return Err(e);
        }
        Ok(Shader { shader: program })
    }

    pub unsafe fn bind(&self) {
        gl::UseProgram(self.shader);
    }

    pub unsafe fn uniform_mat4(&self, name: &str) -> Result<UniformMat4> {
        self.uniform_location(name).map(UniformMat4)
    }

    pub unsafe fn uniform_vec4(&self, name: &str) -> Result<UniformVec4> {
        self.uniform_location(name).map(UniformVec4)
    }

    pub unsafe fn uniform_sampler2d(&self, name: &str) -> Result<UniformSampler2D> {
        self.uniform_location(name).map(UniformSampler2D)
    }

    unsafe fn uniform_location(&self, name: &str) -> Result<GLint> {
        self.bind();
        let c_name =
            CString::new(name).map_err(|_| Error::Shader(format!("bad uniform name {:?}", name)))?;
        let loc = gl::GetUniformLocation(self.shader, c_name.as_ptr());
        if loc != -1 {
            Ok(loc)
        } else {
            Err(Error::Shader(format!("no uniform named {}", name)))
        }
    }

    /// Compile a shader with error check.
    unsafe fn compile(ty: GLenum, src: &str) -> Result<GLuint> {
        let src = CString::new(src).map_err(|_| Error::Shader("nul byte in source".into()))?;
        let sh = gl::CreateShader(ty);
        gl::ShaderSource(sh, 1, &src.as_ptr(), ptr::null());
        gl::CompileShader(sh);

        // Check for compile errors.
        let mut ok = gl::FALSE as GLint;
        gl::GetShaderiv(sh, gl::COMPILE_STATUS, &mut ok);

        if ok != gl::TRUE as GLint {
            let mut info_log = vec![0u8; 512];
            let mut len = 0;
            gl::GetShaderInfoLog(sh, 512, &mut len, info_log.as_mut_ptr() as *mut GLchar);
            gl::DeleteShader(sh);

            let msg = String::from_utf8_lossy(&info_log[..len.max(0) as usize]).into_owned();
            log::error!("shader compile: {}", msg);
            return Err(Error::Shader(msg));
        }

        Ok(sh)
    }

    /// Links a shader program.
    unsafe fn link(prog: GLuint) -> Result<()> {
        gl::LinkProgram(prog);

        // Check for linker errors.
        let mut ok = gl::FALSE as GLint;
        gl::GetProgramiv(prog, gl::LINK_STATUS, &mut ok);

        if ok != gl::TRUE as GLint {
            let mut info_log = vec![0u8; 512];
            let mut len = 0;
            gl::GetProgramInfoLog(prog, 512, &mut len, info_log.as_mut_ptr() as *mut GLchar);

            let msg = String::from_utf8_lossy(&info_log[..len.max(0) as usize]).into_owned();
            log::error!("shader link: {}", msg);
            return Err(Error::Shader(msg));
        }

        gl::ValidateProgram(prog);
        Ok(())
    }
}
