//! Error type shared by the whole crate.
//!
//! Only conditions that make a font or an entire atlas unusable are errors.
//! Problems scoped to a single glyph are logged and leave a blank cell.
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The font library could not resolve `name` to an existing file.
    FontNotFound { name: String, path: PathBuf },
    /// Reading font data failed.
    Io(io::Error),
    /// The font data is not a face ttf-parser understands.
    FaceParsing(ttf_parser::FaceParsingError),
    /// The face has no usable metrics (zero units per em).
    NullFace,
    /// A single cell plus its gutter does not fit in a texture page.
    AtlasTooSmall { cell: (u32, u32), page: (u32, u32) },
    /// Scale and padding produce an empty cell.
    DegenerateCell { cell: (u32, u32) },
    /// The texture backend rejected a page.
    Upload(String),
    /// A GLSL program failed to compile or link, or lacks a uniform.
    Shader(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FontNotFound { name, path } => {
                write!(f, "font '{}' resolved to {}, which does not exist", name, path.display())
            }
            Error::Io(e) => write!(f, "failed to load font data: {}", e),
            Error::FaceParsing(e) => write!(f, "failed to parse font face: {}", e),
            Error::NullFace => write!(f, "null font face"),
            Error::AtlasTooSmall { cell, page } => write!(
                f,
                "atlas too small: a {}x{} cell does not fit a {}x{} page",
                cell.0, cell.1, page.0, page.1
            ),
            Error::DegenerateCell { cell } => {
                write!(f, "degenerate sdf cell size {}x{}", cell.0, cell.1)
            }
            Error::Upload(msg) => write!(f, "texture upload failed: {}", msg),
            Error::Shader(msg) => write!(f, "shader error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::FaceParsing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ttf_parser::FaceParsingError> for Error {
    fn from(e: ttf_parser::FaceParsingError) -> Self {
        Error::FaceParsing(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_too_small_names_both_sizes() {
        let e = Error::AtlasTooSmall {
            cell: (24, 28),
            page: (16, 16),
        };
        let msg = e.to_string();
        assert!(msg.contains("24x28"), "{}", msg);
        assert!(msg.contains("16x16"), "{}", msg);
    }

    #[test]
    fn io_errors_keep_their_source() {
        let e: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
