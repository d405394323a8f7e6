//! Finding fonts by name.
//!
//! A [`FontResolver`] lists the fonts installed on the system. Names are
//! matched against the list with a crude token score, see [`best_match`].
use crate::face::TtfFace;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontInfo {
    /// Lowercase name used for matching.
    pub key: String,
    pub name: String,
    pub path: PathBuf,
}

impl FontInfo {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> FontInfo {
        FontInfo {
            key: name.to_lowercase(),
            name: name.to_string(),
            path: path.into(),
        }
    }
}

pub trait FontResolver: Send {
    /// Lists the available fonts. May come back empty if the platform
    /// refuses to answer, callers retry.
    fn scan(&mut self) -> Vec<FontInfo>;

    /// Returned when nothing matches a query.
    fn fallback(&self) -> FontInfo;

    /// Family of the default font.
    fn default_family(&self) -> &str;
}

/// Picks the font whose key covers the largest share of the query tokens.
///
/// Each whitespace separated token of the lowercased query found in a key
/// scores its length; the score is divided by the key's length so that
/// "arial" prefers `arial` over `arial black`.
pub fn best_match<'a>(infos: &'a [FontInfo], query: &str) -> Option<&'a FontInfo> {
    let query = query.to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let mut best = None;
    let mut high_score = 0.0;
    for info in infos {
        let hits: usize = tokens
            .iter()
            .filter(|tok| info.key.contains(*tok))
            .map(|tok| tok.len())
            .sum();
        if hits > 0 {
            let score = hits as f32 / info.key.len() as f32;
            if score > high_score {
                high_score = score;
                best = Some(info);
            }
        }
    }
    best
}

/// Scans font directories for TrueType and OpenType files.
pub struct DirectoryScanner {
    dirs: Vec<PathBuf>,
    fallback: FontInfo,
    default_family: String,
}

impl DirectoryScanner {
    pub fn new(dirs: Vec<PathBuf>, fallback: FontInfo, default_family: &str) -> DirectoryScanner {
        DirectoryScanner {
            dirs,
            fallback,
            default_family: default_family.to_string(),
        }
    }

    /// The font directories of the current platform.
    pub fn system() -> DirectoryScanner {
        let home = std::env::var_os("HOME").map(PathBuf::from);

        if cfg!(target_os = "windows") {
            let windir = std::env::var_os("WINDIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
            let fonts = windir.join("Fonts");
            let arial = FontInfo::new("Arial", fonts.join("arial.ttf"));
            DirectoryScanner::new(vec![fonts], arial, "Arial")
        } else if cfg!(target_os = "macos") {
            let mut dirs = vec![
                PathBuf::from("/System/Library/Fonts"),
                PathBuf::from("/Library/Fonts"),
            ];
            dirs.extend(home.map(|h| h.join("Library/Fonts")));
            let helvetica =
                FontInfo::new("Helvetica", "/System/Library/Fonts/Helvetica.ttc");
            DirectoryScanner::new(dirs, helvetica, "Helvetica")
        } else if cfg!(target_os = "android") {
            let roboto = FontInfo::new("Roboto Regular", "/system/fonts/Roboto-Regular.ttf");
            DirectoryScanner::new(vec![PathBuf::from("/system/fonts")], roboto, "Roboto")
        } else {
            let mut dirs = vec![];
            match std::env::var_os("XDG_DATA_HOME") {
                Some(data) => dirs.push(PathBuf::from(data).join("fonts")),
                None => dirs.extend(home.as_ref().map(|h| h.join(".local/share/fonts"))),
            }
            dirs.extend(home.map(|h| h.join(".fonts")));
            dirs.push(PathBuf::from("/usr/local/share/fonts"));
            dirs.push(PathBuf::from("/usr/share/fonts"));
            let dejavu = FontInfo::new(
                "DejaVu Sans",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            );
            DirectoryScanner::new(dirs, dejavu, "DejaVu Sans")
        }
    }

    fn visit(&self, dir: &Path, out: &mut Vec<FontInfo>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            // Symlinked directories are not followed, they may loop.
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                self.visit(&path, out);
            } else if is_font_file(&path) {
                if let Some(info) = describe(&path) {
                    push_with_variants(out, info);
                }
            }
        }
    }
}

fn is_font_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    matches!(ext.as_deref(), Some("ttf" | "otf" | "ttc"))
}

/// Reads the full name of the font at `path`, falling back to the file name.
fn describe(path: &Path) -> Option<FontInfo> {
    let data = fs::read(path).ok()?;
    let face = match TtfFace::parse(&data) {
        Ok(face) => face,
        Err(e) => {
            log::debug!("skipping {}: {}", path.display(), e);
            return None;
        }
    };
    let name = face
        .full_name()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))?;
    Some(FontInfo::new(&name, path))
}

/// Also registers "Roboto Regular" as "roboto ", so a bare family name
/// prefers the regular style.
fn push_with_variants(out: &mut Vec<FontInfo>, info: FontInfo) {
    let variant = info.key.contains("regular").then(|| FontInfo {
        key: info.key.replacen("regular", "", 1),
        ..info.clone()
    });
    out.push(info);
    out.extend(variant);
}

impl FontResolver for DirectoryScanner {
    fn scan(&mut self) -> Vec<FontInfo> {
        let mut out = vec![];
        for dir in &self.dirs {
            self.visit(dir, &mut out);
        }
        log::debug!("found {} font entries", out.len());
        out
    }

    fn fallback(&self) -> FontInfo {
        self.fallback.clone()
    }

    fn default_family(&self) -> &str {
        &self.default_family
    }
}
