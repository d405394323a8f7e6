//! Builds an MSDF atlas for a font on the CPU and writes it to disk: one PNG
//! per page plus `atlas.json` describing where every glyph lives.
use anyhow::{bail, Context};
use clap::Parser;
use image::{Rgb, RgbImage};
use nalgebra_glm::Vec2;
use sdftext::{AtlasCache, CpuTextures, DrawOptions, Font, Format, ScreenRect, SdfText, BASE_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

mod logger;

#[derive(Debug, Parser)]
#[command(about = "Render a multi-channel SDF glyph atlas")]
struct Args {
    /// Font file. Without it the font is looked up by --name.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Installed font to look up; the platform default if neither is given.
    #[arg(long)]
    name: Option<String>,

    /// Characters to put in the atlas.
    #[arg(long)]
    chars: Option<String>,

    /// Page size in pixels.
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    page: Option<Vec<u32>>,

    /// Distance field scale relative to 32 px per em.
    #[arg(long)]
    scale: Option<f32>,

    /// Padding around each glyph, in pixels at scale 1.
    #[arg(long)]
    padding: Option<f32>,

    /// TOML file with a format; the flags above override it.
    #[arg(long)]
    format: Option<PathBuf>,

    /// Text laid out into preview.png.
    #[arg(long, default_value = "The quick brown fox jumps over the lazy dog.")]
    sample: String,

    /// Font size of the preview.
    #[arg(long, default_value_t = 32.0)]
    size: f32,

    #[arg(short, long, default_value = "atlas")]
    out: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn format(&self) -> anyhow::Result<Format> {
        let mut format = match &self.format {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Format::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Format::default(),
        };
        if let Some(page) = &self.page {
            format = format.texture_size(page[0], page[1]);
        }
        if let Some(scale) = self.scale {
            format = format.sdf_scale(scale, scale);
        }
        if let Some(padding) = self.padding {
            format = format.sdf_padding(padding, padding);
        }
        if format.texture_width == 0 || format.texture_height == 0 {
            bail!("page size must not be zero");
        }
        Ok(format)
    }

    fn font(&self) -> anyhow::Result<Font> {
        let font = match (&self.font, &self.name) {
            (Some(path), _) => Font::from_file(path, self.size)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(name)) => Font::from_name(name, self.size)?,
            (None, None) => Font::default_font()?.with_size(self.size),
        };
        Ok(font)
    }
}

/// What a run produced.
#[derive(Debug)]
struct Summary {
    pages: Vec<PathBuf>,
    descriptor: PathBuf,
    preview: PathBuf,
    glyphs: usize,
}

fn run(args: &Args) -> anyhow::Result<Summary> {
    let format = args.format()?;
    let font = args.font()?;
    let chars = args
        .chars
        .clone()
        .unwrap_or_else(|| SdfText::<RgbImage>::default_chars().to_string());
    log::info!("{} ({} {}) at {} px", font.name(), font.family(), font.style(), font.size());

    let mut cache = AtlasCache::new(CpuTextures::new());
    let text = SdfText::new(&font, &format, &chars, &mut cache)?;
    let atlas = text.atlas();

    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let mut pages = vec![];
    for (n, page) in atlas.textures().iter().enumerate() {
        let path = args.out.join(format!("page_{}.png", n));
        page.save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        pages.push(path);
    }

    let descriptor = args.out.join("atlas.json");
    let json = serde_json::to_string_pretty(&atlas.descriptor())?;
    fs::write(&descriptor, json).with_context(|| format!("writing {}", descriptor.display()))?;

    let preview = args.out.join("preview.png");
    render_preview(&text, &args.sample, &preview)?;

    Ok(Summary {
        pages,
        descriptor,
        preview,
        glyphs: atlas.glyph_map().len(),
    })
}

/// Lays `sample` out in a 640 px wide box and draws it by thresholding the
/// distance field, nearest sampled.
fn render_preview(text: &SdfText<RgbImage>, sample: &str, path: &Path) -> anyhow::Result<()> {
    let options = DrawOptions::default();
    let width = 640.0;
    let fit = ScreenRect::new(0.0, 0.0, width, 0.0);
    let placements = text.glyph_placements_wrapped(sample, fit, &options);
    let lines = placements
        .iter()
        .map(|(_, p)| p.y)
        .fold(0.0, f32::max);
    let line_height = text.metrics().line_height(&options);
    let height = (lines + 2.0 * line_height).ceil() as u32;
    println!(
        "sample: {} glyphs, {:.1} px wide unwrapped, {:.1} px line height",
        placements.len(),
        text.measure_string(sample, &options).x,
        line_height
    );

    let mut image = RgbImage::from_pixel(width as u32, height.max(1), Rgb([255, 255, 255]));
    let metrics = text.metrics();
    let baseline = Vec2::new(0.0, metrics.ascent * metrics.size / BASE_SIZE);
    for batch in text.quads(&placements, baseline, &options, &[]) {
        let Some(page) = text.texture(batch.texture_index) else {
            continue;
        };
        for quad in 0..batch.glyph_count() {
            let [x2, y1] = batch.positions[quad * 4];
            let [x1, y2] = batch.positions[quad * 4 + 3];
            let [u2, v1] = batch.tex_coords[quad * 4];
            let [u1, v2] = batch.tex_coords[quad * 4 + 3];
            draw_quad(&mut image, page, [x1, y1, x2, y2], [u1, v1, u2, v2]);
        }
    }
    image
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn draw_quad(image: &mut RgbImage, page: &RgbImage, dest: [f32; 4], tex: [f32; 4]) {
    let [x1, y1, x2, y2] = dest;
    let [u1, v1, u2, v2] = tex;
    let (w, h) = image.dimensions();
    let (pw, ph) = page.dimensions();
    let rows = (y1.max(0.0) as u32)..(y2.max(0.0) as u32).min(h);
    for y in rows {
        for x in (x1.max(0.0) as u32)..(x2.max(0.0) as u32).min(w) {
            let s = (x as f32 + 0.5 - x1) / (x2 - x1);
            let t = (y as f32 + 0.5 - y1) / (y2 - y1);
            let u = (u1 + s * (u2 - u1)) * pw as f32;
            let v = (v1 + t * (v2 - v1)) * ph as f32;
            let px = page.get_pixel((u as u32).min(pw - 1), (v as u32).min(ph - 1)).0;
            if median(px) > 127 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
}

fn median([r, g, b]: [u8; 3]) -> u8 {
    r.min(g).max(r.max(g).min(b))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    let summary = run(&args)?;
    for page in &summary.pages {
        println!("wrote {}", page.display());
    }
    println!("wrote {}", summary.descriptor.display());
    println!("wrote {}", summary.preview.display());
    println!("{} glyphs on {} page(s)", summary.glyphs, summary.pages.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Any TrueType font commonly found on Linux machines.
    fn system_font() -> Option<PathBuf> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    }

    #[test]
    fn flags_override_the_format_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml = dir.path().join("format.toml");
        fs::write(&toml, "texture_width = 256\ntexture_height = 256\nsdf_padding = [4.0, 4.0]\n")
            .unwrap();
        let args = Args::try_parse_from([
            "sdftext-example",
            "--format",
            toml.to_str().unwrap(),
            "--scale",
            "2",
            "--page",
            "512",
            "128",
        ])
        .unwrap();
        let format = args.format().unwrap();
        assert_eq!((format.texture_width, format.texture_height), (512, 128));
        assert_eq!(format.sdf_scale, [2.0, 2.0]);
        assert_eq!(format.sdf_padding, [4.0, 4.0]);
    }

    #[test]
    fn zero_page_is_rejected() {
        let args = Args::try_parse_from(["sdftext-example", "--page", "0", "64"]).unwrap();
        assert!(args.format().is_err());
    }

    #[test]
    fn median_of_three() {
        assert_eq!(median([10, 200, 100]), 100);
        assert_eq!(median([255, 0, 255]), 255);
    }

    #[test]
    fn writes_pages_and_descriptor() {
        let Some(font) = system_font() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "sdftext-example",
            "--font",
            font.to_str().unwrap(),
            "--chars",
            "Hello",
            "--page",
            "128",
            "128",
            "--out",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        let summary = run(&args).unwrap();
        assert!(!summary.pages.is_empty());
        for page in &summary.pages {
            let img = image::open(page).unwrap();
            assert_eq!((img.width(), img.height()), (128, 128));
        }

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.descriptor).unwrap()).unwrap();
        // H, e, l, o and the space.
        assert_eq!(json["chars"].as_array().unwrap().len(), 5);
        assert_eq!(json["page_size"], serde_json::json!([128, 128]));
        assert!(summary.preview.exists());
    }
}
