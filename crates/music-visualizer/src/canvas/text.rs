//! Text rasterization through usvg/resvg.
//!
//! A line of text is wrapped in a tiny SVG document, laid out with the
//! system font database and rendered into a sprite. Lyrics change a few
//! times per minute while frames run at display rate, so sprites are cached.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use ecolor::Color32;
use emath::{vec2, Vec2};
use tiny_skia::{IntSize, Pixmap};

use super::{FontSpec, TextShadow};
use crate::color::format_color;
use crate::error::{Result, VisualizerError};

const GLYPH_ADVANCE: f32 = 0.55;
const MAX_CACHED: usize = 32;

pub(crate) struct Sprite {
    pub pixmap: Pixmap,
    /// Offset of the text center inside the sprite.
    pub anchor: Vec2,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct SpriteKey {
    text: String,
    family: String,
    size: u32,
    bold: bool,
    color: Color32,
    shadow: Option<(Color32, u32)>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct WidthKey {
    text: String,
    family: String,
    size: u32,
    bold: bool,
}

impl WidthKey {
    fn new(text: &str, font: &FontSpec) -> Self {
        Self {
            text: text.to_string(),
            family: font.family.clone(),
            size: font.size.to_bits(),
            bold: font.bold,
        }
    }
}

#[derive(Default)]
pub(crate) struct TextRenderer {
    fontdb: Option<Arc<usvg::fontdb::Database>>,
    extra_fonts: Vec<std::path::PathBuf>,
    sprites: HashMap<SpriteKey, Sprite>,
    widths: HashMap<WidthKey, f32>,
}

impl TextRenderer {
    pub fn load_font_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(VisualizerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("font file {} not found", path.display()),
            )));
        }
        self.extra_fonts.push(path.to_path_buf());
        self.fontdb = None;
        self.sprites.clear();
        self.widths.clear();
        self.load_fonts();
        Ok(())
    }

    /// Build the font database now instead of on the first text draw.
    pub fn load_fonts(&mut self) -> Arc<usvg::fontdb::Database> {
        let db = self.fontdb.get_or_insert_with(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            for path in &self.extra_fonts {
                if let Err(err) = db.load_font_file(path) {
                    tracing::warn!(path = %path.display(), %err, "failed to load font");
                }
            }
            tracing::debug!(faces = db.len(), "font database ready");
            Arc::new(db)
        });
        Arc::clone(db)
    }

    fn options(&mut self) -> usvg::Options<'static> {
        let mut options = usvg::Options::default();
        options.fontdb = self.load_fonts();
        options
    }

    pub fn measure(&mut self, text: &str, font: &FontSpec) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let key = WidthKey::new(text, font);
        if let Some(width) = self.widths.get(&key) {
            return *width;
        }
        let width = self.layout_width(text, font);
        if self.widths.len() >= MAX_CACHED {
            self.widths.clear();
        }
        self.widths.insert(key, width);
        width
    }

    fn layout_width(&mut self, text: &str, font: &FontSpec) -> f32 {
        let fallback = text.chars().count() as f32 * font.size * GLYPH_ADVANCE;
        let width = (fallback * 2.0 + font.size * 4.0).ceil();
        let height = (font.size * 2.0).ceil();
        let svg = text_svg(text, font, Color32::WHITE, None, width, height);
        let options = self.options();
        match usvg::Tree::from_str(&svg, &options) {
            Ok(tree) => {
                let measured = tree.root().abs_bounding_box().width();
                if measured > 0.0 {
                    measured
                } else {
                    fallback
                }
            }
            Err(_) => fallback,
        }
    }

    pub fn sprite(
        &mut self,
        text: &str,
        font: &FontSpec,
        color: Color32,
        shadow: Option<TextShadow>,
    ) -> Option<&Sprite> {
        if text.trim().is_empty() || font.size <= 0.0 {
            return None;
        }
        let key = SpriteKey {
            text: text.to_string(),
            family: font.family.clone(),
            size: font.size.to_bits(),
            bold: font.bold,
            color,
            shadow: shadow.map(|s| (s.color, s.blur.to_bits())),
        };
        if !self.sprites.contains_key(&key) {
            let sprite = self.render(text, font, color, shadow)?;
            if self.sprites.len() >= MAX_CACHED {
                self.sprites.clear();
            }
            self.sprites.insert(key.clone(), sprite);
        }
        self.sprites.get(&key)
    }

    fn render(
        &mut self,
        text: &str,
        font: &FontSpec,
        color: Color32,
        shadow: Option<TextShadow>,
    ) -> Option<Sprite> {
        let pad = shadow.map_or(0.0, |s| s.blur * 2.0) + font.size * 0.25;
        let width = (self.measure(text, font) + pad * 2.0).ceil().max(1.0);
        let height = (font.size * 1.5 + pad * 2.0).ceil().max(1.0);
        let svg = text_svg(text, font, color, shadow, width, height);
        let options = self.options();
        let tree = match usvg::Tree::from_str(&svg, &options) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!(%err, "text layout failed");
                return None;
            }
        };
        let (w, h) = (width as u32, height as u32);
        let mut target = resvg::tiny_skia::Pixmap::new(w, h)?;
        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut target.as_mut());
        let pixmap = Pixmap::from_vec(target.take(), IntSize::from_wh(w, h)?)?;
        Some(Sprite {
            pixmap,
            anchor: vec2(width / 2.0, height / 2.0),
        })
    }
}

fn text_svg(
    text: &str,
    font: &FontSpec,
    color: Color32,
    shadow: Option<TextShadow>,
    width: f32,
    height: f32,
) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let mut filter_attr = "";
    if let Some(shadow) = shadow {
        let [r, g, b, a] = shadow.color.to_srgba_unmultiplied();
        let _ = write!(
            svg,
            r##"<defs><filter id="s" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="0" dy="0" stdDeviation="{}" flood-color="#{r:02x}{g:02x}{b:02x}" flood-opacity="{:.3}"/></filter></defs>"##,
            shadow.blur / 2.0,
            f32::from(a) / 255.0,
        );
        filter_attr = r#" filter="url(#s)""#;
    }
    let [_, _, _, alpha] = color.to_srgba_unmultiplied();
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" fill="{}" fill-opacity="{:.3}" text-anchor="middle" dominant-baseline="central"{filter_attr}>{}</text></svg>"#,
        width / 2.0,
        height / 2.0,
        escape(&font.family),
        font.size,
        if font.bold { "bold" } else { "normal" },
        &format_color(Color32::from_rgb(color.r(), color.g(), color.b()))[..7],
        f32::from(alpha) / 255.0,
        escape(text),
    );
    svg
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
