use ecolor::Color32;
use emath::{Pos2, Rect, Vec2};

use super::{Canvas, CornerRadii, FillStyle, FontSpec, Glow, LineCap, RasterImage, TextShadow};

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.55;

/// One recorded primitive, with the canvas translation already applied.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        style: FillStyle,
        glow: Option<Glow>,
    },
    RoundedRect {
        rect: Rect,
        radii: CornerRadii,
        style: FillStyle,
        glow: Option<Glow>,
    },
    Segment {
        from: Pos2,
        to: Pos2,
        width: f32,
        cap: LineCap,
        style: FillStyle,
        glow: Option<Glow>,
    },
    Polyline {
        points: Vec<Pos2>,
        width: f32,
        style: FillStyle,
        glow: Option<Glow>,
    },
    Polygon {
        points: Vec<Pos2>,
        style: FillStyle,
        glow: Option<Glow>,
    },
    Circle {
        center: Pos2,
        radius: f32,
        color: Color32,
        glow: Option<Glow>,
    },
    Image {
        dest: Rect,
        opacity: f32,
        source_size: (u32, u32),
    },
    Text {
        text: String,
        center: Pos2,
        size: f32,
        color: Color32,
        shadow: Option<TextShadow>,
    },
}

impl DrawCommand {
    /// Glow that was active when the primitive was drawn. Images and text
    /// never glow.
    pub fn glow(&self) -> Option<Glow> {
        match self {
            DrawCommand::FillRect { glow, .. }
            | DrawCommand::RoundedRect { glow, .. }
            | DrawCommand::Segment { glow, .. }
            | DrawCommand::Polyline { glow, .. }
            | DrawCommand::Polygon { glow, .. }
            | DrawCommand::Circle { glow, .. } => *glow,
            DrawCommand::Clear | DrawCommand::Image { .. } | DrawCommand::Text { .. } => None,
        }
    }
}

/// Canvas that records calls instead of rasterizing them.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    translation: Vec2,
    glow: Option<Glow>,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Commands recorded after the leading `Clear`.
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear))
            .map_or(0, |i| i + 1);
        &self.commands[start..]
    }

    pub fn rounded_rects(&self) -> impl Iterator<Item = (&Rect, &CornerRadii)> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::RoundedRect { rect, radii, .. } => Some((rect, radii)),
            _ => None,
        })
    }

    /// `(from, to, width, cap)` of every stroked segment.
    pub fn segments(&self) -> impl Iterator<Item = (Pos2, Pos2, f32, LineCap)> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::Segment {
                from,
                to,
                width,
                cap,
                ..
            } => Some((*from, *to, *width, *cap)),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (&Pos2, f32, &Color32)> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::Circle {
                center,
                radius,
                color,
                ..
            } => Some((center, *radius, color)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn shift(&self, p: Pos2) -> Pos2 {
        p + self.translation
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn set_translation(&mut self, offset: Vec2) {
        self.translation = offset;
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }

    fn fill_rect(&mut self, rect: Rect, style: &FillStyle) {
        self.commands.push(DrawCommand::FillRect {
            rect: rect.translate(self.translation),
            style: style.clone(),
            glow: self.glow,
        });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radii: CornerRadii, style: &FillStyle) {
        self.commands.push(DrawCommand::RoundedRect {
            rect: rect.translate(self.translation),
            radii,
            style: style.clone(),
            glow: self.glow,
        });
    }

    fn stroke_segment(&mut self, from: Pos2, to: Pos2, width: f32, cap: LineCap, style: &FillStyle) {
        self.commands.push(DrawCommand::Segment {
            from: self.shift(from),
            to: self.shift(to),
            width,
            cap,
            style: style.clone(),
            glow: self.glow,
        });
    }

    fn stroke_polyline(&mut self, points: &[Pos2], width: f32, style: &FillStyle) {
        let points = points.iter().map(|p| self.shift(*p)).collect();
        self.commands.push(DrawCommand::Polyline {
            points,
            width,
            style: style.clone(),
            glow: self.glow,
        });
    }

    fn fill_polygon(&mut self, points: &[Pos2], style: &FillStyle) {
        let points = points.iter().map(|p| self.shift(*p)).collect();
        self.commands.push(DrawCommand::Polygon {
            points,
            style: style.clone(),
            glow: self.glow,
        });
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.commands.push(DrawCommand::Circle {
            center: self.shift(center),
            radius,
            color,
            glow: self.glow,
        });
    }

    fn draw_image(&mut self, image: &RasterImage, dest: Rect, opacity: f32) {
        self.commands.push(DrawCommand::Image {
            dest: dest.translate(self.translation),
            opacity,
            source_size: image.size(),
        });
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size * GLYPH_ADVANCE
    }

    fn draw_text(
        &mut self,
        text: &str,
        center: Pos2,
        font: &FontSpec,
        color: Color32,
        shadow: Option<TextShadow>,
    ) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            center: self.shift(center),
            size: font.size,
            color,
            shadow,
        });
    }
}
