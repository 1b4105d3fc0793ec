use std::fmt;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use egui::{Pos2, Rect};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tiny_skia::{
    BlendMode, ColorU8, FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Stroke, StrokeDash, Transform,
};

use crate::annotation::measure_text;
use crate::error::{EditorError, Result};
use crate::style::Rgba;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Helvetica.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Fonts used for text, step and ruler labels. Missing fonts mean glyphs are skipped.
#[derive(Clone, Default)]
pub struct Fonts {
    regular: Option<FontArc>,
    bold: Option<FontArc>,
}

impl Fonts {
    pub fn load_system() -> Self {
        let regular = load_first(FONT_CANDIDATES);
        let bold = load_first(BOLD_FONT_CANDIDATES);
        if regular.is_none() {
            log::warn!("no system font found, text will render without glyphs");
        }
        Self { regular, bold }
    }

    pub fn from_font(font: FontArc) -> Self {
        Self {
            regular: Some(font),
            bold: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.regular.is_some()
    }

    /// Advance width of a single line, or `None` without a font.
    pub fn line_width(&self, text: &str, size: f32, bold: bool) -> Option<f32> {
        let (font, fake_bold) = self.pick(bold)?;
        let scaled = font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        if fake_bold && !text.is_empty() {
            width += 0.8;
        }
        Some(width)
    }

    /// Returns the font to use and whether bold has to be synthesized.
    fn pick(&self, bold: bool) -> Option<(&FontArc, bool)> {
        if bold {
            if let Some(font) = self.bold.as_ref() {
                return Some((font, false));
            }
            return self.regular.as_ref().map(|font| (font, true));
        }
        self.regular.as_ref().map(|font| (font, false))
    }
}

impl fmt::Debug for Fonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fonts")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

fn load_first(candidates: &[&str]) -> Option<FontArc> {
    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                log::debug!("loaded font {path}");
                return Some(font);
            }
        }
    }
    None
}

/// An image-space drawing target backed by a premultiplied pixmap.
pub struct Surface<'f> {
    pixmap: Pixmap,
    fonts: &'f Fonts,
}

impl<'f> Surface<'f> {
    pub fn from_image(image: &RgbaImage, fonts: &'f Fonts) -> Result<Self> {
        Ok(Self {
            pixmap: pixmap_from_image(image)?,
            fonts,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_min_max(
            Pos2::ZERO,
            Pos2::new(self.width() as f32, self.height() as f32),
        )
    }

    pub fn into_image(self) -> Result<RgbaImage> {
        image_from_pixmap(&self.pixmap)
    }

    pub fn fill_path(&mut self, path: &Path, color: Rgba) {
        self.fill_path_with(path, color, FillRule::Winding, BlendMode::SourceOver);
    }

    pub fn fill_path_with(&mut self, path: &Path, color: Rgba, rule: FillRule, blend: BlendMode) {
        let paint = solid_paint(color, blend);
        self.pixmap
            .fill_path(path, &paint, rule, Transform::identity(), None);
    }

    pub fn stroke_path(&mut self, path: &Path, color: Rgba, width: f32) {
        self.stroke_path_with(path, color, width, None, BlendMode::SourceOver);
    }

    pub fn stroke_path_with(
        &mut self,
        path: &Path,
        color: Rgba,
        width: f32,
        dash: Option<&[f32]>,
        blend: BlendMode,
    ) {
        let paint = solid_paint(color, blend);
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash: dash.and_then(|intervals| StrokeDash::new(intervals.to_vec(), 0.0)),
            ..Default::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }

    /// Copies `image` onto the surface with its top-left corner at (x, y).
    pub fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) -> Result<()> {
        let patch = pixmap_from_image(image)?;
        self.pixmap.draw_pixmap(
            x,
            y,
            patch.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Advance width of a single line, falling back to the layout estimate without a font.
    pub fn measure_text(&self, text: &str, size: f32, bold: bool) -> f32 {
        self.fonts
            .line_width(text, size, bold)
            .unwrap_or_else(|| measure_text(text, size, bold).width)
    }

    /// Draws one line of text with its baseline starting at `origin`.
    pub fn draw_text(&mut self, text: &str, origin: Pos2, size: f32, bold: bool, color: Rgba) {
        if text.is_empty() {
            return;
        }
        let Some((font, fake_bold)) = self.fonts.pick(bold) else {
            return;
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };

        let width = self.pixmap.width() as i32;
        let height = self.pixmap.height() as i32;
        let offsets: &[f32] = if fake_bold { &[0.0, 0.8] } else { &[0.0] };
        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);
        let data = mask.data_mut();

        for offset in offsets {
            let mut caret = origin.x + offset;
            let mut previous = None;
            for ch in text.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(prev) = previous {
                    caret += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(scale, point(caret, origin.y));
                caret += scaled.h_advance(id);
                previous = Some(id);

                let Some(outlined) = font.outline_glyph(glyph) else {
                    continue;
                };
                let bb = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bb.min.x as i32 + gx as i32;
                    let py = bb.min.y as i32 + gy as i32;
                    if px < 0 || py < 0 || px >= width || py >= height {
                        return;
                    }
                    let idx = (py * width + px) as usize;
                    let value = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                    data[idx] = data[idx].max(value);
                });
            }
        }

        let Some(area) = tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, height as f32) else {
            return;
        };
        let paint = solid_paint(color, BlendMode::SourceOver);
        self.pixmap
            .fill_rect(area, &paint, Transform::identity(), Some(&mask));
    }
}

fn solid_paint(color: Rgba, blend: BlendMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    paint.anti_alias = true;
    paint.blend_mode = blend;
    paint
}

pub fn pixmap_from_image(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap =
        Pixmap::new(image.width(), image.height()).ok_or(EditorError::SurfaceAllocation {
            width: image.width(),
            height: image.height(),
        })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

pub fn image_from_pixmap(pixmap: &Pixmap) -> Result<RgbaImage> {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw).ok_or(
        EditorError::InvalidImageSize {
            width: pixmap.width(),
            height: pixmap.height(),
        },
    )
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(EditorError::Encode)?;
    Ok(buffer.into_inner())
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(EditorError::Decode)
}

pub fn rect_path(rect: Rect) -> Option<Path> {
    let r = tiny_skia::Rect::from_ltrb(rect.left(), rect.top(), rect.right(), rect.bottom())?;
    Some(PathBuilder::from_rect(r))
}

pub fn ellipse_path(rect: Rect) -> Option<Path> {
    let r = tiny_skia::Rect::from_ltrb(rect.left(), rect.top(), rect.right(), rect.bottom())?;
    PathBuilder::from_oval(r)
}

pub fn circle_path(center: Pos2, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(center.x, center.y, radius)
}

pub fn rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width() * 0.5).min(rect.height() * 0.5).max(0.0);
    if r <= 0.0 {
        return rect_path(rect);
    }
    let (left, top, right, bottom) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.quad_to(right, top, right, top + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.quad_to(left, bottom, left, bottom - r);
    pb.line_to(left, top + r);
    pb.quad_to(left, top, left + r, top);
    pb.close();
    pb.finish()
}

pub fn polyline_path(points: &[Pos2], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    if rest.is_empty() {
        // A lone point still strokes as a round dot.
        pb.line_to(first.x + 0.01, first.y);
    }
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

pub fn segment_path(start: Pos2, end: Pos2) -> Option<Path> {
    polyline_path(&[start, end], false)
}

#[cfg(test)]
mod tests {
    use egui::{pos2, Rect};
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;

    #[test]
    fn surface_round_trips_opaque_pixels() {
        let fonts = Fonts::default();
        let image = RgbaImage::from_pixel(4, 3, Pixel([10, 20, 30, 255]));
        let surface = Surface::from_image(&image, &fonts).expect("surface");
        let back = surface.into_image().expect("image");
        assert_eq!(back, image);
    }

    #[test]
    fn fill_rect_paints_inside_only() {
        let fonts = Fonts::default();
        let image = RgbaImage::from_pixel(20, 20, Pixel([255, 255, 255, 255]));
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        let path = rect_path(Rect::from_min_max(pos2(5.0, 5.0), pos2(10.0, 10.0))).expect("path");
        surface.fill_path(&path, Rgba::BLACK);
        let out = surface.into_image().expect("image");
        assert_eq!(out.get_pixel(7, 7).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(15, 15).0, [255, 255, 255, 255]);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let fonts = Fonts::default();
        let image = RgbaImage::from_pixel(30, 30, Pixel([255, 255, 255, 255]));
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        surface.draw_text("hello", pos2(2.0, 20.0), 14.0, false, Rgba::BLACK);
        assert_eq!(surface.into_image().expect("image"), image);
    }

    #[test]
    fn encode_png_produces_signature() {
        let image = RgbaImage::from_pixel(2, 2, Pixel([1, 2, 3, 255]));
        let png = encode_png(&image).expect("png");
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(decode_image(&png).expect("decode"), image);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(EditorError::Decode(_))));
    }
}
