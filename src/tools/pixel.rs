use egui::{Pos2, Rect};

use super::{PointerInput, Tool, ToolKind};
use crate::annotation::{Annotation, AnnotationKind, InpaintRegion, RectShape};
use crate::document::Document;
use crate::geometry::{clamp_rect, normalized};
use crate::imaging::{InpaintAlgorithm, PixelRect};
use crate::style::{Rgba, Style};

const PREVIEW_ID: u64 = 0;

fn drag_rect(start: Option<Pos2>, to: Pos2, bounds: Rect) -> Option<Rect> {
    clamp_rect(normalized(start?, to), bounds)
}

/// Paints a solid rectangle straight into the base image.
pub struct EraserTool {
    style: Style,
    color: Rgba,
    start: Option<Pos2>,
}

impl EraserTool {
    const MIN_SIZE: f32 = 5.0;

    pub fn new(color: Rgba) -> Self {
        Self {
            style: Style::default(),
            color,
            start: None,
        }
    }

    fn preview(rect: Rect) -> Annotation {
        let style = Style {
            stroke_color: Rgba::rgba(255, 100, 100, 200),
            stroke_width: 1.0,
            fill_color: Some(Rgba::WHITE.with_alpha(100)),
            ..Style::default()
        };
        Annotation::new(PREVIEW_ID, style, AnnotationKind::Rectangle(RectShape::new(rect)))
    }
}

impl Tool for EraserTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eraser
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        self.start = Some(input.pos);
        *doc.temp_mut() = vec![Self::preview(Rect::from_min_max(input.pos, input.pos))];
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        if let Some(rect) = drag_rect(self.start, input.pos, doc.bounds()) {
            *doc.temp_mut() = vec![Self::preview(rect)];
        }
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        let rect = drag_rect(self.start.take(), input.pos, doc.bounds());
        doc.clear_temp();
        match rect {
            Some(rect) if rect.width() > Self::MIN_SIZE && rect.height() > Self::MIN_SIZE => {
                doc.fill_region(rect, self.color);
            }
            _ => log::debug!("eraser gesture too small"),
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        self.start = None;
        doc.clear_temp();
    }

    fn fill_color_mut(&mut self) -> Option<&mut Rgba> {
        Some(&mut self.color)
    }
}

/// Reconstructs a dragged region from its surroundings and bakes the result.
pub struct HealTool {
    style: Style,
    pub algorithm: InpaintAlgorithm,
    pub radius: u32,
    start: Option<Pos2>,
}

impl Default for HealTool {
    fn default() -> Self {
        Self {
            style: Style::default(),
            algorithm: InpaintAlgorithm::Telea,
            radius: 5,
            start: None,
        }
    }
}

impl HealTool {
    const MIN_SIZE: f32 = 3.0;

    fn region(&self, rect: Rect) -> InpaintRegion {
        InpaintRegion::new(rect, self.algorithm, self.radius)
    }
}

impl Tool for HealTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Heal
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        self.start = Some(input.pos);
        doc.clear_temp();
    }

    /// The preview is only rebuilt when the drag covers different pixels, so
    /// its cached reconstruction survives sub-pixel pointer jitter.
    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        let Some(rect) = drag_rect(self.start, input.pos, doc.bounds()) else {
            return;
        };
        let (width, height) = doc.image().dimensions();
        let pixels = PixelRect::clamped(rect, width, height);
        let unchanged = doc.temp().first().is_some_and(|preview| match &preview.kind {
            AnnotationKind::Inpaint(region) => {
                PixelRect::clamped(region.rect, width, height) == pixels
            }
            _ => false,
        });
        if unchanged {
            return;
        }
        let preview = Annotation::new(
            PREVIEW_ID,
            self.style.clone(),
            AnnotationKind::Inpaint(self.region(rect)),
        );
        *doc.temp_mut() = vec![preview];
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        let rect = drag_rect(self.start.take(), input.pos, doc.bounds());
        doc.clear_temp();
        match rect {
            Some(rect) if rect.width() > Self::MIN_SIZE && rect.height() > Self::MIN_SIZE => {
                doc.apply_inpaint(&self.region(rect));
            }
            _ => log::debug!("heal gesture too small"),
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        self.start = None;
        doc.clear_temp();
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;
    use crate::render::Fonts;

    #[test]
    fn heal_replaces_marked_pixels_and_undoes() {
        let mut image = RgbaImage::from_pixel(60, 60, Pixel([40, 120, 200, 255]));
        for y in 25..35 {
            for x in 25..35 {
                image.put_pixel(x, y, Pixel([255, 0, 0, 255]));
            }
        }
        let mut doc = Document::new(image).expect("document");
        let mut tool = HealTool::default();
        tool.on_press(&mut doc, PointerInput::at(pos2(22.0, 22.0)));
        tool.on_move(&mut doc, PointerInput::at(pos2(38.0, 38.0)));
        assert_eq!(doc.temp().len(), 1);
        tool.on_release(&mut doc, PointerInput::at(pos2(38.0, 38.0)));
        assert!(doc.temp().is_empty());
        assert_ne!(doc.sample_color_at(pos2(30.0, 30.0)), Some(Rgba::rgb(255, 0, 0)));
        assert!(doc.undo());
        assert_eq!(doc.sample_color_at(pos2(30.0, 30.0)), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn heal_preview_keeps_its_cache_for_the_same_pixels() {
        let image = RgbaImage::from_pixel(60, 60, Pixel([40, 120, 200, 255]));
        let mut doc = Document::new(image).expect("document");
        let mut tool = HealTool::default();
        tool.on_press(&mut doc, PointerInput::at(pos2(20.0, 20.0)));
        tool.on_move(&mut doc, PointerInput::at(pos2(30.2, 30.2)));
        doc.render(&Fonts::default(), true, false).expect("render");
        let cached = |doc: &Document| match &doc.temp()[0].kind {
            AnnotationKind::Inpaint(region) => region.cache().is_filled(),
            other => panic!("unexpected preview {other:?}"),
        };
        assert!(cached(&doc));

        tool.on_move(&mut doc, PointerInput::at(pos2(30.7, 30.6)));
        assert!(cached(&doc));
        tool.on_move(&mut doc, PointerInput::at(pos2(34.0, 30.6)));
        assert!(!cached(&doc));
    }

    #[test]
    fn eraser_clamps_to_image() {
        let mut doc =
            Document::new(RgbaImage::from_pixel(50, 50, Pixel([255, 255, 255, 255]))).expect("document");
        let mut tool = EraserTool::new(Rgba::BLACK);
        tool.on_press(&mut doc, PointerInput::at(pos2(30.0, 30.0)));
        tool.on_release(&mut doc, PointerInput::at(pos2(80.0, 80.0)));
        assert_eq!(doc.sample_color_at(pos2(49.0, 49.0)), Some(Rgba::BLACK));
        assert_eq!(doc.image().dimensions(), (50, 50));
    }

    #[test]
    fn eraser_fill_color_is_adjustable() {
        let mut doc =
            Document::new(RgbaImage::from_pixel(50, 50, Pixel([255, 255, 255, 255]))).expect("document");
        let mut tool = EraserTool::new(Rgba::WHITE);
        *tool.fill_color_mut().expect("fill") = Rgba::rgb(10, 200, 90);
        tool.on_press(&mut doc, PointerInput::at(pos2(5.0, 5.0)));
        tool.on_release(&mut doc, PointerInput::at(pos2(25.0, 25.0)));
        assert_eq!(doc.sample_color_at(pos2(15.0, 15.0)), Some(Rgba::rgb(10, 200, 90)));
        assert_eq!(HealTool::default().fill_color_mut(), None);
    }
}
