use egui::{Pos2, Rect};

use super::{BlurOptions, Manipulation, PointerInput, Tool, ToolKind};
use crate::annotation::{
    Annotation, AnnotationKind, ArrowShape, BlurRegion, EllipseShape, RectShape, RulerShape,
    Spotlight,
};
use crate::document::Document;
use crate::geometry::{constrain_square, normalized, snap_angle_45};
use crate::style::Style;

/// Temp annotations are never committed with this id.
const PREVIEW_ID: u64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Arrow,
    Ruler,
    Spotlight,
    Blur,
}

impl ShapeKind {
    /// Box and line shapes can grab existing annotations instead of drawing.
    fn manipulates_existing(self) -> bool {
        matches!(self, Self::Rectangle | Self::Ellipse | Self::Arrow | Self::Ruler)
    }

    fn default_style(self) -> Style {
        let mut style = Style::default();
        if matches!(self, Self::Rectangle | Self::Ellipse | Self::Arrow) {
            style.set_stroke_width(5.0);
        }
        style
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Draw { start: Pos2 },
    Manipulate(Manipulation),
}

/// Press-drag-release tool for the box and line annotations.
pub struct ShapeTool {
    shape: ShapeKind,
    style: Style,
    blur: BlurOptions,
    gesture: Option<Gesture>,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            style: shape.default_style(),
            blur: BlurOptions::default(),
            gesture: None,
        }
    }

    fn build(&self, start: Pos2, current: Pos2, shift: bool) -> AnnotationKind {
        match self.shape {
            ShapeKind::Rectangle | ShapeKind::Ellipse => {
                let end = if shift {
                    constrain_square(start, current)
                } else {
                    current
                };
                let rect = normalized(start, end);
                if self.shape == ShapeKind::Rectangle {
                    AnnotationKind::Rectangle(RectShape::new(rect))
                } else {
                    AnnotationKind::Ellipse(EllipseShape::new(rect))
                }
            }
            ShapeKind::Arrow | ShapeKind::Ruler => {
                let end = if shift {
                    snap_angle_45(start, current)
                } else {
                    current
                };
                if self.shape == ShapeKind::Arrow {
                    AnnotationKind::Arrow(ArrowShape::new(start, end))
                } else {
                    AnnotationKind::Ruler(RulerShape::new(start, end))
                }
            }
            ShapeKind::Spotlight => {
                AnnotationKind::Spotlight(Spotlight::new(normalized(start, current), shift))
            }
            ShapeKind::Blur => AnnotationKind::Blur(BlurRegion::new(
                normalized(start, current),
                self.blur.mode,
                self.blur.intensity,
            )),
        }
    }

    fn large_enough(kind: &AnnotationKind) -> bool {
        let boxed = |rect: Rect, min: f32| rect.width() > min && rect.height() > min;
        match kind {
            AnnotationKind::Rectangle(shape) => boxed(shape.rect, 3.0),
            AnnotationKind::Ellipse(shape) => boxed(shape.rect, 3.0),
            AnnotationKind::Arrow(arrow) => arrow.length() > 10.0,
            AnnotationKind::Ruler(ruler) => ruler.length() > 10.0,
            AnnotationKind::Spotlight(spot) => boxed(spot.rect, 10.0),
            AnnotationKind::Blur(region) => boxed(region.rect, 10.0),
            _ => false,
        }
    }

    fn preview(&self, kind: AnnotationKind) -> Annotation {
        Annotation::new(PREVIEW_ID, self.style.clone(), kind)
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Ellipse => ToolKind::Ellipse,
            ShapeKind::Arrow => ToolKind::Arrow,
            ShapeKind::Ruler => ToolKind::Ruler,
            ShapeKind::Spotlight => ToolKind::Spotlight,
            ShapeKind::Blur => ToolKind::Blur,
        }
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        if self.shape.manipulates_existing() {
            if let Some(manipulation) = Manipulation::begin(doc, input.pos) {
                self.gesture = Some(Gesture::Manipulate(manipulation));
                return;
            }
        }
        let preview = self.preview(self.build(input.pos, input.pos, input.shift()));
        *doc.temp_mut() = vec![preview];
        self.gesture = Some(Gesture::Draw { start: input.pos });
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        match self.gesture.as_mut() {
            Some(Gesture::Manipulate(manipulation)) => manipulation.update(doc, input.pos),
            Some(Gesture::Draw { start }) => {
                let start = *start;
                let preview = self.preview(self.build(start, input.pos, input.shift()));
                *doc.temp_mut() = vec![preview];
            }
            None => {}
        }
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        match self.gesture.take() {
            Some(Gesture::Manipulate(manipulation)) => {
                manipulation.finish(doc);
            }
            Some(Gesture::Draw { start }) => {
                doc.clear_temp();
                let kind = self.build(start, input.pos, input.shift());
                if !Self::large_enough(&kind) {
                    log::debug!("discarded {:?} below minimum size", self.shape);
                    return;
                }
                let annotation = doc.new_annotation(self.style.clone(), kind);
                doc.add(annotation);
            }
            None => {}
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        if let Some(Gesture::Manipulate(manipulation)) = self.gesture.take() {
            manipulation.finish(doc);
        }
        doc.clear_temp();
    }

    fn blur_options_mut(&mut self) -> Option<&mut BlurOptions> {
        (self.shape == ShapeKind::Blur).then_some(&mut self.blur)
    }
}
