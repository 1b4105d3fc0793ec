mod effects;
mod path;
mod shapes;
mod step;
mod text;

use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;

use crate::geometry::Handle;
use crate::render::Surface;
use crate::style::Style;

pub use effects::{BlurRegion, InpaintRegion, PixelCache, Spotlight};
pub use path::{AxisLock, FreehandPath, HighlightPath};
pub use shapes::{ArrowShape, EllipseShape, RectShape, RulerShape};
pub use step::StepBadge;
pub use text::{measure_text, TextBlock, TextNote};

pub type AnnotationId = u64;

/// Per-variant geometry, style-aware hit-testing and painting.
pub trait Shape {
    fn bounds(&self, style: &Style) -> Rect;
    fn hit_test(&self, style: &Style, point: Pos2) -> bool;
    /// Handles this variant exposes, tagged with the slot they drive.
    fn handles(&self, style: &Style) -> Vec<(Handle, Rect)>;
    fn move_by(&mut self, delta: Vec2);
    fn resize(&mut self, handle: Handle, to: Pos2);
    fn geometry(&self) -> Geometry;
    /// Returns false when `geometry` belongs to another variant.
    fn set_geometry(&mut self, geometry: &Geometry) -> bool;
    fn paint(&self, style: &Style, selected: bool, surface: &mut Surface<'_>);
}

/// Value snapshot of everything move/resize/edit can change.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Rect(Rect),
    Segment { start: Pos2, end: Pos2 },
    Path { points: Vec<Pos2>, axis_lock: AxisLock },
    Text {
        position: Pos2,
        spike_offset: Vec2,
        text: String,
    },
    Point(Pos2),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Rectangle,
    Ellipse,
    Arrow,
    Text,
    Freehand,
    Highlight,
    Spotlight,
    Blur,
    Step,
    Ruler,
    Inpaint,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationKind {
    Rectangle(RectShape),
    Ellipse(EllipseShape),
    Arrow(ArrowShape),
    Text(TextNote),
    Freehand(FreehandPath),
    Highlight(HighlightPath),
    Spotlight(Spotlight),
    Blur(BlurRegion),
    Step(StepBadge),
    Ruler(RulerShape),
    Inpaint(InpaintRegion),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub style: Style,
    pub selected: bool,
    pub z: i64,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(id: AnnotationId, style: Style, kind: AnnotationKind) -> Self {
        Self {
            id,
            style,
            selected: false,
            z: 0,
            kind,
        }
    }

    pub fn annotation_type(&self) -> AnnotationType {
        match &self.kind {
            AnnotationKind::Rectangle(_) => AnnotationType::Rectangle,
            AnnotationKind::Ellipse(_) => AnnotationType::Ellipse,
            AnnotationKind::Arrow(_) => AnnotationType::Arrow,
            AnnotationKind::Text(_) => AnnotationType::Text,
            AnnotationKind::Freehand(_) => AnnotationType::Freehand,
            AnnotationKind::Highlight(_) => AnnotationType::Highlight,
            AnnotationKind::Spotlight(_) => AnnotationType::Spotlight,
            AnnotationKind::Blur(_) => AnnotationType::Blur,
            AnnotationKind::Step(_) => AnnotationType::Step,
            AnnotationKind::Ruler(_) => AnnotationType::Ruler,
            AnnotationKind::Inpaint(_) => AnnotationType::Inpaint,
        }
    }

    fn shape(&self) -> &dyn Shape {
        match &self.kind {
            AnnotationKind::Rectangle(s) => s,
            AnnotationKind::Ellipse(s) => s,
            AnnotationKind::Arrow(s) => s,
            AnnotationKind::Text(s) => s,
            AnnotationKind::Freehand(s) => s,
            AnnotationKind::Highlight(s) => s,
            AnnotationKind::Spotlight(s) => s,
            AnnotationKind::Blur(s) => s,
            AnnotationKind::Step(s) => s,
            AnnotationKind::Ruler(s) => s,
            AnnotationKind::Inpaint(s) => s,
        }
    }

    fn shape_mut(&mut self) -> &mut dyn Shape {
        match &mut self.kind {
            AnnotationKind::Rectangle(s) => s,
            AnnotationKind::Ellipse(s) => s,
            AnnotationKind::Arrow(s) => s,
            AnnotationKind::Text(s) => s,
            AnnotationKind::Freehand(s) => s,
            AnnotationKind::Highlight(s) => s,
            AnnotationKind::Spotlight(s) => s,
            AnnotationKind::Blur(s) => s,
            AnnotationKind::Step(s) => s,
            AnnotationKind::Ruler(s) => s,
            AnnotationKind::Inpaint(s) => s,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.shape().bounds(&self.style)
    }

    pub fn hit_test(&self, point: Pos2) -> bool {
        self.shape().hit_test(&self.style, point)
    }

    pub fn resize_handles(&self) -> Vec<Rect> {
        self.shape()
            .handles(&self.style)
            .into_iter()
            .map(|(_, rect)| rect)
            .collect()
    }

    /// The handle slot whose rect contains `point`, if any.
    pub fn handle_at(&self, point: Pos2) -> Option<Handle> {
        self.shape()
            .handles(&self.style)
            .into_iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(handle, _)| handle)
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.shape_mut().move_by(delta);
    }

    /// Moves the geometry owned by handle `index` (0..7). Other indices are ignored.
    pub fn resize(&mut self, index: usize, to: Pos2) {
        if let Some(handle) = Handle::from_index(index) {
            self.shape_mut().resize(handle, to);
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.shape().geometry()
    }

    pub fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        self.shape_mut().set_geometry(geometry)
    }

    pub fn paint(&self, surface: &mut Surface<'_>) {
        self.paint_as(self.selected, surface);
    }

    /// Paints with an explicit selection state; exports pass `false`.
    pub fn paint_as(&self, selected: bool, surface: &mut Surface<'_>) {
        self.shape().paint(&self.style, selected, surface);
    }

    /// Pixel effects drawn from the base image before any vector layer.
    pub fn paint_effect(&self, source: &RgbaImage, generation: u64, surface: &mut Surface<'_>) {
        match &self.kind {
            AnnotationKind::Blur(blur) => blur.paint_effect(source, generation, surface),
            AnnotationKind::Inpaint(region) => region.paint_effect(source, generation, surface),
            _ => {}
        }
    }

    pub fn has_pixel_effect(&self) -> bool {
        matches!(
            self.kind,
            AnnotationKind::Blur(_) | AnnotationKind::Inpaint(_)
        )
    }

    pub fn is_spotlight(&self) -> bool {
        matches!(self.kind, AnnotationKind::Spotlight(_))
    }

    pub fn as_spotlight(&self) -> Option<&Spotlight> {
        match &self.kind {
            AnnotationKind::Spotlight(spot) => Some(spot),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNote> {
        match &self.kind {
            AnnotationKind::Text(note) => Some(note),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNote> {
        match &mut self.kind {
            AnnotationKind::Text(note) => Some(note),
            _ => None,
        }
    }

    pub fn step_number(&self) -> Option<u32> {
        match &self.kind {
            AnnotationKind::Step(step) => Some(step.number),
            _ => None,
        }
    }
}
