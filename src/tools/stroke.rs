use super::{PointerInput, Tool, ToolKind};
use crate::annotation::{Annotation, AnnotationKind, FreehandPath, HighlightPath};
use crate::document::Document;
use crate::style::Style;

const PREVIEW_ID: u64 = 0;

fn take_preview(doc: &mut Document) -> Option<Annotation> {
    let preview = doc.temp_mut().pop();
    doc.clear_temp();
    preview
}

fn commit(doc: &mut Document, preview: Annotation) {
    let annotation = doc.new_annotation(preview.style, preview.kind);
    doc.add(annotation);
}

/// Pen strokes that follow the pointer point by point.
pub struct FreehandTool {
    style: Style,
    drawing: bool,
}

impl Default for FreehandTool {
    fn default() -> Self {
        let mut style = Style::default();
        style.set_stroke_width(5.0);
        Self {
            style,
            drawing: false,
        }
    }
}

impl Tool for FreehandTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Freehand
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        let path = FreehandPath::new(vec![input.pos]);
        *doc.temp_mut() = vec![Annotation::new(
            PREVIEW_ID,
            self.style.clone(),
            AnnotationKind::Freehand(path),
        )];
        self.drawing = true;
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        if !self.drawing {
            return;
        }
        if let Some(AnnotationKind::Freehand(path)) =
            doc.temp_mut().last_mut().map(|preview| &mut preview.kind)
        {
            path.add_point(input.pos);
        }
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        if !std::mem::take(&mut self.drawing) {
            return;
        }
        Self::extend_to(doc, input);
        let Some(preview) = take_preview(doc) else {
            return;
        };
        if matches!(&preview.kind, AnnotationKind::Freehand(path) if path.points.len() > 2) {
            commit(doc, preview);
        } else {
            log::debug!("discarded freehand stroke");
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        self.drawing = false;
        doc.clear_temp();
    }
}

impl FreehandTool {
    /// Release position closes the stroke unless the last move already hit it.
    fn extend_to(doc: &mut Document, input: PointerInput) {
        if let Some(AnnotationKind::Freehand(path)) =
            doc.temp_mut().last_mut().map(|preview| &mut preview.kind)
        {
            if path.points.last() != Some(&input.pos) {
                path.add_point(input.pos);
            }
        }
    }
}

/// Translucent marker that snaps to an axis when dragged nearly straight.
pub struct HighlighterTool {
    style: Style,
    drawing: bool,
}

impl Default for HighlighterTool {
    fn default() -> Self {
        let mut style = HighlightPath::default_style();
        style.set_stroke_width(25.0);
        Self {
            style,
            drawing: false,
        }
    }
}

impl Tool for HighlighterTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Highlighter
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        *doc.temp_mut() = vec![Annotation::new(
            PREVIEW_ID,
            self.style.clone(),
            AnnotationKind::Highlight(HighlightPath::new(input.pos)),
        )];
        self.drawing = true;
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        if !self.drawing {
            return;
        }
        if let Some(AnnotationKind::Highlight(path)) =
            doc.temp_mut().last_mut().map(|preview| &mut preview.kind)
        {
            path.add_point(input.pos);
        }
    }

    fn on_release(&mut self, doc: &mut Document, _input: PointerInput) {
        if !std::mem::take(&mut self.drawing) {
            return;
        }
        let Some(preview) = take_preview(doc) else {
            return;
        };
        if matches!(&preview.kind, AnnotationKind::Highlight(path) if path.points.len() >= 2) {
            commit(doc, preview);
        } else {
            log::debug!("discarded highlight stroke");
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        self.drawing = false;
        doc.clear_temp();
    }
}
