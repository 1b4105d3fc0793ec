use egui::Pos2;

use crate::annotation::AnnotationId;
use crate::document::Document;

/// Move, resize or spike drag of an existing annotation, bracketed by
/// `begin_edit`/`end_edit` so the whole gesture is one undo step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Manipulation {
    Move { id: AnnotationId, last: Pos2 },
    Resize { id: AnnotationId, handle: usize },
    Spike { id: AnnotationId },
}

impl Manipulation {
    /// Tries the selection's spike and resize handles first, then the body
    /// of the topmost annotation under `point`.
    pub fn begin(doc: &mut Document, point: Pos2) -> Option<Self> {
        let manipulation = Self::on_selection(doc, point).or_else(|| {
            let id = doc.hit_test(point)?;
            doc.select(Some(id));
            Some(Self::Move { id, last: point })
        })?;
        doc.begin_edit(manipulation.id());
        Some(manipulation)
    }

    fn on_selection(doc: &Document, point: Pos2) -> Option<Self> {
        let selected = doc.selected_annotation()?;
        let id = selected.id;
        if selected
            .as_text()
            .is_some_and(|note| note.hit_test_spike(&selected.style, point))
        {
            return Some(Self::Spike { id });
        }
        selected.handle_at(point).map(|handle| Self::Resize {
            id,
            handle: handle.index(),
        })
    }

    /// Spike drags on any note, used by the text tool.
    pub fn begin_spike(doc: &mut Document, point: Pos2) -> Option<Self> {
        let id = doc.annotations().iter().rev().find_map(|annotation| {
            let note = annotation.as_text()?;
            note.hit_test_spike(&annotation.style, point)
                .then_some(annotation.id)
        })?;
        doc.select(Some(id));
        doc.begin_edit(id);
        Some(Self::Spike { id })
    }

    pub fn id(&self) -> AnnotationId {
        match *self {
            Self::Move { id, .. } | Self::Resize { id, .. } | Self::Spike { id } => id,
        }
    }

    pub fn update(&mut self, doc: &mut Document, point: Pos2) {
        let Some(annotation) = doc.annotation_mut(self.id()) else {
            return;
        };
        match self {
            Self::Move { last, .. } => {
                annotation.move_by(point - *last);
                *last = point;
            }
            Self::Resize { handle, .. } => annotation.resize(*handle, point),
            Self::Spike { .. } => {
                let style = annotation.style.clone();
                if let Some(note) = annotation.as_text_mut() {
                    note.move_spike(&style, point);
                }
            }
        }
    }

    pub fn finish(self, doc: &mut Document) -> bool {
        doc.end_edit()
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, Rect};
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;
    use crate::annotation::{AnnotationKind, Geometry, RectShape, TextNote};
    use crate::style::Style;

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(200, 200, Pixel([255, 255, 255, 255]))).expect("document")
    }

    #[test]
    fn resize_through_selected_handle() {
        let mut doc = document();
        let rect = Rect::from_min_max(pos2(20.0, 20.0), pos2(80.0, 80.0));
        let annotation = doc.new_annotation(Style::default(), AnnotationKind::Rectangle(RectShape::new(rect)));
        doc.add(annotation);
        let mut gesture = Manipulation::begin(&mut doc, pos2(80.0, 80.0)).expect("handle");
        assert!(matches!(gesture, Manipulation::Resize { handle: 7, .. }));
        gesture.update(&mut doc, pos2(100.0, 120.0));
        assert!(gesture.finish(&mut doc));
        assert_eq!(
            doc.annotations()[0].geometry(),
            Geometry::Rect(Rect::from_min_max(pos2(20.0, 20.0), pos2(100.0, 120.0)))
        );
    }

    #[test]
    fn spike_drag_is_undoable() {
        let mut doc = document();
        let annotation = doc.new_annotation(
            Style::default(),
            AnnotationKind::Text(TextNote::new(pos2(40.0, 40.0), "note")),
        );
        let id = doc.add(annotation);
        let tip = doc
            .annotation(id)
            .and_then(|a| a.as_text().map(|note| note.spike_tip(&a.style)))
            .expect("tip");
        let mut gesture = Manipulation::begin_spike(&mut doc, tip).expect("spike");
        gesture.update(&mut doc, pos2(150.0, 150.0));
        assert!(gesture.finish(&mut doc));
        assert!(doc.undo());
        let restored = doc
            .annotation(id)
            .and_then(|a| a.as_text().map(|note| note.spike_tip(&a.style)));
        assert_eq!(restored, Some(tip));
    }

    #[test]
    fn press_on_nothing_starts_nothing() {
        let mut doc = document();
        assert!(Manipulation::begin(&mut doc, pos2(10.0, 10.0)).is_none());
        assert!(!doc.is_editing_geometry());
    }
}
