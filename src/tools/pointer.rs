use egui::{Key, Modifiers, Pos2};

use super::{Manipulation, PointerInput, Tool, ToolKind};
use crate::document::Document;
use crate::geometry::{clamp_rect, normalized};
use crate::style::Style;

const MIN_CROP: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Manipulate(Manipulation),
    Crop { start: Pos2 },
}

/// Selects, moves and resizes annotations; dragging empty canvas marks a crop.
#[derive(Default)]
pub struct PointerTool {
    style: Style,
    gesture: Option<Gesture>,
}

impl Tool for PointerTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pointer
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        if let Some(manipulation) = Manipulation::begin(doc, input.pos) {
            doc.set_pending_crop(None);
            self.gesture = Some(Gesture::Manipulate(manipulation));
            return;
        }
        doc.select(None);
        doc.set_pending_crop(None);
        self.gesture = Some(Gesture::Crop { start: input.pos });
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        match self.gesture.as_mut() {
            Some(Gesture::Manipulate(manipulation)) => manipulation.update(doc, input.pos),
            Some(Gesture::Crop { start }) => {
                doc.set_pending_crop(clamp_rect(normalized(*start, input.pos), doc.bounds()));
            }
            None => {}
        }
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        match self.gesture.take() {
            Some(Gesture::Manipulate(manipulation)) => {
                manipulation.finish(doc);
            }
            Some(Gesture::Crop { start }) => {
                let rect = clamp_rect(normalized(start, input.pos), doc.bounds())
                    .filter(|rect| rect.width() > MIN_CROP && rect.height() > MIN_CROP);
                doc.set_pending_crop(rect);
            }
            None => {}
        }
    }

    fn on_key(&mut self, doc: &mut Document, key: Key, _modifiers: Modifiers) -> bool {
        match key {
            Key::Enter => doc.apply_pending_crop(),
            Key::Escape if doc.pending_crop().is_some() => {
                doc.set_pending_crop(None);
                true
            }
            Key::Delete | Key::Backspace => doc.delete_selected(),
            _ => false,
        }
    }

    fn deactivate(&mut self, doc: &mut Document) {
        if let Some(Gesture::Manipulate(manipulation)) = self.gesture.take() {
            manipulation.finish(doc);
        }
        doc.set_pending_crop(None);
    }
}
