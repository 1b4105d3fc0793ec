use egui::{Key, Modifiers, Pos2};

use super::{Manipulation, PointerInput, Tool, ToolKind};
use crate::annotation::{AnnotationType, TextNote};
use crate::document::Document;
use crate::style::Style;

/// Places speech-bubble notes and edits their text inline.
pub struct TextTool {
    style: Style,
    template: TextNote,
    spike: Option<Manipulation>,
}

impl Default for TextTool {
    fn default() -> Self {
        Self {
            style: Style::default(),
            template: TextNote::new(Pos2::ZERO, ""),
            spike: None,
        }
    }
}

impl TextTool {
    fn spike_under(doc: &Document, point: Pos2) -> bool {
        doc.annotations().iter().any(|annotation| {
            annotation
                .as_text()
                .is_some_and(|note| note.hit_test_spike(&annotation.style, point))
        })
    }

    fn text_under(doc: &Document, point: Pos2) -> Option<u64> {
        let id = doc.hit_test(point)?;
        (doc.annotation(id)?.annotation_type() == AnnotationType::Text).then_some(id)
    }
}

impl Tool for TextTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Text
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        if Self::spike_under(doc, input.pos) {
            doc.finish_text_edit();
            self.spike = Manipulation::begin_spike(doc, input.pos);
            if self.spike.is_some() {
                return;
            }
        }
        if let Some(id) = Self::text_under(doc, input.pos) {
            doc.begin_text_edit(id, false);
            return;
        }
        if doc.text_edit().is_some() {
            doc.finish_text_edit();
            return;
        }
        doc.start_new_text(input.pos, self.style.clone(), self.template.clone());
    }

    fn on_move(&mut self, doc: &mut Document, input: PointerInput) {
        if let Some(spike) = self.spike.as_mut() {
            spike.update(doc, input.pos);
        }
    }

    fn on_release(&mut self, doc: &mut Document, input: PointerInput) {
        if let Some(mut spike) = self.spike.take() {
            spike.update(doc, input.pos);
            spike.finish(doc);
        }
    }

    fn on_key(&mut self, doc: &mut Document, key: Key, modifiers: Modifiers) -> bool {
        if doc.text_edit().is_none() {
            return false;
        }
        match key {
            Key::Enter if modifiers.shift => {
                if let Some(note) = doc.editing_text_mut() {
                    note.push_char('\n');
                }
                true
            }
            Key::Enter | Key::Escape => doc.finish_text_edit(),
            Key::Backspace | Key::Delete => {
                if let Some(note) = doc.editing_text_mut() {
                    note.pop_char();
                }
                true
            }
            _ => false,
        }
    }

    fn on_text(&mut self, doc: &mut Document, text: &str) -> bool {
        let Some(note) = doc.editing_text_mut() else {
            return false;
        };
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            note.push_char(ch);
        }
        true
    }

    /// Bubble settings copied into every new note.
    fn text_template_mut(&mut self) -> Option<&mut TextNote> {
        Some(&mut self.template)
    }

    fn deactivate(&mut self, doc: &mut Document) {
        if let Some(spike) = self.spike.take() {
            spike.finish(doc);
        }
        doc.finish_text_edit();
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;
    use image::{Rgba as Pixel, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::EditorEvent;

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(400, 300, Pixel([255, 255, 255, 255]))).expect("document")
    }

    fn type_note(tool: &mut TextTool, doc: &mut Document, at: Pos2, text: &str) {
        tool.on_press(doc, PointerInput::at(at));
        tool.on_release(doc, PointerInput::at(at));
        assert!(tool.on_text(doc, text));
    }

    #[test]
    fn typing_then_enter_commits_single_undo_step() {
        let mut doc = document();
        let mut tool = TextTool::default();
        type_note(&mut tool, &mut doc, pos2(50.0, 60.0), "Hi");
        assert!(tool.on_key(&mut doc, Key::Enter, Modifiers::NONE));
        assert_eq!(doc.text_edit(), None);
        assert_eq!(doc.annotations()[0].as_text().map(|n| n.text.as_str()), Some("Hi"));
        assert!(doc.drain_events().contains(&EditorEvent::TextEditFinished));
        assert!(doc.undo());
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn shift_enter_inserts_newline_and_backspace_deletes() {
        let mut doc = document();
        let mut tool = TextTool::default();
        type_note(&mut tool, &mut doc, pos2(50.0, 60.0), "ab");
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };
        tool.on_key(&mut doc, Key::Enter, shift);
        tool.on_text(&mut doc, "c\u{7f}");
        tool.on_key(&mut doc, Key::Backspace, Modifiers::NONE);
        tool.on_text(&mut doc, "d");
        assert_eq!(doc.editing_text().map(|n| n.text.as_str()), Some("ab\nd"));
    }

    #[test]
    fn clicking_away_finishes_without_new_note() {
        let mut doc = document();
        let mut tool = TextTool::default();
        type_note(&mut tool, &mut doc, pos2(50.0, 60.0), "note");
        tool.on_press(&mut doc, PointerInput::at(pos2(300.0, 250.0)));
        assert_eq!(doc.text_edit(), None);
        assert_eq!(doc.annotations().len(), 1);
    }

    #[test]
    fn empty_note_is_dropped_on_deactivate() {
        let mut doc = document();
        let mut tool = TextTool::default();
        tool.on_press(&mut doc, PointerInput::at(pos2(50.0, 60.0)));
        assert_eq!(doc.annotations().len(), 1);
        tool.deactivate(&mut doc);
        assert!(doc.annotations().is_empty());
        assert!(!doc.can_undo());
    }

    #[test]
    fn template_settings_apply_to_new_notes() {
        let mut doc = document();
        let mut tool = TextTool::default();
        if let Some(template) = tool.text_template_mut() {
            template.show_bubble = false;
        }
        type_note(&mut tool, &mut doc, pos2(50.0, 60.0), "plain");
        assert_eq!(doc.editing_text().map(|n| n.show_bubble), Some(false));
    }
}
