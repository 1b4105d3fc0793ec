use super::{PointerInput, Tool, ToolKind};
use crate::annotation::{AnnotationKind, StepBadge};
use crate::document::{Document, EditorEvent};
use crate::style::{Rgba, Style};

/// Drops numbered badges; numbering continues from the highest badge present.
pub struct StepTool {
    style: Style,
}

impl Default for StepTool {
    fn default() -> Self {
        Self {
            style: Style {
                stroke_color: Rgba::rgb(211, 78, 78),
                ..Style::default()
            },
        }
    }
}

impl Tool for StepTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Step
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        let badge = StepBadge::new(input.pos, doc.next_step_number(), self.style.stroke_color);
        let annotation = doc.new_annotation(self.style.clone(), AnnotationKind::Step(badge));
        doc.add(annotation);
    }

    fn on_move(&mut self, _doc: &mut Document, _input: PointerInput) {}

    fn on_release(&mut self, _doc: &mut Document, _input: PointerInput) {}

    fn deactivate(&mut self, _doc: &mut Document) {}
}

/// Picks the base image colour under the pointer.
#[derive(Default)]
pub struct EyedropperTool {
    style: Style,
}

impl Tool for EyedropperTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eyedropper
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    fn on_press(&mut self, doc: &mut Document, input: PointerInput) {
        match doc.sample_color_at(input.pos) {
            Some(color) => {
                log::debug!("sampled {color:?} at {:?}", input.pos);
                doc.emit(EditorEvent::ColorSampled(color));
            }
            None => log::debug!("eyedropper outside image at {:?}", input.pos),
        }
    }

    fn on_move(&mut self, _doc: &mut Document, _input: PointerInput) {}

    fn on_release(&mut self, _doc: &mut Document, _input: PointerInput) {}

    fn deactivate(&mut self, _doc: &mut Document) {}
}

#[cfg(test)]
mod tests {
    use egui::pos2;
    use image::{Rgba as Pixel, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(200, 200, Pixel([255, 255, 255, 255]))).expect("document")
    }

    #[test]
    fn steps_number_sequentially_and_reuse_after_undo() {
        let mut doc = document();
        let mut tool = StepTool::default();
        for x in [20.0, 60.0, 100.0] {
            tool.on_press(&mut doc, PointerInput::at(pos2(x, 40.0)));
        }
        let numbers: Vec<_> = doc.annotations().iter().filter_map(|a| a.step_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(doc.undo());
        tool.on_press(&mut doc, PointerInput::at(pos2(140.0, 40.0)));
        assert_eq!(doc.annotations().last().and_then(|a| a.step_number()), Some(3));
    }

    #[test]
    fn eyedropper_outside_image_emits_nothing() {
        let mut doc = document();
        doc.drain_events();
        EyedropperTool::default().on_press(&mut doc, PointerInput::at(pos2(-4.0, 10.0)));
        assert!(doc.drain_events().is_empty());
    }
}
