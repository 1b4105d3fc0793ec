use std::sync::Arc;

use image::RgbaImage;

use crate::annotation::{Annotation, AnnotationId, Geometry};
use crate::document::Document;

/// A reversible edit of the document.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Add {
        annotation: Annotation,
    },
    Delete {
        annotation: Annotation,
        index: Option<usize>,
    },
    MoveResize {
        id: AnnotationId,
        before: Geometry,
        after: Geometry,
    },
    Crop {
        before: Arc<RgbaImage>,
        after: Arc<RgbaImage>,
        annotations: Vec<Annotation>,
    },
    PixelBake {
        before: Arc<RgbaImage>,
        after: Arc<RgbaImage>,
    },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::MoveResize { .. } => "move/resize",
            Self::Crop { .. } => "crop",
            Self::PixelBake { .. } => "pixel bake",
        }
    }

    /// Missing annotations turn the command into a no-op.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Self::Add { annotation } => {
                doc.insert_raw(annotation.clone(), None);
                doc.select(Some(annotation.id));
            }
            Self::Delete { annotation, .. } => {
                doc.remove_raw(annotation.id);
            }
            Self::MoveResize { id, after, .. } => {
                doc.set_geometry_raw(*id, after);
            }
            Self::Crop { after, .. } => {
                doc.replace_image_raw(Arc::clone(after), Some(Vec::new()), true);
            }
            Self::PixelBake { after, .. } => {
                doc.replace_image_raw(Arc::clone(after), None, false);
            }
        }
    }

    pub fn invert(&self, doc: &mut Document) {
        match self {
            Self::Add { annotation } => {
                doc.remove_raw(annotation.id);
            }
            Self::Delete { annotation, index } => {
                doc.insert_raw(annotation.clone(), *index);
            }
            Self::MoveResize { id, before, .. } => {
                doc.set_geometry_raw(*id, before);
            }
            Self::Crop {
                before,
                annotations,
                ..
            } => {
                doc.replace_image_raw(Arc::clone(before), Some(annotations.clone()), true);
            }
            Self::PixelBake { before, .. } => {
                doc.replace_image_raw(Arc::clone(before), None, false);
            }
        }
    }
}

/// Linear undo stack; commands past `cursor` are redoable until the next push.
#[derive(Clone, Debug, Default)]
pub struct CommandHistory {
    stack: Vec<Command>,
    cursor: usize,
}

impl CommandHistory {
    pub fn push(&mut self, command: Command) {
        self.stack.truncate(self.cursor);
        self.stack.push(command);
        self.cursor = self.stack.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.stack.len()
    }

    /// The command to invert, moving the cursor back.
    pub fn step_back(&mut self) -> Option<&Command> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.stack.get(self.cursor)
    }

    /// The command to re-apply, moving the cursor forward.
    pub fn step_forward(&mut self) -> Option<&Command> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.stack.get(self.cursor - 1)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, Rect};
    use image::{Rgba as Pixel, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotation::{AnnotationKind, RectShape};
    use crate::style::{Rgba, Style};

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(64, 48, Pixel([30, 60, 90, 255]))).expect("document")
    }

    fn rect(doc: &mut Document, x: f32) -> Annotation {
        let shape = RectShape::new(Rect::from_min_max(pos2(x, 5.0), pos2(x + 10.0, 15.0)));
        doc.new_annotation(Style::default(), AnnotationKind::Rectangle(shape))
    }

    #[test]
    fn push_after_undo_discards_redo_tail() {
        let mut history = CommandHistory::default();
        let mut doc = document();
        history.push(Command::Add {
            annotation: rect(&mut doc, 1.0),
        });
        history.push(Command::Add {
            annotation: rect(&mut doc, 2.0),
        });
        assert!(history.step_back().is_some());
        assert!(history.can_redo());
        history.push(Command::Add {
            annotation: rect(&mut doc, 3.0),
        });
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn every_command_inverts_to_identical_state() {
        let mut doc = document();
        let first = rect(&mut doc, 1.0);
        doc.add(first.clone());
        let second = rect(&mut doc, 20.0);
        doc.add(second.clone());

        let annotations_before = doc.annotations().to_vec();
        let image_before = doc.image().clone();
        let after_image = Arc::new(RgbaImage::from_pixel(64, 48, Pixel([1, 2, 3, 255])));
        let commands = vec![
            Command::Add {
                annotation: rect(&mut doc, 40.0),
            },
            Command::Delete {
                annotation: second.clone(),
                index: Some(1),
            },
            Command::MoveResize {
                id: first.id,
                before: first.geometry(),
                after: Geometry::Rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(3.0, 3.0))),
            },
            Command::Crop {
                before: Arc::new(image_before.clone()),
                after: Arc::new(RgbaImage::from_pixel(8, 8, Pixel([0, 0, 0, 255]))),
                annotations: annotations_before.clone(),
            },
            Command::PixelBake {
                before: Arc::new(image_before.clone()),
                after: Arc::clone(&after_image),
            },
        ];

        for command in commands {
            // selection is presentation state, compare without it
            doc.select(None);
            let snapshot = doc.annotations().to_vec();
            command.apply(&mut doc);
            command.invert(&mut doc);
            doc.select(None);
            assert_eq!(doc.annotations(), snapshot.as_slice(), "{}", command.label());
            assert_eq!(doc.image(), &image_before, "{}", command.label());
        }
        assert_eq!(doc.sample_color_at(pos2(2.0, 2.0)), Some(Rgba::rgb(30, 60, 90)));
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let mut doc = document();
        let command = Command::MoveResize {
            id: 999,
            before: Geometry::Point(pos2(0.0, 0.0)),
            after: Geometry::Point(pos2(1.0, 1.0)),
        };
        command.apply(&mut doc);
        command.invert(&mut doc);
        assert!(doc.annotations().is_empty());
    }
}
