use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, Geometry, InpaintRegion, TextNote};
use crate::compositor::{self, Layers};
use crate::error::{EditorError, Result};
use crate::history::{Command, CommandHistory};
use crate::imaging::{self, PixelRect};
use crate::render::Fonts;
use crate::style::{Rgba, Style};

/// Notifications for the host, drained once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// `reset_view` is false for same-size pixel bakes, which keep zoom and pan.
    ImageChanged {
        width: u32,
        height: u32,
        reset_view: bool,
    },
    SelectionChanged(Option<AnnotationId>),
    ZoomChanged(u32),
    CropSelectionChanged(bool),
    TextEditFinished,
    ColorSampled(Rgba),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextEdit {
    pub id: AnnotationId,
    /// Created by this edit and not yet in history.
    pub is_new: bool,
    before: Geometry,
}

/// The editable model: base image, annotations and everything undo touches.
/// Only this type mutates them; commands go through the `*_raw` entry points.
pub struct Document {
    image: Arc<RgbaImage>,
    generation: u64,
    annotations: Vec<Annotation>,
    selected: Option<AnnotationId>,
    temp: Vec<Annotation>,
    history: CommandHistory,
    events: Vec<EditorEvent>,
    text_edit: Option<TextEdit>,
    pending_crop: Option<Rect>,
    edit_snapshot: Option<(AnnotationId, Geometry)>,
    next_id: AnnotationId,
    fonts: Fonts,
}

fn check_size(image: &RgbaImage) -> Result<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidImageSize { width, height });
    }
    Ok(())
}

impl Document {
    pub fn new(image: RgbaImage) -> Result<Self> {
        Self::with_fonts(image, Fonts::default())
    }

    /// Text notes added to this document are laid out with `fonts`.
    pub fn with_fonts(image: RgbaImage, fonts: Fonts) -> Result<Self> {
        check_size(&image)?;
        let mut doc = Self {
            image: Arc::new(image),
            generation: 0,
            annotations: Vec::new(),
            selected: None,
            temp: Vec::new(),
            history: CommandHistory::default(),
            events: Vec::new(),
            text_edit: None,
            pending_crop: None,
            edit_snapshot: None,
            next_id: 1,
            fonts,
        };
        doc.emit_image_changed(true);
        Ok(doc)
    }

    /// Replaces the base image and resets everything that referred to the old one.
    pub fn set_image(&mut self, image: RgbaImage) -> Result<()> {
        check_size(&image)?;
        self.image = Arc::new(image);
        self.generation += 1;
        self.annotations.clear();
        self.temp.clear();
        self.history.clear();
        self.text_edit = None;
        self.edit_snapshot = None;
        self.set_pending_crop(None);
        self.select(None);
        self.emit_image_changed(true);
        log::info!("image set to {}x{}", self.image.width(), self.image.height());
        Ok(())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Bumped whenever the base pixels change; keys derived pixel caches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.size())
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations
            .iter_mut()
            .find(|annotation| annotation.id == id)
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.annotation(id))
    }

    pub fn selected_annotation_mut(&mut self) -> Option<&mut Annotation> {
        let id = self.selected?;
        self.annotation_mut(id)
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Builds an annotation with a fresh identity; it is not in the document yet.
    pub fn new_annotation(&mut self, style: Style, kind: AnnotationKind) -> Annotation {
        let id = self.next_id;
        self.next_id = id + 1;
        Annotation::new(id, style, kind)
    }

    fn next_z(&self) -> i64 {
        self.annotations
            .iter()
            .map(|annotation| annotation.z)
            .max()
            .map_or(0, |z| z + 1)
    }

    pub fn temp(&self) -> &[Annotation] {
        &self.temp
    }

    pub fn temp_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.temp
    }

    pub fn clear_temp(&mut self) {
        self.temp.clear();
    }

    /// Topmost annotation whose body contains `point`.
    pub fn hit_test(&self, point: Pos2) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|annotation| annotation.hit_test(point))
            .map(|annotation| annotation.id)
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        let id = id.filter(|id| self.annotation(*id).is_some());
        for annotation in &mut self.annotations {
            annotation.selected = Some(annotation.id) == id;
        }
        if self.selected != id {
            self.selected = id;
            self.emit(EditorEvent::SelectionChanged(id));
        }
    }

    fn execute(&mut self, command: Command) {
        command.apply(self);
        self.history.push(command);
    }

    /// Commits `annotation` on top of the z-order and selects it.
    pub fn add(&mut self, mut annotation: Annotation) -> AnnotationId {
        if let Some(note) = annotation.as_text_mut() {
            note.set_fonts(&self.fonts);
        }
        annotation.z = self.next_z();
        annotation.selected = false;
        let id = annotation.id;
        log::debug!("add {:?} #{id}", annotation.annotation_type());
        self.execute(Command::Add { annotation });
        id
    }

    pub fn delete(&mut self, id: AnnotationId) -> bool {
        let Some(index) = self.annotations.iter().position(|a| a.id == id) else {
            return false;
        };
        let mut annotation = self.annotations[index].clone();
        annotation.selected = false;
        self.execute(Command::Delete {
            annotation,
            index: Some(index),
        });
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.delete(id),
            None => false,
        }
    }

    /// Snapshots geometry at the start of a move/resize gesture.
    pub fn begin_edit(&mut self, id: AnnotationId) {
        self.edit_snapshot = self
            .annotation(id)
            .map(|annotation| (id, annotation.geometry()));
    }

    /// Records the gesture as one undo step, unless nothing changed.
    pub fn end_edit(&mut self) -> bool {
        let Some((id, before)) = self.edit_snapshot.take() else {
            return false;
        };
        let Some(after) = self.annotation(id).map(Annotation::geometry) else {
            return false;
        };
        if after == before {
            return false;
        }
        self.history
            .push(Command::MoveResize { id, before, after });
        true
    }

    pub fn is_editing_geometry(&self) -> bool {
        self.edit_snapshot.is_some()
    }

    /// Crops to `rect` clamped to the image. Annotations are dropped, not remapped.
    pub fn crop_to_rect(&mut self, rect: Rect) -> bool {
        self.finish_text_edit();
        let Some(region) = PixelRect::clamped(rect, self.image.width(), self.image.height()) else {
            return false;
        };
        let after = Arc::new(imaging::crop(&self.image, region));
        log::info!(
            "crop to {}x{} at ({}, {})",
            region.width,
            region.height,
            region.x,
            region.y
        );
        self.execute(Command::Crop {
            before: Arc::clone(&self.image),
            after,
            annotations: self.annotations.clone(),
        });
        true
    }

    /// Writes `after` into the base image as one undoable step.
    pub fn bake(&mut self, after: RgbaImage) -> bool {
        if after.dimensions() != self.image.dimensions() || after == *self.image {
            return false;
        }
        log::info!("pixel bake");
        self.execute(Command::PixelBake {
            before: Arc::clone(&self.image),
            after: Arc::new(after),
        });
        true
    }

    pub fn fill_region(&mut self, rect: Rect, color: Rgba) -> bool {
        let Some(region) = PixelRect::clamped(rect, self.image.width(), self.image.height()) else {
            return false;
        };
        let filled = imaging::fill_rect(&self.image, region, color);
        self.bake(filled)
    }

    /// Bakes the reconstructed region; the image is left alone when that is not possible.
    pub fn apply_inpaint(&mut self, region: &InpaintRegion) -> bool {
        match region.apply(&self.image) {
            Some(healed) => self.bake(healed),
            None => {
                log::warn!("inpaint unavailable for this region, image left unchanged");
                false
            }
        }
    }

    pub fn sample_color_at(&self, point: Pos2) -> Option<Rgba> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let (x, y) = (point.x.floor() as u32, point.y.floor() as u32);
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        Some(Rgba(self.image.get_pixel(x, y).0))
    }

    /// `max(existing) + 1`, so numbering heals after deletes and undo.
    pub fn next_step_number(&self) -> u32 {
        self.annotations
            .iter()
            .filter_map(Annotation::step_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn undo(&mut self) -> bool {
        self.finish_text_edit();
        let mut history = std::mem::take(&mut self.history);
        let undone = match history.step_back() {
            Some(command) => {
                log::info!("undo {}", command.label());
                command.invert(self);
                true
            }
            None => false,
        };
        self.history = history;
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.finish_text_edit();
        let mut history = std::mem::take(&mut self.history);
        let redone = match history.step_forward() {
            Some(command) => {
                log::info!("redo {}", command.label());
                command.apply(self);
                true
            }
            None => false,
        };
        self.history = history;
        redone
    }

    pub fn pending_crop(&self) -> Option<Rect> {
        self.pending_crop
    }

    pub fn set_pending_crop(&mut self, rect: Option<Rect>) {
        let was = self.pending_crop.is_some();
        self.pending_crop = rect;
        if was != rect.is_some() {
            self.emit(EditorEvent::CropSelectionChanged(rect.is_some()));
        }
    }

    pub fn apply_pending_crop(&mut self) -> bool {
        let Some(rect) = self.pending_crop else {
            return false;
        };
        self.set_pending_crop(None);
        self.crop_to_rect(rect)
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    /// Creates an empty note at `position` and starts editing it. The note
    /// only reaches history when the edit finishes with some text.
    pub fn start_new_text(&mut self, position: Pos2, style: Style, mut note: TextNote) -> AnnotationId {
        self.finish_text_edit();
        note.position = position;
        note.text.clear();
        note.set_fonts(&self.fonts);
        let mut annotation = self.new_annotation(style, AnnotationKind::Text(note));
        annotation.z = self.next_z();
        let id = annotation.id;
        self.insert_raw(annotation, None);
        self.begin_text_edit(id, true);
        id
    }

    pub fn begin_text_edit(&mut self, id: AnnotationId, is_new: bool) {
        if self.text_edit.as_ref().is_some_and(|edit| edit.id == id) {
            return;
        }
        self.finish_text_edit();
        let Some(before) = self
            .annotation(id)
            .filter(|annotation| annotation.as_text().is_some())
            .map(Annotation::geometry)
        else {
            return;
        };
        self.text_edit = Some(TextEdit { id, is_new, before });
        self.select(Some(id));
    }

    pub fn editing_text(&self) -> Option<&TextNote> {
        let id = self.text_edit.as_ref()?.id;
        self.annotation(id)?.as_text()
    }

    pub fn editing_text_mut(&mut self) -> Option<&mut TextNote> {
        let id = self.text_edit.as_ref()?.id;
        self.annotation_mut(id)?.as_text_mut()
    }

    /// Ends the inline edit. Empty notes are discarded; otherwise the edit
    /// becomes a single undo step.
    pub fn finish_text_edit(&mut self) -> bool {
        let Some(edit) = self.text_edit.take() else {
            return false;
        };
        let current = self.annotation(edit.id).cloned();
        if let Some(mut annotation) = current {
            let empty = annotation.as_text().is_some_and(|note| note.text.is_empty());
            if empty {
                if edit.is_new {
                    self.remove_raw(edit.id);
                } else {
                    annotation.set_geometry(&edit.before);
                    annotation.selected = false;
                    let index = self.annotations.iter().position(|a| a.id == edit.id);
                    self.remove_raw(edit.id);
                    self.history.push(Command::Delete { annotation, index });
                }
            } else if edit.is_new {
                annotation.selected = false;
                self.history.push(Command::Add { annotation });
            } else {
                let after = annotation.geometry();
                if after != edit.before {
                    self.history.push(Command::MoveResize {
                        id: edit.id,
                        before: edit.before,
                        after,
                    });
                }
            }
        }
        self.emit(EditorEvent::TextEditFinished);
        true
    }

    /// Flattened image. `overlays` adds temporary gestures, selection chrome
    /// and the caret on top of the exported layers.
    pub fn render(&self, fonts: &Fonts, overlays: bool, caret_visible: bool) -> Result<RgbaImage> {
        let caret = self
            .text_edit
            .as_ref()
            .filter(|_| overlays && caret_visible)
            .map(|edit| edit.id);
        compositor::compose(
            &Layers {
                image: &self.image,
                generation: self.generation,
                annotations: &self.annotations,
                temp: if overlays { &self.temp } else { &[] },
                pending_crop: self.pending_crop.filter(|_| overlays),
                caret,
                overlays,
            },
            fonts,
        )
    }

    pub fn render_to_image(&self, fonts: &Fonts) -> Result<RgbaImage> {
        self.render(fonts, false, false)
    }

    pub fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit_image_changed(&mut self, reset_view: bool) {
        let (width, height) = self.image.dimensions();
        self.emit(EditorEvent::ImageChanged {
            width,
            height,
            reset_view,
        });
    }

    pub(crate) fn insert_raw(&mut self, mut annotation: Annotation, index: Option<usize>) {
        annotation.selected = false;
        let index = index
            .unwrap_or_else(|| {
                self.annotations
                    .iter()
                    .position(|existing| existing.z > annotation.z)
                    .unwrap_or(self.annotations.len())
            })
            .min(self.annotations.len());
        self.annotations.insert(index, annotation);
    }

    pub(crate) fn remove_raw(&mut self, id: AnnotationId) -> Option<(usize, Annotation)> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        let annotation = self.annotations.remove(index);
        if self.selected == Some(id) {
            self.select(None);
        }
        if self.text_edit.as_ref().is_some_and(|edit| edit.id == id) {
            self.text_edit = None;
        }
        Some((index, annotation))
    }

    pub(crate) fn set_geometry_raw(&mut self, id: AnnotationId, geometry: &Geometry) -> bool {
        self.annotation_mut(id)
            .is_some_and(|annotation| annotation.set_geometry(geometry))
    }

    pub(crate) fn replace_image_raw(
        &mut self,
        image: Arc<RgbaImage>,
        annotations: Option<Vec<Annotation>>,
        reset_view: bool,
    ) {
        self.image = image;
        self.generation += 1;
        if let Some(annotations) = annotations {
            self.annotations = annotations;
            self.select(None);
        }
        self.emit_image_changed(reset_view);
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2, Rect};
    use image::{Rgba as Pixel, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotation::{measure_text, RectShape, StepBadge};

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(800, 600, Pixel([255, 255, 255, 255]))).expect("document")
    }

    fn add_rect(doc: &mut Document, min: Pos2, max: Pos2) -> AnnotationId {
        let annotation = doc.new_annotation(
            Style::default(),
            AnnotationKind::Rectangle(RectShape::new(Rect::from_min_max(min, max))),
        );
        doc.add(annotation)
    }

    fn add_step(doc: &mut Document) -> AnnotationId {
        let number = doc.next_step_number();
        let annotation = doc.new_annotation(
            Style::default(),
            AnnotationKind::Step(StepBadge::new(pos2(10.0, 10.0), number, Rgba::rgb(211, 78, 78))),
        );
        doc.add(annotation)
    }

    #[test]
    fn rejects_empty_image() {
        assert!(matches!(
            Document::new(RgbaImage::new(0, 4)),
            Err(EditorError::InvalidImageSize { width: 0, height: 4 })
        ));
    }

    #[test]
    fn rectangle_undo_redo_round_trip() {
        let mut doc = document();
        add_rect(&mut doc, pos2(100.0, 100.0), pos2(300.0, 200.0));
        assert!(doc.undo());
        assert!(doc.annotations().is_empty());
        assert!(doc.redo());
        assert_eq!(
            doc.annotations()[0].geometry(),
            Geometry::Rect(Rect::from_min_max(pos2(100.0, 100.0), pos2(300.0, 200.0)))
        );
        assert!(doc.annotations()[0].selected);
    }

    #[test]
    fn topmost_annotation_wins_hit_test() {
        let mut doc = document();
        let mut fill = Style::default();
        fill.fill_color = Some(Rgba::BLACK);
        let a = doc.new_annotation(
            fill.clone(),
            AnnotationKind::Rectangle(RectShape::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(50.0, 50.0)))),
        );
        let a = doc.add(a);
        let b = doc.new_annotation(
            fill,
            AnnotationKind::Rectangle(RectShape::new(Rect::from_min_max(pos2(20.0, 20.0), pos2(70.0, 70.0)))),
        );
        let b = doc.add(b);
        assert_eq!(doc.annotation(a).map(|x| x.z), Some(0));
        assert_eq!(doc.annotation(b).map(|x| x.z), Some(1));
        assert_eq!(doc.hit_test(pos2(30.0, 30.0)), Some(b));
        assert_eq!(doc.hit_test(pos2(5.0, 5.0)), Some(a));
    }

    #[test]
    fn step_numbers_heal_after_delete() {
        let mut doc = document();
        let ids: Vec<_> = (0..3).map(|_| add_step(&mut doc)).collect();
        let numbers: Vec<_> = doc.annotations().iter().filter_map(Annotation::step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(doc.delete(ids[1]));
        add_step(&mut doc);
        assert_eq!(doc.annotations().last().and_then(Annotation::step_number), Some(3));
    }

    #[test]
    fn crop_clears_annotations_and_undo_restores_them() {
        let mut doc = document();
        add_rect(&mut doc, pos2(10.0, 10.0), pos2(50.0, 50.0));
        add_rect(&mut doc, pos2(60.0, 60.0), pos2(90.0, 90.0));
        doc.select(None);
        let before = doc.annotations().to_vec();
        assert!(doc.crop_to_rect(Rect::from_min_max(pos2(100.0, 50.0), pos2(400.0, 250.0))));
        assert!(doc.annotations().is_empty());
        assert_eq!(doc.image().dimensions(), (300, 200));
        assert!(doc.undo());
        assert_eq!(doc.image().dimensions(), (800, 600));
        assert_eq!(doc.annotations(), before.as_slice());
    }

    #[test]
    fn only_crop_asks_for_a_view_reset() {
        let reset_flags = |doc: &mut Document| -> Vec<bool> {
            doc.drain_events()
                .into_iter()
                .filter_map(|event| match event {
                    EditorEvent::ImageChanged { reset_view, .. } => Some(reset_view),
                    _ => None,
                })
                .collect()
        };
        let mut doc = document();
        doc.drain_events();
        assert!(doc.fill_region(Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)), Rgba::BLACK));
        assert!(doc.undo());
        assert!(doc.redo());
        assert_eq!(reset_flags(&mut doc), vec![false, false, false]);

        assert!(doc.crop_to_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0))));
        assert!(doc.undo());
        assert_eq!(reset_flags(&mut doc), vec![true, true]);
    }

    #[test]
    fn crop_outside_image_is_ignored() {
        let mut doc = document();
        assert!(!doc.crop_to_rect(Rect::from_min_max(pos2(900.0, 0.0), pos2(950.0, 40.0))));
        assert!(!doc.can_undo());
    }

    #[test]
    fn unchanged_edit_pushes_nothing() {
        let mut doc = document();
        let id = add_rect(&mut doc, pos2(0.0, 0.0), pos2(40.0, 40.0));
        let depth = doc.history().len();
        doc.begin_edit(id);
        assert!(!doc.end_edit());
        assert_eq!(doc.history().len(), depth);

        doc.begin_edit(id);
        if let Some(annotation) = doc.annotation_mut(id) {
            annotation.move_by(vec2(5.0, 5.0));
        }
        assert!(doc.end_edit());
        assert!(doc.undo());
        assert_eq!(
            doc.annotation(id).map(Annotation::geometry),
            Some(Geometry::Rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(40.0, 40.0))))
        );
    }

    #[test]
    fn empty_new_text_is_discarded_without_history() {
        let mut doc = document();
        doc.start_new_text(pos2(50.0, 50.0), Style::default(), TextNote::new(pos2(0.0, 0.0), ""));
        assert_eq!(doc.annotations().len(), 1);
        assert!(doc.finish_text_edit());
        assert!(doc.annotations().is_empty());
        assert!(!doc.can_undo());
        assert!(doc.drain_events().contains(&EditorEvent::TextEditFinished));
    }

    #[test]
    fn new_text_is_measured_with_document_fonts() {
        let fonts = Fonts::load_system();
        let image = RgbaImage::from_pixel(400, 300, Pixel([255, 255, 255, 255]));
        let mut doc = Document::with_fonts(image, fonts.clone()).expect("document");
        let style = Style::default();
        let id = doc.start_new_text(pos2(20.0, 40.0), style.clone(), TextNote::new(pos2(0.0, 0.0), ""));
        if let Some(note) = doc.editing_text_mut() {
            note.text.push_str("WWWWWWWW");
        }
        let width = doc
            .annotation(id)
            .and_then(Annotation::as_text)
            .map(|note| note.block(&style).width);
        let expected = fonts
            .line_width("WWWWWWWW", style.font_size, false)
            .unwrap_or_else(|| measure_text("WWWWWWWW", style.font_size, false).width);
        assert_eq!(width, Some(expected));
    }

    #[test]
    fn typed_text_becomes_one_undo_step() {
        let mut doc = document();
        doc.start_new_text(pos2(50.0, 50.0), Style::default(), TextNote::new(pos2(0.0, 0.0), ""));
        if let Some(note) = doc.editing_text_mut() {
            note.push_char('o');
            note.push_char('k');
        }
        doc.finish_text_edit();
        assert_eq!(doc.history().len(), 1);
        assert!(doc.undo());
        assert!(doc.annotations().is_empty());
        assert!(doc.redo());
        assert_eq!(doc.annotations()[0].as_text().map(|n| n.text.as_str()), Some("ok"));
    }

    #[test]
    fn eraser_fill_is_undoable_bake() {
        let mut doc = document();
        assert!(doc.fill_region(Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)), Rgba::BLACK));
        assert_eq!(doc.sample_color_at(pos2(5.0, 5.0)), Some(Rgba::BLACK));
        assert!(doc.undo());
        assert_eq!(doc.sample_color_at(pos2(5.0, 5.0)), Some(Rgba::WHITE));
        assert_eq!(doc.sample_color_at(pos2(-1.0, 5.0)), None);
        assert_eq!(doc.sample_color_at(pos2(800.0, 5.0)), None);
    }

    #[test]
    fn delete_then_undo_restores_index() {
        let mut doc = document();
        let a = add_rect(&mut doc, pos2(0.0, 0.0), pos2(10.0, 10.0));
        let b = add_rect(&mut doc, pos2(20.0, 0.0), pos2(30.0, 10.0));
        let c = add_rect(&mut doc, pos2(40.0, 0.0), pos2(50.0, 10.0));
        doc.select(Some(b));
        assert!(doc.delete_selected());
        assert_eq!(doc.selected(), None);
        assert!(doc.undo());
        let order: Vec<_> = doc.annotations().iter().map(|x| x.id).collect();
        assert_eq!(order, vec![a, b, c]);
    }
}
