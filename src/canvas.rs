use std::time::Duration;

use egui::{CursorIcon, Key, Modifiers, Pos2, Vec2};
use image::RgbaImage;

use crate::annotation::{AnnotationType, TextNote};
use crate::config::EditorContext;
use crate::document::{Document, EditorEvent};
use crate::error::Result;
use crate::render::Fonts;
use crate::style::{Rgba, Style};
use crate::tools::{BlurOptions, PointerInput, ToolBox, ToolKind};
use crate::view::ViewTransform;

const WHEEL_ZOOM_IN: f32 = 1.1;
const WHEEL_ZOOM_OUT: f32 = 0.9;
const FONT_STEP: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Caret {
    visible: bool,
    elapsed: Duration,
    period: Duration,
}

impl Caret {
    fn new(period: Duration) -> Self {
        Self {
            visible: true,
            elapsed: Duration::ZERO,
            period,
        }
    }

    fn reset(&mut self) {
        self.visible = true;
        self.elapsed = Duration::ZERO;
    }

    fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        let mut toggled = false;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            self.visible = !self.visible;
            toggled = !toggled;
        }
        toggled
    }
}

/// Snapshot for the status bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub image_size: (u32, u32),
    pub zoom_percent: u32,
    pub cursor: Option<Pos2>,
    pub tool: ToolKind,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_pending_crop: bool,
}

/// Editor facade the host drives with view-space input. Owns the document,
/// the view transform and the tools; everything runs on the caller's thread.
pub struct Canvas {
    doc: Document,
    view: ViewTransform,
    tools: ToolBox,
    fonts: Fonts,
    context: EditorContext,
    caret: Caret,
    events: Vec<EditorEvent>,
    cursor: Option<Pos2>,
    pan_from: Option<Pos2>,
    space_held: bool,
    pointer_down: bool,
    back_to_pointer: bool,
    last_zoom: u32,
    dirty: bool,
}

impl Canvas {
    pub fn new(image: RgbaImage, context: EditorContext, fonts: Fonts) -> Result<Self> {
        let doc = Document::with_fonts(image, fonts.clone())?;
        let mut view = ViewTransform::default();
        view.set_image_size(doc.size());
        let mut canvas = Self {
            doc,
            tools: ToolBox::new(context.config.eraser_color),
            caret: Caret::new(context.config.caret_blink()),
            last_zoom: view.zoom_percent(),
            view,
            fonts,
            context,
            events: Vec::new(),
            cursor: None,
            pan_from: None,
            space_held: false,
            pointer_down: false,
            back_to_pointer: false,
            dirty: true,
        };
        canvas.settle();
        Ok(canvas)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn fonts(&self) -> &Fonts {
        &self.fonts
    }

    /// Replaces the picture, dropping annotations and history.
    pub fn set_image(&mut self, image: RgbaImage) -> Result<()> {
        self.tools.active_mut().deactivate(&mut self.doc);
        self.doc.set_image(image)?;
        self.settle();
        Ok(())
    }

    pub fn resize_viewport(&mut self, size: Vec2) {
        if size != self.view.viewport() {
            self.view.resize_viewport(size);
            self.settle();
        }
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.active_kind()
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.tools.switch(kind, &mut self.doc) {
            self.pan_from = None;
            self.pointer_down = false;
            self.settle();
        }
    }

    pub fn tool_style(&self) -> &Style {
        self.tools.active().style()
    }

    /// Applies a style edit to the active tool and, live, to the selection.
    /// Style changes are not undo steps.
    pub fn update_style(&mut self, edit: impl Fn(&mut Style)) {
        edit(self.tools.active_mut().style_mut());
        if let Some(selected) = self.doc.selected_annotation_mut() {
            edit(&mut selected.style);
        }
        self.dirty = true;
    }

    pub fn blur_options_mut(&mut self) -> Option<&mut BlurOptions> {
        self.tools.active_mut().blur_options_mut()
    }

    pub fn fill_color_mut(&mut self) -> Option<&mut Rgba> {
        self.dirty = true;
        self.tools.active_mut().fill_color_mut()
    }

    pub fn text_template_mut(&mut self) -> Option<&mut TextNote> {
        self.tools.active_mut().text_template_mut()
    }

    /// The selected note, for bubble settings in the properties panel.
    pub fn selected_text_mut(&mut self) -> Option<&mut TextNote> {
        self.dirty = true;
        self.doc.selected_annotation_mut()?.as_text_mut()
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
        if !held {
            self.pan_from = None;
        }
    }

    pub fn pointer_pressed(&mut self, pos: Pos2, modifiers: Modifiers) {
        if self.space_held {
            self.pan_from = Some(pos);
            return;
        }
        self.pointer_down = true;
        let input = self.input(pos, modifiers);
        self.tools.active_mut().on_press(&mut self.doc, input);
        self.caret.reset();
        self.settle();
    }

    pub fn pointer_moved(&mut self, pos: Pos2, modifiers: Modifiers) {
        self.cursor = Some(self.view.widget_to_image(pos));
        if let Some(from) = self.pan_from.as_mut() {
            let delta = pos - *from;
            *from = pos;
            self.view.pan_by(delta);
            self.settle();
            return;
        }
        if self.pointer_down {
            let input = self.input(pos, modifiers);
            self.tools.active_mut().on_move(&mut self.doc, input);
            self.settle();
        }
    }

    pub fn pointer_released(&mut self, pos: Pos2, modifiers: Modifiers) {
        if self.pan_from.take().is_some() {
            return;
        }
        if !std::mem::take(&mut self.pointer_down) {
            return;
        }
        let input = self.input(pos, modifiers);
        self.tools.active_mut().on_release(&mut self.doc, input);
        self.settle();
    }

    pub fn pointer_left(&mut self) {
        self.cursor = None;
    }

    /// Ctrl/Cmd + wheel zooms around the cursor; a plain wheel pans.
    pub fn scroll(&mut self, delta: Vec2, pos: Pos2, modifiers: Modifiers) {
        if modifiers.ctrl || modifiers.command {
            if delta.y == 0.0 {
                return;
            }
            let factor = if delta.y > 0.0 {
                WHEEL_ZOOM_IN
            } else {
                WHEEL_ZOOM_OUT
            };
            self.view.set_zoom(self.view.zoom() * factor, Some(pos));
        } else {
            self.view.pan_by(delta);
        }
        self.settle();
    }

    /// The active tool sees the key first, then canvas shortcuts.
    pub fn key_pressed(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let consumed = self.tools.active_mut().on_key(&mut self.doc, key, modifiers)
            || self.shortcut(key, modifiers);
        if consumed {
            self.caret.reset();
        }
        self.settle();
        consumed
    }

    pub fn text_input(&mut self, text: &str) -> bool {
        let consumed = self.tools.active_mut().on_text(&mut self.doc, text);
        if consumed {
            self.caret.reset();
            self.settle();
        }
        consumed
    }

    fn shortcut(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let command = modifiers.ctrl || modifiers.command;
        if command {
            return match key {
                Key::Z if modifiers.shift => self.doc.redo(),
                Key::Z => self.doc.undo(),
                Key::Y => self.doc.redo(),
                Key::Equals | Key::Plus => {
                    self.view.zoom_in();
                    true
                }
                Key::Minus => {
                    self.view.zoom_out();
                    true
                }
                Key::Num0 => {
                    self.view.refit();
                    true
                }
                Key::Num1 => {
                    self.view.zoom_to_100();
                    true
                }
                Key::R => self.roughen_selected_text(),
                Key::OpenBracket => self.step_selected_font(-FONT_STEP),
                Key::CloseBracket => self.step_selected_font(FONT_STEP),
                _ => false,
            };
        }
        if matches!(key, Key::Delete | Key::Backspace) && self.doc.text_edit().is_none() {
            return self.doc.delete_selected();
        }
        if modifiers.is_none() && self.doc.text_edit().is_none() {
            if let Some(kind) = ToolKind::from_shortcut(key) {
                self.set_tool(kind);
                return true;
            }
        }
        false
    }

    /// First press turns on the hand-drawn outline, later presses reshuffle it.
    fn roughen_selected_text(&mut self) -> bool {
        let Some(note) = self
            .doc
            .selected_annotation_mut()
            .and_then(|annotation| annotation.as_text_mut())
        else {
            return false;
        };
        if note.hand_drawn {
            note.reseed();
        } else {
            note.toggle_hand_drawn();
        }
        true
    }

    fn step_selected_font(&mut self, step: f32) -> bool {
        let Some(selected) = self
            .doc
            .selected_annotation_mut()
            .filter(|annotation| annotation.annotation_type() == AnnotationType::Text)
        else {
            return false;
        };
        let size = selected.style.font_size + step;
        selected.style.set_font_size(size);
        true
    }

    pub fn undo(&mut self) -> bool {
        let done = self.doc.undo();
        self.settle();
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.doc.redo();
        self.settle();
        done
    }

    pub fn delete_selected(&mut self) -> bool {
        let done = self.doc.delete_selected();
        self.settle();
        done
    }

    pub fn apply_crop(&mut self) -> bool {
        let done = self.doc.apply_pending_crop();
        self.settle();
        done
    }

    pub fn cancel_crop(&mut self) {
        self.doc.set_pending_crop(None);
        self.settle();
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
        self.settle();
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
        self.settle();
    }

    pub fn zoom_to_fit(&mut self) {
        self.view.refit();
        self.settle();
    }

    pub fn zoom_to_100(&mut self) {
        self.view.zoom_to_100();
        self.settle();
    }

    /// Advances the caret blink; true when a repaint is due.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.doc.text_edit().is_none() {
            self.caret.reset();
            return false;
        }
        let toggled = self.caret.tick(dt);
        self.dirty |= toggled;
        toggled
    }

    pub fn caret_visible(&self) -> bool {
        self.doc.text_edit().is_some() && self.caret.visible
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        if self.pan_from.is_some() {
            CursorIcon::Grabbing
        } else if self.space_held {
            CursorIcon::Grab
        } else {
            self.tools.active_kind().cursor()
        }
    }

    pub fn status(&self) -> Status {
        Status {
            image_size: self.doc.image().dimensions(),
            zoom_percent: self.view.zoom_percent(),
            cursor: self.cursor.filter(|pos| self.doc.bounds().contains(*pos)),
            tool: self.tools.active_kind(),
            can_undo: self.doc.can_undo(),
            can_redo: self.doc.can_redo(),
            has_pending_crop: self.doc.pending_crop().is_some(),
        }
    }

    /// Live frame with gestures, selection chrome and caret.
    pub fn render(&self) -> Result<RgbaImage> {
        self.doc.render(&self.fonts, true, self.caret_visible())
    }

    /// Export frame: only the layers that belong in the saved picture.
    pub fn render_to_image(&self) -> Result<RgbaImage> {
        self.doc.render_to_image(&self.fonts)
    }

    /// True once after any change that needs a new frame.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn input(&self, pos: Pos2, modifiers: Modifiers) -> PointerInput {
        PointerInput::new(self.view.widget_to_image(pos), modifiers)
    }

    /// Reacts to document events and forwards them to the host.
    fn settle(&mut self) {
        self.dirty = true;
        for event in self.doc.drain_events() {
            match &event {
                EditorEvent::ImageChanged { reset_view, .. } => {
                    self.view.set_image_size(self.doc.size());
                    if *reset_view {
                        self.view.refit();
                    }
                }
                EditorEvent::TextEditFinished => self.back_to_pointer = true,
                EditorEvent::ColorSampled(color) => self.tools.set_stroke_color_all(*color),
                _ => {}
            }
            self.events.push(event);
        }
        // a spike drag may finish the edit mid-gesture; switch once it is released
        if self.back_to_pointer && !self.pointer_down {
            self.back_to_pointer = false;
            if self.tools.active_kind() == ToolKind::Text
                && self.tools.switch(ToolKind::Pointer, &mut self.doc)
            {
                self.events.extend(self.doc.drain_events());
            }
        }
        let zoom = self.view.zoom_percent();
        if zoom != self.last_zoom {
            self.last_zoom = zoom;
            self.events.push(EditorEvent::ZoomChanged(zoom));
        }
    }
}
