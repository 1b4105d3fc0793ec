mod manipulate;
mod pixel;
mod pointer;
mod shape;
mod stamp;
mod stroke;
mod text;

use egui::{CursorIcon, Key, Modifiers, Pos2};

use crate::annotation::TextNote;
use crate::document::Document;
use crate::imaging::BlurMode;
use crate::style::{Rgba, Style};

pub use manipulate::Manipulation;
pub use pixel::{EraserTool, HealTool};
pub use pointer::PointerTool;
pub use shape::{ShapeKind, ShapeTool};
pub use stamp::{EyedropperTool, StepTool};
pub use stroke::{FreehandTool, HighlighterTool};
pub use text::TextTool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Pointer,
    Rectangle,
    Ellipse,
    Arrow,
    Text,
    Freehand,
    Highlighter,
    Spotlight,
    Step,
    Blur,
    Eraser,
    Ruler,
    Heal,
    Eyedropper,
}

impl ToolKind {
    pub const ALL: [ToolKind; 14] = [
        ToolKind::Pointer,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Arrow,
        ToolKind::Text,
        ToolKind::Freehand,
        ToolKind::Highlighter,
        ToolKind::Spotlight,
        ToolKind::Step,
        ToolKind::Blur,
        ToolKind::Eraser,
        ToolKind::Ruler,
        ToolKind::Heal,
        ToolKind::Eyedropper,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pointer => "Select",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
            Self::Arrow => "Arrow",
            Self::Text => "Text",
            Self::Freehand => "Pen",
            Self::Highlighter => "Highlighter",
            Self::Spotlight => "Spotlight",
            Self::Step => "Step",
            Self::Blur => "Blur",
            Self::Eraser => "Eraser",
            Self::Ruler => "Ruler",
            Self::Heal => "Heal",
            Self::Eyedropper => "Eyedropper",
        }
    }

    pub fn shortcut(self) -> Key {
        match self {
            Self::Pointer => Key::V,
            Self::Rectangle => Key::R,
            Self::Ellipse => Key::E,
            Self::Arrow => Key::A,
            Self::Text => Key::T,
            Self::Freehand => Key::F,
            Self::Highlighter => Key::H,
            Self::Spotlight => Key::S,
            Self::Step => Key::N,
            Self::Blur => Key::B,
            Self::Eraser => Key::X,
            Self::Ruler => Key::L,
            Self::Heal => Key::P,
            Self::Eyedropper => Key::I,
        }
    }

    pub fn from_shortcut(key: Key) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.shortcut() == key)
    }

    pub fn cursor(self) -> CursorIcon {
        match self {
            Self::Pointer => CursorIcon::Default,
            Self::Text => CursorIcon::Text,
            _ => CursorIcon::Crosshair,
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }
}

/// A pointer event already mapped into image space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub pos: Pos2,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(pos: Pos2, modifiers: Modifiers) -> Self {
        Self { pos, modifiers }
    }

    pub fn at(pos: Pos2) -> Self {
        Self::new(pos, Modifiers::NONE)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.shift
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurOptions {
    pub mode: BlurMode,
    pub intensity: u32,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self {
            mode: BlurMode::Blur,
            intensity: 35,
        }
    }
}

/// One interaction mode of the canvas. Handlers receive the document and
/// must leave it consistent when `deactivate` interrupts a gesture.
pub trait Tool {
    fn kind(&self) -> ToolKind;
    fn style(&self) -> &Style;
    fn style_mut(&mut self) -> &mut Style;
    fn on_press(&mut self, doc: &mut Document, input: PointerInput);
    fn on_move(&mut self, doc: &mut Document, input: PointerInput);
    fn on_release(&mut self, doc: &mut Document, input: PointerInput);

    /// Returns true when the key was consumed.
    fn on_key(&mut self, _doc: &mut Document, _key: Key, _modifiers: Modifiers) -> bool {
        false
    }

    fn on_text(&mut self, _doc: &mut Document, _text: &str) -> bool {
        false
    }

    fn deactivate(&mut self, doc: &mut Document);

    fn blur_options_mut(&mut self) -> Option<&mut BlurOptions> {
        None
    }

    fn text_template_mut(&mut self) -> Option<&mut TextNote> {
        None
    }

    /// Colour painted into the image by tools that bake a solid fill.
    fn fill_color_mut(&mut self) -> Option<&mut Rgba> {
        None
    }
}

fn create(kind: ToolKind, eraser_color: Rgba) -> Box<dyn Tool> {
    match kind {
        ToolKind::Pointer => Box::new(PointerTool::default()),
        ToolKind::Rectangle => Box::new(ShapeTool::new(ShapeKind::Rectangle)),
        ToolKind::Ellipse => Box::new(ShapeTool::new(ShapeKind::Ellipse)),
        ToolKind::Arrow => Box::new(ShapeTool::new(ShapeKind::Arrow)),
        ToolKind::Ruler => Box::new(ShapeTool::new(ShapeKind::Ruler)),
        ToolKind::Spotlight => Box::new(ShapeTool::new(ShapeKind::Spotlight)),
        ToolKind::Blur => Box::new(ShapeTool::new(ShapeKind::Blur)),
        ToolKind::Text => Box::new(TextTool::default()),
        ToolKind::Freehand => Box::new(FreehandTool::default()),
        ToolKind::Highlighter => Box::new(HighlighterTool::default()),
        ToolKind::Step => Box::new(StepTool::default()),
        ToolKind::Eraser => Box::new(EraserTool::new(eraser_color)),
        ToolKind::Heal => Box::new(HealTool::default()),
        ToolKind::Eyedropper => Box::new(EyedropperTool::default()),
    }
}

/// Every tool, each keeping its own style between activations.
pub struct ToolBox {
    tools: Vec<Box<dyn Tool>>,
    active: ToolKind,
}

impl ToolBox {
    pub fn new(eraser_color: Rgba) -> Self {
        Self {
            tools: ToolKind::ALL
                .into_iter()
                .map(|kind| create(kind, eraser_color))
                .collect(),
            active: ToolKind::Pointer,
        }
    }

    pub fn active_kind(&self) -> ToolKind {
        self.active
    }

    pub fn active(&self) -> &dyn Tool {
        self.tools[self.active.index()].as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn Tool {
        self.tools[self.active.index()].as_mut()
    }

    /// Deactivates the outgoing tool before `kind` takes over.
    pub fn switch(&mut self, kind: ToolKind, doc: &mut Document) -> bool {
        if kind == self.active {
            return false;
        }
        self.active_mut().deactivate(doc);
        log::debug!("tool {:?} -> {:?}", self.active, kind);
        self.active = kind;
        true
    }

    pub fn set_stroke_color_all(&mut self, color: Rgba) {
        for tool in &mut self.tools {
            tool.style_mut().stroke_color = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, Rect};
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;
    use crate::annotation::AnnotationType;

    fn document() -> Document {
        Document::new(RgbaImage::from_pixel(400, 300, Pixel([255, 255, 255, 255]))).expect("document")
    }

    fn drag(tools: &mut ToolBox, doc: &mut Document, from: Pos2, to: Pos2, modifiers: Modifiers) {
        let tool = tools.active_mut();
        tool.on_press(doc, PointerInput::new(from, modifiers));
        let mid = from + (to - from) * 0.5;
        tool.on_move(doc, PointerInput::new(mid, modifiers));
        tool.on_move(doc, PointerInput::new(to, modifiers));
        tool.on_release(doc, PointerInput::new(to, modifiers));
    }

    #[test]
    fn shortcuts_are_unique() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_shortcut(kind.shortcut()), Some(kind));
        }
    }

    #[test]
    fn each_drawing_tool_commits_its_type() {
        let cases = [
            (ToolKind::Rectangle, AnnotationType::Rectangle),
            (ToolKind::Ellipse, AnnotationType::Ellipse),
            (ToolKind::Arrow, AnnotationType::Arrow),
            (ToolKind::Ruler, AnnotationType::Ruler),
            (ToolKind::Spotlight, AnnotationType::Spotlight),
            (ToolKind::Blur, AnnotationType::Blur),
            (ToolKind::Freehand, AnnotationType::Freehand),
            (ToolKind::Highlighter, AnnotationType::Highlight),
        ];
        for (kind, expected) in cases {
            let mut doc = document();
            let mut tools = ToolBox::new(Rgba::WHITE);
            tools.switch(kind, &mut doc);
            drag(&mut tools, &mut doc, pos2(20.0, 20.0), pos2(120.0, 90.0), Modifiers::NONE);
            assert_eq!(doc.annotations().len(), 1, "{kind:?}");
            assert_eq!(doc.annotations()[0].annotation_type(), expected);
            assert!(doc.annotations()[0].selected);
            assert!(doc.temp().is_empty());
        }
    }

    #[test]
    fn tiny_gestures_are_discarded() {
        for kind in [ToolKind::Rectangle, ToolKind::Arrow, ToolKind::Spotlight, ToolKind::Eraser] {
            let mut doc = document();
            let mut tools = ToolBox::new(Rgba::WHITE);
            tools.switch(kind, &mut doc);
            drag(&mut tools, &mut doc, pos2(20.0, 20.0), pos2(22.0, 23.0), Modifiers::NONE);
            assert!(doc.annotations().is_empty(), "{kind:?}");
            assert!(!doc.can_undo());
        }
    }

    #[test]
    fn shape_tool_moves_existing_annotation_instead_of_drawing() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::WHITE);
        tools.switch(ToolKind::Rectangle, &mut doc);
        drag(&mut tools, &mut doc, pos2(20.0, 20.0), pos2(120.0, 90.0), Modifiers::NONE);
        // press on the left edge and drag it
        drag(&mut tools, &mut doc, pos2(20.0, 50.0), pos2(30.0, 60.0), Modifiers::NONE);
        assert_eq!(doc.annotations().len(), 1);
        assert_eq!(doc.annotations()[0].bounds().min, pos2(30.0 - 2.5, 30.0 - 2.5));
        assert!(doc.undo());
        assert_eq!(doc.annotations()[0].bounds().min, pos2(20.0 - 2.5, 20.0 - 2.5));
    }

    #[test]
    fn shift_draws_square_rectangle() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::WHITE);
        tools.switch(ToolKind::Rectangle, &mut doc);
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };
        drag(&mut tools, &mut doc, pos2(10.0, 10.0), pos2(110.0, 50.0), shift);
        let bounds = doc.annotations()[0].bounds();
        assert_eq!(bounds.width(), bounds.height());
    }

    #[test]
    fn switching_tools_discards_partial_stroke() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::WHITE);
        tools.switch(ToolKind::Freehand, &mut doc);
        tools.active_mut().on_press(&mut doc, PointerInput::at(pos2(5.0, 5.0)));
        tools.active_mut().on_move(&mut doc, PointerInput::at(pos2(50.0, 50.0)));
        assert_eq!(doc.temp().len(), 1);
        tools.switch(ToolKind::Pointer, &mut doc);
        assert!(doc.temp().is_empty());
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn eraser_bakes_fill_color() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::BLACK);
        tools.switch(ToolKind::Eraser, &mut doc);
        drag(&mut tools, &mut doc, pos2(10.0, 10.0), pos2(40.0, 40.0), Modifiers::NONE);
        assert!(doc.annotations().is_empty());
        assert_eq!(doc.sample_color_at(pos2(20.0, 20.0)), Some(Rgba::BLACK));
        assert!(doc.undo());
        assert_eq!(doc.sample_color_at(pos2(20.0, 20.0)), Some(Rgba::WHITE));
    }

    #[test]
    fn pointer_drag_on_empty_canvas_leaves_pending_crop() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::WHITE);
        drag(&mut tools, &mut doc, pos2(10.0, 10.0), pos2(110.0, 60.0), Modifiers::NONE);
        assert_eq!(
            doc.pending_crop(),
            Some(Rect::from_min_max(pos2(10.0, 10.0), pos2(110.0, 60.0)))
        );
        assert!(tools.active_mut().on_key(&mut doc, Key::Enter, Modifiers::NONE));
        assert_eq!(doc.image().dimensions(), (100, 50));
        assert_eq!(doc.pending_crop(), None);
    }

    #[test]
    fn escape_cancels_pending_crop() {
        let mut doc = document();
        let mut tools = ToolBox::new(Rgba::WHITE);
        drag(&mut tools, &mut doc, pos2(10.0, 10.0), pos2(110.0, 60.0), Modifiers::NONE);
        assert!(tools.active_mut().on_key(&mut doc, Key::Escape, Modifiers::NONE));
        assert_eq!(doc.pending_crop(), None);
        assert_eq!(doc.image().dimensions(), (400, 300));
    }

    #[test]
    fn eyedropper_reports_sampled_color() {
        let mut image = RgbaImage::from_pixel(10, 10, Pixel([255, 255, 255, 255]));
        image.put_pixel(3, 4, Pixel([10, 20, 30, 255]));
        let mut doc = Document::new(image).expect("document");
        let mut tools = ToolBox::new(Rgba::WHITE);
        tools.switch(ToolKind::Eyedropper, &mut doc);
        doc.drain_events();
        tools.active_mut().on_press(&mut doc, PointerInput::at(pos2(3.5, 4.5)));
        assert_eq!(
            doc.drain_events(),
            vec![crate::document::EditorEvent::ColorSampled(Rgba::rgb(10, 20, 30))]
        );
    }
}
