use egui::{pos2, vec2, Pos2, Rect, Vec2};

use super::{Geometry, Shape};
use crate::geometry::{handle_rect, Handle};
use crate::render::{self, Fonts, Surface};
use crate::style::{Rgba, Style};

const MIN_BUBBLE_TEXT_WIDTH: f32 = 60.0;
const SPIKE_BOUNDS: f32 = 10.0;
const SPIKE_HANDLE: f32 = 12.0;
const WOBBLE: f32 = 2.0;
const WOBBLE_STEPS: usize = 20;
const OUTLINE_WIDTH: f32 = 2.0;

/// Layout of a (possibly multi-line) text block at a given font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBlock {
    pub width: f32,
    pub height: f32,
    pub ascent: f32,
    pub line_height: f32,
    pub lines: usize,
}

/// Layout estimate used when no font could be loaded.
pub fn measure_text(text: &str, font_size: f32, bold: bool) -> TextBlock {
    let advance = font_size * if bold { 0.6 } else { 0.55 };
    let lines: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    };
    let widest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let line_height = font_size * 1.25;
    TextBlock {
        width: widest as f32 * advance,
        height: line_height * lines.len() as f32,
        ascent: font_size * 0.8,
        line_height,
        lines: lines.len(),
    }
}

/// Font handle a note lays itself out with. Notes compare by content, so
/// two handles are always equal.
#[derive(Clone, Debug, Default)]
struct LayoutFonts(Fonts);

impl PartialEq for LayoutFonts {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextNote {
    /// Baseline origin of the first line.
    pub position: Pos2,
    pub text: String,
    pub show_bubble: bool,
    pub bubble_color: Rgba,
    pub corner_radius: f32,
    pub padding: f32,
    pub spike_enabled: bool,
    pub spike_offset: Vec2,
    pub spike_size: f32,
    pub hand_drawn: bool,
    pub seed: u64,
    pub show_shadow: bool,
    pub shadow_offset: f32,
    pub shadow_color: Rgba,
    fonts: LayoutFonts,
}

impl TextNote {
    pub const DEFAULT_BUBBLE: Rgba = Rgba::rgb(211, 78, 78);

    pub fn new(position: Pos2, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            show_bubble: true,
            bubble_color: Self::DEFAULT_BUBBLE,
            corner_radius: 8.0,
            padding: 12.0,
            spike_enabled: true,
            spike_offset: vec2(0.0, 30.0),
            spike_size: 15.0,
            hand_drawn: false,
            seed: 42,
            show_shadow: false,
            shadow_offset: 3.0,
            shadow_color: Rgba::rgba(0, 0, 0, 60),
            fonts: LayoutFonts::default(),
        }
    }

    /// Measures with `fonts` from now on, so bounds match the painted glyphs.
    pub fn set_fonts(&mut self, fonts: &Fonts) {
        self.fonts = LayoutFonts(fonts.clone());
    }

    pub fn block(&self, style: &Style) -> TextBlock {
        let (size, bold) = (style.font_size, style.is_bold());
        let mut block = measure_text(&self.text, size, bold);
        let measured = self
            .text
            .split('\n')
            .map(|line| self.fonts.0.line_width(line, size, bold))
            .try_fold(0.0_f32, |widest, line| line.map(|width| widest.max(width)));
        if let Some(width) = measured {
            block.width = width;
        }
        block
    }

    pub fn bubble_rect(&self, style: &Style) -> Rect {
        let block = self.block(style);
        let pad = self.padding;
        Rect::from_min_size(
            pos2(self.position.x - pad, self.position.y - block.ascent - pad),
            vec2(
                block.width.max(MIN_BUBBLE_TEXT_WIDTH) + pad * 2.0,
                block.height.max(block.line_height) + pad * 2.0,
            ),
        )
    }

    /// Bounds of the glyphs alone, used when the bubble is hidden.
    pub fn text_rect(&self, style: &Style) -> Rect {
        let block = self.block(style);
        Rect::from_min_size(
            pos2(self.position.x, self.position.y - block.ascent),
            vec2(block.width.max(1.0), block.height),
        )
    }

    pub fn spike_tip(&self, style: &Style) -> Pos2 {
        let bubble = self.bubble_rect(style);
        pos2(
            bubble.center().x + self.spike_offset.x,
            bubble.bottom() + self.spike_offset.y,
        )
    }

    pub fn spike_handle(&self, style: &Style) -> Option<Rect> {
        if !self.show_bubble || !self.spike_enabled {
            return None;
        }
        Some(Rect::from_center_size(
            self.spike_tip(style),
            Vec2::splat(SPIKE_HANDLE),
        ))
    }

    pub fn hit_test_spike(&self, style: &Style, point: Pos2) -> bool {
        self.spike_handle(style)
            .is_some_and(|handle| handle.contains(point))
    }

    /// Re-aims the spike so its tip sits at `tip`.
    pub fn move_spike(&mut self, style: &Style, tip: Pos2) {
        let bubble = self.bubble_rect(style);
        self.spike_offset = tip - pos2(bubble.center().x, bubble.bottom());
    }

    pub fn toggle_hand_drawn(&mut self) {
        self.hand_drawn = !self.hand_drawn;
    }

    pub fn reseed(&mut self) {
        self.seed = splitmix64(self.seed) % 100_000;
    }

    pub fn text_color(&self, style: &Style) -> Rgba {
        if self.show_bubble {
            self.bubble_color.contrasting_text()
        } else {
            style.stroke_color
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn pop_char(&mut self) -> Option<char> {
        self.text.pop()
    }

    /// Top of the caret after the last character, and its height.
    pub fn caret_anchor(&self, style: &Style) -> (Pos2, f32) {
        let block = self.block(style);
        let top = self.position.y - block.ascent + (block.lines - 1) as f32 * block.line_height;
        (pos2(self.position.x, top), block.line_height)
    }

    pub fn last_line(&self) -> &str {
        self.text.rsplit('\n').next().unwrap_or("")
    }

    fn wobble(&self, point: Pos2, index: u64) -> Pos2 {
        if !self.hand_drawn {
            return point;
        }
        let hash = splitmix64(self.seed.wrapping_add(index));
        let unit = |bits: u64| (bits & 0xFF_FFFF) as f32 / 0xFF_FFFF as f32;
        point
            + vec2(
                (unit(hash) * 2.0 - 1.0) * WOBBLE,
                (unit(hash >> 24) * 2.0 - 1.0) * WOBBLE,
            )
    }

    /// Bubble outline as sampled points; only used in hand-drawn mode.
    fn wobbly_outline(&self, rect: Rect) -> Vec<Pos2> {
        let r = self.corner_radius;
        let steps = WOBBLE_STEPS;
        let mut points = Vec::with_capacity(steps * 4);
        let inner_w = rect.width() - 2.0 * r;
        let inner_h = rect.height() - 2.0 * r;
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            points.push(self.wobble(pos2(rect.left() + r + t * inner_w, rect.top()), i as u64));
        }
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let p = pos2(rect.right(), rect.top() + r + t * inner_h);
            points.push(self.wobble(p, (steps + i) as u64));
        }
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let p = pos2(rect.right() - r - t * inner_w, rect.bottom());
            points.push(self.wobble(p, (2 * steps + i) as u64));
        }
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let p = pos2(rect.left(), rect.bottom() - r - t * inner_h);
            points.push(self.wobble(p, (3 * steps + i) as u64));
        }
        points
    }

    fn bubble_path(&self, rect: Rect) -> Option<tiny_skia::Path> {
        if self.hand_drawn {
            render::polyline_path(&self.wobbly_outline(rect), true)
        } else {
            render::rounded_rect_path(rect, self.corner_radius)
        }
    }

    fn spike_points(&self, style: &Style) -> [Pos2; 3] {
        let bubble = self.bubble_rect(style);
        let base_x = bubble.center().x;
        let half = self.spike_size * 0.5;
        [
            self.wobble(pos2(base_x - half, bubble.bottom()), 100),
            self.wobble(self.spike_tip(style), 101),
            self.wobble(pos2(base_x + half, bubble.bottom()), 102),
        ]
    }

    fn outline_color(&self) -> Rgba {
        let darken = |channel: u8| (channel as f32 / 1.2) as u8;
        Rgba([
            darken(self.bubble_color.r()),
            darken(self.bubble_color.g()),
            darken(self.bubble_color.b()),
            self.bubble_color.a(),
        ])
    }
}

impl Shape for TextNote {
    fn bounds(&self, style: &Style) -> Rect {
        if !self.show_bubble {
            return self.text_rect(style);
        }
        let bubble = self.bubble_rect(style);
        if !self.spike_enabled {
            return bubble;
        }
        bubble.union(Rect::from_center_size(
            self.spike_tip(style),
            Vec2::splat(SPIKE_BOUNDS),
        ))
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        self.bounds(style).contains(point)
    }

    fn handles(&self, style: &Style) -> Vec<(Handle, Rect)> {
        let bubble = if self.show_bubble {
            self.bubble_rect(style)
        } else {
            self.text_rect(style)
        };
        [
            Handle::TopLeft,
            Handle::TopRight,
            Handle::BottomLeft,
            Handle::BottomRight,
        ]
        .into_iter()
        .map(|handle| (handle, handle_rect(handle.anchor(bubble))))
        .collect()
    }

    fn move_by(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn resize(&mut self, _handle: Handle, _to: Pos2) {}

    fn geometry(&self) -> Geometry {
        Geometry::Text {
            position: self.position,
            spike_offset: self.spike_offset,
            text: self.text.clone(),
        }
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Text {
                position,
                spike_offset,
                text,
            } => {
                self.position = *position;
                self.spike_offset = *spike_offset;
                self.text.clone_from(text);
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let opacity = style.opacity;
        if self.show_bubble {
            let bubble = self.bubble_rect(style);
            if self.show_shadow {
                let shadow = bubble.translate(Vec2::splat(self.shadow_offset));
                if let Some(path) = self.bubble_path(shadow) {
                    surface.fill_path(&path, self.shadow_color.faded(opacity));
                }
            }
            let fill = self.bubble_color.faded(opacity);
            let outline = self.outline_color().faded(opacity);
            if let Some(path) = self.bubble_path(bubble) {
                surface.fill_path(&path, fill);
                surface.stroke_path(&path, outline, OUTLINE_WIDTH);
            }
            if self.spike_enabled {
                if let Some(path) = render::polyline_path(&self.spike_points(style), true) {
                    surface.fill_path(&path, fill);
                    surface.stroke_path(&path, outline, OUTLINE_WIDTH);
                }
            }
        }

        let block = self.block(style);
        let color = self.text_color(style).faded(opacity);
        let mut baseline = self.position;
        for line in self.text.split('\n') {
            surface.draw_text(line, baseline, style.font_size, style.is_bold(), color);
            baseline.y += block.line_height;
        }
    }
}

pub(crate) fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
