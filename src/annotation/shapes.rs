use egui::{pos2, vec2, Pos2, Rect, Vec2};

use super::{Geometry, Shape};
use crate::geometry::{self, box_handles, distance_to_segment, handle_rect, Handle};
use crate::render::{self, Surface};
use crate::style::{Rgba, Style};

const MIN_BOX_TOLERANCE: f32 = 5.0;
const MIN_LINE_TOLERANCE: f32 = 8.0;
const RULER_PADDING: f32 = 20.0;
const RULER_TOLERANCE: f32 = 8.0;
const RULER_DOT_RADIUS: f32 = 4.0;
const RULER_LABEL_SIZE: f32 = 12.0;

fn tagged_box_handles(rect: Rect) -> Vec<(Handle, Rect)> {
    Handle::ALL.into_iter().zip(box_handles(rect)).collect()
}

fn line_handles(start: Pos2, end: Pos2) -> Vec<(Handle, Rect)> {
    vec![
        (Handle::TopLeft, handle_rect(start)),
        (Handle::BottomRight, handle_rect(end)),
    ]
}

/// Handles on the left/top half of the box drive the start point.
fn drives_start(handle: Handle) -> bool {
    matches!(
        handle,
        Handle::TopLeft | Handle::Top | Handle::Left | Handle::BottomLeft
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub rect: Rect,
}

impl RectShape {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: geometry::normalize(rect),
        }
    }
}

impl Shape for RectShape {
    fn bounds(&self, style: &Style) -> Rect {
        self.rect.expand(style.stroke_width * 0.5)
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        let tolerance = style.stroke_width.max(MIN_BOX_TOLERANCE);
        if !self.rect.expand(tolerance).contains(point) {
            return false;
        }
        if style.fill_color.is_some() {
            return true;
        }
        let inner = self.rect.shrink(tolerance);
        !(inner.is_positive() && inner.contains(point))
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        tagged_box_handles(self.rect)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        self.rect = geometry::resize_rect(self.rect, handle, to);
    }

    fn geometry(&self) -> Geometry {
        Geometry::Rect(self.rect)
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Rect(rect) => {
                self.rect = geometry::normalize(*rect);
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let Some(path) = render::rect_path(self.rect) else {
            return;
        };
        if let Some(fill) = style.fill() {
            surface.fill_path(&path, fill);
        }
        surface.stroke_path(&path, style.stroke(), style.stroke_width);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EllipseShape {
    pub rect: Rect,
}

impl EllipseShape {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: geometry::normalize(rect),
        }
    }
}

impl Shape for EllipseShape {
    fn bounds(&self, style: &Style) -> Rect {
        self.rect.expand(style.stroke_width * 0.5)
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        let a = self.rect.width() * 0.5;
        let b = self.rect.height() * 0.5;
        if a <= 0.0 || b <= 0.0 {
            return false;
        }
        let center = self.rect.center();
        let nx = (point.x - center.x) / a;
        let ny = (point.y - center.y) / b;
        let distance = (nx * nx + ny * ny).sqrt();
        let tolerance = style.stroke_width.max(MIN_BOX_TOLERANCE) / a.min(b);
        if style.fill_color.is_some() {
            distance <= 1.0 + tolerance
        } else {
            (distance - 1.0).abs() <= tolerance
        }
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        tagged_box_handles(self.rect)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        self.rect = geometry::resize_rect(self.rect, handle, to);
    }

    fn geometry(&self) -> Geometry {
        Geometry::Rect(self.rect)
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Rect(rect) => {
                self.rect = geometry::normalize(*rect);
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let Some(path) = render::ellipse_path(self.rect) else {
            return;
        };
        if let Some(fill) = style.fill() {
            surface.fill_path(&path, fill);
        }
        surface.stroke_path(&path, style.stroke(), style.stroke_width);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrowShape {
    pub start: Pos2,
    pub end: Pos2,
}

impl ArrowShape {
    pub fn new(start: Pos2, end: Pos2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Tip, left and right corners of the head. `None` for near-zero length.
    pub fn head(&self, size: f32) -> Option<[Pos2; 3]> {
        let delta = self.end - self.start;
        let length = delta.length();
        if length < 1.0 {
            return None;
        }
        let dir = delta / length;
        let perp = vec2(-dir.y, dir.x);
        let base = self.end - dir * size;
        Some([
            self.end,
            base + perp * size * 0.5,
            base - perp * size * 0.5,
        ])
    }
}

impl Shape for ArrowShape {
    fn bounds(&self, style: &Style) -> Rect {
        Rect::from_two_pos(self.start, self.end).expand(style.arrowhead_size + style.stroke_width)
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        distance_to_segment(point, self.start, self.end)
            <= style.stroke_width.max(MIN_LINE_TOLERANCE)
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        line_handles(self.start, self.end)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        if drives_start(handle) {
            self.start = to;
        } else {
            self.end = to;
        }
    }

    fn geometry(&self) -> Geometry {
        Geometry::Segment {
            start: self.start,
            end: self.end,
        }
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Segment { start, end } => {
                self.start = *start;
                self.end = *end;
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let color = style.stroke();
        let head = self.head(style.arrowhead_size);
        // Stop the shaft at the head base so round caps stay hidden.
        let shaft_end = match head {
            Some([_, left, right]) => pos2((left.x + right.x) * 0.5, (left.y + right.y) * 0.5),
            None => self.end,
        };
        if let Some(path) = render::segment_path(self.start, shaft_end) {
            surface.stroke_path(&path, color, style.stroke_width);
        }
        if let Some(points) = head {
            if let Some(path) = render::polyline_path(&points, true) {
                surface.fill_path(&path, color);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulerShape {
    pub start: Pos2,
    pub end: Pos2,
}

impl RulerShape {
    pub fn new(start: Pos2, end: Pos2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    pub fn label(&self) -> String {
        format!("{:.0}px", self.length())
    }
}

impl Shape for RulerShape {
    fn bounds(&self, _style: &Style) -> Rect {
        Rect::from_two_pos(self.start, self.end).expand(RULER_PADDING)
    }

    fn hit_test(&self, _style: &Style, point: Pos2) -> bool {
        distance_to_segment(point, self.start, self.end) <= RULER_TOLERANCE
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        line_handles(self.start, self.end)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        if drives_start(handle) {
            self.start = to;
        } else {
            self.end = to;
        }
    }

    fn geometry(&self) -> Geometry {
        Geometry::Segment {
            start: self.start,
            end: self.end,
        }
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Segment { start, end } => {
                self.start = *start;
                self.end = *end;
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let color = style.stroke();
        if let Some(path) = render::segment_path(self.start, self.end) {
            surface.stroke_path(&path, color, style.stroke_width);
        }
        for point in [self.start, self.end] {
            if let Some(dot) = render::circle_path(point, RULER_DOT_RADIUS) {
                surface.fill_path(&dot, color);
            }
        }

        let label = self.label();
        let width = surface.measure_text(&label, RULER_LABEL_SIZE, false);
        let mid = self.start + (self.end - self.start) * 0.5;
        let plate = Rect::from_center_size(mid, vec2(width + 10.0, RULER_LABEL_SIZE + 8.0));
        if let Some(path) = render::rounded_rect_path(plate, 4.0) {
            surface.fill_path(&path, Rgba::rgba(0, 0, 0, 180));
        }
        let baseline = pos2(mid.x - width * 0.5, mid.y + RULER_LABEL_SIZE * 0.35);
        surface.draw_text(&label, baseline, RULER_LABEL_SIZE, false, Rgba::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2, Rect};

    use super::*;

    fn style_with_fill(fill: bool) -> Style {
        let mut style = Style::default();
        if fill {
            style.fill_color = Some(Rgba::WHITE);
        }
        style
    }

    #[test]
    fn unfilled_rect_hits_border_only() {
        let shape = RectShape::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0)));
        let style = style_with_fill(false);
        assert!(shape.hit_test(&style, pos2(2.0, 50.0)));
        assert!(shape.hit_test(&style, pos2(-4.0, 50.0)));
        assert!(!shape.hit_test(&style, pos2(50.0, 50.0)));
        assert!(shape.hit_test(&style_with_fill(true), pos2(50.0, 50.0)));
    }

    #[test]
    fn ellipse_hits_ring_within_tolerance() {
        let shape = EllipseShape::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(200.0, 100.0)));
        let style = style_with_fill(false);
        assert!(shape.hit_test(&style, pos2(200.0, 50.0)));
        assert!(shape.hit_test(&style, pos2(100.0, 2.0)));
        assert!(!shape.hit_test(&style, pos2(100.0, 50.0)));
        assert!(shape.hit_test(&style_with_fill(true), pos2(100.0, 50.0)));
    }

    #[test]
    fn degenerate_ellipse_never_hits() {
        let shape = EllipseShape::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(0.0, 100.0)));
        assert!(!shape.hit_test(&Style::default(), pos2(0.0, 50.0)));
    }

    #[test]
    fn arrow_bounds_include_head_padding() {
        let arrow = ArrowShape::new(pos2(10.0, 10.0), pos2(110.0, 10.0));
        let bounds = arrow.bounds(&Style::default());
        assert_eq!(bounds.min, pos2(-5.0, -5.0));
        assert_eq!(bounds.max, pos2(125.0, 25.0));
    }

    #[test]
    fn arrow_head_is_perpendicular_triangle() {
        let arrow = ArrowShape::new(pos2(0.0, 0.0), pos2(100.0, 0.0));
        let [tip, left, right] = arrow.head(12.0).expect("head");
        assert_eq!(tip, pos2(100.0, 0.0));
        assert_eq!(left, pos2(88.0, 6.0));
        assert_eq!(right, pos2(88.0, -6.0));
        assert!(ArrowShape::new(pos2(5.0, 5.0), pos2(5.2, 5.0)).head(12.0).is_none());
    }

    #[test]
    fn arrow_handles_map_to_endpoints() {
        let mut arrow = ArrowShape::new(pos2(0.0, 0.0), pos2(100.0, 0.0));
        arrow.resize(Handle::TopLeft, pos2(-10.0, 5.0));
        arrow.resize(Handle::BottomRight, pos2(90.0, 40.0));
        assert_eq!(arrow.start, pos2(-10.0, 5.0));
        assert_eq!(arrow.end, pos2(90.0, 40.0));
        arrow.resize(Handle::Right, pos2(1.0, 1.0));
        assert_eq!(arrow.end, pos2(1.0, 1.0));
    }

    #[test]
    fn ruler_labels_pixel_length() {
        let ruler = RulerShape::new(pos2(0.0, 0.0), pos2(30.0, 40.0));
        assert_eq!(ruler.label(), "50px");
        assert!(ruler.hit_test(&Style::default(), pos2(15.0, 25.0)));
        let mut moved = ruler.clone();
        moved.move_by(vec2(1.0, 1.0));
        assert_eq!(moved.start, pos2(1.0, 1.0));
    }
}
