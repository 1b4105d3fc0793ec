use egui::{pos2, Pos2, Rect, Vec2};
use tiny_skia::BlendMode;

use super::{Geometry, Shape};
use crate::geometry::{distance_to_segment, handle_rect, Handle};
use crate::render::{self, Surface};
use crate::style::{Rgba, Style};

const MIN_PATH_TOLERANCE: f32 = 8.0;
const LOCK_DISTANCE: f32 = 20.0;
const LOCK_THRESHOLD_DEG: f32 = 15.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisLock {
    #[default]
    None,
    Horizontal,
    Vertical,
}

fn path_bounds(points: &[Pos2], style: &Style) -> Rect {
    let Some(first) = points.first() else {
        return Rect::NOTHING;
    };
    let rect = points
        .iter()
        .fold(Rect::from_min_max(*first, *first), |rect, p| {
            rect.union(Rect::from_min_max(*p, *p))
        });
    rect.expand(style.stroke_width)
}

fn path_hit(points: &[Pos2], style: &Style, point: Pos2) -> bool {
    let tolerance = style.stroke_width.max(MIN_PATH_TOLERANCE);
    points
        .windows(2)
        .any(|pair| distance_to_segment(point, pair[0], pair[1]) <= tolerance)
}

fn path_handles(bounds: Rect) -> Vec<(Handle, Rect)> {
    if !bounds.is_positive() {
        return Vec::new();
    }
    [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ]
    .into_iter()
    .map(|handle| (handle, handle_rect(handle.anchor(bounds))))
    .collect()
}

fn translate(points: &mut [Pos2], delta: Vec2) {
    for p in points {
        *p += delta;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FreehandPath {
    pub points: Vec<Pos2>,
}

impl FreehandPath {
    pub fn new(points: Vec<Pos2>) -> Self {
        Self { points }
    }

    pub fn add_point(&mut self, point: Pos2) {
        self.points.push(point);
    }
}

impl Shape for FreehandPath {
    fn bounds(&self, style: &Style) -> Rect {
        path_bounds(&self.points, style)
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        path_hit(&self.points, style, point)
    }

    fn handles(&self, style: &Style) -> Vec<(Handle, Rect)> {
        path_handles(self.bounds(style))
    }

    fn move_by(&mut self, delta: Vec2) {
        translate(&mut self.points, delta);
    }

    // Paths only move.
    fn resize(&mut self, _handle: Handle, _to: Pos2) {}

    fn geometry(&self) -> Geometry {
        Geometry::Path {
            points: self.points.clone(),
            axis_lock: AxisLock::None,
        }
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Path { points, .. } => {
                self.points.clone_from(points);
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        if let Some(path) = render::polyline_path(&self.points, false) {
            surface.stroke_path(&path, style.stroke(), style.stroke_width);
        }
    }
}

/// Marker stroke tinted with multiply blending.
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightPath {
    pub points: Vec<Pos2>,
    pub axis_lock: AxisLock,
}

impl HighlightPath {
    pub const COLOR: Rgba = Rgba::rgb(255, 255, 0);
    pub const WIDTH: f32 = 20.0;

    pub fn new(start: Pos2) -> Self {
        Self {
            points: vec![start],
            axis_lock: AxisLock::None,
        }
    }

    pub fn default_style() -> Style {
        Style::default().with_stroke(Self::COLOR, Self::WIDTH)
    }

    pub fn axis_locked(&self) -> bool {
        self.axis_lock != AxisLock::None
    }

    /// Appends `point`, deciding the lock axis once early in the gesture and
    /// collapsing locked strokes to a straight two-point segment.
    pub fn add_point(&mut self, point: Pos2) {
        let Some(&start) = self.points.first() else {
            self.points.push(point);
            return;
        };
        let delta = point - start;

        if self.axis_lock == AxisLock::None && self.points.len() < 3 && delta.length() > LOCK_DISTANCE
        {
            let angle = delta.y.abs().atan2(delta.x.abs()).to_degrees();
            if angle < LOCK_THRESHOLD_DEG {
                self.axis_lock = AxisLock::Horizontal;
            } else if angle > 90.0 - LOCK_THRESHOLD_DEG {
                self.axis_lock = AxisLock::Vertical;
            }
        }

        let point = match self.axis_lock {
            AxisLock::Horizontal => pos2(point.x, start.y),
            AxisLock::Vertical => pos2(start.x, point.y),
            AxisLock::None => point,
        };

        if self.axis_locked() {
            self.points.truncate(1);
            self.points.push(point);
        } else {
            self.points.push(point);
        }
    }
}

impl Shape for HighlightPath {
    fn bounds(&self, style: &Style) -> Rect {
        path_bounds(&self.points, style)
    }

    fn hit_test(&self, style: &Style, point: Pos2) -> bool {
        path_hit(&self.points, style, point)
    }

    fn handles(&self, style: &Style) -> Vec<(Handle, Rect)> {
        path_handles(self.bounds(style))
    }

    fn move_by(&mut self, delta: Vec2) {
        translate(&mut self.points, delta);
    }

    fn resize(&mut self, _handle: Handle, _to: Pos2) {}

    fn geometry(&self) -> Geometry {
        Geometry::Path {
            points: self.points.clone(),
            axis_lock: self.axis_lock,
        }
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Path { points, axis_lock } => {
                self.points.clone_from(points);
                self.axis_lock = *axis_lock;
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        if let Some(path) = render::polyline_path(&self.points, false) {
            surface.stroke_path_with(
                &path,
                style.stroke(),
                style.stroke_width,
                None,
                BlendMode::Multiply,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn shallow_stroke_locks_horizontal() {
        let mut path = HighlightPath::new(pos2(0.0, 0.0));
        path.add_point(pos2(100.0, 6.0));
        assert_eq!(path.axis_lock, AxisLock::Horizontal);
        assert_eq!(path.points, vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]);
        path.add_point(pos2(140.0, 30.0));
        assert_eq!(path.points, vec![pos2(0.0, 0.0), pos2(140.0, 0.0)]);
    }

    #[test]
    fn steep_stroke_locks_vertical() {
        let mut path = HighlightPath::new(pos2(10.0, 10.0));
        path.add_point(pos2(13.0, 80.0));
        assert_eq!(path.axis_lock, AxisLock::Vertical);
        assert_eq!(path.points[1], pos2(10.0, 80.0));
    }

    #[test]
    fn diagonal_stroke_stays_free_and_lock_window_closes() {
        let mut path = HighlightPath::new(pos2(0.0, 0.0));
        path.add_point(pos2(5.0, 5.0));
        path.add_point(pos2(30.0, 30.0));
        path.add_point(pos2(60.0, 62.0));
        assert_eq!(path.axis_lock, AxisLock::None);
        // three points recorded, so a later flat segment no longer locks
        path.add_point(pos2(200.0, 62.0));
        assert!(!path.axis_locked());
        assert_eq!(path.points.len(), 5);
    }

    #[test]
    fn freehand_hit_uses_segment_distance() {
        let path = FreehandPath::new(vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]);
        let style = Style::default();
        assert!(path.hit_test(&style, pos2(50.0, 7.0)));
        assert!(!path.hit_test(&style, pos2(50.0, 9.0)));
    }

    #[test]
    fn bounds_pad_by_stroke_width() {
        let mut path = FreehandPath::new(vec![pos2(10.0, 10.0)]);
        path.add_point(pos2(20.0, 30.0));
        let style = Style::default().with_stroke(Rgba::BLACK, 4.0);
        let bounds = path.bounds(&style);
        assert_eq!(bounds, Rect::from_min_max(pos2(6.0, 6.0), pos2(24.0, 34.0)));
        path.move_by(vec2(1.0, 1.0));
        assert_eq!(path.points[0], pos2(11.0, 11.0));
        assert!(FreehandPath::default().handles(&style).is_empty());
    }
}
