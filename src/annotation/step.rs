use egui::{pos2, Pos2, Rect, Vec2};

use super::{Geometry, Shape};
use crate::geometry::Handle;
use crate::render::{self, Surface};
use crate::style::{Rgba, Style};

/// Numbered circular badge. Steps move but never resize.
#[derive(Clone, Debug, PartialEq)]
pub struct StepBadge {
    pub center: Pos2,
    pub number: u32,
    pub radius: f32,
    pub circle_color: Rgba,
    pub text_color: Rgba,
}

impl StepBadge {
    pub const RADIUS: f32 = 16.0;

    pub fn new(center: Pos2, number: u32, circle_color: Rgba) -> Self {
        Self {
            center,
            number,
            radius: Self::RADIUS,
            circle_color,
            text_color: Rgba::WHITE,
        }
    }

    pub fn label(&self) -> String {
        self.number.to_string()
    }
}

impl Shape for StepBadge {
    fn bounds(&self, _style: &Style) -> Rect {
        Rect::from_center_size(self.center, Vec2::splat(self.radius * 2.0))
    }

    fn hit_test(&self, _style: &Style, point: Pos2) -> bool {
        point.distance_sq(self.center) <= self.radius * self.radius
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        Vec::new()
    }

    fn move_by(&mut self, delta: Vec2) {
        self.center += delta;
    }

    fn resize(&mut self, _handle: Handle, _to: Pos2) {}

    fn geometry(&self) -> Geometry {
        Geometry::Point(self.center)
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Point(center) => {
                self.center = *center;
                true
            }
            _ => false,
        }
    }

    fn paint(&self, style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        if let Some(circle) = render::circle_path(self.center, self.radius) {
            surface.fill_path(&circle, self.circle_color.faded(style.opacity));
        }
        let size = self.radius * 1.2;
        let label = self.label();
        let width = surface.measure_text(&label, size, true);
        // Cap height of roughly 0.7em keeps the digits optically centred.
        let origin = pos2(self.center.x - width * 0.5, self.center.y + size * 0.35);
        surface.draw_text(&label, origin, size, true, self.text_color.faded(style.opacity));
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;

    use super::*;
    use crate::render::Fonts;

    #[test]
    fn hit_is_circular() {
        let step = StepBadge::new(pos2(50.0, 50.0), 3, Rgba::rgb(211, 78, 78));
        let style = Style::default();
        assert!(step.hit_test(&style, pos2(60.0, 60.0)));
        // inside the bounding square but outside the circle
        assert!(step.bounds(&style).contains(pos2(64.0, 64.0)));
        assert!(!step.hit_test(&style, pos2(64.0, 64.0)));
    }

    #[test]
    fn paints_filled_circle() {
        let fonts = Fonts::default();
        let image = image::RgbaImage::from_pixel(60, 60, image::Rgba([255, 255, 255, 255]));
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        let step = StepBadge::new(pos2(30.0, 30.0), 1, Rgba::rgb(211, 78, 78));
        step.paint(&Style::default(), false, &mut surface);
        let out = surface.into_image().expect("image");
        assert_eq!(out.get_pixel(30, 20).0, [211, 78, 78, 255]);
        assert_eq!(out.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }
}
