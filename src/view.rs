use egui::{vec2, Pos2, Vec2};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_STEP: f32 = 1.25;
pub const FIT_PADDING: f32 = 40.0;

/// Maps between view (widget) space and image space:
/// `image = (view - pan) / zoom`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    pan: Vec2,
    fit_mode: bool,
    viewport: Vec2,
    image_size: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            fit_mode: true,
            viewport: Vec2::ZERO,
            image_size: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn is_fit(&self) -> bool {
        self.fit_mode
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn widget_to_image(&self, point: Pos2) -> Pos2 {
        ((point.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn image_to_widget(&self, point: Pos2) -> Pos2 {
        (point.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn set_image_size(&mut self, size: Vec2) {
        self.image_size = size;
    }

    /// Clamps `zoom`; keeps the image point under `anchor` fixed, or re-centres.
    pub fn set_zoom(&mut self, zoom: f32, anchor: Option<Pos2>) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        match anchor {
            Some(anchor) => {
                let under = self.widget_to_image(anchor);
                self.zoom = zoom;
                self.pan = anchor.to_vec2() - under.to_vec2() * zoom;
            }
            None => {
                self.zoom = zoom;
                self.center();
            }
        }
        self.fit_mode = false;
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP, Some(self.viewport_center()));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP, Some(self.viewport_center()));
    }

    pub fn zoom_to_100(&mut self) {
        self.set_zoom(1.0, None);
    }

    /// Largest zoom showing the whole image inside the padded viewport, never above 100%.
    pub fn zoom_to_fit(&mut self, viewport: Vec2, image_size: Vec2) {
        self.viewport = viewport;
        self.image_size = image_size;
        self.fit_mode = true;
        self.zoom = fit_zoom(viewport, image_size);
        self.center();
    }

    pub fn refit(&mut self) {
        self.zoom_to_fit(self.viewport, self.image_size);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
        self.fit_mode = false;
    }

    pub fn resize_viewport(&mut self, viewport: Vec2) {
        if viewport == self.viewport {
            return;
        }
        if self.fit_mode {
            self.zoom_to_fit(viewport, self.image_size);
            return;
        }
        let focus = self.widget_to_image(self.viewport_center());
        self.viewport = viewport;
        self.pan = self.viewport_center().to_vec2() - focus.to_vec2() * self.zoom;
    }

    fn viewport_center(&self) -> Pos2 {
        (self.viewport * 0.5).to_pos2()
    }

    fn center(&mut self) {
        self.pan = (self.viewport - self.image_size * self.zoom) * 0.5;
    }
}

fn fit_zoom(viewport: Vec2, image_size: Vec2) -> f32 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return 1.0;
    }
    let room = vec2(
        (viewport.x - FIT_PADDING).max(1.0),
        (viewport.y - FIT_PADDING).max(1.0),
    );
    (room.x / image_size.x)
        .min(room.y / image_size.y)
        .clamp(MIN_ZOOM, 1.0)
}
