use std::cell::RefCell;
use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;
use tiny_skia::{BlendMode, FillRule, PathBuilder};

use super::{Geometry, Shape};
use crate::geometry::{self, box_handles, Handle};
use crate::imaging::{self, BlurMode, InpaintAlgorithm, PixelRect};
use crate::render::{self, Surface};
use crate::style::{Rgba, Style};

const SPOTLIGHT_BAND: f32 = 10.0;
const SPOTLIGHT_BORDER: Rgba = Rgba::rgba(255, 255, 255, 180);
const BLUR_BORDER: Rgba = Rgba::rgba(128, 128, 255, 150);
const INPAINT_BORDER: Rgba = Rgba::rgba(255, 100, 100, 150);
const INPAINT_TINT: Rgba = Rgba::rgba(255, 100, 100, 30);
const DASH: [f32; 2] = [6.0, 4.0];
const DOT: [f32; 2] = [2.0, 3.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    region: PixelRect,
    params: (u8, u32),
    generation: u64,
}

/// Lazily computed patch for a region of the base image. Never part of the
/// model: equality ignores it and a stale key recomputes.
#[derive(Clone, Debug, Default)]
pub struct PixelCache {
    slot: RefCell<Option<(CacheKey, Arc<RgbaImage>)>>,
}

impl PartialEq for PixelCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl PixelCache {
    pub fn invalidate(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_filled(&self) -> bool {
        self.slot.borrow().is_some()
    }

    fn get_or_compute(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Option<RgbaImage>,
    ) -> Option<Arc<RgbaImage>> {
        if let Some((cached, patch)) = self.slot.borrow().as_ref() {
            if *cached == key {
                return Some(Arc::clone(patch));
            }
        }
        let patch = Arc::new(compute()?);
        *self.slot.borrow_mut() = Some((key, Arc::clone(&patch)));
        Some(patch)
    }
}

fn tagged_box_handles(rect: Rect) -> Vec<(Handle, Rect)> {
    Handle::ALL.into_iter().zip(box_handles(rect)).collect()
}

fn set_rect(target: &mut Rect, geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Rect(rect) => {
            *target = geometry::normalize(*rect);
            true
        }
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spotlight {
    pub rect: Rect,
    pub is_circle: bool,
    /// Alpha of the outside overlay in [0, 1].
    pub darkness: f32,
}

impl Spotlight {
    pub fn new(rect: Rect, is_circle: bool) -> Self {
        Self {
            rect: geometry::normalize(rect),
            is_circle,
            darkness: 0.6,
        }
    }

    fn hole(&self, pb: &mut PathBuilder) {
        let Some(r) = tiny_skia::Rect::from_ltrb(
            self.rect.left(),
            self.rect.top(),
            self.rect.right(),
            self.rect.bottom(),
        ) else {
            return;
        };
        if self.is_circle {
            pb.push_oval(r);
        } else {
            pb.push_rect(r);
        }
    }

    /// Darkens everything on the surface outside the spotlight shape.
    pub fn paint_overlay(&self, surface: &mut Surface<'_>) {
        let bounds = surface.bounds();
        let Some(full) = tiny_skia::Rect::from_ltrb(0.0, 0.0, bounds.width(), bounds.height()) else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.push_rect(full);
        self.hole(&mut pb);
        let Some(path) = pb.finish() else {
            return;
        };
        let alpha = (255.0 * self.darkness.clamp(0.0, 1.0)).round() as u8;
        surface.fill_path_with(
            &path,
            Rgba::BLACK.with_alpha(alpha),
            FillRule::EvenOdd,
            BlendMode::SourceOver,
        );
    }
}

impl Shape for Spotlight {
    fn bounds(&self, _style: &Style) -> Rect {
        self.rect
    }

    fn hit_test(&self, _style: &Style, point: Pos2) -> bool {
        self.rect.expand(SPOTLIGHT_BAND).contains(point)
            && !self.rect.shrink(SPOTLIGHT_BAND).contains(point)
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
        set_rect(&mut self.rect, geometry)
    }

    /// Border only; the darkening is a separate compositor pass.
    fn paint(&self, _style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        let path = if self.is_circle {
            render::ellipse_path(self.rect)
        } else {
            render::rect_path(self.rect)
        };
        if let Some(path) = path {
            surface.stroke_path_with(&path, SPOTLIGHT_BORDER, 2.0, Some(&DASH), BlendMode::SourceOver);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlurRegion {
    pub rect: Rect,
    pub mode: BlurMode,
    pub intensity: u32,
    cache: PixelCache,
}

impl BlurRegion {
    pub const DEFAULT_INTENSITY: u32 = 25;

    pub fn new(rect: Rect, mode: BlurMode, intensity: u32) -> Self {
        Self {
            rect: geometry::normalize(rect),
            mode,
            intensity: intensity.max(1),
            cache: PixelCache::default(),
        }
    }

    pub fn set_mode(&mut self, mode: BlurMode) {
        self.mode = mode;
        self.cache.invalidate();
    }

    pub fn set_intensity(&mut self, intensity: u32) {
        self.intensity = intensity.max(1);
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    fn compute(&self, source: &RgbaImage, region: PixelRect) -> Option<RgbaImage> {
        match self.mode {
            BlurMode::Pixelate => Some(imaging::pixelate(source, region, self.intensity)),
            BlurMode::Blur => match imaging::frosted_blur(source, region, self.intensity) {
                Ok(patch) => Some(patch),
                Err(err) => {
                    log::warn!("blur unavailable ({err}), pixelating instead");
                    Some(imaging::pixelate(source, region, self.intensity))
                }
            },
        }
    }

    /// Draws the blurred or pixelated patch of `source` at the region.
    pub fn paint_effect(&self, source: &RgbaImage, generation: u64, surface: &mut Surface<'_>) {
        let Some(region) = PixelRect::clamped(self.rect, source.width(), source.height()) else {
            return;
        };
        let mode = match self.mode {
            BlurMode::Blur => 0,
            BlurMode::Pixelate => 1,
        };
        let key = CacheKey {
            region,
            params: (mode, self.intensity),
            generation,
        };
        let Some(patch) = self.cache.get_or_compute(key, || self.compute(source, region)) else {
            return;
        };
        if let Err(err) = surface.draw_image(&patch, region.x as i32, region.y as i32) {
            log::warn!("failed to draw blur patch: {err}");
        }
    }
}

impl Shape for BlurRegion {
    fn bounds(&self, _style: &Style) -> Rect {
        self.rect
    }

    fn hit_test(&self, _style: &Style, point: Pos2) -> bool {
        self.rect.contains(point)
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        tagged_box_handles(self.rect)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
        self.cache.invalidate();
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        self.rect = geometry::resize_rect(self.rect, handle, to);
        self.cache.invalidate();
    }

    fn geometry(&self) -> Geometry {
        Geometry::Rect(self.rect)
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        self.cache.invalidate();
        set_rect(&mut self.rect, geometry)
    }

    fn paint(&self, _style: &Style, selected: bool, surface: &mut Surface<'_>) {
        if !selected {
            return;
        }
        if let Some(path) = render::rect_path(self.rect) {
            surface.stroke_path_with(&path, BLUR_BORDER, 2.0, Some(&DOT), BlendMode::SourceOver);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InpaintRegion {
    pub rect: Rect,
    pub algorithm: InpaintAlgorithm,
    pub radius: u32,
    cache: PixelCache,
}

impl InpaintRegion {
    pub fn new(rect: Rect, algorithm: InpaintAlgorithm, radius: u32) -> Self {
        Self {
            rect: geometry::normalize(rect),
            algorithm,
            radius: radius.max(1),
            cache: PixelCache::default(),
        }
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    /// Full image with the region reconstructed, or `None` if nothing changes.
    pub fn apply(&self, source: &RgbaImage) -> Option<RgbaImage> {
        let region = PixelRect::clamped(self.rect, source.width(), source.height())?;
        imaging::inpaint(source, region, self.algorithm, self.radius)
    }

    /// Live preview of the reconstruction while the region is still a gesture.
    pub fn paint_effect(&self, source: &RgbaImage, generation: u64, surface: &mut Surface<'_>) {
        let Some(region) = PixelRect::clamped(self.rect, source.width(), source.height()) else {
            return;
        };
        let algorithm = match self.algorithm {
            InpaintAlgorithm::Telea => 0,
            InpaintAlgorithm::NavierStokes => 1,
        };
        let key = CacheKey {
            region,
            params: (algorithm, self.radius),
            generation,
        };
        let patch = self.cache.get_or_compute(key, || {
            let full = imaging::inpaint(source, region, self.algorithm, self.radius)?;
            Some(imaging::crop(&full, region))
        });
        if let Some(patch) = patch {
            if let Err(err) = surface.draw_image(&patch, region.x as i32, region.y as i32) {
                log::warn!("failed to draw inpaint preview: {err}");
            }
        }
    }
}

impl Shape for InpaintRegion {
    fn bounds(&self, _style: &Style) -> Rect {
        self.rect
    }

    fn hit_test(&self, _style: &Style, point: Pos2) -> bool {
        self.rect.contains(point)
    }

    fn handles(&self, _style: &Style) -> Vec<(Handle, Rect)> {
        tagged_box_handles(self.rect)
    }

    fn move_by(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
        self.cache.invalidate();
    }

    fn resize(&mut self, handle: Handle, to: Pos2) {
        self.rect = geometry::resize_rect(self.rect, handle, to);
        self.cache.invalidate();
    }

    fn geometry(&self) -> Geometry {
        Geometry::Rect(self.rect)
    }

    fn set_geometry(&mut self, geometry: &Geometry) -> bool {
        self.cache.invalidate();
        set_rect(&mut self.rect, geometry)
    }

    fn paint(&self, _style: &Style, _selected: bool, surface: &mut Surface<'_>) {
        if let Some(path) = render::rect_path(self.rect) {
            surface.fill_path(&path, INPAINT_TINT);
            surface.stroke_path_with(&path, INPAINT_BORDER, 2.0, Some(&DASH), BlendMode::SourceOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2, Rect};
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;
    use crate::render::Fonts;

    fn checker(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Pixel([0, 0, 0, 255])
            } else {
                Pixel([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn spotlight_hits_only_near_border() {
        let spot = Spotlight::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0)), false);
        let style = Style::default();
        assert!(spot.hit_test(&style, pos2(5.0, 50.0)));
        assert!(spot.hit_test(&style, pos2(-5.0, 50.0)));
        assert!(!spot.hit_test(&style, pos2(50.0, 50.0)));
    }

    #[test]
    fn spotlight_overlay_leaves_hole_bright() {
        let fonts = Fonts::default();
        let image = RgbaImage::from_pixel(40, 40, Pixel([255, 255, 255, 255]));
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        let spot = Spotlight::new(Rect::from_min_max(pos2(10.0, 10.0), pos2(30.0, 30.0)), false);
        spot.paint_overlay(&mut surface);
        let out = surface.into_image().expect("image");
        assert_eq!(out.get_pixel(20, 20).0, [255, 255, 255, 255]);
        let dark = out.get_pixel(2, 2).0;
        assert!(dark[0] < 120 && dark[0] > 90, "got {dark:?}");
    }

    #[test]
    fn blur_cache_fills_then_invalidates_on_move() {
        let fonts = Fonts::default();
        let image = checker(32);
        let mut blur = BlurRegion::new(
            Rect::from_min_max(pos2(4.0, 4.0), pos2(28.0, 28.0)),
            BlurMode::Blur,
            25,
        );
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        blur.paint_effect(&image, 0, &mut surface);
        assert!(blur.cache().is_filled());
        let out = surface.into_image().expect("image");
        let center = out.get_pixel(16, 16).0[0];
        assert!(center > 40 && center < 215, "center {center}");
        assert_eq!(out.get_pixel(1, 1), image.get_pixel(1, 1));

        blur.move_by(vec2(1.0, 0.0));
        assert!(!blur.cache().is_filled());
    }

    #[test]
    fn pixelate_produces_uniform_blocks() {
        let fonts = Fonts::default();
        let image = RgbaImage::from_fn(16, 16, |x, _| Pixel([(x * 16) as u8, 0, 0, 255]));
        let blur = BlurRegion::new(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(16.0, 16.0)),
            BlurMode::Pixelate,
            8,
        );
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        blur.paint_effect(&image, 0, &mut surface);
        let out = surface.into_image().expect("image");
        assert_eq!(out.get_pixel(0, 0), out.get_pixel(7, 7));
        assert_ne!(out.get_pixel(0, 0), out.get_pixel(8, 0));
    }

    #[test]
    fn inpaint_fills_region_from_surroundings() {
        let mut image = RgbaImage::from_pixel(20, 20, Pixel([50, 100, 150, 255]));
        for y in 8..12 {
            for x in 8..12 {
                image.put_pixel(x, y, Pixel([255, 0, 0, 255]));
            }
        }
        let region = InpaintRegion::new(
            Rect::from_min_max(pos2(8.0, 8.0), pos2(12.0, 12.0)),
            InpaintAlgorithm::Telea,
            5,
        );
        let healed = region.apply(&image).expect("healed");
        assert_eq!(healed.get_pixel(10, 10).0, [50, 100, 150, 255]);
    }

    #[test]
    fn cache_is_ignored_by_equality() {
        let fonts = Fonts::default();
        let image = checker(16);
        let a = BlurRegion::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(8.0, 8.0)), BlurMode::Pixelate, 4);
        let b = a.clone();
        let mut surface = Surface::from_image(&image, &fonts).expect("surface");
        a.paint_effect(&image, 0, &mut surface);
        assert_eq!(a, b);
    }
}
