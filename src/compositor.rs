use egui::{pos2, Rect};
use image::RgbaImage;
use tiny_skia::{BlendMode, FillRule, PathBuilder};

use crate::annotation::{Annotation, AnnotationId};
use crate::error::Result;
use crate::render::{self, Fonts, Surface};
use crate::style::Rgba;

const SELECTION: Rgba = Rgba::rgb(80, 144, 208);
const CROP_SHADE: Rgba = Rgba::rgba(0, 0, 0, 128);
const CARET_WIDTH: f32 = 2.0;
const SPIKE_HANDLE_RADIUS: f32 = 5.0;

/// Everything the compositor reads for one frame or export.
pub struct Layers<'a> {
    pub image: &'a RgbaImage,
    pub generation: u64,
    pub annotations: &'a [Annotation],
    pub temp: &'a [Annotation],
    pub pending_crop: Option<Rect>,
    pub caret: Option<AnnotationId>,
    /// Live view chrome. Exports leave this off and stop after the spotlight pass.
    pub overlays: bool,
}

/// Flattens the layers in paint order: base, pixel effects, annotations,
/// spotlight overlays, gestures in progress, selection handles, caret.
pub fn compose(layers: &Layers<'_>, fonts: &Fonts) -> Result<RgbaImage> {
    let mut surface = Surface::from_image(layers.image, fonts)?;
    let show_selection = layers.overlays;

    for annotation in layers.annotations.iter().filter(|a| a.has_pixel_effect()) {
        annotation.paint_effect(layers.image, layers.generation, &mut surface);
    }

    for annotation in layers.annotations.iter().filter(|a| !a.is_spotlight()) {
        annotation.paint_as(annotation.selected && show_selection, &mut surface);
    }

    for annotation in layers.annotations {
        if let Some(spot) = annotation.as_spotlight() {
            spot.paint_overlay(&mut surface);
            annotation.paint_as(annotation.selected && show_selection, &mut surface);
        }
    }

    if !layers.overlays {
        return surface.into_image();
    }

    for annotation in layers.temp {
        annotation.paint_effect(layers.image, layers.generation, &mut surface);
        if let Some(spot) = annotation.as_spotlight() {
            spot.paint_overlay(&mut surface);
        }
        annotation.paint_as(false, &mut surface);
    }
    if let Some(crop) = layers.pending_crop {
        paint_crop_overlay(&mut surface, crop);
    }

    if let Some(selected) = layers.annotations.iter().find(|a| a.selected) {
        paint_selection(&mut surface, selected);
    }

    if let Some(id) = layers.caret {
        if let Some(annotation) = layers.annotations.iter().find(|a| a.id == id) {
            paint_caret(&mut surface, annotation);
        }
    }

    surface.into_image()
}

fn paint_crop_overlay(surface: &mut Surface<'_>, crop: Rect) {
    let bounds = surface.bounds();
    let (Some(full), Some(hole)) = (
        tiny_skia::Rect::from_ltrb(0.0, 0.0, bounds.width(), bounds.height()),
        tiny_skia::Rect::from_ltrb(crop.left(), crop.top(), crop.right(), crop.bottom()),
    ) else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.push_rect(full);
    pb.push_rect(hole);
    if let Some(shade) = pb.finish() {
        surface.fill_path_with(&shade, CROP_SHADE, FillRule::EvenOdd, BlendMode::SourceOver);
    }
    if let Some(border) = render::rect_path(crop) {
        surface.stroke_path_with(&border, Rgba::WHITE, 2.0, Some(&[6.0, 4.0]), BlendMode::SourceOver);
    }
}

fn paint_selection(surface: &mut Surface<'_>, annotation: &Annotation) {
    if let Some(outline) = render::rect_path(annotation.bounds()) {
        surface.stroke_path(&outline, SELECTION, 1.0);
    }
    for handle in annotation.resize_handles() {
        if let Some(path) = render::rect_path(handle) {
            surface.fill_path(&path, Rgba::WHITE);
            surface.stroke_path(&path, SELECTION, 1.0);
        }
    }
    if let Some(note) = annotation.as_text() {
        if note.show_bubble && note.spike_enabled {
            let tip = note.spike_tip(&annotation.style);
            if let Some(dot) = render::circle_path(tip, SPIKE_HANDLE_RADIUS) {
                surface.fill_path(&dot, Rgba::WHITE);
                surface.stroke_path(&dot, SELECTION, 2.0);
            }
        }
    }
}

fn paint_caret(surface: &mut Surface<'_>, annotation: &Annotation) {
    let Some(note) = annotation.as_text() else {
        return;
    };
    let style = &annotation.style;
    let (top, height) = note.caret_anchor(style);
    let x = top.x + surface.measure_text(note.last_line(), style.font_size, style.is_bold());
    if let Some(line) = render::segment_path(pos2(x, top.y), pos2(x, top.y + height)) {
        surface.stroke_path(&line, note.text_color(style), CARET_WIDTH);
    }
}
