use egui::{RichText, Slider, Ui};
use snapnote::annotation::TextNote;
use snapnote::imaging::BlurMode;
use snapnote::style::{FontWeight, Style};
use snapnote::Canvas;

use crate::theme::AppTheme;

/// Copies onto `target` only the fields that differ between `before` and
/// `after`, so a panel edit never clobbers the rest of a selection's style.
pub fn merge_changed(target: &mut Style, before: &Style, after: &Style) {
    if after.stroke_color != before.stroke_color {
        target.stroke_color = after.stroke_color;
    }
    if after.stroke_width != before.stroke_width {
        target.set_stroke_width(after.stroke_width);
    }
    if after.fill_color != before.fill_color {
        target.fill_color = after.fill_color;
    }
    if after.opacity != before.opacity {
        target.set_opacity(after.opacity);
    }
    if after.font_size != before.font_size {
        target.set_font_size(after.font_size);
    }
    if after.font_weight != before.font_weight {
        target.font_weight = after.font_weight;
    }
    if after.arrowhead_size != before.arrowhead_size {
        target.arrowhead_size = after.arrowhead_size;
    }
}

pub fn show_properties(ui: &mut Ui, canvas: &mut Canvas, theme: &AppTheme) {
    heading(ui, theme, canvas.active_tool().label());

    let before = canvas.tool_style().clone();
    let mut after = before.clone();
    style_controls(ui, &mut after);
    if after != before {
        canvas.update_style(|style| merge_changed(style, &before, &after));
    }

    if let Some(blur) = canvas.blur_options_mut() {
        ui.separator();
        heading(ui, theme, "Blur");
        ui.horizontal(|ui| {
            ui.radio_value(&mut blur.mode, BlurMode::Blur, "Frosted");
            ui.radio_value(&mut blur.mode, BlurMode::Pixelate, "Pixelate");
        });
        ui.add(Slider::new(&mut blur.intensity, 1..=100).text("Intensity"));
    }

    if let Some(color) = canvas.fill_color_mut() {
        ui.separator();
        heading(ui, theme, "Fill");
        ui.horizontal(|ui| {
            ui.label("Color");
            ui.color_edit_button_srgba_unmultiplied(&mut color.0);
        });
    }

    let editing_selection = canvas.selected_text_mut().is_some();
    let note = if editing_selection {
        canvas.selected_text_mut()
    } else {
        canvas.text_template_mut()
    };
    if let Some(note) = note {
        ui.separator();
        heading(ui, theme, "Bubble");
        bubble_controls(ui, note);
    }

    if canvas.document().pending_crop().is_some() {
        ui.separator();
        heading(ui, theme, "Crop");
        ui.horizontal(|ui| {
            if ui.button("Apply (Enter)").clicked() {
                canvas.apply_crop();
            }
            if ui.button("Cancel (Esc)").clicked() {
                canvas.cancel_crop();
            }
        });
    }
}

fn heading(ui: &mut Ui, theme: &AppTheme, text: &str) {
    ui.label(RichText::new(text).color(theme.text.muted).size(12.0).strong());
}

fn style_controls(ui: &mut Ui, style: &mut Style) {
    ui.horizontal(|ui| {
        ui.label("Stroke");
        ui.color_edit_button_srgba_unmultiplied(&mut style.stroke_color.0);
    });
    ui.add(Slider::new(&mut style.stroke_width, 1.0..=30.0).text("Width"));
    ui.add(Slider::new(&mut style.opacity, 0.0..=1.0).text("Opacity"));

    let mut filled = style.fill_color.is_some();
    ui.horizontal(|ui| {
        ui.checkbox(&mut filled, "Fill");
        if let Some(fill) = style.fill_color.as_mut() {
            ui.color_edit_button_srgba_unmultiplied(&mut fill.0);
        }
    });
    if filled != style.fill_color.is_some() {
        style.fill_color = filled.then(|| style.stroke_color.with_alpha(96));
    }

    ui.add(
        Slider::new(&mut style.font_size, Style::MIN_FONT_SIZE..=Style::MAX_FONT_SIZE)
            .text("Font size"),
    );
    let mut bold = style.is_bold();
    if ui.checkbox(&mut bold, "Bold").changed() {
        style.font_weight = if bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
    }
    ui.add(Slider::new(&mut style.arrowhead_size, 6.0..=40.0).text("Arrowhead"));
}

fn bubble_controls(ui: &mut Ui, note: &mut TextNote) {
    ui.checkbox(&mut note.show_bubble, "Show bubble");
    ui.add_enabled_ui(note.show_bubble, |ui| {
        ui.horizontal(|ui| {
            ui.label("Color");
            ui.color_edit_button_srgba_unmultiplied(&mut note.bubble_color.0);
            if ui.small_button("Reset").clicked() {
                note.bubble_color = TextNote::DEFAULT_BUBBLE;
            }
        });
        ui.checkbox(&mut note.spike_enabled, "Pointer spike");
        ui.checkbox(&mut note.show_shadow, "Shadow");
        ui.horizontal(|ui| {
            ui.checkbox(&mut note.hand_drawn, "Hand-drawn");
            if note.hand_drawn && ui.small_button("Reshuffle").clicked() {
                note.reseed();
            }
        });
        ui.add(Slider::new(&mut note.corner_radius, 0.0..=24.0).text("Radius"));
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use snapnote::style::Rgba;

    #[test]
    fn only_edited_fields_reach_the_target() {
        let before = Style::default();
        let after = Style {
            stroke_width: 9.0,
            ..before.clone()
        };
        let mut target = Style {
            stroke_color: Rgba::BLACK,
            font_size: 30.0,
            ..Style::default()
        };
        merge_changed(&mut target, &before, &after);
        assert_eq!(target.stroke_width, 9.0);
        assert_eq!(target.stroke_color, Rgba::BLACK);
        assert_eq!(target.font_size, 30.0);
    }

    #[test]
    fn merged_values_are_clamped() {
        let before = Style::default();
        let after = Style {
            font_size: 200.0,
            opacity: 3.0,
            ..before.clone()
        };
        let mut target = Style::default();
        merge_changed(&mut target, &before, &after);
        assert_eq!(target.font_size, Style::MAX_FONT_SIZE);
        assert_eq!(target.opacity, 1.0);
    }
}
