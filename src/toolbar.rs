use egui::{vec2, Align, Color32, Layout, RichText, Ui};
use snapnote::style::Rgba;
use snapnote::{Canvas, ToolKind};

use crate::theme::{self, AppTheme, WidthClass};

const PALETTE: [Rgba; 8] = [
    Rgba::rgb(0xFF, 0x50, 0x50),
    Rgba::rgb(0xD3, 0x4E, 0x4E),
    Rgba::rgb(0xDD, 0x6B, 0x20),
    Rgba::rgb(0xFF, 0xD4, 0x00),
    Rgba::rgb(0x38, 0xA1, 0x69),
    Rgba::rgb(0x31, 0x82, 0xCE),
    Rgba::rgb(0xFF, 0xFF, 0xFF),
    Rgba::rgb(0x1A, 0x20, 0x2C),
];

const STROKE_WIDTHS: [(f32, &str); 3] = [(2.0, "S"), (5.0, "M"), (9.0, "L")];

/// Host actions the toolbar cannot perform on the canvas itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolbarOutput {
    pub save: bool,
    pub copy: bool,
    pub paste: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolbarPlan {
    pub tool_labels: bool,
    pub visible_color_count: usize,
    pub show_stroke_inline: bool,
}

pub fn plan_toolbar_items(width_class: WidthClass) -> ToolbarPlan {
    match width_class {
        WidthClass::Compact => ToolbarPlan {
            tool_labels: false,
            visible_color_count: 4,
            show_stroke_inline: false,
        },
        WidthClass::Regular => ToolbarPlan {
            tool_labels: false,
            visible_color_count: PALETTE.len(),
            show_stroke_inline: true,
        },
        WidthClass::Wide => ToolbarPlan {
            tool_labels: true,
            visible_color_count: PALETTE.len(),
            show_stroke_inline: true,
        },
    }
}

fn color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), color.a())
}

fn shortcut_letter(kind: ToolKind) -> &'static str {
    kind.shortcut().name()
}

pub fn show_toolbar(ui: &mut Ui, canvas: &mut Canvas, theme: &AppTheme) -> ToolbarOutput {
    let plan = plan_toolbar_items(theme.width_class(ui.available_width()));
    let mut output = ToolbarOutput::default();

    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
        ui.spacing_mut().item_spacing = vec2(theme.metrics.gap, 0.0);

        for kind in ToolKind::ALL {
            let label = if plan.tool_labels {
                kind.label()
            } else {
                shortcut_letter(kind)
            };
            let hint = format!("{} ({})", kind.label(), shortcut_letter(kind));
            if theme::tool_chip(ui, theme, label, canvas.active_tool() == kind)
                .on_hover_text(hint)
                .clicked()
            {
                canvas.set_tool(kind);
            }
        }

        theme::group_separator(ui, theme);
        palette_group(ui, canvas, theme, plan.visible_color_count);

        if plan.show_stroke_inline {
            theme::group_separator(ui, theme);
            stroke_group(ui, canvas, theme);
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            output.save = ui.button("Save").on_hover_text("Save PNG (Ctrl+S)").clicked();
            output.copy = ui.button("Copy").on_hover_text("Copy image (Ctrl+C)").clicked();
            output.paste = ui.button("Paste").on_hover_text("Paste image (Ctrl+V)").clicked();
            ui.separator();
            if ui.add_enabled(canvas.document().can_redo(), egui::Button::new("Redo")).clicked() {
                canvas.redo();
            }
            if ui.add_enabled(canvas.document().can_undo(), egui::Button::new("Undo")).clicked() {
                canvas.undo();
            }
            if !plan.show_stroke_inline || plan.visible_color_count < PALETTE.len() {
                ui.menu_button("…", |ui| {
                    ui.label(RichText::new("Colors").color(theme.text.muted).size(12.0));
                    ui.horizontal_wrapped(|ui| palette_group(ui, canvas, theme, PALETTE.len()));
                    ui.separator();
                    ui.label(RichText::new("Line thickness").color(theme.text.muted).size(12.0));
                    ui.horizontal(|ui| stroke_group(ui, canvas, theme));
                });
            }
        });
    });

    output
}

fn palette_group(ui: &mut Ui, canvas: &mut Canvas, theme: &AppTheme, count: usize) {
    for color in PALETTE.into_iter().take(count) {
        let selected = canvas.tool_style().stroke_color == color;
        if theme::color_chip(ui, theme, color32(color), selected)
            .on_hover_text("Choose color")
            .clicked()
        {
            canvas.update_style(|style| style.stroke_color = color);
        }
    }
}

fn stroke_group(ui: &mut Ui, canvas: &mut Canvas, theme: &AppTheme) {
    for (width, label) in STROKE_WIDTHS {
        let selected = canvas.tool_style().stroke_width == width;
        if theme::tool_chip(ui, theme, label, selected)
            .on_hover_text(format!("Line thickness {width}px"))
            .clicked()
        {
            canvas.update_style(|style| style.set_stroke_width(width));
        }
    }
}
