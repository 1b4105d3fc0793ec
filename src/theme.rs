use egui::epaint::Shadow;
use egui::{
    vec2, Button, Color32, Context, FontFamily, FontId, Frame, Margin, Response, RichText,
    Rounding, Stroke, Style, TextStyle, Ui, Visuals,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthClass {
    Compact,
    Regular,
    Wide,
}

#[derive(Clone, Debug)]
pub struct Palette {
    pub app_bg: Color32,
    pub panel_bg: Color32,
    pub card_bg: Color32,
    pub canvas_bg: Color32,
    pub stroke_soft: Color32,
    pub stroke_strong: Color32,
    pub accent: Color32,
    pub accent_soft: Color32,
    pub focus_ring: Color32,
    pub shadow: Color32,
}

#[derive(Clone, Debug)]
pub struct TextColors {
    pub primary: Color32,
    pub secondary: Color32,
    pub muted: Color32,
}

#[derive(Clone, Debug)]
pub struct Metrics {
    pub rounding: f32,
    pub chip_h: f32,
    pub chip_w: f32,
    pub gap: f32,
    pub group_gap: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub toolbar_height: f32,
    pub status_height: f32,
    pub properties_width: f32,
}

#[derive(Clone, Debug)]
pub struct Breakpoints {
    pub compact_max: f32,
    pub regular_max: f32,
}

#[derive(Clone, Debug)]
pub struct AppTheme {
    pub palette: Palette,
    pub text: TextColors,
    pub metrics: Metrics,
    pub breakpoints: Breakpoints,
}

impl AppTheme {
    pub fn width_class(&self, width: f32) -> WidthClass {
        width_class(width, &self.breakpoints)
    }
}

pub fn width_class(width: f32, breakpoints: &Breakpoints) -> WidthClass {
    if width <= breakpoints.compact_max {
        WidthClass::Compact
    } else if width <= breakpoints.regular_max {
        WidthClass::Regular
    } else {
        WidthClass::Wide
    }
}

pub fn editor_theme() -> AppTheme {
    AppTheme {
        palette: Palette {
            app_bg: Color32::from_rgb(0x16, 0x17, 0x1B),
            panel_bg: Color32::from_rgb(0x1D, 0x1E, 0x24),
            card_bg: Color32::from_rgb(0x23, 0x25, 0x2D),
            canvas_bg: Color32::from_rgb(0x11, 0x13, 0x18),
            stroke_soft: Color32::from_rgba_unmultiplied(255, 255, 255, 26),
            stroke_strong: Color32::from_rgba_unmultiplied(255, 255, 255, 52),
            accent: Color32::from_rgb(0xD3, 0x4E, 0x4E),
            accent_soft: Color32::from_rgba_unmultiplied(211, 78, 78, 80),
            focus_ring: Color32::from_rgba_unmultiplied(235, 120, 120, 210),
            shadow: Color32::from_rgba_unmultiplied(0, 0, 0, 96),
        },
        text: TextColors {
            primary: Color32::from_rgb(0xF4, 0xF6, 0xFB),
            secondary: Color32::from_rgb(0xB8, 0xBF, 0xCE),
            muted: Color32::from_rgb(0x84, 0x8C, 0x9E),
        },
        metrics: Metrics {
            rounding: 8.0,
            chip_h: 28.0,
            chip_w: 36.0,
            gap: 6.0,
            group_gap: 12.0,
            padding_x: 12.0,
            padding_y: 8.0,
            toolbar_height: 44.0,
            status_height: 26.0,
            properties_width: 220.0,
        },
        breakpoints: Breakpoints {
            compact_max: 900.0,
            regular_max: 1200.0,
        },
    }
}

pub fn apply_theme(ctx: &Context, theme: &AppTheme) {
    let mut style: Style = (*ctx.style()).clone();
    let palette = &theme.palette;
    let rounding = Rounding::same(theme.metrics.rounding);

    style.spacing.item_spacing = vec2(theme.metrics.gap, theme.metrics.gap);
    style.spacing.button_padding = vec2(10.0, 6.0);

    style.visuals = Visuals::dark();
    style.visuals.override_text_color = Some(theme.text.primary);
    style.visuals.panel_fill = palette.panel_bg;
    style.visuals.window_fill = palette.panel_bg;
    style.visuals.extreme_bg_color = palette.app_bg;
    style.visuals.window_rounding = rounding;

    let widgets = &mut style.visuals.widgets;
    widgets.inactive.bg_fill = palette.card_bg;
    widgets.inactive.weak_bg_fill = palette.card_bg;
    widgets.inactive.bg_stroke = Stroke::new(1.0, palette.stroke_soft);
    widgets.inactive.fg_stroke = Stroke::new(1.0, theme.text.secondary);
    widgets.hovered.bg_stroke = Stroke::new(1.0, palette.stroke_strong);
    widgets.hovered.fg_stroke = Stroke::new(1.0, theme.text.primary);
    widgets.active.bg_fill = palette.accent_soft;
    widgets.active.bg_stroke = Stroke::new(1.0, palette.accent);
    for visuals in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        visuals.rounding = rounding;
    }

    style.visuals.selection.bg_fill = palette.accent_soft;
    style.visuals.selection.stroke = Stroke::new(1.0, palette.accent);
    style.visuals.popup_shadow = Shadow {
        offset: vec2(0.0, 8.0),
        blur: 20.0,
        spread: 0.0,
        color: palette.shadow,
    };

    style
        .text_styles
        .insert(TextStyle::Body, FontId::new(14.0, FontFamily::Proportional));
    style.text_styles.insert(
        TextStyle::Small,
        FontId::new(12.0, FontFamily::Proportional),
    );

    ctx.set_style(style);
}

pub fn panel_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.palette.panel_bg)
        .inner_margin(Margin::symmetric(theme.metrics.padding_x, theme.metrics.padding_y))
}

pub fn tool_chip(ui: &mut Ui, theme: &AppTheme, label: &str, selected: bool) -> Response {
    let button = Button::new(RichText::new(label).size(14.0))
        .min_size(vec2(theme.metrics.chip_w, theme.metrics.chip_h))
        .rounding(Rounding::same(theme.metrics.rounding));
    ui.add(chip_state(button, theme, selected))
}

pub fn color_chip(ui: &mut Ui, theme: &AppTheme, color: Color32, selected: bool) -> Response {
    let ring = if selected {
        Stroke::new(2.0, theme.palette.focus_ring)
    } else {
        Stroke::new(1.0, theme.palette.stroke_soft)
    };
    ui.add(
        Button::new("")
            .min_size(vec2(20.0, 20.0))
            .fill(color)
            .stroke(ring)
            .rounding(Rounding::same(10.0)),
    )
}

fn chip_state<'a>(button: Button<'a>, theme: &AppTheme, selected: bool) -> Button<'a> {
    if selected {
        button
            .fill(theme.palette.accent_soft)
            .stroke(Stroke::new(1.0, theme.palette.focus_ring))
    } else {
        button.fill(theme.palette.card_bg)
    }
}

pub fn group_separator(ui: &mut Ui, theme: &AppTheme) {
    ui.separator();
    ui.add_space((theme.metrics.group_gap - theme.metrics.gap).max(0.0));
}

#[cfg(test)]
mod tests {
    use super::{width_class, Breakpoints, WidthClass};

    #[test]
    fn width_class_boundaries_are_stable() {
        let breakpoints = Breakpoints {
            compact_max: 900.0,
            regular_max: 1200.0,
        };

        assert_eq!(width_class(640.0, &breakpoints), WidthClass::Compact);
        assert_eq!(width_class(900.0, &breakpoints), WidthClass::Compact);
        assert_eq!(width_class(901.0, &breakpoints), WidthClass::Regular);
        assert_eq!(width_class(1200.0, &breakpoints), WidthClass::Regular);
        assert_eq!(width_class(1201.0, &breakpoints), WidthClass::Wide);
    }
}
