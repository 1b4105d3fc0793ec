use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use chrono::Local;
use eframe::egui::{
    self, Color32, ColorImage, Context as EguiContext, Event, Key, Modifiers, Pos2, Rect, RichText,
    Sense, TextureHandle, TextureOptions, TopBottomPanel,
};
use eframe::{App, Frame};
use image::{ImageFormat, RgbaImage};
use snapnote::dispatch::{Debounce, Dispatcher};
use snapnote::render::{self, Fonts};
use snapnote::{AppConfig, Canvas, EditorContext, EditorEvent};

use crate::clipboard::{self, ClipboardWatcher, WatcherEvent};
use crate::properties;
use crate::theme::{self, AppTheme};
use crate::toolbar::{self, ToolbarOutput};

const WATCH_INTERVAL: Duration = Duration::from_millis(400);
const NOTICE_SECONDS: f64 = 2.5;

pub fn export_file_name(now: chrono::DateTime<Local>) -> String {
    format!("snapnote_{}.png", now.format("%Y%m%d_%H%M%S"))
}

pub struct SnapNoteApp {
    canvas: Option<Canvas>,
    texture: Option<TextureHandle>,
    context: EditorContext,
    fonts: Fonts,
    theme: AppTheme,
    dispatcher: Dispatcher<WatcherEvent>,
    _watcher: Option<ClipboardWatcher>,
    pending_image: Option<RgbaImage>,
    load_delay: Debounce,
    notice: Option<(String, f64)>,
}

impl SnapNoteApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Self {
        let theme = theme::editor_theme();
        theme::apply_theme(&cc.egui_ctx, &theme);

        let config = match AppConfig::file_path() {
            Ok(path) => AppConfig::load_or_default(&path),
            Err(err) => {
                log::warn!("{err}; using default settings");
                AppConfig::default()
            }
        };
        let load_delay = Debounce::new(config.capture_delay());

        let repaint = cc.egui_ctx.clone();
        let dispatcher = Dispatcher::with_waker(move || repaint.request_repaint());
        let watcher = ClipboardWatcher::spawn(dispatcher.handle(), WATCH_INTERVAL)
            .map_err(|err| log::warn!("{err:#}"))
            .ok();

        let mut app = Self {
            canvas: None,
            texture: None,
            context: EditorContext::new(config),
            fonts: Fonts::load_system(),
            theme,
            dispatcher,
            _watcher: watcher,
            pending_image: None,
            load_delay,
            notice: None,
        };
        if let Some(path) = initial {
            match open_image(&path) {
                Ok(image) => app.load_image(image),
                Err(err) => app.report(&cc.egui_ctx, format!("{err:#}")),
            }
        }
        app
    }

    fn report(&mut self, ctx: &EguiContext, message: String) {
        log::warn!("{message}");
        self.notify(ctx, message);
    }

    fn notify(&mut self, ctx: &EguiContext, message: String) {
        let until = ctx.input(|input| input.time) + NOTICE_SECONDS;
        self.notice = Some((message, until));
    }

    fn load_image(&mut self, image: RgbaImage) {
        let (width, height) = image.dimensions();
        let result = if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_image(image)
        } else {
            Canvas::new(image, self.context.clone(), self.fonts.clone())
                .map(|canvas| self.canvas = Some(canvas))
        };
        match result {
            Ok(()) => log::info!("editing {width}x{height} image"),
            Err(err) => log::warn!("cannot open image: {err}"),
        }
    }

    /// Images from paste or the watcher wait out the capture delay first.
    fn queue_image(&mut self, image: RgbaImage) {
        self.pending_image = Some(image);
        self.load_delay.arm(Instant::now());
    }

    fn process_watcher_events(&mut self, ctx: &EguiContext) {
        for event in self.dispatcher.drain() {
            match event {
                WatcherEvent::ImageDetected(image) => self.queue_image(image),
                WatcherEvent::Error(message) => self.notify(ctx, message),
            }
        }
        let now = Instant::now();
        if self.load_delay.fire(now) {
            if let Some(image) = self.pending_image.take() {
                self.load_image(image);
            }
        } else if let Some(wait) = self.load_delay.remaining(now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn paste(&mut self, ctx: &EguiContext) {
        match clipboard::read_image() {
            Ok(Some(image)) => self.queue_image(image),
            Ok(None) => self.notify(ctx, "No image on the clipboard".to_string()),
            Err(err) => self.report(ctx, format!("Paste failed: {err:#}")),
        }
    }

    fn save(&mut self) -> Result<Option<PathBuf>> {
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(None);
        };
        let flattened = canvas.render_to_image().context("cannot flatten annotations")?;
        let folder = &self.context.config.default_save_folder;
        std::fs::create_dir_all(folder)
            .with_context(|| format!("cannot create {}", folder.display()))?;
        let path = folder.join(export_file_name(Local::now()));
        flattened
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("cannot save png to {}", path.display()))?;
        log::info!("saved {}", path.display());
        if self.context.config.auto_copy_to_clipboard {
            clipboard::write_image(&flattened)?;
        }
        Ok(Some(path))
    }

    fn copy(&mut self) -> Result<bool> {
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(false);
        };
        let flattened = canvas.render_to_image().context("cannot flatten annotations")?;
        clipboard::write_image(&flattened)?;
        if self.context.config.auto_save {
            self.save()?;
        }
        Ok(true)
    }

    fn run_actions(&mut self, ctx: &EguiContext, actions: ToolbarOutput) {
        if actions.save {
            match self.save() {
                Ok(Some(path)) => self.notify(ctx, format!("Saved {}", path.display())),
                Ok(None) => {}
                Err(err) => self.report(ctx, format!("Save failed: {err:#}")),
            }
        }
        if actions.copy {
            match self.copy() {
                Ok(true) => self.notify(ctx, "Copied to clipboard".to_string()),
                Ok(false) => {}
                Err(err) => self.report(ctx, format!("Copy failed: {err:#}")),
            }
        }
        if actions.paste {
            self.paste(ctx);
        }
    }

    /// Host shortcuts are taken out here; the rest goes to the canvas.
    fn route_keyboard(&mut self, ctx: &EguiContext) -> ToolbarOutput {
        let mut actions = ToolbarOutput::default();
        if ctx.wants_keyboard_input() {
            return actions;
        }
        let events = ctx.input(|input| input.events.clone());
        for event in events {
            match event {
                Event::Key {
                    key,
                    pressed,
                    modifiers,
                    ..
                } => {
                    let command = modifiers.ctrl || modifiers.command;
                    match key {
                        Key::Space => {
                            if let Some(canvas) = self.canvas.as_mut() {
                                canvas.set_space_held(pressed);
                            }
                        }
                        Key::S if pressed && command => actions.save = true,
                        Key::C if pressed && command => actions.copy = true,
                        Key::V if pressed && command => actions.paste = true,
                        _ if pressed => {
                            if let Some(canvas) = self.canvas.as_mut() {
                                canvas.key_pressed(key, modifiers);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(text) => {
                    if let Some(canvas) = self.canvas.as_mut() {
                        canvas.text_input(&text);
                    }
                }
                _ => {}
            }
        }
        actions
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(canvas) = self.canvas.as_mut() else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("Copy a screenshot or press Ctrl+V to paste one")
                        .color(self.theme.text.muted)
                        .size(16.0),
                );
            });
            return;
        };

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        canvas.resize_viewport(rect.size());
        let to_local = |pos: Pos2| (pos - rect.min).to_pos2();

        let (pointer, pressed, released, scroll, zoom, modifiers) = ui.input(|input| {
            (
                input.pointer.interact_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.smooth_scroll_delta,
                input.zoom_delta(),
                input.modifiers,
            )
        });

        if let Some(pos) = pointer {
            let local = to_local(pos);
            if pressed && response.hovered() {
                canvas.pointer_pressed(local, modifiers);
            }
            canvas.pointer_moved(local, modifiers);
            if released {
                canvas.pointer_released(local, modifiers);
            }
            if response.hovered() {
                if zoom != 1.0 {
                    let ctrl = Modifiers {
                        ctrl: true,
                        ..modifiers
                    };
                    canvas.scroll(egui::vec2(0.0, zoom - 1.0), local, ctrl);
                } else if scroll != egui::Vec2::ZERO {
                    canvas.scroll(scroll, local, Modifiers::NONE);
                }
                ui.ctx().set_cursor_icon(canvas.cursor_icon());
            }
        }
        if pointer.is_none() || !(response.hovered() || response.dragged()) {
            canvas.pointer_left();
        }

        let dt = Duration::from_secs_f32(ui.input(|input| input.stable_dt).max(0.0));
        canvas.tick(dt);
        if canvas.document().text_edit().is_some() {
            ui.ctx().request_repaint_after(canvas.context().config.caret_blink());
        }

        if canvas.take_dirty() || self.texture.is_none() {
            match canvas.render() {
                Ok(frame) => {
                    let size = [frame.width() as usize, frame.height() as usize];
                    let color = ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
                    match self.texture.as_mut() {
                        Some(texture) => texture.set(color, TextureOptions::LINEAR),
                        None => {
                            self.texture =
                                Some(ui.ctx().load_texture("snapnote-canvas", color, TextureOptions::LINEAR));
                        }
                    }
                }
                Err(err) => log::warn!("render failed: {err}"),
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.theme.palette.canvas_bg);
        if let Some(texture) = self.texture.as_ref() {
            let view = canvas.view();
            let min = rect.min + view.pan();
            let image_rect = Rect::from_min_size(min, texture.size_vec2() * view.zoom());
            painter.image(
                texture.id(),
                image_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        for event in canvas.drain_events() {
            match event {
                EditorEvent::ImageChanged { width, height, .. } => {
                    log::debug!("image is now {width}x{height}");
                }
                other => log::trace!("editor event {other:?}"),
            }
        }
    }

    fn show_status(&self, ui: &mut egui::Ui, ctx: &EguiContext) {
        ui.horizontal(|ui| {
            if let Some(canvas) = self.canvas.as_ref() {
                let status = canvas.status();
                let (width, height) = status.image_size;
                ui.label(format!("{width} × {height}"));
                ui.separator();
                ui.label(format!("{}%", status.zoom_percent));
                ui.separator();
                ui.label(status.tool.label());
                if let Some(cursor) = status.cursor {
                    ui.separator();
                    ui.label(format!("{:.0}, {:.0}", cursor.x, cursor.y));
                }
                if status.has_pending_crop {
                    ui.separator();
                    ui.label("Enter to crop, Esc to cancel");
                }
            }
            let now = ctx.input(|input| input.time);
            if let Some((message, _)) = self.notice.as_ref().filter(|(_, until)| *until >= now) {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(message).color(self.theme.text.secondary));
                });
            }
        });
    }
}

fn open_image(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    render::decode_image(&bytes).with_context(|| format!("cannot decode {}", path.display()))
}

impl App for SnapNoteApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        self.process_watcher_events(ctx);
        let keyboard = self.route_keyboard(ctx);
        self.run_actions(ctx, keyboard);

        let mut clicked = ToolbarOutput::default();
        TopBottomPanel::top("toolbar")
            .exact_height(self.theme.metrics.toolbar_height)
            .frame(theme::panel_frame(&self.theme))
            .show(ctx, |ui| {
                if let Some(canvas) = self.canvas.as_mut() {
                    clicked = toolbar::show_toolbar(ui, canvas, &self.theme);
                } else if ui.button("Paste").clicked() {
                    clicked.paste = true;
                }
            });
        self.run_actions(ctx, clicked);

        TopBottomPanel::bottom("status")
            .exact_height(self.theme.metrics.status_height)
            .frame(theme::panel_frame(&self.theme))
            .show(ctx, |ui| self.show_status(ui, ctx));

        if let Some(canvas) = self.canvas.as_mut() {
            egui::SidePanel::right("properties")
                .exact_width(self.theme.metrics.properties_width)
                .frame(theme::panel_frame(&self.theme))
                .show(ctx, |ui| properties::show_properties(ui, canvas, &self.theme));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.palette.app_bg))
            .show(ctx, |ui| self.show_canvas(ui));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn export_name_uses_timestamp() {
        let when = Local
            .with_ymd_and_hms(2026, 3, 9, 14, 5, 7)
            .single()
            .expect("valid time");
        assert_eq!(export_file_name(when), "snapnote_20260309_140507.png");
    }
}
