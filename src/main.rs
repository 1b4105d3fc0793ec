mod app;
mod clipboard;
mod properties;
mod theme;
mod toolbar;

use std::path::PathBuf;

use eframe::egui;
use env_logger::Env;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    let viewport = egui::ViewportBuilder::default()
        .with_title("SnapNote")
        .with_inner_size([1180.0, 780.0])
        .with_min_inner_size([640.0, 480.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "SnapNote",
        options,
        Box::new(move |cc| Box::new(app::SnapNoteApp::new(cc, initial))),
    )
}
