#![warn(non_snake_case)]
//! # TileMapEd Main Entry Point
//!
//! TileMapEd is a tile map editor that reads and writes Tiled JSON maps. This
//! file sets up logging, loads the editor configuration and starts the
//! eframe/egui event loop.

use log::info;

use tilemap_ed::config::EditorConfig;
use tilemap_ed::editor::Editor;
use tilemap_ed::ui::main_window::APP_NAME;
use tilemap_ed::ui::TileEdApp;

fn main() -> eframe::Result {
    // Initialize logging.
    env_logger::init();
    info!("{} starting...", APP_NAME);

    let config = EditorConfig::load();
    let editor = Editor::new(config);

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|_cc| Ok(Box::new(TileEdApp::new(editor)))),
    );
    info!("{} exiting.", APP_NAME);
    result
}
