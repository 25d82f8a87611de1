// src/ui/mod.rs
pub mod central_panel;
pub mod dialog;
pub mod file;
pub mod layers_panel;
pub mod main_window;
pub mod menu;
pub mod side_panel;
pub mod status_bar;
pub mod textures;
pub mod tileset_canvas;
pub mod tilesets_panel;
pub mod toolbar;

pub use dialog::DialogManager;
pub use main_window::TileEdApp;
