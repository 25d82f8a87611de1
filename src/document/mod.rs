// src/document/mod.rs
mod document;
mod export;

pub use self::document::{Document, TilesetImage};
pub use self::export::{export_png, render_to_image};
