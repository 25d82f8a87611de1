// src/utils/mod.rs
pub mod files;
pub mod grid;
pub mod util;

pub use grid::{GridRect, GridSpec, Viewport};
