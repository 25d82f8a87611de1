// src/editor/mod.rs

mod commands;
pub mod core;
pub mod tools;

pub use self::commands::{EditorCommand, NewTileSetData};
pub use self::core::Editor;
pub use self::tools::{MapInput, PointerButton, PointerPhase, TilesetInput};

use crate::map::TileSetHash;

/// The editing tools the toolbar offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTool {
    /// Pans the map with the primary button.
    #[default]
    Cursor,
    Paint,
    Select,
    Fill,
}

impl EditorTool {
    /// Returns a user-friendly name for the tool.
    pub fn name(&self) -> &'static str {
        match self {
            EditorTool::Cursor => "Cursor",
            EditorTool::Paint => "Paint",
            EditorTool::Select => "Select",
            EditorTool::Fill => "Fill",
        }
    }

    /// Returns all available tools. Useful for UI elements like toolbars.
    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::Cursor,
            EditorTool::Paint,
            EditorTool::Select,
            EditorTool::Fill,
        ]
    }

    /// Keyboard shortcut shown next to the tool name.
    pub fn shortcut(&self) -> char {
        match self {
            EditorTool::Cursor => 'C',
            EditorTool::Paint => 'P',
            EditorTool::Select => 'S',
            EditorTool::Fill => 'F',
        }
    }
}

/// Tiles picked in one of the tileset canvases. Indices are local to the
/// tileset, in the order they were picked (row-major for a drag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTiles {
    pub tileset_hash: TileSetHash,
    pub tile_indices: Vec<u32>,
}
