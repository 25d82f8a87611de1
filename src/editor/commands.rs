// src/editor/commands.rs

use std::fmt;

use crate::document::TilesetImage;
use crate::map::{LayerMove, LayerType, TileSetHash, TileSetPatch};
use crate::utils::GridRect;

use super::EditorTool;

/// What the "Add tileset" dialog hands to the editor.
#[derive(Clone, PartialEq)]
pub struct NewTileSetData {
    pub image: TilesetImage,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl fmt::Debug for NewTileSetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewTileSetData")
            .field("image", &self.image.name)
            .field("size", &(self.image.width, self.image.height))
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .finish()
    }
}

/// Every change the UI can make to the editor state. Commands are applied
/// directly; there is no undo history.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorCommand {
    // View
    SetScale(f32),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleGrid,

    // Tools and selections
    SetSelectedTool(EditorTool),
    SetSelectedTiles {
        tileset_hash: TileSetHash,
        tile_indices: Vec<u32>,
    },
    SetMapSelection(Option<GridRect>),

    // Tile editing on the current layer
    PaintTiles { grid_index: usize },
    EraseTiles { grid_index: usize },
    FillTiles { grid_index: usize },
    ClearSelectedRegion,

    // Map properties
    SetMapWidth(u32),
    SetMapHeight(u32),
    SetTileWidth(u32),
    SetTileHeight(u32),

    // Layers
    SelectLayer(u32),
    AddLayer(LayerType),
    RemoveLayer(u32),
    MoveLayer(u32, LayerMove),
    SetLayerVisible(u32, bool),
    SetLayerOpacity(u32, f32),
    RenameLayer(u32, String),

    // Tilesets
    AddTileSet(NewTileSetData),
    UpdateTileSet {
        hash: TileSetHash,
        patch: TileSetPatch,
    },
    DeleteTileSet { hash: TileSetHash },

    NewMap,

    // Batch Operations
    Batch(Vec<EditorCommand>),
}

impl EditorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::SetScale(_) => "SetScale",
            EditorCommand::ZoomIn => "ZoomIn",
            EditorCommand::ZoomOut => "ZoomOut",
            EditorCommand::ResetZoom => "ResetZoom",
            EditorCommand::ToggleGrid => "ToggleGrid",
            EditorCommand::SetSelectedTool(_) => "SetSelectedTool",
            EditorCommand::SetSelectedTiles { .. } => "SetSelectedTiles",
            EditorCommand::SetMapSelection(_) => "SetMapSelection",
            EditorCommand::PaintTiles { .. } => "PaintTiles",
            EditorCommand::EraseTiles { .. } => "EraseTiles",
            EditorCommand::FillTiles { .. } => "FillTiles",
            EditorCommand::ClearSelectedRegion => "ClearSelectedRegion",
            EditorCommand::SetMapWidth(_) => "SetMapWidth",
            EditorCommand::SetMapHeight(_) => "SetMapHeight",
            EditorCommand::SetTileWidth(_) => "SetTileWidth",
            EditorCommand::SetTileHeight(_) => "SetTileHeight",
            EditorCommand::SelectLayer(_) => "SelectLayer",
            EditorCommand::AddLayer(_) => "AddLayer",
            EditorCommand::RemoveLayer(_) => "RemoveLayer",
            EditorCommand::MoveLayer(..) => "MoveLayer",
            EditorCommand::SetLayerVisible(..) => "SetLayerVisible",
            EditorCommand::SetLayerOpacity(..) => "SetLayerOpacity",
            EditorCommand::RenameLayer(..) => "RenameLayer",
            EditorCommand::AddTileSet(_) => "AddTileSet",
            EditorCommand::UpdateTileSet { .. } => "UpdateTileSet",
            EditorCommand::DeleteTileSet { .. } => "DeleteTileSet",
            EditorCommand::NewMap => "NewMap",
            EditorCommand::Batch(_) => "Batch",
        }
    }

    /// Whether a successful run changes the saved document.
    pub fn edits_document(&self) -> bool {
        match self {
            EditorCommand::SetScale(_)
            | EditorCommand::ZoomIn
            | EditorCommand::ZoomOut
            | EditorCommand::ResetZoom
            | EditorCommand::ToggleGrid
            | EditorCommand::SetSelectedTool(_)
            | EditorCommand::SetSelectedTiles { .. }
            | EditorCommand::SetMapSelection(_)
            | EditorCommand::SelectLayer(_)
            | EditorCommand::NewMap => false,
            EditorCommand::Batch(commands) => commands.iter().any(EditorCommand::edits_document),
            _ => true,
        }
    }
}
