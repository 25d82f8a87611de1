// src/editor/tools/picker.rs

use super::{PointerPhase, TilesetInput};
use crate::editor::EditorCommand;
use crate::map::{TileSet, TileSetHash};
use crate::utils::GridRect;

/// Picks tiles from a tileset canvas: a click takes one tile, a drag takes
/// the rectangle between the press and the pointer.
#[derive(Debug, Default)]
pub struct TilePicker {
    drag_start: Option<(TileSetHash, (u32, u32))>,
}

impl TilePicker {
    pub fn handle_input(
        &mut self,
        hash: TileSetHash,
        tileset: &TileSet,
        input: &TilesetInput,
    ) -> Option<EditorCommand> {
        let (col, row) = input.cell;
        let inside = col < tileset.columns && row < tileset.rows();

        let rect = match input.phase {
            PointerPhase::Pressed if inside => {
                self.drag_start = Some((hash, input.cell));
                GridRect::single(input.cell)
            }
            PointerPhase::Dragged => match self.drag_start {
                Some((start_hash, start)) if start_hash == hash => {
                    let clamped = (
                        col.min(tileset.columns.saturating_sub(1)),
                        row.min(tileset.rows().saturating_sub(1)),
                    );
                    GridRect::from_corners(start, clamped)
                }
                _ => return None,
            },
            PointerPhase::Released => {
                self.drag_start = None;
                return None;
            }
            PointerPhase::Pressed => return None,
        };

        let tile_indices = rect
            .indices(tileset.columns, tileset.rows())
            .into_iter()
            .map(|i| i as u32)
            .collect();
        Some(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices,
        })
    }

    pub fn cleanup(&mut self) {
        self.drag_start = None;
    }
}
