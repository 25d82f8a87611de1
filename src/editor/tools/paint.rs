// src/editor/tools/paint.rs

use super::{MapInput, PointerButton, PointerPhase, Tool};
use crate::editor::EditorCommand;
use crate::map::gid::GID_MASK;
use crate::map::TileSet;
use crate::utils::grid::{cell_of_index, index_of_cell};

/// One tile of a stamp, offset from the stamp's top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampCell {
    pub dx: u32,
    pub dy: u32,
    pub gid: u32,
}

/// Lays out picked tiles the way they sit in the tileset: a tile at tileset
/// cell (c, r) lands at (c - min_c, r - min_r) from the painted cell.
pub fn build_stamp(tileset: &TileSet, tile_indices: &[u32]) -> Vec<StampCell> {
    let columns = tileset.columns.max(1);
    let cells: Vec<(u32, u32, u32)> = tile_indices
        .iter()
        .filter(|&&i| i < tileset.tilecount)
        .filter_map(|&i| {
            // Gids past the mask would collide with the flip bits.
            let gid = tileset.firstgid.checked_add(i).filter(|gid| *gid <= GID_MASK)?;
            let (col, row) = cell_of_index(i as usize, columns);
            Some((col, row, gid))
        })
        .collect();

    let Some(min_col) = cells.iter().map(|c| c.0).min() else {
        return Vec::new();
    };
    let min_row = cells.iter().map(|c| c.1).min().unwrap_or(0);

    cells
        .into_iter()
        .map(|(col, row, gid)| StampCell {
            dx: col - min_col,
            dy: row - min_row,
            gid,
        })
        .collect()
}

/// The (cell index, gid) pairs a stamp writes when its top-left corner is
/// placed on `grid_index`. Cells past the map edge are dropped.
pub fn stamp_targets(stamp: &[StampCell], grid_index: usize, map_width: u32, map_height: u32) -> Vec<(usize, u32)> {
    let (col, row) = cell_of_index(grid_index, map_width);
    stamp
        .iter()
        .filter_map(|cell| {
            let c = col + cell.dx;
            let r = row + cell.dy;
            (c < map_width && r < map_height).then(|| (index_of_cell(c, r, map_width), cell.gid))
        })
        .collect()
}

/// Paints with the primary button and erases with the secondary one, once
/// per cell the pointer enters.
#[derive(Debug, Default)]
pub struct PaintTool {
    last_index: Option<usize>,
}

impl Tool for PaintTool {
    fn name(&self) -> &'static str {
        "Paint"
    }

    fn handle_input(&mut self, input: &MapInput) -> Vec<EditorCommand> {
        match input.phase {
            PointerPhase::Released => {
                self.cleanup();
                Vec::new()
            }
            PointerPhase::Pressed | PointerPhase::Dragged => {
                if self.last_index == Some(input.grid_index) && input.phase == PointerPhase::Dragged {
                    return Vec::new();
                }
                self.last_index = Some(input.grid_index);
                let grid_index = input.grid_index;
                vec![match input.button {
                    PointerButton::Primary => EditorCommand::PaintTiles { grid_index },
                    PointerButton::Secondary => EditorCommand::EraseTiles { grid_index },
                }]
            }
        }
    }

    fn cleanup(&mut self) {
        self.last_index = None;
    }
}
