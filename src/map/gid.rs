// src/map/gid.rs

//! Global tile ids.
//!
//! A cell stores a gid: 0 is empty, anything else points into exactly one
//! tileset through `firstgid <= gid < firstgid + tilecount`. The top three
//! bits carry Tiled's flip flags and are masked off before resolving.

use super::TileSet;

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// The empty cell.
pub const EMPTY_GID: u32 = 0;

#[inline]
pub fn clean_gid(raw: u32) -> u32 {
    raw & GID_MASK
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

impl FlipFlags {
    pub fn from_raw(raw: u32) -> Self {
        Self {
            horizontal: raw & FLIP_H != 0,
            vertical: raw & FLIP_V != 0,
            diagonal: raw & FLIP_D != 0,
        }
    }
}

/// A resolved cell: which tileset it belongs to and the tile inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTile {
    pub tileset_index: usize,
    pub local_id: u32,
    pub flip: FlipFlags,
}

/// Resolves a raw gid against the map's tilesets.
///
/// Tilesets are not required to be sorted by `firstgid`; deleting one leaves
/// a hole in the gid space, and gids in that hole resolve to `None`.
pub fn resolve_gid(tilesets: &[TileSet], raw: u32) -> Option<ResolvedTile> {
    let gid = clean_gid(raw);
    if gid == EMPTY_GID {
        return None;
    }
    tilesets
        .iter()
        .enumerate()
        .find(|(_, ts)| ts.contains_gid(gid))
        .map(|(tileset_index, ts)| ResolvedTile {
            tileset_index,
            local_id: gid - ts.firstgid,
            flip: FlipFlags::from_raw(raw),
        })
}
