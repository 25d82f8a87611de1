// src/map/tileset.rs

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A single-image tileset, laid out like a Tiled JSON tileset entry.
///
/// `columns` and `tilecount` are derived from the image and tile sizes; call
/// [`TileSet::recompute_derived`] after changing any of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSet {
    pub name: String,
    pub image: String,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub imagewidth: u32,
    pub imageheight: u32,
    pub firstgid: u32,
    #[serde(default)]
    pub margin: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub tilecount: u32,
    /// Unmodelled Tiled fields such as `properties` or per-tile data.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TileSet {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        tilewidth: u32,
        tileheight: u32,
        imagewidth: u32,
        imageheight: u32,
        firstgid: u32,
    ) -> Self {
        let mut tileset = Self {
            name: name.into(),
            image: image.into(),
            tilewidth,
            tileheight,
            imagewidth,
            imageheight,
            firstgid,
            margin: 0,
            spacing: 0,
            columns: 0,
            tilecount: 0,
            extra: serde_json::Map::new(),
        };
        tileset.recompute_derived();
        tileset
    }

    /// Recomputes `columns` and `tilecount` from the image and tile geometry.
    pub fn recompute_derived(&mut self) {
        self.columns = fit(self.imagewidth, self.tilewidth, self.margin, self.spacing);
        let rows = fit(self.imageheight, self.tileheight, self.margin, self.spacing);
        self.tilecount = rows.saturating_mul(self.columns);
    }

    pub fn rows(&self) -> u32 {
        if self.columns == 0 {
            0
        } else {
            self.tilecount / self.columns
        }
    }

    /// One past the last gid this tileset owns, pinned at `u32::MAX`.
    pub fn end_gid(&self) -> u32 {
        self.firstgid.saturating_add(self.tilecount)
    }

    /// Whether `gid` (already stripped of flip flags) belongs to this tileset.
    pub fn contains_gid(&self, gid: u32) -> bool {
        gid >= self.firstgid && gid - self.firstgid < self.tilecount
    }

    /// Pixel rectangle `[x, y, w, h]` of a tile inside the tileset image.
    pub fn tile_source_rect(&self, local_id: u32) -> Option<[u32; 4]> {
        if local_id >= self.tilecount || self.columns == 0 {
            return None;
        }
        let col = local_id % self.columns;
        let row = local_id / self.columns;
        let x = col.checked_mul(self.tilewidth.checked_add(self.spacing)?)?.checked_add(self.margin)?;
        let y = row.checked_mul(self.tileheight.checked_add(self.spacing)?)?.checked_add(self.margin)?;
        Some([x, y, self.tilewidth, self.tileheight])
    }

    /// Column and row of a tile inside the tileset grid.
    pub fn tile_cell(&self, local_id: u32) -> (u32, u32) {
        if self.columns == 0 {
            return (0, 0);
        }
        (local_id % self.columns, local_id / self.columns)
    }

    pub fn apply(&mut self, patch: &TileSetPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(w) = patch.tilewidth {
            self.tilewidth = w;
        }
        if let Some(h) = patch.tileheight {
            self.tileheight = h;
        }
        if let Some(m) = patch.margin {
            self.margin = m;
        }
        if let Some(s) = patch.spacing {
            self.spacing = s;
        }
        self.recompute_derived();
    }
}

/// How many tiles of `tile` pixels fit into `extent` pixels.
fn fit(extent: u32, tile: u32, margin: u32, spacing: u32) -> u32 {
    if tile == 0 {
        return 0;
    }
    let usable = extent.saturating_sub(margin.saturating_mul(2)).saturating_add(spacing);
    usable / tile.saturating_add(spacing)
}

/// A partial update for an existing tileset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSetPatch {
    pub name: Option<String>,
    pub tilewidth: Option<u32>,
    pub tileheight: Option<u32>,
    pub margin: Option<u32>,
    pub spacing: Option<u32>,
}

/// Identity of a tileset within the current tileset list.
///
/// Tilesets carry no id of their own, so the hash digests the serialized
/// tileset together with its position in the list. Any edit to the tileset
/// produces a new hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSetHash(pub u64);

impl TileSetHash {
    pub fn of(tileset: &TileSet, index: usize) -> Self {
        let mut hasher = DefaultHasher::new();
        // String keys only, so serializing cannot fail.
        serde_json::to_string(tileset)
            .unwrap_or_default()
            .hash(&mut hasher);
        index.hash(&mut hasher);
        TileSetHash(hasher.finish())
    }
}

impl fmt::Display for TileSetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A tileset paired with its hash and position, as handed to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSetWithHash {
    pub index: usize,
    pub hash: TileSetHash,
    pub tileset: TileSet,
}

/// Computes the hashed view of a tileset list.
pub fn hash_tilesets(tilesets: &[TileSet]) -> Vec<TileSetWithHash> {
    tilesets
        .iter()
        .enumerate()
        .map(|(index, tileset)| TileSetWithHash {
            index,
            hash: TileSetHash::of(tileset, index),
            tileset: tileset.clone(),
        })
        .collect()
}
