// src/map/mod.rs
pub mod gid;
pub mod layer;
pub mod tilemap;
pub mod tileset;

pub use gid::{clean_gid, resolve_gid, FlipFlags, ResolvedTile, EMPTY_GID};
pub use layer::{default_layer_name, LayerType, TileMapLayer};
pub use tilemap::{DrawLayer, LayerMove, TileMap};
pub use tileset::{hash_tilesets, TileSet, TileSetHash, TileSetPatch, TileSetWithHash};
