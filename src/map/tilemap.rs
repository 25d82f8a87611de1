// src/map/tilemap.rs

use serde::{Deserialize, Serialize};

use super::gid::{resolve_gid, ResolvedTile};
use super::layer::{LayerType, TileMapLayer};
use super::tileset::TileSet;
use crate::error::{EditorError, Result};

/// Direction for moving a layer within its sibling list. "Up" means towards
/// the top of the layer panel, which is the end of the draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    Up,
    Down,
}

/// A map in Tiled's JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default = "orthogonal")]
    pub orientation: String,
    #[serde(default = "right_down")]
    pub renderorder: String,
    #[serde(default)]
    pub layers: Vec<TileMapLayer>,
    #[serde(default)]
    pub tilesets: Vec<TileSet>,
    #[serde(default = "one")]
    pub nextlayerid: u32,
    #[serde(default = "one")]
    pub nextobjectid: u32,
    #[serde(rename = "type", default = "map_type")]
    pub map_type: String,
    #[serde(default = "format_version")]
    pub version: String,
    #[serde(default = "format_version")]
    pub tiledversion: String,
    #[serde(default)]
    pub infinite: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn orthogonal() -> String {
    "orthogonal".into()
}
fn right_down() -> String {
    "right-down".into()
}
fn map_type() -> String {
    "map".into()
}
fn format_version() -> String {
    "1.10".into()
}
fn one() -> u32 {
    1
}

/// A tile layer as it should be drawn, after its ancestors' opacity and
/// visibility have been applied.
#[derive(Debug, Clone, Copy)]
pub struct DrawLayer<'a> {
    pub layer: &'a TileMapLayer,
    pub opacity: f32,
}

impl TileMap {
    /// A map with a single empty tile layer (id 1).
    pub fn new(width: u32, height: u32, tilewidth: u32, tileheight: u32) -> Self {
        let mut map = Self {
            width,
            height,
            tilewidth,
            tileheight,
            orientation: orthogonal(),
            renderorder: right_down(),
            layers: Vec::new(),
            tilesets: Vec::new(),
            nextlayerid: 1,
            nextobjectid: 1,
            map_type: map_type(),
            version: format_version(),
            tiledversion: format_version(),
            infinite: false,
            extra: serde_json::Map::new(),
        };
        map.add_layer(LayerType::TileLayer);
        map
    }

    /// Brings a freshly deserialized map into a consistent state: derived
    /// tileset data, tile layer sizes and the layer id counter.
    pub fn normalize(&mut self) {
        for tileset in &mut self.tilesets {
            tileset.recompute_derived();
        }
        let (width, height) = (self.width, self.height);
        for layer in &mut self.layers {
            if layer.width != width || layer.height != height || layer.data.len() != cell_count(width, height) {
                fix_layer_size(layer, width, height);
            }
        }
        let max_id = self.all_layer_ids().into_iter().max().unwrap_or(0);
        self.nextlayerid = self.nextlayerid.max(max_id.saturating_add(1));
    }

    /// The first gid free for a new tileset.
    pub fn next_gid(&self) -> u32 {
        self.tilesets.iter().map(TileSet::end_gid).max().unwrap_or(1).max(1)
    }

    pub fn resolve(&self, raw_gid: u32) -> Option<ResolvedTile> {
        resolve_gid(&self.tilesets, raw_gid)
    }

    pub fn find_layer(&self, id: u32) -> Option<&TileMapLayer> {
        find_in(&self.layers, id)
    }

    pub fn find_layer_mut(&mut self, id: u32) -> Option<&mut TileMapLayer> {
        find_in_mut(&mut self.layers, id)
    }

    /// Ids of every layer, depth-first in draw order.
    pub fn all_layer_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        collect_ids(&self.layers, &mut ids);
        ids
    }

    pub fn first_tile_layer_id(&self) -> Option<u32> {
        self.all_layer_ids()
            .into_iter()
            .find(|id| self.find_layer(*id).is_some_and(TileMapLayer::is_tile_layer))
    }

    /// Appends a new top-level layer and returns its id.
    pub fn add_layer(&mut self, layer_type: LayerType) -> u32 {
        let id = self.nextlayerid;
        self.layers.push(TileMapLayer::new(id, layer_type, self.width, self.height));
        self.nextlayerid += 1;
        id
    }

    /// Removes a layer (and its children, for groups) anywhere in the tree.
    pub fn remove_layer(&mut self, id: u32) -> Result<TileMapLayer> {
        remove_in(&mut self.layers, id).ok_or(EditorError::UnknownLayer(id))
    }

    /// Moves a layer one step within its sibling list. Returns false when it
    /// is already at that end.
    pub fn move_layer(&mut self, id: u32, direction: LayerMove) -> Result<bool> {
        let siblings = siblings_of(&mut self.layers, id).ok_or(EditorError::UnknownLayer(id))?;
        let Some(pos) = siblings.iter().position(|l| l.id == id) else {
            return Err(EditorError::UnknownLayer(id));
        };
        let target = match direction {
            LayerMove::Up if pos + 1 < siblings.len() => pos + 1,
            LayerMove::Down if pos > 0 => pos - 1,
            _ => return Ok(false),
        };
        siblings.swap(pos, target);
        Ok(true)
    }

    pub fn set_width(&mut self, width: u32) -> Result<()> {
        if width == 0 {
            return Err(EditorError::InvalidDimension { field: "width", value: width });
        }
        self.resize(width, self.height);
        Ok(())
    }

    pub fn set_height(&mut self, height: u32) -> Result<()> {
        if height == 0 {
            return Err(EditorError::InvalidDimension { field: "height", value: height });
        }
        self.resize(self.width, height);
        Ok(())
    }

    pub fn set_tile_width(&mut self, tilewidth: u32) -> Result<()> {
        if tilewidth == 0 {
            return Err(EditorError::InvalidDimension { field: "tilewidth", value: tilewidth });
        }
        self.tilewidth = tilewidth;
        Ok(())
    }

    pub fn set_tile_height(&mut self, tileheight: u32) -> Result<()> {
        if tileheight == 0 {
            return Err(EditorError::InvalidDimension { field: "tileheight", value: tileheight });
        }
        self.tileheight = tileheight;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for layer in &mut self.layers {
            layer.resize(width, height);
        }
    }

    /// Visible tile layers in draw order, groups expanded depth-first.
    pub fn flattened_layers(&self) -> Vec<DrawLayer<'_>> {
        let mut out = Vec::new();
        flatten(&self.layers, 1.0, &mut out);
        out
    }
}

fn fix_layer_size(layer: &mut TileMapLayer, width: u32, height: u32) {
    if layer.is_tile_layer() {
        let len = cell_count(width, height);
        if layer.width == width && layer.height == height {
            layer.data.resize(len, 0);
        } else if layer.data.len() == cell_count(layer.width, layer.height) {
            layer.resize(width, height);
        } else {
            layer.data.resize(len, 0);
        }
    }
    layer.width = width;
    layer.height = height;
    for child in &mut layer.layers {
        fix_layer_size(child, width, height);
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn find_in(layers: &[TileMapLayer], id: u32) -> Option<&TileMapLayer> {
    for layer in layers {
        if layer.id == id {
            return Some(layer);
        }
        if let Some(found) = find_in(&layer.layers, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut(layers: &mut [TileMapLayer], id: u32) -> Option<&mut TileMapLayer> {
    for layer in layers {
        if layer.id == id {
            return Some(layer);
        }
        if let Some(found) = find_in_mut(&mut layer.layers, id) {
            return Some(found);
        }
    }
    None
}

fn collect_ids(layers: &[TileMapLayer], ids: &mut Vec<u32>) {
    for layer in layers {
        ids.push(layer.id);
        collect_ids(&layer.layers, ids);
    }
}

fn remove_in(layers: &mut Vec<TileMapLayer>, id: u32) -> Option<TileMapLayer> {
    if let Some(pos) = layers.iter().position(|l| l.id == id) {
        return Some(layers.remove(pos));
    }
    layers.iter_mut().find_map(|l| remove_in(&mut l.layers, id))
}

fn siblings_of(layers: &mut Vec<TileMapLayer>, id: u32) -> Option<&mut Vec<TileMapLayer>> {
    if layers.iter().any(|l| l.id == id) {
        return Some(layers);
    }
    layers.iter_mut().find_map(|l| siblings_of(&mut l.layers, id))
}

fn flatten<'a>(layers: &'a [TileMapLayer], opacity: f32, out: &mut Vec<DrawLayer<'a>>) {
    for layer in layers.iter().filter(|l| l.visible) {
        let opacity = opacity * layer.opacity;
        if layer.is_tile_layer() {
            out.push(DrawLayer { layer, opacity });
        } else if layer.is_group() {
            flatten(&layer.layers, opacity, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn grouped_map() -> TileMap {
        // layers: [1 tile, 2 group [3 tile, 4 tile]]
        let mut map = TileMap::new(4, 4, 16, 16);
        let group = map.add_layer(LayerType::Group);
        let a = TileMapLayer::new(3, LayerType::TileLayer, 4, 4);
        let b = TileMapLayer::new(4, LayerType::TileLayer, 4, 4);
        map.find_layer_mut(group).unwrap().layers.extend([a, b]);
        map.nextlayerid = 5;
        map
    }

    #[test]
    fn test_new_map_has_one_tile_layer() {
        let map = TileMap::new(30, 30, 32, 32);
        assert_eq!(map.layers.len(), 1);
        assert_eq!(map.layers[0].id, 1);
        assert_eq!(map.layers[0].data.len(), 900);
        assert_eq!(map.nextlayerid, 2);
        assert_eq!(map.next_gid(), 1);
    }

    #[test]
    fn test_next_gid_uses_highest_range() {
        let mut map = TileMap::new(2, 2, 16, 16);
        map.tilesets.push(TileSet::new("a", "a.png", 16, 16, 64, 64, 1)); // 1..=16
        map.tilesets.push(TileSet::new("b", "b.png", 16, 16, 32, 16, 40)); // 40..=41
        map.tilesets.push(TileSet::new("c", "c.png", 16, 16, 32, 32, 17)); // 17..=20
        assert_eq!(map.next_gid(), 42);
    }

    #[test]
    fn test_next_gid_near_the_top_of_the_range() {
        let json = r#"{
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "tilesets": [
                { "name": "t", "image": "t.png", "tilewidth": 16, "tileheight": 16,
                  "imagewidth": 64, "imageheight": 64, "firstgid": 4294967290 }
            ]
        }"#;
        let mut map: TileMap = serde_json::from_str(json).unwrap();
        map.normalize();
        assert_eq!(map.next_gid(), u32::MAX);
        assert_eq!(map.resolve(5), None);
    }

    #[test]
    fn test_find_layer_recurses() {
        let mut map = grouped_map();
        assert_eq!(map.find_layer(4).map(|l| l.id), Some(4));
        map.find_layer_mut(3).unwrap().name = "inner".into();
        assert_eq!(map.find_layer(3).unwrap().name, "inner");
        assert!(map.find_layer(99).is_none());
        assert_eq!(map.all_layer_ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_add_and_remove_layers() {
        let mut map = grouped_map();
        let id = map.add_layer(LayerType::TileLayer);
        assert_eq!(id, 5);
        assert_eq!(map.nextlayerid, 6);
        let removed = map.remove_layer(3).unwrap();
        assert_eq!(removed.id, 3);
        assert_eq!(map.all_layer_ids(), vec![1, 2, 4, 5]);
        assert!(matches!(map.remove_layer(3), Err(EditorError::UnknownLayer(3))));
    }

    #[test]
    fn test_move_layer_within_siblings() {
        let mut map = grouped_map();
        assert!(map.move_layer(3, LayerMove::Up).unwrap());
        assert_eq!(map.all_layer_ids(), vec![1, 2, 4, 3]);
        assert!(!map.move_layer(3, LayerMove::Up).unwrap());
        assert!(map.move_layer(2, LayerMove::Down).unwrap());
        assert_eq!(map.all_layer_ids(), vec![2, 4, 3, 1]);
        assert!(map.move_layer(42, LayerMove::Down).is_err());
    }

    #[test]
    fn test_dimensions_reject_zero() {
        let mut map = TileMap::new(2, 2, 16, 16);
        assert!(map.set_width(0).is_err());
        assert!(map.set_height(0).is_err());
        assert!(map.set_tile_width(0).is_err());
        assert!(map.set_tile_height(0).is_err());
        assert_eq!((map.width, map.height, map.tilewidth, map.tileheight), (2, 2, 16, 16));
    }

    #[test]
    fn test_resize_keeps_tiles_in_groups() {
        let mut map = grouped_map();
        map.find_layer_mut(3).unwrap().set(5, 7).unwrap(); // (1, 1)
        map.set_width(6).unwrap();
        let inner = map.find_layer(3).unwrap();
        assert_eq!(inner.data.len(), 24);
        assert_eq!(inner.get(1, 1), Some(7));
        map.set_height(1).unwrap();
        assert_eq!(map.find_layer(3).unwrap().data, vec![0; 6]);
        assert!(map.find_layer(2).unwrap().data.is_empty());
    }

    #[test]
    fn test_flattened_layers_inherit_group_state() {
        let mut map = grouped_map();
        map.find_layer_mut(2).unwrap().opacity = 0.5;
        map.find_layer_mut(3).unwrap().opacity = 0.5;
        map.find_layer_mut(4).unwrap().visible = false;

        let flat = map.flattened_layers();
        let ids: Vec<u32> = flat.iter().map(|d| d.layer.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_approx_eq!(flat[1].opacity, 0.25);

        map.find_layer_mut(2).unwrap().visible = false;
        assert_eq!(map.flattened_layers().len(), 1);
    }

    #[test]
    fn test_normalize_repairs_loaded_map() {
        let json = r#"{
            "width": 2, "height": 2, "tilewidth": 8, "tileheight": 8,
            "layers": [
                { "id": 7, "name": "broken", "type": "tilelayer", "data": [] }
            ],
            "tilesets": [
                { "name": "t", "image": "t.png", "tilewidth": 8, "tileheight": 8,
                  "imagewidth": 32, "imageheight": 16, "firstgid": 1 }
            ]
        }"#;
        let mut map: TileMap = serde_json::from_str(json).unwrap();
        map.normalize();
        assert_eq!(map.layers[0].data, vec![0; 4]);
        assert_eq!(map.nextlayerid, 8);
        assert_eq!(map.tilesets[0].tilecount, 8);
        assert_eq!(map.orientation, "orthogonal");
        assert_eq!(map.map_type, "map");
    }

    #[test]
    fn test_unknown_fields_are_written_back() {
        let json = r#"{
            "width": 2, "height": 2, "tilewidth": 8, "tileheight": 8,
            "properties": [{ "name": "music", "type": "string", "value": "theme.ogg" }],
            "layers": [
                { "id": 1, "name": "ground", "type": "tilelayer", "data": [0, 0, 0, 0] },
                { "id": 2, "name": "things", "type": "objectgroup", "draworder": "topdown",
                  "objects": [{ "id": 1, "name": "spawn", "x": 8.0, "y": 4.0 }] },
                { "id": 3, "name": "sky", "type": "imagelayer", "image": "sky.png" }
            ],
            "tilesets": [
                { "name": "t", "image": "t.png", "tilewidth": 8, "tileheight": 8,
                  "imagewidth": 16, "imageheight": 16, "firstgid": 1,
                  "properties": [{ "name": "solid", "type": "bool", "value": true }] }
            ]
        }"#;
        let mut map: TileMap = serde_json::from_str(json).unwrap();
        map.normalize();
        let value = serde_json::to_value(&map).unwrap();

        assert_eq!(value["properties"][0]["value"], "theme.ogg");
        assert_eq!(value["layers"][1]["draworder"], "topdown");
        assert_eq!(value["layers"][1]["objects"][0]["name"], "spawn");
        assert_eq!(value["layers"][2]["image"], "sky.png");
        assert_eq!(value["tilesets"][0]["properties"][0]["name"], "solid");
        // Modelled fields are not duplicated into the extras.
        assert!(!map.layers[0].extra.contains_key("data"));
        assert!(!map.extra.contains_key("width"));
    }

    #[test]
    fn test_serializes_tiled_fields() {
        let map = TileMap::new(3, 2, 16, 16);
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["type"], "map");
        assert_eq!(value["renderorder"], "right-down");
        assert_eq!(value["infinite"], false);
        assert_eq!(value["layers"][0]["type"], "tilelayer");
        assert_eq!(value["layers"][0]["data"].as_array().unwrap().len(), 6);
    }
}
