// src/map/layer.rs

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::utils::grid::{cell_of_index, index_of_cell, GridRect};
use crate::utils::util::capitalize;

/// The kinds of layer a map can hold. Only tile layers and groups are
/// editable; object and image layers keep their Tiled payload in
/// [`TileMapLayer::extra`] so it survives a load/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    TileLayer,
    #[serde(alias = "objectlayer")]
    ObjectGroup,
    ImageLayer,
    Group,
}

impl LayerType {
    /// Returns a user-friendly name for the layer type.
    pub fn label(&self) -> &'static str {
        match self {
            LayerType::TileLayer => "Tile layer",
            LayerType::ObjectGroup => "Object layer",
            LayerType::ImageLayer => "Image layer",
            LayerType::Group => "Group",
        }
    }

    pub fn all() -> &'static [LayerType] {
        &[
            LayerType::TileLayer,
            LayerType::ImageLayer,
            LayerType::ObjectGroup,
            LayerType::Group,
        ]
    }

    /// Whether the editor can create layers of this kind.
    pub fn is_supported(&self) -> bool {
        matches!(self, LayerType::TileLayer | LayerType::Group)
    }

    fn key(&self) -> &'static str {
        match self {
            LayerType::TileLayer => "tilelayer",
            LayerType::ObjectGroup => "objectlayer",
            LayerType::ImageLayer => "imagelayer",
            LayerType::Group => "group",
        }
    }
}

/// Builds the name a new layer gets when the user doesn't pick one,
/// e.g. "Tile layer 3" or "Group 4".
pub fn default_layer_name(layer_type: LayerType, id: u32) -> String {
    let key = layer_type.key();
    let base = match key.split_once("layer") {
        Some((prefix, _)) => format!("{prefix} Layer"),
        None => key.to_owned(),
    };
    format!("{} {}", capitalize(&base), id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMapLayer {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u32>,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<TileMapLayer>,
    /// Tiled fields the editor doesn't model (`objects`, `draworder`,
    /// `image`, `properties`, ...), written back as they were read.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn one() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}

impl TileMapLayer {
    /// Creates a layer with its default name. Tile layers start out empty
    /// (all zeros); other kinds carry no cell data.
    pub fn new(id: u32, layer_type: LayerType, width: u32, height: u32) -> Self {
        let data = if layer_type == LayerType::TileLayer {
            vec![0; width as usize * height as usize]
        } else {
            Vec::new()
        };
        Self {
            id,
            name: default_layer_name(layer_type, id),
            width,
            height,
            x: 0,
            y: 0,
            layer_type,
            data,
            opacity: 1.0,
            visible: true,
            layers: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_tile_layer(&self) -> bool {
        self.layer_type == LayerType::TileLayer
    }

    pub fn is_group(&self) -> bool {
        self.layer_type == LayerType::Group
    }

    pub fn cell(&self, index: usize) -> Option<u32> {
        self.data.get(index).copied()
    }

    pub fn get(&self, col: u32, row: u32) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cell(index_of_cell(col, row, self.width))
    }

    pub fn set(&mut self, index: usize, gid: u32) -> Result<()> {
        let len = self.data.len();
        match self.data.get_mut(index) {
            Some(cell) => {
                *cell = gid;
                Ok(())
            }
            None => Err(EditorError::GridIndexOutOfBounds { index, len }),
        }
    }

    /// Resizes the cell grid, keeping the overlapping top-left region.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.is_tile_layer() {
            let mut data = vec![0; width as usize * height as usize];
            for row in 0..self.height.min(height) {
                for col in 0..self.width.min(width) {
                    if let Some(gid) = self.get(col, row) {
                        data[index_of_cell(col, row, width)] = gid;
                    }
                }
            }
            self.data = data;
        }
        self.width = width;
        self.height = height;
        for child in &mut self.layers {
            child.resize(width, height);
        }
    }

    /// Replaces the 4-connected region of equal cells around `start` with
    /// `gid`. Returns how many cells changed.
    pub fn flood_fill(&mut self, start: usize, gid: u32) -> Result<usize> {
        let target = self.cell(start).ok_or(EditorError::GridIndexOutOfBounds {
            index: start,
            len: self.data.len(),
        })?;
        if target == gid {
            return Ok(0);
        }

        let mut changed = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            if self.data[index] != target {
                continue;
            }
            self.data[index] = gid;
            changed += 1;

            let (col, row) = cell_of_index(index, self.width);
            if col > 0 {
                queue.push_back(index - 1);
            }
            if col + 1 < self.width {
                queue.push_back(index + 1);
            }
            if row > 0 {
                queue.push_back(index - self.width as usize);
            }
            if row + 1 < self.height {
                queue.push_back(index + self.width as usize);
            }
        }
        Ok(changed)
    }

    /// Sets every cell inside `rect` to `gid`. Returns how many cells changed.
    pub fn fill_rect(&mut self, rect: GridRect, gid: u32) -> usize {
        let mut changed = 0;
        for index in rect.indices(self.width, self.height) {
            if let Some(cell) = self.data.get_mut(index) {
                if *cell != gid {
                    *cell = gid;
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        assert_eq!(default_layer_name(LayerType::TileLayer, 1), "Tile layer 1");
        assert_eq!(default_layer_name(LayerType::ImageLayer, 2), "Image layer 2");
        assert_eq!(default_layer_name(LayerType::ObjectGroup, 7), "Object layer 7");
        assert_eq!(default_layer_name(LayerType::Group, 3), "Group 3");
    }

    #[test]
    fn test_new_tile_layer_is_zeroed() {
        let layer = TileMapLayer::new(4, LayerType::TileLayer, 3, 2);
        assert_eq!(layer.data, vec![0; 6]);
        assert_eq!(layer.name, "Tile layer 4");
        assert!(layer.visible);
        assert_eq!(layer.opacity, 1.0);

        let group = TileMapLayer::new(5, LayerType::Group, 3, 2);
        assert!(group.data.is_empty());
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut layer = TileMapLayer::new(1, LayerType::TileLayer, 2, 2);
        layer.set(3, 9).unwrap();
        assert_eq!(layer.get(1, 1), Some(9));
        let err = layer.set(4, 1).unwrap_err();
        assert!(matches!(err, EditorError::GridIndexOutOfBounds { index: 4, len: 4 }));
        assert_eq!(layer.get(2, 0), None);
    }

    #[test]
    fn test_resize_keeps_top_left() {
        let mut layer = TileMapLayer::new(1, LayerType::TileLayer, 3, 2);
        layer.data = vec![1, 2, 3, 4, 5, 6];
        layer.resize(2, 3);
        assert_eq!(layer.data, vec![1, 2, 4, 5, 0, 0]);
        layer.resize(4, 1);
        assert_eq!(layer.data, vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_resize_recurses_into_groups() {
        let mut group = TileMapLayer::new(1, LayerType::Group, 2, 2);
        group.layers.push(TileMapLayer::new(2, LayerType::TileLayer, 2, 2));
        group.resize(5, 5);
        assert_eq!(group.layers[0].data.len(), 25);
        assert_eq!(group.width, 5);
    }

    #[test]
    fn test_flood_fill_is_four_connected() {
        let mut layer = TileMapLayer::new(1, LayerType::TileLayer, 4, 3);
        #[rustfmt::skip]
        let data = vec![
            0, 0, 1, 0,
            1, 0, 1, 0,
            0, 1, 0, 0,
        ];
        layer.data = data;
        let changed = layer.flood_fill(0, 7).unwrap();
        assert_eq!(changed, 3);
        #[rustfmt::skip]
        let expected = vec![
            7, 7, 1, 0,
            1, 7, 1, 0,
            0, 1, 0, 0,
        ];
        assert_eq!(layer.data, expected);
    }

    #[test]
    fn test_flood_fill_same_value_is_noop() {
        let mut layer = TileMapLayer::new(1, LayerType::TileLayer, 3, 3);
        assert_eq!(layer.flood_fill(4, 0).unwrap(), 0);
        assert_eq!(layer.flood_fill(4, 2).unwrap(), 9);
        assert!(layer.flood_fill(9, 2).is_err());
    }

    #[test]
    fn test_fill_rect() {
        let mut layer = TileMapLayer::new(1, LayerType::TileLayer, 3, 3);
        layer.data = vec![1; 9];
        let cleared = layer.fill_rect(GridRect::from_corners((1, 1), (5, 5)), 0);
        assert_eq!(cleared, 4);
        assert_eq!(layer.data, vec![1, 1, 1, 1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_layer_type_serde_names() {
        let json = serde_json::to_string(&LayerType::TileLayer).unwrap();
        assert_eq!(json, "\"tilelayer\"");
        let legacy: LayerType = serde_json::from_str("\"objectlayer\"").unwrap();
        assert_eq!(legacy, LayerType::ObjectGroup);
        let tiled: LayerType = serde_json::from_str("\"objectgroup\"").unwrap();
        assert_eq!(tiled, LayerType::ObjectGroup);
    }
}
