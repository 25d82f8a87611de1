// src/editor/core.rs

use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::RwLock;

use super::commands::{EditorCommand, NewTileSetData};
use super::tools::{build_stamp, stamp_targets, MapInput, StampCell, TilePicker, TilesetInput, ToolBox};
use super::{EditorTool, SelectedTiles};
use crate::config::EditorConfig;
use crate::document::{self, Document};
use crate::error::{EditorError, Result};
use crate::map::{hash_tilesets, LayerType, TileMap, TileSet, TileSetHash, TileSetPatch, TileSetWithHash};
use crate::utils::util::{normalize_scale, SCALE_STEP};
use crate::utils::GridRect;

/// The core `Editor` struct: the shared document plus everything the UI
/// needs to know about the current editing session.
pub struct Editor {
    document: Arc<RwLock<Document>>,
    pub config: EditorConfig,

    scale: f32,
    current_layer_id: Option<u32>,
    selected_tool: EditorTool,
    selected_tiles: Option<SelectedTiles>,
    map_selection: Option<GridRect>,
    show_grid: bool,

    /// Messages or status for UI.
    pub status_message: String,
    pub error_message: Option<String>,

    tools: ToolBox,
    picker: TilePicker,
}

impl Editor {
    /// Create an editor with a fresh map sized from `config`.
    pub fn new(config: EditorConfig) -> Self {
        let doc = Document::new(new_map(&config));
        Self::with_document(config, doc)
    }

    pub fn with_document(config: EditorConfig, doc: Document) -> Self {
        let current_layer_id = doc.map.first_tile_layer_id();
        Self {
            document: Arc::new(RwLock::new(doc)),
            scale: normalize_scale(config.scale).unwrap_or(1.0),
            show_grid: config.show_grid,
            config,
            current_layer_id,
            selected_tool: EditorTool::default(),
            selected_tiles: None,
            map_selection: None,
            status_message: String::new(),
            error_message: None,
            tools: ToolBox::default(),
            picker: TilePicker::default(),
        }
    }

    /// Returns the document arc.
    pub fn document(&self) -> Arc<RwLock<Document>> {
        Arc::clone(&self.document)
    }

    /// Sets a new Document, discarding the old one and every selection that
    /// pointed into it.
    pub fn set_document(&mut self, doc: Document) {
        self.current_layer_id = doc.map.first_tile_layer_id();
        *self.document.write() = doc;
        self.selected_tiles = None;
        self.map_selection = None;
        self.tools.cleanup_all();
        self.picker.cleanup();
        self.error_message = None;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn current_layer_id(&self) -> Option<u32> {
        self.current_layer_id
    }

    pub fn selected_tool(&self) -> EditorTool {
        self.selected_tool
    }

    pub fn selected_tiles(&self) -> Option<&SelectedTiles> {
        self.selected_tiles.as_ref()
    }

    pub fn map_selection(&self) -> Option<GridRect> {
        self.map_selection
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.document.read().dirty
    }

    /// The current tilesets with their hashes.
    pub fn tilesets(&self) -> Vec<TileSetWithHash> {
        hash_tilesets(&self.document.read().map.tilesets)
    }

    /// The stamp the Paint tool would place, for the canvas preview.
    pub fn current_stamp(&self) -> Vec<StampCell> {
        let Some(selected) = &self.selected_tiles else {
            return Vec::new();
        };
        let doc = self.document.read();
        match find_tileset(&doc.map.tilesets, selected.tileset_hash) {
            Some(index) => build_stamp(&doc.map.tilesets[index], &selected.tile_indices),
            None => Vec::new(),
        }
    }

    /// Raw gid of the current layer at `grid_index`, for the status bar.
    pub fn gid_at(&self, grid_index: usize) -> Option<u32> {
        let doc = self.document.read();
        let layer = doc.map.find_layer(self.current_layer_id?)?;
        layer.cell(grid_index)
    }

    // ----------------- Commands -----------------

    /// Execute a command, reporting failures through `error_message`.
    pub fn execute_command(&mut self, command: EditorCommand) {
        let name = command.name();
        if let Err(err) = self.try_execute(command) {
            warn!("{} failed: {}", name, err);
            self.error_message = Some(format!("{}: {}", name, err));
        }
    }

    pub fn execute_commands(&mut self, commands: impl IntoIterator<Item = EditorCommand>) {
        for command in commands {
            self.execute_command(command);
        }
    }

    /// Execute a command and hand back any error.
    pub fn try_execute(&mut self, command: EditorCommand) -> Result<()> {
        let name = command.name();
        let edits_document = command.edits_document();
        let changed = self.apply(command)?;
        if changed && edits_document {
            self.document.write().dirty = true;
        }
        debug!(
            "{}: changed={} layer={:?} tool={} scale={} tiles={:?} selection={:?}",
            name,
            changed,
            self.current_layer_id,
            self.selected_tool.name(),
            self.scale,
            self.selected_tiles.as_ref().map(|s| s.tile_indices.len()),
            self.map_selection,
        );
        Ok(())
    }

    /// Applies one command. `Ok(false)` means nothing changed.
    fn apply(&mut self, command: EditorCommand) -> Result<bool> {
        match command {
            EditorCommand::SetScale(scale) => Ok(self.set_scale(scale)),
            EditorCommand::ZoomIn => Ok(self.set_scale(self.scale + SCALE_STEP)),
            EditorCommand::ZoomOut => Ok(self.set_scale(self.scale - SCALE_STEP)),
            EditorCommand::ResetZoom => Ok(self.set_scale(1.0)),
            EditorCommand::ToggleGrid => {
                self.show_grid = !self.show_grid;
                self.config.show_grid = self.show_grid;
                Ok(true)
            }
            EditorCommand::SetSelectedTool(tool) => {
                if tool == self.selected_tool {
                    return Ok(false);
                }
                self.tools.cleanup_all();
                self.selected_tool = tool;
                self.status_message = format!("Selected tool: {}", tool.name());
                Ok(true)
            }
            EditorCommand::SetSelectedTiles {
                tileset_hash,
                tile_indices,
            } => self.set_selected_tiles(tileset_hash, tile_indices),
            EditorCommand::SetMapSelection(rect) => {
                let changed = self.map_selection != rect;
                self.map_selection = rect;
                Ok(changed)
            }
            EditorCommand::PaintTiles { grid_index } => self.paint_tiles(grid_index),
            EditorCommand::EraseTiles { grid_index } => self.with_tile_layer(|layer| {
                let changed = layer.cell(grid_index).ok_or(EditorError::GridIndexOutOfBounds {
                    index: grid_index,
                    len: layer.data.len(),
                })? != 0;
                layer.set(grid_index, 0)?;
                Ok(changed)
            }),
            EditorCommand::FillTiles { grid_index } => self.fill_tiles(grid_index),
            EditorCommand::ClearSelectedRegion => match self.map_selection {
                Some(rect) => self.with_tile_layer(|layer| Ok(layer.fill_rect(rect, 0) > 0)),
                None => Ok(false),
            },
            EditorCommand::SetMapWidth(width) => self.edit_map(|map| map.set_width(width)),
            EditorCommand::SetMapHeight(height) => self.edit_map(|map| map.set_height(height)),
            EditorCommand::SetTileWidth(width) => self.edit_map(|map| map.set_tile_width(width)),
            EditorCommand::SetTileHeight(height) => self.edit_map(|map| map.set_tile_height(height)),
            EditorCommand::SelectLayer(id) => {
                if self.document.read().map.find_layer(id).is_none() {
                    return Ok(false);
                }
                let changed = self.current_layer_id != Some(id);
                self.current_layer_id = Some(id);
                Ok(changed)
            }
            EditorCommand::AddLayer(layer_type) => self.add_layer(layer_type),
            EditorCommand::RemoveLayer(id) => self.remove_layer(id),
            EditorCommand::MoveLayer(id, direction) => self.document.write().map.move_layer(id, direction),
            EditorCommand::SetLayerVisible(id, visible) => self.edit_layer(id, |layer| {
                let changed = layer.visible != visible;
                layer.visible = visible;
                changed
            }),
            EditorCommand::SetLayerOpacity(id, opacity) => {
                if !opacity.is_finite() {
                    return Ok(false);
                }
                let opacity = opacity.clamp(0.0, 1.0);
                self.edit_layer(id, |layer| {
                    let changed = layer.opacity != opacity;
                    layer.opacity = opacity;
                    changed
                })
            }
            EditorCommand::RenameLayer(id, name) => {
                let name = name.trim().to_owned();
                if name.is_empty() {
                    return Ok(false);
                }
                self.edit_layer(id, |layer| {
                    let changed = layer.name != name;
                    layer.name = name;
                    changed
                })
            }
            EditorCommand::AddTileSet(data) => self.add_tileset(data),
            EditorCommand::UpdateTileSet { hash, patch } => self.update_tileset(hash, &patch),
            EditorCommand::DeleteTileSet { hash } => self.delete_tileset(hash),
            EditorCommand::NewMap => {
                self.set_document(Document::new(new_map(&self.config)));
                self.status_message = "Created new map.".to_string();
                Ok(true)
            }
            EditorCommand::Batch(commands) => {
                // Each step marks the document on its own, so a later
                // failure can't hide the edits that already went through.
                let mut changed = false;
                for command in commands {
                    let edits_document = command.edits_document();
                    let step_changed = self.apply(command)?;
                    if step_changed && edits_document {
                        self.document.write().dirty = true;
                    }
                    changed |= step_changed;
                }
                Ok(changed)
            }
        }
    }

    fn set_scale(&mut self, requested: f32) -> bool {
        match normalize_scale(requested) {
            Some(scale) if scale != self.scale => {
                self.scale = scale;
                true
            }
            _ => false,
        }
    }

    fn set_selected_tiles(&mut self, tileset_hash: TileSetHash, tile_indices: Vec<u32>) -> Result<bool> {
        if find_tileset(&self.document.read().map.tilesets, tileset_hash).is_none() {
            return Err(EditorError::UnknownTileSet(tileset_hash));
        }
        let selection = (!tile_indices.is_empty()).then_some(SelectedTiles {
            tileset_hash,
            tile_indices,
        });
        let changed = self.selected_tiles != selection;
        self.selected_tiles = selection;
        Ok(changed)
    }

    /// Runs `f` on the current layer if it is a tile layer. Without one the
    /// edit is silently skipped.
    fn with_tile_layer<F>(&mut self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut crate::map::TileMapLayer) -> Result<bool>,
    {
        let Some(id) = self.current_layer_id else {
            return Ok(false);
        };
        let mut doc = self.document.write();
        match doc.map.find_layer_mut(id) {
            Some(layer) if layer.is_tile_layer() => f(layer),
            _ => Ok(false),
        }
    }

    fn edit_map<F>(&mut self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut TileMap) -> Result<()>,
    {
        f(&mut self.document.write().map)?;
        Ok(true)
    }

    fn edit_layer<F>(&mut self, id: u32, f: F) -> Result<bool>
    where
        F: FnOnce(&mut crate::map::TileMapLayer) -> bool,
    {
        let mut doc = self.document.write();
        let layer = doc.map.find_layer_mut(id).ok_or(EditorError::UnknownLayer(id))?;
        Ok(f(layer))
    }

    fn paint_tiles(&mut self, grid_index: usize) -> Result<bool> {
        let stamp = self.current_stamp();
        if stamp.is_empty() {
            return Ok(false);
        }
        let (width, height) = {
            let doc = self.document.read();
            (doc.map.width, doc.map.height)
        };
        self.with_tile_layer(|layer| {
            if grid_index >= layer.data.len() {
                return Err(EditorError::GridIndexOutOfBounds {
                    index: grid_index,
                    len: layer.data.len(),
                });
            }
            let mut changed = false;
            for (index, gid) in stamp_targets(&stamp, grid_index, width, height) {
                if layer.cell(index) != Some(gid) {
                    layer.set(index, gid)?;
                    changed = true;
                }
            }
            Ok(changed)
        })
    }

    fn fill_tiles(&mut self, grid_index: usize) -> Result<bool> {
        let Some(gid) = self.current_stamp().first().map(|cell| cell.gid) else {
            return Ok(false);
        };
        self.with_tile_layer(|layer| Ok(layer.flood_fill(grid_index, gid)? > 0))
    }

    fn add_layer(&mut self, layer_type: LayerType) -> Result<bool> {
        if !layer_type.is_supported() {
            return Err(EditorError::UnsupportedLayerType(layer_type.label()));
        }
        let id = self.document.write().map.add_layer(layer_type);
        if layer_type == LayerType::TileLayer {
            self.current_layer_id = Some(id);
        }
        Ok(true)
    }

    fn remove_layer(&mut self, id: u32) -> Result<bool> {
        let mut doc = self.document.write();
        doc.map.remove_layer(id)?;
        let current_gone = self
            .current_layer_id
            .map_or(true, |current| doc.map.find_layer(current).is_none());
        if current_gone {
            self.current_layer_id = doc.map.first_tile_layer_id();
        }
        Ok(true)
    }

    fn add_tileset(&mut self, data: NewTileSetData) -> Result<bool> {
        if data.tile_width == 0 {
            return Err(EditorError::InvalidDimension { field: "tile width", value: 0 });
        }
        if data.tile_height == 0 {
            return Err(EditorError::InvalidDimension { field: "tile height", value: 0 });
        }
        let mut doc = self.document.write();
        let name = data.image.name.clone();
        let tileset = TileSet::new(
            name.clone(),
            name.clone(),
            data.tile_width,
            data.tile_height,
            data.image.width,
            data.image.height,
            doc.map.next_gid(),
        );
        if tileset.tilecount == 0 {
            warn!("Tileset {} is smaller than one tile", name);
        }
        info!("Added tileset {} with gids {}..{}", name, tileset.firstgid, tileset.end_gid());
        doc.insert_image(data.image);
        doc.map.tilesets.push(tileset);
        self.status_message = format!("Added tileset {}", name);
        Ok(true)
    }

    fn update_tileset(&mut self, hash: TileSetHash, patch: &TileSetPatch) -> Result<bool> {
        if patch.tilewidth == Some(0) {
            return Err(EditorError::InvalidDimension { field: "tile width", value: 0 });
        }
        if patch.tileheight == Some(0) {
            return Err(EditorError::InvalidDimension { field: "tile height", value: 0 });
        }
        let mut doc = self.document.write();
        let index = find_tileset(&doc.map.tilesets, hash).ok_or(EditorError::UnknownTileSet(hash))?;
        let tileset = &mut doc.map.tilesets[index];
        tileset.apply(patch);
        let new_hash = TileSetHash::of(tileset, index);
        let tilecount = tileset.tilecount;

        if let Some(selected) = self.selected_tiles.as_mut().filter(|s| s.tileset_hash == hash) {
            selected.tileset_hash = new_hash;
            selected.tile_indices.retain(|&i| i < tilecount);
            if selected.tile_indices.is_empty() {
                self.selected_tiles = None;
            }
        }
        Ok(new_hash != hash)
    }

    fn delete_tileset(&mut self, hash: TileSetHash) -> Result<bool> {
        let mut doc = self.document.write();
        let before = hash_tilesets(&doc.map.tilesets);
        let index = before
            .iter()
            .find(|t| t.hash == hash)
            .map(|t| t.index)
            .ok_or(EditorError::UnknownTileSet(hash))?;
        let removed = doc.map.tilesets.remove(index);
        doc.prune_images();
        info!("Deleted tileset {}", removed.name);

        // Later tilesets moved up one slot, which changes their hashes.
        if let Some(selected) = self.selected_tiles.take() {
            let selected_index = before.iter().find(|t| t.hash == selected.tileset_hash).map(|t| t.index);
            self.selected_tiles = match selected_index {
                Some(i) if i == index => None,
                Some(i) if i > index => Some(SelectedTiles {
                    tileset_hash: TileSetHash::of(&doc.map.tilesets[i - 1], i - 1),
                    ..selected
                }),
                _ => Some(selected),
            };
        }
        Ok(true)
    }

    // ----------------- Input -----------------

    /// Routes a map canvas event to the active tool.
    pub fn handle_map_input(&mut self, input: MapInput) {
        let commands = self.tools.get_mut(self.selected_tool).handle_input(&input);
        self.execute_commands(commands);
    }

    /// Routes a tileset canvas event to the tile picker.
    pub fn handle_tileset_input(&mut self, hash: TileSetHash, input: TilesetInput) {
        let tileset = {
            let doc = self.document.read();
            find_tileset(&doc.map.tilesets, hash).map(|i| doc.map.tilesets[i].clone())
        };
        let Some(tileset) = tileset else {
            return;
        };
        if let Some(command) = self.picker.handle_input(hash, &tileset, &input) {
            self.execute_command(command);
        }
    }

    // ----------------- Document Management  -----------------

    pub fn open_document(&mut self, path: &Path) -> Result<()> {
        let doc = Document::load_from_path(path)?;
        self.set_document(doc);
        self.remember_directory(path);
        self.status_message = format!("Loaded map: {}", path.display());
        Ok(())
    }

    pub fn save_document(&mut self) -> Result<()> {
        self.save_with(Document::save)?;
        self.status_message = "Map saved.".to_string();
        Ok(())
    }

    pub fn save_document_as(&mut self, path: &Path) -> Result<()> {
        self.save_with(|doc| doc.save_to_path(path))?;
        self.remember_directory(path);
        self.status_message = format!("Saved map: {}", path.display());
        Ok(())
    }

    /// Saving can point a tileset at a new image name, which changes its
    /// hash; the tile selection follows the tileset by position.
    fn save_with(&mut self, save: impl FnOnce(&mut Document) -> Result<()>) -> Result<()> {
        let mut doc = self.document.write();
        let before = hash_tilesets(&doc.map.tilesets);
        save(&mut *doc)?;
        if let Some(selected) = self.selected_tiles.as_mut() {
            if let Some(entry) = before.iter().find(|entry| entry.hash == selected.tileset_hash) {
                if let Some(tileset) = doc.map.tilesets.get(entry.index) {
                    selected.tileset_hash = TileSetHash::of(tileset, entry.index);
                }
            }
        }
        Ok(())
    }

    pub fn export_png(&mut self, path: &Path) -> Result<()> {
        document::export_png(&self.document.read(), path)?;
        self.remember_directory(path);
        self.status_message = format!("Exported {}", path.display());
        Ok(())
    }

    /// A convenience wrapper for opening, logs on error.
    pub fn open_document_wrapper(&mut self, path: &Path) {
        if let Err(e) = self.open_document(path) {
            error!("Failed to open {}: {}", path.display(), e);
            self.error_message = Some(format!("Failed to open: {}", e));
        }
    }

    /// Saves to the known path. Returns false when the document has none yet
    /// and the caller has to ask for one.
    pub fn save_document_wrapper(&mut self) -> bool {
        match self.save_document() {
            Ok(()) => true,
            Err(EditorError::NoDocumentPath) => false,
            Err(e) => {
                error!("Failed to save document: {}", e);
                self.error_message = Some(format!("Failed to save: {}", e));
                true
            }
        }
    }

    pub fn save_document_as_wrapper(&mut self, path: &Path) {
        if let Err(e) = self.save_document_as(path) {
            error!("Failed to save {}: {}", path.display(), e);
            self.error_message = Some(format!("Failed to save: {}", e));
        }
    }

    pub fn export_png_wrapper(&mut self, path: &Path) {
        if let Err(e) = self.export_png(path) {
            error!("Failed to export {}: {}", path.display(), e);
            self.error_message = Some(format!("Failed to export: {}", e));
        }
    }

    fn remember_directory(&mut self, path: &Path) {
        if let Some(dir) = path.parent() {
            self.config.last_directory = Some(dir.to_path_buf());
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn new_map(config: &EditorConfig) -> TileMap {
    TileMap::new(config.map_width, config.map_height, config.tile_width, config.tile_height)
}

/// Position of the tileset whose current hash is `hash`.
fn find_tileset(tilesets: &[TileSet], hash: TileSetHash) -> Option<usize> {
    tilesets
        .iter()
        .enumerate()
        .position(|(index, tileset)| TileSetHash::of(tileset, index) == hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TilesetImage;
    use crate::editor::{PointerButton, PointerPhase};
    use crate::map::LayerMove;
    use assert_approx_eq::assert_approx_eq;

    fn small_config() -> EditorConfig {
        EditorConfig {
            map_width: 4,
            map_height: 3,
            tile_width: 8,
            tile_height: 8,
            ..Default::default()
        }
    }

    fn image(name: &str, width: u32, height: u32) -> TilesetImage {
        TilesetImage::from_rgba(name, width, height, vec![255; (width * height * 4) as usize]).unwrap()
    }

    /// Editor with one 4x2 tileset (gids 1..=8) and the Paint tool active.
    fn editor() -> (Editor, TileSetHash) {
        let mut editor = Editor::new(small_config());
        editor
            .try_execute(EditorCommand::AddTileSet(NewTileSetData {
                image: image("tiles.png", 32, 16),
                tile_width: 8,
                tile_height: 8,
            }))
            .unwrap();
        editor.try_execute(EditorCommand::SetSelectedTool(EditorTool::Paint)).unwrap();
        let hash = editor.tilesets()[0].hash;
        (editor, hash)
    }

    fn cells(editor: &Editor) -> Vec<u32> {
        let doc = editor.document.read();
        doc.map.find_layer(editor.current_layer_id().unwrap()).unwrap().data.clone()
    }

    fn press(cell: (u32, u32), button: PointerButton) -> MapInput {
        crate::editor::tools::input(cell, 4, button, PointerPhase::Pressed)
    }

    #[test]
    fn test_initial_state() {
        let editor = Editor::new(small_config());
        assert_eq!(editor.current_layer_id(), Some(1));
        assert_eq!(editor.selected_tool(), EditorTool::Cursor);
        assert_eq!(editor.scale(), 1.0);
        assert!(editor.show_grid());
        assert!(editor.tilesets().is_empty());
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn test_scale_commands() {
        let mut editor = Editor::default();
        editor.execute_command(EditorCommand::ZoomIn);
        editor.execute_command(EditorCommand::ZoomIn);
        editor.execute_command(EditorCommand::ZoomIn);
        assert_approx_eq!(editor.scale(), 1.3);
        editor.execute_command(EditorCommand::SetScale(0.0));
        editor.execute_command(EditorCommand::SetScale(-2.0));
        editor.execute_command(EditorCommand::SetScale(f32::NAN));
        assert_approx_eq!(editor.scale(), 1.3);
        editor.execute_command(EditorCommand::SetScale(50.0));
        assert_eq!(editor.scale(), 10.0);
        editor.execute_command(EditorCommand::ResetZoom);
        assert_eq!(editor.scale(), 1.0);
        // Zooming is not an edit.
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn test_add_tileset_assigns_gid_ranges() {
        let (mut editor, _) = editor();
        editor
            .try_execute(EditorCommand::AddTileSet(NewTileSetData {
                image: image("more.png", 16, 16),
                tile_width: 8,
                tile_height: 8,
            }))
            .unwrap();
        let tilesets = editor.tilesets();
        assert_eq!(tilesets[0].tileset.firstgid, 1);
        assert_eq!(tilesets[0].tileset.tilecount, 8);
        assert_eq!(tilesets[1].tileset.firstgid, 9);
        assert_eq!(tilesets[1].tileset.name, "more.png");
        assert!(editor.document.read().tileset_images.contains_key("more.png"));
        assert!(editor.has_unsaved_changes());
    }

    #[test]
    fn test_add_tileset_rejects_zero_tile_size() {
        let mut editor = Editor::default();
        let result = editor.try_execute(EditorCommand::AddTileSet(NewTileSetData {
            image: image("t.png", 8, 8),
            tile_width: 0,
            tile_height: 8,
        }));
        assert!(matches!(result, Err(EditorError::InvalidDimension { .. })));
        assert!(editor.tilesets().is_empty());
    }

    #[test]
    fn test_paint_without_selection_is_a_noop() {
        let (mut editor, _) = editor();
        editor.handle_map_input(press((0, 0), PointerButton::Primary));
        assert_eq!(cells(&editor), vec![0; 12]);
        assert!(editor.error_message.is_none());
    }

    #[test]
    fn test_paint_stamp_and_erase() {
        let (mut editor, hash) = editor();
        editor
            .try_execute(EditorCommand::SetSelectedTiles {
                tileset_hash: hash,
                tile_indices: vec![2, 3, 6, 7],
            })
            .unwrap();
        editor.handle_map_input(press((2, 1), PointerButton::Primary));
        #[rustfmt::skip]
        let expected = vec![
            0, 0, 0, 0,
            0, 0, 3, 4,
            0, 0, 7, 8,
        ];
        assert_eq!(cells(&editor), expected);
        assert!(editor.has_unsaved_changes());

        // Clipped at the right edge.
        editor.handle_map_input(press((3, 0), PointerButton::Primary));
        assert_eq!(&cells(&editor)[..8], &[0, 0, 0, 3, 0, 0, 3, 7]);

        editor.handle_map_input(press((3, 0), PointerButton::Secondary));
        assert_eq!(cells(&editor)[3], 0);
    }

    #[test]
    fn test_fill_uses_first_selected_tile() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![4],
        });
        editor.execute_command(EditorCommand::SetSelectedTool(EditorTool::Fill));
        editor.handle_map_input(press((1, 1), PointerButton::Primary));
        assert_eq!(cells(&editor), vec![5; 12]);
    }

    #[test]
    fn test_select_and_clear_region() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![0],
        });
        editor.execute_command(EditorCommand::SetSelectedTool(EditorTool::Fill));
        editor.handle_map_input(press((0, 0), PointerButton::Primary));

        editor.execute_command(EditorCommand::SetSelectedTool(EditorTool::Select));
        editor.handle_map_input(press((1, 0), PointerButton::Primary));
        editor.handle_map_input(crate::editor::tools::input((2, 1), 4, PointerButton::Primary, PointerPhase::Dragged));
        assert_eq!(editor.map_selection(), Some(GridRect::from_corners((1, 0), (2, 1))));

        editor.execute_command(EditorCommand::ClearSelectedRegion);
        #[rustfmt::skip]
        let expected = vec![
            1, 0, 0, 1,
            1, 0, 0, 1,
            1, 1, 1, 1,
        ];
        assert_eq!(cells(&editor), expected);

        editor.handle_map_input(press((0, 0), PointerButton::Secondary));
        assert_eq!(editor.map_selection(), None);
    }

    #[test]
    fn test_cursor_tool_does_not_edit() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![0],
        });
        editor.execute_command(EditorCommand::SetSelectedTool(EditorTool::Cursor));
        editor.handle_map_input(press((0, 0), PointerButton::Primary));
        assert_eq!(cells(&editor), vec![0; 12]);
    }

    #[test]
    fn test_paint_on_group_is_skipped() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![0],
        });
        editor.execute_command(EditorCommand::AddLayer(LayerType::Group));
        editor.execute_command(EditorCommand::SelectLayer(2));
        editor.execute_command(EditorCommand::PaintTiles { grid_index: 0 });
        assert!(editor.error_message.is_none());
        assert!(editor.document.read().map.find_layer(2).unwrap().data.is_empty());
    }

    #[test]
    fn test_out_of_bounds_paint_reports_error() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![0],
        });
        editor.execute_command(EditorCommand::PaintTiles { grid_index: 12 });
        assert!(editor.error_message.as_deref().unwrap().starts_with("PaintTiles"));
    }

    #[test]
    fn test_layer_commands() {
        let mut editor = Editor::new(small_config());
        editor.execute_command(EditorCommand::AddLayer(LayerType::TileLayer));
        assert_eq!(editor.current_layer_id(), Some(2));
        editor.execute_command(EditorCommand::AddLayer(LayerType::Group));
        assert_eq!(editor.current_layer_id(), Some(2));

        let result = editor.try_execute(EditorCommand::AddLayer(LayerType::ImageLayer));
        assert!(matches!(result, Err(EditorError::UnsupportedLayerType(_))));

        editor.execute_command(EditorCommand::SelectLayer(42));
        assert_eq!(editor.current_layer_id(), Some(2));

        editor.execute_command(EditorCommand::MoveLayer(3, LayerMove::Down));
        editor.execute_command(EditorCommand::SetLayerOpacity(2, 1.7));
        editor.execute_command(EditorCommand::SetLayerVisible(1, false));
        editor.execute_command(EditorCommand::RenameLayer(1, "  Ground ".into()));
        editor.execute_command(EditorCommand::RenameLayer(1, "   ".into()));
        {
            let doc = editor.document.read();
            assert_eq!(doc.map.all_layer_ids(), vec![1, 3, 2]);
            assert_eq!(doc.map.find_layer(2).unwrap().opacity, 1.0);
            assert!(!doc.map.find_layer(1).unwrap().visible);
            assert_eq!(doc.map.find_layer(1).unwrap().name, "Ground");
        }

        editor.execute_command(EditorCommand::RemoveLayer(2));
        assert_eq!(editor.current_layer_id(), Some(1));
        editor.execute_command(EditorCommand::RemoveLayer(1));
        assert_eq!(editor.current_layer_id(), None);

        editor.execute_command(EditorCommand::SetLayerVisible(99, true));
        assert!(editor.error_message.is_some());
    }

    #[test]
    fn test_map_dimension_commands() {
        let mut editor = Editor::new(small_config());
        editor.execute_command(EditorCommand::SetMapWidth(0));
        assert!(editor.error_message.is_some());
        assert!(!editor.has_unsaved_changes());
        editor.execute_command(EditorCommand::SetMapWidth(6));
        editor.execute_command(EditorCommand::SetTileHeight(16));
        let doc = editor.document.read();
        assert_eq!(doc.map.width, 6);
        assert_eq!(doc.map.tileheight, 16);
        assert_eq!(doc.map.layers[0].data.len(), 18);
        assert!(doc.dirty);
    }

    #[test]
    fn test_update_tileset_keeps_selection() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![1, 7],
        });
        editor
            .try_execute(EditorCommand::UpdateTileSet {
                hash,
                patch: TileSetPatch {
                    tilewidth: Some(16),
                    ..Default::default()
                },
            })
            .unwrap();
        let new_hash = editor.tilesets()[0].hash;
        assert_ne!(new_hash, hash);
        let selected = editor.selected_tiles().unwrap();
        assert_eq!(selected.tileset_hash, new_hash);
        // 2x2 tiles now, so tile 7 is gone.
        assert_eq!(selected.tile_indices, vec![1]);

        let stale = editor.try_execute(EditorCommand::UpdateTileSet {
            hash,
            patch: TileSetPatch::default(),
        });
        assert!(matches!(stale, Err(EditorError::UnknownTileSet(_))));
    }

    #[test]
    fn test_delete_tileset_rehashes_selection() {
        let (mut editor, first) = editor();
        editor.execute_command(EditorCommand::AddTileSet(NewTileSetData {
            image: image("second.png", 16, 16),
            tile_width: 8,
            tile_height: 8,
        }));
        let second = editor.tilesets()[1].hash;
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: second,
            tile_indices: vec![3],
        });

        editor.try_execute(EditorCommand::DeleteTileSet { hash: first }).unwrap();
        let remaining = editor.tilesets();
        assert_eq!(remaining.len(), 1);
        assert_eq!(editor.selected_tiles().unwrap().tileset_hash, remaining[0].hash);
        assert!(!editor.document.read().tileset_images.contains_key("tiles.png"));

        editor.execute_command(EditorCommand::DeleteTileSet { hash: remaining[0].hash });
        assert!(editor.selected_tiles().is_none());
        assert!(editor.tilesets().is_empty());
    }

    #[test]
    fn test_tileset_input_selects_tiles() {
        let (mut editor, hash) = editor();
        editor.handle_tileset_input(hash, TilesetInput { cell: (1, 0), phase: PointerPhase::Pressed });
        editor.handle_tileset_input(hash, TilesetInput { cell: (2, 1), phase: PointerPhase::Dragged });
        assert_eq!(editor.selected_tiles().unwrap().tile_indices, vec![1, 2, 5, 6]);
        assert_eq!(editor.current_stamp().len(), 4);
    }

    #[test]
    fn test_new_map_resets_state() {
        let (mut editor, hash) = editor();
        editor.execute_command(EditorCommand::SetSelectedTiles {
            tileset_hash: hash,
            tile_indices: vec![0],
        });
        editor.execute_command(EditorCommand::NewMap);
        assert!(editor.tilesets().is_empty());
        assert!(editor.selected_tiles().is_none());
        assert_eq!(editor.current_layer_id(), Some(1));
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn test_batch_stops_at_first_error() {
        let mut editor = Editor::new(small_config());
        let result = editor.try_execute(EditorCommand::Batch(vec![
            EditorCommand::SetMapWidth(5),
            EditorCommand::SetMapHeight(0),
            EditorCommand::SetMapWidth(7),
        ]));
        assert!(result.is_err());
        assert_eq!(editor.document.read().map.width, 5);
        assert!(editor.has_unsaved_changes());
    }

    #[test]
    fn test_selection_follows_tileset_renamed_on_save() {
        let mut editor = Editor::new(small_config());
        editor
            .try_execute(EditorCommand::AddTileSet(NewTileSetData {
                image: image("tiles.bmp", 32, 16),
                tile_width: 8,
                tile_height: 8,
            }))
            .unwrap();
        let hash = editor.tilesets()[0].hash;
        editor
            .try_execute(EditorCommand::SetSelectedTiles {
                tileset_hash: hash,
                tile_indices: vec![2],
            })
            .unwrap();

        let dir = std::env::temp_dir().join(format!("tilemap_ed_core_rename_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        editor.save_document_as(&dir.join("map.json")).unwrap();

        let renamed = editor.tilesets()[0].clone();
        assert_eq!(renamed.tileset.image, "tiles.png");
        assert_ne!(renamed.hash, hash);
        assert_eq!(editor.selected_tiles().unwrap().tileset_hash, renamed.hash);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failed_batch_of_view_changes_stays_clean() {
        let mut editor = Editor::new(small_config());
        let result = editor.try_execute(EditorCommand::Batch(vec![
            EditorCommand::ZoomIn,
            EditorCommand::SetMapHeight(0),
        ]));
        assert!(result.is_err());
        assert!(!editor.has_unsaved_changes());
    }
}
