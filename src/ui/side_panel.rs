// src/ui/side_panel.rs

use std::sync::Arc;
use eframe::egui::{self, Context, DragValue, Ui};
use parking_lot::RwLock;

use crate::editor::{Editor, EditorCommand};

const MAX_MAP_CELLS: u32 = 1000;
const MAX_TILE_SIZE: u32 = 1024;

/// Manages the left-side panel with the map properties.
pub struct SidePanel {
    editor: Arc<RwLock<Editor>>,
    pub show_side_panel: bool, // Whether this panel is currently visible
}

impl SidePanel {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self {
            editor,
            show_side_panel: true,
        }
    }

    /// Called each frame, updates the side panel UI if it's visible.
    pub fn update(&mut self, ctx: &Context) {
        if !self.show_side_panel {
            return; // Early exit if user has hidden it
        }

        egui::SidePanel::left("map_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.show_map_properties(ui);
            });
    }

    fn show_map_properties(&self, ui: &mut Ui) {
        ui.heading("Map");

        let (mut width, mut height, mut tile_width, mut tile_height) = {
            let editor = self.editor.read();
            let doc_arc = editor.document();
            let doc = doc_arc.read();
            (doc.map.width, doc.map.height, doc.map.tilewidth, doc.map.tileheight)
        };

        let mut commands = Vec::new();
        egui::Grid::new("map_properties").num_columns(2).show(ui, |ui| {
            ui.label("Width");
            if ui.add(DragValue::new(&mut width).range(1..=MAX_MAP_CELLS).suffix(" tiles")).changed() {
                commands.push(EditorCommand::SetMapWidth(width));
            }
            ui.end_row();

            ui.label("Height");
            if ui.add(DragValue::new(&mut height).range(1..=MAX_MAP_CELLS).suffix(" tiles")).changed() {
                commands.push(EditorCommand::SetMapHeight(height));
            }
            ui.end_row();

            ui.label("Tile width");
            if ui.add(DragValue::new(&mut tile_width).range(1..=MAX_TILE_SIZE).suffix(" px")).changed() {
                commands.push(EditorCommand::SetTileWidth(tile_width));
            }
            ui.end_row();

            ui.label("Tile height");
            if ui.add(DragValue::new(&mut tile_height).range(1..=MAX_TILE_SIZE).suffix(" px")).changed() {
                commands.push(EditorCommand::SetTileHeight(tile_height));
            }
            ui.end_row();
        });

        // The read lock is gone by now.
        if !commands.is_empty() {
            self.editor.write().execute_commands(commands);
        }
    }
}
