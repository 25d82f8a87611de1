// src/ui/tilesets_panel.rs

use std::sync::Arc;

use eframe::egui::{self, Context};
use parking_lot::RwLock;

use crate::editor::{Editor, EditorCommand};
use crate::map::TileSetHash;
use crate::ui::layers_panel::LayersPanel;
use crate::ui::textures::TextureCache;
use crate::ui::tileset_canvas::TilesetCanvas;

/// What the panel asks the main window to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilesetPanelAction {
    Add,
    Edit(TileSetHash),
}

/// Right-side panel: the layer tree above the map's tilesets.
pub struct TilesetsPanel {
    editor: Arc<RwLock<Editor>>,
    layers: LayersPanel,
    canvas: TilesetCanvas,
    pub show_panel: bool,
}

impl TilesetsPanel {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self {
            layers: LayersPanel::new(Arc::clone(&editor)),
            editor,
            canvas: TilesetCanvas::new(),
            show_panel: true,
        }
    }

    pub fn update(&mut self, ctx: &Context, textures: &mut TextureCache) -> Option<TilesetPanelAction> {
        if !self.show_panel {
            return None;
        }
        let mut action = None;
        let mut command = None;

        egui::SidePanel::right("tilesets_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.layers.show(ui);
                ui.separator();

                ui.horizontal(|ui| {
                    ui.heading("Tilesets");
                    if ui.button("Add tileset").clicked() {
                        action = Some(TilesetPanelAction::Add);
                    }
                });
                ui.separator();

                let tilesets = self.editor.read().tilesets();
                self.canvas.retain(&tilesets);
                if tilesets.is_empty() {
                    ui.weak("No tilesets yet.");
                    return;
                }

                egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                    for entry in &tilesets {
                        egui::CollapsingHeader::new(&entry.tileset.name)
                            .id_salt(entry.hash.0)
                            .default_open(true)
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.weak(format!(
                                        "{} tiles, {}x{} px",
                                        entry.tileset.tilecount, entry.tileset.tilewidth, entry.tileset.tileheight
                                    ));
                                    if ui.small_button("Edit").clicked() {
                                        action = Some(TilesetPanelAction::Edit(entry.hash));
                                    }
                                    if ui.small_button("Delete").clicked() {
                                        command = Some(EditorCommand::DeleteTileSet { hash: entry.hash });
                                    }
                                });
                                self.canvas.show(ui, &self.editor, entry, textures);
                            });
                    }
                });
            });

        if let Some(command) = command {
            self.editor.write().execute_command(command);
        }
        action
    }
}
