// src/ui/dialog.rs

use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, ColorImage, Context, DragValue, Rect, Stroke, TextureHandle, TextureOptions};
use log::warn;

use crate::document::TilesetImage;
use crate::editor::{EditorCommand, NewTileSetData};
use crate::map::{TileSetHash, TileSetPatch, TileSetWithHash};
use crate::ui::file;
use crate::utils::grid::{grid_lines, GridLineStyle};

/// The types of dialogs you may show.
#[derive(Debug, PartialEq, Eq)]
pub enum Dialog {
    SaveChanges,
}

/// The possible outcomes when a dialog is closed.
#[derive(Debug, PartialEq, Eq)]
pub enum DialogResult {
    Save,
    DontSave,
    Cancel,
}

/// Manages the currently active dialog (if any) and its result.
#[derive(Default)]
pub struct DialogManager {
    active_dialog: Option<Dialog>,
    result: Option<DialogResult>,
}

impl DialogManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_dialog(&mut self, dialog: Dialog) {
        self.active_dialog = Some(dialog);
    }

    /// Convenience method specifically for the "Save Changes" dialog.
    pub fn show_save_changes_dialog(&mut self) {
        self.show_dialog(Dialog::SaveChanges);
    }

    pub fn is_open(&self) -> bool {
        self.active_dialog.is_some()
    }

    /// Call this method on every UI frame to render the active dialog (if any).
    /// When the user responds, the method returns `Some(DialogResult)` and clears the active dialog.
    pub fn update(&mut self, ctx: &Context) -> Option<DialogResult> {
        let dialog = self.active_dialog.as_ref()?;
        match dialog {
            Dialog::SaveChanges => {
                egui::Window::new("Unsaved Changes")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label("The map has unsaved changes. Save them first?");
                        ui.horizontal(|ui| {
                            if ui.button("Save").clicked() {
                                self.result = Some(DialogResult::Save);
                            }
                            if ui.button("Don't Save").clicked() {
                                self.result = Some(DialogResult::DontSave);
                            }
                            if ui.button("Cancel").clicked() {
                                self.result = Some(DialogResult::Cancel);
                            }
                        });
                    });
            }
        }
        let result = self.result.take()?;
        self.active_dialog = None;
        Some(result)
    }
}

// ============================================================
// Tileset Dialog
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilesetDialogMode {
    Add,
    /// Edits the tile size of an existing tileset.
    Edit(TileSetHash),
}

pub enum TilesetDialogResult {
    Submit(EditorCommand),
    Cancel,
}

const PREVIEW_WIDTH: f32 = 256.0;

/// "Add tileset" / "Edit tileset" form: an image, its preview with the tile
/// grid laid over it, and the tile size.
pub struct TilesetDialog {
    mode: TilesetDialogMode,
    image: Option<TilesetImage>,
    preview: Option<TextureHandle>,
    tile_width: u32,
    tile_height: u32,
    error: Option<String>,
    /// Directory of the last picked image.
    pub picked_directory: Option<PathBuf>,
}

impl TilesetDialog {
    pub fn add(tile_width: u32, tile_height: u32) -> Self {
        Self {
            mode: TilesetDialogMode::Add,
            image: None,
            preview: None,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            error: None,
            picked_directory: None,
        }
    }

    pub fn edit(tileset: &TileSetWithHash, image: Option<TilesetImage>) -> Self {
        Self {
            mode: TilesetDialogMode::Edit(tileset.hash),
            image,
            preview: None,
            tile_width: tileset.tileset.tilewidth.max(1),
            tile_height: tileset.tileset.tileheight.max(1),
            error: None,
            picked_directory: None,
        }
    }

    pub fn mode(&self) -> TilesetDialogMode {
        self.mode
    }

    /// The command this form would submit, if it is complete.
    pub fn command(&self) -> Option<EditorCommand> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return None;
        }
        match self.mode {
            TilesetDialogMode::Add => self.image.as_ref().map(|image| {
                EditorCommand::AddTileSet(NewTileSetData {
                    image: image.clone(),
                    tile_width: self.tile_width,
                    tile_height: self.tile_height,
                })
            }),
            TilesetDialogMode::Edit(hash) => Some(EditorCommand::UpdateTileSet {
                hash,
                patch: TileSetPatch {
                    tilewidth: Some(self.tile_width),
                    tileheight: Some(self.tile_height),
                    ..Default::default()
                },
            }),
        }
    }

    pub fn show(&mut self, ctx: &Context, start_dir: Option<&Path>) -> Option<TilesetDialogResult> {
        let title = match self.mode {
            TilesetDialogMode::Add => "Add tileset",
            TilesetDialogMode::Edit(_) => "Edit tileset",
        };
        let mut result = None;

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                if self.mode == TilesetDialogMode::Add {
                    ui.horizontal(|ui| {
                        if ui.button("Choose image...").clicked() {
                            if let Some(path) = file::pick_image(start_dir) {
                                self.load_image(&path);
                            }
                        }
                        match &self.image {
                            Some(image) => ui.label(format!("{} ({}x{})", image.name, image.width, image.height)),
                            None => ui.weak("No image selected"),
                        };
                    });
                }

                self.show_preview(ui);

                egui::Grid::new("tileset_dialog_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Tile width");
                    ui.add(DragValue::new(&mut self.tile_width).range(1..=4096).suffix(" px"));
                    ui.end_row();
                    ui.label("Tile height");
                    ui.add(DragValue::new(&mut self.tile_height).range(1..=4096).suffix(" px"));
                    ui.end_row();
                });

                if let Some(error) = &self.error {
                    ui.colored_label(Color32::LIGHT_RED, error);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let command = self.command();
                    let label = match self.mode {
                        TilesetDialogMode::Add => "Add",
                        TilesetDialogMode::Edit(_) => "Apply",
                    };
                    if ui.add_enabled(command.is_some(), egui::Button::new(label)).clicked() {
                        result = command.map(TilesetDialogResult::Submit);
                    }
                    if ui.button("Cancel").clicked() {
                        result = Some(TilesetDialogResult::Cancel);
                    }
                });
            });

        result
    }

    fn load_image(&mut self, path: &Path) {
        match TilesetImage::from_path(path) {
            Ok(image) => {
                self.image = Some(image);
                self.preview = None;
                self.error = None;
                self.picked_directory = path.parent().map(Path::to_path_buf);
            }
            Err(e) => {
                warn!("Could not load tileset image {}: {}", path.display(), e);
                self.error = Some(e.to_string());
            }
        }
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        let Some(image) = &self.image else {
            return;
        };
        let texture = self.preview.get_or_insert_with(|| {
            let pixels = ColorImage::from_rgba_unmultiplied(
                [image.width as usize, image.height as usize],
                &image.rgba,
            );
            ui.ctx().load_texture("tileset-dialog-preview", pixels, TextureOptions::NEAREST)
        });

        let scale = if image.width > 0 {
            (PREVIEW_WIDTH / image.width as f32).min(4.0)
        } else {
            1.0
        };
        let size = egui::vec2(image.width as f32, image.height as f32) * scale;
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let rect = response.rect;
        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        let cell = egui::vec2(self.tile_width as f32, self.tile_height as f32) * scale;
        for line in grid_lines(size, cell, &GridLineStyle::tileset()) {
            painter.line_segment(
                [rect.min + line.from.to_vec2(), rect.min + line.to.to_vec2()],
                Stroke::new(1.0, Color32::from_white_alpha(120)),
            );
        }
    }
}
