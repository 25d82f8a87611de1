// src/ui/menu.rs

use std::sync::Arc;
use eframe::egui::{self, Context};
use parking_lot::RwLock;
use crate::editor::{Editor, EditorCommand};

/// Menu entries the main window has to handle itself, usually because they
/// open a file dialog or may need the "unsaved changes" prompt first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    New,
    Open,
    Save,
    SaveAs,
    ExportPng,
    Exit,
    ToggleSidePanel,
    ToggleTilesetsPanel,
    ResetView,
}

pub struct MenuBar {
    editor: Arc<RwLock<Editor>>,
}

impl MenuBar {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self { editor }
    }

    pub fn update(&mut self, ctx: &Context) -> Option<MenuAction> {
        let mut action = None;
        let mut command = None;

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let entries = [
                        ("New", "", MenuAction::New),
                        ("Open...", "", MenuAction::Open),
                        ("Save", "Ctrl+S", MenuAction::Save),
                        ("Save As...", "", MenuAction::SaveAs),
                        ("Export PNG...", "", MenuAction::ExportPng),
                    ];
                    for (label, shortcut, entry) in entries {
                        if ui.add(egui::Button::new(label).shortcut_text(shortcut)).clicked() {
                            action = Some(entry);
                            ui.close_menu();
                        }
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        action = Some(MenuAction::Exit);
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    let mut show_grid = self.editor.read().show_grid();
                    if ui.checkbox(&mut show_grid, "Grid").clicked() {
                        command = Some(EditorCommand::ToggleGrid);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add(egui::Button::new("Zoom In").shortcut_text("Ctrl++")).clicked() {
                        command = Some(EditorCommand::ZoomIn);
                        ui.close_menu();
                    }
                    if ui.add(egui::Button::new("Zoom Out").shortcut_text("Ctrl+-")).clicked() {
                        command = Some(EditorCommand::ZoomOut);
                        ui.close_menu();
                    }
                    if ui.add(egui::Button::new("Reset Zoom").shortcut_text("Ctrl+0")).clicked() {
                        command = Some(EditorCommand::ResetZoom);
                        ui.close_menu();
                    }
                    if ui.button("Reset View").clicked() {
                        action = Some(MenuAction::ResetView);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Map Panel").clicked() {
                        action = Some(MenuAction::ToggleSidePanel);
                        ui.close_menu();
                    }
                    if ui.button("Layers & Tilesets Panel").clicked() {
                        action = Some(MenuAction::ToggleTilesetsPanel);
                        ui.close_menu();
                    }
                });
            });
        });

        if let Some(command) = command {
            self.editor.write().execute_command(command);
        }
        action
    }
}
