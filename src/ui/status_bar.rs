// src/ui/status_bar.rs

use std::sync::Arc;
use eframe::egui::{self, Color32, Context};
use parking_lot::RwLock;
use crate::editor::Editor;
use crate::map::clean_gid;
use crate::utils::grid::index_of_cell;
use crate::utils::util::scale_percent;

pub struct StatusBar {
    editor: Arc<RwLock<Editor>>,
}

impl StatusBar {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self { editor }
    }

    pub fn update(&mut self, ctx: &Context, hovered: Option<(u32, u32)>) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let editor = self.editor.read(); // Keep the read lock short.

            let columns = editor.document().read().map.width;
            let coord_label = match hovered {
                Some((col, row)) => {
                    let gid = editor
                        .gid_at(index_of_cell(col, row, columns))
                        .map(clean_gid)
                        .unwrap_or(0);
                    format!("({}, {}) gid {}", col, row, gid)
                }
                None => String::new(),
            };

            ui.horizontal(|ui| {
                match &editor.error_message {
                    Some(error) => ui.colored_label(Color32::LIGHT_RED, error),
                    None => ui.label(&editor.status_message),
                };
                ui.separator();
                ui.label(coord_label);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(scale_percent(editor.scale()));
                    ui.separator();
                    ui.label(format!("Tool: {}", editor.selected_tool().name()));
                });
            });
        });
    }
}
