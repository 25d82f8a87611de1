// src/ui/toolbar.rs

use std::sync::Arc;

use eframe::egui::{self, Context};
use parking_lot::RwLock;

use crate::editor::{Editor, EditorCommand, EditorTool};
use crate::utils::util::scale_percent;

/// Tool buttons and zoom controls under the menu bar.
pub struct Toolbar {
    editor: Arc<RwLock<Editor>>,
}

impl Toolbar {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self { editor }
    }

    pub fn update(&mut self, ctx: &Context) {
        let (selected, scale) = {
            let editor = self.editor.read();
            (editor.selected_tool(), editor.scale())
        };
        let mut command = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tool in EditorTool::all() {
                    let hint = format!("{} ({})", tool.name(), tool.shortcut());
                    if ui
                        .selectable_label(selected == *tool, tool.name())
                        .on_hover_text(hint)
                        .clicked()
                    {
                        command = Some(EditorCommand::SetSelectedTool(*tool));
                    }
                }

                ui.separator();
                if ui.button("-").on_hover_text("Zoom out").clicked() {
                    command = Some(EditorCommand::ZoomOut);
                }
                if ui.button(scale_percent(scale)).on_hover_text("Reset zoom").clicked() {
                    command = Some(EditorCommand::ResetZoom);
                }
                if ui.button("+").on_hover_text("Zoom in").clicked() {
                    command = Some(EditorCommand::ZoomIn);
                }
            });
        });

        if let Some(command) = command {
            self.editor.write().execute_command(command);
        }
    }
}
