// src/ui/layers_panel.rs

use std::sync::Arc;

use eframe::egui::{self, Button, Slider, TextEdit, Ui};
use parking_lot::RwLock;

use crate::editor::{Editor, EditorCommand};
use crate::map::{LayerMove, LayerType, TileMapLayer};

/// The layer tree plus the properties of the current layer. Topmost layers
/// are listed first.
pub struct LayersPanel {
    editor: Arc<RwLock<Editor>>,
    /// Name being typed for the layer it belongs to.
    name_edit: Option<(u32, String)>,
}

impl LayersPanel {
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self {
            editor,
            name_edit: None,
        }
    }

    pub fn show(&mut self, ui: &mut Ui) {
        let mut commands = Vec::new();

        ui.horizontal(|ui| {
            ui.heading("Layers");
            ui.menu_button("Add layer", |ui| {
                for layer_type in LayerType::all() {
                    let button = Button::new(layer_type.label());
                    let response = ui
                        .add_enabled(layer_type.is_supported(), button)
                        .on_disabled_hover_text("Not supported yet");
                    if response.clicked() {
                        commands.push(EditorCommand::AddLayer(*layer_type));
                        ui.close_menu();
                    }
                }
            });
        });

        let (layers, current, current_layer) = {
            let editor = self.editor.read();
            let doc_arc = editor.document();
            let doc = doc_arc.read();
            let current = editor.current_layer_id();
            let current_layer = current.and_then(|id| doc.map.find_layer(id).cloned());
            (doc.map.layers.clone(), current, current_layer)
        };

        egui::ScrollArea::vertical()
            .id_salt("layer_tree")
            .max_height(260.0)
            .show(ui, |ui| {
                layer_rows(ui, &layers, current, &mut commands);
            });

        ui.separator();
        match &current_layer {
            Some(layer) => self.show_properties(ui, layer, &mut commands),
            None => {
                ui.weak("No layer selected.");
            }
        }

        if !commands.is_empty() {
            self.editor.write().execute_commands(commands);
        }
    }

    fn show_properties(&mut self, ui: &mut Ui, layer: &TileMapLayer, commands: &mut Vec<EditorCommand>) {
        if self.name_edit.as_ref().map(|(id, _)| *id) != Some(layer.id) {
            self.name_edit = Some((layer.id, layer.name.clone()));
        }

        egui::Grid::new("layer_properties").num_columns(2).show(ui, |ui| {
            ui.label("Name");
            if let Some((id, name)) = &mut self.name_edit {
                let response = ui.add(TextEdit::singleline(name).desired_width(140.0));
                if response.lost_focus() && *name != layer.name {
                    commands.push(EditorCommand::RenameLayer(*id, name.clone()));
                }
            }
            ui.end_row();

            ui.label("Type");
            ui.label(layer.layer_type.label());
            ui.end_row();

            ui.label("Opacity");
            let mut opacity = layer.opacity;
            if ui.add(Slider::new(&mut opacity, 0.0..=1.0)).changed() {
                commands.push(EditorCommand::SetLayerOpacity(layer.id, opacity));
            }
            ui.end_row();
        });
    }
}

fn layer_rows(ui: &mut Ui, layers: &[TileMapLayer], current: Option<u32>, commands: &mut Vec<EditorCommand>) {
    for layer in layers.iter().rev() {
        ui.horizontal(|ui| {
            let mut visible = layer.visible;
            if ui.checkbox(&mut visible, "").on_hover_text("Visible").changed() {
                commands.push(EditorCommand::SetLayerVisible(layer.id, visible));
            }
            let label = if layer.is_group() {
                format!("[{}]", layer.name)
            } else {
                layer.name.clone()
            };
            if ui.selectable_label(current == Some(layer.id), label).clicked() {
                commands.push(EditorCommand::SelectLayer(layer.id));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("x").on_hover_text("Delete layer").clicked() {
                    commands.push(EditorCommand::RemoveLayer(layer.id));
                }
                if ui.small_button("v").on_hover_text("Move down").clicked() {
                    commands.push(EditorCommand::MoveLayer(layer.id, LayerMove::Down));
                }
                if ui.small_button("^").on_hover_text("Move up").clicked() {
                    commands.push(EditorCommand::MoveLayer(layer.id, LayerMove::Up));
                }
            });
        });
        if layer.is_group() && !layer.layers.is_empty() {
            ui.indent(("layer_group", layer.id), |ui| {
                layer_rows(ui, &layer.layers, current, commands);
            });
        }
    }
}
