// src/ui/tileset_canvas.rs

use std::sync::Arc;

use eframe::egui::{self, pos2, vec2, Color32, Pos2, Rect, Sense, Shape, Stroke, Ui};
use parking_lot::RwLock;

use crate::editor::{Editor, PointerPhase, TilesetInput};
use crate::map::{TileSet, TileSetHash, TileSetWithHash};
use crate::ui::central_panel::color;
use crate::ui::textures::TextureCache;
use crate::utils::grid::{grid_lines, GridLineStyle};

/// Draws tilesets scaled to the panel width and lets the user pick tiles
/// from them.
#[derive(Default)]
pub struct TilesetCanvas {
    /// Tileset and cell of the drag in progress.
    gesture: Option<(TileSetHash, (u32, u32))>,
}

impl TilesetCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a drag whose tileset is no longer in `live`, so picking from
    /// the remaining tilesets works again.
    pub fn retain(&mut self, live: &[TileSetWithHash]) {
        if let Some((hash, _)) = self.gesture {
            if !live.iter().any(|entry| entry.hash == hash) {
                self.gesture = None;
            }
        }
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        editor: &Arc<RwLock<Editor>>,
        entry: &TileSetWithHash,
        textures: &mut TextureCache,
    ) {
        let tileset = &entry.tileset;
        let (texture, selection_color, selected) = {
            let ed = editor.read();
            let doc_arc = ed.document();
            let doc = doc_arc.read();
            let texture = doc
                .image_for_tileset(tileset)
                .map(|image| textures.get(ui.ctx(), image));
            let selected: Vec<u32> = ed
                .selected_tiles()
                .filter(|sel| sel.tileset_hash == entry.hash)
                .map(|sel| sel.tile_indices.clone())
                .unwrap_or_default();
            (texture, color(ed.config.selection_color), selected)
        };

        let Some(texture) = texture else {
            ui.colored_label(Color32::LIGHT_RED, format!("Image not found: {}", tileset.image));
            return;
        };
        if tileset.imagewidth == 0 || tileset.imageheight == 0 {
            return;
        }

        let scale = display_scale(ui.available_width(), tileset.imagewidth);
        let size = vec2(tileset.imagewidth as f32, tileset.imageheight as f32) * scale;
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;

        painter.image(
            texture,
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        // Grid over the tiles, offset by the margin.
        let style = GridLineStyle::tileset();
        let origin = rect.min + vec2(tileset.margin as f32, tileset.margin as f32) * scale;
        let pitch = vec2(
            tileset.tilewidth as f32 + tileset.spacing as f32,
            tileset.tileheight as f32 + tileset.spacing as f32,
        ) * scale;
        let extent = vec2(tileset.columns as f32, tileset.rows() as f32) * pitch + vec2(1.0, 1.0);
        for line in grid_lines(extent, pitch, &style) {
            let alpha = (255.0 * style.opacity(line.kind)).round() as u8;
            let stroke = Stroke::new(1.0, Color32::from_white_alpha(alpha));
            let points = [origin + line.from.to_vec2(), origin + line.to.to_vec2()];
            if style.is_dashed(line.kind) {
                painter.extend(Shape::dashed_line(&points, stroke, style.dash[0], style.dash[1]));
            } else {
                painter.line_segment(points, stroke);
            }
        }

        for local_id in &selected {
            if let Some(tile) = tile_screen_rect(tileset, *local_id, rect.min, scale) {
                painter.rect_filled(tile, 0.0, selection_color);
            }
        }

        if let Some(cell) = response
            .hover_pos()
            .and_then(|pos| cell_at(tileset, to_image(pos, rect.min, scale)))
            .filter(|(col, row)| *col < tileset.columns && *row < tileset.rows())
        {
            let local_id = cell.1 * tileset.columns + cell.0;
            if let Some(tile) = tile_screen_rect(tileset, local_id, rect.min, scale) {
                painter.rect_stroke(tile, 0.0, Stroke::new(1.0, Color32::WHITE));
            }
        }

        for input in self.collect_inputs(ui, &response, entry.hash, tileset, rect.min, scale) {
            editor.write().handle_tileset_input(entry.hash, input);
        }
    }

    fn collect_inputs(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        hash: TileSetHash,
        tileset: &TileSet,
        origin: Pos2,
        scale: f32,
    ) -> Vec<TilesetInput> {
        let mut inputs = Vec::new();
        let pointer_cell = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos())
            .and_then(|pos| cell_at(tileset, to_image(pos, origin, scale)));

        match self.gesture {
            Some((gesture_hash, _)) if gesture_hash != hash => {}
            None => {
                if response.hovered() && ui.input(|i| i.pointer.primary_pressed()) {
                    if let Some(cell) = pointer_cell {
                        self.gesture = Some((hash, cell));
                        inputs.push(TilesetInput {
                            cell,
                            phase: PointerPhase::Pressed,
                        });
                    }
                }
            }
            Some((_, last_cell)) => {
                let down = ui.input(|i| i.pointer.primary_down());
                if let Some(cell) = pointer_cell.filter(|cell| *cell != last_cell) {
                    if down {
                        self.gesture = Some((hash, cell));
                        inputs.push(TilesetInput {
                            cell,
                            phase: PointerPhase::Dragged,
                        });
                    }
                }
                if !down {
                    let cell = self.gesture.map_or(last_cell, |(_, cell)| cell);
                    self.gesture = None;
                    inputs.push(TilesetInput {
                        cell,
                        phase: PointerPhase::Released,
                    });
                }
            }
        }
        inputs
    }
}

/// Scale that fits an image of `image_width` pixels into `available` points,
/// never enlarging past 2x.
fn display_scale(available: f32, image_width: u32) -> f32 {
    if image_width == 0 || available <= 0.0 {
        return 1.0;
    }
    (available / image_width as f32).min(2.0)
}

fn to_image(screen: Pos2, origin: Pos2, scale: f32) -> Pos2 {
    ((screen - origin) / scale).to_pos2()
}

/// Tileset cell under an image-space position. Positions left of or above
/// the first tile clamp to column or row zero.
fn cell_at(tileset: &TileSet, image_pos: Pos2) -> Option<(u32, u32)> {
    let pitch_x = tileset.tilewidth as f32 + tileset.spacing as f32;
    let pitch_y = tileset.tileheight as f32 + tileset.spacing as f32;
    if pitch_x <= 0.0 || pitch_y <= 0.0 || !image_pos.x.is_finite() || !image_pos.y.is_finite() {
        return None;
    }
    let x = (image_pos.x - tileset.margin as f32).max(0.0);
    let y = (image_pos.y - tileset.margin as f32).max(0.0);
    Some(((x / pitch_x) as u32, (y / pitch_y) as u32))
}

fn tile_screen_rect(tileset: &TileSet, local_id: u32, origin: Pos2, scale: f32) -> Option<Rect> {
    let [x, y, w, h] = tileset.tile_source_rect(local_id)?;
    Some(Rect::from_min_size(
        origin + vec2(x as f32, y as f32) * scale,
        vec2(w as f32, h as f32) * scale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_retain_clears_drag_of_removed_tileset() {
        let live = crate::map::hash_tilesets(&[TileSet::new("a", "a.png", 16, 16, 64, 64, 1)]);
        let mut canvas = TilesetCanvas {
            gesture: Some((live[0].hash, (1, 1))),
        };
        canvas.retain(&live);
        assert_eq!(canvas.gesture, Some((live[0].hash, (1, 1))));

        canvas.gesture = Some((TileSetHash(live[0].hash.0 ^ 1), (0, 0)));
        canvas.retain(&live);
        assert_eq!(canvas.gesture, None);

        canvas.gesture = Some((live[0].hash, (2, 0)));
        canvas.retain(&[]);
        assert_eq!(canvas.gesture, None);
    }

    #[test]
    fn test_display_scale() {
        assert_approx_eq!(display_scale(128.0, 256), 0.5);
        assert_approx_eq!(display_scale(1000.0, 100), 2.0);
        assert_approx_eq!(display_scale(100.0, 0), 1.0);
    }

    #[test]
    fn test_cell_at_with_margin_and_spacing() {
        let mut tileset = TileSet::new("t", "t.png", 16, 16, 70, 70, 1);
        tileset.margin = 2;
        tileset.spacing = 1;
        tileset.recompute_derived();

        assert_eq!(cell_at(&tileset, pos2(0.0, 0.0)), Some((0, 0)));
        assert_eq!(cell_at(&tileset, pos2(2.0 + 17.0, 2.0)), Some((1, 0)));
        assert_eq!(cell_at(&tileset, pos2(2.0 + 17.0 * 3.0 + 5.0, 2.0 + 17.0 * 2.0)), Some((3, 2)));
    }

    #[test]
    fn test_tile_screen_rect_scaled() {
        let tileset = TileSet::new("t", "t.png", 16, 16, 64, 64, 1);
        let rect = tile_screen_rect(&tileset, 5, pos2(10.0, 10.0), 0.5).unwrap();
        assert_eq!(rect.min, pos2(18.0, 18.0));
        assert_eq!(rect.size(), vec2(8.0, 8.0));
        assert!(tile_screen_rect(&tileset, 16, Pos2::ZERO, 1.0).is_none());
    }
}
