//! Central panel UI module: the map canvas. Handles zoom and pan, draws the
//! tiles, grid and overlays, and turns pointer gestures into `MapInput`s for
//! the active tool.

use std::sync::Arc;
use parking_lot::RwLock;
use eframe::egui::{
    self, pos2, vec2, Color32, Context, Painter, Rect, Sense, Shape, Stroke, Vec2,
};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::editor::core::Editor;
use crate::editor::tools::stamp_targets;
use crate::editor::{EditorCommand, EditorTool, MapInput, PointerButton, PointerPhase};
use crate::map::{FlipFlags, TileSet};
use crate::ui::textures::TextureCache;
use crate::utils::grid::{
    grid_lines, index_of_cell, stage_size, visible_cells, GridLineStyle, GridSpec, Viewport,
};
use crate::utils::util::normalize_scale;

/// Canvas margin around the stage when nothing has been panned yet.
const STAGE_MARGIN: Vec2 = vec2(16.0, 16.0);
const STAMP_PREVIEW_ALPHA: f32 = 0.5;

/// The `CentralPanel` struct provides the main viewport for the editor.
pub struct CentralPanel {
    editor: Arc<RwLock<Editor>>,

    /// Offset of the stage origin from the panel's top-left corner.
    pan: Vec2,

    /// The map cell under the pointer, if any.
    hovered: Option<(u32, u32)>,

    /// Button of the gesture in progress and the last cell it reported.
    gesture: Option<(PointerButton, (u32, u32))>,
}

impl CentralPanel {
    /// Create a new central panel instance.
    pub fn new(editor: Arc<RwLock<Editor>>) -> Self {
        Self {
            editor,
            pan: STAGE_MARGIN,
            hovered: None,
            gesture: None,
        }
    }

    pub fn hovered_cell(&self) -> Option<(u32, u32)> {
        self.hovered
    }

    /// Puts the stage back at the top-left corner.
    pub fn reset_pan(&mut self) {
        self.pan = STAGE_MARGIN;
    }

    /// Called each frame to update the central panel.
    pub fn update(&mut self, ctx: &Context, textures: &mut TextureCache) {
        let background = color(self.editor.read().config.background_color);
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(background))
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let response = ui.interact(rect, ui.id().with("map_canvas"), Sense::click_and_drag());

                // --- Pan/Zoom Handling ---
                let tool = self.editor.read().selected_tool();
                self.handle_zoom(ui, &response, rect);
                self.handle_pan(ui, &response, tool);

                let (grid, viewport) = {
                    let editor = self.editor.read();
                    let doc_arc = editor.document();
                    let doc = doc_arc.read();
                    let map = &doc.map;
                    let grid = GridSpec::new(
                        map.width,
                        map.height,
                        vec2(map.tilewidth as f32, map.tileheight as f32),
                    );
                    (grid, Viewport::new(rect.min + self.pan, editor.scale()))
                };

                // --- Hover ---
                self.hovered = response
                    .hover_pos()
                    .and_then(|pos| grid.cell_at(viewport.screen_to_world(pos)));

                // --- Drawing ---
                let painter = ui.painter_at(rect);
                self.draw(ctx, &painter, rect, grid, viewport, textures);

                // --- Input Forwarding ---
                if tool != EditorTool::Cursor {
                    let inputs = self.collect_inputs(ui, &response, grid);
                    if !inputs.is_empty() {
                        let mut editor = self.editor.write();
                        for input in inputs {
                            editor.handle_map_input(input);
                        }
                    }
                } else {
                    self.gesture = None;
                }
            });
    }

    // ============================================================
    // Zoom and Pan Handling
    // ============================================================

    /// Ctrl+wheel (and pinch) zoom about the pointer.
    fn handle_zoom(&mut self, ui: &egui::Ui, response: &egui::Response, rect: Rect) {
        if !response.hovered() {
            return;
        }
        let zoom_delta = ui.input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() <= f32::EPSILON {
            return;
        }
        let scale = self.editor.read().scale();
        let Some(new_scale) = normalize_scale(scale * zoom_delta) else {
            return;
        };
        let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
        let mut viewport = Viewport::new(rect.min + self.pan, scale);
        viewport.zoom_about(pointer, new_scale);
        self.pan = viewport.origin - rect.min;
        self.editor.write().execute_command(EditorCommand::SetScale(new_scale));
        ui.ctx().request_repaint();
    }

    /// Wheel scrolls the stage, middle-drag pans it, and so does the primary
    /// button while the Cursor tool is active.
    fn handle_pan(&mut self, ui: &egui::Ui, response: &egui::Response, tool: EditorTool) {
        if response.hovered() {
            let (scroll, zooming) = ui.input(|i| (i.smooth_scroll_delta, i.modifiers.command));
            if !zooming && scroll != Vec2::ZERO {
                self.pan += scroll;
            }
        }
        let panning = response.dragged_by(egui::PointerButton::Middle)
            || (tool == EditorTool::Cursor && response.dragged_by(egui::PointerButton::Primary));
        if panning {
            self.pan += response.drag_delta();
            ui.ctx().request_repaint();
        }
    }

    // ============================================================
    // Pointer Gestures
    // ============================================================

    fn collect_inputs(&mut self, ui: &egui::Ui, response: &egui::Response, grid: GridSpec) -> Vec<MapInput> {
        let mut inputs = Vec::new();
        let event = |cell: (u32, u32), button, phase| MapInput {
            cell,
            grid_index: index_of_cell(cell.0, cell.1, grid.columns),
            button,
            phase,
        };

        match self.gesture {
            None => {
                let Some(cell) = self.hovered else {
                    return inputs;
                };
                if !response.hovered() {
                    return inputs;
                }
                let pressed = ui.input(|i| {
                    if i.pointer.button_pressed(egui::PointerButton::Primary) {
                        Some(PointerButton::Primary)
                    } else if i.pointer.button_pressed(egui::PointerButton::Secondary) {
                        Some(PointerButton::Secondary)
                    } else {
                        None
                    }
                });
                if let Some(button) = pressed {
                    self.gesture = Some((button, cell));
                    inputs.push(event(cell, button, PointerPhase::Pressed));
                }
            }
            Some((button, last_cell)) => {
                let egui_button = to_egui_button(button);
                let (down, released) = ui.input(|i| {
                    (i.pointer.button_down(egui_button), i.pointer.button_released(egui_button))
                });
                if let Some(cell) = self.hovered.filter(|cell| *cell != last_cell) {
                    if down {
                        self.gesture = Some((button, cell));
                        inputs.push(event(cell, button, PointerPhase::Dragged));
                    }
                }
                if released || !down {
                    let cell = self.gesture.map_or(last_cell, |(_, cell)| cell);
                    self.gesture = None;
                    inputs.push(event(cell, button, PointerPhase::Released));
                }
            }
        }
        inputs
    }

    // ============================================================
    // Drawing Functions
    // ============================================================

    fn draw(
        &self,
        ctx: &Context,
        painter: &Painter,
        rect: Rect,
        grid: GridSpec,
        viewport: Viewport,
        textures: &mut TextureCache,
    ) {
        let editor = self.editor.read();
        let doc_arc = editor.document();
        let doc = doc_arc.read();
        let config = &editor.config;

        self.draw_tiles(ctx, painter, &doc, rect, grid, viewport, textures);

        if editor.show_grid() {
            draw_grid(painter, &doc, viewport, config);
        }

        if let Some(selection) = editor.map_selection() {
            let screen = viewport.world_rect_to_screen(selection.to_rect(grid.cell));
            let fill = color(config.selection_color);
            painter.rect_filled(screen, 0.0, fill);
            painter.rect_stroke(screen, 0.0, Stroke::new(1.0, fill.to_opaque()));
        }

        let Some(cell) = self.hovered else {
            return;
        };
        let index = index_of_cell(cell.0, cell.1, grid.columns);
        if editor.selected_tool() == EditorTool::Paint {
            let stamp = editor.current_stamp();
            let tint = Color32::from_white_alpha((STAMP_PREVIEW_ALPHA * 255.0) as u8);
            for (target, gid) in stamp_targets(&stamp, index, grid.columns, grid.rows) {
                let dest = viewport.world_rect_to_screen(grid.cell_rect(target));
                paint_gid(ctx, painter, &doc, gid, dest, grid.cell, viewport.scale, tint, textures);
            }
        }
        let hover = viewport.world_rect_to_screen(grid.cell_rect(index));
        painter.rect_filled(hover, 0.0, color(config.hover_color));
    }

    /// Draws the visible tile layers, culled to the cells on screen.
    #[allow(clippy::too_many_arguments)]
    fn draw_tiles(
        &self,
        ctx: &Context,
        painter: &Painter,
        doc: &Document,
        rect: Rect,
        grid: GridSpec,
        viewport: Viewport,
        textures: &mut TextureCache,
    ) {
        let (cols, rows) = visible_cells(viewport.screen_rect_to_world(rect), grid);
        for draw in doc.map.flattened_layers() {
            let tint = Color32::from_white_alpha((draw.opacity.clamp(0.0, 1.0) * 255.0) as u8);
            for row in rows.clone() {
                for col in cols.clone() {
                    let index = index_of_cell(col, row, grid.columns);
                    let Some(gid) = draw.layer.cell(index) else {
                        continue;
                    };
                    let dest = viewport.world_rect_to_screen(grid.cell_rect(index));
                    paint_gid(ctx, painter, doc, gid, dest, grid.cell, viewport.scale, tint, textures);
                }
            }
        }
    }
}

/// Draws one tile into the screen rectangle of its cell. Unknown gids and
/// tilesets without an image draw nothing.
#[allow(clippy::too_many_arguments)]
fn paint_gid(
    ctx: &Context,
    painter: &Painter,
    doc: &Document,
    gid: u32,
    cell_screen: Rect,
    cell: Vec2,
    scale: f32,
    tint: Color32,
    textures: &mut TextureCache,
) {
    let Some(resolved) = doc.map.resolve(gid) else {
        return;
    };
    let tileset = &doc.map.tilesets[resolved.tileset_index];
    let Some(image) = doc.image_for_tileset(tileset) else {
        return;
    };
    let Some((uv, size)) = tile_uv(tileset, resolved.local_id, cell, vec2(image.width as f32, image.height as f32), resolved.flip)
    else {
        return;
    };
    let texture = textures.get(ctx, image);
    let dest = Rect::from_min_size(cell_screen.min, size * scale);
    painter.image(texture, dest, uv, tint);
}

/// Texture coordinates and world size of a tile drawn into a cell: the tile
/// is anchored at the cell's top-left corner and clipped to the cell. A
/// flipped axis swaps the uv bounds after clipping from the far edge.
fn tile_uv(tileset: &TileSet, local_id: u32, cell: Vec2, image_size: Vec2, flip: FlipFlags) -> Option<(Rect, Vec2)> {
    let [sx, sy, tw, th] = tileset.tile_source_rect(local_id)?;
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return None;
    }
    let (sx, sy, tw, th) = (sx as f32, sy as f32, tw as f32, th as f32);
    let w = tw.min(cell.x);
    let h = th.min(cell.y);

    let (mut u0, mut u1) = if flip.horizontal { (sx + tw, sx + tw - w) } else { (sx, sx + w) };
    let (mut v0, mut v1) = if flip.vertical { (sy + th, sy + th - h) } else { (sy, sy + h) };
    u0 /= image_size.x;
    u1 /= image_size.x;
    v0 /= image_size.y;
    v1 /= image_size.y;

    // egui flips the image when min > max on an axis.
    Some((Rect { min: pos2(u0, v0), max: pos2(u1, v1) }, vec2(w, h)))
}

fn draw_grid(painter: &Painter, doc: &Document, viewport: Viewport, config: &EditorConfig) {
    let map = &doc.map;
    let extent = stage_size(map.width, map.height, map.tilewidth, map.tileheight);
    let cell = vec2(map.tilewidth as f32, map.tileheight as f32);
    let style = GridLineStyle::map(config.reference_line_every);
    let [r, g, b, a] = config.grid_color;

    for line in grid_lines(extent, cell, &style) {
        let alpha = (a as f32 * style.opacity(line.kind)).round() as u8;
        let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(r, g, b, alpha));
        let points = [viewport.world_to_screen(line.from), viewport.world_to_screen(line.to)];
        if style.is_dashed(line.kind) {
            painter.extend(Shape::dashed_line(&points, stroke, style.dash[0], style.dash[1]));
        } else {
            painter.line_segment(points, stroke);
        }
    }
}

fn to_egui_button(button: PointerButton) -> egui::PointerButton {
    match button {
        PointerButton::Primary => egui::PointerButton::Primary,
        PointerButton::Secondary => egui::PointerButton::Secondary,
    }
}

pub(crate) fn color([r, g, b, a]: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn tileset() -> TileSet {
        // 4x2 tiles of 16x16 in a 64x32 image
        TileSet::new("t", "t.png", 16, 16, 64, 32, 1)
    }

    const IMAGE: Vec2 = vec2(64.0, 32.0);

    #[test]
    fn test_tile_uv_plain() {
        let (uv, size) = tile_uv(&tileset(), 5, vec2(16.0, 16.0), IMAGE, FlipFlags::default()).unwrap();
        assert_approx_eq!(uv.min.x, 0.25);
        assert_approx_eq!(uv.min.y, 0.5);
        assert_approx_eq!(uv.max.x, 0.5);
        assert_approx_eq!(uv.max.y, 1.0);
        assert_eq!(size, vec2(16.0, 16.0));
    }

    #[test]
    fn test_tile_uv_clips_to_cell() {
        let (uv, size) = tile_uv(&tileset(), 0, vec2(8.0, 32.0), IMAGE, FlipFlags::default()).unwrap();
        assert_eq!(size, vec2(8.0, 16.0));
        assert_approx_eq!(uv.max.x, 8.0 / 64.0);
        assert_approx_eq!(uv.max.y, 0.5);
    }

    #[test]
    fn test_tile_uv_flipped_swaps_bounds() {
        let flip = FlipFlags {
            horizontal: true,
            vertical: true,
            diagonal: false,
        };
        let (uv, _) = tile_uv(&tileset(), 0, vec2(16.0, 16.0), IMAGE, flip).unwrap();
        assert_approx_eq!(uv.min.x, 0.25);
        assert_approx_eq!(uv.max.x, 0.0);
        assert_approx_eq!(uv.min.y, 0.5);
        assert_approx_eq!(uv.max.y, 0.0);
    }

    #[test]
    fn test_tile_uv_unknown_tile() {
        assert!(tile_uv(&tileset(), 8, vec2(16.0, 16.0), IMAGE, FlipFlags::default()).is_none());
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(color([255, 0, 0, 255]), Color32::RED);
    }
}
