// src/editor/tools/mod.rs
mod fill;
mod paint;
mod picker;
mod select;

pub use fill::FillTool;
pub use paint::{build_stamp, stamp_targets, PaintTool, StampCell};
pub use picker::TilePicker;
pub use select::SelectTool;

use super::{EditorCommand, EditorTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Where in a press-drag-release gesture an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Pressed,
    /// The pointer moved onto another cell with the button held.
    Dragged,
    Released,
}

/// A pointer event on the map canvas, already resolved to a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInput {
    pub cell: (u32, u32),
    pub grid_index: usize,
    pub button: PointerButton,
    pub phase: PointerPhase,
}

/// A pointer event on a tileset canvas, resolved to a tileset cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetInput {
    pub cell: (u32, u32),
    pub phase: PointerPhase,
}

/// A map tool turns pointer events into editor commands.
pub trait Tool {
    fn name(&self) -> &'static str;
    fn handle_input(&mut self, input: &MapInput) -> Vec<EditorCommand>;
    /// Drops any gesture in progress.
    fn cleanup(&mut self);
}

/// Cursor doesn't edit anything; the canvas pans while it is active.
#[derive(Debug, Default)]
pub struct CursorTool;

impl Tool for CursorTool {
    fn name(&self) -> &'static str {
        EditorTool::Cursor.name()
    }

    fn handle_input(&mut self, _input: &MapInput) -> Vec<EditorCommand> {
        Vec::new()
    }

    fn cleanup(&mut self) {}
}

/// One instance of every map tool. Gesture state lives in the tools and is
/// dropped with `cleanup_all` when the active tool changes.
#[derive(Debug, Default)]
pub struct ToolBox {
    cursor: CursorTool,
    paint: PaintTool,
    select: SelectTool,
    fill: FillTool,
}

impl ToolBox {
    pub fn get_mut(&mut self, tool: EditorTool) -> &mut dyn Tool {
        match tool {
            EditorTool::Cursor => &mut self.cursor,
            EditorTool::Paint => &mut self.paint,
            EditorTool::Select => &mut self.select,
            EditorTool::Fill => &mut self.fill,
        }
    }

    pub fn cleanup_all(&mut self) {
        self.cursor.cleanup();
        self.paint.cleanup();
        self.select.cleanup();
        self.fill.cleanup();
    }
}

#[cfg(test)]
pub(crate) fn input(cell: (u32, u32), columns: u32, button: PointerButton, phase: PointerPhase) -> MapInput {
    MapInput {
        cell,
        grid_index: crate::utils::grid::index_of_cell(cell.0, cell.1, columns),
        button,
        phase,
    }
}
