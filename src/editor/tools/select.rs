// src/editor/tools/select.rs

use super::{MapInput, PointerButton, PointerPhase, Tool};
use crate::editor::EditorCommand;
use crate::utils::GridRect;

/// Rubber-band selection of a rectangle of map cells.
#[derive(Debug, Default)]
pub struct SelectTool {
    drag_start: Option<(u32, u32)>,
}

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn handle_input(&mut self, input: &MapInput) -> Vec<EditorCommand> {
        if input.button == PointerButton::Secondary {
            if input.phase == PointerPhase::Pressed {
                self.cleanup();
                return vec![EditorCommand::SetMapSelection(None)];
            }
            return Vec::new();
        }

        match input.phase {
            PointerPhase::Pressed => {
                self.drag_start = Some(input.cell);
                vec![EditorCommand::SetMapSelection(Some(GridRect::single(input.cell)))]
            }
            PointerPhase::Dragged => match self.drag_start {
                Some(start) => vec![EditorCommand::SetMapSelection(Some(GridRect::from_corners(
                    start, input.cell,
                )))],
                None => Vec::new(),
            },
            PointerPhase::Released => {
                self.cleanup();
                Vec::new()
            }
        }
    }

    fn cleanup(&mut self) {
        self.drag_start = None;
    }
}
