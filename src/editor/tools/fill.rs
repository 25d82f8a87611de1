// src/editor/tools/fill.rs

use super::{MapInput, PointerButton, PointerPhase, Tool};
use crate::editor::EditorCommand;

/// Bucket fill on primary press.
#[derive(Debug, Default)]
pub struct FillTool;

impl Tool for FillTool {
    fn name(&self) -> &'static str {
        "Fill"
    }

    fn handle_input(&mut self, input: &MapInput) -> Vec<EditorCommand> {
        if input.button == PointerButton::Primary && input.phase == PointerPhase::Pressed {
            vec![EditorCommand::FillTiles {
                grid_index: input.grid_index,
            }]
        } else {
            Vec::new()
        }
    }

    fn cleanup(&mut self) {}
}
