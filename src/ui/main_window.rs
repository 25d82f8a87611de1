//! # Main Window Module
//!
//! `TileEdApp` is the eframe application. It owns the panels, the dialogs and
//! the texture cache, routes keyboard shortcuts, and guards every action that
//! would drop unsaved changes behind the "Unsaved Changes" prompt.

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{self, Context, Key, Modifiers, ViewportCommand};
use log::{error, info};
use parking_lot::RwLock;

use crate::editor::{Editor, EditorCommand, EditorTool};
use crate::ui::central_panel::CentralPanel;
use crate::ui::dialog::{DialogManager, DialogResult, TilesetDialog, TilesetDialogResult};
use crate::ui::file;
use crate::ui::menu::{MenuAction, MenuBar};
use crate::ui::side_panel::SidePanel;
use crate::ui::status_bar::StatusBar;
use crate::ui::textures::TextureCache;
use crate::ui::tilesets_panel::{TilesetPanelAction, TilesetsPanel};
use crate::ui::toolbar::Toolbar;

pub const APP_NAME: &str = "TileMapEd";

/// Actions that throw the current document away and so may have to wait for
/// the user's answer to the save prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAction {
    NewMap,
    Open,
    Exit,
}

pub struct TileEdApp {
    editor: Arc<RwLock<Editor>>,
    menu: MenuBar,
    toolbar: Toolbar,
    side_panel: SidePanel,
    tilesets_panel: TilesetsPanel,
    central_panel: CentralPanel,
    status_bar: StatusBar,

    dialogs: DialogManager,
    tileset_dialog: Option<TilesetDialog>,
    textures: TextureCache,

    pending: Option<PendingAction>,
    /// Set once the user confirmed exiting, so the next close request goes through.
    allow_close: bool,
    window_title: String,
}

impl TileEdApp {
    pub fn new(editor: Editor) -> Self {
        let editor = Arc::new(RwLock::new(editor));
        Self {
            menu: MenuBar::new(Arc::clone(&editor)),
            toolbar: Toolbar::new(Arc::clone(&editor)),
            side_panel: SidePanel::new(Arc::clone(&editor)),
            tilesets_panel: TilesetsPanel::new(Arc::clone(&editor)),
            central_panel: CentralPanel::new(Arc::clone(&editor)),
            status_bar: StatusBar::new(Arc::clone(&editor)),
            editor,
            dialogs: DialogManager::new(),
            tileset_dialog: None,
            textures: TextureCache::new(),
            pending: None,
            allow_close: false,
            window_title: String::new(),
        }
    }

    // ============================================================
    // Actions
    // ============================================================

    fn handle_menu_action(&mut self, ctx: &Context, action: MenuAction) {
        match action {
            MenuAction::New => self.request(ctx, PendingAction::NewMap),
            MenuAction::Open => self.request(ctx, PendingAction::Open),
            MenuAction::Exit => self.request(ctx, PendingAction::Exit),
            MenuAction::Save => {
                self.save(false);
            }
            MenuAction::SaveAs => {
                self.save(true);
            }
            MenuAction::ExportPng => self.export_png(),
            MenuAction::ToggleSidePanel => {
                self.side_panel.show_side_panel = !self.side_panel.show_side_panel;
            }
            MenuAction::ToggleTilesetsPanel => {
                self.tilesets_panel.show_panel = !self.tilesets_panel.show_panel;
            }
            MenuAction::ResetView => {
                self.central_panel.reset_pan();
                self.editor.write().execute_command(EditorCommand::ResetZoom);
            }
        }
    }

    /// Runs `action` now, or after the save prompt when there are unsaved changes.
    fn request(&mut self, ctx: &Context, action: PendingAction) {
        if self.editor.read().has_unsaved_changes() {
            self.pending = Some(action);
            self.dialogs.show_save_changes_dialog();
        } else {
            self.perform(ctx, action);
        }
    }

    fn perform(&mut self, ctx: &Context, action: PendingAction) {
        match action {
            PendingAction::NewMap => {
                self.editor.write().execute_command(EditorCommand::NewMap);
                self.central_panel.reset_pan();
            }
            PendingAction::Open => {
                let start_dir = self.last_directory();
                if let Some(path) = file::pick_map(start_dir.as_deref()) {
                    self.editor.write().open_document_wrapper(&path);
                    self.central_panel.reset_pan();
                }
            }
            PendingAction::Exit => {
                self.allow_close = true;
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        }
    }

    fn resolve_pending(&mut self, ctx: &Context, result: DialogResult) {
        let Some(action) = self.pending.take() else {
            return;
        };
        match result {
            DialogResult::Save => {
                if self.save(false) {
                    self.perform(ctx, action);
                }
            }
            DialogResult::DontSave => self.perform(ctx, action),
            DialogResult::Cancel => info!("{:?} cancelled.", action),
        }
    }

    /// Saves to the known path, asking for one when needed or when `save_as`
    /// is set. Returns true when the document ends up saved.
    fn save(&mut self, save_as: bool) -> bool {
        if !save_as && self.editor.write().save_document_wrapper() {
            return !self.editor.read().has_unsaved_changes();
        }
        let start_dir = self.last_directory();
        let file_name = format!("{}.json", self.document_stem());
        match file::pick_map_destination(start_dir.as_deref(), &file_name) {
            Some(path) => {
                self.editor.write().save_document_as_wrapper(&path);
                !self.editor.read().has_unsaved_changes()
            }
            None => false,
        }
    }

    fn export_png(&mut self) {
        let start_dir = self.last_directory();
        let file_name = format!("{}.png", self.document_stem());
        if let Some(path) = file::pick_png_destination(start_dir.as_deref(), &file_name) {
            self.editor.write().export_png_wrapper(&path);
        }
    }

    fn document_stem(&self) -> String {
        let title = self.editor.read().document().read().title();
        title.trim_end_matches(".json").to_string()
    }

    fn last_directory(&self) -> Option<PathBuf> {
        self.editor.read().config.last_directory.clone()
    }

    fn open_tileset_dialog(&mut self, action: TilesetPanelAction) {
        let editor = self.editor.read();
        let dialog = match action {
            TilesetPanelAction::Add => TilesetDialog::add(editor.config.tile_width, editor.config.tile_height),
            TilesetPanelAction::Edit(hash) => {
                let Some(entry) = editor.tilesets().into_iter().find(|entry| entry.hash == hash) else {
                    return;
                };
                let image = editor.document().read().image_for_tileset(&entry.tileset).cloned();
                TilesetDialog::edit(&entry, image)
            }
        };
        drop(editor);
        self.tileset_dialog = Some(dialog);
    }

    fn show_tileset_dialog(&mut self, ctx: &Context) {
        let start_dir = self.last_directory();
        let Some(dialog) = &mut self.tileset_dialog else {
            return;
        };
        let Some(result) = dialog.show(ctx, start_dir.as_deref()) else {
            return;
        };
        let picked = dialog.picked_directory.take();
        self.tileset_dialog = None;

        let mut editor = self.editor.write();
        if picked.is_some() {
            editor.config.last_directory = picked;
        }
        if let TilesetDialogResult::Submit(command) = result {
            editor.execute_command(command);
        }
    }

    // ============================================================
    // Keyboard
    // ============================================================

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() || self.dialogs.is_open() || self.tileset_dialog.is_some() {
            return;
        }

        let (save, commands) = ctx.input_mut(|i| {
            let save = i.consume_key(Modifiers::COMMAND, Key::S);
            let mut commands = Vec::new();
            if i.consume_key(Modifiers::COMMAND, Key::Plus) || i.consume_key(Modifiers::COMMAND, Key::Equals) {
                commands.push(EditorCommand::ZoomIn);
            }
            if i.consume_key(Modifiers::COMMAND, Key::Minus) {
                commands.push(EditorCommand::ZoomOut);
            }
            if i.consume_key(Modifiers::COMMAND, Key::Num0) {
                commands.push(EditorCommand::ResetZoom);
            }
            if i.consume_key(Modifiers::NONE, Key::Delete) || i.consume_key(Modifiers::NONE, Key::Backspace) {
                commands.push(EditorCommand::ClearSelectedRegion);
            }
            for tool in EditorTool::all() {
                if let Some(key) = Key::from_name(&tool.shortcut().to_string()) {
                    if i.consume_key(Modifiers::NONE, key) {
                        commands.push(EditorCommand::SetSelectedTool(*tool));
                    }
                }
            }
            (save, commands)
        });

        if save {
            self.save(false);
        }
        if !commands.is_empty() {
            self.editor.write().execute_commands(commands);
        }
    }

    // ============================================================
    // Window
    // ============================================================

    fn handle_close_request(&mut self, ctx: &Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if !self.allow_close && self.editor.read().has_unsaved_changes() {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            self.pending = Some(PendingAction::Exit);
            self.dialogs.show_save_changes_dialog();
            return;
        }
        self.save_config();
    }

    fn save_config(&self) {
        let editor = self.editor.read();
        let mut config = editor.config.clone();
        config.scale = editor.scale();
        config.show_grid = editor.show_grid();
        match config.save() {
            Ok(()) => info!("Configuration saved."),
            Err(e) => error!("Could not save configuration: {}", e),
        }
    }

    fn update_title(&mut self, ctx: &Context) {
        let title = {
            let editor = self.editor.read();
            let doc_arc = editor.document();
            let doc = doc_arc.read();
            let marker = if doc.dirty { "*" } else { "" };
            format!("{}{} - {}", doc.title(), marker, APP_NAME)
        };
        if title != self.window_title {
            ctx.send_viewport_cmd(ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }
    }
}

impl eframe::App for TileEdApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_close_request(ctx);
        self.handle_shortcuts(ctx);

        {
            let editor = self.editor.read();
            self.textures.prune(&editor.document().read());
        }

        if let Some(action) = self.menu.update(ctx) {
            self.handle_menu_action(ctx, action);
        }
        self.toolbar.update(ctx);
        self.status_bar.update(ctx, self.central_panel.hovered_cell());
        self.side_panel.update(ctx);
        if let Some(action) = self.tilesets_panel.update(ctx, &mut self.textures) {
            self.open_tileset_dialog(action);
        }
        self.central_panel.update(ctx, &mut self.textures);

        self.show_tileset_dialog(ctx);
        if let Some(result) = self.dialogs.update(ctx) {
            self.resolve_pending(ctx, result);
        }

        self.update_title(ctx);
    }
}
