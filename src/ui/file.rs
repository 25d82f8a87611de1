// src/ui/file.rs

//! Native file pickers. Every picker starts in `start_dir` when given and
//! returns `None` when the user cancels.

use std::path::{Path, PathBuf};

use log::info;
use rfd::FileDialog;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

fn dialog(start_dir: Option<&Path>) -> FileDialog {
    let dialog = FileDialog::new();
    match start_dir {
        Some(dir) if dir.is_dir() => dialog.set_directory(dir),
        _ => dialog,
    }
}

fn logged(kind: &str, picked: Option<PathBuf>) -> Option<PathBuf> {
    match &picked {
        Some(path) => info!("Selected {}: {}", kind, path.display()),
        None => info!("{} selection cancelled.", kind),
    }
    picked
}

/// Asks for a map file to open.
pub fn pick_map(start_dir: Option<&Path>) -> Option<PathBuf> {
    logged("map", dialog(start_dir).add_filter("Tiled JSON map", &["json"]).pick_file())
}

/// Asks where to save the map. A missing `.json` extension is appended.
pub fn pick_map_destination(start_dir: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    let picked = dialog(start_dir)
        .add_filter("Tiled JSON map", &["json"])
        .set_file_name(file_name)
        .save_file()
        .map(|path| with_extension(path, "json"));
    logged("map destination", picked)
}

/// Asks for a tileset image.
pub fn pick_image(start_dir: Option<&Path>) -> Option<PathBuf> {
    logged("image", dialog(start_dir).add_filter("Images", IMAGE_EXTENSIONS).pick_file())
}

/// Asks where to export the rendered map.
pub fn pick_png_destination(start_dir: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    let picked = dialog(start_dir)
        .add_filter("PNG image", &["png"])
        .set_file_name(file_name)
        .save_file()
        .map(|path| with_extension(path, "png"));
    logged("export destination", picked)
}

fn with_extension(path: PathBuf, ext: &str) -> PathBuf {
    let matches = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext));
    if matches {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}
