// src/config.rs

//! User preferences, persisted as JSON in the platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::utils::files::write_json_atomic;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of new maps, in tiles.
    pub map_width: u32,
    pub map_height: u32,
    /// Tile size of new maps, in pixels.
    pub tile_width: u32,
    pub tile_height: u32,
    pub scale: f32,
    pub show_grid: bool,
    /// Every n-th grid line is drawn brighter; 0 disables this.
    pub reference_line_every: u32,
    pub hover_color: [u8; 4],
    pub selection_color: [u8; 4],
    pub grid_color: [u8; 4],
    pub background_color: [u8; 4],
    /// Where the file dialogs open.
    pub last_directory: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            map_width: 30,
            map_height: 30,
            tile_width: 32,
            tile_height: 32,
            scale: 1.0,
            show_grid: true,
            reference_line_every: 10,
            hover_color: [0, 255, 0, 77],
            selection_color: [0, 120, 255, 90],
            grid_color: [255, 255, 255, 255],
            background_color: [40, 40, 40, 255],
            last_directory: None,
        }
    }
}

impl EditorConfig {
    /// `<config dir>/config.json`, if the platform has a config directory.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "tilemap-ed", "TileMapEd").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads the user's config, falling back to the defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available; using defaults");
                Self::default()
            }
        }
    }

    /// Loads a config file. A missing file gives the defaults silently, a
    /// broken one gives the defaults with a warning.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(Some(config)) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| EditorError::json(path, e))?;
        Ok(Some(config.sanitized()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| EditorError::Config("no config directory available".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| EditorError::io(dir, e))?;
        }
        write_json_atomic(path, self)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Replaces values the editor can't work with by their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.map_width == 0 {
            self.map_width = defaults.map_width;
        }
        if self.map_height == 0 {
            self.map_height = defaults.map_height;
        }
        if self.tile_width == 0 {
            self.tile_width = defaults.tile_width;
        }
        if self.tile_height == 0 {
            self.tile_height = defaults.tile_height;
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            self.scale = defaults.scale;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tilemap_ed_cfg_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("nested").join(CONFIG_FILE)
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!((config.map_width, config.map_height), (30, 30));
        assert_eq!((config.tile_width, config.tile_height), (32, 32));
        assert_eq!(config.scale, 1.0);
        assert!(config.show_grid);
        assert_eq!(config.reference_line_every, 10);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_file("missing");
        assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_file("round_trip");
        let config = EditorConfig {
            map_width: 64,
            show_grid: false,
            last_directory: Some(PathBuf::from("/tmp/maps")),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path), config);
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_save_over_existing_config() {
        let path = temp_file("overwrite");
        EditorConfig::default().save_to(&path).unwrap();
        let config = EditorConfig {
            tile_width: 8,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path), config);
        assert!(!crate::utils::files::staging_path(&path).exists());
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_partial_and_broken_files() {
        let path = temp_file("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, r#"{ "tile_width": 16, "map_height": 0 }"#).unwrap();
        let config = EditorConfig::load_from(&path);
        assert_eq!(config.tile_width, 16);
        assert_eq!(config.map_height, 30);
        assert_eq!(config.map_width, 30);

        fs::write(&path, "{{{").unwrap();
        assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}
