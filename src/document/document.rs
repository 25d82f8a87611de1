// src/document/document.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::error::{EditorError, Result};
use crate::map::{TileMap, TileSet};
use crate::utils::files::write_json_atomic;

/// Decoded RGBA8 pixels of a tileset image.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetImage {
    /// File name the tileset refers to in its `image` field.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
    /// The file as it was read, copied verbatim when the image is saved.
    pub source_bytes: Option<Arc<Vec<u8>>>,
}

impl TilesetImage {
    /// Decodes an encoded image (PNG, JPEG, GIF or BMP).
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            name: name.into(),
            width,
            height,
            rgba: Arc::new(decoded.into_raw()),
            source_bytes: Some(Arc::new(bytes.to_vec())),
        })
    }

    pub fn from_rgba(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(EditorError::UnsupportedFormat(format!(
                "expected {}x{} RGBA pixels, got {} bytes",
                width,
                height,
                rgba.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            rgba: Arc::new(rgba),
            source_bytes: None,
        })
    }

    /// Reads and decodes an image file; the name is the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| EditorError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(name, &bytes)
    }

    /// The RGBA value at `(x, y)`, or transparent outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    /// Writes the original file bytes, or PNG-encodes the pixels when the
    /// image never came from a file.
    fn write_to(&self, path: &Path) -> Result<()> {
        match &self.source_bytes {
            Some(bytes) => fs::write(path, bytes.as_slice()).map_err(|e| EditorError::io(path, e)),
            None => {
                image::save_buffer_with_format(
                    path,
                    &self.rgba,
                    self.width,
                    self.height,
                    image::ColorType::Rgba8,
                    image::ImageFormat::Png,
                )?;
                Ok(())
            }
        }
    }
}

/// The map being edited together with the images its tilesets use.
#[derive(Debug, Clone)]
pub struct Document {
    pub map: TileMap,
    /// Keyed by [`TileSet::image`].
    pub tileset_images: HashMap<String, TilesetImage>,
    pub path: Option<PathBuf>,
    pub dirty: bool,
}

impl Document {
    /// Create a new, unsaved document around `map`.
    pub fn new(map: TileMap) -> Self {
        Self {
            map,
            tileset_images: HashMap::new(),
            path: None,
            dirty: false,
        }
    }

    pub fn image_for_tileset(&self, tileset: &TileSet) -> Option<&TilesetImage> {
        self.tileset_images.get(&tileset.image)
    }

    pub fn insert_image(&mut self, image: TilesetImage) {
        self.tileset_images.insert(image.name.clone(), image);
    }

    /// Drops images that no tileset refers to anymore.
    pub fn prune_images(&mut self) {
        let map = &self.map;
        self.tileset_images
            .retain(|name, _| map.tilesets.iter().any(|ts| &ts.image == name));
    }

    /// File name shown in the title bar.
    pub fn title(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    }

    /// Loads a Tiled JSON map and the tileset images next to it.
    ///
    /// A tileset whose image can't be read is kept; the UI shows it as
    /// missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        require_extension(path, "json")?;
        let text = fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        let mut map: TileMap = serde_json::from_str(&text).map_err(|e| EditorError::json(path, e))?;
        map.normalize();

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut doc = Self::new(map);
        for tileset in &doc.map.tilesets {
            if doc.tileset_images.contains_key(&tileset.image) {
                continue;
            }
            match TilesetImage::from_path(&dir.join(&tileset.image)) {
                Ok(mut image) => {
                    image.name = tileset.image.clone();
                    doc.tileset_images.insert(image.name.clone(), image);
                }
                Err(e) => warn!("Tileset '{}': {}", tileset.name, e),
            }
        }

        info!(
            "Loaded map {} ({}x{}, {} layers, {} tilesets)",
            path.display(),
            doc.map.width,
            doc.map.height,
            doc.map.layers.len(),
            doc.map.tilesets.len()
        );
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Writes the map as pretty JSON. Tileset images that don't exist next
    /// to the map yet are written first, so the map can be reopened.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        require_extension(path, "json")?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.write_missing_images(dir)?;
        write_json_atomic(path, &self.map)?;

        info!("Saved map {}", path.display());
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Pixel-only images are always PNG-encoded; a tileset that names one
    /// with another extension is pointed at a free `.png` name instead.
    fn write_missing_images(&mut self, dir: &Path) -> Result<()> {
        let mut names: Vec<String> = self.tileset_images.keys().cloned().collect();
        names.sort();
        for name in names {
            if dir.join(&name).exists() {
                continue;
            }
            let Some(mut image) = self.tileset_images.remove(&name) else {
                continue;
            };
            if image.source_bytes.is_none() && !has_extension(Path::new(&name), "png") {
                let renamed = self.free_png_name(dir, &name);
                for tileset in self.map.tilesets.iter_mut().filter(|ts| ts.image == name) {
                    tileset.image = renamed.clone();
                }
                info!("Tileset image {} is stored as {}", name, renamed);
                image.name = renamed;
            }

            let target = dir.join(&image.name);
            let written = image.write_to(&target);
            self.tileset_images.insert(image.name.clone(), image);
            written?;
            info!("Wrote tileset image {}", target.display());
        }
        Ok(())
    }

    fn free_png_name(&self, dir: &Path, name: &str) -> String {
        let base = Path::new(name).with_extension("png");
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tileset".to_owned());
        let taken = |candidate: &Path| {
            self.tileset_images.contains_key(candidate.to_string_lossy().as_ref()) || dir.join(candidate).exists()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while taken(&candidate) {
            candidate = base.with_file_name(format!("{}-{}.png", stem, n));
            n += 1;
        }
        candidate.to_string_lossy().into_owned()
    }

    /// Saves to the path the document was loaded from or last saved to.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(EditorError::NoDocumentPath)?;
        self.save_to_path(&path)
    }
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| ext == expected)
}

pub(crate) fn require_extension(path: &Path, expected: &str) -> Result<()> {
    if has_extension(path, expected) {
        Ok(())
    } else {
        Err(EditorError::UnsupportedFormat(format!(
            "{} (expected a .{} file)",
            path.display(),
            expected
        )))
    }
}
