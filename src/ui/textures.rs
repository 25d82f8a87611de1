// src/ui/textures.rs

use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{self, ColorImage, TextureHandle, TextureId, TextureOptions};

use crate::document::{Document, TilesetImage};

/// GPU textures for the tileset images, keyed by image name.
///
/// An entry is re-uploaded when the image behind a name changes, which is
/// detected by comparing the pixel buffer's `Arc`.
#[derive(Default)]
pub struct TextureCache {
    entries: HashMap<String, (Arc<Vec<u8>>, TextureHandle)>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, ctx: &egui::Context, image: &TilesetImage) -> TextureId {
        if let Some((pixels, handle)) = self.entries.get(&image.name) {
            if Arc::ptr_eq(pixels, &image.rgba) {
                return handle.id();
            }
        }
        let color_image = ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.rgba,
        );
        // Tiles are pixel art; nearest keeps them crisp when zoomed.
        let handle = ctx.load_texture(format!("tileset-{}", image.name), color_image, TextureOptions::NEAREST);
        let id = handle.id();
        self.entries
            .insert(image.name.clone(), (Arc::clone(&image.rgba), handle));
        id
    }

    /// Frees textures for images the document no longer has.
    pub fn prune(&mut self, doc: &Document) {
        self.entries.retain(|name, (pixels, _)| {
            doc.tileset_images
                .get(name)
                .is_some_and(|image| Arc::ptr_eq(pixels, &image.rgba))
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
