// src/document/export.rs

use std::path::Path;

use image::RgbaImage;
use log::info;
use rayon::prelude::*;

use super::document::{require_extension, Document};
use crate::error::{EditorError, Result};

/// Composites every visible tile layer into one image the size of the map.
///
/// Tiles are drawn from their cell's top-left corner and clipped to the cell.
/// Flip flags are honored; rows are rendered in parallel.
pub fn render_to_image(doc: &Document) -> Result<RgbaImage> {
    let map = &doc.map;
    let width = map.width * map.tilewidth;
    let height = map.height * map.tileheight;
    let layers = map.flattened_layers();
    let stride = width as usize * 4;

    let mut pixels = vec![0u8; stride * height as usize];
    if stride > 0 {
        pixels.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let col = x / map.tilewidth;
                let tile_row = y / map.tileheight;
                let mut out = [0f32; 4];
                for draw in &layers {
                    let Some(raw) = draw.layer.get(col, tile_row) else {
                        continue;
                    };
                    let Some(resolved) = map.resolve(raw) else {
                        continue;
                    };
                    let tileset = &map.tilesets[resolved.tileset_index];
                    let Some(image) = doc.image_for_tileset(tileset) else {
                        continue;
                    };
                    let Some([sx, sy, tw, th]) = tileset.tile_source_rect(resolved.local_id) else {
                        continue;
                    };
                    let mut px = x % map.tilewidth;
                    let mut py = y % map.tileheight;
                    if px >= tw || py >= th {
                        continue;
                    }
                    if resolved.flip.horizontal {
                        px = tw - 1 - px;
                    }
                    if resolved.flip.vertical {
                        py = th - 1 - py;
                    }
                    blend(&mut out, image.pixel(sx + px, sy + py), draw.opacity);
                }
                let i = x as usize * 4;
                for (c, v) in out.iter().enumerate() {
                    row[i + c] = (v * 255.0).round() as u8;
                }
            }
        });
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| EditorError::UnsupportedFormat(format!("{}x{} image", width, height)))
}

/// Source-over compositing in straight (non-premultiplied) alpha.
fn blend(dst: &mut [f32; 4], src: [u8; 4], opacity: f32) {
    let sa = src[3] as f32 / 255.0 * opacity;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3];
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let s = src[c] as f32 / 255.0;
        dst[c] = (s * sa + dst[c] * da * (1.0 - sa)) / out_a;
    }
    dst[3] = out_a;
}

/// Renders the map and writes it as a PNG file.
pub fn export_png(doc: &Document, path: &Path) -> Result<()> {
    require_extension(path, "png")?;
    let image = render_to_image(doc)?;
    image.save(path)?;
    info!("Exported {}x{} PNG to {}", image.width(), image.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TilesetImage;
    use crate::map::gid::FLIP_H;
    use crate::map::{LayerType, TileMap, TileSet};

    /// A 2x2-pixel tileset with two tiles: left half (red, green), right
    /// half (blue, white) on each row.
    fn doc() -> Document {
        #[rustfmt::skip]
        let rgba = vec![
            255, 0, 0, 255,   0, 255, 0, 255,   0, 0, 255, 255,   255, 255, 255, 255,
            255, 0, 0, 255,   0, 255, 0, 255,   0, 0, 255, 255,   255, 255, 255, 255,
        ];
        let mut doc = Document::new(TileMap::new(2, 1, 2, 2));
        doc.insert_image(TilesetImage::from_rgba("t.png", 4, 2, rgba).unwrap());
        doc.map.tilesets.push(TileSet::new("t.png", "t.png", 2, 2, 4, 2, 1));
        doc
    }

    #[test]
    fn test_empty_map_is_transparent() {
        let image = render_to_image(&doc()).unwrap();
        assert_eq!(image.dimensions(), (4, 2));
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_tiles_and_flips() {
        let mut doc = doc();
        doc.map.layers[0].data = vec![1, 1 | FLIP_H];
        let image = render_to_image(&doc).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 255, 0, 255]);
        // Flipped copy: green on the left, red on the right.
        assert_eq!(image.get_pixel(2, 0).0, [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(3, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_layers_composite_with_opacity() {
        let mut doc = doc();
        doc.map.layers[0].data = vec![2, 0];
        let top = doc.map.add_layer(LayerType::TileLayer);
        let layer = doc.map.find_layer_mut(top).unwrap();
        layer.data = vec![1, 0];
        layer.opacity = 0.5;

        let image = render_to_image(&doc).unwrap();
        // Half red over opaque blue.
        assert_eq!(image.get_pixel(0, 0).0, [128, 0, 128, 255]);

        doc.map.find_layer_mut(top).unwrap().visible = false;
        let image = render_to_image(&doc).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_export_requires_png() {
        let path = std::env::temp_dir().join("tilemap_ed_export.jpg");
        assert!(matches!(export_png(&doc(), &path), Err(EditorError::UnsupportedFormat(_))));
    }
}
