//! # Grid Module
//!
//! Coordinate math shared by the map canvas and the tileset canvases: snapping
//! pointer positions to the tile grid, converting between positions and cell
//! indices, the screen/world transform, and the grid line layout.
//!
//! Everything in here is pure arithmetic over `egui::Pos2`/`egui::Vec2`, so it
//! can be tested without an egui context.

use std::ops::Range;

use egui::{pos2, vec2, Pos2, Rect, Vec2};

/// The shape of a grid: how many cells it has and how big each cell is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    pub cell: Vec2,
}

impl GridSpec {
    pub fn new(columns: u32, rows: u32, cell: Vec2) -> Self {
        Self {
            columns,
            rows,
            cell,
        }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the whole grid in its own coordinate space.
    pub fn extent(&self) -> Vec2 {
        vec2(
            self.columns as f32 * self.cell.x,
            self.rows as f32 * self.cell.y,
        )
    }

    /// The rectangle covered by the cell at `index`.
    pub fn cell_rect(&self, index: usize) -> Rect {
        Rect::from_min_size(map_index_to_coords(index, *self), self.cell)
    }

    /// Column and row of the cell under `pos`, if it lies on the grid.
    pub fn cell_at(&self, pos: Pos2) -> Option<(u32, u32)> {
        if self.cell.x <= 0.0 || self.cell.y <= 0.0 || pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let col = (pos.x / self.cell.x).floor();
        let row = (pos.y / self.cell.y).floor();
        if col >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }
        Some((col as u32, row as u32))
    }
}

/// Snaps a position to the closest top-left grid point.
pub fn snap_to_grid(pos: Pos2, cell: Vec2) -> Pos2 {
    if cell.x <= 0.0 || cell.y <= 0.0 {
        return pos;
    }
    pos2(
        (pos.x / cell.x).floor() * cell.x,
        (pos.y / cell.y).floor() * cell.y,
    )
}

/// Maps a position to the row-major index of the cell under it.
///
/// Returns `None` for positions off the grid.
pub fn map_coords_to_index(pos: Pos2, grid: GridSpec) -> Option<usize> {
    let (col, row) = grid.cell_at(pos)?;
    Some(index_of_cell(col, row, grid.columns))
}

/// Maps a row-major cell index to the top-left corner of that cell.
pub fn map_index_to_coords(index: usize, grid: GridSpec) -> Pos2 {
    let (col, row) = cell_of_index(index, grid.columns);
    pos2(col as f32 * grid.cell.x, row as f32 * grid.cell.y)
}

#[inline]
pub fn cell_of_index(index: usize, columns: u32) -> (u32, u32) {
    if columns == 0 {
        return (0, 0);
    }
    let columns = columns as usize;
    ((index % columns) as u32, (index / columns) as u32)
}

#[inline]
pub fn index_of_cell(col: u32, row: u32, columns: u32) -> usize {
    row as usize * columns as usize + col as usize
}

/// Size of the map stage in pixels, one extra pixel so the closing grid lines
/// stay inside it.
pub fn stage_size(map_width: u32, map_height: u32, tile_width: u32, tile_height: u32) -> Vec2 {
    vec2(
        (map_width * tile_width + 1) as f32,
        (map_height * tile_height + 1) as f32,
    )
}

/// The cell ranges (columns, rows) that intersect a world-space rectangle,
/// clamped to the grid.
pub fn visible_cells(world: Rect, grid: GridSpec) -> (Range<u32>, Range<u32>) {
    if grid.cell.x <= 0.0 || grid.cell.y <= 0.0 {
        return (0..0, 0..0);
    }
    let clamp = |v: f32, max: u32| v.max(0.0).min(max as f32) as u32;
    let x0 = clamp((world.min.x / grid.cell.x).floor(), grid.columns);
    let x1 = clamp((world.max.x / grid.cell.x).ceil(), grid.columns);
    let y0 = clamp((world.min.y / grid.cell.y).floor(), grid.rows);
    let y1 = clamp((world.max.y / grid.cell.y).ceil(), grid.rows);
    (x0..x1, y0..y1)
}

// ============================================================
// Screen <-> World
// ============================================================

/// Scale and translation from world (map pixel) space to screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Pos2,
    pub scale: f32,
}

impl Viewport {
    pub fn new(origin: Pos2, scale: f32) -> Self {
        Self { origin, scale }
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.origin + world.to_vec2() * self.scale
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen - self.origin) / self.scale).to_pos2()
    }

    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.world_to_screen(rect.min), self.world_to_screen(rect.max))
    }

    pub fn screen_rect_to_world(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.screen_to_world(rect.min), self.screen_to_world(rect.max))
    }

    /// Changes the scale while keeping the world point under `pointer` fixed.
    pub fn zoom_about(&mut self, pointer: Pos2, new_scale: f32) {
        let world = self.screen_to_world(pointer);
        self.scale = new_scale;
        self.origin = pointer - world.to_vec2() * new_scale;
    }
}

// ============================================================
// Grid Lines
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLineKind {
    /// First or last line of the grid.
    Border,
    /// Every n-th line, drawn a bit brighter to help counting tiles.
    Reference,
    Regular,
}

/// Opacity and dash pattern per line kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLineStyle {
    pub border_opacity: f32,
    pub reference_opacity: f32,
    pub regular_opacity: f32,
    pub reference_every: Option<u32>,
    /// Dash and gap length; border lines are always solid.
    pub dash: [f32; 2],
}

impl GridLineStyle {
    /// Map canvas style.
    pub fn map(reference_every: u32) -> Self {
        Self {
            border_opacity: 0.5,
            reference_opacity: 0.5,
            regular_opacity: 0.2,
            reference_every: (reference_every > 0).then_some(reference_every),
            dash: [4.0, 2.0],
        }
    }

    /// Tileset canvas style.
    pub fn tileset() -> Self {
        Self {
            border_opacity: 0.7,
            reference_opacity: 0.5,
            regular_opacity: 0.5,
            reference_every: None,
            dash: [4.0, 2.0],
        }
    }

    pub fn opacity(&self, kind: GridLineKind) -> f32 {
        match kind {
            GridLineKind::Border => self.border_opacity,
            GridLineKind::Reference => self.reference_opacity,
            GridLineKind::Regular => self.regular_opacity,
        }
    }

    pub fn is_dashed(&self, kind: GridLineKind) -> bool {
        kind != GridLineKind::Border
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub from: Pos2,
    pub to: Pos2,
    pub kind: GridLineKind,
}

/// Lays out the vertical and horizontal grid lines over `extent`, every
/// `cell` units, starting at zero.
pub fn grid_lines(extent: Vec2, cell: Vec2, style: &GridLineStyle) -> Vec<GridLine> {
    let mut lines = Vec::new();
    if cell.x <= 0.0 || cell.y <= 0.0 {
        return lines;
    }

    let classify = |k: u32, at: f32, dimension: f32| {
        if k == 0 || (at - (dimension - 1.0)).abs() < f32::EPSILON {
            GridLineKind::Border
        } else if style.reference_every.is_some_and(|n| k % n == 0) {
            GridLineKind::Reference
        } else {
            GridLineKind::Regular
        }
    };

    let mut k = 0u32;
    loop {
        let x = k as f32 * cell.x;
        if x >= extent.x {
            break;
        }
        lines.push(GridLine {
            from: pos2(x, 0.0),
            to: pos2(x, extent.y),
            kind: classify(k, x, extent.x),
        });
        k += 1;
    }

    let mut k = 0u32;
    loop {
        let y = k as f32 * cell.y;
        if y >= extent.y {
            break;
        }
        lines.push(GridLine {
            from: pos2(0.0, y),
            to: pos2(extent.x, y),
            kind: classify(k, y, extent.y),
        });
        k += 1;
    }

    lines
}

// ============================================================
// Cell Rectangles
// ============================================================

/// An inclusive rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub min_col: u32,
    pub min_row: u32,
    pub max_col: u32,
    pub max_row: u32,
}

impl GridRect {
    /// The rectangle spanned by two corner cells, in any order.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            min_col: a.0.min(b.0),
            min_row: a.1.min(b.1),
            max_col: a.0.max(b.0),
            max_row: a.1.max(b.1),
        }
    }

    pub fn single(cell: (u32, u32)) -> Self {
        Self::from_corners(cell, cell)
    }

    pub fn width(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    pub fn height(&self) -> u32 {
        self.max_row - self.min_row + 1
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.min_col..=self.max_col).contains(&col) && (self.min_row..=self.max_row).contains(&row)
    }

    /// Row-major indices of the covered cells within a grid of `columns`
    /// columns and `rows` rows. Cells past the grid edge are skipped.
    pub fn indices(&self, columns: u32, rows: u32) -> Vec<usize> {
        let mut out = Vec::with_capacity((self.width() * self.height()) as usize);
        for row in self.min_row..=self.max_row.min(rows.saturating_sub(1)) {
            for col in self.min_col..=self.max_col.min(columns.saturating_sub(1)) {
                out.push(index_of_cell(col, row, columns));
            }
        }
        out
    }

    /// The rectangle in the grid's coordinate space.
    pub fn to_rect(&self, cell: Vec2) -> Rect {
        Rect::from_min_max(
            pos2(self.min_col as f32 * cell.x, self.min_row as f32 * cell.y),
            pos2(
                (self.max_col + 1) as f32 * cell.x,
                (self.max_row + 1) as f32 * cell.y,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn map_grid() -> GridSpec {
        GridSpec::new(30, 30, vec2(32.0, 32.0))
    }

    #[test]
    fn test_snap_to_grid_floors_to_top_left() {
        assert_eq!(snap_to_grid(pos2(33.0, 70.5), vec2(32.0, 32.0)), pos2(32.0, 64.0));
        assert_eq!(snap_to_grid(pos2(31.9, 0.0), vec2(32.0, 32.0)), pos2(0.0, 0.0));
        assert_eq!(snap_to_grid(pos2(-1.0, 5.0), vec2(16.0, 16.0)), pos2(-16.0, 0.0));
    }

    #[test]
    fn test_coords_to_index() {
        let grid = map_grid();
        assert_eq!(map_coords_to_index(pos2(0.0, 0.0), grid), Some(0));
        assert_eq!(map_coords_to_index(pos2(40.0, 10.0), grid), Some(1));
        assert_eq!(map_coords_to_index(pos2(10.0, 40.0), grid), Some(30));
        assert_eq!(map_coords_to_index(pos2(959.0, 959.0), grid), Some(899));
    }

    #[test]
    fn test_coords_off_grid() {
        let grid = map_grid();
        assert_eq!(map_coords_to_index(pos2(-0.5, 3.0), grid), None);
        assert_eq!(map_coords_to_index(pos2(960.0, 3.0), grid), None);
        assert_eq!(map_coords_to_index(pos2(3.0, 960.0), grid), None);
    }

    #[test]
    fn test_index_to_coords_inverts_coords_to_index() {
        let grid = GridSpec::new(7, 5, vec2(16.0, 24.0));
        for index in 0..grid.len() {
            let corner = map_index_to_coords(index, grid);
            let inside = corner + vec2(3.0, 3.0);
            assert_eq!(map_coords_to_index(inside, grid), Some(index));
        }
    }

    #[test]
    fn test_scaled_grid() {
        // Tileset canvases scale their grid to the panel width.
        let grid = GridSpec::new(8, 4, vec2(32.0 * 0.75, 32.0 * 0.75));
        assert_eq!(map_coords_to_index(pos2(25.0, 25.0), grid), Some(9));
    }

    #[test]
    fn test_stage_size() {
        assert_eq!(stage_size(30, 30, 32, 32), vec2(961.0, 961.0));
        assert_eq!(stage_size(2, 3, 16, 8), vec2(33.0, 25.0));
    }

    #[test]
    fn test_viewport_round_trip_and_zoom_anchor() {
        let mut vp = Viewport::new(pos2(100.0, 50.0), 2.0);
        let world = pos2(12.0, 7.5);
        let screen = vp.world_to_screen(world);
        assert_eq!(screen, pos2(124.0, 65.0));
        assert_eq!(vp.screen_to_world(screen), world);

        let pointer = pos2(300.0, 200.0);
        let anchored = vp.screen_to_world(pointer);
        vp.zoom_about(pointer, 0.5);
        let after = vp.screen_to_world(pointer);
        assert_approx_eq!(after.x, anchored.x, 1e-3);
        assert_approx_eq!(after.y, anchored.y, 1e-3);
    }

    #[test]
    fn test_grid_lines_kinds() {
        let extent = stage_size(20, 2, 32, 32);
        let lines = grid_lines(extent, vec2(32.0, 32.0), &GridLineStyle::map(10));

        let vertical: Vec<_> = lines.iter().filter(|l| l.from.y == 0.0 && l.to.y == extent.y).collect();
        assert_eq!(vertical.len(), 21);
        assert_eq!(vertical[0].kind, GridLineKind::Border);
        assert_eq!(vertical[10].kind, GridLineKind::Reference);
        assert_eq!(vertical[3].kind, GridLineKind::Regular);
        assert_eq!(vertical[20].kind, GridLineKind::Border);

        let horizontal = lines.len() - vertical.len();
        assert_eq!(horizontal, 3);
    }

    #[test]
    fn test_tileset_style_has_no_reference_lines() {
        let style = GridLineStyle::tileset();
        let lines = grid_lines(vec2(400.0, 40.0), vec2(10.0, 10.0), &style);
        assert!(lines.iter().all(|l| l.kind != GridLineKind::Reference));
        assert!(!style.is_dashed(GridLineKind::Border));
        assert!(style.is_dashed(GridLineKind::Regular));
    }

    #[test]
    fn test_visible_cells_clamped() {
        let grid = GridSpec::new(10, 10, vec2(16.0, 16.0));
        let (cols, rows) = visible_cells(
            Rect::from_min_max(pos2(-40.0, 20.0), pos2(50.0, 1000.0)),
            grid,
        );
        assert_eq!(cols, 0..4);
        assert_eq!(rows, 1..10);
    }

    #[test]
    fn test_grid_rect_indices() {
        let rect = GridRect::from_corners((3, 2), (1, 1));
        assert_eq!((rect.width(), rect.height()), (3, 2));
        assert_eq!(rect.indices(4, 3), vec![5, 6, 7, 9, 10, 11]);
        assert!(rect.contains(2, 2));
        assert!(!rect.contains(0, 2));
        // Clipped at the grid edge.
        assert_eq!(GridRect::from_corners((2, 2), (5, 5)).indices(4, 3), vec![10, 11]);
    }
}
