//! Spatial model - tile grid, pixel space and structure footprints

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Tile position in the grid. Signed so that outline rings may extend past the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (8-neighbourhood) distance
    pub fn chebyshev(self, other: TilePos) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// Manhattan distance
    pub fn manhattan(self, other: TilePos) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

/// Continuous position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: PixelPos) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// World dimensions: tiles and the pixel size of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldGeometry {
    cols: u32,
    rows: u32,
    tile_size: u32,
}

impl WorldGeometry {
    pub fn new(cols: u32, rows: u32, tile_size: u32) -> Self {
        Self {
            cols,
            rows,
            tile_size: tile_size.max(1),
        }
    }

    /// Derive the grid from the world size in pixels.
    pub fn from_pixels(width_px: u32, height_px: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        Self::new(width_px / tile_size, height_px / tile_size, tile_size)
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }

    pub fn width_px(&self) -> f64 {
        f64::from(self.cols * self.tile_size)
    }

    pub fn height_px(&self) -> f64 {
        f64::from(self.rows * self.tile_size)
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.cols && (pos.y as u32) < self.rows
    }

    /// Row-major index of an in-bounds tile
    pub fn index(&self, pos: TilePos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.cols as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Integer division by the tile size, which is how pointer events map onto the grid.
    pub fn tile_at(&self, pixel: PixelPos) -> TilePos {
        let size = f64::from(self.tile_size);
        TilePos::new((pixel.x / size).floor() as i32, (pixel.y / size).floor() as i32)
    }

    pub fn tile_center(&self, tile: TilePos) -> PixelPos {
        let size = f64::from(self.tile_size);
        PixelPos::new(
            (f64::from(tile.x) + 0.5) * size,
            (f64::from(tile.y) + 0.5) * size,
        )
    }

    /// Tile origin (top-left corner) in pixels
    pub fn tile_origin(&self, tile: TilePos) -> PixelPos {
        let size = f64::from(self.tile_size);
        PixelPos::new(f64::from(tile.x) * size, f64::from(tile.y) * size)
    }

    /// In-bounds neighbors (4-connectivity)
    pub fn neighbors4(&self, pos: TilePos) -> Vec<TilePos> {
        [(0, -1), (0, 1), (-1, 0), (1, 0)]
            .into_iter()
            .map(|(dx, dy)| TilePos::new(pos.x + dx, pos.y + dy))
            .filter(|p| self.in_bounds(*p))
            .collect()
    }

    /// In-bounds neighbors (8-connectivity), excluding the tile itself
    pub fn neighbors8(&self, pos: TilePos) -> Vec<TilePos> {
        let mut out = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let p = TilePos::new(pos.x + dx, pos.y + dy);
                if self.in_bounds(p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Every tile whose pixel square overlaps the axis-aligned box centered on `center`.
    pub fn tiles_under(&self, center: PixelPos, half_extent: f64) -> Vec<TilePos> {
        let size = f64::from(self.tile_size);
        let min_x = ((center.x - half_extent) / size).floor() as i32;
        let max_x = ((center.x + half_extent) / size).ceil() as i32 - 1;
        let min_y = ((center.y - half_extent) / size).floor() as i32;
        let max_y = ((center.y + half_extent) / size).ceil() as i32 - 1;
        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = TilePos::new(x, y);
                if self.in_bounds(p) {
                    tiles.push(p);
                }
            }
        }
        tiles
    }
}

/// Shared geometry of anything that occupies tiles: the interior and its 1-tile outline ring.
pub trait Footprint {
    fn interior(&self) -> Vec<TilePos>;
    fn outline(&self) -> Vec<TilePos>;
    fn occupies(&self, tile: TilePos) -> bool;
    fn outline_contains(&self, tile: TilePos) -> bool;

    /// Interior plus outline, the tiles nothing else may claim.
    fn reserved(&self) -> Vec<TilePos> {
        let mut tiles = self.interior();
        tiles.extend(self.outline());
        tiles
    }

    /// True when some pair of distinct outline tiles lies within Chebyshev distance 1.
    fn outline_touches(&self, other: &dyn Footprint) -> bool {
        let theirs: HashSet<TilePos> = other.outline().into_iter().collect();
        self.outline().into_iter().any(|tile| {
            (-1..=1).any(|dy| {
                (-1..=1).any(|dx| {
                    if dx == 0 && dy == 0 {
                        return false;
                    }
                    theirs.contains(&TilePos::new(tile.x + dx, tile.y + dy))
                })
            })
        })
    }
}

/// Axis-aligned rectangle of `w` × `h` tiles with top-left corner at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectFootprint {
    pub origin: TilePos,
    pub w: u32,
    pub h: u32,
}

impl RectFootprint {
    pub fn new(origin: TilePos, w: u32, h: u32) -> Self {
        Self { origin, w, h }
    }

    pub fn rotated(self) -> Self {
        Self::new(self.origin, self.h, self.w)
    }

    fn right(&self) -> i32 {
        self.origin.x + self.w as i32
    }

    fn bottom(&self) -> i32 {
        self.origin.y + self.h as i32
    }

    /// Whether the whole interior lies within the grid.
    pub fn fits(&self, geometry: &WorldGeometry) -> bool {
        self.w > 0
            && self.h > 0
            && self.origin.x >= 0
            && self.origin.y >= 0
            && self.right() <= geometry.cols() as i32
            && self.bottom() <= geometry.rows() as i32
    }

    pub fn center_px(&self, geometry: &WorldGeometry) -> PixelPos {
        let size = f64::from(geometry.tile_size());
        PixelPos::new(
            (f64::from(self.origin.x) + f64::from(self.w) / 2.0) * size,
            (f64::from(self.origin.y) + f64::from(self.h) / 2.0) * size,
        )
    }

    pub fn contains_px(&self, pixel: PixelPos, geometry: &WorldGeometry) -> bool {
        self.occupies(geometry.tile_at(pixel))
    }
}

impl Footprint for RectFootprint {
    fn interior(&self) -> Vec<TilePos> {
        let mut tiles = Vec::with_capacity((self.w * self.h) as usize);
        for y in self.origin.y..self.bottom() {
            for x in self.origin.x..self.right() {
                tiles.push(TilePos::new(x, y));
            }
        }
        tiles
    }

    fn outline(&self) -> Vec<TilePos> {
        let mut tiles = Vec::with_capacity((2 * (self.w + self.h) + 4) as usize);
        for y in self.origin.y - 1..=self.bottom() {
            for x in self.origin.x - 1..=self.right() {
                let tile = TilePos::new(x, y);
                if self.outline_contains(tile) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    fn occupies(&self, tile: TilePos) -> bool {
        tile.x >= self.origin.x && tile.x < self.right() && tile.y >= self.origin.y && tile.y < self.bottom()
    }

    fn outline_contains(&self, tile: TilePos) -> bool {
        let in_ring_box = tile.x >= self.origin.x - 1
            && tile.x <= self.right()
            && tile.y >= self.origin.y - 1
            && tile.y <= self.bottom();
        in_ring_box && !self.occupies(tile)
    }
}

/// Disc of tiles within `radius` of `center` (squared euclidean test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscFootprint {
    pub center: TilePos,
    pub radius: u32,
}

impl DiscFootprint {
    pub fn new(center: TilePos, radius: u32) -> Self {
        Self { center, radius }
    }

    fn dist_sq(&self, tile: TilePos) -> i64 {
        let dx = i64::from(tile.x - self.center.x);
        let dy = i64::from(tile.y - self.center.y);
        dx * dx + dy * dy
    }

    fn within(&self, tile: TilePos, radius: u32) -> bool {
        self.dist_sq(tile) <= i64::from(radius) * i64::from(radius)
    }

    fn scan(&self, radius: u32, keep: impl Fn(TilePos) -> bool) -> Vec<TilePos> {
        let r = radius as i32;
        let mut tiles = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let tile = TilePos::new(self.center.x + dx, self.center.y + dy);
                if keep(tile) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }
}

impl Footprint for DiscFootprint {
    fn interior(&self) -> Vec<TilePos> {
        self.scan(self.radius, |tile| self.occupies(tile))
    }

    fn outline(&self) -> Vec<TilePos> {
        self.scan(self.radius + 1, |tile| self.outline_contains(tile))
    }

    fn occupies(&self, tile: TilePos) -> bool {
        self.within(tile, self.radius)
    }

    fn outline_contains(&self, tile: TilePos) -> bool {
        self.within(tile, self.radius + 1) && !self.occupies(tile)
    }
}
