//! Procedural elevation field and its biome bands.
//!
//! Elevation is fractal Perlin noise sampled per tile at `(x + offset) / scale`,
//! then min-max rescaled over the whole map so relative contrast survives.
//! The mountain threshold read from the same field decides what is buildable
//! and passable everywhere else in the crate.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::spatial::{PixelPos, TilePos, WorldGeometry};

const FLAT_EPSILON: f32 = 1e-8;
const MAX_OFFSET: f32 = 10_000.0;

/// Noise shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub scale: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 40.0,
            octaves: 8,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Where in noise space this map is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseOffsets {
    pub x: f32,
    pub y: f32,
    pub seed: i32,
}

impl NoiseOffsets {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0.0..MAX_OFFSET),
            y: rng.gen_range(0.0..MAX_OFFSET),
            seed: rng.gen(),
        }
    }
}

/// Elevation bands, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Lowland,
    Plain,
    Dunes,
    Mountain,
    Peak,
}

impl Biome {
    pub fn classify(value: f32) -> Self {
        if value < 0.35 {
            Biome::Lowland
        } else if value < 0.55 {
            Biome::Plain
        } else if value < 0.7 {
            Biome::Dunes
        } else if value < 0.85 {
            Biome::Mountain
        } else {
            Biome::Peak
        }
    }
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let start = f32::from(a[i]);
        let end = f32::from(b[i]);
        out[i] = (start + (end - start) * t) as u8;
    }
    out
}

/// Piecewise linear color ramp over the five bands.
pub fn biome_color(value: f32) -> [u8; 3] {
    match Biome::classify(value) {
        Biome::Lowland => lerp_color([110, 40, 30], [180, 60, 40], value / 0.35),
        Biome::Plain => lerp_color([200, 90, 50], [230, 130, 70], (value - 0.35) / 0.2),
        Biome::Dunes => lerp_color([210, 160, 120], [235, 190, 150], (value - 0.55) / 0.15),
        Biome::Mountain => lerp_color([70, 60, 55], [130, 120, 115], (value - 0.7) / 0.15),
        Biome::Peak => lerp_color([180, 180, 180], [230, 230, 230], (value - 0.85) / 0.15),
    }
}

/// Row-major grid of normalized elevations in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainField {
    cols: u32,
    rows: u32,
    values: Vec<f32>,
}

impl TerrainField {
    /// Build from raw row-major values; anything outside [0, 1] is clamped.
    pub fn from_values(cols: u32, rows: u32, mut values: Vec<f32>) -> Self {
        values.resize((cols * rows) as usize, 0.0);
        for value in &mut values {
            *value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        }
        Self { cols, rows, values }
    }

    pub fn flat(cols: u32, rows: u32, value: f32) -> Self {
        Self::from_values(cols, rows, vec![value; (cols * rows) as usize])
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 || tile.x as u32 >= self.cols || tile.y as u32 >= self.rows {
            return None;
        }
        Some(tile.y as usize * self.cols as usize + tile.x as usize)
    }

    pub fn elevation(&self, tile: TilePos) -> Option<f32> {
        self.index(tile).map(|i| self.values[i])
    }

    pub fn elevation_at_pixel(&self, pixel: PixelPos, geometry: &WorldGeometry) -> Option<f32> {
        self.elevation(geometry.tile_at(pixel))
    }

    /// At or above the threshold is impassable and unbuildable. Off-map counts as blocked.
    pub fn is_mountain(&self, tile: TilePos, threshold: f32) -> bool {
        self.elevation(tile).map_or(true, |value| value >= threshold)
    }

    /// Mountain tile at least as high as all of its in-bounds 8 neighbours.
    pub fn is_peak(&self, tile: TilePos, threshold: f32) -> bool {
        let Some(value) = self.elevation(tile) else {
            return false;
        };
        if value < threshold {
            return false;
        }
        (-1..=1).all(|dy| {
            (-1..=1).all(|dx| {
                self.elevation(TilePos::new(tile.x + dx, tile.y + dy))
                    .map_or(true, |other| value >= other)
            })
        })
    }

    pub fn biome(&self, tile: TilePos) -> Option<Biome> {
        self.elevation(tile).map(Biome::classify)
    }

    /// Press a crater into the field: elevation is multiplied by `floor` at the center,
    /// fading linearly back to 1.0 at the rim. Returns how many tiles changed.
    pub fn scar_crater(&mut self, center: TilePos, radius: u32, floor: f32) -> usize {
        let r = radius as i32;
        let floor = floor.clamp(0.0, 1.0);
        let mut touched = 0;
        for dy in -r..=r {
            for dx in -r..=r {
                let dist = f64::from(dx).hypot(f64::from(dy)) as f32;
                if dist > radius as f32 {
                    continue;
                }
                let Some(i) = self.index(TilePos::new(center.x + dx, center.y + dy)) else {
                    continue;
                };
                let falloff = if radius == 0 { 0.0 } else { dist / radius as f32 };
                let factor = floor + (1.0 - floor) * falloff;
                self.values[i] = (self.values[i] * factor).clamp(0.0, 1.0);
                touched += 1;
            }
        }
        touched
    }
}

/// Sample and normalize a `rows` × `cols` field.
pub fn generate(rows: u32, cols: u32, params: &TerrainParams, offsets: NoiseOffsets) -> TerrainField {
    let mut noise = FastNoiseLite::with_seed(offsets.seed);
    noise.set_noise_type(Some(NoiseType::Perlin));
    noise.set_frequency(Some(1.0 / params.scale.max(f32::EPSILON)));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(params.octaves.max(1)));
    noise.set_fractal_gain(Some(params.persistence));
    noise.set_fractal_lacunarity(Some(params.lacunarity));

    let mut values = Vec::with_capacity((rows * cols) as usize);
    for y in 0..rows {
        for x in 0..cols {
            values.push(noise.get_noise_2d(x as f32 + offsets.x, y as f32 + offsets.y));
        }
    }
    normalize(&mut values);
    TerrainField::from_values(cols, rows, values)
}

/// Generate with fresh random offsets.
pub fn generate_random<R: Rng + ?Sized>(
    rows: u32,
    cols: u32,
    params: &TerrainParams,
    rng: &mut R,
) -> TerrainField {
    let offsets = NoiseOffsets::random(rng);
    tracing::debug!(x = offsets.x, y = offsets.y, seed = offsets.seed, "terrain offsets drawn");
    generate(rows, cols, params, offsets)
}

/// Min-max rescale to [0, 1]; an all-flat map becomes all zeros.
fn normalize(values: &mut [f32]) {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range < FLAT_EPSILON {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    for value in values.iter_mut() {
        *value = ((*value - min) / range).clamp(0.0, 1.0);
    }
}
