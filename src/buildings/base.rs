use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::spatial::{DiscFootprint, Footprint, PixelPos, TilePos, WorldGeometry};
use crate::terrain::TerrainField;

/// The colony's landing site: a disc of tiles around `center`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub center: TilePos,
    pub radius: u32,
    pub color: [u8; 3],
}

impl Base {
    pub fn new(center: TilePos, radius: u32) -> Self {
        Self {
            center,
            radius,
            color: [200, 200, 200],
        }
    }

    pub fn disc(&self) -> DiscFootprint {
        DiscFootprint::new(self.center, self.radius)
    }

    pub fn center_px(&self, geometry: &WorldGeometry) -> PixelPos {
        geometry.tile_origin(self.center)
    }

    pub fn contains_px(&self, pixel: PixelPos, geometry: &WorldGeometry) -> bool {
        self.occupies(geometry.tile_at(pixel))
    }

    /// Rejection-sample a center whose whole square neighbourhood is below the
    /// mountain threshold, staying clear of the reserved top-left corner
    /// (`reserved` is in tiles). `None` once `max_attempts` are spent.
    pub fn spawn<R: Rng + ?Sized>(
        terrain: &TerrainField,
        radius: u32,
        reserved: (u32, u32),
        threshold: f32,
        max_attempts: u32,
        rng: &mut R,
    ) -> Option<Self> {
        let r = radius as i32;
        let (cols, rows) = (terrain.cols() as i32, terrain.rows() as i32);
        if cols <= 2 * r || rows <= 2 * r {
            return None;
        }
        for _ in 0..max_attempts {
            let x = rng.gen_range(r..cols - r);
            let y = rng.gen_range(r..rows - r);
            if x < reserved.0 as i32 && y < reserved.1 as i32 {
                continue;
            }
            let safe = (-r..=r).all(|dy| {
                (-r..=r).all(|dx| !terrain.is_mountain(TilePos::new(x + dx, y + dy), threshold))
            });
            if safe {
                return Some(Self::new(TilePos::new(x, y), radius));
            }
        }
        None
    }
}

impl Footprint for Base {
    fn interior(&self) -> Vec<TilePos> {
        self.disc().interior()
    }

    fn outline(&self) -> Vec<TilePos> {
        self.disc().outline()
    }

    fn occupies(&self, tile: TilePos) -> bool {
        self.disc().occupies(tile)
    }

    fn outline_contains(&self, tile: TilePos) -> bool {
        self.disc().outline_contains(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn spawn_avoids_mountains_and_the_reserved_corner() {
        // mountains everywhere except a clear pocket around (14, 14)
        let mut values = vec![0.9; 20 * 20];
        for y in 11..=17 {
            for x in 11..=17 {
                values[y * 20 + x] = 0.2;
            }
        }
        let terrain = TerrainField::from_values(20, 20, values);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let base = Base::spawn(&terrain, 3, (5, 5), 0.7, 50_000, &mut rng).expect("pocket is reachable");
        assert_eq!(base.center, TilePos::new(14, 14));
    }

    #[test]
    fn spawn_gives_up_on_impassable_maps() {
        let terrain = TerrainField::flat(20, 20, 0.95);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(Base::spawn(&terrain, 3, (0, 0), 0.7, 200, &mut rng).is_none());
    }

    #[test]
    fn reserved_corner_is_never_chosen() {
        let terrain = TerrainField::flat(12, 12, 0.1);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..50 {
            let base = Base::spawn(&terrain, 1, (8, 8), 0.7, 1_000, &mut rng).unwrap();
            assert!(!(base.center.x < 8 && base.center.y < 8));
        }
    }
}
