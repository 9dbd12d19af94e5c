//! Resource deposits scattered over the terrain.
//!
//! Each deposit is a contiguous patch grown by a randomized breadth-first walk
//! from a rejection-sampled seed tile. Growth only admits tiles passing the
//! same terrain predicate as the seed, so a patch never crosses into a
//! different band. Deposits do not re-validate when the terrain later changes.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::spatial::{Footprint, TilePos, WorldGeometry};
use crate::terrain::TerrainField;

pub const SEED_ATTEMPTS: usize = 1000;
pub const RESERVE_PER_TILE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Iron,
    Ice,
    Marsium,
    Rock,
}

impl ResourceKind {
    pub fn color(self) -> [u8; 3] {
        match self {
            ResourceKind::Iron => [0, 0, 0],
            ResourceKind::Ice => [150, 200, 255],
            ResourceKind::Marsium => [160, 32, 240],
            ResourceKind::Rock => [90, 80, 75],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Iron => "iron",
            ResourceKind::Ice => "ice",
            ResourceKind::Marsium => "marsium",
            ResourceKind::Rock => "rock",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepositId(u32);

impl DepositId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeposit {
    pub id: DepositId,
    pub kind: ResourceKind,
    pub positions: Vec<TilePos>,
    pub color: [u8; 3],
    pub reserve: u32,
}

impl ResourceDeposit {
    pub fn contains(&self, tile: TilePos) -> bool {
        self.positions.contains(&tile)
    }
}

/// Which tiles a patch may seed on and grow into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchRule {
    /// Below the mountain threshold.
    Flat,
    /// Flat, seeded next to a mountain tile that is not a peak.
    MountainFoot,
    /// Mountain tile whose whole 3×3 neighbourhood is mountain.
    MountainTop,
}

impl PatchRule {
    fn admits(self, terrain: &TerrainField, tile: TilePos, threshold: f32) -> bool {
        match self {
            PatchRule::Flat | PatchRule::MountainFoot => !terrain.is_mountain(tile, threshold),
            PatchRule::MountainTop => {
                terrain.is_mountain(tile, threshold)
                    && (-1..=1).all(|dy| {
                        (-1..=1).all(|dx| {
                            let n = TilePos::new(tile.x + dx, tile.y + dy);
                            terrain.elevation(n).map_or(true, |v| v >= threshold)
                        })
                    })
            }
        }
    }

    fn accepts_seed(self, terrain: &TerrainField, tile: TilePos, threshold: f32) -> bool {
        if !self.admits(terrain, tile, threshold) {
            return false;
        }
        match self {
            PatchRule::MountainFoot => [(-1, 0), (1, 0), (0, -1), (0, 1)].into_iter().any(|(dx, dy)| {
                let n = TilePos::new(tile.x + dx, tile.y + dy);
                terrain.elevation(n).is_some()
                    && terrain.is_mountain(n, threshold)
                    && !terrain.is_peak(n, threshold)
            }),
            PatchRule::Flat | PatchRule::MountainTop => true,
        }
    }
}

/// One line of the spawn table.
#[derive(Debug, Clone)]
pub struct PatchPlan {
    pub kind: ResourceKind,
    pub rule: PatchRule,
    pub count: RangeInclusive<u32>,
    pub size: RangeInclusive<usize>,
}

pub fn default_plan() -> Vec<PatchPlan> {
    vec![
        PatchPlan {
            kind: ResourceKind::Iron,
            rule: PatchRule::Flat,
            count: 4..=8,
            size: 4..=12,
        },
        PatchPlan {
            kind: ResourceKind::Ice,
            rule: PatchRule::MountainFoot,
            count: 3..=6,
            size: 6..=16,
        },
        PatchPlan {
            kind: ResourceKind::Marsium,
            rule: PatchRule::Flat,
            count: 1..=3,
            size: 1..=2,
        },
        PatchPlan {
            kind: ResourceKind::Marsium,
            rule: PatchRule::MountainTop,
            count: 2..=3,
            size: 3..=7,
        },
    ]
}

/// Randomized BFS from `start`, admitting at most `max_size` tiles that pass `rule`.
pub fn grow_patch<R: Rng + ?Sized>(
    terrain: &TerrainField,
    start: TilePos,
    max_size: usize,
    rule: PatchRule,
    threshold: f32,
    rng: &mut R,
) -> Vec<TilePos> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start]);
    let mut patch = Vec::new();

    while let Some(tile) = queue.pop_front() {
        if patch.len() >= max_size {
            break;
        }
        if !visited.insert(tile) {
            continue;
        }
        if !rule.admits(terrain, tile, threshold) {
            continue;
        }
        patch.push(tile);

        let mut neighbors = [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .map(|(dx, dy)| TilePos::new(tile.x + dx, tile.y + dy));
        neighbors.shuffle(rng);
        for n in neighbors {
            if terrain.elevation(n).is_some() && !visited.contains(&n) {
                queue.push_back(n);
            }
        }
    }
    patch
}

/// Rejection-sample a seed for `rule`, giving up after [`SEED_ATTEMPTS`].
pub fn find_seed<R: Rng + ?Sized>(
    terrain: &TerrainField,
    rule: PatchRule,
    threshold: f32,
    rng: &mut R,
) -> Option<TilePos> {
    let (cols, rows) = (terrain.cols() as i32, terrain.rows() as i32);
    if cols == 0 || rows == 0 {
        return None;
    }
    for _ in 0..SEED_ATTEMPTS {
        let tile = match rule {
            PatchRule::MountainTop if cols > 2 && rows > 2 => {
                TilePos::new(rng.gen_range(1..cols - 1), rng.gen_range(1..rows - 1))
            }
            _ => TilePos::new(rng.gen_range(0..cols), rng.gen_range(0..rows)),
        };
        if rule.accepts_seed(terrain, tile, threshold) {
            return Some(tile);
        }
    }
    None
}

/// Owns every live deposit and hands out ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositLedger {
    deposits: Vec<ResourceDeposit>,
    next_id: u32,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ResourceKind, positions: Vec<TilePos>) -> Option<DepositId> {
        if positions.is_empty() {
            return None;
        }
        let id = DepositId(self.next_id);
        self.next_id += 1;
        let reserve = positions.len() as u32 * RESERVE_PER_TILE;
        self.deposits.push(ResourceDeposit {
            id,
            kind,
            positions,
            color: kind.color(),
            reserve,
        });
        Some(id)
    }

    /// Scatter deposits over `terrain` following `plan`. A line whose seed search
    /// is exhausted is skipped silently.
    pub fn spawn<R: Rng + ?Sized>(
        terrain: &TerrainField,
        plan: &[PatchPlan],
        threshold: f32,
        rng: &mut R,
    ) -> Self {
        let mut ledger = Self::new();
        for line in plan {
            let count = rng.gen_range(line.count.clone());
            for _ in 0..count {
                ledger.spawn_patch(terrain, line, threshold, rng);
            }
        }
        tracing::debug!(deposits = ledger.len(), "resource deposits spawned");
        ledger
    }

    /// Seed and grow one patch for `line`; `None` when no seed was found.
    pub fn spawn_patch<R: Rng + ?Sized>(
        &mut self,
        terrain: &TerrainField,
        line: &PatchPlan,
        threshold: f32,
        rng: &mut R,
    ) -> Option<DepositId> {
        let Some(seed) = find_seed(terrain, line.rule, threshold, rng) else {
            tracing::debug!(kind = %line.kind, "no seed tile found, skipping deposit");
            return None;
        };
        let size = rng.gen_range(line.size.clone());
        let patch = grow_patch(terrain, seed, size, line.rule, threshold, rng);
        self.insert(line.kind, patch)
    }

    /// Drop every position inside `zone`'s interior or outline; emptied deposits vanish.
    pub fn exclude(&mut self, zone: &dyn Footprint) {
        for deposit in &mut self.deposits {
            deposit
                .positions
                .retain(|tile| !zone.occupies(*tile) && !zone.outline_contains(*tile));
            deposit.reserve = deposit
                .reserve
                .min(deposit.positions.len() as u32 * RESERVE_PER_TILE);
        }
        self.deposits.retain(|d| !d.positions.is_empty());
    }

    /// Trim one deposit against every zone's interior and outline. Returns the
    /// id if any tile survived; an emptied deposit is removed.
    pub fn trim(&mut self, id: DepositId, zones: &[&dyn Footprint]) -> Option<DepositId> {
        let deposit = self.deposits.iter_mut().find(|d| d.id == id)?;
        deposit
            .positions
            .retain(|tile| zones.iter().all(|z| !z.occupies(*tile) && !z.outline_contains(*tile)));
        deposit.reserve = deposit
            .reserve
            .min(deposit.positions.len() as u32 * RESERVE_PER_TILE);
        if deposit.positions.is_empty() {
            self.remove(id);
            return None;
        }
        Some(id)
    }

    pub fn remove(&mut self, id: DepositId) -> Option<ResourceDeposit> {
        let index = self.deposits.iter().position(|d| d.id == id)?;
        Some(self.deposits.remove(index))
    }

    /// Take up to `amount` units from a deposit's reserve, removing it when exhausted.
    pub fn extract(&mut self, id: DepositId, amount: u32) -> u32 {
        let Some(deposit) = self.deposits.iter_mut().find(|d| d.id == id) else {
            return 0;
        };
        let taken = amount.min(deposit.reserve);
        deposit.reserve -= taken;
        if deposit.reserve == 0 {
            tracing::info!(deposit = id.raw(), kind = %deposit.kind, "deposit depleted");
            self.remove(id);
        }
        taken
    }

    pub fn get(&self, id: DepositId) -> Option<&ResourceDeposit> {
        self.deposits.iter().find(|d| d.id == id)
    }

    /// First deposit with a tile among `tiles`.
    pub fn find_under(&self, tiles: &[TilePos]) -> Option<&ResourceDeposit> {
        self.deposits
            .iter()
            .find(|d| tiles.iter().any(|t| d.contains(*t)))
    }

    pub fn occupied_tiles(&self) -> HashSet<TilePos> {
        self.deposits
            .iter()
            .flat_map(|d| d.positions.iter().copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDeposit> {
        self.deposits.iter()
    }

    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }
}

/// Fraction of the in-bounds grid covered by deposits, handy for summaries.
pub fn coverage(ledger: &DepositLedger, geometry: &WorldGeometry) -> f64 {
    if geometry.tile_count() == 0 {
        return 0.0;
    }
    ledger.occupied_tiles().len() as f64 / f64::from(geometry.tile_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::DiscFootprint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn split_terrain() -> TerrainField {
        // left half plains, right half a slope rising eastward
        let mut values = Vec::new();
        for _y in 0..20 {
            for x in 0..20 {
                values.push(if x < 10 { 0.3 } else { 0.7 + 0.01 * (x - 9) as f32 });
            }
        }
        TerrainField::from_values(20, 20, values)
    }

    #[test]
    fn patches_never_cross_their_band() {
        let terrain = split_terrain();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let ledger = DepositLedger::spawn(&terrain, &default_plan(), 0.7, &mut rng);
        assert!(!ledger.is_empty());
        for deposit in ledger.iter() {
            for tile in &deposit.positions {
                let value = terrain.elevation(*tile).unwrap();
                match deposit.kind {
                    ResourceKind::Iron | ResourceKind::Ice => assert!(value < 0.7),
                    ResourceKind::Marsium | ResourceKind::Rock => {}
                }
            }
        }
    }

    #[test]
    fn patch_is_bounded_and_contiguous() {
        let terrain = TerrainField::flat(15, 15, 0.2);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let patch = grow_patch(&terrain, TilePos::new(7, 7), 9, PatchRule::Flat, 0.7, &mut rng);
        assert_eq!(patch.len(), 9);
        assert_eq!(patch[0], TilePos::new(7, 7));
        for tile in &patch[1..] {
            assert!(patch.iter().any(|other| other.manhattan(*tile) == 1));
        }
    }

    #[test]
    fn exhausted_seed_search_skips_the_deposit() {
        let terrain = TerrainField::flat(10, 10, 0.9);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let plan = vec![PatchPlan {
            kind: ResourceKind::Iron,
            rule: PatchRule::Flat,
            count: 3..=3,
            size: 2..=2,
        }];
        let ledger = DepositLedger::spawn(&terrain, &plan, 0.7, &mut rng);
        assert!(ledger.is_empty());
    }

    #[test]
    fn ice_seeds_at_the_foot_of_mountains() {
        let terrain = split_terrain();
        assert!(PatchRule::MountainFoot.accepts_seed(&terrain, TilePos::new(9, 5), 0.7));
        assert!(!PatchRule::MountainFoot.accepts_seed(&terrain, TilePos::new(3, 5), 0.7));
    }

    #[test]
    fn exclusion_filters_positions_and_drops_empty_deposits() {
        let mut ledger = DepositLedger::new();
        ledger.insert(ResourceKind::Iron, vec![TilePos::new(5, 5), TilePos::new(9, 9)]);
        ledger.insert(ResourceKind::Ice, vec![TilePos::new(5, 6)]);
        ledger.exclude(&DiscFootprint::new(TilePos::new(5, 5), 2));
        assert_eq!(ledger.len(), 1);
        let left = ledger.iter().next().unwrap();
        assert_eq!(left.positions, vec![TilePos::new(9, 9)]);
        assert_eq!(left.reserve, RESERVE_PER_TILE);
    }

    #[test]
    fn trim_only_touches_the_named_deposit() {
        let mut ledger = DepositLedger::new();
        let kept = ledger.insert(ResourceKind::Iron, vec![TilePos::new(5, 5)]).unwrap();
        let rock = ledger
            .insert(ResourceKind::Rock, vec![TilePos::new(5, 6), TilePos::new(12, 12)])
            .unwrap();
        let zone = DiscFootprint::new(TilePos::new(5, 5), 2);
        assert_eq!(ledger.trim(rock, &[&zone]), Some(rock));
        assert_eq!(ledger.get(rock).map(|d| d.positions.clone()), Some(vec![TilePos::new(12, 12)]));
        assert_eq!(ledger.get(rock).map(|d| d.reserve), Some(RESERVE_PER_TILE));
        assert!(ledger.get(kept).is_some());

        let lone = ledger.insert(ResourceKind::Rock, vec![TilePos::new(4, 4)]).unwrap();
        assert_eq!(ledger.trim(lone, &[&zone]), None);
        assert!(ledger.get(lone).is_none());
    }

    #[test]
    fn extraction_depletes_and_removes() {
        let mut ledger = DepositLedger::new();
        let id = ledger.insert(ResourceKind::Iron, vec![TilePos::new(1, 1)]).unwrap();
        assert_eq!(ledger.extract(id, 2), 2);
        assert_eq!(ledger.extract(id, 5), 1);
        assert!(ledger.get(id).is_none());
        assert_eq!(ledger.extract(id, 1), 0);
    }
}
