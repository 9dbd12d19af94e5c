//! Rovers and drones.
//!
//! Movement and battery work on the per-tick delta channel; the mining
//! countdown works on the wall channel. The two never mix: a flat battery
//! stops a unit from moving but does not stop it from mining.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deposits::{DepositId, DepositLedger, ResourceKind};
use crate::spatial::{PixelPos, TilePos, WorldGeometry};
use crate::terrain::TerrainField;

pub const MAX_BATTERY: f64 = 100.0;
const ARRIVAL_EPSILON: f64 = 1.0;

/// Tunables shared by every unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitRules {
    pub moves_per_round: u32,
    pub rover_speed: f64,
    pub drone_speed: f64,
    pub battery_drain_seconds: f64,
    pub recharge_per_second: f64,
    pub mine_interval_seconds: f64,
    pub cargo_capacity: u32,
    pub transfer_range_px: f64,
}

impl UnitRules {
    /// Battery percent lost per second of actual movement.
    pub fn drain_per_second(&self) -> f64 {
        if self.battery_drain_seconds <= 0.0 {
            return f64::INFINITY;
        }
        MAX_BATTERY / self.battery_drain_seconds
    }
}

impl Default for UnitRules {
    fn default() -> Self {
        Self {
            moves_per_round: 2,
            rover_speed: 90.0,
            drone_speed: 100.0,
            battery_drain_seconds: 120.0,
            recharge_per_second: 5.0,
            mine_interval_seconds: 10.0,
            cargo_capacity: 5,
            transfer_range_px: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Rover,
    Drone,
}

impl UnitKind {
    pub fn label(self) -> &'static str {
        match self {
            UnitKind::Rover => "Rover",
            UnitKind::Drone => "Drone",
        }
    }

    /// Purchase price at a vehicle bay.
    pub fn cost_metals(self) -> u32 {
        match self {
            UnitKind::Rover => 5,
            UnitKind::Drone => 10,
        }
    }

    /// Half the side of the square the unit covers, in pixels.
    pub fn half_extent(self) -> f64 {
        match self {
            UnitKind::Rover => 5.0,
            UnitKind::Drone => 10.0,
        }
    }

    /// Drones fly over mountains; rovers are stopped by them.
    pub fn blocked_by_terrain(self) -> bool {
        matches!(self, UnitKind::Rover)
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            UnitKind::Rover => [0, 255, 0],
            UnitKind::Drone => [255, 255, 0],
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitState {
    Idle,
    MovingToTarget,
    Mining,
    AwaitingMoveConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Typed storage with a hard capacity; overflow is dropped, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    capacity: u32,
    held: BTreeMap<ResourceKind, u32>,
}

impl Cargo {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            held: BTreeMap::new(),
        }
    }

    pub fn total(&self) -> u32 {
        self.held.values().sum()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn count(&self, kind: ResourceKind) -> u32 {
        self.held.get(&kind).copied().unwrap_or(0)
    }

    /// Store up to `amount`, returning how much fit.
    pub fn add(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let accepted = amount.min(self.free());
        if accepted > 0 {
            *self.held.entry(kind).or_insert(0) += accepted;
        }
        accepted
    }

    pub fn drain(&mut self) -> BTreeMap<ResourceKind, u32> {
        std::mem::take(&mut self.held)
    }

    pub fn contents(&self) -> &BTreeMap<ResourceKind, u32> {
        &self.held
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningState {
    pub deposit: DepositId,
    pub kind: ResourceKind,
    pub started_at: f64,
}

/// What happened to a unit's mining this update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningUpdate {
    Idle,
    Working,
    Mined { kind: ResourceKind, amount: u32 },
    StoppedFull,
    StoppedNoDeposit,
}

/// Result of one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Stationary,
    Moved,
    Arrived,
    Blocked,
    OutOfPower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub position: PixelPos,
    pub target: Option<PixelPos>,
    pub speed: f64,
    pub battery: f64,
    pub cargo: Cargo,
    pub mining: Option<MiningState>,
    pub awaiting_move_confirmation: bool,
    pub moves_remaining: u32,
    pub transfer_partner: Option<UnitId>,
}

impl Unit {
    pub fn new(id: UnitId, kind: UnitKind, position: PixelPos, rules: &UnitRules) -> Self {
        let speed = match kind {
            UnitKind::Rover => rules.rover_speed,
            UnitKind::Drone => rules.drone_speed,
        };
        Self {
            id,
            kind,
            position,
            target: None,
            speed,
            battery: MAX_BATTERY,
            cargo: Cargo::new(rules.cargo_capacity),
            mining: None,
            awaiting_move_confirmation: false,
            moves_remaining: rules.moves_per_round,
            transfer_partner: None,
        }
    }

    pub fn state(&self) -> UnitState {
        if self.awaiting_move_confirmation {
            UnitState::AwaitingMoveConfirmation
        } else if self.mining.is_some() {
            UnitState::Mining
        } else if self.target.is_some() {
            UnitState::MovingToTarget
        } else {
            UnitState::Idle
        }
    }

    pub fn is_mining(&self) -> bool {
        self.mining.is_some()
    }

    pub fn is_transferring(&self) -> bool {
        self.transfer_partner.is_some()
    }

    /// Record a destination. Ignored while a power transfer is running.
    pub fn set_target(&mut self, target: PixelPos) -> bool {
        if self.is_transferring() {
            return false;
        }
        self.target = Some(target);
        true
    }

    pub fn is_hit(&self, pixel: PixelPos) -> bool {
        match self.kind {
            UnitKind::Rover => {
                let half = self.kind.half_extent();
                (pixel.x - self.position.x).abs() <= half && (pixel.y - self.position.y).abs() <= half
            }
            UnitKind::Drone => self.position.distance(pixel) <= self.kind.half_extent(),
        }
    }

    /// Tiles under the unit's square footprint.
    pub fn tiles_under(&self, geometry: &WorldGeometry) -> Vec<TilePos> {
        geometry.tiles_under(self.position, self.kind.half_extent())
    }

    /// Advance toward the target by `speed * dt`, paying battery per second actually moved.
    pub fn step(
        &mut self,
        dt: f64,
        rules: &UnitRules,
        geometry: &WorldGeometry,
        terrain: &TerrainField,
        threshold: f32,
    ) -> StepOutcome {
        let Some(target) = self.target else {
            return StepOutcome::Stationary;
        };
        if self.battery <= 0.0 {
            self.battery = 0.0;
            return StepOutcome::OutOfPower;
        }

        let distance = self.position.distance(target);
        if distance < ARRIVAL_EPSILON {
            self.target = None;
            return StepOutcome::Arrived;
        }

        let drain = rules.drain_per_second();
        let powered_seconds = if drain.is_finite() { self.battery / drain } else { 0.0 };
        let travel = (self.speed * dt.max(0.0)).min(self.speed * powered_seconds);
        let arriving = distance <= travel;
        let next = if arriving {
            target
        } else {
            PixelPos::new(
                self.position.x + (target.x - self.position.x) / distance * travel,
                self.position.y + (target.y - self.position.y) / distance * travel,
            )
        };

        let tile = geometry.tile_at(next);
        if !geometry.in_bounds(tile) || (self.kind.blocked_by_terrain() && terrain.is_mountain(tile, threshold)) {
            return StepOutcome::Blocked;
        }

        let moved = self.position.distance(next);
        self.position = next;
        if self.speed > 0.0 {
            self.battery = (self.battery - drain * moved / self.speed).max(0.0);
        }
        if arriving {
            self.target = None;
            StepOutcome::Arrived
        } else if self.battery <= 0.0 {
            StepOutcome::OutOfPower
        } else {
            StepOutcome::Moved
        }
    }

    pub fn recharge(&mut self, dt: f64, rate: f64) -> f64 {
        let before = self.battery;
        self.battery = (self.battery + rate * dt.max(0.0)).min(MAX_BATTERY);
        self.battery - before
    }

    pub fn start_mining(&mut self, deposit: DepositId, kind: ResourceKind, now: f64) {
        self.mining = Some(MiningState {
            deposit,
            kind,
            started_at: now,
        });
    }

    pub fn stop_mining(&mut self) {
        self.mining = None;
        self.awaiting_move_confirmation = false;
    }

    /// Credit every whole mining interval elapsed by `now`, bounded by cargo space
    /// and the deposit's reserve. Yield comes from whichever deposit is under the
    /// unit at the time. Mining stops when storage fills or no deposit is left
    /// underneath.
    pub fn update_mining(
        &mut self,
        now: f64,
        interval: f64,
        geometry: &WorldGeometry,
        deposits: &mut DepositLedger,
    ) -> MiningUpdate {
        let Some(mut state) = self.mining else {
            return MiningUpdate::Idle;
        };
        if self.cargo.is_full() {
            self.stop_mining();
            return MiningUpdate::StoppedFull;
        }
        let tiles = self.tiles_under(geometry);
        let Some((deposit, kind)) = deposits.find_under(&tiles).map(|d| (d.id, d.kind)) else {
            self.stop_mining();
            return MiningUpdate::StoppedNoDeposit;
        };
        state.deposit = deposit;
        state.kind = kind;

        let interval = interval.max(f64::EPSILON);
        let elapsed = now - state.started_at;
        if elapsed < interval {
            self.mining = Some(state);
            return MiningUpdate::Working;
        }
        let intervals = (elapsed / interval).floor();
        state.started_at += intervals * interval;
        let wanted = (intervals as u32).min(self.cargo.free());
        let extracted = deposits.extract(state.deposit, wanted);
        let stored = self.cargo.add(state.kind, extracted);
        self.mining = Some(state);

        if self.cargo.is_full() {
            self.stop_mining();
        } else if deposits.find_under(&tiles).is_none() {
            self.stop_mining();
        }
        if stored > 0 {
            MiningUpdate::Mined {
                kind: state.kind,
                amount: stored,
            }
        } else {
            MiningUpdate::Working
        }
    }
}

/// Every unit in the colony, in purchase order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRoster {
    units: Vec<Unit>,
    next_id: u32,
}

impl UnitRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: UnitKind, position: PixelPos, rules: &UnitRules) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.push(Unit::new(id, kind, position, rules));
        id
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Two distinct units borrowed mutably at once.
    pub fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        if a == b {
            return None;
        }
        let ia = self.units.iter().position(|u| u.id == a)?;
        let ib = self.units.iter().position(|u| u.id == b)?;
        if ia < ib {
            let (left, right) = self.units.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.units.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    pub fn at_px(&self, pixel: PixelPos) -> Option<&Unit> {
        self.units.iter().find(|u| u.is_hit(pixel))
    }

    /// Closest rover to `from` within `range` pixels that is not already
    /// taking power from another drone.
    pub fn nearest_rover(&self, from: PixelPos, range: f64) -> Option<UnitId> {
        self.units
            .iter()
            .filter(|u| u.kind == UnitKind::Rover && !u.is_transferring())
            .map(|u| (u.id, u.position.distance(from)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn reset_moves(&mut self, moves: u32) {
        for unit in &mut self.units {
            unit.moves_remaining = moves;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
