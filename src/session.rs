//! One running colony: kernel state plus the round engine, driven by pointer
//! input, UI actions and frame ticks.
//!
//! Every rejected command leaves state untouched and posts a short-lived notice.

use anyhow::Result;

use crate::actions::{Action, Panel, PointerButton};
use crate::buildings::{BuildingId, BuildingKind, BuildingType, Crop, MAX_UPGRADE_LEVEL, UPGRADE_COST_METALS};
use crate::deposits::DepositId;
use crate::economy::Counter;
use crate::engine::{Engine, RoundSummary};
use crate::error::Rejection;
use crate::spatial::{PixelPos, TilePos};
use crate::units::{MiningUpdate, StepOutcome, UnitId, UnitKind, MAX_BATTERY};
use crate::world::ColonyWorld;

pub const NOTICE_SECONDS: f64 = 2.0;
pub const MINING_WARNING_SECONDS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub remaining: f64,
}

/// A building chosen from the menu and waiting for a map click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPlacement {
    pub building_type: BuildingType,
    pub size: (u32, u32),
}

/// What an accepted command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Nothing,
    Selected(UnitId),
    MoveArmed(UnitId),
    MoveSet(UnitId),
    PlacementStarted(BuildingType),
    Placed(BuildingId),
    PanelOpened(Panel),
    PanelClosed,
    UnitBought(UnitId),
    RoundAdvanced(Box<RoundSummary>),
    Refined(Vec<(Counter, u32)>),
    TransferStarted { drone: UnitId, rover: UnitId },
    ControlReleased,
    MiningStarted(DepositId),
    MiningStopped,
    Upgraded { building: BuildingId, level: u8 },
    CropChanged(Crop),
}

pub struct Colony {
    world: ColonyWorld,
    engine: Engine,
    selected: Option<UnitId>,
    panel: Option<Panel>,
    pending: Option<PendingPlacement>,
    notice: Option<Notice>,
}

impl Colony {
    pub fn new(world: ColonyWorld, engine: Engine) -> Self {
        Self {
            world,
            engine,
            selected: None,
            panel: None,
            pending: None,
            notice: None,
        }
    }

    pub fn world(&self) -> &ColonyWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ColonyWorld {
        &mut self.world
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    pub fn panel(&self) -> Option<Panel> {
        self.panel
    }

    pub fn pending(&self) -> Option<PendingPlacement> {
        self.pending
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    fn post(&mut self, text: impl Into<String>, seconds: f64) {
        self.notice = Some(Notice {
            text: text.into(),
            remaining: seconds,
        });
    }

    fn surface<T>(&mut self, result: Result<T, Rejection>) -> Result<T, Rejection> {
        if let Err(rejection) = &result {
            tracing::debug!(%rejection, "command rejected");
            self.post(rejection.to_string(), NOTICE_SECONDS);
        }
        result
    }

    /// Pointer press in pixel space.
    pub fn pointer_down(&mut self, pixel: PixelPos, button: PointerButton) -> Result<Outcome, Rejection> {
        let result = match button {
            PointerButton::Left => self.left_click(pixel),
            PointerButton::Right => Ok(self.toggle_panel_at(pixel)),
        };
        self.surface(result)
    }

    fn left_click(&mut self, pixel: PixelPos) -> Result<Outcome, Rejection> {
        if let Some(pending) = self.pending {
            let tile = self.world.geometry.tile_at(pixel);
            let id = self.commit_placement(pending.building_type, tile, pending.size)?;
            self.pending = None;
            return Ok(Outcome::Placed(id));
        }
        if let Some(unit) = self.world.units.at_px(pixel) {
            let id = unit.id;
            self.selected = Some(id);
            return Ok(Outcome::Selected(id));
        }
        match self.selected {
            Some(id) => self.command_move(id, pixel),
            None => Ok(Outcome::Nothing),
        }
    }

    fn toggle_panel_at(&mut self, pixel: PixelPos) -> Outcome {
        let geometry = &self.world.geometry;
        let hit = if let Some(unit) = self.world.units.at_px(pixel) {
            Some(Panel::Unit(unit.id))
        } else if self.world.base.as_ref().is_some_and(|b| b.contains_px(pixel, geometry)) {
            Some(Panel::Base)
        } else {
            self.world.buildings.at_px(pixel, geometry).map(|b| Panel::Building(b.id))
        };
        match hit {
            Some(panel) if self.panel == Some(panel) => {
                self.panel = None;
                Outcome::PanelClosed
            }
            Some(panel) => {
                self.panel = Some(panel);
                Outcome::PanelOpened(panel)
            }
            None => Outcome::Nothing,
        }
    }

    /// Swap the pending footprint's width and height.
    pub fn rotate_pending(&mut self) -> Result<(u32, u32), Rejection> {
        let result = match self.pending.as_mut() {
            Some(pending) => {
                pending.size = (pending.size.1, pending.size.0);
                Ok(pending.size)
            }
            None => Err(Rejection::NoPlacementPending),
        };
        self.surface(result)
    }

    pub fn select(&mut self, unit: UnitId) -> Result<Outcome, Rejection> {
        if self.world.units.get(unit).is_none() {
            return self.surface(Err(Rejection::NoUnitSelected));
        }
        self.selected = Some(unit);
        Ok(Outcome::Selected(unit))
    }

    /// Move command with the per-round limit and the mining confirmation guard.
    pub fn command_move(&mut self, unit: UnitId, target: PixelPos) -> Result<Outcome, Rejection> {
        let result = self.try_move(unit, target);
        if let Ok(Outcome::MoveArmed(id)) = &result {
            let kind = self.world.units.get(*id).map_or(UnitKind::Rover, |u| u.kind);
            self.post(format!("This {kind} is mining. Click again to move it."), MINING_WARNING_SECONDS);
        }
        self.surface(result)
    }

    fn try_move(&mut self, unit: UnitId, target: PixelPos) -> Result<Outcome, Rejection> {
        let unit = self.world.units.get_mut(unit).ok_or(Rejection::NoUnitSelected)?;
        if unit.moves_remaining == 0 {
            return Err(Rejection::NoMovesLeft);
        }
        if unit.is_transferring() {
            return Ok(Outcome::Nothing);
        }
        if unit.is_mining() {
            if !unit.awaiting_move_confirmation {
                unit.awaiting_move_confirmation = true;
                return Ok(Outcome::MoveArmed(unit.id));
            }
            unit.stop_mining();
        }
        unit.set_target(target);
        unit.moves_remaining -= 1;
        Ok(Outcome::MoveSet(unit.id))
    }

    /// Dispatch a UI action.
    pub fn perform(&mut self, action: Action) -> Result<Outcome, Rejection> {
        let result = match action {
            Action::Close => {
                self.panel = None;
                self.pending = None;
                Ok(Outcome::PanelClosed)
            }
            Action::Build(building_type) => self.start_placement(building_type),
            Action::BuyRover => self.buy_unit(UnitKind::Rover),
            Action::BuyDrone => self.buy_unit(UnitKind::Drone),
            Action::NextRound => match self.advance_round() {
                Ok(Some(summary)) => Ok(Outcome::RoundAdvanced(Box::new(summary))),
                Ok(None) => Err(Rejection::RoundLimitReached),
                Err(err) => Err(Rejection::RoundFailed(err.to_string())),
            },
            Action::StopControl => Ok(self.release_control()),
            Action::Refine => self.refine(),
            Action::RechargeRover => self.start_transfer(),
            Action::MineToggle => self.toggle_mining(),
            Action::Upgrade => self.upgrade(),
            Action::Grow(crop) => self.set_crop(crop),
        };
        self.surface(result)
    }

    /// Parse a button id and dispatch it.
    pub fn perform_id(&mut self, id: &str) -> Result<Outcome, Rejection> {
        let action = id.parse::<Action>();
        let action = self.surface(action)?;
        self.perform(action)
    }

    fn start_placement(&mut self, building_type: BuildingType) -> Result<Outcome, Rejection> {
        let spec = building_type.spec();
        if !self.world.economy.can_afford(spec.cost_metals) {
            return Err(Rejection::NotEnoughResources);
        }
        self.pending = Some(PendingPlacement {
            building_type,
            size: spec.size,
        });
        self.panel = None;
        Ok(Outcome::PlacementStarted(building_type))
    }

    /// Validate, pay and record a building at `origin`.
    pub fn place(&mut self, building_type: BuildingType, origin: TilePos, size: (u32, u32)) -> Result<BuildingId, Rejection> {
        let result = self.commit_placement(building_type, origin, size);
        self.surface(result)
    }

    fn commit_placement(&mut self, building_type: BuildingType, origin: TilePos, size: (u32, u32)) -> Result<BuildingId, Rejection> {
        let cost = building_type.spec().cost_metals;
        if !self.world.economy.can_afford(cost) {
            return Err(Rejection::NotEnoughResources);
        }
        let id = self
            .world
            .add_building(origin.x, origin.y, size, building_type)
            .map_err(Rejection::from)?;
        self.world.economy.spend_metals(cost);
        self.post(format!("Placed {building_type} at {},{}", origin.x, origin.y), NOTICE_SECONDS);
        Ok(id)
    }

    /// First legal origin for `building_type`, scanning row-major.
    pub fn suggest_site(&self, building_type: BuildingType) -> Option<TilePos> {
        self.world.validator().first_site(building_type.spec().size)
    }

    fn focused_unit(&self) -> Result<UnitId, Rejection> {
        match self.panel {
            Some(Panel::Unit(id)) => Ok(id),
            _ => self.selected.ok_or(Rejection::NoUnitSelected),
        }
    }

    fn focused_building(&self) -> Option<BuildingId> {
        match self.panel {
            Some(Panel::Building(id)) => Some(id),
            _ => None,
        }
    }

    fn buy_unit(&mut self, kind: UnitKind) -> Result<Outcome, Rejection> {
        let bay = self
            .focused_building()
            .and_then(|id| self.world.buildings.get(id))
            .filter(|b| b.is_complete() && b.building_type() == BuildingType::VehicleBay)
            .ok_or(Rejection::NoVehicleBay)?;
        let spawn_at = bay.center_px(&self.world.geometry);
        if !self.world.economy.spend_metals(kind.cost_metals()) {
            return Err(Rejection::NotEnoughResources);
        }
        let id = self.world.spawn_unit(kind, spawn_at);
        tracing::info!(unit = id.raw(), %kind, "unit purchased");
        Ok(Outcome::UnitBought(id))
    }

    fn refine(&mut self) -> Result<Outcome, Rejection> {
        let id = self.focused_unit()?;
        let unit = self.world.units.get(id).ok_or(Rejection::NoUnitSelected)?;
        let over_bay = self
            .world
            .buildings
            .completed_at_px(unit.position, &self.world.geometry, BuildingType::VehicleBay)
            .is_some();
        if !over_bay {
            return Err(Rejection::NotOverVehicleBay);
        }
        if unit.cargo.is_empty() {
            return Err(Rejection::CargoEmpty);
        }
        let cargo = self
            .world
            .units
            .get_mut(id)
            .map(|u| u.cargo.drain())
            .unwrap_or_default();
        let credited = self.world.economy.refine(&cargo);
        tracing::info!(unit = id.raw(), ?credited, "cargo refined");
        Ok(Outcome::Refined(credited))
    }

    fn start_transfer(&mut self) -> Result<Outcome, Rejection> {
        let id = self.focused_unit()?;
        let drone = self.world.units.get(id).ok_or(Rejection::NoUnitSelected)?;
        if drone.kind != UnitKind::Drone {
            return Err(Rejection::NotADrone);
        }
        if drone.battery <= 0.0 {
            return Err(Rejection::DroneBatteryEmpty);
        }
        let range = self.world.rules.units.transfer_range_px;
        let rover = self
            .world
            .units
            .nearest_rover(drone.position, range)
            .ok_or(Rejection::NoRoverInRange)?;
        if let Some((drone, target)) = self.world.units.pair_mut(id, rover) {
            drone.target = None;
            target.target = None;
            drone.transfer_partner = Some(rover);
            target.transfer_partner = Some(id);
        }
        Ok(Outcome::TransferStarted { drone: id, rover })
    }

    /// Deselect, ending any power transfer the unit is part of.
    fn release_control(&mut self) -> Outcome {
        if let Some(id) = self.selected.take() {
            self.end_transfer(id);
        }
        if matches!(self.panel, Some(Panel::Unit(_))) {
            self.panel = None;
        }
        Outcome::ControlReleased
    }

    fn end_transfer(&mut self, id: UnitId) {
        let partner = self.world.units.get(id).and_then(|u| u.transfer_partner);
        for unit in [Some(id), partner].into_iter().flatten() {
            if let Some(unit) = self.world.units.get_mut(unit) {
                unit.transfer_partner = None;
            }
        }
    }

    fn toggle_mining(&mut self) -> Result<Outcome, Rejection> {
        let id = self.focused_unit()?;
        let now = self.world.clock.now();
        let tiles = {
            let unit = self.world.units.get(id).ok_or(Rejection::NoUnitSelected)?;
            if unit.is_mining() {
                if let Some(unit) = self.world.units.get_mut(id) {
                    unit.stop_mining();
                }
                return Ok(Outcome::MiningStopped);
            }
            if unit.cargo.is_full() {
                return Err(Rejection::StorageFull(unit.kind.label()));
            }
            unit.tiles_under(&self.world.geometry)
        };
        let (deposit, kind) = self
            .world
            .deposits
            .find_under(&tiles)
            .map(|d| (d.id, d.kind))
            .ok_or(Rejection::NoResourcesToMine)?;
        if let Some(unit) = self.world.units.get_mut(id) {
            unit.start_mining(deposit, kind, now);
        }
        Ok(Outcome::MiningStarted(deposit))
    }

    fn upgrade(&mut self) -> Result<Outcome, Rejection> {
        let id = self.focused_building().ok_or(Rejection::NothingToUpgrade)?;
        let building = self
            .world
            .buildings
            .get_mut(id)
            .filter(|b| b.is_complete())
            .ok_or(Rejection::NothingToUpgrade)?;
        let level = building.kind.level_mut().ok_or(Rejection::NothingToUpgrade)?;
        if *level >= MAX_UPGRADE_LEVEL {
            return Err(Rejection::MaxLevel);
        }
        if !self.world.economy.spend_metals(UPGRADE_COST_METALS) {
            return Err(Rejection::NotEnoughResources);
        }
        *level += 1;
        Ok(Outcome::Upgraded { building: id, level: *level })
    }

    fn set_crop(&mut self, crop: Crop) -> Result<Outcome, Rejection> {
        let id = self.focused_building().ok_or(Rejection::NotAFarm)?;
        match self.world.buildings.get_mut(id).map(|b| &mut b.kind) {
            Some(BuildingKind::Farm(farm)) => {
                farm.crop = crop;
                Ok(Outcome::CropChanged(crop))
            }
            _ => Err(Rejection::NotAFarm),
        }
    }

    /// Run the round pipeline once.
    pub fn advance_round(&mut self) -> Result<Option<RoundSummary>> {
        self.engine.advance_round(&mut self.world)
    }

    /// One frame: clock, units, mining, generator charge, event display, notice.
    pub fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        self.world.clock.advance(dt);
        self.step_units(dt);
        self.run_transfers(dt);
        self.update_mining();
        for building in self.world.buildings.iter_mut().filter(|b| b.is_complete()) {
            if let BuildingKind::PowerGenerator(generator) = &mut building.kind {
                generator.charge_for(dt);
            }
        }
        self.world.events.tick(&mut self.world.economy);
        if let Some(notice) = self.notice.as_mut() {
            notice.remaining -= dt;
            if notice.remaining <= 0.0 {
                self.notice = None;
            }
        }
    }

    fn step_units(&mut self, dt: f64) {
        let world = &mut self.world;
        let rules = world.rules.units;
        for unit in world.units.iter_mut() {
            if unit.is_transferring() {
                continue;
            }
            let outcome = unit.step(dt, &rules, &world.geometry, &world.terrain, world.rules.mountain_threshold);
            if matches!(outcome, StepOutcome::Moved | StepOutcome::Arrived) {
                continue;
            }
            let on_generator = world
                .buildings
                .completed_at_px(unit.position, &world.geometry, BuildingType::PowerGenerator)
                .is_some();
            if !on_generator {
                continue;
            }
            // a flat unit parks on the generator until told to move again
            if outcome == StepOutcome::OutOfPower {
                unit.target = None;
            }
            unit.recharge(dt, rules.recharge_per_second);
        }
    }

    fn run_transfers(&mut self, dt: f64) {
        let rate = self.world.rules.units.recharge_per_second;
        let drones: Vec<(UnitId, UnitId)> = self
            .world
            .units
            .iter()
            .filter(|u| u.kind == UnitKind::Drone)
            .filter_map(|u| u.transfer_partner.map(|rover| (u.id, rover)))
            .collect();
        for (drone_id, rover_id) in drones {
            let Some((drone, rover)) = self.world.units.pair_mut(drone_id, rover_id) else {
                continue;
            };
            let headroom = MAX_BATTERY - rover.battery;
            let amount = (rate * dt).min(drone.battery).min(headroom).max(0.0);
            drone.battery -= amount;
            rover.battery += amount;
            if drone.battery <= 0.0 || rover.battery >= MAX_BATTERY {
                drone.transfer_partner = None;
                rover.transfer_partner = None;
                tracing::debug!(drone = drone_id.raw(), rover = rover_id.raw(), "power transfer finished");
            }
        }
    }

    fn update_mining(&mut self) {
        let now = self.world.clock.now();
        let interval = self.world.rules.units.mine_interval_seconds;
        let mut full = None;
        for unit in self.world.units.iter_mut() {
            let update = unit.update_mining(now, interval, &self.world.geometry, &mut self.world.deposits);
            if update == MiningUpdate::StoppedFull || (matches!(update, MiningUpdate::Mined { .. }) && unit.cargo.is_full()) {
                full = Some(unit.kind);
            }
        }
        if let Some(kind) = full {
            self.post(Rejection::StorageFull(kind.label()).to_string(), NOTICE_SECONDS);
        }
    }
}
