use std::collections::BTreeMap;

use serde::Serialize;

use crate::buildings::{
    Base, BuildingId, BuildingKind, BuildingRegistry, BuildingType, PlacementValidator,
};
use crate::clock::SimClock;
use crate::deposits::{DepositLedger, ResourceKind};
use crate::economy::EconomyState;
use crate::error::PlacementError;
use crate::events::{EventEngine, EventKind, EventTargets};
use crate::spatial::{Footprint, PixelPos, RectFootprint, TilePos, WorldGeometry};
use crate::terrain::TerrainField;
use crate::units::{UnitId, UnitKind, UnitRoster, UnitRules, UnitState};

/// Colony capacity before any housing is built.
pub const BASE_CAPACITY: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColonyRules {
    pub mountain_threshold: f32,
    pub units: UnitRules,
}

impl Default for ColonyRules {
    fn default() -> Self {
        Self {
            mountain_threshold: 0.7,
            units: UnitRules::default(),
        }
    }
}

/// What one round advance did, filled in by the systems as they run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundReport {
    pub round: u32,
    pub food_consumed: u32,
    pub water_consumed: u32,
    pub food_produced: u32,
    pub water_used_by_farms: u32,
    pub power_produced: u32,
    pub population_growth: u32,
    pub completed: Vec<BuildingId>,
    pub mined: Vec<(UnitId, ResourceKind, u32)>,
    pub shortfalls: Vec<String>,
    pub event: Option<EventKind>,
}

impl RoundReport {
    pub fn new(round: u32) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }
}

/// All kernel state for one colony. Everything that mutates the colony takes
/// it explicitly; there is no ambient shared state.
pub struct ColonyWorld {
    pub(crate) geometry: WorldGeometry,
    pub(crate) terrain: TerrainField,
    pub(crate) deposits: DepositLedger,
    pub(crate) base: Option<Base>,
    pub(crate) buildings: BuildingRegistry,
    pub(crate) units: UnitRoster,
    pub(crate) economy: EconomyState,
    pub(crate) events: EventEngine,
    pub(crate) rules: ColonyRules,
    pub(crate) clock: SimClock,
    pub(crate) report: RoundReport,
}

impl ColonyWorld {
    pub fn new(geometry: WorldGeometry, terrain: TerrainField, rules: ColonyRules) -> Self {
        let economy = EconomyState::default();
        Self {
            geometry,
            terrain,
            deposits: DepositLedger::new(),
            base: None,
            buildings: BuildingRegistry::new(),
            units: UnitRoster::new(),
            report: RoundReport::new(economy.current_round),
            economy,
            events: EventEngine::new(5, 120),
            rules,
            clock: SimClock::manual(),
        }
    }

    pub fn with_base(mut self, base: Option<Base>) -> Self {
        self.base = base;
        self
    }

    pub fn with_deposits(mut self, deposits: DepositLedger) -> Self {
        self.deposits = deposits;
        self
    }

    pub fn with_economy(mut self, economy: EconomyState) -> Self {
        self.report = RoundReport::new(economy.current_round);
        self.economy = economy;
        self
    }

    pub fn with_events(mut self, events: EventEngine) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: SimClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn geometry(&self) -> &WorldGeometry {
        &self.geometry
    }

    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut TerrainField {
        &mut self.terrain
    }

    pub fn deposits(&self) -> &DepositLedger {
        &self.deposits
    }

    pub fn deposits_mut(&mut self) -> &mut DepositLedger {
        &mut self.deposits
    }

    pub fn base(&self) -> Option<&Base> {
        self.base.as_ref()
    }

    pub fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    pub fn buildings_mut(&mut self) -> &mut BuildingRegistry {
        &mut self.buildings
    }

    pub fn units(&self) -> &UnitRoster {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut UnitRoster {
        &mut self.units
    }

    pub fn economy(&self) -> &EconomyState {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut EconomyState {
        &mut self.economy
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }

    pub fn rules(&self) -> &ColonyRules {
        &self.rules
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn report(&self) -> &RoundReport {
        &self.report
    }

    pub fn validator(&self) -> PlacementValidator<'_> {
        PlacementValidator {
            geometry: &self.geometry,
            terrain: &self.terrain,
            deposits: &self.deposits,
            base: self.base.as_ref(),
            buildings: self.buildings.as_slice(),
            threshold: self.rules.mountain_threshold,
        }
    }

    pub fn can_place(&self, gx: i32, gy: i32, size: (u32, u32)) -> bool {
        self.validator().can_place(gx, gy, size)
    }

    /// Validate and record a building. Cost is the caller's business.
    pub fn add_building(
        &mut self,
        gx: i32,
        gy: i32,
        size: (u32, u32),
        building_type: BuildingType,
    ) -> Result<BuildingId, PlacementError> {
        let footprint = RectFootprint::new(TilePos::new(gx, gy), size.0, size.1);
        if let Err(reason) = self.validator().check(&footprint) {
            tracing::debug!(%building_type, gx, gy, %reason, "placement rejected");
            return Err(reason);
        }
        let id = self.buildings.push(footprint, building_type);
        tracing::debug!(%building_type, gx, gy, id = id.raw(), "building placed");
        Ok(id)
    }

    pub fn spawn_unit(&mut self, kind: UnitKind, position: PixelPos) -> UnitId {
        let position = PixelPos::new(
            position.x.clamp(0.0, self.geometry.width_px() - 1.0),
            position.y.clamp(0.0, self.geometry.height_px() - 1.0),
        );
        self.units.spawn(kind, position, &self.rules.units)
    }

    /// Base allowance plus every completed house.
    pub fn colony_capacity(&self) -> u32 {
        BASE_CAPACITY
            + self
                .buildings
                .iter()
                .filter(|b| b.is_complete())
                .filter_map(|b| match &b.kind {
                    BuildingKind::Housing(state) => Some(state.capacity()),
                    _ => None,
                })
                .sum::<u32>()
    }

    /// Split borrow handing events everything they may touch.
    pub(crate) fn event_parts(&mut self) -> (&mut EventEngine, EventTargets<'_>) {
        let mut keep_clear: Vec<&dyn Footprint> = Vec::with_capacity(self.buildings.len() + 1);
        if let Some(base) = self.base.as_ref() {
            keep_clear.push(base);
        }
        keep_clear.extend(self.buildings.iter().map(|b| b as &dyn Footprint));
        (
            &mut self.events,
            EventTargets {
                economy: &mut self.economy,
                terrain: Some(&mut self.terrain),
                deposits: Some(&mut self.deposits),
                keep_clear,
                threshold: self.rules.mountain_threshold,
            },
        )
    }

    pub fn snapshot(&self, scenario: &str) -> ColonySnapshot {
        ColonySnapshot {
            scenario: scenario.to_string(),
            round: self.economy.current_round,
            rounds_total: self.economy.rounds_total,
            economy: self.economy.clone(),
            capacity: self.colony_capacity(),
            base: self.base.as_ref().map(|b| b.center),
            buildings: self
                .buildings
                .iter()
                .map(|b| BuildingView {
                    id: b.id.raw(),
                    name: b.label(),
                    origin: b.origin(),
                    size: b.size(),
                    complete: b.is_complete(),
                    rounds_remaining: b.rounds_remaining,
                })
                .collect(),
            units: self
                .units
                .iter()
                .map(|u| UnitView {
                    id: u.id.raw(),
                    kind: u.kind,
                    position: u.position,
                    state: u.state(),
                    battery: u.battery,
                    cargo: u.cargo.contents().clone(),
                    moves_remaining: u.moves_remaining,
                })
                .collect(),
            deposits: self
                .deposits
                .iter()
                .map(|d| DepositView {
                    id: d.id.raw(),
                    kind: d.kind,
                    tiles: d.positions.len(),
                    reserve: d.reserve,
                })
                .collect(),
            last_round: self.report.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BuildingView {
    pub id: u32,
    pub name: String,
    pub origin: TilePos,
    pub size: (u32, u32),
    pub complete: bool,
    pub rounds_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct UnitView {
    pub id: u32,
    pub kind: UnitKind,
    pub position: PixelPos,
    pub state: UnitState,
    pub battery: f64,
    pub cargo: BTreeMap<ResourceKind, u32>,
    pub moves_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct DepositView {
    pub id: u32,
    pub kind: ResourceKind,
    pub tiles: usize,
    pub reserve: u32,
}

/// Read-only view of a colony for inspection output.
#[derive(Debug, Serialize)]
pub struct ColonySnapshot {
    pub scenario: String,
    pub round: u32,
    pub rounds_total: u32,
    pub economy: EconomyState,
    pub capacity: u32,
    pub base: Option<TilePos>,
    pub buildings: Vec<BuildingView>,
    pub units: Vec<UnitView>,
    pub deposits: Vec<DepositView>,
    pub last_round: RoundReport,
}
