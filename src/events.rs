//! Random colony events.
//!
//! The engine is dormant most of the time. Every round it counts toward the
//! interval; when the interval is reached it draws one event from the catalog,
//! applies the effect once, and stays active for a fixed number of display
//! ticks before going dormant again.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::deposits::{DepositLedger, PatchPlan, PatchRule, ResourceKind};
use crate::economy::{Counter, EconomyState, NO_EVENT};
use crate::spatial::{Footprint, TilePos};
use crate::terrain::TerrainField;

pub const CRATER_RADIUS: u32 = 3;
pub const CRATER_FLOOR: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DustStorm,
    SolarFlare,
    WaterLeak,
    CropBlight,
    SupplyDrop,
    ColonistsArrive,
    MeteorShower,
    MeteorImpact,
    Avalanche,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::DustStorm,
        EventKind::SolarFlare,
        EventKind::WaterLeak,
        EventKind::CropBlight,
        EventKind::SupplyDrop,
        EventKind::ColonistsArrive,
        EventKind::MeteorShower,
        EventKind::MeteorImpact,
        EventKind::Avalanche,
    ];

    pub fn title(self) -> &'static str {
        match self {
            EventKind::DustStorm => "Dust Storm",
            EventKind::SolarFlare => "Solar Flare",
            EventKind::WaterLeak => "Water Leak",
            EventKind::CropBlight => "Crop Blight",
            EventKind::SupplyDrop => "Supply Drop",
            EventKind::ColonistsArrive => "Colonists Arrive",
            EventKind::MeteorShower => "Meteor Shower",
            EventKind::MeteorImpact => "Meteor Impact",
            EventKind::Avalanche => "Avalanche",
        }
    }

    pub fn description(self) -> &'static [&'static str] {
        match self {
            EventKind::DustStorm => &["Dust Storm Incoming!", "-5 Power"],
            EventKind::SolarFlare => &["Solar flare fried the grid", "-10 Power"],
            EventKind::WaterLeak => &["A reservoir is leaking", "-10 Water"],
            EventKind::CropBlight => &["Blight in the greenhouses", "-15 Food"],
            EventKind::SupplyDrop => &["Supply capsule landed", "+20 Food +10 Water +5 Metals"],
            EventKind::ColonistsArrive => &["New colonists have arrived", "+3 Population +1 Soldier"],
            EventKind::MeteorShower => &["Meteor shower!", "Rock deposits scattered"],
            EventKind::MeteorImpact => &["Meteor impact!", "Crater formed, +3 Metals"],
            EventKind::Avalanche => &["Avalanche!", "A deposit was buried"],
        }
    }

    fn deltas(self) -> &'static [(Counter, i64)] {
        match self {
            EventKind::DustStorm => &[(Counter::Power, -5)],
            EventKind::SolarFlare => &[(Counter::Power, -10)],
            EventKind::WaterLeak => &[(Counter::Water, -10)],
            EventKind::CropBlight => &[(Counter::Food, -15)],
            EventKind::SupplyDrop => &[(Counter::Food, 20), (Counter::Water, 10), (Counter::Metals, 5)],
            EventKind::ColonistsArrive => &[(Counter::Population, 3), (Counter::Soldiers, 1)],
            EventKind::MeteorImpact => &[(Counter::Metals, 3)],
            EventKind::MeteorShower | EventKind::Avalanche => &[],
        }
    }

    /// Apply the effect once. Terrain and deposit effects are skipped with a
    /// warning when the collaborator they need is missing.
    pub fn apply<R: Rng + ?Sized>(self, targets: &mut EventTargets<'_>, rng: &mut R) {
        for (counter, delta) in self.deltas() {
            targets.economy.adjust(*counter, *delta);
        }
        match self {
            EventKind::MeteorShower => {
                let (Some(terrain), Some(deposits)) = (targets.terrain.as_deref(), targets.deposits.as_deref_mut())
                else {
                    tracing::warn!(event = self.title(), "terrain or deposits unavailable, skipping effect");
                    return;
                };
                let line = PatchPlan {
                    kind: ResourceKind::Rock,
                    rule: PatchRule::Flat,
                    count: 1..=1,
                    size: 3..=6,
                };
                let landed = deposits
                    .spawn_patch(terrain, &line, targets.threshold, rng)
                    .and_then(|id| deposits.trim(id, &targets.keep_clear));
                match landed {
                    Some(id) => tracing::debug!(deposit = id.raw(), "meteor shower left rock"),
                    None => tracing::debug!("meteor shower left no rock on open ground"),
                }
            }
            EventKind::MeteorImpact => {
                let Some(terrain) = targets.terrain.as_deref_mut() else {
                    tracing::warn!(event = self.title(), "terrain unavailable, skipping crater");
                    return;
                };
                if terrain.cols() == 0 || terrain.rows() == 0 {
                    return;
                }
                let center = TilePos::new(
                    rng.gen_range(0..terrain.cols() as i32),
                    rng.gen_range(0..terrain.rows() as i32),
                );
                let touched = terrain.scar_crater(center, CRATER_RADIUS, CRATER_FLOOR);
                tracing::debug!(x = center.x, y = center.y, touched, "crater scarred");
            }
            EventKind::Avalanche => {
                let (Some(terrain), Some(deposits)) = (targets.terrain.as_deref(), targets.deposits.as_deref_mut())
                else {
                    tracing::warn!(event = self.title(), "terrain or deposits unavailable, skipping effect");
                    return;
                };
                let buried: Vec<_> = deposits
                    .iter()
                    .filter(|d| d.positions.iter().any(|t| touches_mountain(terrain, *t, targets.threshold)))
                    .map(|d| d.id)
                    .collect();
                if let Some(id) = buried.choose(rng) {
                    deposits.remove(*id);
                    tracing::debug!(deposit = id.raw(), "avalanche buried deposit");
                }
            }
            _ => {}
        }
    }
}

fn touches_mountain(terrain: &TerrainField, tile: TilePos, threshold: f32) -> bool {
    (-1..=1).any(|dy| {
        (-1..=1).any(|dx| {
            let n = TilePos::new(tile.x + dx, tile.y + dy);
            terrain.elevation(n).is_some_and(|v| v >= threshold)
        })
    })
}

/// What an event may touch. Only the economy is mandatory. New deposits stay
/// off every `keep_clear` footprint and its outline.
pub struct EventTargets<'a> {
    pub economy: &'a mut EconomyState,
    pub terrain: Option<&'a mut TerrainField>,
    pub deposits: Option<&'a mut DepositLedger>,
    pub keep_clear: Vec<&'a dyn Footprint>,
    pub threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    Dormant,
    EventActive { kind: EventKind, ticks_left: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEngine {
    interval_rounds: u32,
    display_ticks: u32,
    rounds_since: u32,
    phase: EventPhase,
    catalog: Vec<EventKind>,
}

impl EventEngine {
    pub fn new(interval_rounds: u32, display_ticks: u32) -> Self {
        Self::with_catalog(interval_rounds, display_ticks, EventKind::ALL.to_vec())
    }

    pub fn with_catalog(interval_rounds: u32, display_ticks: u32, catalog: Vec<EventKind>) -> Self {
        Self {
            interval_rounds: interval_rounds.max(1),
            display_ticks,
            rounds_since: 0,
            phase: EventPhase::Dormant,
            catalog,
        }
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn active(&self) -> Option<EventKind> {
        match self.phase {
            EventPhase::EventActive { kind, .. } => Some(kind),
            EventPhase::Dormant => None,
        }
    }

    pub fn rounds_since(&self) -> u32 {
        self.rounds_since
    }

    /// Count one round; trigger when the interval elapses. Rounds while an
    /// event is on screen do not count.
    pub fn on_round<R: Rng + ?Sized>(&mut self, targets: &mut EventTargets<'_>, rng: &mut R) -> Option<EventKind> {
        if self.phase != EventPhase::Dormant {
            return None;
        }
        self.rounds_since += 1;
        if self.rounds_since < self.interval_rounds {
            return None;
        }
        let kind = *self.catalog.choose(rng)?;
        kind.apply(targets, rng);
        targets.economy.current_event = kind.title().to_string();
        self.rounds_since = 0;
        self.phase = if self.display_ticks == 0 {
            targets.economy.current_event = NO_EVENT.to_string();
            EventPhase::Dormant
        } else {
            EventPhase::EventActive {
                kind,
                ticks_left: self.display_ticks,
            }
        };
        tracing::info!(event = kind.title(), round = targets.economy.current_round, "event triggered");
        Some(kind)
    }

    /// One display tick. Returns true when the event just ended.
    pub fn tick(&mut self, economy: &mut EconomyState) -> bool {
        let EventPhase::EventActive { kind, ticks_left } = self.phase else {
            return false;
        };
        if ticks_left > 1 {
            self.phase = EventPhase::EventActive {
                kind,
                ticks_left: ticks_left - 1,
            };
            return false;
        }
        self.phase = EventPhase::Dormant;
        self.rounds_since = 0;
        economy.current_event = NO_EVENT.to_string();
        true
    }
}
