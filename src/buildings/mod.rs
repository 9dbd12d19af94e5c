//! Colony structures: the building catalog, per-type state and the registry.

mod base;
pub mod placement;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::spatial::{Footprint, PixelPos, RectFootprint, TilePos, WorldGeometry};

pub use base::Base;
pub use placement::PlacementValidator;

pub const MAX_UPGRADE_LEVEL: u8 = 2;
pub const UPGRADE_COST_METALS: u32 = 5;
pub const HOUSING_BASE_CAPACITY: u32 = 10;
pub const HOUSING_CAPACITY_PER_LEVEL: u32 = 5;

/// Static catalog entry for a building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingSpec {
    pub name: &'static str,
    pub size: (u32, u32),
    pub cost_metals: u32,
    pub build_rounds: u32,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    Housing,
    Farm,
    PowerGenerator,
    Factory,
    VehicleBay,
    Generic,
}

impl BuildingType {
    pub const BUILDABLE: [BuildingType; 5] = [
        BuildingType::Housing,
        BuildingType::Farm,
        BuildingType::PowerGenerator,
        BuildingType::Factory,
        BuildingType::VehicleBay,
    ];

    pub fn spec(self) -> BuildingSpec {
        match self {
            BuildingType::Housing => BuildingSpec {
                name: "Housing",
                size: (4, 4),
                cost_metals: 5,
                build_rounds: 1,
                color: [200, 200, 200],
            },
            BuildingType::Farm => BuildingSpec {
                name: "Farm",
                size: (2, 5),
                cost_metals: 3,
                build_rounds: 2,
                color: [90, 170, 70],
            },
            BuildingType::PowerGenerator => BuildingSpec {
                name: "Power Generator",
                size: (3, 2),
                cost_metals: 4,
                build_rounds: 3,
                color: [255, 255, 0],
            },
            BuildingType::Factory => BuildingSpec {
                name: "Factory",
                size: (5, 5),
                cost_metals: 6,
                build_rounds: 4,
                color: [150, 110, 90],
            },
            BuildingType::VehicleBay => BuildingSpec {
                name: "Vehicle Bay",
                size: (5, 3),
                cost_metals: 5,
                build_rounds: 3,
                color: [70, 110, 200],
            },
            BuildingType::Generic => BuildingSpec {
                name: "Generic",
                size: (4, 4),
                cost_metals: 0,
                build_rounds: 1,
                color: [100, 200, 100],
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BuildingType::BUILDABLE
            .into_iter()
            .chain([BuildingType::Generic])
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown building type '{wanted}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Potatoes,
    Carrots,
    Tomatoes,
}

impl Crop {
    /// (food produced, water consumed) per round
    pub fn yields(self) -> (u32, u32) {
        match self {
            Crop::Potatoes => (5, 2),
            Crop::Carrots => (10, 5),
            Crop::Tomatoes => (20, 10),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "potatoes" => Some(Crop::Potatoes),
            "carrots" => Some(Crop::Carrots),
            "tomatoes" => Some(Crop::Tomatoes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmState {
    pub crop: Crop,
    pub level: u8,
    pub halted: bool,
}

impl FarmState {
    pub fn food_per_round(&self) -> u32 {
        let (food, _) = self.crop.yields();
        food + food * u32::from(self.level) / 2
    }

    pub fn water_per_round(&self) -> u32 {
        self.crop.yields().1
    }
}

impl Default for FarmState {
    fn default() -> Self {
        Self {
            crop: Crop::Potatoes,
            level: 0,
            halted: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HousingState {
    pub level: u8,
}

impl HousingState {
    pub fn capacity(&self) -> u32 {
        HOUSING_BASE_CAPACITY + HOUSING_CAPACITY_PER_LEVEL * u32::from(self.level)
    }
}

/// Solar generator: charge climbs 1% every 3 seconds, output scales with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub charge: f64,
}

impl GeneratorState {
    pub const OUTPUT_BASE: f64 = 2.4;
    pub const OUTPUT_MAX: f64 = 3.0;
    pub const SECONDS_PER_PERCENT: f64 = 3.0;

    pub fn charge_for(&mut self, dt: f64) {
        self.charge = (self.charge + dt / Self::SECONDS_PER_PERCENT).clamp(0.0, 100.0);
    }

    /// Watts, rounded to one decimal
    pub fn output(&self) -> f64 {
        let watts = Self::OUTPUT_BASE + (self.charge / 100.0) * (Self::OUTPUT_MAX - Self::OUTPUT_BASE);
        (watts * 10.0).round() / 10.0
    }
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self { charge: 25.0 }
    }
}

/// Per-type state; each variant carries only what that type needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildingKind {
    Generic,
    Housing(HousingState),
    Farm(FarmState),
    PowerGenerator(GeneratorState),
    Factory,
    VehicleBay,
}

impl BuildingKind {
    pub fn new(building_type: BuildingType) -> Self {
        match building_type {
            BuildingType::Generic => BuildingKind::Generic,
            BuildingType::Housing => BuildingKind::Housing(HousingState::default()),
            BuildingType::Farm => BuildingKind::Farm(FarmState::default()),
            BuildingType::PowerGenerator => BuildingKind::PowerGenerator(GeneratorState::default()),
            BuildingType::Factory => BuildingKind::Factory,
            BuildingType::VehicleBay => BuildingKind::VehicleBay,
        }
    }

    pub fn building_type(&self) -> BuildingType {
        match self {
            BuildingKind::Generic => BuildingType::Generic,
            BuildingKind::Housing(_) => BuildingType::Housing,
            BuildingKind::Farm(_) => BuildingType::Farm,
            BuildingKind::PowerGenerator(_) => BuildingType::PowerGenerator,
            BuildingKind::Factory => BuildingType::Factory,
            BuildingKind::VehicleBay => BuildingType::VehicleBay,
        }
    }

    /// Mutable upgrade level, for the types that have one.
    pub fn level_mut(&mut self) -> Option<&mut u8> {
        match self {
            BuildingKind::Housing(state) => Some(&mut state.level),
            BuildingKind::Farm(state) => Some(&mut state.level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub footprint: RectFootprint,
    pub color: [u8; 3],
    pub kind: BuildingKind,
    pub rounds_remaining: u32,
}

impl Building {
    pub fn building_type(&self) -> BuildingType {
        self.kind.building_type()
    }

    pub fn is_complete(&self) -> bool {
        self.rounds_remaining == 0
    }

    pub fn origin(&self) -> TilePos {
        self.footprint.origin
    }

    pub fn size(&self) -> (u32, u32) {
        (self.footprint.w, self.footprint.h)
    }

    pub fn center_px(&self, geometry: &WorldGeometry) -> PixelPos {
        self.footprint.center_px(geometry)
    }

    pub fn contains_px(&self, pixel: PixelPos, geometry: &WorldGeometry) -> bool {
        self.footprint.contains_px(pixel, geometry)
    }

    pub fn label(&self) -> String {
        format!("{} #{}", self.building_type(), self.id.raw())
    }
}

impl Footprint for Building {
    fn interior(&self) -> Vec<TilePos> {
        self.footprint.interior()
    }

    fn outline(&self) -> Vec<TilePos> {
        self.footprint.outline()
    }

    fn occupies(&self, tile: TilePos) -> bool {
        self.footprint.occupies(tile)
    }

    fn outline_contains(&self, tile: TilePos) -> bool {
        self.footprint.outline_contains(tile)
    }
}

/// Insertion-ordered collection of placed buildings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingRegistry {
    buildings: Vec<Building>,
    next_id: u32,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append without validation; callers go through [`PlacementValidator`] first.
    pub(crate) fn push(&mut self, footprint: RectFootprint, building_type: BuildingType) -> BuildingId {
        let id = BuildingId(self.next_id);
        self.next_id += 1;
        let spec = building_type.spec();
        self.buildings.push(Building {
            id,
            footprint,
            color: spec.color,
            kind: BuildingKind::new(building_type),
            rounds_remaining: spec.build_rounds.saturating_sub(1),
        });
        id
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    pub fn at_px(&self, pixel: PixelPos, geometry: &WorldGeometry) -> Option<&Building> {
        self.buildings.iter().find(|b| b.contains_px(pixel, geometry))
    }

    /// Completed building of `building_type` under `pixel`
    pub fn completed_at_px(
        &self,
        pixel: PixelPos,
        geometry: &WorldGeometry,
        building_type: BuildingType,
    ) -> Option<&Building> {
        self.buildings.iter().find(|b| {
            b.is_complete() && b.building_type() == building_type && b.contains_px(pixel, geometry)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.buildings.iter_mut()
    }

    pub fn as_slice(&self) -> &[Building] {
        &self.buildings
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn count_completed(&self, building_type: BuildingType) -> usize {
        self.buildings
            .iter()
            .filter(|b| b.is_complete() && b.building_type() == building_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_round_trip_through_from_str() {
        for t in BuildingType::BUILDABLE {
            assert_eq!(t.name().parse::<BuildingType>(), Ok(t));
        }
        assert_eq!("power generator".parse(), Ok(BuildingType::PowerGenerator));
        assert!("Spaceport".parse::<BuildingType>().is_err());
    }

    #[test]
    fn instant_buildings_complete_on_placement() {
        let mut registry = BuildingRegistry::new();
        let house = registry.push(RectFootprint::new(TilePos::new(0, 0), 4, 4), BuildingType::Housing);
        let bay = registry.push(RectFootprint::new(TilePos::new(10, 0), 5, 3), BuildingType::VehicleBay);
        assert!(registry.get(house).unwrap().is_complete());
        assert_eq!(registry.get(bay).unwrap().rounds_remaining, 2);
        assert_eq!(registry.count_completed(BuildingType::Housing), 1);
    }

    #[test]
    fn farm_upgrades_raise_food_not_water() {
        let mut farm = FarmState::default();
        assert_eq!(farm.food_per_round(), 5);
        farm.level = 2;
        assert_eq!(farm.food_per_round(), 10);
        farm.crop = Crop::Tomatoes;
        assert_eq!(farm.food_per_round(), 40);
        assert_eq!(farm.water_per_round(), 10);
    }

    #[test]
    fn generator_output_tracks_charge() {
        let mut generator = GeneratorState::default();
        let start = generator.output();
        assert!((2.5..=2.6).contains(&start));
        generator.charge_for(30.0);
        assert!((generator.charge - 35.0).abs() < 1e-9);
        generator.charge_for(1_000.0);
        assert_eq!(generator.charge, 100.0);
        assert!((generator.output() - 3.0).abs() < 1e-9);
    }
}
