use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    buildings::Base,
    deposits::{default_plan, DepositLedger},
    economy::{ConsumptionRates, EconomyState, NO_EVENT},
    engine::{Engine, EngineBuilder, EngineSettings},
    events::EventEngine,
    rng::RngManager,
    session::Colony,
    spatial::{PixelPos, WorldGeometry},
    systems,
    terrain::{self, TerrainParams},
    units::{UnitKind, UnitRules},
    world::{ColonyRules, ColonyWorld},
};

const DRONE_OFFSET_PX: f64 = 50.0;

fn default_name() -> String {
    "red_plains".to_string()
}

fn default_width_px() -> u32 {
    1280
}

fn default_height_px() -> u32 {
    720
}

fn default_tile_size() -> u32 {
    10
}

fn default_reserved_width_px() -> u32 {
    200
}

fn default_reserved_height_px() -> u32 {
    150
}

fn default_mountain_threshold() -> f32 {
    0.7
}

fn default_base_radius() -> u32 {
    3
}

fn default_base_attempts() -> u32 {
    10_000
}

fn default_interval_rounds() -> u32 {
    5
}

fn default_display_ticks() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Omit for a different colony every run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub terrain: TerrainSection,
    #[serde(default)]
    pub base: BaseSection,
    #[serde(default)]
    pub economy: EconomySection,
    #[serde(default)]
    pub units: UnitRules,
    #[serde(default)]
    pub events: EventSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Top-left area kept clear for the dashboard.
    #[serde(default = "default_reserved_width_px")]
    pub reserved_width_px: u32,
    #[serde(default = "default_reserved_height_px")]
    pub reserved_height_px: u32,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            width_px: default_width_px(),
            height_px: default_height_px(),
            tile_size: default_tile_size(),
            reserved_width_px: default_reserved_width_px(),
            reserved_height_px: default_reserved_height_px(),
        }
    }
}

impl WorldSection {
    pub fn geometry(&self) -> WorldGeometry {
        WorldGeometry::from_pixels(self.width_px, self.height_px, self.tile_size)
    }

    pub fn reserved_tiles(&self) -> (u32, u32) {
        let tile = self.tile_size.max(1);
        (
            self.reserved_width_px.div_ceil(tile),
            self.reserved_height_px.div_ceil(tile),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSection {
    #[serde(flatten)]
    pub noise: TerrainParams,
    #[serde(default = "default_mountain_threshold")]
    pub mountain_threshold: f32,
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            noise: TerrainParams::default(),
            mountain_threshold: default_mountain_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseSection {
    #[serde(default = "default_base_radius")]
    pub radius: u32,
    #[serde(default = "default_base_attempts")]
    pub max_attempts: u32,
}

impl Default for BaseSection {
    fn default() -> Self {
        Self {
            radius: default_base_radius(),
            max_attempts: default_base_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySection {
    pub population: u32,
    pub food: u32,
    pub power: u32,
    pub water: u32,
    pub metals: u32,
    pub marsium: u32,
    pub soldiers: u32,
    pub rounds_total: u32,
    pub food_rate: u32,
    pub water_rate: u32,
}

impl Default for EconomySection {
    fn default() -> Self {
        let state = EconomyState::default();
        Self {
            population: state.population,
            food: state.food,
            power: state.power,
            water: state.water,
            metals: state.metals,
            marsium: state.marsium,
            soldiers: state.soldiers,
            rounds_total: state.rounds_total,
            food_rate: state.rates.food,
            water_rate: state.rates.water,
        }
    }
}

impl EconomySection {
    pub fn to_state(&self) -> EconomyState {
        EconomyState {
            population: self.population,
            food: self.food,
            power: self.power,
            water: self.water,
            metals: self.metals,
            marsium: self.marsium,
            soldiers: self.soldiers,
            current_round: 1,
            rounds_total: self.rounds_total,
            current_event: NO_EVENT.to_string(),
            rates: ConsumptionRates {
                food: self.food_rate,
                water: self.water_rate,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSection {
    #[serde(default = "default_interval_rounds")]
    pub interval_rounds: u32,
    #[serde(default = "default_display_ticks")]
    pub display_ticks: u32,
}

impl Default for EventSection {
    fn default() -> Self {
        Self {
            interval_rounds: default_interval_rounds(),
            display_ticks: default_display_ticks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: None,
            world: WorldSection::default(),
            terrain: TerrainSection::default(),
            base: BaseSection::default(),
            economy: EconomySection::default(),
            units: UnitRules::default(),
            events: EventSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.world.tile_size > 0, "tile_size must be positive");
        let geometry = self.world.geometry();
        ensure!(
            geometry.cols() > 0 && geometry.rows() > 0,
            "world of {}x{} px holds no {} px tiles",
            self.world.width_px,
            self.world.height_px,
            self.world.tile_size
        );
        ensure!(self.terrain.noise.scale > 0.0, "terrain scale must be positive");
        ensure!(self.terrain.noise.octaves > 0, "terrain needs at least one octave");
        let threshold = self.terrain.mountain_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            bail!("mountain_threshold {threshold} outside (0, 1]");
        }
        ensure!(self.economy.rounds_total > 0, "rounds_total must be positive");
        ensure!(self.events.interval_rounds > 0, "event interval must be positive");
        Ok(())
    }

    pub fn rules(&self) -> ColonyRules {
        ColonyRules {
            mountain_threshold: self.terrain.mountain_threshold,
            units: self.units,
        }
    }

    /// Generate terrain, land the base, scatter deposits and park the starting units.
    pub fn build_world(&self, rng: &mut RngManager) -> ColonyWorld {
        let geometry = self.world.geometry();
        let threshold = self.terrain.mountain_threshold;
        let terrain = terrain::generate_random(
            geometry.rows(),
            geometry.cols(),
            &self.terrain.noise,
            &mut rng.stream("terrain"),
        );
        let base = Base::spawn(
            &terrain,
            self.base.radius,
            self.world.reserved_tiles(),
            threshold,
            self.base.max_attempts,
            &mut rng.stream("base"),
        );
        if base.is_none() {
            tracing::warn!(scenario = %self.name, "no safe landing site found, colony starts without a base");
        }
        let mut deposits = DepositLedger::spawn(&terrain, &default_plan(), threshold, &mut rng.stream("deposits"));
        if let Some(base) = &base {
            deposits.exclude(base);
        }

        let landing = base
            .as_ref()
            .map(|b| b.center_px(&geometry))
            .unwrap_or_else(|| PixelPos::new(geometry.width_px() / 2.0, geometry.height_px() / 2.0));
        let mut world = ColonyWorld::new(geometry, terrain, self.rules())
            .with_base(base)
            .with_deposits(deposits)
            .with_economy(self.economy.to_state())
            .with_events(EventEngine::new(self.events.interval_rounds, self.events.display_ticks));
        world.spawn_unit(UnitKind::Rover, landing);
        world.spawn_unit(
            UnitKind::Drone,
            PixelPos::new(landing.x + DRONE_OFFSET_PX, landing.y + DRONE_OFFSET_PX),
        );
        tracing::info!(
            scenario = %self.name,
            cols = world.geometry().cols(),
            rows = world.geometry().rows(),
            deposits = world.deposits().len(),
            "colony generated"
        );
        world
    }

    pub fn build_engine(&self) -> Engine {
        let settings = EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
        };
        systems::install(EngineBuilder::new(settings)).build()
    }

    /// Engine and world together, sharing one seeded stream source.
    pub fn build_colony(&self) -> Colony {
        let mut engine = self.build_engine();
        let world = self.build_world(engine.rng_mut());
        Colony::new(world, engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mapping_uses_defaults() {
        let scenario: Scenario = serde_yaml::from_str("{}").unwrap();
        assert_eq!(scenario.name, "red_plains");
        assert_eq!(scenario.world.geometry().cols(), 128);
        assert_eq!(scenario.world.geometry().rows(), 72);
        assert_eq!(scenario.world.reserved_tiles(), (20, 15));
        assert_eq!(scenario.economy.rounds_total, 30);
        assert_eq!(scenario.units.cargo_capacity, 5);
        assert_eq!(scenario.terrain.noise.octaves, 8);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "name: tiny\nseed: 3\nunits:\n  moves_per_round: 4\neconomy:\n  metals: 99\n";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.seed, Some(3));
        assert_eq!(scenario.units.moves_per_round, 4);
        assert_eq!(scenario.units.cargo_capacity, 5);
        assert_eq!(scenario.economy.metals, 99);
        assert_eq!(scenario.economy.food, 50);
    }

    #[test]
    fn validation_rejects_degenerate_worlds() {
        let mut scenario = Scenario::default();
        scenario.world.tile_size = 0;
        assert!(scenario.validate().is_err());

        let mut scenario = Scenario::default();
        scenario.terrain.mountain_threshold = 1.5;
        assert!(scenario.validate().is_err());

        let mut scenario = Scenario::default();
        scenario.events.interval_rounds = 0;
        assert!(scenario.validate().is_err());
    }
}
