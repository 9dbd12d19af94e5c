use anyhow::Result;
use serde::Serialize;

use crate::{
    economy::EconomyState,
    rng::{RngManager, SystemRng},
    world::{ColonyWorld, RoundReport},
};

pub struct EngineSettings {
    pub scenario_name: String,
    /// `None` draws the master seed from OS entropy.
    pub seed: Option<u64>,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::from_optional_seed(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
        }
    }
}

/// Runs the round-advance pipeline: every system, in registration order,
/// once per round.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    /// Advance one round. At the final round nothing runs and `None` is returned.
    pub fn advance_round(&mut self, world: &mut ColonyWorld) -> Result<Option<RoundSummary>> {
        if !world.economy.next_round() {
            tracing::debug!(round = world.economy.current_round, "round cap reached");
            return Ok(None);
        }
        let round = world.economy.current_round;
        world.report = RoundReport::new(round);
        let ctx = SystemContext {
            round,
            wall_time: world.clock.now(),
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut rng_stream)?;
        }
        tracing::info!(
            round,
            food = world.economy.food,
            water = world.economy.water,
            power = world.economy.power,
            population = world.economy.population,
            "round advanced"
        );
        Ok(Some(RoundSummary {
            round,
            report: world.report.clone(),
            economy: world.economy.clone(),
        }))
    }

    /// Advance up to `rounds` rounds, stopping early at the cap.
    pub fn run(&mut self, world: &mut ColonyWorld, rounds: u32) -> Result<Vec<RoundSummary>> {
        let mut summaries = Vec::new();
        for _ in 0..rounds {
            match self.advance_round(world)? {
                Some(summary) => summaries.push(summary),
                None => break,
            }
        }
        Ok(summaries)
    }

    /// The stream source, for setup work outside the pipeline.
    pub fn rng_mut(&mut self) -> &mut RngManager {
        &mut self.rng
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub report: RoundReport,
    pub economy: EconomyState,
}

pub struct SystemContext<'a> {
    pub round: u32,
    /// Wall-channel seconds at the moment the round advanced.
    pub wall_time: f64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut ColonyWorld,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
