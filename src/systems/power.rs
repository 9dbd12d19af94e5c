use anyhow::Result;

use crate::{
    buildings::BuildingKind,
    economy::Counter,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct PowerSystem;

impl PowerSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PowerSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PowerSystem {
    fn name(&self) -> &str {
        "power"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let produced: u32 = world
            .buildings
            .iter()
            .filter(|b| b.is_complete())
            .filter_map(|b| match &b.kind {
                BuildingKind::PowerGenerator(generator) => Some(generator.output().round() as u32),
                _ => None,
            })
            .sum();
        world.economy.adjust(Counter::Power, i64::from(produced));
        world.report.power_produced = produced;
        Ok(())
    }
}
