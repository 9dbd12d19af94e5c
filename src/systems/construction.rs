use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct ConstructionSystem;

impl ConstructionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConstructionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ConstructionSystem {
    fn name(&self) -> &str {
        "construction"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for building in world.buildings.iter_mut() {
            if building.rounds_remaining == 0 {
                continue;
            }
            building.rounds_remaining -= 1;
            if building.rounds_remaining == 0 {
                tracing::info!(building = %building.label(), round = ctx.round, "construction finished");
                world.report.completed.push(building.id);
            }
        }
        Ok(())
    }
}
