use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct ConsumptionSystem;

impl ConsumptionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsumptionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ConsumptionSystem {
    fn name(&self) -> &str {
        "consumption"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let due_food = world.economy.population.saturating_mul(world.economy.rates.food);
        let (food, water) = world.economy.consume();
        if food < due_food {
            world
                .report
                .shortfalls
                .push(format!("Colony short of food: needed {due_food}, had {food}"));
        }
        world.report.food_consumed = food;
        world.report.water_consumed = water;
        Ok(())
    }
}
