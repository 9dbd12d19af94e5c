use anyhow::Result;

use crate::{
    buildings::BuildingKind,
    economy::Counter,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct FarmSystem;

impl FarmSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FarmSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FarmSystem {
    fn name(&self) -> &str {
        "farm"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for building in world.buildings.iter_mut() {
            if !building.is_complete() {
                continue;
            }
            let label = building.label();
            let BuildingKind::Farm(farm) = &mut building.kind else {
                continue;
            };
            let water_cost = farm.water_per_round();
            if world.economy.water < water_cost {
                farm.halted = true;
                tracing::info!(farm = %label, needed = water_cost, "farm halted for lack of water");
                world
                    .report
                    .shortfalls
                    .push(format!("{label} halted: needs {water_cost} water"));
                continue;
            }
            farm.halted = false;
            let food = farm.food_per_round();
            world.economy.adjust(Counter::Water, -i64::from(water_cost));
            world.economy.adjust(Counter::Food, i64::from(food));
            world.report.food_produced += food;
            world.report.water_used_by_farms += water_cost;
        }
        Ok(())
    }
}
