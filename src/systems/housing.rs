use anyhow::Result;

use crate::{
    buildings::BuildingType,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct HousingSystem;

impl HousingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HousingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HousingSystem {
    fn name(&self) -> &str {
        "housing"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let capacity = world.colony_capacity();
        let houses = world.buildings.count_completed(BuildingType::Housing);
        for _ in 0..houses {
            if world.economy.population >= capacity || world.economy.food == 0 {
                break;
            }
            world.economy.population += 1;
            world.report.population_growth += 1;
        }
        Ok(())
    }
}
