use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct MoveResetSystem;

impl MoveResetSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MoveResetSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MoveResetSystem {
    fn name(&self) -> &str {
        "moves"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let moves = world.rules.units.moves_per_round;
        world.units.reset_moves(moves);
        Ok(())
    }
}
