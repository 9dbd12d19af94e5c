use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    units::MiningUpdate,
    world::ColonyWorld,
};

/// Settles mining countdowns that came due on the wall channel.
pub struct MiningSystem;

impl MiningSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MiningSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MiningSystem {
    fn name(&self) -> &str {
        "mining"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut ColonyWorld,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let interval = world.rules.units.mine_interval_seconds;
        for unit in world.units.iter_mut() {
            if let MiningUpdate::Mined { kind, amount } =
                unit.update_mining(ctx.wall_time, interval, &world.geometry, &mut world.deposits)
            {
                world.report.mined.push((unit.id, kind, amount));
            }
        }
        Ok(())
    }
}
