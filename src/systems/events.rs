use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::ColonyWorld,
};

pub struct EventSystem;

impl EventSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EventSystem {
    fn name(&self) -> &str {
        "events"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut ColonyWorld,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let (engine, mut targets) = world.event_parts();
        let triggered = engine.on_round(&mut targets, rng);
        world.report.event = triggered;
        Ok(())
    }
}
