mod consumption;
mod construction;
mod events;
mod farm;
mod housing;
mod mining;
mod movement;
mod power;

pub use consumption::ConsumptionSystem;
pub use construction::ConstructionSystem;
pub use events::EventSystem;
pub use farm::FarmSystem;
pub use housing::HousingSystem;
pub use mining::MiningSystem;
pub use movement::MoveResetSystem;
pub use power::PowerSystem;

use crate::engine::EngineBuilder;

/// Register the colony's round pipeline in its canonical order.
pub fn install(builder: EngineBuilder) -> EngineBuilder {
    builder
        .with_system(ConstructionSystem::new())
        .with_system(ConsumptionSystem::new())
        .with_system(FarmSystem::new())
        .with_system(PowerSystem::new())
        .with_system(HousingSystem::new())
        .with_system(MiningSystem::new())
        .with_system(MoveResetSystem::new())
        .with_system(EventSystem::new())
}
