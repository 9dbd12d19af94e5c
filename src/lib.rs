pub mod actions;
pub mod buildings;
pub mod clock;
pub mod deposits;
pub mod economy;
pub mod engine;
pub mod error;
pub mod events;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod spatial;
pub mod systems;
pub mod terrain;
pub mod units;
pub mod world;

pub use actions::{Action, Panel, PointerButton};
pub use error::{PlacementError, Rejection};
pub use scenario::{Scenario, ScenarioLoader};
pub use session::{Colony, Outcome};
pub use world::{ColonySnapshot, ColonyWorld};
