use thiserror::Error;

use crate::deposits::ResourceKind;

/// Why a footprint was refused, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("footprint leaves the map")]
    OutOfBounds,
    #[error("terrain too steep to build on")]
    Terrain,
    #[error("site overlaps a {0} deposit")]
    ResourceConflict(ResourceKind),
    #[error("too close to another building")]
    BuildingConflict,
    #[error("too close to the base")]
    BaseConflict,
    #[error("must connect to the base or another building")]
    NotConnected,
}

/// A player command that was not applied. The message is shown as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Not enough resources")]
    NotEnoughResources,
    #[error("Invalid building spot: {0}")]
    InvalidPlacement(#[from] PlacementError),
    #[error("No moves left this round")]
    NoMovesLeft,
    #[error("Unit must be parked over a Vehicle Bay")]
    NotOverVehicleBay,
    #[error("Open a finished Vehicle Bay first")]
    NoVehicleBay,
    #[error("No unit selected")]
    NoUnitSelected,
    #[error("No Resources to Mine")]
    NoResourcesToMine,
    #[error("{0} Storage is Full")]
    StorageFull(&'static str),
    #[error("Nothing to refine")]
    CargoEmpty,
    #[error("No rover in range")]
    NoRoverInRange,
    #[error("Drone battery is empty")]
    DroneBatteryEmpty,
    #[error("Only drones can recharge rovers")]
    NotADrone,
    #[error("Select a farm first")]
    NotAFarm,
    #[error("Nothing to upgrade here")]
    NothingToUpgrade,
    #[error("Already at maximum level")]
    MaxLevel,
    #[error("No building selected for placement")]
    NoPlacementPending,
    #[error("Final round reached")]
    RoundLimitReached,
    #[error("Round could not advance: {0}")]
    RoundFailed(String),
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
}
