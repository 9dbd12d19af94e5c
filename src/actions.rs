//! Commands arriving from the presentation layer.

use std::str::FromStr;

use serde::Serialize;

use crate::buildings::{BuildingId, BuildingType, Crop};
use crate::error::Rejection;
use crate::units::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// The inspection panel currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Panel {
    Unit(UnitId),
    Base,
    Building(BuildingId),
}

/// Semantic action behind a button. Parsed from the ids the UI emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Close,
    Build(BuildingType),
    BuyRover,
    BuyDrone,
    NextRound,
    StopControl,
    Refine,
    RechargeRover,
    MineToggle,
    Upgrade,
    Grow(Crop),
}

impl FromStr for Action {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "close" => Action::Close,
            "buy_rover" => Action::BuyRover,
            "buy_drone" => Action::BuyDrone,
            "next_round" => Action::NextRound,
            "stop_control" => Action::StopControl,
            "refine" => Action::Refine,
            "recharge_rover" => Action::RechargeRover,
            "mine_toggle" => Action::MineToggle,
            "upgrade" => Action::Upgrade,
            other => {
                if let Some(name) = other.strip_prefix("build_") {
                    let building = name
                        .parse::<BuildingType>()
                        .map_err(|_| Rejection::UnknownAction(other.to_string()))?;
                    Action::Build(building)
                } else if let Some(name) = other.strip_prefix("grow_") {
                    let crop = Crop::from_name(name).ok_or_else(|| Rejection::UnknownAction(other.to_string()))?;
                    Action::Grow(crop)
                } else {
                    return Err(Rejection::UnknownAction(other.to_string()));
                }
            }
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_button_ids() {
        assert_eq!("next_round".parse::<Action>(), Ok(Action::NextRound));
        assert_eq!(
            "build_Power Generator".parse::<Action>(),
            Ok(Action::Build(BuildingType::PowerGenerator))
        );
        assert_eq!("build_farm".parse::<Action>(), Ok(Action::Build(BuildingType::Farm)));
        assert_eq!("grow_Tomatoes".parse::<Action>(), Ok(Action::Grow(Crop::Tomatoes)));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(
            "build_Spaceport".parse::<Action>(),
            Err(Rejection::UnknownAction("build_Spaceport".into()))
        );
        assert!("dance".parse::<Action>().is_err());
    }
}
