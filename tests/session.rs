use redcolony::{
    buildings::{BuildingId, BuildingKind, BuildingType, Crop},
    deposits::{DepositLedger, ResourceKind},
    economy::Counter,
    events::EventEngine,
    spatial::{PixelPos, TilePos, WorldGeometry},
    terrain::TerrainField,
    units::UnitKind,
    world::{ColonyRules, ColonyWorld},
    Action, Colony, Outcome, Panel, PointerButton, Rejection, Scenario,
};

fn colony_over(deposits: DepositLedger) -> Colony {
    let world = ColonyWorld::new(
        WorldGeometry::new(60, 60, 10),
        TerrainField::flat(60, 60, 0.2),
        ColonyRules::default(),
    )
    .with_deposits(deposits)
    .with_events(EventEngine::new(1_000, 0));
    Colony::new(world, Scenario::default().build_engine())
}

fn open_colony() -> Colony {
    colony_over(DepositLedger::new())
}

fn advance(colony: &mut Colony, rounds: u32) {
    for _ in 0..rounds {
        colony.perform(Action::NextRound).expect("round advances");
    }
}

fn finished_bay(colony: &mut Colony) -> BuildingId {
    let bay = colony
        .place(BuildingType::VehicleBay, TilePos::new(10, 10), (5, 3))
        .expect("open ground");
    advance(colony, 3);
    bay
}

#[test]
fn menu_then_click_places_and_charges() {
    let mut colony = open_colony();
    assert_eq!(
        colony.perform_id("build_Housing"),
        Ok(Outcome::PlacementStarted(BuildingType::Housing))
    );
    assert_eq!(colony.world().economy().metals, 20);

    let placed = colony.pointer_down(PixelPos::new(105.0, 205.0), PointerButton::Left);
    assert!(matches!(placed, Ok(Outcome::Placed(_))));
    assert_eq!(colony.world().economy().metals, 15);
    assert_eq!(colony.notice(), Some("Placed Housing at 10,20"));
    assert!(colony.pending().is_none());
}

#[test]
fn unaffordable_building_is_refused_up_front() {
    let mut colony = open_colony();
    colony.world_mut().economy_mut().metals = 2;
    assert_eq!(
        colony.perform(Action::Build(BuildingType::Factory)),
        Err(Rejection::NotEnoughResources)
    );
    assert_eq!(colony.notice(), Some("Not enough resources"));
    assert!(colony.pending().is_none());
}

#[test]
fn vehicle_bay_sells_units_once_finished() {
    let mut colony = open_colony();
    let bay = colony
        .place(BuildingType::VehicleBay, TilePos::new(10, 10), (5, 3))
        .unwrap();
    let center = PixelPos::new(125.0, 115.0);

    assert_eq!(
        colony.pointer_down(center, PointerButton::Right),
        Ok(Outcome::PanelOpened(Panel::Building(bay)))
    );
    assert_eq!(colony.perform(Action::BuyRover), Err(Rejection::NoVehicleBay));

    advance(&mut colony, 3);
    let bought = colony.perform(Action::BuyRover);
    let Ok(Outcome::UnitBought(rover)) = bought else {
        panic!("expected a purchase, got {bought:?}");
    };
    assert_eq!(colony.world().economy().metals, 10);
    let unit = colony.world().units().get(rover).unwrap();
    assert_eq!(unit.kind, UnitKind::Rover);
    assert_eq!(unit.position, center);

    assert_eq!(
        colony.pointer_down(PixelPos::new(145.0, 105.0), PointerButton::Right),
        Ok(Outcome::PanelClosed)
    );
    assert_eq!(colony.panel(), None);
}

#[test]
fn refining_over_the_bay_credits_the_economy() {
    let mut colony = open_colony();
    finished_bay(&mut colony);
    let rover = colony
        .world_mut()
        .spawn_unit(UnitKind::Rover, PixelPos::new(300.0, 300.0));
    colony.world_mut().units_mut().get_mut(rover).unwrap().cargo.add(ResourceKind::Iron, 3);
    colony.select(rover).unwrap();

    assert_eq!(colony.perform(Action::Refine), Err(Rejection::NotOverVehicleBay));

    colony.world_mut().units_mut().get_mut(rover).unwrap().position = PixelPos::new(125.0, 115.0);
    let metals = colony.world().economy().metals;
    assert_eq!(
        colony.perform(Action::Refine),
        Ok(Outcome::Refined(vec![(Counter::Metals, 6)]))
    );
    assert_eq!(colony.world().economy().metals, metals + 6);
    assert!(colony.world().units().get(rover).unwrap().cargo.is_empty());
    assert_eq!(colony.perform(Action::Refine), Err(Rejection::CargoEmpty));
}

#[test]
fn moving_a_miner_needs_a_second_click() {
    let mut ledger = DepositLedger::new();
    ledger.insert(ResourceKind::Ice, vec![TilePos::new(30, 30), TilePos::new(31, 30)]);
    let mut colony = colony_over(ledger);
    let rover = colony
        .world_mut()
        .spawn_unit(UnitKind::Rover, PixelPos::new(305.0, 305.0));
    colony.select(rover).unwrap();
    assert!(matches!(colony.perform(Action::MineToggle), Ok(Outcome::MiningStarted(_))));

    let target = PixelPos::new(500.0, 305.0);
    assert_eq!(colony.command_move(rover, target), Ok(Outcome::MoveArmed(rover)));
    assert_eq!(colony.notice(), Some("This Rover is mining. Click again to move it."));
    let unit = colony.world().units().get(rover).unwrap();
    assert!(unit.is_mining());
    assert_eq!(unit.moves_remaining, 2);
    assert_eq!(unit.target, None);

    assert_eq!(colony.command_move(rover, target), Ok(Outcome::MoveSet(rover)));
    let unit = colony.world().units().get(rover).unwrap();
    assert!(!unit.is_mining());
    assert!(!unit.awaiting_move_confirmation);
    assert_eq!(unit.target, Some(target));
    assert_eq!(unit.moves_remaining, 1);
}

#[test]
fn drone_recharges_a_nearby_rover_until_released() {
    let mut colony = open_colony();
    let rover = colony
        .world_mut()
        .spawn_unit(UnitKind::Rover, PixelPos::new(320.0, 300.0));
    let drone = colony
        .world_mut()
        .spawn_unit(UnitKind::Drone, PixelPos::new(300.0, 300.0));
    colony.world_mut().units_mut().get_mut(rover).unwrap().battery = 50.0;

    colony.select(rover).unwrap();
    assert_eq!(colony.perform(Action::RechargeRover), Err(Rejection::NotADrone));

    colony.select(drone).unwrap();
    assert_eq!(
        colony.perform(Action::RechargeRover),
        Ok(Outcome::TransferStarted { drone, rover })
    );
    colony.tick(1.0);
    assert!((colony.world().units().get(rover).unwrap().battery - 55.0).abs() < 1e-9);
    assert!((colony.world().units().get(drone).unwrap().battery - 95.0).abs() < 1e-9);

    // a transferring drone ignores new targets
    assert_eq!(colony.command_move(drone, PixelPos::new(10.0, 10.0)), Ok(Outcome::Nothing));

    assert_eq!(colony.perform(Action::StopControl), Ok(Outcome::ControlReleased));
    assert!(!colony.world().units().get(drone).unwrap().is_transferring());
    assert!(!colony.world().units().get(rover).unwrap().is_transferring());
    assert_eq!(colony.selected(), None);
}

#[test]
fn a_rover_takes_power_from_one_drone_at_a_time() {
    let mut colony = open_colony();
    let rover = colony
        .world_mut()
        .spawn_unit(UnitKind::Rover, PixelPos::new(320.0, 300.0));
    let first = colony
        .world_mut()
        .spawn_unit(UnitKind::Drone, PixelPos::new(300.0, 300.0));
    let second = colony
        .world_mut()
        .spawn_unit(UnitKind::Drone, PixelPos::new(340.0, 300.0));
    colony.world_mut().units_mut().get_mut(rover).unwrap().battery = 20.0;

    colony.select(first).unwrap();
    assert_eq!(
        colony.perform(Action::RechargeRover),
        Ok(Outcome::TransferStarted { drone: first, rover })
    );
    colony.select(second).unwrap();
    assert_eq!(colony.perform(Action::RechargeRover), Err(Rejection::NoRoverInRange));

    let units = colony.world().units();
    assert_eq!(units.get(rover).unwrap().transfer_partner, Some(first));
    assert_eq!(units.get(first).unwrap().transfer_partner, Some(rover));
    assert_eq!(units.get(second).unwrap().transfer_partner, None);

    colony.tick(1.0);
    let units = colony.world().units();
    assert!((units.get(rover).unwrap().battery - 25.0).abs() < 1e-9);
    assert_eq!(units.get(second).unwrap().battery, 100.0);
}

#[test]
fn farms_upgrade_to_the_cap_and_switch_crops() {
    let mut colony = open_colony();
    let farm = colony
        .place(BuildingType::Farm, TilePos::new(2, 2), (2, 5))
        .unwrap();
    let center = PixelPos::new(30.0, 45.0);
    colony.pointer_down(center, PointerButton::Right).unwrap();
    assert_eq!(colony.perform(Action::Upgrade), Err(Rejection::NothingToUpgrade));

    advance(&mut colony, 2);
    assert_eq!(colony.perform(Action::Upgrade), Ok(Outcome::Upgraded { building: farm, level: 1 }));
    assert_eq!(colony.perform(Action::Upgrade), Ok(Outcome::Upgraded { building: farm, level: 2 }));
    assert_eq!(colony.perform(Action::Upgrade), Err(Rejection::MaxLevel));

    assert_eq!(colony.perform_id("grow_tomatoes"), Ok(Outcome::CropChanged(Crop::Tomatoes)));
    let crop = colony.world().buildings().get(farm).and_then(|b| match &b.kind {
        BuildingKind::Farm(state) => Some((state.crop, state.level)),
        _ => None,
    });
    assert_eq!(crop, Some((Crop::Tomatoes, 2)));
}

#[test]
fn crops_need_a_farm_panel() {
    let mut colony = open_colony();
    assert_eq!(colony.perform(Action::Grow(Crop::Carrots)), Err(Rejection::NotAFarm));
    assert_eq!(
        colony.perform_id("launch_rocket"),
        Err(Rejection::UnknownAction("launch_rocket".to_string()))
    );
}

#[test]
fn next_round_stops_at_the_final_round() {
    let mut colony = open_colony();
    colony.world_mut().economy_mut().rounds_total = 2;
    assert!(matches!(colony.perform(Action::NextRound), Ok(Outcome::RoundAdvanced(_))));
    assert_eq!(colony.perform(Action::NextRound), Err(Rejection::RoundLimitReached));
    assert_eq!(colony.notice(), Some("Final round reached"));
    assert_eq!(colony.world().economy().current_round, 2);
}
