use redcolony::{
    buildings::{BuildingKind, BuildingType},
    engine::Engine,
    events::EventEngine,
    spatial::{PixelPos, WorldGeometry},
    terrain::TerrainField,
    units::UnitKind,
    world::{ColonyRules, ColonyWorld},
    Scenario,
};

fn quiet_world() -> ColonyWorld {
    ColonyWorld::new(
        WorldGeometry::new(40, 40, 10),
        TerrainField::flat(40, 40, 0.2),
        ColonyRules::default(),
    )
    .with_events(EventEngine::new(1_000, 0))
}

fn engine() -> Engine {
    let mut scenario = Scenario::default();
    scenario.seed = Some(11);
    scenario.build_engine()
}

#[test]
fn round_consumption_matches_population() {
    let mut world = quiet_world();
    let mut engine = engine();

    let summary = engine.advance_round(&mut world).unwrap().expect("round advances");
    assert_eq!(summary.round, 2);
    assert_eq!(world.economy().food, 40);
    assert_eq!(world.economy().water, 25);
    assert_eq!(summary.report.food_consumed, 10);

    world.economy_mut().food = 1;
    let summary = engine.advance_round(&mut world).unwrap().expect("round advances");
    assert_eq!(world.economy().food, 0);
    assert_eq!(summary.report.food_consumed, 1);
    assert!(summary.report.shortfalls.iter().any(|s| s.contains("short of food")));
}

#[test]
fn advancing_at_the_cap_changes_nothing() {
    let mut world = quiet_world();
    world.economy_mut().rounds_total = 3;
    let mut engine = engine();

    let summaries = engine.run(&mut world, 10).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(world.economy().current_round, 3);

    let before = world.economy().clone();
    assert!(engine.advance_round(&mut world).unwrap().is_none());
    assert_eq!(world.economy(), &before);
}

#[test]
fn farm_produces_once_built_and_halts_without_water() {
    let mut world = quiet_world();
    let farm = world.add_building(2, 2, (2, 5), BuildingType::Farm).unwrap();
    assert!(!world.buildings().get(farm).unwrap().is_complete());
    let mut engine = engine();

    let first = engine.advance_round(&mut world).unwrap().unwrap();
    assert_eq!(first.report.completed, vec![farm]);
    assert_eq!(first.report.food_produced, 5);
    assert_eq!(first.report.water_used_by_farms, 2);
    assert_eq!(world.economy().food, 45);
    assert_eq!(world.economy().water, 23);

    world.economy_mut().water = 6;
    let second = engine.advance_round(&mut world).unwrap().unwrap();
    assert_eq!(second.report.food_produced, 0);
    assert_eq!(world.economy().water, 1);
    assert_eq!(
        second.report.shortfalls,
        vec![format!("Farm #{} halted: needs 2 water", farm.raw())]
    );
    let halted = world
        .buildings()
        .get(farm)
        .map(|b| matches!(&b.kind, BuildingKind::Farm(state) if state.halted));
    assert_eq!(halted, Some(true));
}

#[test]
fn finished_housing_grows_the_population() {
    let mut world = quiet_world();
    world.add_building(2, 2, (4, 4), BuildingType::Housing).unwrap();
    let mut engine = engine();

    let summary = engine.advance_round(&mut world).unwrap().unwrap();
    assert_eq!(summary.report.population_growth, 1);
    assert_eq!(world.economy().population, 6);
    assert_eq!(world.colony_capacity(), 15);
}

#[test]
fn power_generators_feed_the_grid_after_construction() {
    let mut world = quiet_world();
    world.add_building(2, 2, (3, 2), BuildingType::PowerGenerator).unwrap();
    let mut engine = engine();

    let summaries = engine.run(&mut world, 3).unwrap();
    let produced: Vec<u32> = summaries.iter().map(|s| s.report.power_produced).collect();
    assert_eq!(produced, vec![0, 3, 3]);
    assert_eq!(world.economy().power, 26);
}

#[test]
fn round_advance_restores_move_allowance() {
    let mut world = quiet_world();
    let rover = world.spawn_unit(UnitKind::Rover, PixelPos::new(50.0, 50.0));
    world.units_mut().get_mut(rover).unwrap().moves_remaining = 0;
    let mut engine = engine();

    engine.advance_round(&mut world).unwrap();
    assert_eq!(world.units().get(rover).unwrap().moves_remaining, 2);
}

#[test]
fn systems_run_in_pipeline_order() {
    assert_eq!(
        engine().system_names(),
        vec!["construction", "consumption", "farm", "power", "housing", "mining", "moves", "events"]
    );
}
