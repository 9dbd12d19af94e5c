use redcolony::{
    buildings::{Base, BuildingType},
    deposits::ResourceKind,
    economy::NO_EVENT,
    events::{EventEngine, EventKind, EventPhase},
    spatial::{Footprint, TilePos, WorldGeometry},
    terrain::TerrainField,
    world::{ColonyRules, ColonyWorld},
    Colony, Scenario,
};

fn world_with_events(events: EventEngine) -> ColonyWorld {
    ColonyWorld::new(
        WorldGeometry::new(30, 30, 10),
        TerrainField::flat(30, 30, 0.3),
        ColonyRules::default(),
    )
    .with_events(events)
}

#[test]
fn five_rounds_trigger_exactly_one_event() {
    let mut world = world_with_events(EventEngine::new(5, 120));
    let mut scenario = Scenario::default();
    scenario.seed = Some(5);
    let mut engine = scenario.build_engine();

    let summaries = engine.run(&mut world, 5).unwrap();
    let triggered: Vec<EventKind> = summaries.iter().filter_map(|s| s.report.event).collect();
    assert_eq!(triggered.len(), 1);
    assert_eq!(summaries[4].report.event, triggered.first().copied());
    assert_eq!(world.events().active(), triggered.first().copied());
    assert_eq!(world.economy().current_event, triggered[0].title());
}

#[test]
fn rounds_during_display_do_not_count() {
    let mut world = world_with_events(EventEngine::with_catalog(2, 120, vec![EventKind::DustStorm]));
    let mut engine = Scenario::default().build_engine();

    let summaries = engine.run(&mut world, 6).unwrap();
    let fired = summaries.iter().filter(|s| s.report.event.is_some()).count();
    assert_eq!(fired, 1);
    assert!(matches!(world.events().phase(), EventPhase::EventActive { .. }));
}

#[test]
fn display_ticks_return_the_engine_to_dormant() {
    let world = world_with_events(EventEngine::with_catalog(1, 3, vec![EventKind::DustStorm]));
    let mut colony = Colony::new(world, Scenario::default().build_engine());

    colony.advance_round().unwrap();
    assert_eq!(colony.world().events().active(), Some(EventKind::DustStorm));
    assert_eq!(colony.world().economy().current_event, EventKind::DustStorm.title());

    for _ in 0..2 {
        colony.tick(1.0 / 60.0);
    }
    assert!(colony.world().events().active().is_some());
    colony.tick(1.0 / 60.0);
    assert_eq!(colony.world().events().phase(), EventPhase::Dormant);
    assert_eq!(colony.world().economy().current_event, NO_EVENT);
    assert_eq!(colony.world().events().rounds_since(), 0);
}

#[test]
fn meteor_rock_never_lands_on_the_base_or_buildings() {
    let mut landed = 0;
    for seed in 0..40 {
        let mut world = ColonyWorld::new(
            WorldGeometry::new(16, 16, 10),
            TerrainField::flat(16, 16, 0.3),
            ColonyRules::default(),
        )
        .with_base(Some(Base::new(TilePos::new(5, 5), 2)))
        .with_events(EventEngine::with_catalog(1, 0, vec![EventKind::MeteorShower]));
        world.add_building(9, 9, (4, 4), BuildingType::Generic).unwrap();
        let mut scenario = Scenario::default();
        scenario.seed = Some(seed);
        let mut engine = scenario.build_engine();

        engine.run(&mut world, 3).unwrap();

        let mut zones: Vec<&dyn Footprint> = world.buildings().iter().map(|b| b as &dyn Footprint).collect();
        zones.extend(world.base().map(|b| b as &dyn Footprint));
        for deposit in world.deposits().iter() {
            assert_eq!(deposit.kind, ResourceKind::Rock);
            for tile in &deposit.positions {
                landed += 1;
                assert!(
                    zones.iter().all(|z| !z.occupies(*tile) && !z.outline_contains(*tile)),
                    "seed {seed}: rock at {tile:?} sits on a structure"
                );
            }
        }
    }
    assert!(landed > 0);
}
