use hamlet::{
    building::BuildingKind,
    default_engine,
    economy::Stockpile,
    grid::{Cell, Grid, WorldPos},
    technology::Age,
    units::UnitKind,
    villager::VillagerState,
    CommandError, Engine, EngineSettings, EventKind, World,
};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, Engine, World) {
    let temp = tempdir().expect("tempdir");
    let engine = default_engine(EngineSettings {
        scenario_name: "production".into(),
        seed: 9,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
    });
    let mut world = World::new(Grid::new(16, 16, 64.0, 32.0), 100);
    world.economy.stockpile = Stockpile::new(1_000, 1_000, 1_000, 1_000);
    (temp, engine, world)
}

fn town_center(world: &mut World) -> hamlet::EntityId {
    world
        .spawn_building(BuildingKind::TownCenter, Cell::new(4, 4), true)
        .expect("town center placed")
}

#[test]
fn villager_is_trained_after_five_seconds() {
    let (_temp, mut engine, mut world) = setup();
    let tc = town_center(&mut world);
    world.queue_unit(tc, UnitKind::Villager).expect("queued");
    assert_eq!(world.economy.stockpile.food, 950);
    assert_eq!(world.economy.queued_units, 1);

    for _ in 0..49 {
        let summary = engine.step(&mut world).expect("step");
        assert!(summary.events.is_empty());
    }
    assert_eq!(world.economy.population, 0);

    let summary = engine.step(&mut world).expect("step");
    let created = summary.events.iter().find_map(|e| match e.kind {
        EventKind::UnitCreated { unit, kind, .. } => Some((unit, kind)),
        _ => None,
    });
    let (unit, kind) = created.expect("unit created on tick 50");
    assert_eq!(kind, UnitKind::Villager);
    assert_eq!(summary.tick, 50);
    assert_eq!(world.economy.population, 1);
    assert_eq!(world.economy.queued_units, 0);
    let spawned = world.villager(unit).expect("villager exists");
    assert!(world.grid().is_walkable(world.grid().to_cartesian(spawned.position())));
}

#[test]
fn queue_respects_the_population_cap() {
    let (_temp, _engine, mut world) = setup();
    let tc = town_center(&mut world);
    for _ in 0..4 {
        world.spawn_villager(WorldPos::default());
    }
    world.queue_unit(tc, UnitKind::Villager).expect("fifth slot free");
    let food = world.economy.stockpile.food;
    assert_eq!(
        world.queue_unit(tc, UnitKind::Villager),
        Err(CommandError::PopulationCapped(5))
    );
    assert_eq!(world.economy.stockpile.food, food);
    assert_eq!(world.building(tc).unwrap().queued_units(), 1);
}

#[test]
fn barracks_trains_militia_but_not_villagers() {
    let (_temp, mut engine, mut world) = setup();
    town_center(&mut world);
    let barracks = world
        .spawn_building(BuildingKind::Barracks, Cell::new(8, 8), true)
        .expect("barracks placed");
    assert!(matches!(
        world.queue_unit(barracks, UnitKind::Villager),
        Err(CommandError::CannotTrain { .. })
    ));
    world.queue_unit(barracks, UnitKind::Militia).expect("queued");
    assert_eq!(world.economy.stockpile.gold, 980);

    engine.run(&mut world, 60).expect("run");
    assert_eq!(world.soldier_ids().len(), 1);
}

#[test]
fn loom_toughens_current_and_future_villagers() {
    let (_temp, mut engine, mut world) = setup();
    let tc = town_center(&mut world);
    let old = world.spawn_villager(WorldPos::default());
    world.queue_research(tc, "loom").expect("queued");
    assert_eq!(world.economy.stockpile.gold, 950);
    assert!(world.tech.is_pending("loom"));

    let mut researched_on = None;
    engine
        .run_with_hook(&mut world, 30, |summary| {
            if summary
                .events
                .iter()
                .any(|e| matches!(&e.kind, EventKind::TechResearched { tech_id } if tech_id == "loom"))
            {
                researched_on = Some(summary.tick);
            }
        })
        .expect("run");
    assert_eq!(researched_on, Some(30));
    assert!(world.tech.is_researched("loom"));
    assert!(!world.tech.is_pending("loom"));

    let combat = &world.villager(old).unwrap().combat;
    assert_eq!((combat.hp, combat.max_hp), (40, 40));

    let young = world.spawn_villager(WorldPos::default());
    assert_eq!(world.villager(young).unwrap().combat.max_hp, 40);

    assert_eq!(
        world.queue_research(tc, "loom"),
        Err(CommandError::AlreadyResearched("loom".into()))
    );
}

#[test]
fn feudal_age_unlocks_wheelbarrow() {
    let (_temp, mut engine, mut world) = setup();
    let tc = town_center(&mut world);
    let villager = world.spawn_villager(WorldPos::default());

    assert!(matches!(
        world.queue_research(tc, "wheelbarrow"),
        Err(CommandError::MissingPrerequisite { missing: "feudal_age", .. })
    ));
    world.queue_research(tc, "feudal_age").expect("queued");
    assert_eq!(
        world.queue_research(tc, "feudal_age"),
        Err(CommandError::AlreadyQueued("feudal_age".into()))
    );

    let mut advanced = false;
    engine
        .run_with_hook(&mut world, 50, |summary| {
            advanced |= summary
                .events
                .iter()
                .any(|e| matches!(e.kind, EventKind::AgeAdvanced { age: Age::Feudal }));
        })
        .expect("run");
    assert!(advanced);
    assert_eq!(world.tech.age, Age::Feudal);

    world.queue_research(tc, "wheelbarrow").expect("queued");
    engine.run(&mut world, 75).expect("run");
    assert_eq!(world.villager(villager).unwrap().carry_capacity, 15);
}

#[test]
fn construction_raises_housing_when_finished() {
    let (_temp, mut engine, mut world) = setup();
    town_center(&mut world);
    world.economy.stockpile = Stockpile::new(50, 0, 0, 0);
    let builder = world.spawn_villager(world.grid().to_iso(Cell::new(10, 9)));
    let house = world
        .place_building(BuildingKind::House, Cell::new(10, 10), &[builder])
        .expect("placed");
    assert_eq!(world.economy.stockpile.wood, 0);
    assert_eq!(world.building(house).unwrap().hp(), 1);
    assert!(!world.grid().is_walkable(Cell::new(10, 10)));

    engine.run(&mut world, 50).expect("run");
    let hp = world.building(house).unwrap().hp();
    assert!(hp > 1 && hp < 1_000);
    assert_eq!(world.economy.population_cap, 5);
    assert_eq!(world.villager(builder).unwrap().state(), VillagerState::Building);

    let mut finished_on = None;
    engine
        .run_with_hook(&mut world, 100, |summary| {
            if summary
                .events
                .iter()
                .any(|e| matches!(e.kind, EventKind::ConstructionComplete { building, .. } if building == house))
            {
                finished_on = Some(summary.tick);
            }
        })
        .expect("run");
    assert!(finished_on.is_some());
    let done = world.building(house).unwrap();
    assert!(done.is_completed());
    assert_eq!(done.hp(), 1_000);
    assert_eq!(world.economy.population_cap, 10);
    assert_eq!(world.villager(builder).unwrap().state(), VillagerState::Idle);
}

#[test]
fn unfinished_buildings_cannot_produce() {
    let (_temp, _engine, mut world) = setup();
    let barracks = world
        .place_building(BuildingKind::Barracks, Cell::new(6, 6), &[])
        .expect("placed");
    assert_eq!(
        world.queue_unit(barracks, UnitKind::Militia),
        Err(CommandError::NotCompleted(barracks.raw()))
    );
}
