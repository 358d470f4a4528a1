use hamlet::{
    animal::AnimalKind,
    building::BuildingKind,
    default_engine,
    grid::{Cell, Grid},
    units::UnitKind,
    Engine, EngineSettings, EventKind, World,
};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, Engine, World) {
    let temp = tempdir().expect("tempdir");
    let engine = default_engine(EngineSettings {
        scenario_name: "combat".into(),
        seed: 21,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
    });
    let world = World::new(Grid::new(16, 16, 64.0, 32.0), 100);
    (temp, engine, world)
}

#[test]
fn militia_kills_a_boar_that_fights_back() {
    let (_temp, mut engine, mut world) = setup();
    let boar = world.spawn_animal(AnimalKind::Boar, Cell::new(5, 5));
    let soldier = world.spawn_soldier(UnitKind::Militia, world.grid().to_iso(Cell::new(5, 5)));
    world.attack_target(soldier, boar).expect("attack accepted");

    let mut killed_on = None;
    let mut last_boar_hp = world.animal(boar).unwrap().hp();
    for _ in 0..200 {
        let summary = engine.step(&mut world).expect("step");
        let hp = world.animal(boar).map_or(0, |a| a.hp());
        assert!(hp <= last_boar_hp, "boar healed");
        last_boar_hp = hp;
        if summary
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::AnimalKilled { animal, .. } if animal == boar))
        {
            killed_on = Some(summary.tick);
            break;
        }
    }

    // 13 swings of 6 damage, one per second starting on the first tick.
    assert_eq!(killed_on, Some(121));
    let survivor = world.soldier(soldier).expect("militia survives");
    assert!(survivor.combat.hp > 0 && survivor.combat.hp < 60);

    let carcass = world.animal(boar).expect("carcass lingers");
    assert_eq!(carcass.food(), 200);
    engine.run(&mut world, 101).expect("run");
    assert!(world.animal(boar).is_none());
}

#[test]
fn militia_kills_an_undefended_villager() {
    let (_temp, mut engine, mut world) = setup();
    world.spawn_building(BuildingKind::TownCenter, Cell::new(1, 1), true);
    let at = world.grid().to_iso(Cell::new(8, 8));
    let villager = world.spawn_villager(at);
    let soldier = world.spawn_soldier(UnitKind::Militia, at);
    assert_eq!(world.economy.population, 2);
    world.attack_target(soldier, villager).expect("attack accepted");

    let mut killed = false;
    engine
        .run_with_hook(&mut world, 60, |summary| {
            killed |= summary.events.iter().any(|e| {
                matches!(e.kind, EventKind::UnitKilled { unit, kind: UnitKind::Villager } if unit == villager)
            });
        })
        .expect("run");

    assert!(killed);
    assert!(world.villager(villager).is_none());
    assert_eq!(world.economy.population, 1);
    assert!(world.soldier(soldier).unwrap().target().is_none());
}

#[test]
fn chasing_soldier_runs_down_a_deer() {
    let (_temp, mut engine, mut world) = setup();
    let deer = world.spawn_animal(AnimalKind::Deer, Cell::new(12, 12));
    let soldier = world.spawn_soldier(UnitKind::Militia, world.grid().to_iso(Cell::new(2, 2)));
    world.attack_target(soldier, deer).expect("attack accepted");

    let mut killed = false;
    engine
        .run_with_hook(&mut world, 200, |summary| {
            killed |= summary
                .events
                .iter()
                .any(|e| matches!(e.kind, EventKind::AnimalKilled { animal, kind: AnimalKind::Deer } if animal == deer));
        })
        .expect("run");
    assert!(killed);
}

#[test]
fn foundations_fall_to_a_single_blow() {
    let (_temp, mut engine, mut world) = setup();
    world.economy.stockpile.wood = 50;
    let house = world
        .place_building(BuildingKind::House, Cell::new(6, 6), &[])
        .expect("placed");
    let soldier = world.spawn_soldier(UnitKind::Militia, world.grid().to_iso(Cell::new(6, 5)));
    world.attack_target(soldier, house).expect("attack accepted");

    let summary = engine.step(&mut world).expect("step");
    assert!(summary
        .events
        .iter()
        .any(|e| matches!(e.kind, EventKind::BuildingDestroyed { building, .. } if building == house)));
    assert!(world.building(house).is_none());
    assert!(world.grid().is_walkable(Cell::new(6, 6)));
}

#[test]
fn militia_closes_in_before_striking_from_a_far_diagonal() {
    let (_temp, mut engine, mut world) = setup();
    let villager = world.spawn_villager(world.grid().to_iso(Cell::new(4, 2)));
    let start = world.grid().to_iso(Cell::new(3, 3));
    let soldier = world.spawn_soldier(UnitKind::Militia, start);
    let victim_at = world.villager(villager).unwrap().position();
    let range = world.soldier(soldier).unwrap().combat.range;
    assert!(start.distance(victim_at) > range);
    world.attack_target(soldier, villager).expect("attack accepted");

    let full_hp = world.villager(villager).unwrap().combat.hp;
    engine.step(&mut world).expect("step");
    assert_eq!(world.villager(villager).unwrap().combat.hp, full_hp);
    assert!(world.soldier(soldier).unwrap().mover.is_moving());

    let mut struck_from = None;
    for _ in 0..20 {
        engine.step(&mut world).expect("step");
        if world.villager(villager).unwrap().combat.hp < full_hp {
            struck_from = Some(world.soldier(soldier).unwrap().position());
            break;
        }
    }
    let struck_from = struck_from.expect("militia never struck");
    assert!(struck_from.distance(victim_at) <= range);
}
