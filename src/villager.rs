//! Villager behaviour.
//!
//! A villager holds at most one task (gather, build or hunt) as a handle
//! into the world's tables. Every update re-resolves that handle, so a
//! target that disappeared between ticks simply sends the villager idle.
//!
//! | state     | leaves when                                                 |
//! |-----------|-------------------------------------------------------------|
//! | moving    | path done: in reach of the task target, else idle           |
//! | gathering | load full or node empty: returning; node gone: idle         |
//! | hunting   | kill: returning with the food; quarry lost: idle            |
//! | returning | dropped off: back to the node if it still exists, else idle |
//! | building  | construction finished or building gone: idle                |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{engage, Combatant, Damage, Damageable, Engagement, Target};
use crate::economy::ResourceKind;
use crate::grid::{Grid, WorldPos};
use crate::movement::Mover;
use crate::units::{self, work, UnitKind};
use crate::world::{EntityId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VillagerState {
    #[default]
    Idle,
    Moving,
    Gathering,
    Returning,
    Building,
    Hunting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", content = "id", rename_all = "snake_case")]
pub enum Task {
    Gather(EntityId),
    Build(EntityId),
    Hunt(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carried {
    pub kind: ResourceKind,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Villager {
    pub mover: Mover,
    pub combat: Combatant,
    pub carry_capacity: u32,
    pub gather_rate: u32,
    pub build_rate: f32,
    /// Preferred drop-off site.
    pub home: Option<EntityId>,
    state: VillagerState,
    task: Option<Task>,
    carried: Option<Carried>,
    work_timer_ms: u64,
}

impl Villager {
    pub fn new(position: WorldPos) -> Self {
        let def = units::definition(UnitKind::Villager);
        Self {
            mover: Mover::new(position, def.speed),
            combat: Combatant::new(def.max_hp, def.attack, def.range, def.cooldown_ms),
            carry_capacity: work::CARRY_CAPACITY,
            gather_rate: work::GATHER_RATE,
            build_rate: work::BUILD_RATE,
            home: None,
            state: VillagerState::Idle,
            task: None,
            carried: None,
            work_timer_ms: 0,
        }
    }

    pub fn state(&self) -> VillagerState {
        self.state
    }

    pub fn task(&self) -> Option<Task> {
        self.task
    }

    pub fn carried(&self) -> Option<Carried> {
        self.carried
    }

    pub fn carried_amount(&self) -> u32 {
        self.carried.map_or(0, |c| c.amount)
    }

    pub fn position(&self) -> WorldPos {
        self.mover.position
    }

    fn room(&self) -> u32 {
        self.carry_capacity.saturating_sub(self.carried_amount())
    }

    fn set_task(&mut self, task: Option<Task>) {
        self.task = task;
        self.work_timer_ms = 0;
        self.combat.target = match task {
            Some(Task::Hunt(animal)) => Some(Target::Animal(animal)),
            _ => None,
        };
    }

    fn go_idle(&mut self) {
        self.set_task(None);
        self.state = VillagerState::Idle;
        self.mover.stop();
    }

    /// Head towards `dest`, or stand still when already within `reach`.
    fn approach(&mut self, grid: &Grid, dest: WorldPos, reach: f32) -> bool {
        if in_reach(grid, self.mover.position, dest, reach) {
            self.mover.stop();
            return true;
        }
        self.mover.move_to(grid, dest)
    }

    /// Plain move order; drops whatever task was running.
    pub fn order_move(&mut self, grid: &Grid, dest: WorldPos) -> bool {
        if !self.mover.move_to(grid, dest) {
            return false;
        }
        self.set_task(None);
        self.state = VillagerState::Moving;
        true
    }

    /// Switching to a different resource kind discards the current load.
    pub fn order_gather(&mut self, grid: &Grid, node: EntityId, kind: ResourceKind, at: WorldPos) -> bool {
        if !self.approach(grid, at, work::GATHER_REACH) {
            return false;
        }
        if self.carried.is_some_and(|c| c.kind != kind) {
            self.carried = None;
        }
        self.set_task(Some(Task::Gather(node)));
        self.state = VillagerState::Moving;
        true
    }

    pub fn order_build(&mut self, grid: &Grid, building: EntityId, at: WorldPos) -> bool {
        if !self.approach(grid, at, work::BUILD_REACH) {
            return false;
        }
        self.set_task(Some(Task::Build(building)));
        self.state = VillagerState::Moving;
        true
    }

    /// Hunting chases on its own, so there is no moving phase. A load other
    /// than food is dropped, as when switching gather kinds.
    pub fn order_hunt(&mut self, animal: EntityId) {
        self.mover.stop();
        if self.carried.is_some_and(|c| c.kind != ResourceKind::Food) {
            self.carried = None;
        }
        self.set_task(Some(Task::Hunt(animal)));
        self.state = VillagerState::Hunting;
    }
}

impl Damageable for Villager {
    fn take_damage(&mut self, amount: u32, _attacker: Option<Target>) -> Damage {
        self.combat.take_damage(amount)
    }

    fn is_dead(&self) -> bool {
        self.combat.is_dead()
    }

    fn position(&self) -> WorldPos {
        self.mover.position
    }
}

/// Buildings block their own tile, so they are reached from any touching
/// tile; nodes and animals need plain distance.
fn in_reach(grid: &Grid, from: WorldPos, to: WorldPos, reach: f32) -> bool {
    if grid.is_blocked(grid.to_cartesian(to)) {
        grid.within_reach(from, to, reach)
    } else {
        from.distance(to) <= reach
    }
}

/// One tick for the villager `id`, which the caller has taken out of the
/// world's table for the duration of the call.
pub fn update(world: &mut World, id: EntityId, villager: &mut Villager, dt_ms: u64) {
    villager.mover.advance(dt_ms);
    match villager.state {
        VillagerState::Idle => {}
        VillagerState::Moving => update_moving(world, villager),
        VillagerState::Gathering => update_gathering(world, id, villager, dt_ms),
        VillagerState::Hunting => update_hunting(world, id, villager),
        VillagerState::Returning => update_returning(world, id, villager),
        VillagerState::Building => update_building(world, villager, dt_ms),
    }
}

fn update_moving(world: &World, villager: &mut Villager) {
    if villager.mover.is_moving() {
        return;
    }
    let grid = world.grid();
    let here = villager.mover.position;
    match villager.task {
        None => villager.state = VillagerState::Idle,
        Some(Task::Gather(node)) => match world.resource(node) {
            Some(res) if here.distance(res.position) <= work::GATHER_REACH => {
                villager.state = VillagerState::Gathering;
                villager.work_timer_ms = 0;
            }
            _ => villager.go_idle(),
        },
        Some(Task::Build(building)) => match world.building(building) {
            Some(b) if !b.is_completed() && in_reach(grid, here, b.position, work::BUILD_REACH) => {
                villager.state = VillagerState::Building;
                villager.work_timer_ms = 0;
            }
            _ => villager.go_idle(),
        },
        Some(Task::Hunt(_)) => {
            villager.state = VillagerState::Hunting;
            villager.work_timer_ms = 0;
        }
    }
}

fn update_gathering(world: &mut World, id: EntityId, villager: &mut Villager, dt_ms: u64) {
    let Some(Task::Gather(node_id)) = villager.task else {
        villager.go_idle();
        return;
    };
    let room = villager.room();
    let Some(node) = world.resource_mut(node_id) else {
        villager.go_idle();
        return;
    };
    if node.is_empty() {
        villager.go_idle();
        return;
    }

    villager.work_timer_ms += dt_ms;
    if villager.work_timer_ms < work::INTERVAL_MS {
        return;
    }
    villager.work_timer_ms = 0;

    let kind = node.kind;
    let taken = node.withdraw(villager.gather_rate.min(room));
    let depleted = node.is_empty();
    let carried = villager.carried.get_or_insert(Carried { kind, amount: 0 });
    carried.amount += taken;
    debug!(tick = world.tick(), villager = id.raw(), taken, "gathered");

    if depleted {
        world.deplete_resource(node_id);
    }
    if depleted || villager.carried_amount() >= villager.carry_capacity {
        begin_return(world, villager);
    }
}

fn update_hunting(world: &mut World, id: EntityId, villager: &mut Villager) {
    let Some(Task::Hunt(animal_id)) = villager.task else {
        villager.go_idle();
        return;
    };
    let outcome = engage(
        world,
        Target::Villager(id),
        &mut villager.combat,
        &mut villager.mover,
        Target::Animal(animal_id),
    );
    match outcome {
        Engagement::Struck(Damage::Killed) => {
            let food = world.animal_mut(animal_id).map_or(0, |a| a.take_food());
            let taken = food.min(villager.room());
            match villager.carried.as_mut() {
                Some(c) if c.kind == ResourceKind::Food => c.amount += taken,
                _ => {
                    villager.carried = Some(Carried {
                        kind: ResourceKind::Food,
                        amount: taken,
                    })
                }
            }
            debug!(tick = world.tick(), villager = id.raw(), food = taken, "hunt finished");
            begin_return(world, villager);
        }
        Engagement::Lost | Engagement::Unreachable | Engagement::Struck(Damage::Ignored) => {
            villager.go_idle();
        }
        Engagement::Struck(Damage::Hit(_)) | Engagement::Cooling | Engagement::Chasing => {}
    }
}

/// Start walking the load home. Without anywhere to drop it off the
/// villager drops the task but keeps what it carries.
fn begin_return(world: &World, villager: &mut Villager) {
    let Some((site, at)) = world.drop_site(villager.home, villager.mover.position) else {
        villager.go_idle();
        return;
    };
    villager.home = Some(site);
    if villager.approach(world.grid(), at, work::DROP_OFF_REACH) {
        villager.state = VillagerState::Returning;
    } else {
        villager.go_idle();
    }
}

fn update_returning(world: &mut World, id: EntityId, villager: &mut Villager) {
    if villager.mover.is_moving() {
        return;
    }
    let Some((site, at)) = world.drop_site(villager.home, villager.mover.position) else {
        villager.go_idle();
        return;
    };
    villager.home = Some(site);

    if !in_reach(world.grid(), villager.mover.position, at, work::DROP_OFF_REACH) {
        if !villager.mover.move_to(world.grid(), at) {
            villager.go_idle();
        }
        return;
    }

    if let Some(load) = villager.carried.take() {
        world.deposit(id, load.kind, load.amount);
    }

    let next = match villager.task {
        Some(Task::Gather(node)) => world.resource(node).map(|n| (n.kind, n.position, node)),
        _ => None,
    };
    match next {
        Some((kind, at, node)) => {
            if !villager.order_gather(world.grid(), node, kind, at) {
                villager.go_idle();
            }
        }
        None => villager.go_idle(),
    }
}

fn update_building(world: &mut World, villager: &mut Villager, dt_ms: u64) {
    let Some(Task::Build(building_id)) = villager.task else {
        villager.go_idle();
        return;
    };
    match world.building(building_id) {
        Some(b) if !b.is_completed() => {}
        _ => {
            villager.go_idle();
            return;
        }
    }

    villager.work_timer_ms += dt_ms;
    if villager.work_timer_ms < work::INTERVAL_MS {
        return;
    }
    villager.work_timer_ms = 0;
    if world.construct_building(building_id, villager.build_rate) {
        villager.go_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::AnimalKind;
    use crate::building::BuildingKind;
    use crate::grid::Cell;

    fn world() -> World {
        let mut world = World::new(Grid::new(10, 10, 64.0, 32.0), 100);
        world.spawn_building(BuildingKind::TownCenter, Cell::new(5, 5), true);
        world
    }

    fn tick(world: &mut World, id: EntityId) {
        world.advance_time();
        let dt = world.dt_ms();
        let mut villager = world.villagers.remove(&id).unwrap();
        update(world, id, &mut villager, dt);
        world.villagers.insert(id, villager);
    }

    fn state(world: &World, id: EntityId) -> VillagerState {
        world.villager(id).unwrap().state()
    }

    #[test]
    fn two_gather_intervals_fill_the_load() {
        let mut world = world();
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(0, 0)));
        let wood = world.spawn_resource(ResourceKind::Wood, Cell::new(2, 0), 500);
        world.gather(id, wood).unwrap();

        let mut walked = 0;
        while state(&world, id) != VillagerState::Gathering {
            tick(&mut world, id);
            walked += 1;
            assert!(walked < 50, "never reached the node");
        }

        for _ in 0..19 {
            tick(&mut world, id);
        }
        assert_eq!(world.villager(id).unwrap().carried_amount(), 5);
        assert_eq!(state(&world, id), VillagerState::Gathering);

        tick(&mut world, id);
        let v = world.villager(id).unwrap();
        assert_eq!(v.carried(), Some(Carried { kind: ResourceKind::Wood, amount: 10 }));
        assert_eq!(v.state(), VillagerState::Returning);
        assert_eq!(world.resource(wood).unwrap().amount(), 490);
    }

    #[test]
    fn vanished_node_sends_the_villager_idle() {
        let mut world = world();
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(1, 1)));
        let gold = world.spawn_resource(ResourceKind::Gold, Cell::new(1, 1), 50);
        world.gather(id, gold).unwrap();
        tick(&mut world, id);
        assert_eq!(state(&world, id), VillagerState::Gathering);

        world.deplete_resource(gold);
        tick(&mut world, id);
        assert_eq!(state(&world, id), VillagerState::Idle);
        assert!(world.villager(id).unwrap().task().is_none());
    }

    #[test]
    fn hunting_a_removed_animal_goes_idle() {
        let mut world = world();
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(1, 1)));
        let deer = world.spawn_animal(AnimalKind::Deer, Cell::new(3, 3));
        world.hunt(id, deer).unwrap();
        world.animals.remove(&deer);
        tick(&mut world, id);
        assert_eq!(state(&world, id), VillagerState::Idle);
        assert!(world.villager(id).unwrap().combat.target.is_none());
    }

    #[test]
    fn far_diagonal_node_is_walked_to_before_gathering() {
        let mut world = world();
        let start = world.grid().to_iso(Cell::new(3, 3));
        let id = world.spawn_villager(start);
        let wood = world.spawn_resource(ResourceKind::Wood, Cell::new(4, 2), 500);
        let node_at = world.resource(wood).unwrap().position;
        assert!(start.distance(node_at) > work::GATHER_REACH);
        world.gather(id, wood).unwrap();

        tick(&mut world, id);
        assert_eq!(state(&world, id), VillagerState::Moving);
        while state(&world, id) == VillagerState::Moving {
            tick(&mut world, id);
        }
        assert_eq!(state(&world, id), VillagerState::Gathering);
        assert!(world.villager(id).unwrap().position().distance(node_at) <= work::GATHER_REACH);
    }

    #[test]
    fn hunting_drops_a_partial_wood_load_for_a_full_one_of_food() {
        let mut world = world();
        let at = world.grid().to_iso(Cell::new(1, 1));
        let id = world.spawn_villager(at);
        world.villagers.get_mut(&id).unwrap().carried = Some(Carried {
            kind: ResourceKind::Wood,
            amount: 5,
        });
        let sheep = world.spawn_animal(AnimalKind::Sheep, Cell::new(1, 1));
        world.hunt(id, sheep).unwrap();
        assert!(world.villager(id).unwrap().carried().is_none());

        tick(&mut world, id);
        let v = world.villager(id).unwrap();
        assert_eq!(v.carried(), Some(Carried { kind: ResourceKind::Food, amount: 10 }));
        assert_eq!(v.state(), VillagerState::Returning);
        assert_eq!(world.animal(sheep).unwrap().food(), 0);
    }

    #[test]
    fn no_drop_site_clears_the_task_but_keeps_the_load() {
        let mut world = World::new(Grid::new(10, 10, 64.0, 32.0), 100);
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(2, 2)));
        let sheep = world.spawn_animal(AnimalKind::Sheep, Cell::new(2, 2));
        world.hunt(id, sheep).unwrap();

        tick(&mut world, id);
        let v = world.villager(id).unwrap();
        assert_eq!(v.state(), VillagerState::Idle);
        assert!(v.task().is_none());
        assert!(v.combat.target.is_none());
        assert_eq!(v.carried_amount(), 10);
    }

    #[test]
    fn builder_finishes_after_ten_intervals() {
        let mut world = world();
        world.economy.stockpile.wood = 50;
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(2, 1)));
        let house = world
            .place_building(BuildingKind::House, Cell::new(2, 2), &[id])
            .unwrap();
        tick(&mut world, id);
        assert_eq!(state(&world, id), VillagerState::Building);

        for _ in 0..99 {
            tick(&mut world, id);
        }
        assert!(!world.building(house).unwrap().is_completed());
        tick(&mut world, id);
        assert!(world.building(house).unwrap().is_completed());
        assert_eq!(state(&world, id), VillagerState::Idle);
    }

    #[test]
    fn move_order_drops_the_task() {
        let mut world = world();
        let id = world.spawn_villager(world.grid().to_iso(Cell::new(1, 1)));
        let stone = world.spawn_resource(ResourceKind::Stone, Cell::new(1, 2), 100);
        world.gather(id, stone).unwrap();
        let dest = world.grid().to_iso(Cell::new(8, 8));
        world.move_unit(id, dest).unwrap();
        let v = world.villager(id).unwrap();
        assert_eq!(v.state(), VillagerState::Moving);
        assert!(v.task().is_none());
        assert_eq!(v.mover.destination(), Some(dest));
    }
}
