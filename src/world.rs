use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animal::{Animal, AnimalKind, CARCASS_DECAY_MS};
use crate::building::{Building, BuildingKind, ProductionItem};
use crate::combat::{Damage, Damageable, Target};
use crate::economy::{Economy, ResourceKind};
use crate::event::{Callback, EventKind, Schedule, SimEvent};
use crate::grid::{Cell, Grid, WorldPos};
use crate::resource::ResourceNode;
use crate::soldier::Soldier;
use crate::technology::{self, TechState};
use crate::units::UnitKind;
use crate::villager::Villager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

fn is_drop_site(building: &Building) -> bool {
    building.kind == BuildingKind::TownCenter && building.is_completed()
}

fn sorted_ids<T>(table: &HashMap<EntityId, T>) -> Vec<EntityId> {
    let mut ids: Vec<_> = table.keys().cloned().collect();
    ids.sort();
    ids
}

/// Every live entity plus the shared grid, economy and clock.
///
/// Ids are handed out once and never reused, so a stale handle is detected
/// by a failed lookup.
pub struct World {
    next_entity: u64,
    tick: u64,
    now_ms: u64,
    dt_ms: u64,
    grid: Grid,
    pub economy: Economy,
    pub tech: TechState,
    pub(crate) villagers: HashMap<EntityId, Villager>,
    pub(crate) soldiers: HashMap<EntityId, Soldier>,
    pub(crate) animals: HashMap<EntityId, Animal>,
    pub(crate) buildings: HashMap<EntityId, Building>,
    pub(crate) resources: HashMap<EntityId, ResourceNode>,
    pub(crate) schedule: Schedule,
    outbox: Vec<SimEvent>,
}

impl World {
    pub fn new(grid: Grid, dt_ms: u64) -> Self {
        Self {
            next_entity: 0,
            tick: 0,
            now_ms: 0,
            dt_ms,
            grid,
            economy: Economy::default(),
            tech: TechState::default(),
            villagers: HashMap::new(),
            soldiers: HashMap::new(),
            animals: HashMap::new(),
            buildings: HashMap::new(),
            resources: HashMap::new(),
            schedule: Schedule::new(),
            outbox: Vec::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn dt_ms(&self) -> u64 {
        self.dt_ms
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.now_ms += self.dt_ms;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    // -- spawning ----------------------------------------------------------

    pub fn spawn_villager(&mut self, position: WorldPos) -> EntityId {
        let id = self.allocate();
        let mut villager = Villager::new(position);
        villager.home = self.drop_site(None, position).map(|(site, _)| site);
        technology::catch_up_villager(&self.tech, &mut villager);
        self.villagers.insert(id, villager);
        self.refresh_population();
        id
    }

    pub fn spawn_soldier(&mut self, kind: UnitKind, position: WorldPos) -> EntityId {
        let id = self.allocate();
        let mut soldier = Soldier::new(kind, position);
        technology::catch_up_soldier(&self.tech, &mut soldier);
        self.soldiers.insert(id, soldier);
        self.refresh_population();
        id
    }

    pub fn spawn_unit(&mut self, kind: UnitKind, position: WorldPos) -> EntityId {
        match kind {
            UnitKind::Villager => self.spawn_villager(position),
            UnitKind::Militia => self.spawn_soldier(kind, position),
        }
    }

    pub fn spawn_animal(&mut self, kind: AnimalKind, cell: Cell) -> EntityId {
        let id = self.allocate();
        let position = self.grid.to_iso(cell);
        self.animals.insert(id, Animal::new(kind, position));
        id
    }

    pub fn spawn_resource(&mut self, kind: ResourceKind, cell: Cell, amount: u32) -> EntityId {
        let id = self.allocate();
        let position = self.grid.to_iso(cell);
        self.resources
            .insert(id, ResourceNode::new(kind, cell, position, amount));
        id
    }

    /// Place a building on a free walkable tile, which it then blocks.
    /// Returns `None` when the tile cannot be built on.
    pub fn spawn_building(&mut self, kind: BuildingKind, cell: Cell, completed: bool) -> Option<EntityId> {
        if !self.is_buildable(cell) {
            return None;
        }
        let id = self.allocate();
        let position = self.grid.to_iso(cell);
        let building = if completed {
            Building::completed(kind, cell, position)
        } else {
            Building::foundation(kind, cell, position)
        };
        self.grid.set_blocked(cell, true);
        self.buildings.insert(id, building);
        self.refresh_population();
        Some(id)
    }

    /// Where a unit produced by the building on `cell` appears: the first
    /// walkable neighbouring tile, or the building itself when boxed in.
    pub fn spawn_point(&self, cell: Cell) -> WorldPos {
        let free = self.grid.neighbors(cell).find(|c| self.grid.is_walkable(*c));
        self.grid.to_iso(free.unwrap_or(cell))
    }

    pub fn is_buildable(&self, cell: Cell) -> bool {
        self.grid.is_walkable(cell) && !self.resources.values().any(|r| r.cell == cell)
    }

    // -- lookups -----------------------------------------------------------

    pub fn villager(&self, id: EntityId) -> Option<&Villager> {
        self.villagers.get(&id)
    }

    pub fn soldier(&self, id: EntityId) -> Option<&Soldier> {
        self.soldiers.get(&id)
    }

    pub fn animal(&self, id: EntityId) -> Option<&Animal> {
        self.animals.get(&id)
    }

    pub fn animal_mut(&mut self, id: EntityId) -> Option<&mut Animal> {
        self.animals.get_mut(&id)
    }

    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    pub fn resource(&self, id: EntityId) -> Option<&ResourceNode> {
        self.resources.get(&id)
    }

    pub(crate) fn resource_mut(&mut self, id: EntityId) -> Option<&mut ResourceNode> {
        self.resources.get_mut(&id)
    }

    /// Split borrow for handing a unit the grid it has to path over.
    pub(crate) fn villager_with_grid(&mut self, id: EntityId) -> Option<(&mut Villager, &Grid)> {
        let grid = &self.grid;
        self.villagers.get_mut(&id).map(|v| (v, grid))
    }

    pub(crate) fn soldier_with_grid(&mut self, id: EntityId) -> Option<(&mut Soldier, &Grid)> {
        let grid = &self.grid;
        self.soldiers.get_mut(&id).map(|s| (s, grid))
    }

    pub fn villager_ids(&self) -> Vec<EntityId> {
        sorted_ids(&self.villagers)
    }

    pub fn soldier_ids(&self) -> Vec<EntityId> {
        sorted_ids(&self.soldiers)
    }

    pub fn animal_ids(&self) -> Vec<EntityId> {
        sorted_ids(&self.animals)
    }

    pub fn building_ids(&self) -> Vec<EntityId> {
        sorted_ids(&self.buildings)
    }

    pub fn resource_ids(&self) -> Vec<EntityId> {
        sorted_ids(&self.resources)
    }

    /// Resolve a bare id to the table it lives in.
    pub fn target_of(&self, id: EntityId) -> Option<Target> {
        if self.villagers.contains_key(&id) {
            Some(Target::Villager(id))
        } else if self.soldiers.contains_key(&id) {
            Some(Target::Soldier(id))
        } else if self.animals.contains_key(&id) {
            Some(Target::Animal(id))
        } else if self.buildings.contains_key(&id) {
            Some(Target::Building(id))
        } else {
            None
        }
    }

    pub fn damageable(&self, target: Target) -> Option<&dyn Damageable> {
        match target {
            Target::Villager(id) => self.villagers.get(&id).map(|v| v as &dyn Damageable),
            Target::Soldier(id) => self.soldiers.get(&id).map(|s| s as &dyn Damageable),
            Target::Animal(id) => self.animals.get(&id).map(|a| a as &dyn Damageable),
            Target::Building(id) => self.buildings.get(&id).map(|b| b as &dyn Damageable),
        }
    }

    pub fn damageable_mut(&mut self, target: Target) -> Option<&mut dyn Damageable> {
        match target {
            Target::Villager(id) => self.villagers.get_mut(&id).map(|v| v as &mut dyn Damageable),
            Target::Soldier(id) => self.soldiers.get_mut(&id).map(|s| s as &mut dyn Damageable),
            Target::Animal(id) => self.animals.get_mut(&id).map(|a| a as &mut dyn Damageable),
            Target::Building(id) => self.buildings.get_mut(&id).map(|b| b as &mut dyn Damageable),
        }
    }

    /// Position of `target` while it exists and is alive.
    pub fn live_target_position(&self, target: Target) -> Option<WorldPos> {
        self.damageable(target)
            .filter(|d| !d.is_dead())
            .map(|d| d.position())
    }

    // -- events ------------------------------------------------------------

    pub fn emit(&mut self, kind: EventKind) {
        self.outbox.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    pub fn pending_events(&self) -> &[SimEvent] {
        &self.outbox
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Fire every callback that is due by now.
    pub fn run_due_callbacks(&mut self) -> usize {
        let mut fired = 0;
        while let Some(entry) = self.schedule.pop_due(self.now_ms) {
            match entry.callback {
                Callback::RemoveCarcass { animal } => {
                    self.animals.remove(&animal);
                }
            }
            fired += 1;
        }
        fired
    }

    pub fn pending_callbacks(&self) -> usize {
        self.schedule.len()
    }

    // -- shared mutations --------------------------------------------------

    /// Completed town center to drop resources at: `home` if it still
    /// stands, otherwise the one nearest to `from`.
    pub fn drop_site(&self, home: Option<EntityId>, from: WorldPos) -> Option<(EntityId, WorldPos)> {
        if let Some(id) = home {
            if let Some(b) = self.buildings.get(&id).filter(|b| is_drop_site(b)) {
                return Some((id, b.position));
            }
        }
        self.building_ids()
            .into_iter()
            .filter_map(|id| {
                self.buildings
                    .get(&id)
                    .filter(|b| is_drop_site(b))
                    .map(|b| (id, b.position))
            })
            .min_by(|a, b| a.1.distance(from).total_cmp(&b.1.distance(from)))
    }

    pub fn deposit(&mut self, villager: EntityId, kind: ResourceKind, amount: u32) {
        self.economy.deposit(kind, amount);
        self.emit(EventKind::ResourceCollected {
            villager,
            kind,
            amount,
        });
    }

    pub fn deplete_resource(&mut self, id: EntityId) {
        if let Some(node) = self.resources.remove(&id) {
            debug!(tick = self.tick, resource = id.raw(), kind = node.kind.as_str(), "resource depleted");
            self.emit(EventKind::ResourceDepleted {
                resource: id,
                kind: node.kind,
            });
        }
    }

    /// Add construction work; true once the building is complete.
    pub fn construct_building(&mut self, id: EntityId, amount: f32) -> bool {
        let Some(building) = self.buildings.get_mut(&id) else {
            return false;
        };
        let was_complete = building.is_completed();
        let done = building.construct(amount);
        if done && !was_complete {
            let kind = building.kind;
            info!(tick = self.tick, building = id.raw(), kind = kind.as_str(), "construction complete");
            self.emit(EventKind::ConstructionComplete { building: id, kind });
            self.refresh_population();
        }
        done
    }

    /// Deal `amount` to `target` on behalf of `attacker` and resolve a
    /// resulting death.
    pub fn strike(&mut self, attacker: Target, target: Target, amount: u32) -> Damage {
        let Some(victim) = self.damageable_mut(target) else {
            return Damage::Ignored;
        };
        let outcome = victim.take_damage(amount, Some(attacker));
        if outcome == Damage::Killed {
            self.handle_kill(target);
        }
        outcome
    }

    fn handle_kill(&mut self, target: Target) {
        match target {
            Target::Villager(id) => {
                if self.villagers.remove(&id).is_some() {
                    self.emit(EventKind::UnitKilled {
                        unit: id,
                        kind: UnitKind::Villager,
                    });
                }
            }
            Target::Soldier(id) => {
                if let Some(soldier) = self.soldiers.remove(&id) {
                    self.emit(EventKind::UnitKilled {
                        unit: id,
                        kind: soldier.kind,
                    });
                }
            }
            Target::Animal(id) => {
                if let Some(animal) = self.animals.get(&id) {
                    let kind = animal.kind;
                    self.schedule
                        .schedule(self.now_ms + CARCASS_DECAY_MS, Callback::RemoveCarcass { animal: id });
                    self.emit(EventKind::AnimalKilled { animal: id, kind });
                }
            }
            Target::Building(id) => {
                if let Some(mut building) = self.buildings.remove(&id) {
                    self.grid.set_blocked(building.cell, false);
                    for item in building.drain_queue() {
                        if let ProductionItem::Research(tech) = item {
                            self.tech.cancel_pending(&tech);
                        }
                    }
                    info!(tick = self.tick, building = id.raw(), kind = building.kind.as_str(), "building destroyed");
                    self.emit(EventKind::BuildingDestroyed {
                        building: id,
                        kind: building.kind,
                    });
                }
            }
        }
        self.refresh_population();
    }

    // -- population --------------------------------------------------------

    pub fn population(&self) -> u32 {
        (self.villagers.len() + self.soldiers.len()) as u32
    }

    pub fn housing(&self) -> u32 {
        self.buildings
            .values()
            .filter(|b| b.is_completed())
            .map(|b| b.definition().housing)
            .sum()
    }

    pub fn queued_units(&self) -> u32 {
        self.buildings.values().map(|b| b.queued_units() as u32).sum()
    }

    /// Recount population, housing and queued units from the tables.
    pub fn refresh_population(&mut self) {
        self.economy.population = self.population();
        self.economy.queued_units = self.queued_units();
        let housing = self.housing();
        self.economy.set_housing(housing);
    }
}
