use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    animal::AnimalKind,
    building::{BuildingKind, ProductionItem},
    combat::Damageable,
    economy::{ResourceKind, Stockpile},
    grid::WorldPos,
    technology::Age,
    units::UnitKind,
    villager::{Carried, Task, VillagerState},
    world::{EntityId, World},
};

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub elapsed_ms: u64,
    pub written_at: DateTime<Utc>,
    pub age: Age,
    pub stockpile: Stockpile,
    pub gathered: Stockpile,
    pub population: u32,
    pub population_cap: u32,
    pub researched: Vec<String>,
    pub villagers: Vec<VillagerEntry>,
    pub soldiers: Vec<SoldierEntry>,
    pub animals: Vec<AnimalEntry>,
    pub buildings: Vec<BuildingEntry>,
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VillagerEntry {
    pub id: EntityId,
    pub position: WorldPos,
    pub hp: u32,
    pub state: VillagerState,
    pub task: Option<Task>,
    pub carried: Option<Carried>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SoldierEntry {
    pub id: EntityId,
    pub kind: UnitKind,
    pub position: WorldPos,
    pub hp: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalEntry {
    pub id: EntityId,
    pub kind: AnimalKind,
    pub position: WorldPos,
    pub food: u32,
    pub dead: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingEntry {
    pub id: EntityId,
    pub kind: BuildingKind,
    pub x: i32,
    pub y: i32,
    pub hp: u32,
    pub progress: f32,
    pub completed: bool,
    pub queue: Vec<ProductionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceEntry {
    pub id: EntityId,
    pub kind: ResourceKind,
    pub x: i32,
    pub y: i32,
    pub amount: u32,
}

impl World {
    /// Serializable view of the current state, entities in id order.
    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let villagers = self
            .villager_ids()
            .into_iter()
            .filter_map(|id| {
                self.villager(id).map(|v| VillagerEntry {
                    id,
                    position: v.position(),
                    hp: v.combat.hp,
                    state: v.state(),
                    task: v.task(),
                    carried: v.carried(),
                })
            })
            .collect();
        let soldiers = self
            .soldier_ids()
            .into_iter()
            .filter_map(|id| {
                self.soldier(id).map(|s| SoldierEntry {
                    id,
                    kind: s.kind,
                    position: s.position(),
                    hp: s.combat.hp,
                })
            })
            .collect();
        let animals = self
            .animal_ids()
            .into_iter()
            .filter_map(|id| {
                self.animal(id).map(|a| AnimalEntry {
                    id,
                    kind: a.kind,
                    position: a.mover.position,
                    food: a.food(),
                    dead: a.is_dead(),
                })
            })
            .collect();
        let buildings = self
            .building_ids()
            .into_iter()
            .filter_map(|id| {
                self.building(id).map(|b| BuildingEntry {
                    id,
                    kind: b.kind,
                    x: b.cell.x,
                    y: b.cell.y,
                    hp: b.hp(),
                    progress: b.progress(),
                    completed: b.is_completed(),
                    queue: b.queue().cloned().collect(),
                })
            })
            .collect();
        let resources = self
            .resource_ids()
            .into_iter()
            .filter_map(|id| {
                self.resource(id).map(|r| ResourceEntry {
                    id,
                    kind: r.kind,
                    x: r.cell.x,
                    y: r.cell.y,
                    amount: r.amount(),
                })
            })
            .collect();

        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick(),
            elapsed_ms: self.now_ms(),
            written_at: Utc::now(),
            age: self.tech.age,
            stockpile: self.economy.stockpile.clone(),
            gathered: self.economy.gathered.clone(),
            population: self.economy.population,
            population_cap: self.economy.population_cap,
            researched: self.tech.researched.clone(),
            villagers,
            soldiers,
            animals,
            buildings,
            resources,
        }
    }
}

/// Dumps the world as pretty JSON every `interval_ticks` ticks; an interval
/// of zero turns snapshots off.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_ticks: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_ticks: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_ticks,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.interval_ticks > 0 && tick > 0 && tick % self.interval_ticks == 0
    }

    pub fn maybe_write(&mut self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        let tick = world.tick();
        if !self.is_due(tick) {
            return Ok(None);
        }
        let scenario_dir = self.dir.join(scenario_name);
        fs::create_dir_all(&scenario_dir).with_context(|| {
            format!("Failed to create snapshot directory {}", scenario_dir.display())
        })?;
        let path = scenario_dir.join(format!("tick_{tick:06}.json"));
        let json = serde_json::to_string_pretty(&world.snapshot(scenario_name))
            .context("Failed to serialize world snapshot")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(tick, path = %path.display(), "snapshot written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid};

    #[test]
    fn interval_zero_never_writes() {
        let writer = SnapshotWriter::new("unused", 0);
        assert!(!writer.is_due(0));
        assert!(!writer.is_due(10));
    }

    #[test]
    fn due_on_multiples_only() {
        let writer = SnapshotWriter::new("unused", 5);
        assert!(!writer.is_due(0));
        assert!(!writer.is_due(4));
        assert!(writer.is_due(5));
        assert!(writer.is_due(10));
    }

    #[test]
    fn snapshot_lists_entities_in_id_order() {
        let mut world = World::new(Grid::new(8, 8, 64.0, 32.0), 50);
        world.spawn_resource(ResourceKind::Gold, Cell::new(6, 6), 300);
        world.spawn_building(BuildingKind::TownCenter, Cell::new(3, 3), true);
        let a = world.spawn_villager(WorldPos::default());
        let b = world.spawn_villager(WorldPos::new(10.0, 5.0));

        let snap = world.snapshot("unit");
        assert_eq!(snap.villagers.iter().map(|v| v.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(snap.resources[0].amount, 300);
        assert_eq!(snap.population_cap, 5);
        assert!(snap.buildings[0].completed);
    }
}
