use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    animal::AnimalKind,
    building::BuildingKind,
    economy::{Economy, ResourceKind, Stockpile},
    grid::{Cell, Grid},
    resource::DEFAULT_NODE_AMOUNT,
    rng::{RngExt, RngManager},
    units::UnitKind,
    world::{EntityId, World},
};

const CLUSTER_SPREAD: i32 = 2;

fn default_tick_ms() -> u64 {
    50
}

fn default_snapshot_interval_ticks() -> u64 {
    0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tile_width() -> f32 {
    64.0
}

fn default_tile_height() -> f32 {
    32.0
}

fn default_node_amount() -> u32 {
    DEFAULT_NODE_AMOUNT
}

fn default_cluster_count() -> u32 {
    1
}

fn default_stockpile() -> Stockpile {
    Stockpile::new(200, 200, 100, 100)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub map: MapConfig,
    #[serde(default = "default_stockpile")]
    pub stockpile: Stockpile,
    #[serde(default)]
    pub town_center: Option<CellConfig>,
    #[serde(default)]
    pub villagers: Vec<VillagerConfig>,
    #[serde(default)]
    pub soldiers: Vec<SoldierConfig>,
    #[serde(default)]
    pub resource_clusters: Vec<ClusterConfig>,
    #[serde(default)]
    pub animals: Vec<AnimalConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_tile_width")]
    pub tile_width: f32,
    #[serde(default = "default_tile_height")]
    pub tile_height: f32,
    #[serde(default)]
    pub lakes: Vec<LakeConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LakeConfig {
    pub x: i32,
    pub y: i32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellConfig {
    pub x: i32,
    pub y: i32,
}

impl CellConfig {
    fn cell(self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VillagerConfig {
    pub x: i32,
    pub y: i32,
    /// Resource kind to start gathering from the nearest node.
    #[serde(default)]
    pub gather: Option<ResourceKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoldierConfig {
    pub kind: UnitKind,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub kind: ResourceKind,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_cluster_count")]
    pub count: u32,
    #[serde(default = "default_node_amount")]
    pub amount: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimalConfig {
    pub kind: AnimalKind,
    pub x: i32,
    pub y: i32,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(data: &str) -> Result<Self> {
        serde_yaml::from_str(data).context("Failed to parse scenario")
    }

    fn build_grid(&self) -> Grid {
        let map = &self.map;
        let mut grid = Grid::new(map.width, map.height, map.tile_width, map.tile_height);
        for lake in &map.lakes {
            grid.paint_lake(Cell::new(lake.x, lake.y), lake.radius);
        }
        grid
    }

    /// Lay out the map and everything on it. Placement problems are logged
    /// and skipped rather than failing the whole scenario.
    pub fn build_world(&self) -> World {
        let mut world = World::new(self.build_grid(), self.tick_ms);
        world.economy = Economy::new(self.stockpile.clone());
        let mut rng = RngManager::new(self.seed);
        let mut scatter = rng.stream("scenario");

        if let Some(tc) = self.town_center {
            if world
                .spawn_building(BuildingKind::TownCenter, tc.cell(), true)
                .is_none()
            {
                warn!(x = tc.x, y = tc.y, "town center tile is not buildable");
            }
        }

        for cluster in &self.resource_clusters {
            let centre = Cell::new(cluster.x, cluster.y);
            for _ in 0..cluster.count {
                let cell = centre.offset(
                    scatter.jitter(CLUSTER_SPREAD),
                    scatter.jitter(CLUSTER_SPREAD),
                );
                if !world.is_buildable(cell) {
                    warn!(
                        kind = cluster.kind.as_str(),
                        x = cell.x,
                        y = cell.y,
                        "skipping resource node on an occupied or impassable tile"
                    );
                    continue;
                }
                world.spawn_resource(cluster.kind, cell, cluster.amount);
            }
        }

        for beast in &self.animals {
            let cell = Cell::new(beast.x, beast.y);
            if !world.grid().is_walkable(cell) {
                warn!(kind = beast.kind.as_str(), x = beast.x, y = beast.y, "skipping animal off walkable ground");
                continue;
            }
            world.spawn_animal(beast.kind, cell);
        }

        for soldier in &self.soldiers {
            let cell = Cell::new(soldier.x, soldier.y);
            if !world.grid().is_walkable(cell) {
                warn!(kind = soldier.kind.as_str(), x = soldier.x, y = soldier.y, "skipping soldier off walkable ground");
                continue;
            }
            let at = world.grid().to_iso(cell);
            world.spawn_soldier(soldier.kind, at);
        }

        for villager in &self.villagers {
            let cell = Cell::new(villager.x, villager.y);
            if !world.grid().is_walkable(cell) {
                warn!(x = villager.x, y = villager.y, "skipping villager off walkable ground");
                continue;
            }
            let at = world.grid().to_iso(cell);
            let id = world.spawn_villager(at);
            if let Some(kind) = villager.gather {
                assign_gather(&mut world, id, kind);
            }
        }

        world.refresh_population();
        debug!(
            scenario = %self.name,
            villagers = world.villager_ids().len(),
            resources = world.resource_ids().len(),
            animals = world.animal_ids().len(),
            "world built"
        );
        world
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(1_200)
    }
}

fn assign_gather(world: &mut World, villager: EntityId, kind: ResourceKind) {
    let Some(from) = world.villager(villager).map(|v| v.position()) else {
        return;
    };
    let nearest = world
        .resource_ids()
        .into_iter()
        .filter_map(|id| world.resource(id).map(|r| (id, r)))
        .filter(|(_, r)| r.kind == kind)
        .min_by(|a, b| {
            a.1.position
                .distance(from)
                .total_cmp(&b.1.position.distance(from))
        })
        .map(|(id, _)| id);
    let Some(node) = nearest else {
        warn!(villager = villager.raw(), kind = kind.as_str(), "no node to gather from");
        return;
    };
    if let Err(err) = world.gather(villager, node) {
        warn!(villager = villager.raw(), %err, "initial gather order rejected");
    }
}
