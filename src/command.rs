//! Orders fed into the simulation between ticks.
//!
//! Every command is validated in full before anything is mutated, so a
//! rejected command leaves the world exactly as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::building::{self, BuildingKind, ProductionItem};
use crate::combat::{Damageable, Target};
use crate::economy::EconomyError;
use crate::grid::{Cell, WorldPos};
use crate::technology;
use crate::units::{self, UnitKind};
use crate::world::{EntityId, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    MoveTo {
        unit: EntityId,
        x: f32,
        y: f32,
    },
    Gather {
        villager: EntityId,
        resource: EntityId,
    },
    Build {
        villager: EntityId,
        building: EntityId,
    },
    Hunt {
        villager: EntityId,
        animal: EntityId,
    },
    AttackTarget {
        unit: EntityId,
        target: EntityId,
    },
    QueueUnit {
        building: EntityId,
        kind: UnitKind,
    },
    QueueResearch {
        building: EntityId,
        tech: String,
    },
    PlaceBuilding {
        kind: BuildingKind,
        x: i32,
        y: i32,
        #[serde(default)]
        builders: Vec<EntityId>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no {expected} with id {id}")]
    UnknownEntity { id: u64, expected: &'static str },
    #[error("entity {0} is already dead")]
    TargetDead(u64),
    #[error("no path to the destination")]
    Unreachable,
    #[error("villagers can only attack animals")]
    NotHuntable,
    #[error("a unit cannot attack itself")]
    SelfTarget,
    #[error("building {0} is not finished")]
    NotCompleted(u64),
    #[error("building {0} is already finished")]
    AlreadyCompleted(u64),
    #[error("{building} cannot train {unit}")]
    CannotTrain {
        building: &'static str,
        unit: &'static str,
    },
    #[error("{building} cannot research {tech}")]
    CannotResearch { building: &'static str, tech: String },
    #[error("unknown technology {0}")]
    UnknownTech(String),
    #[error("{0} is already researched")]
    AlreadyResearched(String),
    #[error("{0} is already being researched")]
    AlreadyQueued(String),
    #[error("{tech} requires {missing}")]
    MissingPrerequisite { tech: String, missing: &'static str },
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error("population cap of {0} reached")]
    PopulationCapped(u32),
    #[error("tile ({x}, {y}) cannot be built on")]
    NotBuildable { x: i32, y: i32 },
}

impl World {
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        let result = match &command {
            Command::MoveTo { unit, x, y } => self.move_unit(*unit, WorldPos::new(*x, *y)),
            Command::Gather { villager, resource } => self.gather(*villager, *resource),
            Command::Build { villager, building } => self.build(*villager, *building),
            Command::Hunt { villager, animal } => self.hunt(*villager, *animal),
            Command::AttackTarget { unit, target } => self.attack_target(*unit, *target),
            Command::QueueUnit { building, kind } => self.queue_unit(*building, *kind),
            Command::QueueResearch { building, tech } => self.queue_research(*building, tech),
            Command::PlaceBuilding {
                kind,
                x,
                y,
                builders,
            } => self
                .place_building(*kind, Cell::new(*x, *y), builders)
                .map(|_| ()),
        };
        if let Err(err) = &result {
            debug!(tick = self.tick(), ?command, %err, "command rejected");
        }
        result
    }

    pub fn move_unit(&mut self, unit: EntityId, dest: WorldPos) -> Result<(), CommandError> {
        let moved = if let Some((villager, grid)) = self.villager_with_grid(unit) {
            villager.order_move(grid, dest)
        } else if let Some((soldier, grid)) = self.soldier_with_grid(unit) {
            soldier.order_move(grid, dest)
        } else {
            return Err(unknown(unit, "unit"));
        };
        if moved {
            Ok(())
        } else {
            Err(CommandError::Unreachable)
        }
    }

    pub fn gather(&mut self, villager: EntityId, resource: EntityId) -> Result<(), CommandError> {
        let (kind, at) = self
            .resource(resource)
            .map(|r| (r.kind, r.position))
            .ok_or_else(|| unknown(resource, "resource"))?;
        let (worker, grid) = self
            .villager_with_grid(villager)
            .ok_or_else(|| unknown(villager, "villager"))?;
        if worker.order_gather(grid, resource, kind, at) {
            Ok(())
        } else {
            Err(CommandError::Unreachable)
        }
    }

    pub fn build(&mut self, villager: EntityId, building: EntityId) -> Result<(), CommandError> {
        let site = self
            .building(building)
            .ok_or_else(|| unknown(building, "building"))?;
        if site.is_completed() {
            return Err(CommandError::AlreadyCompleted(building.raw()));
        }
        let at = site.position;
        let (worker, grid) = self
            .villager_with_grid(villager)
            .ok_or_else(|| unknown(villager, "villager"))?;
        if worker.order_build(grid, building, at) {
            Ok(())
        } else {
            Err(CommandError::Unreachable)
        }
    }

    pub fn hunt(&mut self, villager: EntityId, animal: EntityId) -> Result<(), CommandError> {
        let prey = self.animal(animal).ok_or_else(|| unknown(animal, "animal"))?;
        if prey.is_dead() {
            return Err(CommandError::TargetDead(animal.raw()));
        }
        let worker = self
            .villagers
            .get_mut(&villager)
            .ok_or_else(|| unknown(villager, "villager"))?;
        worker.order_hunt(animal);
        Ok(())
    }

    pub fn attack_target(&mut self, unit: EntityId, target: EntityId) -> Result<(), CommandError> {
        if unit == target {
            return Err(CommandError::SelfTarget);
        }
        let resolved = self.target_of(target).ok_or_else(|| unknown(target, "target"))?;
        if self.live_target_position(resolved).is_none() {
            return Err(CommandError::TargetDead(target.raw()));
        }
        if self.villagers.contains_key(&unit) {
            return match resolved {
                Target::Animal(animal) => self.hunt(unit, animal),
                _ => Err(CommandError::NotHuntable),
            };
        }
        let soldier = self
            .soldiers
            .get_mut(&unit)
            .ok_or_else(|| unknown(unit, "unit"))?;
        soldier.order_attack(resolved);
        Ok(())
    }

    pub fn queue_unit(&mut self, building: EntityId, kind: UnitKind) -> Result<(), CommandError> {
        let site = self
            .building(building)
            .ok_or_else(|| unknown(building, "building"))?;
        if !site.is_completed() {
            return Err(CommandError::NotCompleted(building.raw()));
        }
        if !site.can_train(kind) {
            return Err(CommandError::CannotTrain {
                building: site.kind.as_str(),
                unit: kind.as_str(),
            });
        }
        if !self.economy.has_room_for_unit() {
            return Err(CommandError::PopulationCapped(self.economy.population_cap));
        }
        self.economy.pay(&units::definition(kind).cost)?;
        if let Some(site) = self.building_mut(building) {
            site.enqueue(ProductionItem::Unit(kind));
        }
        self.economy.queued_units += 1;
        Ok(())
    }

    pub fn queue_research(&mut self, building: EntityId, tech: &str) -> Result<(), CommandError> {
        let def = technology::definition(tech).ok_or_else(|| CommandError::UnknownTech(tech.to_string()))?;
        let site = self
            .building(building)
            .ok_or_else(|| unknown(building, "building"))?;
        if !site.is_completed() {
            return Err(CommandError::NotCompleted(building.raw()));
        }
        if !site.can_research(def.id) {
            return Err(CommandError::CannotResearch {
                building: site.kind.as_str(),
                tech: def.id.to_string(),
            });
        }
        if self.tech.is_researched(def.id) {
            return Err(CommandError::AlreadyResearched(def.id.to_string()));
        }
        if self.tech.is_pending(def.id) {
            return Err(CommandError::AlreadyQueued(def.id.to_string()));
        }
        if let Some(missing) = self.tech.missing_prerequisite(def) {
            return Err(CommandError::MissingPrerequisite {
                tech: def.id.to_string(),
                missing,
            });
        }
        self.economy.pay(&def.cost)?;
        if let Some(site) = self.building_mut(building) {
            site.enqueue(ProductionItem::Research(def.id.to_string()));
        }
        self.tech.pending.push(def.id.to_string());
        Ok(())
    }

    /// Pay for and lay a foundation, then send `builders` to it. Builders
    /// that are unknown or cannot reach the site are skipped.
    pub fn place_building(
        &mut self,
        kind: BuildingKind,
        cell: Cell,
        builders: &[EntityId],
    ) -> Result<EntityId, CommandError> {
        if !self.is_buildable(cell) {
            return Err(CommandError::NotBuildable { x: cell.x, y: cell.y });
        }
        self.economy.pay(&building::definition(kind).cost)?;
        let id = self
            .spawn_building(kind, cell, false)
            .ok_or(CommandError::NotBuildable { x: cell.x, y: cell.y })?;
        for builder in builders {
            if let Err(err) = self.build(*builder, id) {
                debug!(tick = self.tick(), builder = builder.raw(), %err, "builder not assigned");
            }
        }
        Ok(id)
    }
}

fn unknown(id: EntityId, expected: &'static str) -> CommandError {
    CommandError::UnknownEntity {
        id: id.raw(),
        expected,
    }
}
