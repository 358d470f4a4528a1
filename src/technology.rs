
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::economy::Cost;
use crate::event::EventKind;
use crate::soldier::Soldier;
use crate::units::UnitKind;
use crate::villager::Villager;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Age {
    #[default]
    Dark,
    Feudal,
}

impl Age {
    pub fn label(self) -> &'static str {
        match self {
            Age::Dark => "Dark Age",
            Age::Feudal => "Feudal Age",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Villager,
    Militia,
    AllUnits,
}

impl EffectTarget {
    pub fn matches(self, kind: UnitKind) -> bool {
        match self {
            EffectTarget::Villager => kind == UnitKind::Villager,
            EffectTarget::Militia => kind == UnitKind::Militia,
            EffectTarget::AllUnits => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    MaxHp,
    Attack,
    CarryCapacity,
    GatherRate,
}

/// Additive stat change.
#[derive(Debug, Clone, Copy)]
pub struct Effect {
    pub target: EffectTarget,
    pub stat: Stat,
    pub value: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TechDefinition {
    pub id: &'static str,
    pub display: &'static str,
    pub cost: Cost,
    pub research_ms: u64,
    pub effects: &'static [Effect],
    pub prerequisites: &'static [&'static str],
    pub advances_to: Option<Age>,
}

const TECH_TREE: &[TechDefinition] = &[
    TechDefinition {
        id: "feudal_age",
        display: "Feudal Age",
        cost: Cost::new(0, 500, 0, 0),
        research_ms: 5_000,
        effects: &[],
        prerequisites: &[],
        advances_to: Some(Age::Feudal),
    },
    TechDefinition {
        id: "loom",
        display: "Loom",
        cost: Cost::new(0, 0, 50, 0),
        research_ms: 3_000,
        effects: &[Effect {
            target: EffectTarget::Villager,
            stat: Stat::MaxHp,
            value: 15,
        }],
        prerequisites: &[],
        advances_to: None,
    },
    TechDefinition {
        id: "wheelbarrow",
        display: "Wheelbarrow",
        cost: Cost::new(50, 175, 0, 0),
        research_ms: 7_500,
        effects: &[Effect {
            target: EffectTarget::Villager,
            stat: Stat::CarryCapacity,
            value: 5,
        }],
        prerequisites: &["feudal_age"],
        advances_to: None,
    },
];

pub fn definition(id: &str) -> Option<&'static TechDefinition> {
    TECH_TREE.iter().find(|def| def.id == id)
}

/// Researched and in-flight techs plus the display age.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechState {
    pub researched: Vec<String>,
    pub pending: Vec<String>,
    pub age: Age,
}

impl TechState {
    pub fn is_researched(&self, id: &str) -> bool {
        self.researched.iter().any(|t| t == id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|t| t == id)
    }

    /// First prerequisite of `def` not yet researched.
    pub fn missing_prerequisite(&self, def: &TechDefinition) -> Option<&'static str> {
        def.prerequisites
            .iter()
            .copied()
            .find(|dep| !self.is_researched(dep))
    }

    pub fn cancel_pending(&mut self, id: &str) {
        self.pending.retain(|t| t != id);
    }

    fn researched_effects(&self) -> impl Iterator<Item = &'static Effect> + '_ {
        self.researched
            .iter()
            .filter_map(|id| definition(id))
            .flat_map(|def| def.effects.iter())
    }
}

pub fn apply_to_villager(effect: &Effect, villager: &mut Villager) {
    if !effect.target.matches(UnitKind::Villager) {
        return;
    }
    match effect.stat {
        Stat::MaxHp => villager.combat.raise_max_hp(effect.value),
        Stat::Attack => villager.combat.attack += effect.value,
        Stat::CarryCapacity => villager.carry_capacity += effect.value,
        Stat::GatherRate => villager.gather_rate += effect.value,
    }
}

pub fn apply_to_soldier(effect: &Effect, soldier: &mut Soldier) {
    if !effect.target.matches(soldier.kind) {
        return;
    }
    match effect.stat {
        Stat::MaxHp => soldier.combat.raise_max_hp(effect.value),
        Stat::Attack => soldier.combat.attack += effect.value,
        Stat::CarryCapacity | Stat::GatherRate => {}
    }
}

/// Bring a freshly created villager up to the researched level.
pub fn catch_up_villager(tech: &TechState, villager: &mut Villager) {
    for effect in tech.researched_effects() {
        apply_to_villager(effect, villager);
    }
}

pub fn catch_up_soldier(tech: &TechState, soldier: &mut Soldier) {
    for effect in tech.researched_effects() {
        apply_to_soldier(effect, soldier);
    }
}

/// Mark `id` researched and apply its effects to every live unit. Returns
/// false for unknown or already researched techs.
pub fn complete_research(world: &mut World, id: &str) -> bool {
    let Some(def) = definition(id) else {
        return false;
    };
    if world.tech.is_researched(def.id) {
        return false;
    }
    world.tech.cancel_pending(def.id);
    world.tech.researched.push(def.id.to_string());

    for effect in def.effects {
        for villager in world.villagers.values_mut() {
            apply_to_villager(effect, villager);
        }
        for soldier in world.soldiers.values_mut() {
            apply_to_soldier(effect, soldier);
        }
    }

    info!(tick = world.tick(), tech = def.id, "research complete");
    world.emit(EventKind::TechResearched {
        tech_id: def.id.to_string(),
    });

    if let Some(age) = def.advances_to {
        if age > world.tech.age {
            world.tech.age = age;
            info!(tick = world.tick(), age = age.label(), "advanced age");
            world.emit(EventKind::AgeAdvanced { age });
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheelbarrow_waits_for_feudal_age() {
        let mut state = TechState::default();
        let wheelbarrow = definition("wheelbarrow").unwrap();
        assert_eq!(state.missing_prerequisite(wheelbarrow), Some("feudal_age"));
        state.researched.push("feudal_age".into());
        assert_eq!(state.missing_prerequisite(wheelbarrow), None);
        assert_eq!(state.missing_prerequisite(definition("loom").unwrap()), None);
    }

    #[test]
    fn effect_targets_filter_unit_kinds() {
        assert!(EffectTarget::Villager.matches(UnitKind::Villager));
        assert!(!EffectTarget::Villager.matches(UnitKind::Militia));
        assert!(EffectTarget::AllUnits.matches(UnitKind::Militia));
    }
}
