use serde::{Deserialize, Serialize};

use crate::economy::Cost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Villager,
    Militia,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        definition(self).id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnitDefinition {
    pub kind: UnitKind,
    pub id: &'static str,
    pub cost: Cost,
    pub train_ms: u64,
    pub max_hp: u32,
    pub attack: u32,
    pub range: f32,
    pub cooldown_ms: u64,
    pub speed: f32,
}

const UNITS: &[UnitDefinition] = &[
    UnitDefinition {
        kind: UnitKind::Villager,
        id: "villager",
        cost: Cost::new(0, 50, 0, 0),
        train_ms: 5_000,
        max_hp: 25,
        attack: 3,
        range: 40.0,
        cooldown_ms: 1_000,
        speed: 120.0,
    },
    UnitDefinition {
        kind: UnitKind::Militia,
        id: "militia",
        cost: Cost::new(0, 60, 20, 0),
        train_ms: 6_000,
        max_hp: 60,
        attack: 6,
        range: 40.0,
        cooldown_ms: 1_000,
        speed: 110.0,
    },
];

pub fn definition(kind: UnitKind) -> &'static UnitDefinition {
    match kind {
        UnitKind::Villager => &UNITS[0],
        UnitKind::Militia => &UNITS[1],
    }
}

pub fn lookup(id: &str) -> Option<&'static UnitDefinition> {
    UNITS.iter().find(|def| def.id == id)
}

/// Villager economy numbers.
pub mod work {
    pub const GATHER_RATE: u32 = 5;
    pub const BUILD_RATE: f32 = 10.0;
    pub const CARRY_CAPACITY: u32 = 10;
    pub const INTERVAL_MS: u64 = 1_000;

    pub const GATHER_REACH: f32 = 40.0;
    pub const HUNT_REACH: f32 = 40.0;
    pub const BUILD_REACH: f32 = 60.0;
    pub const DROP_OFF_REACH: f32 = 50.0;
}
