use serde::{Deserialize, Serialize};

use crate::combat::{engage, Combatant, Damage, Damageable, Engagement, Target};
use crate::grid::{Grid, WorldPos};
use crate::movement::Mover;
use crate::units::{self, UnitKind};
use crate::world::{EntityId, World};

/// Military unit: walks where it is told and fights whatever it is pointed
/// at until the target is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soldier {
    pub kind: UnitKind,
    pub mover: Mover,
    pub combat: Combatant,
}

impl Soldier {
    pub fn new(kind: UnitKind, position: WorldPos) -> Self {
        let def = units::definition(kind);
        Self {
            kind,
            mover: Mover::new(position, def.speed),
            combat: Combatant::new(def.max_hp, def.attack, def.range, def.cooldown_ms),
        }
    }

    pub fn position(&self) -> WorldPos {
        self.mover.position
    }

    pub fn target(&self) -> Option<Target> {
        self.combat.target
    }

    pub fn order_move(&mut self, grid: &Grid, dest: WorldPos) -> bool {
        if !self.mover.move_to(grid, dest) {
            return false;
        }
        self.combat.target = None;
        true
    }

    pub fn order_attack(&mut self, target: Target) {
        self.mover.stop();
        self.combat.target = Some(target);
    }
}

impl Damageable for Soldier {
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

pub fn update(world: &mut World, id: EntityId, soldier: &mut Soldier, dt_ms: u64) {
    soldier.mover.advance(dt_ms);
    let Some(target) = soldier.combat.target else {
        return;
    };
    match engage(world, Target::Soldier(id), &mut soldier.combat, &mut soldier.mover, target) {
        Engagement::Lost | Engagement::Unreachable => {
            soldier.combat.target = None;
            soldier.mover.stop();
        }
        _ => {}
    }
}
