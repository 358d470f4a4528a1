//! Hit points, cooldown-gated attacks and the shared chase/strike loop.

use serde::{Deserialize, Serialize};

use crate::grid::WorldPos;
use crate::movement::Mover;
use crate::world::{EntityId, World};

/// A chaser re-plans once its path ends this far from the quarry.
pub const REPATH_DRIFT: f32 = 32.0;

/// Handle to anything that can be attacked, fixed when the order is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Villager(EntityId),
    Soldier(EntityId),
    Animal(EntityId),
    Building(EntityId),
}

impl Target {
    pub fn id(self) -> EntityId {
        match self {
            Target::Villager(id) | Target::Soldier(id) | Target::Animal(id) | Target::Building(id) => id,
        }
    }
}

/// Result of a single `take_damage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// Still standing with this much hp left.
    Hit(u32),
    /// This call took the last hit point.
    Killed,
    /// Already dead; nothing changed.
    Ignored,
}

pub trait Damageable {
    fn take_damage(&mut self, amount: u32, attacker: Option<Target>) -> Damage;
    fn is_dead(&self) -> bool;
    fn position(&self) -> WorldPos;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub range: f32,
    pub cooldown_ms: u64,
    pub last_attack_ms: Option<u64>,
    pub target: Option<Target>,
}

impl Combatant {
    pub fn new(max_hp: u32, attack: u32, range: f32, cooldown_ms: u64) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            attack,
            range,
            cooldown_ms,
            last_attack_ms: None,
            target: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Lowers hp, clamping at zero. `Killed` is reported once, on the call
    /// that crosses from alive to dead.
    pub fn take_damage(&mut self, amount: u32) -> Damage {
        if self.is_dead() {
            return Damage::Ignored;
        }
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            Damage::Killed
        } else {
            Damage::Hit(self.hp)
        }
    }

    pub fn ready(&self, now_ms: u64) -> bool {
        self.last_attack_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.cooldown_ms)
    }

    pub fn raise_max_hp(&mut self, amount: u32) {
        if self.is_dead() {
            return;
        }
        self.max_hp += amount;
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

/// Outcome of one tick of pursuing a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Struck(Damage),
    /// In range, waiting on the cooldown.
    Cooling,
    Chasing,
    /// Target gone or already dead.
    Lost,
    /// No path towards the target.
    Unreachable,
}

/// Strike `target` when in range and off cooldown, otherwise walk towards
/// it. Deaths caused by the strike are resolved through the world.
pub fn engage(
    world: &mut World,
    attacker: Target,
    combatant: &mut Combatant,
    mover: &mut Mover,
    target: Target,
) -> Engagement {
    let Some(target_pos) = world.live_target_position(target) else {
        return Engagement::Lost;
    };

    let in_reach = match target {
        Target::Building(_) => world
            .grid()
            .within_reach(mover.position, target_pos, combatant.range),
        _ => mover.position.distance(target_pos) <= combatant.range,
    };
    if in_reach {
        mover.stop();
        let now = world.now_ms();
        if !combatant.ready(now) {
            return Engagement::Cooling;
        }
        combatant.last_attack_ms = Some(now);
        return Engagement::Struck(world.strike(attacker, target, combatant.attack));
    }

    let drifted = mover
        .destination()
        .map_or(true, |dest| dest.distance(target_pos) > REPATH_DRIFT);
    if drifted && !mover.move_to(world.grid(), target_pos) && !mover.is_moving() {
        return Engagement::Unreachable;
    }
    Engagement::Chasing
}
