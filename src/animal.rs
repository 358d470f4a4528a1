//! Huntable wildlife.
//!
//! Animals wander on a timer. Aggressive kinds carry a `Combatant` and turn
//! on whoever hits them first; passive kinds go down to any hit. A dead
//! animal stays in the world as a carcass until its removal callback fires.

use serde::{Deserialize, Serialize};

use crate::combat::{engage, Combatant, Damage, Damageable, Engagement, Target};
use crate::grid::WorldPos;
use crate::movement::Mover;
use crate::rng::RngExt;
use crate::world::{EntityId, World};

pub const WANDER_INTERVAL_MS: u64 = 2_000;
pub const IDLE_CHANCE: f32 = 0.3;
pub const CARCASS_DECAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalKind {
    Sheep,
    Deer,
    Boar,
}

#[derive(Debug, Clone, Copy)]
pub struct FightStats {
    pub hp: u32,
    pub attack: u32,
    pub range: f32,
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct AnimalStats {
    pub kind: AnimalKind,
    pub id: &'static str,
    pub food: u32,
    pub speed: f32,
    /// Present only for kinds that fight back.
    pub fight: Option<FightStats>,
}

const ANIMALS: &[AnimalStats] = &[
    AnimalStats {
        kind: AnimalKind::Sheep,
        id: "sheep",
        food: 100,
        speed: 15.0,
        fight: None,
    },
    AnimalStats {
        kind: AnimalKind::Deer,
        id: "deer",
        food: 140,
        speed: 30.0,
        fight: None,
    },
    AnimalStats {
        kind: AnimalKind::Boar,
        id: "boar",
        food: 200,
        speed: 25.0,
        fight: Some(FightStats {
            hp: 75,
            attack: 6,
            range: 40.0,
            cooldown_ms: 1_500,
        }),
    },
];

pub fn stats(kind: AnimalKind) -> &'static AnimalStats {
    match kind {
        AnimalKind::Sheep => &ANIMALS[0],
        AnimalKind::Deer => &ANIMALS[1],
        AnimalKind::Boar => &ANIMALS[2],
    }
}

impl AnimalKind {
    pub fn as_str(self) -> &'static str {
        stats(self).id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub kind: AnimalKind,
    pub mover: Mover,
    pub combat: Option<Combatant>,
    food: u32,
    dead: bool,
    heading: (f32, f32),
    wander_timer_ms: u64,
}

impl Animal {
    pub fn new(kind: AnimalKind, position: WorldPos) -> Self {
        let stats = stats(kind);
        Self {
            kind,
            mover: Mover::new(position, stats.speed),
            combat: stats
                .fight
                .map(|f| Combatant::new(f.hp, f.attack, f.range, f.cooldown_ms)),
            food: stats.food,
            dead: false,
            heading: (0.0, 0.0),
            // First update picks a heading straight away.
            wander_timer_ms: WANDER_INTERVAL_MS,
        }
    }

    pub fn food(&self) -> u32 {
        self.food
    }

    /// Hand over whatever food is left on the carcass.
    pub fn take_food(&mut self) -> u32 {
        std::mem::take(&mut self.food)
    }

    pub fn is_aggressive(&self) -> bool {
        self.combat.is_some()
    }

    pub fn target(&self) -> Option<Target> {
        self.combat.as_ref().and_then(|c| c.target)
    }

    pub fn hp(&self) -> u32 {
        match (&self.combat, self.dead) {
            (Some(c), _) => c.hp,
            (None, true) => 0,
            (None, false) => 1,
        }
    }

    /// Flag dead and report the food on offer.
    pub fn kill(&mut self) -> u32 {
        self.dead = true;
        if let Some(combat) = self.combat.as_mut() {
            combat.hp = 0;
            combat.target = None;
        }
        self.mover.stop();
        self.food
    }

    pub fn heading(&self) -> (f32, f32) {
        self.heading
    }
}

impl Damageable for Animal {
    fn take_damage(&mut self, amount: u32, attacker: Option<Target>) -> Damage {
        if self.dead {
            return Damage::Ignored;
        }
        let Some(combat) = self.combat.as_mut() else {
            self.kill();
            return Damage::Killed;
        };
        match combat.take_damage(amount) {
            Damage::Killed => {
                self.kill();
                Damage::Killed
            }
            Damage::Hit(hp) => {
                if combat.target.is_none() {
                    combat.target = attacker;
                }
                Damage::Hit(hp)
            }
            Damage::Ignored => Damage::Ignored,
        }
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn position(&self) -> WorldPos {
        self.mover.position
    }
}

pub fn update(
    world: &mut World,
    id: EntityId,
    animal: &mut Animal,
    dt_ms: u64,
    rng: &mut impl RngExt,
) {
    if animal.dead {
        return;
    }
    animal.mover.advance(dt_ms);

    if let Some(combat) = animal.combat.as_mut() {
        if let Some(target) = combat.target {
            match engage(world, Target::Animal(id), combat, &mut animal.mover, target) {
                Engagement::Lost | Engagement::Unreachable => {
                    combat.target = None;
                    animal.mover.stop();
                    animal.wander_timer_ms = WANDER_INTERVAL_MS;
                }
                _ => return,
            }
        }
    }

    wander(world, animal, dt_ms, rng);
}

fn wander(world: &World, animal: &mut Animal, dt_ms: u64, rng: &mut impl RngExt) {
    animal.wander_timer_ms += dt_ms;
    if animal.wander_timer_ms >= WANDER_INTERVAL_MS {
        animal.wander_timer_ms = 0;
        animal.heading = if rng.chance(IDLE_CHANCE) {
            (0.0, 0.0)
        } else {
            rng.heading()
        };
    }

    let (hx, hy) = animal.heading;
    if hx == 0.0 && hy == 0.0 {
        return;
    }
    let step = animal.mover.speed * dt_ms as f32 / 1000.0;
    let next = WorldPos::new(
        animal.mover.position.x + hx * step,
        animal.mover.position.y + hy * step,
    );
    let grid = world.grid();
    if grid.is_walkable(grid.to_cartesian(next)) {
        animal.mover.position = next;
    } else {
        animal.heading = (0.0, 0.0);
    }
}
