use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::combat::{Damage, Damageable, Target};
use crate::economy::Cost;
use crate::grid::{Cell, WorldPos};
use crate::technology;
use crate::units::{self, UnitKind};

pub const COMPLETE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    TownCenter,
    House,
    Barracks,
    Market,
    Mill,
    Farm,
}

impl BuildingKind {
    pub fn as_str(self) -> &'static str {
        definition(self).id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildingDefinition {
    pub kind: BuildingKind,
    pub id: &'static str,
    pub cost: Cost,
    pub max_hp: u32,
    pub housing: u32,
    pub trains: &'static [UnitKind],
    pub researches: &'static [&'static str],
}

const BUILDINGS: &[BuildingDefinition] = &[
    BuildingDefinition {
        kind: BuildingKind::TownCenter,
        id: "town_center",
        cost: Cost::new(275, 0, 0, 100),
        max_hp: 1_000,
        housing: 5,
        trains: &[UnitKind::Villager],
        researches: &["feudal_age", "loom", "wheelbarrow"],
    },
    BuildingDefinition {
        kind: BuildingKind::House,
        id: "house",
        cost: Cost::new(50, 0, 0, 0),
        max_hp: 1_000,
        housing: 5,
        trains: &[],
        researches: &[],
    },
    BuildingDefinition {
        kind: BuildingKind::Barracks,
        id: "barracks",
        cost: Cost::new(150, 0, 0, 0),
        max_hp: 1_000,
        housing: 0,
        trains: &[UnitKind::Militia],
        researches: &[],
    },
    BuildingDefinition {
        kind: BuildingKind::Market,
        id: "market",
        cost: Cost::new(100, 0, 50, 0),
        max_hp: 1_000,
        housing: 0,
        trains: &[],
        researches: &[],
    },
    BuildingDefinition {
        kind: BuildingKind::Mill,
        id: "mill",
        cost: Cost::new(100, 0, 0, 0),
        max_hp: 1_000,
        housing: 0,
        trains: &[],
        researches: &[],
    },
    BuildingDefinition {
        kind: BuildingKind::Farm,
        id: "farm",
        cost: Cost::new(60, 0, 0, 0),
        max_hp: 1_000,
        housing: 0,
        trains: &[],
        researches: &[],
    },
];

pub fn definition(kind: BuildingKind) -> &'static BuildingDefinition {
    match kind {
        BuildingKind::TownCenter => &BUILDINGS[0],
        BuildingKind::House => &BUILDINGS[1],
        BuildingKind::Barracks => &BUILDINGS[2],
        BuildingKind::Market => &BUILDINGS[3],
        BuildingKind::Mill => &BUILDINGS[4],
        BuildingKind::Farm => &BUILDINGS[5],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", content = "id", rename_all = "snake_case")]
pub enum ProductionItem {
    Unit(UnitKind),
    Research(String),
}

impl ProductionItem {
    pub fn duration_ms(&self) -> u64 {
        match self {
            ProductionItem::Unit(kind) => units::definition(*kind).train_ms,
            ProductionItem::Research(id) => {
                technology::definition(id).map_or(0, |def| def.research_ms)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub cell: Cell,
    pub position: WorldPos,
    hp: u32,
    max_hp: u32,
    progress: f32,
    completed: bool,
    queue: VecDeque<ProductionItem>,
    production_ms: u64,
}

impl Building {
    /// Freshly placed foundation with a single hit point.
    pub fn foundation(kind: BuildingKind, cell: Cell, position: WorldPos) -> Self {
        Self {
            kind,
            cell,
            position,
            hp: 1,
            max_hp: definition(kind).max_hp,
            progress: 0.0,
            completed: false,
            queue: VecDeque::new(),
            production_ms: 0,
        }
    }

    pub fn completed(kind: BuildingKind, cell: Cell, position: WorldPos) -> Self {
        let mut building = Self::foundation(kind, cell, position);
        building.finish();
        building
    }

    pub fn definition(&self) -> &'static BuildingDefinition {
        definition(self.kind)
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn queue(&self) -> impl Iterator<Item = &ProductionItem> {
        self.queue.iter()
    }

    pub fn queued_units(&self) -> usize {
        self.queue
            .iter()
            .filter(|item| matches!(item, ProductionItem::Unit(_)))
            .count()
    }

    pub fn production_ms(&self) -> u64 {
        self.production_ms
    }

    fn finish(&mut self) {
        self.progress = COMPLETE;
        self.completed = true;
        self.hp = self.max_hp;
    }

    /// Add construction work. Returns true when the building is (now or
    /// already) complete; finished buildings are left untouched.
    pub fn construct(&mut self, amount: f32) -> bool {
        if self.completed {
            return true;
        }
        self.progress = (self.progress + amount.max(0.0)).min(COMPLETE);
        if self.progress >= COMPLETE {
            self.finish();
            return true;
        }
        let gained = (amount.max(0.0) * self.max_hp as f32 / COMPLETE).round() as u32;
        self.hp = (self.hp + gained).min(self.max_hp);
        false
    }

    pub fn can_train(&self, kind: UnitKind) -> bool {
        self.definition().trains.contains(&kind)
    }

    pub fn can_research(&self, tech: &str) -> bool {
        self.definition().researches.contains(&tech)
    }

    pub fn enqueue(&mut self, item: ProductionItem) {
        self.queue.push_back(item);
    }

    /// Run the head of the queue for `dt_ms`, returning it once finished.
    /// Nothing advances before construction is complete.
    pub fn advance_production(&mut self, dt_ms: u64) -> Option<ProductionItem> {
        if !self.completed {
            return None;
        }
        let duration = self.queue.front()?.duration_ms();
        self.production_ms += dt_ms;
        if self.production_ms < duration {
            return None;
        }
        self.production_ms = 0;
        self.queue.pop_front()
    }

    /// Empty the queue, e.g. when the building is destroyed.
    pub fn drain_queue(&mut self) -> Vec<ProductionItem> {
        self.production_ms = 0;
        self.queue.drain(..).collect()
    }
}

impl Damageable for Building {
    /// Unfinished buildings take double damage.
    fn take_damage(&mut self, amount: u32, _attacker: Option<Target>) -> Damage {
        if self.hp == 0 {
            return Damage::Ignored;
        }
        let amount = if self.completed {
            amount
        } else {
            amount.saturating_mul(2)
        };
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            Damage::Killed
        } else {
            Damage::Hit(self.hp)
        }
    }

    fn is_dead(&self) -> bool {
        self.hp == 0
    }

    fn position(&self) -> WorldPos {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house() -> Building {
        Building::foundation(BuildingKind::House, Cell::new(3, 3), WorldPos::default())
    }

    #[test]
    fn ten_constructs_of_ten_complete_on_the_tenth() {
        let mut building = house();
        for call in 1..=9 {
            assert!(!building.construct(10.0), "completed early on call {call}");
            assert!(!building.is_completed());
        }
        assert!(building.construct(10.0));
        assert!(building.is_completed());
        assert_eq!(building.hp(), building.max_hp());
        assert_eq!(building.progress(), COMPLETE);
    }

    #[test]
    fn construct_past_completion_changes_nothing() {
        let mut building = house();
        building.construct(250.0);
        assert_eq!(building.progress(), COMPLETE);
        building.take_damage(100, None);
        let hp = building.hp();
        assert!(building.construct(10.0));
        assert_eq!(building.hp(), hp);
        assert_eq!(building.progress(), COMPLETE);
    }

    #[test]
    fn hp_rises_with_progress() {
        let mut building = house();
        building.construct(25.0);
        assert_eq!(building.hp(), 251);
        assert!(building.hp() <= building.max_hp());
    }

    #[test]
    fn foundations_take_double_damage() {
        let mut building = house();
        building.construct(50.0);
        let before = building.hp();
        building.take_damage(10, None);
        assert_eq!(building.hp(), before - 20);

        let mut done = Building::completed(BuildingKind::House, Cell::new(0, 0), WorldPos::default());
        done.take_damage(10, None);
        assert_eq!(done.hp(), 990);
    }

    #[test]
    fn destruction_is_reported_once() {
        let mut building = house();
        assert_eq!(building.take_damage(1, None), Damage::Killed);
        assert_eq!(building.take_damage(1, None), Damage::Ignored);
        assert!(building.is_dead());
    }

    #[test]
    fn production_waits_for_completion_and_runs_fifo() {
        let mut tc = Building::foundation(BuildingKind::TownCenter, Cell::new(0, 0), WorldPos::default());
        tc.enqueue(ProductionItem::Unit(UnitKind::Villager));
        tc.enqueue(ProductionItem::Research("loom".into()));
        assert_eq!(tc.advance_production(10_000), None);

        tc.construct(100.0);
        assert_eq!(tc.advance_production(4_999), None);
        assert_eq!(
            tc.advance_production(1),
            Some(ProductionItem::Unit(UnitKind::Villager))
        );
        assert_eq!(tc.production_ms(), 0);
        assert_eq!(tc.advance_production(2_000), None);
        assert_eq!(
            tc.advance_production(1_000),
            Some(ProductionItem::Research("loom".into()))
        );
        assert_eq!(tc.advance_production(1_000), None);
    }

    #[test]
    fn buildings_know_what_they_offer() {
        let tc = Building::completed(BuildingKind::TownCenter, Cell::new(0, 0), WorldPos::default());
        assert!(tc.can_train(UnitKind::Villager));
        assert!(!tc.can_train(UnitKind::Militia));
        assert!(tc.can_research("loom"));
        assert!(!house().can_research("loom"));
        assert_eq!(definition(BuildingKind::Market).cost, Cost::new(100, 0, 50, 0));
    }
}
