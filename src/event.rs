//! Outbound events and delayed world callbacks.
//!
//! Events are appended to the world's outbox while systems run and handed
//! to the caller once per tick. Callbacks sit in a min-heap keyed by
//! `(due_ms, sequence)`, so two callbacks due at the same moment fire in
//! the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::animal::AnimalKind;
use crate::building::BuildingKind;
use crate::economy::ResourceKind;
use crate::technology::Age;
use crate::units::UnitKind;
use crate::world::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ResourceCollected {
        villager: EntityId,
        kind: ResourceKind,
        amount: u32,
    },
    UnitCreated {
        unit: EntityId,
        kind: UnitKind,
        x: f32,
        y: f32,
    },
    TechResearched {
        tech_id: String,
    },
    AgeAdvanced {
        age: Age,
    },
    ConstructionComplete {
        building: EntityId,
        kind: BuildingKind,
    },
    BuildingDestroyed {
        building: EntityId,
        kind: BuildingKind,
    },
    UnitKilled {
        unit: EntityId,
        kind: UnitKind,
    },
    AnimalKilled {
        animal: EntityId,
        kind: AnimalKind,
    },
    ResourceDepleted {
        resource: EntityId,
        kind: ResourceKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callback {
    RemoveCarcass { animal: EntityId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduled {
    pub due_ms: u64,
    pub sequence: u64,
    pub callback: Callback,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.sequence == other.sequence
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    heap: BinaryHeap<Scheduled>,
    next_sequence: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, callback: Callback) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Scheduled {
            due_ms,
            sequence,
            callback,
        });
    }

    pub fn pop_due(&mut self, now_ms: u64) -> Option<Scheduled> {
        if self.heap.peek().is_some_and(|s| s.due_ms <= now_ms) {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|s| s.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
