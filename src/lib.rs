//! Headless simulation core for a small isometric real-time strategy game:
//! villagers gather, hunt and build, buildings train units and research
//! technologies, and everything advances in fixed ticks.

pub mod animal;
pub mod building;
pub mod combat;
pub mod command;
pub mod economy;
pub mod engine;
pub mod event;
pub mod grid;
pub mod movement;
pub mod pathfinding;
pub mod resource;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod soldier;
pub mod systems;
pub mod technology;
pub mod units;
pub mod villager;
pub mod world;

pub use command::{Command, CommandError};
pub use engine::{default_engine, Engine, EngineBuilder, EngineSettings, TickSummary};
pub use event::{EventKind, SimEvent};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{EntityId, World};
