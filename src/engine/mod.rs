use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    event::SimEvent,
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    systems::{AnimalSystem, BookkeepingSystem, BuildingSystem, EconomySystem, UnitSystem},
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

/// The canonical system order: units act, animals react, buildings
/// produce, then the economy and bookkeeping settle the results.
pub fn default_engine(settings: EngineSettings) -> Engine {
    EngineBuilder::new(settings)
        .with_system(UnitSystem::new())
        .with_system(AnimalSystem::new())
        .with_system(BuildingSystem::new())
        .with_system(EconomySystem::new())
        .with_system(BookkeepingSystem::new())
        .build()
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Advance the clock by one tick and run every system once, in
    /// registration order.
    pub fn step(&mut self, world: &mut World) -> Result<TickSummary> {
        world.advance_time();
        let ctx = SystemContext {
            tick: world.tick(),
            dt_ms: world.dt_ms(),
            scenario_name: &self.settings.scenario_name,
        };

        let mut system_reports = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let start = Instant::now();
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system {} failed on tick {}", system.name(), ctx.tick))?;
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }

        let events = world.drain_events();
        if !events.is_empty() {
            debug!(tick = ctx.tick, events = events.len(), "tick produced events");
        }
        let snapshot_path = self
            .snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;

        Ok(TickSummary {
            tick: ctx.tick,
            elapsed_ms: world.now_ms(),
            events,
            system_reports,
            snapshot_path,
        })
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        for _ in 0..ticks {
            let summary = self.step(world)?;
            hook(&summary);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct TickSummary {
    pub tick: u64,
    /// Simulated time at the end of the tick.
    pub elapsed_ms: u64,
    pub events: Vec<SimEvent>,
    pub system_reports: Vec<SystemRunReport>,
    pub snapshot_path: Option<PathBuf>,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub dt_ms: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    struct Counter {
        seen: Vec<u64>,
    }

    impl System for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn run(
            &mut self,
            ctx: &SystemContext,
            _world: &mut World,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            self.seen.push(ctx.tick);
            Ok(())
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            scenario_name: "unit".into(),
            seed: 7,
            snapshot_interval_ticks: 0,
            snapshot_dir: PathBuf::from("unused"),
        }
    }

    #[test]
    fn step_advances_the_clock_before_systems_run() {
        let mut world = World::new(Grid::new(4, 4, 64.0, 32.0), 50);
        let mut engine = EngineBuilder::new(settings())
            .with_system(Counter { seen: Vec::new() })
            .build();
        let first = engine.step(&mut world).unwrap();
        let second = engine.step(&mut world).unwrap();
        assert_eq!((first.tick, first.elapsed_ms), (1, 50));
        assert_eq!((second.tick, second.elapsed_ms), (2, 100));
        assert_eq!(second.system_reports.len(), 1);
        assert_eq!(second.system_reports[0].name, "counter");
        assert!(second.snapshot_path.is_none());
    }

    #[test]
    fn default_engine_registers_the_canonical_order() {
        let engine = default_engine(settings());
        assert_eq!(
            engine.system_names(),
            vec!["units", "animals", "buildings", "economy", "bookkeeping"]
        );
    }
}
