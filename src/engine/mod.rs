use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::Result;

use crate::{
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    world::{RenderFrame, Weather, World},
};

/// A state-change request. Commands are queued from anywhere and applied at
/// the start of the next tick, never mid-tick.
#[derive(Debug, Clone)]
pub enum Command {
    SetDay,
    SetNight,
    SetClear,
    SetRain,
    SetStorm,
    SpawnWalker { name: String },
}

/// Shared handle onto the engine's command queue. Cheap to clone; safe to
/// push from other threads (the observer's HTTP handlers do).
#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn push(&self, command: Command) {
        self.inner
            .lock()
            .expect("command queue lock poisoned")
            .push_back(command);
    }

    pub(crate) fn drain(&self) -> Vec<Command> {
        let mut guard = self.inner.lock().expect("command queue lock poisoned");
        guard.drain(..).collect()
    }
}

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

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            queue: CommandQueue::default(),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    queue: CommandQueue,
    settings: EngineSettings,
}

impl Engine {
    /// Handle for queueing commands while the engine runs.
    pub fn queue(&self) -> CommandQueue {
        self.queue.clone()
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook(
        &mut self,
        world: &mut World,
        ticks: u64,
        mut hook: impl FnMut(RenderFrame),
    ) -> Result<()> {
        for _ in 0..ticks {
            let current_tick = world.tick();

            for command in self.queue.drain() {
                Self::apply(world, command, &mut self.rng.stream("spawn"));
            }
            world.admit_due_walkers(current_tick, &mut self.rng.stream("spawn"));

            for system in &mut self.systems {
                let mut rng_stream = self.rng.stream(system.name());
                let ctx = SystemContext {
                    tick: current_tick,
                    dt_secs: world.dt_secs(),
                    elapsed_secs: world.elapsed_secs(),
                    scenario_name: &self.settings.scenario_name,
                };
                system.run(&ctx, world, &mut rng_stream)?;
            }

            world.advance_time();
            let frame = world.frame();
            self.snapshot_writer
                .maybe_write(&frame, &self.settings.scenario_name)?;
            hook(frame);
        }
        Ok(())
    }

    fn apply(world: &mut World, command: Command, rng: &mut SystemRng<'_>) {
        match command {
            Command::SetDay => world.set_day(true),
            Command::SetNight => world.set_day(false),
            Command::SetClear => world.set_weather(Weather::Clear),
            Command::SetRain => world.set_weather(Weather::Rain),
            Command::SetStorm => world.set_weather(Weather::Storm),
            Command::SpawnWalker { name } => {
                world.spawn_walker(name, rng);
            }
        }
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub dt_secs: f32,
    pub elapsed_secs: f32,
    pub scenario_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
