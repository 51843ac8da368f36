//! Headless level simulation driving spawners against a scripted host.

use std::{collections::BTreeSet, fmt, time::Duration};

use glam::Vec2;
use horde_core::{ActorId, Event, Host, Position, TemplateRef, VariantId};
use horde_population::{query, Coordinator};
use horde_system_completion::LevelCompletion;
use horde_system_spawning::Spawner;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::level_config::Level;

const MIN_TIMESTEP: Duration = Duration::from_millis(1);
const PATROL_RADIUS: f32 = 24.0;
const PATROL_ANGULAR_SPEED: f32 = 0.2;

/// Parameters of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SimulationOptions {
    duration: Duration,
    timestep: Duration,
    kill_chance: f64,
    seed: u64,
}

impl SimulationOptions {
    /// Creates options; the timestep is at least a millisecond and the kill
    /// chance is a per-second probability clamped into `0..=1`.
    pub(crate) fn new(
        duration: Duration,
        timestep: Duration,
        kill_chance: f64,
        seed: u64,
    ) -> Self {
        Self {
            duration,
            timestep: timestep.max(MIN_TIMESTEP),
            kill_chance: if kill_chance.is_nan() {
                0.0
            } else {
                kill_chance.clamp(0.0, 1.0)
            },
            seed,
        }
    }
}

/// Host that keeps actors as bare ids and moves the player on a circle.
#[derive(Debug)]
struct SimulatedHost {
    rng: ChaCha8Rng,
    actors: BTreeSet<ActorId>,
    next_actor: u64,
    player: Vec2,
    patrol_angle: f32,
    kill_chance: f64,
}

impl SimulatedHost {
    fn new(options: &SimulationOptions) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(options.seed),
            actors: BTreeSet::new(),
            next_actor: 0,
            player: Vec2::new(PATROL_RADIUS, 0.0),
            patrol_angle: 0.0,
            kill_chance: options.kill_chance,
        }
    }

    /// Moves the player along its patrol and lets it remove actors.
    fn step(&mut self, dt: Duration) {
        self.patrol_angle += PATROL_ANGULAR_SPEED * dt.as_secs_f32();
        self.player = Vec2::new(self.patrol_angle.cos(), self.patrol_angle.sin()) * PATROL_RADIUS;

        let chance = (self.kill_chance * dt.as_secs_f64()).clamp(0.0, 1.0);
        let rng = &mut self.rng;
        self.actors.retain(|_| !rng.gen_bool(chance));
    }
}

impl Host for SimulatedHost {
    fn instantiate(&mut self, template: &TemplateRef, position: Position) -> Option<ActorId> {
        self.next_actor += 1;
        let actor = ActorId::new(self.next_actor);
        let _ = self.actors.insert(actor);
        debug!(
            template = template.as_str(),
            actor = actor.get(),
            x = position.x(),
            y = position.y(),
            "instantiated actor"
        );
        Some(actor)
    }

    fn player_position(&self) -> Option<Position> {
        Some(Position::new(self.player.x, self.player.y))
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.contains(&actor)
    }
}

/// Final counters of one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct VariantSummary {
    pub(crate) variant: VariantId,
    pub(crate) alive: u32,
    pub(crate) capacity: u32,
    pub(crate) spawned: u32,
    pub(crate) maximum: u32,
}

/// Outcome of a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Report {
    pub(crate) elapsed: Duration,
    pub(crate) completed_at: Option<Duration>,
    pub(crate) spawns: u32,
    pub(crate) deaths: u32,
    pub(crate) retired_spawners: usize,
    pub(crate) variants: Vec<VariantSummary>,
}

impl Report {
    fn new(elapsed: Duration, completion: &LevelCompletion, coordinator: &Coordinator) -> Self {
        let variants = query::limits(coordinator)
            .map(|limit| VariantSummary {
                variant: limit.variant().clone(),
                alive: limit.alive(),
                capacity: limit.capacity(),
                spawned: limit.spawned(),
                maximum: limit.maximum(),
            })
            .collect();
        Self {
            elapsed,
            completed_at: completion.completed_at(),
            spawns: 0,
            deaths: 0,
            retired_spawners: 0,
            variants,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.completed_at {
            Some(at) => writeln!(f, "level complete at {:.1}s", at.as_secs_f32())?,
            None => writeln!(
                f,
                "level still active after {:.1}s",
                self.elapsed.as_secs_f32()
            )?,
        }
        writeln!(
            f,
            "spawned {} / defeated {} / spawners retired {}",
            self.spawns, self.deaths, self.retired_spawners
        )?;
        for summary in &self.variants {
            let mut markers = String::new();
            if summary.spawned >= summary.maximum {
                markers.push_str(" [MAX]");
            }
            if summary.alive >= summary.capacity {
                markers.push_str(" [CAP]");
            }
            writeln!(
                f,
                "  {:<12} alive {:>3}/{:<3} spawned {:>3}/{:<3}{markers}",
                summary.variant.as_str(),
                summary.alive,
                summary.capacity,
                summary.spawned,
                summary.maximum,
            )?;
        }
        Ok(())
    }
}

/// Runs the level until its outro fires or the duration elapses.
pub(crate) fn run(level: Level, options: &SimulationOptions) -> Report {
    let Level {
        mut coordinator,
        mut spawners,
        outro_delay,
    } = level;
    let mut host = SimulatedHost::new(options);
    let mut completion = LevelCompletion::new(outro_delay);

    for spawner in &mut spawners {
        spawner.start(Duration::ZERO);
    }

    let mut spawns = 0;
    let mut deaths = 0;
    let mut retired_spawners = 0;
    let mut now = Duration::ZERO;
    loop {
        let mut events = Vec::new();
        coordinator.advance(now, &mut events);
        tick_spawners(&mut spawners, now, &mut coordinator, &mut host, &mut events);
        completion.handle(now, &coordinator, &mut events);

        for event in &events {
            match event {
                Event::ActorSpawned { .. } => spawns += 1,
                Event::ActorDied { .. } => deaths += 1,
                Event::SpawnersRetired { spawners } => retired_spawners += spawners.len(),
                _ => {}
            }
        }

        if completion.pending_outro(now) {
            info!(at = ?now, "outro finished");
            break;
        }
        if now >= options.duration {
            break;
        }
        host.step(options.timestep);
        now = now.saturating_add(options.timestep);
    }

    Report {
        spawns,
        deaths,
        retired_spawners,
        ..Report::new(now, &completion, &coordinator)
    }
}

fn tick_spawners(
    spawners: &mut [Spawner],
    now: Duration,
    coordinator: &mut Coordinator,
    host: &mut SimulatedHost,
    events: &mut Vec<Event>,
) {
    for spawner in spawners.iter_mut() {
        spawner.handle(events);
        spawner.tick(now, coordinator, host, events);
    }
    for spawner in spawners.iter_mut() {
        spawner.handle(events);
    }
}
