#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Local spawner system that creates enemies around a fixed origin.
//!
//! A [`Spawner`] owns one [`VariantDescriptor`] per enemy kind it can produce
//! and periodically tries to spawn each of them. Every attempt must pass the
//! local limits of the descriptor and the level-wide admission check of the
//! [`Coordinator`], which the level driver lends to the spawner for the
//! duration of each tick.

mod death_watch;
mod placement;
mod variant;

use std::time::Duration;

use horde_core::{ActorId, Event, Host, Position, SpawnedActorRecord, SpawnerId, VariantId};
use horde_population::Coordinator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use death_watch::DeathWatch;

pub use variant::VariantDescriptor;

const MIN_DISTANCE_FLOOR: f32 = 0.1;
const DEFAULT_MAX_SPAWN_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_ATTEMPT_PERIOD: Duration = Duration::from_millis(500);
const DEFAULT_DEATH_POLL_PERIOD: Duration = Duration::from_millis(100);

/// Configuration parameters required to construct a spawner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    spawn_radius: f32,
    min_spawn_distance: f32,
    max_spawn_attempts: u32,
    initial_delay: Duration,
    attempt_period: Duration,
    death_poll_period: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the default cadence.
    ///
    /// Radius and player distance are floored at 0.1 world units.
    #[must_use]
    pub fn new(spawn_radius: f32, min_spawn_distance: f32, rng_seed: u64) -> Self {
        Self {
            spawn_radius: spawn_radius.max(MIN_DISTANCE_FLOOR),
            min_spawn_distance: min_spawn_distance.max(MIN_DISTANCE_FLOOR),
            max_spawn_attempts: DEFAULT_MAX_SPAWN_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            attempt_period: DEFAULT_ATTEMPT_PERIOD,
            death_poll_period: DEFAULT_DEATH_POLL_PERIOD,
            rng_seed,
        }
    }

    /// Sets the delay between starting the spawner and its first attempt.
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Sets the cadence of spawn attempts; zero attempts on every tick.
    #[must_use]
    pub fn with_attempt_period(mut self, attempt_period: Duration) -> Self {
        self.attempt_period = attempt_period;
        self
    }

    /// Sets how often spawned actors are checked for removal.
    #[must_use]
    pub fn with_death_poll_period(mut self, death_poll_period: Duration) -> Self {
        self.death_poll_period = death_poll_period;
        self
    }

    /// Sets how many candidate positions are tried per spawn, at least one.
    #[must_use]
    pub fn with_max_spawn_attempts(mut self, max_spawn_attempts: u32) -> Self {
        self.max_spawn_attempts = max_spawn_attempts.max(1);
        self
    }

    /// Radius around the origin in which actors appear.
    #[must_use]
    pub const fn spawn_radius(&self) -> f32 {
        self.spawn_radius
    }

    /// Distance the player must keep for spawning to happen.
    #[must_use]
    pub const fn min_spawn_distance(&self) -> f32 {
        self.min_spawn_distance
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Schedule {
    Stopped,
    Running { next_attempt_at: Duration },
    Retired,
}

/// Spawner that produces actors of its configured variants.
#[derive(Debug)]
pub struct Spawner {
    id: SpawnerId,
    origin: Position,
    config: Config,
    variants: Vec<VariantDescriptor>,
    schedule: Schedule,
    death_watch: DeathWatch,
    rng: ChaCha8Rng,
}

impl Spawner {
    /// Creates a stopped spawner with no variants.
    #[must_use]
    pub fn new(id: SpawnerId, origin: Position, config: Config) -> Self {
        Self {
            id,
            origin,
            config,
            variants: Vec::new(),
            schedule: Schedule::Stopped,
            death_watch: DeathWatch::new(config.death_poll_period),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Identifier of the spawner.
    #[must_use]
    pub const fn id(&self) -> SpawnerId {
        self.id
    }

    /// Centre of the spawn disc.
    #[must_use]
    pub const fn origin(&self) -> Position {
        self.origin
    }

    /// Reports whether periodic spawn attempts are scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.schedule, Schedule::Running { .. })
    }

    /// Reports whether the coordinator retired the spawner for good.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.schedule == Schedule::Retired
    }

    /// Schedules spawn attempts, the first one after the initial delay.
    ///
    /// Has no effect on a running or retired spawner.
    pub fn start(&mut self, now: Duration) {
        match self.schedule {
            Schedule::Stopped => {
                debug!(spawner = self.id.get(), "starting spawner");
                self.schedule = Schedule::Running {
                    next_attempt_at: now.saturating_add(self.config.initial_delay),
                };
            }
            Schedule::Running { .. } => {}
            Schedule::Retired => {
                debug!(spawner = self.id.get(), "ignoring start of retired spawner");
            }
        }
    }

    /// Cancels future spawn attempts. Spawned actors are left untouched and
    /// their deaths are still reported.
    pub fn stop(&mut self) {
        if self.is_running() {
            debug!(spawner = self.id.get(), "stopping spawner");
            self.schedule = Schedule::Stopped;
        }
    }

    /// Consumes coordinator events addressed to the spawner.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::SpawnersRetired { spawners } = event {
                if spawners.contains(&self.id) && !self.is_retired() {
                    debug!(spawner = self.id.get(), "spawner retired");
                    self.schedule = Schedule::Retired;
                }
            }
        }
    }

    /// Observes removed actors and, when due, attempts to spawn every variant.
    pub fn tick<H: Host + ?Sized>(
        &mut self,
        now: Duration,
        coordinator: &mut Coordinator,
        host: &mut H,
        out: &mut Vec<Event>,
    ) {
        let mut removed = Vec::new();
        self.death_watch.poll(now, &*host, &mut removed);
        for record in removed {
            self.record_death(record, coordinator, out);
        }

        if coordinator.is_level_complete() {
            self.stop();
        }

        let Schedule::Running { next_attempt_at } = self.schedule else {
            return;
        };
        if now < next_attempt_at {
            return;
        }
        self.schedule = Schedule::Running {
            next_attempt_at: now.saturating_add(self.config.attempt_period),
        };

        let player = host.player_position();
        if placement::is_player_too_close(self.origin, player, self.config.min_spawn_distance) {
            trace!(spawner = self.id.get(), "player too close; deferring spawns");
            return;
        }

        for index in 0..self.variants.len() {
            if self.admits(index, now, coordinator) {
                self.spawn(index, now, player, coordinator, host, out);
            }
        }
    }

    /// Reports that the host removed one of this spawner's actors.
    ///
    /// Returns `false` when the actor was not spawned here or was already
    /// reported.
    pub fn notify_removed(
        &mut self,
        actor: ActorId,
        coordinator: &mut Coordinator,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(record) = self.death_watch.forget(actor) else {
            return false;
        };
        self.record_death(record, coordinator, out);
        true
    }

    /// Adds a variant. A descriptor for an already configured variant is
    /// rejected and `false` is returned.
    pub fn add_variant(&mut self, descriptor: VariantDescriptor) -> bool {
        if self.variant(descriptor.variant()).is_some() {
            warn!(
                spawner = self.id.get(),
                variant = %descriptor.variant(),
                "variant already configured on spawner"
            );
            return false;
        }
        self.variants.push(descriptor);
        true
    }

    /// Removes a variant. Its live actors are still observed until removal.
    pub fn remove_variant(&mut self, variant: &VariantId) -> Option<VariantDescriptor> {
        let index = self.position_of(variant)?;
        Some(self.variants.remove(index))
    }

    /// Changes the local capacity of a variant. Returns `false` if unknown.
    pub fn set_variant_capacity(&mut self, variant: &VariantId, capacity: u32) -> bool {
        self.update_variant(variant, |descriptor| descriptor.set_capacity(capacity))
    }

    /// Changes the local maximum of a variant. Returns `false` if unknown.
    pub fn set_variant_maximum(&mut self, variant: &VariantId, maximum: u32) -> bool {
        self.update_variant(variant, |descriptor| descriptor.set_maximum(maximum))
    }

    /// Enables or disables a variant. Returns `false` if unknown.
    pub fn set_variant_active(&mut self, variant: &VariantId, active: bool) -> bool {
        self.update_variant(variant, |descriptor| descriptor.set_active(active))
    }

    /// Descriptor configured for the variant, if any.
    #[must_use]
    pub fn variant(&self, variant: &VariantId) -> Option<&VariantDescriptor> {
        self.variants
            .iter()
            .find(|descriptor| descriptor.variant() == variant)
    }

    /// Every configured descriptor in configuration order.
    #[must_use]
    pub fn variants(&self) -> &[VariantDescriptor] {
        &self.variants
    }

    /// Local alive count of the variant; zero when unknown.
    #[must_use]
    pub fn alive(&self, variant: &VariantId) -> u32 {
        self.variant(variant).map_or(0, VariantDescriptor::alive)
    }

    /// Local spawn total of the variant; zero when unknown.
    #[must_use]
    pub fn spawned(&self, variant: &VariantId) -> u32 {
        self.variant(variant).map_or(0, VariantDescriptor::spawned)
    }

    /// Local capacity of the variant; zero when unknown.
    #[must_use]
    pub fn capacity(&self, variant: &VariantId) -> u32 {
        self.variant(variant).map_or(0, VariantDescriptor::capacity)
    }

    /// Local maximum of the variant; zero when unknown.
    #[must_use]
    pub fn maximum(&self, variant: &VariantId) -> u32 {
        self.variant(variant).map_or(0, VariantDescriptor::maximum)
    }

    /// Number of spawned actors still being observed.
    #[must_use]
    pub fn tracked_actors(&self) -> usize {
        self.death_watch.len()
    }

    fn position_of(&self, variant: &VariantId) -> Option<usize> {
        self.variants
            .iter()
            .position(|descriptor| descriptor.variant() == variant)
    }

    fn update_variant(
        &mut self,
        variant: &VariantId,
        update: impl FnOnce(&mut VariantDescriptor),
    ) -> bool {
        match self.position_of(variant) {
            Some(index) => {
                update(&mut self.variants[index]);
                true
            }
            None => false,
        }
    }

    fn admits(&self, index: usize, now: Duration, coordinator: &Coordinator) -> bool {
        let descriptor = &self.variants[index];
        let variant = descriptor.variant();

        if !descriptor.is_active() {
            return false;
        }
        if descriptor.template().is_empty() {
            warn!(spawner = self.id.get(), %variant, "no template assigned");
            return false;
        }
        if !descriptor.interval_elapsed(now) {
            return false;
        }
        if descriptor.reached_local_capacity() {
            trace!(spawner = self.id.get(), %variant, "local capacity reached");
            return false;
        }
        if descriptor.reached_local_maximum() {
            trace!(spawner = self.id.get(), %variant, "local maximum reached");
            return false;
        }
        coordinator.can_spawn(variant)
    }

    fn spawn<H: Host + ?Sized>(
        &mut self,
        index: usize,
        now: Duration,
        player: Option<Position>,
        coordinator: &mut Coordinator,
        host: &mut H,
        out: &mut Vec<Event>,
    ) {
        let Some(position) = placement::find_spawn_position(
            &mut self.rng,
            self.origin,
            self.config.spawn_radius,
            player,
            self.config.min_spawn_distance,
            self.config.max_spawn_attempts,
        ) else {
            debug!(
                spawner = self.id.get(),
                variant = %self.variants[index].variant(),
                "no spawn position clear of the player"
            );
            return;
        };

        let descriptor = &mut self.variants[index];
        let Some(actor) = host.instantiate(descriptor.template(), position) else {
            debug!(
                spawner = self.id.get(),
                variant = %descriptor.variant(),
                "host declined to instantiate actor"
            );
            return;
        };

        descriptor.record_spawn(now);
        let variant = descriptor.variant().clone();
        debug!(
            spawner = self.id.get(),
            %variant,
            actor = actor.get(),
            alive = descriptor.alive(),
            spawned = descriptor.spawned(),
            "spawned actor"
        );

        out.push(Event::ActorSpawned {
            spawner: self.id,
            variant: variant.clone(),
            actor,
            position,
        });
        coordinator.on_spawned(&variant, out);
        self.death_watch.watch(SpawnedActorRecord {
            variant,
            owner: self.id,
            actor,
        });
    }

    fn record_death(
        &mut self,
        record: SpawnedActorRecord,
        coordinator: &mut Coordinator,
        out: &mut Vec<Event>,
    ) {
        if let Some(index) = self.position_of(&record.variant) {
            self.variants[index].record_death();
        }
        debug!(
            spawner = record.owner.get(),
            variant = %record.variant,
            actor = record.actor.get(),
            "actor removed"
        );

        out.push(Event::ActorDied {
            spawner: record.owner,
            variant: record.variant.clone(),
            actor: record.actor,
        });
        coordinator.on_died(&record.variant, out);
    }
}
