#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level-wide population state for Horde.
//!
//! The [`Coordinator`] owns one [`GlobalLimit`] per variant and is the only
//! component allowed to decide whether a variant may be spawned anywhere in
//! the level. Spawners borrow it mutably for the duration of their tick, so
//! every admission check is immediately followed by its commit.

mod limits;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use horde_core::{Event, SpawnerId, VariantId};
use tracing::{debug, info, trace, warn};

pub use limits::{GlobalLimit, LimitStatus};

const DEFAULT_RETIRE_DELAY: Duration = Duration::from_secs(2);

/// Controls how spawners are wound down once the level runs out of enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionPolicy {
    retire_spawners: bool,
    retire_delay: Duration,
}

impl CompletionPolicy {
    /// Creates a policy with explicit retirement settings.
    #[must_use]
    pub const fn new(retire_spawners: bool, retire_delay: Duration) -> Self {
        Self {
            retire_spawners,
            retire_delay,
        }
    }

    /// Whether spawners are retired when every variant is exhausted.
    #[must_use]
    pub const fn retire_spawners(&self) -> bool {
        self.retire_spawners
    }

    /// Delay between exhausting every variant and retiring spawners.
    #[must_use]
    pub const fn retire_delay(&self) -> Duration {
        self.retire_delay
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new(true, DEFAULT_RETIRE_DELAY)
    }
}

/// Lifecycle of a level as seen by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// Enemies remain to be spawned or defeated.
    Active,
    /// Every variant spawned its maximum and nothing is left alive.
    Complete,
}

/// Outcome of registering a global limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Registration {
    /// A new limit was inserted with zeroed counters.
    Inserted,
    /// A limit already existed and was left untouched.
    AlreadyRegistered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Retirement {
    Idle,
    Scheduled { at: Duration },
    Done,
}

/// Level-wide authority on which variants may be spawned.
#[derive(Debug)]
pub struct Coordinator {
    limits: BTreeMap<VariantId, GlobalLimit>,
    spawners: BTreeSet<SpawnerId>,
    policy: CompletionPolicy,
    phase: LevelPhase,
    maximums_announced: bool,
    retirement: Retirement,
    now: Duration,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CompletionPolicy::default())
    }
}

impl Coordinator {
    /// Creates an empty coordinator for a fresh level.
    #[must_use]
    pub fn new(policy: CompletionPolicy) -> Self {
        Self {
            limits: BTreeMap::new(),
            spawners: BTreeSet::new(),
            policy,
            phase: LevelPhase::Active,
            maximums_announced: false,
            retirement: Retirement::Idle,
            now: Duration::ZERO,
        }
    }

    /// Registers the global limit for a variant.
    ///
    /// Existing limits are never overwritten. Capacity is clamped into
    /// `1..=maximum` and the maximum is at least one.
    pub fn register_limit(
        &mut self,
        variant: VariantId,
        capacity: u32,
        maximum: u32,
    ) -> Registration {
        if self.limits.contains_key(&variant) {
            debug!(%variant, "global limit already registered");
            return Registration::AlreadyRegistered;
        }

        if capacity > maximum {
            warn!(%variant, capacity, maximum, "global capacity exceeds maximum; clamping");
        }

        if self.phase == LevelPhase::Active {
            if let Retirement::Scheduled { .. } = self.retirement {
                debug!(%variant, "new variant registered; cancelling spawner retirement");
                self.retirement = Retirement::Idle;
            }
            self.maximums_announced = false;
        }

        let limit = GlobalLimit::new(variant.clone(), capacity, maximum);
        info!(
            %variant,
            capacity = limit.capacity(),
            maximum = limit.maximum(),
            "registered global limit"
        );
        let _ = self.limits.insert(variant, limit);
        Registration::Inserted
    }

    /// Adds a spawner to the set retired when the level wraps up.
    pub fn register_spawner(&mut self, spawner: SpawnerId) {
        if self.spawners.insert(spawner) {
            debug!(spawner = spawner.get(), "registered spawner");
        }
    }

    /// Removes a spawner from the retirement set.
    pub fn unregister_spawner(&mut self, spawner: SpawnerId) {
        if self.spawners.remove(&spawner) {
            debug!(spawner = spawner.get(), "unregistered spawner");
        }
    }

    /// Reports whether the variant may be spawned anywhere right now.
    #[must_use]
    pub fn can_spawn(&self, variant: &VariantId) -> bool {
        if self.phase == LevelPhase::Complete {
            return false;
        }

        let Some(limit) = self.limits.get(variant) else {
            trace!(%variant, "no global limit registered");
            return false;
        };

        if limit.has_reached_maximum() {
            trace!(%variant, "global maximum reached");
            return false;
        }

        if limit.has_reached_capacity() {
            trace!(%variant, "global capacity reached");
            return false;
        }

        true
    }

    /// Records a spawn of the variant and re-evaluates level progress.
    pub fn on_spawned(&mut self, variant: &VariantId, out: &mut Vec<Event>) {
        let Some(limit) = self.limits.get_mut(variant) else {
            warn!(%variant, "spawn reported for unregistered variant");
            return;
        };

        let Some(transitions) = limit.record_spawn() else {
            warn!(%variant, "spawn reported past the global maximum; ignoring");
            return;
        };

        debug!(
            %variant,
            alive = limit.alive(),
            capacity = limit.capacity(),
            spawned = limit.spawned(),
            maximum = limit.maximum(),
            "spawn recorded"
        );

        if transitions.maximum_reached {
            info!(%variant, maximum = limit.maximum(), "global maximum reached");
            out.push(Event::GlobalMaximumReached {
                variant: variant.clone(),
            });
        }

        if transitions.capacity_reached {
            info!(%variant, capacity = limit.capacity(), "global capacity reached");
            out.push(Event::GlobalCapacityReached {
                variant: variant.clone(),
            });
        }

        self.evaluate(out);
    }

    /// Records a death of the variant and re-evaluates level progress.
    pub fn on_died(&mut self, variant: &VariantId, out: &mut Vec<Event>) {
        let Some(limit) = self.limits.get_mut(variant) else {
            warn!(%variant, "death reported for unregistered variant");
            return;
        };

        let freed = limit.record_death();
        debug!(
            %variant,
            alive = limit.alive(),
            spawned = limit.spawned(),
            "death recorded"
        );

        if freed {
            info!(%variant, "global capacity freed");
            out.push(Event::GlobalCapacityFreed {
                variant: variant.clone(),
            });
        }

        self.evaluate(out);
    }

    /// Changes the global capacity of a registered variant.
    ///
    /// Returns `false` when the variant is unknown.
    pub fn set_global_capacity(&mut self, variant: &VariantId, capacity: u32) -> bool {
        let Some(limit) = self.limits.get_mut(variant) else {
            warn!(%variant, "capacity change for unregistered variant");
            return false;
        };
        limit.set_capacity(capacity);
        true
    }

    /// Changes the global maximum of a registered variant.
    ///
    /// The maximum never drops below the number already spawned. Returns
    /// `false` when the variant is unknown.
    pub fn set_global_maximum(
        &mut self,
        variant: &VariantId,
        maximum: u32,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(limit) = self.limits.get_mut(variant) else {
            warn!(%variant, "maximum change for unregistered variant");
            return false;
        };
        limit.set_maximum(maximum);
        self.evaluate(out);
        true
    }

    /// Advances the coordinator clock and re-evaluates level progress,
    /// firing a due spawner retirement.
    ///
    /// A level without any registered limit completes on its first advance.
    pub fn advance(&mut self, now: Duration, out: &mut Vec<Event>) {
        self.now = self.now.max(now);
        self.evaluate(out);
        if let Retirement::Scheduled { at } = self.retirement {
            if self.now >= at {
                self.retire_spawners(out);
            }
        }
    }

    /// Reports whether the level has been cleared. Once true, stays true.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        self.phase == LevelPhase::Complete
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    /// Reports whether the spawners were already retired.
    #[must_use]
    pub fn spawners_retired(&self) -> bool {
        self.retirement == Retirement::Done
    }

    fn evaluate(&mut self, out: &mut Vec<Event>) {
        if self.phase == LevelPhase::Complete {
            return;
        }

        let exhausted = self.limits.values().all(GlobalLimit::has_reached_maximum);
        if !exhausted {
            if let Retirement::Scheduled { .. } = self.retirement {
                debug!("spawn budget raised; cancelling spawner retirement");
                self.retirement = Retirement::Idle;
                self.maximums_announced = false;
            }
            return;
        }

        if !self.maximums_announced {
            self.maximums_announced = true;
            info!("every variant reached its global maximum");
            out.push(Event::AllMaximumsReached);
            if self.policy.retire_spawners() && self.retirement == Retirement::Idle {
                let at = self.now.saturating_add(self.policy.retire_delay());
                self.retirement = Retirement::Scheduled { at };
            }
        }

        if self.limits.values().all(GlobalLimit::is_cleared) {
            self.phase = LevelPhase::Complete;
            info!("level complete: all enemies spawned and defeated");
            if self.policy.retire_spawners() {
                self.retire_spawners(out);
            }
        }
    }

    fn retire_spawners(&mut self, out: &mut Vec<Event>) {
        if self.retirement == Retirement::Done {
            return;
        }
        self.retirement = Retirement::Done;

        let spawners: Vec<SpawnerId> = self.spawners.iter().copied().collect();
        info!(count = spawners.len(), "retiring spawners");
        out.push(Event::SpawnersRetired { spawners });
    }
}

/// Query functions that provide read-only access to the coordinator state.
pub mod query {
    use horde_core::{SpawnerId, VariantId};

    use super::{Coordinator, GlobalLimit};

    /// Retrieves the limit registered for the variant, if any.
    #[must_use]
    pub fn limit<'a>(coordinator: &'a Coordinator, variant: &VariantId) -> Option<&'a GlobalLimit> {
        coordinator.limits.get(variant)
    }

    /// Iterates over every registered limit ordered by variant.
    pub fn limits(coordinator: &Coordinator) -> impl Iterator<Item = &GlobalLimit> {
        coordinator.limits.values()
    }

    /// Spawners that will be retired when the level wraps up.
    #[must_use]
    pub fn spawners(coordinator: &Coordinator) -> Vec<SpawnerId> {
        coordinator.spawners.iter().copied().collect()
    }

    /// Number of actors of the variant currently alive; zero when unregistered.
    #[must_use]
    pub fn global_alive(coordinator: &Coordinator, variant: &VariantId) -> u32 {
        limit(coordinator, variant).map_or(0, GlobalLimit::alive)
    }

    /// Global capacity of the variant; zero when unregistered.
    #[must_use]
    pub fn global_capacity(coordinator: &Coordinator, variant: &VariantId) -> u32 {
        limit(coordinator, variant).map_or(0, GlobalLimit::capacity)
    }

    /// Actors of the variant spawned so far; zero when unregistered.
    #[must_use]
    pub fn global_spawned(coordinator: &Coordinator, variant: &VariantId) -> u32 {
        limit(coordinator, variant).map_or(0, GlobalLimit::spawned)
    }

    /// Global maximum of the variant; zero when unregistered.
    #[must_use]
    pub fn global_maximum(coordinator: &Coordinator, variant: &VariantId) -> u32 {
        limit(coordinator, variant).map_or(0, GlobalLimit::maximum)
    }

    /// Reports whether the capacity gate of the variant is closed.
    #[must_use]
    pub fn is_global_capacity_reached(coordinator: &Coordinator, variant: &VariantId) -> bool {
        limit(coordinator, variant).is_some_and(GlobalLimit::has_reached_capacity)
    }

    /// Reports whether the variant spent its spawn budget.
    #[must_use]
    pub fn is_global_maximum_reached(coordinator: &Coordinator, variant: &VariantId) -> bool {
        limit(coordinator, variant).is_some_and(GlobalLimit::has_reached_maximum)
    }
}
