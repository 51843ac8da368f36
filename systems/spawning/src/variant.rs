//! Per-spawner configuration and bookkeeping for one enemy variant.

use std::time::Duration;

use horde_core::{TemplateRef, VariantId};

const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(100);

/// Local spawn settings and counters for one variant owned by a spawner.
///
/// Capacity bounds how many actors spawned by this spawner may be alive at
/// once; the maximum bounds how many it may spawn in total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantDescriptor {
    variant: VariantId,
    template: TemplateRef,
    spawn_interval: Duration,
    capacity: u32,
    maximum: u32,
    active: bool,
    alive: u32,
    spawned: u32,
    last_spawn_at: Duration,
}

impl VariantDescriptor {
    /// Creates an active descriptor with zeroed counters.
    ///
    /// The interval is at least 100ms, the maximum at least one and the
    /// capacity is clamped into `1..=maximum`.
    #[must_use]
    pub fn new(
        variant: VariantId,
        template: TemplateRef,
        spawn_interval: Duration,
        capacity: u32,
        maximum: u32,
    ) -> Self {
        let maximum = maximum.max(1);
        Self {
            variant,
            template,
            spawn_interval: spawn_interval.max(MIN_SPAWN_INTERVAL),
            capacity: capacity.clamp(1, maximum),
            maximum,
            active: true,
            alive: 0,
            spawned: 0,
            last_spawn_at: Duration::ZERO,
        }
    }

    /// Returns the descriptor with the provided activation flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Variant spawned by this descriptor.
    #[must_use]
    pub fn variant(&self) -> &VariantId {
        &self.variant
    }

    /// Host template instantiated for the variant.
    #[must_use]
    pub fn template(&self) -> &TemplateRef {
        &self.template
    }

    /// Minimum time between two spawns of the variant.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Maximum number of this spawner's actors alive at once.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total number of actors this spawner may create.
    #[must_use]
    pub const fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Whether the variant participates in spawning.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Actors spawned by this spawner that are still alive.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.alive
    }

    /// Actors spawned by this spawner so far.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Simulation time of the latest spawn, or zero before the first one.
    #[must_use]
    pub const fn last_spawn_at(&self) -> Duration {
        self.last_spawn_at
    }

    /// Reports whether the local alive count reached the capacity.
    #[must_use]
    pub const fn reached_local_capacity(&self) -> bool {
        self.alive >= self.capacity
    }

    /// Reports whether the local spawn budget is spent.
    #[must_use]
    pub const fn reached_local_maximum(&self) -> bool {
        self.spawned >= self.maximum
    }

    /// Reports whether the spawn interval elapsed since the latest spawn.
    #[must_use]
    pub fn interval_elapsed(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_spawn_at) >= self.spawn_interval
    }

    pub(crate) fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity.clamp(1, self.maximum);
    }

    pub(crate) fn set_maximum(&mut self, maximum: u32) {
        self.maximum = maximum.max(1);
        self.capacity = self.capacity.min(self.maximum);
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn record_spawn(&mut self, now: Duration) {
        self.alive += 1;
        self.spawned += 1;
        self.last_spawn_at = now;
    }

    pub(crate) fn record_death(&mut self) {
        self.alive = self.alive.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(capacity: u32, maximum: u32) -> VariantDescriptor {
        VariantDescriptor::new(
            VariantId::new("Settler1"),
            TemplateRef::new("settler"),
            Duration::from_secs(2),
            capacity,
            maximum,
        )
    }

    #[test]
    fn construction_clamps_limits_and_interval() {
        let clamped = VariantDescriptor::new(
            VariantId::new("Settler1"),
            TemplateRef::new("settler"),
            Duration::ZERO,
            7,
            0,
        );
        assert_eq!(clamped.maximum(), 1);
        assert_eq!(clamped.capacity(), 1);
        assert_eq!(clamped.spawn_interval(), MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn flags_follow_counters() {
        let mut descriptor = descriptor(1, 2);
        assert!(!descriptor.reached_local_capacity());

        descriptor.record_spawn(Duration::from_secs(3));
        assert!(descriptor.reached_local_capacity());
        assert!(!descriptor.reached_local_maximum());
        assert_eq!(descriptor.last_spawn_at(), Duration::from_secs(3));

        descriptor.record_death();
        descriptor.record_death();
        assert_eq!(descriptor.alive(), 0);

        descriptor.record_spawn(Duration::from_secs(6));
        assert!(descriptor.reached_local_maximum());
    }

    #[test]
    fn interval_measured_from_latest_spawn() {
        let mut descriptor = descriptor(3, 10);
        assert!(!descriptor.interval_elapsed(Duration::from_millis(1_999)));
        assert!(descriptor.interval_elapsed(Duration::from_secs(2)));

        descriptor.record_spawn(Duration::from_secs(5));
        assert!(!descriptor.interval_elapsed(Duration::from_secs(6)));
        assert!(descriptor.interval_elapsed(Duration::from_secs(7)));
    }

    #[test]
    fn lowering_maximum_pulls_capacity_down() {
        let mut descriptor = descriptor(5, 10);
        descriptor.set_maximum(3);
        assert_eq!(descriptor.capacity(), 3);
        descriptor.set_capacity(9);
        assert_eq!(descriptor.capacity(), 3);
    }
}
