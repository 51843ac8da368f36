//! Level-wide population limits tracked per variant.

use horde_core::VariantId;

/// Coarse state of a limit, used by overlays and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitStatus {
    /// The variant may currently be spawned.
    Open,
    /// Too many actors are alive; a death reopens the gate.
    AtCapacity,
    /// The spawn budget is spent for the remainder of the level.
    Exhausted,
}

/// Global capacity and maximum for one variant, owned by the coordinator.
///
/// `alive <= spawned <= maximum` holds after every mutation. `alive` may
/// exceed `capacity` only when the capacity was lowered at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalLimit {
    variant: VariantId,
    capacity: u32,
    maximum: u32,
    alive: u32,
    spawned: u32,
}

/// Flags raised by a recorded spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SpawnTransitions {
    pub(crate) capacity_reached: bool,
    pub(crate) maximum_reached: bool,
}

impl GlobalLimit {
    /// Creates a limit with zeroed counters, clamping `1 <= capacity <= maximum`.
    pub(crate) fn new(variant: VariantId, capacity: u32, maximum: u32) -> Self {
        let maximum = maximum.max(1);
        Self {
            variant,
            capacity: capacity.clamp(1, maximum),
            maximum,
            alive: 0,
            spawned: 0,
        }
    }

    /// Variant governed by this limit.
    #[must_use]
    pub fn variant(&self) -> &VariantId {
        &self.variant
    }

    /// Maximum number of actors alive at once across all spawners.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total number of actors that may be spawned during the level.
    #[must_use]
    pub const fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Number of actors currently alive.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.alive
    }

    /// Number of actors spawned since the level started.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Reports whether the alive count closed the capacity gate.
    #[must_use]
    pub const fn has_reached_capacity(&self) -> bool {
        self.alive >= self.capacity
    }

    /// Reports whether the spawn budget is spent.
    #[must_use]
    pub const fn has_reached_maximum(&self) -> bool {
        self.spawned >= self.maximum
    }

    /// Reports whether another actor of this variant may be spawned.
    #[must_use]
    pub const fn admits_spawn(&self) -> bool {
        !self.has_reached_capacity() && !self.has_reached_maximum()
    }

    /// Reports whether the variant spawned everything and nothing is left alive.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.has_reached_maximum() && self.alive == 0
    }

    /// Summarises the limit for overlays.
    #[must_use]
    pub const fn status(&self) -> LimitStatus {
        if self.has_reached_maximum() {
            LimitStatus::Exhausted
        } else if self.has_reached_capacity() {
            LimitStatus::AtCapacity
        } else {
            LimitStatus::Open
        }
    }

    /// Counts a spawn. Returns `None` when the budget is already spent.
    pub(crate) fn record_spawn(&mut self) -> Option<SpawnTransitions> {
        if self.has_reached_maximum() {
            return None;
        }

        let was_at_capacity = self.has_reached_capacity();
        self.spawned += 1;
        self.alive += 1;

        Some(SpawnTransitions {
            capacity_reached: !was_at_capacity && self.has_reached_capacity(),
            maximum_reached: self.has_reached_maximum(),
        })
    }

    /// Counts a death, returning whether the capacity gate reopened.
    pub(crate) fn record_death(&mut self) -> bool {
        let was_at_capacity = self.has_reached_capacity();
        self.alive = self.alive.saturating_sub(1);
        was_at_capacity && !self.has_reached_capacity()
    }

    pub(crate) fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity.clamp(1, self.maximum);
    }

    /// Updates the maximum; never drops below what was already spawned.
    pub(crate) fn set_maximum(&mut self, maximum: u32) {
        self.maximum = maximum.max(1).max(self.spawned);
        self.capacity = self.capacity.min(self.maximum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(capacity: u32, maximum: u32) -> GlobalLimit {
        GlobalLimit::new(VariantId::new("Settler1"), capacity, maximum)
    }

    #[test]
    fn construction_clamps_capacity_to_maximum() {
        let clamped = limit(12, 4);
        assert_eq!(clamped.capacity(), 4);
        assert_eq!(clamped.maximum(), 4);

        let floored = limit(0, 0);
        assert_eq!(floored.capacity(), 1);
        assert_eq!(floored.maximum(), 1);
    }

    #[test]
    fn spawn_reports_gate_transitions_once() {
        let mut limit = limit(1, 2);

        let first = limit.record_spawn().expect("budget available");
        assert!(first.capacity_reached);
        assert!(!first.maximum_reached);

        let second = limit.record_spawn().expect("budget available");
        assert!(!second.capacity_reached, "gate was already closed");
        assert!(second.maximum_reached);

        assert!(limit.record_spawn().is_none(), "budget spent");
        assert_eq!(limit.spawned(), 2);
        assert_eq!(limit.alive(), 2);
    }

    #[test]
    fn death_floors_at_zero() {
        let mut limit = limit(2, 3);
        assert!(!limit.record_death());
        assert_eq!(limit.alive(), 0);
    }

    #[test]
    fn lowering_maximum_keeps_spawned_budget() {
        let mut limit = limit(3, 10);
        for _ in 0..5 {
            let _ = limit.record_spawn();
        }
        limit.set_maximum(2);
        assert_eq!(limit.maximum(), 5);
        assert_eq!(limit.capacity(), 3);
        assert_eq!(limit.status(), LimitStatus::Exhausted);
    }

    #[test]
    fn lowering_capacity_closes_gate_without_touching_counts() {
        let mut limit = limit(4, 10);
        let _ = limit.record_spawn();
        let _ = limit.record_spawn();
        limit.set_capacity(1);
        assert_eq!(limit.alive(), 2);
        assert_eq!(limit.status(), LimitStatus::AtCapacity);
        assert!(!limit.record_death(), "still above the lowered capacity");
        assert!(limit.record_death());
    }
}
