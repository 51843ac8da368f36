//! Observation of spawned actors until the host removes them.

use std::time::Duration;

use horde_core::{ActorId, Host, SpawnedActorRecord};

/// Tracks the actors created by one spawner and detects their removal.
///
/// Removal is detected by polling [`Host::is_alive`] at a bounded cadence, or
/// reported directly through [`DeathWatch::forget`].
#[derive(Debug)]
pub(crate) struct DeathWatch {
    records: Vec<SpawnedActorRecord>,
    poll_period: Duration,
    next_poll_at: Duration,
}

impl DeathWatch {
    pub(crate) fn new(poll_period: Duration) -> Self {
        Self {
            records: Vec::new(),
            poll_period,
            next_poll_at: Duration::ZERO,
        }
    }

    pub(crate) fn watch(&mut self, record: SpawnedActorRecord) {
        self.records.push(record);
    }

    /// Stops observing the actor, returning its record if it was tracked.
    pub(crate) fn forget(&mut self, actor: ActorId) -> Option<SpawnedActorRecord> {
        let index = self.records.iter().position(|record| record.actor == actor)?;
        Some(self.records.remove(index))
    }

    /// Moves the records of every removed actor into `removed`, in spawn order.
    pub(crate) fn poll<H: Host + ?Sized>(
        &mut self,
        now: Duration,
        host: &H,
        removed: &mut Vec<SpawnedActorRecord>,
    ) {
        if now < self.next_poll_at || self.records.is_empty() {
            return;
        }
        self.next_poll_at = now.saturating_add(self.poll_period);

        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| host.is_alive(record.actor));
        self.records = alive;
        removed.extend(dead);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
