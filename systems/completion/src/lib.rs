#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level completion detector.
//!
//! Watches the coordinator after every batch of events and announces the end
//! of the level exactly once.

use std::time::Duration;

use horde_core::Event;
use horde_population::Coordinator;
use tracing::info;

const DEFAULT_OUTRO_DELAY: Duration = Duration::from_secs(2);

/// Completion state of the current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionState {
    /// The level is still being played.
    Active,
    /// The level was cleared at the recorded time.
    Complete {
        /// Simulation time at which completion was first observed.
        at: Duration,
    },
}

/// Emits [`Event::LevelCompleted`] once the coordinator reports a cleared level.
#[derive(Debug)]
pub struct LevelCompletion {
    state: CompletionState,
    outro_delay: Duration,
    outro_fired: bool,
}

impl Default for LevelCompletion {
    fn default() -> Self {
        Self::new(DEFAULT_OUTRO_DELAY)
    }
}

impl LevelCompletion {
    /// Creates an active detector whose outro fires `outro_delay` after completion.
    #[must_use]
    pub fn new(outro_delay: Duration) -> Self {
        Self {
            state: CompletionState::Active,
            outro_delay,
            outro_fired: false,
        }
    }

    /// Current completion state.
    #[must_use]
    pub const fn state(&self) -> CompletionState {
        self.state
    }

    /// Reports whether completion has been announced.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, CompletionState::Complete { .. })
    }

    /// Time at which the level was completed, if it was.
    #[must_use]
    pub const fn completed_at(&self) -> Option<Duration> {
        match self.state {
            CompletionState::Active => None,
            CompletionState::Complete { at } => Some(at),
        }
    }

    /// Re-evaluates completion against the coordinator once per host tick.
    ///
    /// Pushes [`Event::LevelCompleted`] the first time the coordinator reports
    /// a cleared level; later calls never emit it again.
    pub fn handle(&mut self, now: Duration, coordinator: &Coordinator, out: &mut Vec<Event>) {
        if self.is_complete() || !coordinator.is_level_complete() {
            return;
        }

        info!(at = ?now, "level completed");
        self.state = CompletionState::Complete { at: now };
        out.push(Event::LevelCompleted);
    }

    /// Returns `true` exactly once, when the outro delay has elapsed since
    /// completion.
    pub fn pending_outro(&mut self, now: Duration) -> bool {
        let Some(at) = self.completed_at() else {
            return false;
        };
        if self.outro_fired || now < at.saturating_add(self.outro_delay) {
            return false;
        }
        self.outro_fired = true;
        true
    }
}
