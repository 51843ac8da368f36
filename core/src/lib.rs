#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde population engine.
//!
//! This crate defines the vocabulary that connects the level coordinator,
//! the spawner and completion systems, and the host adapters. Spawners reach
//! the host engine exclusively through the [`Host`] trait, the coordinator
//! and systems broadcast [`Event`] values describing every observable
//! transition, and adapters consume those events for presentation.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Key identifying an enemy kind within a level.
///
/// Local descriptors and global limits are correlated by this key only. Every
/// spawned actor carries its variant explicitly, so classification never
/// depends on actor naming.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Creates a new variant identifier from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for VariantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reference to the host template instantiated for a variant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(String);

impl TemplateRef {
    /// Creates a template reference from the provided host-side name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the template name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reports whether no template was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Unique identifier assigned to a spawner within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnerId(u32);

impl SpawnerId {
    /// Creates a new spawner identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to an actor instantiated by the host.
///
/// The host owns the actor; holders of an `ActorId` only observe it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates a new actor handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location in the level's 2D plane measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// World origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Creates a new position from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Returns the position displaced by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Computes the Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Observation of an actor created by a spawner.
///
/// Lives exactly as long as the actor; dropping the record is what produces
/// the death event for its variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnedActorRecord {
    /// Variant the actor was spawned as.
    pub variant: VariantId,
    /// Spawner that created the actor.
    pub owner: SpawnerId,
    /// Host handle of the actor.
    pub actor: ActorId,
}

/// Events broadcast by the coordinator and systems after every transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a spawner instantiated a new actor.
    ActorSpawned {
        /// Spawner responsible for the actor.
        spawner: SpawnerId,
        /// Variant the actor belongs to.
        variant: VariantId,
        /// Host handle assigned to the actor.
        actor: ActorId,
        /// Position the actor was placed at.
        position: Position,
    },
    /// Confirms that a spawned actor was removed from the level.
    ActorDied {
        /// Spawner that created the actor.
        spawner: SpawnerId,
        /// Variant the actor belonged to.
        variant: VariantId,
        /// Host handle of the removed actor.
        actor: ActorId,
    },
    /// Announces that the number of alive actors hit the global capacity.
    GlobalCapacityReached {
        /// Variant whose capacity gate closed.
        variant: VariantId,
    },
    /// Announces that a death reopened the global capacity gate.
    GlobalCapacityFreed {
        /// Variant whose capacity gate reopened.
        variant: VariantId,
    },
    /// Announces that a variant spawned its global maximum.
    GlobalMaximumReached {
        /// Variant that exhausted its spawn budget.
        variant: VariantId,
    },
    /// Announces that every registered variant exhausted its spawn budget.
    AllMaximumsReached,
    /// Instructs the listed spawners to stop for the remainder of the level.
    SpawnersRetired {
        /// Spawners retired by the coordinator.
        spawners: Vec<SpawnerId>,
    },
    /// One-shot signal that the level has been cleared.
    LevelCompleted,
}

/// Narrow interface to the engine hosting the population core.
///
/// Implementations must tolerate repeated queries for actors that were
/// already removed.
pub trait Host {
    /// Instantiates the template at the position, returning the new actor.
    ///
    /// Returns `None` when the host cannot create the actor; callers leave all
    /// bookkeeping untouched in that case.
    fn instantiate(&mut self, template: &TemplateRef, position: Position) -> Option<ActorId>;

    /// Current player position, if a player exists.
    fn player_position(&self) -> Option<Position>;

    /// Reports whether the actor is still present in the level.
    fn is_alive(&self, actor: ActorId) -> bool;
}
