//! Level files describing global limits, completion policy and spawners.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use horde_core::{Position, SpawnerId, TemplateRef, VariantId};
use horde_population::{query, CompletionPolicy, Coordinator, Registration};
use horde_system_spawning::{Config, Spawner, VariantDescriptor};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Level played when no level file is supplied.
const DEFAULT_LEVEL: &str = include_str!("../levels/default.toml");

/// Errors raised while loading a level file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The level file could not be read.
    #[error("failed to read level file {path}")]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The level file is not valid TOML or does not match the schema.
    #[error("invalid level description")]
    Parse(#[from] toml::de::Error),
}

/// Parsed level file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelFile {
    #[serde(default)]
    pub(crate) completion: CompletionSection,
    #[serde(default)]
    pub(crate) limits: Vec<LimitEntry>,
    #[serde(default)]
    pub(crate) spawners: Vec<SpawnerEntry>,
}

/// How the level winds down once it runs out of enemies.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct CompletionSection {
    pub(crate) retire_spawners: bool,
    pub(crate) retire_delay_ms: u64,
    pub(crate) outro_delay_ms: u64,
}

impl Default for CompletionSection {
    fn default() -> Self {
        Self {
            retire_spawners: true,
            retire_delay_ms: 2_000,
            outro_delay_ms: 2_000,
        }
    }
}

/// Level-wide limit of one variant.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitEntry {
    pub(crate) variant: String,
    pub(crate) capacity: u32,
    pub(crate) maximum: u32,
}

/// One spawner placed in the level.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpawnerEntry {
    pub(crate) id: u32,
    pub(crate) origin: [f32; 2],
    #[serde(default = "default_spawn_radius")]
    pub(crate) spawn_radius: f32,
    #[serde(default = "default_min_spawn_distance")]
    pub(crate) min_spawn_distance: f32,
    pub(crate) initial_delay_ms: Option<u64>,
    pub(crate) attempt_period_ms: Option<u64>,
    #[serde(default)]
    pub(crate) variants: Vec<VariantEntry>,
}

/// Variant produced by a spawner.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct VariantEntry {
    pub(crate) variant: String,
    #[serde(default)]
    pub(crate) template: String,
    #[serde(default = "default_interval_ms")]
    pub(crate) interval_ms: u64,
    pub(crate) capacity: u32,
    pub(crate) maximum: u32,
    #[serde(default = "default_active")]
    pub(crate) active: bool,
}

fn default_spawn_radius() -> f32 {
    4.0
}

fn default_min_spawn_distance() -> f32 {
    8.0
}

fn default_interval_ms() -> u64 {
    2_000
}

fn default_active() -> bool {
    true
}

/// Runtime objects built from a level file.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) coordinator: Coordinator,
    pub(crate) spawners: Vec<Spawner>,
    pub(crate) outro_delay: Duration,
}

impl LevelFile {
    /// Reads and parses the level stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parses a level from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// The built-in two-settler level.
    pub(crate) fn builtin() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_LEVEL)
    }

    /// Creates the coordinator and spawners described by the file.
    ///
    /// Inconsistent entries are clamped or skipped with a warning. Every
    /// spawner draws its random stream from `seed`.
    pub(crate) fn build(&self, seed: u64) -> Level {
        let policy = CompletionPolicy::new(
            self.completion.retire_spawners,
            Duration::from_millis(self.completion.retire_delay_ms),
        );
        let mut coordinator = Coordinator::new(policy);

        if self.limits.is_empty() {
            warn!("level declares no global limits; it completes immediately");
        }
        for entry in &self.limits {
            let variant = VariantId::new(entry.variant.as_str());
            if coordinator.register_limit(variant, entry.capacity, entry.maximum)
                == Registration::AlreadyRegistered
            {
                warn!(variant = %entry.variant, "duplicate global limit ignored");
            }
        }

        let mut seeds = ChaCha8Rng::seed_from_u64(seed);
        let mut ids = BTreeSet::new();
        let mut spawners = Vec::with_capacity(self.spawners.len());
        for entry in &self.spawners {
            if !ids.insert(entry.id) {
                warn!(spawner = entry.id, "duplicate spawner id; entry skipped");
                continue;
            }
            let spawner = entry.build(&coordinator, seeds.next_u64());
            coordinator.register_spawner(spawner.id());
            spawners.push(spawner);
        }

        Level {
            coordinator,
            spawners,
            outro_delay: Duration::from_millis(self.completion.outro_delay_ms),
        }
    }
}

impl SpawnerEntry {
    fn build(&self, coordinator: &Coordinator, seed: u64) -> Spawner {
        if self.spawn_radius <= 0.0 || self.min_spawn_distance <= 0.0 {
            warn!(spawner = self.id, "non-positive spawn distance; using the minimum");
        }

        let mut config = Config::new(self.spawn_radius, self.min_spawn_distance, seed);
        if let Some(delay) = self.initial_delay_ms {
            config = config.with_initial_delay(Duration::from_millis(delay));
        }
        if let Some(period) = self.attempt_period_ms {
            config = config.with_attempt_period(Duration::from_millis(period));
        }

        let [x, y] = self.origin;
        let mut spawner = Spawner::new(SpawnerId::new(self.id), Position::new(x, y), config);
        for entry in &self.variants {
            let variant = VariantId::new(entry.variant.as_str());
            if query::limit(coordinator, &variant).is_none() {
                warn!(
                    spawner = self.id,
                    %variant,
                    "variant has no global limit and will never spawn"
                );
            }
            if entry.capacity == 0 || entry.maximum == 0 || entry.capacity > entry.maximum {
                warn!(
                    spawner = self.id,
                    %variant,
                    capacity = entry.capacity,
                    maximum = entry.maximum,
                    "local limits out of range; clamping"
                );
            }
            let descriptor = VariantDescriptor::new(
                variant,
                TemplateRef::new(entry.template.as_str()),
                Duration::from_millis(entry.interval_ms),
                entry.capacity,
                entry.maximum,
            )
            .with_active(entry.active);
            let _ = spawner.add_variant(descriptor);
        }
        spawner
    }
}
