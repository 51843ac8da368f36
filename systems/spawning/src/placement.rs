//! Spawn position selection around a spawner origin.

use horde_core::Position;
use rand::Rng;
use rand_distr::{Distribution, UnitDisc};

/// Reports whether the player stands within `min_distance` of the position.
///
/// A missing player is never too close.
pub(crate) fn is_player_too_close(
    position: Position,
    player: Option<Position>,
    min_distance: f32,
) -> bool {
    player.is_some_and(|player| position.distance(player) < min_distance)
}

/// Rejection-samples a point uniformly inside the disc of `radius` around
/// `origin` that keeps `min_distance` from the player.
///
/// Gives up after `max_attempts` candidates.
pub(crate) fn find_spawn_position<R: Rng + ?Sized>(
    rng: &mut R,
    origin: Position,
    radius: f32,
    player: Option<Position>,
    min_distance: f32,
    max_attempts: u32,
) -> Option<Position> {
    for _ in 0..max_attempts {
        let [x, y]: [f32; 2] = UnitDisc.sample(rng);
        let candidate = origin.offset(x * radius, y * radius);
        if !is_player_too_close(candidate, player, min_distance) {
            return Some(candidate);
        }
    }
    None
}
