//! Front-cannon target lock over the simulation's ship registry.

use engine_core::{Entity, Vec3};

/// Cosine of the front cannon's lock cone (45 degrees).
pub const FRONT_CANNON_LOCK_DOT: f32 = 0.707;
pub const MAX_TARGET_DISTANCE: f32 = 1000.0;

/// A ship that could be locked onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub position: Vec3,
}

/// Nearest candidate inside the forward cone and within range, preferring the
/// one closest to `look_dir`.
pub fn find_front_target(
    position: Vec3,
    forward: Vec3,
    look_dir: Vec3,
    candidates: impl IntoIterator<Item = TargetCandidate>,
    cone_dot: f32,
    max_distance: f32,
) -> Option<Entity> {
    let look_dir = look_dir.normalize_or_zero();
    let mut best: Option<Entity> = None;
    let mut closest_to_look = -1.0;
    let mut closest_dist = f32::MAX;

    for candidate in candidates {
        let offset = candidate.position - position;
        let dist = offset.length();
        if dist > max_distance || dist <= f32::EPSILON {
            continue;
        }
        let dir = offset / dist;
        let look = dir.dot(look_dir);
        if dir.dot(forward) >= cone_dot && look >= closest_to_look && dist <= closest_dist {
            closest_to_look = look;
            closest_dist = dist;
            best = Some(candidate.entity);
        }
    }
    best
}
