//! Ship collision classification.
//!
//! Ship-vs-ship contacts are classified from the rammer's point of view: the
//! relative orientation decides whose passenger tray powers down.

use engine_core::Vec3;

use crate::config::CollisionTuning;
use crate::events::Rumble;
use crate::kinematics::ShipKinematics;

/// How two ships met. Checked in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    /// The other ship is directly above.
    FromAbove,
    /// The other ship is directly below.
    FromBelow,
    /// Our nose into their side.
    TBone,
    HeadOn,
    /// Our nose into their tail.
    FromBehind,
    /// Side by side, a gentle nudge.
    SideBump,
    /// No clear geometry but fast enough to matter.
    RandomHighSpeed,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionOutcome {
    pub kind: CollisionKind,
    pub power_down_self: bool,
    pub power_down_other: bool,
    /// Rumble for the rammer, if any.
    pub rumble: Option<Rumble>,
}

impl CollisionOutcome {
    fn new(kind: CollisionKind, power_down_self: bool, power_down_other: bool) -> Self {
        Self {
            kind,
            power_down_self,
            power_down_other,
            rumble: None,
        }
    }
}

/// Only the faster ship of a pair classifies the collision.
pub fn should_evaluate(my_velocity: Vec3, other_velocity: Vec3) -> bool {
    my_velocity.length_squared() >= other_velocity.length_squared()
}

pub fn bump_rumble(tuning: &CollisionTuning) -> Rumble {
    Rumble::new(
        tuning.bump_rumble_strength,
        tuning.bump_rumble_strength,
        tuning.bump_rumble_duration,
        true,
    )
}

/// True when hitting the scenery this hard should rumble and shake passengers loose.
pub fn is_world_bump(relative_speed_sqr: f32, tuning: &CollisionTuning) -> bool {
    relative_speed_sqr >= tuning.bump_vel_threshold * tuning.bump_vel_threshold
}

pub fn classify_ship_collision(
    me: &ShipKinematics,
    other: &ShipKinematics,
    relative_speed_sqr: f32,
    tuning: &CollisionTuning,
) -> CollisionOutcome {
    let threshold = tuning.col_dir_threshold;
    let forward_dot = me.forward().dot(other.forward());
    let right_dot = me.right().dot(other.right());

    let offset = other.position() - me.position();
    let up_dot = offset.normalize_or_zero().dot(other.up());

    if up_dot >= 1.0 - threshold && offset.y > 0.0 {
        CollisionOutcome::new(CollisionKind::FromAbove, false, true)
    } else if up_dot <= -1.0 + threshold && offset.y < 0.0 {
        CollisionOutcome::new(CollisionKind::FromBelow, false, true)
    } else if forward_dot.abs() <= threshold {
        CollisionOutcome::new(CollisionKind::TBone, false, true)
    } else if forward_dot <= -1.0 + threshold {
        CollisionOutcome::new(CollisionKind::HeadOn, true, true)
    } else if forward_dot >= 1.0 - threshold {
        CollisionOutcome::new(CollisionKind::FromBehind, false, true)
    } else if right_dot.abs() >= 1.0 - threshold {
        CollisionOutcome::new(CollisionKind::SideBump, false, false)
    } else if relative_speed_sqr >= tuning.bump_vel_threshold * tuning.bump_vel_threshold {
        CollisionOutcome {
            rumble: Some(bump_rumble(tuning)),
            ..CollisionOutcome::new(CollisionKind::RandomHighSpeed, true, true)
        }
    } else {
        CollisionOutcome::new(CollisionKind::None, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Quat, Transform};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn ship(position: Vec3, rotation: Quat) -> ShipKinematics {
        ShipKinematics {
            transform: Transform::from_position_rotation(position, rotation),
            ..Default::default()
        }
    }

    fn classify(me: &ShipKinematics, other: &ShipKinematics, speed: f32) -> CollisionOutcome {
        classify_ship_collision(me, other, speed * speed, &CollisionTuning::default())
    }

    #[test]
    fn head_on_powers_down_both_either_way_round() {
        let a = ship(Vec3::ZERO, Quat::IDENTITY);
        let b = ship(Vec3::new(0.0, 0.0, -8.0), Quat::from_rotation_y(PI));
        for (me, other) in [(&a, &b), (&b, &a)] {
            let out = classify(me, other, 200.0);
            assert_eq!(out.kind, CollisionKind::HeadOn);
            assert!(out.power_down_self && out.power_down_other);
        }
    }

    #[test]
    fn from_behind_flips_with_perspective() {
        let chaser = ship(Vec3::ZERO, Quat::IDENTITY);
        let leader = ship(Vec3::new(0.0, 0.0, -8.0), Quat::IDENTITY);
        let out = classify(&chaser, &leader, 20.0);
        assert_eq!(out.kind, CollisionKind::FromBehind);
        assert!(!out.power_down_self && out.power_down_other);
        // From the leader's side the chaser is the "other" that loses passengers.
        let out = classify(&leader, &chaser, 20.0);
        assert_eq!(out.kind, CollisionKind::FromBehind);
        assert!(out.power_down_other && !out.power_down_self);
    }

    #[test]
    fn t_bone() {
        let me = ship(Vec3::ZERO, Quat::IDENTITY);
        let other = ship(Vec3::new(0.0, 0.0, -8.0), Quat::from_rotation_y(FRAC_PI_2));
        let out = classify(&me, &other, 5.0);
        assert_eq!(out.kind, CollisionKind::TBone);
        assert!(out.power_down_other && !out.power_down_self);
    }

    #[test]
    fn above_and_below() {
        let me = ship(Vec3::ZERO, Quat::IDENTITY);
        let over = ship(Vec3::new(0.0, 6.0, 0.0), Quat::IDENTITY);
        assert_eq!(classify(&me, &over, 5.0).kind, CollisionKind::FromAbove);
        let under = ship(Vec3::new(0.0, -6.0, 0.0), Quat::IDENTITY);
        let out = classify(&me, &under, 5.0);
        assert_eq!(out.kind, CollisionKind::FromBelow);
        assert!(out.power_down_other && !out.power_down_self);
    }

    #[test]
    fn parallel_side_bump_powers_down_nobody() {
        // Same right axis but pitched apart, so the heading checks don't catch it first.
        let me = ship(Vec3::ZERO, Quat::IDENTITY);
        let other = ship(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_x(FRAC_PI_4));
        let out = classify(&me, &other, 200.0);
        assert_eq!(out.kind, CollisionKind::SideBump);
        assert!(!out.power_down_self && !out.power_down_other);
    }

    #[test]
    fn oblique_hit_depends_on_speed() {
        let me = ship(Vec3::ZERO, Quat::IDENTITY);
        let rotation = Quat::from_rotation_y(FRAC_PI_4) * Quat::from_rotation_z(FRAC_PI_4);
        let other = ship(Vec3::new(5.0, 1.0, -5.0), rotation);

        let slow = classify(&me, &other, 10.0);
        assert_eq!(slow.kind, CollisionKind::None);
        assert!(slow.rumble.is_none());

        let fast = classify(&me, &other, 95.0);
        assert_eq!(fast.kind, CollisionKind::RandomHighSpeed);
        assert!(fast.power_down_self && fast.power_down_other);
        assert!(fast.rumble.is_some());
    }

    #[test]
    fn faster_ship_evaluates() {
        let fast = Vec3::new(0.0, 0.0, -30.0);
        let slow = Vec3::new(5.0, 0.0, 0.0);
        assert!(should_evaluate(fast, slow));
        assert!(!should_evaluate(slow, fast));
        assert!(should_evaluate(slow, slow));
    }

    #[test]
    fn world_bump_threshold() {
        let t = CollisionTuning::default();
        assert!(is_world_bump(90.0 * 90.0, &t));
        assert!(!is_world_bump(89.0 * 89.0, &t));
    }
}
