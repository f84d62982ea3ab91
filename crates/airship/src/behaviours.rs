//! Behaviour modules for the modes other than Control.

use std::f32::consts::TAU;

use engine_core::Vec3;
use input::ShipControls;

use crate::config::BehaviourTuning;
use crate::kinematics::ShipKinematics;

/// Spawn-select wheel. Face-up spins it, face-down stops it on a slot.
#[derive(Debug, Clone)]
pub struct RouletteBehaviour {
    spinning: bool,
    angle: f32,
    spin_speed: f32,
    slots: u32,
}

impl RouletteBehaviour {
    pub fn new(tuning: &BehaviourTuning) -> Self {
        Self {
            spinning: false,
            angle: 0.0,
            spin_speed: tuning.roulette_spin_speed,
            slots: tuning.roulette_slots.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.spinning = false;
        self.angle = 0.0;
    }

    pub fn apply_input(&mut self, controls: &ShipControls) {
        if controls.face_up {
            self.spinning = true;
        } else if controls.face_down {
            self.spinning = false;
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.spinning {
            self.angle = (self.angle + self.spin_speed * dt).rem_euclid(TAU);
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn selected_slot(&self) -> u32 {
        let slot_size = TAU / self.slots as f32;
        ((self.angle / slot_size) as u32).min(self.slots - 1)
    }
}

/// Out of control and falling.
#[derive(Debug, Clone, Default)]
pub struct DyingBehaviour {
    timer: f32,
}

impl DyingBehaviour {
    pub fn reset_timer(&mut self) {
        self.timer = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.timer += dt;
    }

    pub fn time_dying(&self) -> f32 {
        self.timer
    }
}

/// Engine cut out above the ceiling: falls with the nose dropping.
#[derive(Debug, Clone)]
pub struct StallingBehaviour {
    above_stall_y: Option<f32>,
    nose_down_force: f32,
}

impl StallingBehaviour {
    pub fn new(tuning: &BehaviourTuning) -> Self {
        Self {
            above_stall_y: None,
            nose_down_force: tuning.stall_nose_down_force,
        }
    }

    pub fn set_above_stall_y(&mut self, stall_y: f32) {
        self.above_stall_y = Some(stall_y);
    }

    /// The ceiling this stall started above, if it came from the altitude check.
    pub fn above_stall_y(&self) -> Option<f32> {
        self.above_stall_y
    }

    /// Pitches the nose down, fading out as it points at the ground.
    pub fn torque(&self, kin: &ShipKinematics) -> Vec3 {
        let remaining = (kin.forward().y + 1.0) * 0.5;
        -kin.right() * self.nose_down_force * remaining
    }
}

/// Fireship dive: full speed ahead with limited steering.
#[derive(Debug, Clone)]
pub struct SuicideBehaviour {
    timer: f32,
    pitch: f32,
    yaw: f32,
    speed: f32,
    turn_force: f32,
}

impl SuicideBehaviour {
    pub fn new(tuning: &BehaviourTuning) -> Self {
        Self {
            timer: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            speed: tuning.fireship_speed,
            turn_force: tuning.fireship_turn_force,
        }
    }

    pub fn reset_timer(&mut self) {
        self.timer = 0.0;
    }

    pub fn time_burning(&self) -> f32 {
        self.timer
    }

    pub fn apply_input(&mut self, controls: &ShipControls) {
        self.pitch = controls.pitch.clamp(-1.0, 1.0);
        self.yaw = controls.yaw.clamp(-1.0, 1.0);
    }

    pub fn clear_input(&mut self) {
        self.pitch = 0.0;
        self.yaw = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.timer += dt;
    }

    /// Forward acceleration and steering torque for this tick.
    pub fn forces(&self, kin: &ShipKinematics) -> (Vec3, Vec3) {
        let accel = kin.forward() * self.speed;
        let torque = (self.pitch * kin.right() - self.yaw * Vec3::Y) * self.turn_force;
        (accel, torque)
    }
}
