//! Player flight model: stick input to thrust, lift, steering and auto-level torque.

use engine_core::Vec3;
use input::ShipControls;

use crate::config::{FlightTuning, PartEffect};
use crate::events::Rumble;
use crate::kinematics::ShipKinematics;
use crate::parts::{MassProvider, PartKind, PartStatus};
use crate::state::ShipMode;

const TRAPDOOR_RUMBLE: Rumble = Rumble {
    left: 0.25,
    right: 0.25,
    duration: 0.25,
    timed: false,
};

/// Forces for one physics tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightForces {
    /// Forward acceleration; multiply by mass to get a force.
    pub thrust_acceleration: Vec3,
    pub lift: Vec3,
    pub control_torque: Vec3,
    pub righting_torque: Vec3,
}

impl FlightForces {
    pub fn force(&self, mass: f32) -> Vec3 {
        self.thrust_acceleration * mass + self.lift
    }

    pub fn torque(&self) -> Vec3 {
        self.control_torque + self.righting_torque
    }
}

#[derive(Debug, Clone)]
pub struct FlightModel {
    enabled: bool,
    pitch: f32,
    yaw: f32,
    roll: f32,
    throttle: f32,
    open_hatch: bool,
    /// Set by hatch zones to hold the trapdoor open regardless of input.
    pub force_open_hatch: bool,
    is_reversing: bool,
    hatch_timer: f32,
    tuning: FlightTuning,
    part_effects: Vec<PartEffect>,
}

impl FlightModel {
    pub fn new(tuning: FlightTuning, part_effects: Vec<PartEffect>) -> Self {
        Self {
            enabled: false,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            throttle: 0.0,
            open_hatch: false,
            force_open_hatch: false,
            is_reversing: false,
            hatch_timer: 0.0,
            tuning,
            part_effects,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    pub fn open_hatch(&self) -> bool {
        self.open_hatch
    }

    /// Throttle held backwards while actually moving backwards.
    pub fn is_reversing(&self) -> bool {
        self.is_reversing
    }

    pub fn tuning(&self) -> &FlightTuning {
        &self.tuning
    }

    /// Take this frame's controls. A disabled model zeroes everything and shuts the hatch.
    pub fn apply_input(&mut self, controls: &ShipControls, velocity: Vec3, forward: Vec3) {
        if !self.enabled {
            self.pitch = 0.0;
            self.yaw = 0.0;
            self.roll = 0.0;
            self.throttle = 0.0;
            self.open_hatch = false;
            self.is_reversing = false;
            return;
        }

        self.pitch = controls.pitch;
        self.yaw = controls.yaw;
        self.roll = controls.roll;
        self.throttle = controls.throttle;
        self.is_reversing = controls.throttle < 0.0 && velocity.dot(forward) < 0.0;

        self.open_hatch = controls.bumper_left || controls.bumper_right || controls.dpad_vertical < 0.0;
        if self.force_open_hatch {
            self.open_hatch = true;
        }

        self.pitch = self.pitch.clamp(-1.0, 1.0);
        self.yaw = self.yaw.clamp(-1.0, 1.0);
        self.roll = self.roll.clamp(-1.0, 1.0);
        self.throttle = self.throttle.clamp(-1.0, 1.0);
    }

    /// Advance the trapdoor rumble. Pulses every cooldown while the hatch is open and
    /// the tray is carrying someone.
    pub fn update_hatch_rumble(&mut self, dt: f32, passengers: usize) -> Option<Rumble> {
        if !self.enabled || !self.open_hatch {
            self.hatch_timer = 0.0;
            return None;
        }
        self.hatch_timer += dt;
        if self.hatch_timer < self.tuning.trapdoor_rumble_cooldown {
            return None;
        }
        self.hatch_timer -= self.tuning.trapdoor_rumble_cooldown;
        (passengers > 0).then_some(TRAPDOOR_RUMBLE)
    }

    /// Propeller spin for the animation layer. Half throttle already spins at full speed;
    /// beyond that it ramps up towards `anim_throttle_mult`.
    pub fn propeller_anim_mult(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        let anim = self.throttle * 2.0;
        let sign = if anim >= 0.0 { 1.0 } else { -1.0 };
        let mut anim = anim.abs();
        if anim > 1.0 {
            let bounded = anim * 0.5 + 0.5;
            anim = bounded * (self.tuning.anim_throttle_mult - 1.0) + 1.0;
        }
        sign * anim
    }

    /// Forces for this tick from the stored input, the ship's pose and its damage.
    pub fn compute_forces(
        &self,
        kin: &ShipKinematics,
        mass: &dyn MassProvider,
        parts: &dyn PartStatus,
    ) -> FlightForces {
        if !self.enabled {
            return FlightForces::default();
        }
        let (thrust_acceleration, lift) = self.thrust(kin, mass, parts);
        FlightForces {
            thrust_acceleration,
            lift,
            control_torque: self.control_torque(kin, parts),
            righting_torque: self.righting_torque(kin),
        }
    }

    fn thrust(&self, kin: &ShipKinematics, mass: &dyn MassProvider, parts: &dyn PartStatus) -> (Vec3, Vec3) {
        let mut speed_mod = self.throttle * self.tuning.general_speed;
        if self.throttle < 0.0 {
            speed_mod *= self.tuning.reverse_speed_mult;
        }
        speed_mod *= mass.handling_mass_mult();

        let mast_mult = part_input_mults(&self.part_effects, parts, PartKind::Mast)
            .map(|e| e.value_mult)
            .unwrap_or(0.0);
        speed_mod *= 1.0 - mast_mult;

        // The moving "up": perpendicular to both the wings and the direction of travel.
        let lift = kin.right().cross(kin.linear_velocity).normalize_or_zero() * self.tuning.lift_force;
        (kin.forward() * speed_mod, lift)
    }

    fn control_torque(&self, kin: &ShipKinematics, parts: &dyn PartStatus) -> Vec3 {
        let t = &self.tuning;
        let handle = handle_mod(kin.speed(), t.high_control_speed_threshold, t.high_control_mult);

        let left = part_input_mults(&self.part_effects, parts, PartKind::LeftBalloon);
        let right = part_input_mults(&self.part_effects, parts, PartKind::RightBalloon);
        let rudder_mult = part_input_mults(&self.part_effects, parts, PartKind::Rudder)
            .map(|e| e.value_mult)
            .unwrap_or(0.0);

        // A lone balloon pulls its side up.
        let roll = match (left, right) {
            (Some(l), None) => self.roll * t.single_balloon_roll_mult - l.aux_value_mult,
            (None, Some(r)) => self.roll * t.single_balloon_roll_mult + r.aux_value_mult,
            _ => self.roll,
        };
        let balloon_roll_mult = left.map(|e| e.value_mult).unwrap_or(0.0) + right.map(|e| e.value_mult).unwrap_or(0.0);

        let forward = kin.forward();
        let right_xz = forward.cross(Vec3::Y).normalize_or_zero();

        let mut torque = Vec3::ZERO;
        torque += handle * self.pitch * right_xz * t.pitch_force;
        torque += handle * -self.yaw * (1.0 - rudder_mult) * Vec3::Y * t.yaw_force;
        torque += handle * (roll + self.yaw * t.yaw_roll_coupling) * (1.0 - balloon_roll_mult) * forward * t.roll_force;
        torque
    }

    fn righting_torque(&self, kin: &ShipKinematics) -> Vec3 {
        let t = &self.tuning;
        let forward = kin.forward();
        let right = kin.right();

        let roll_dot = Vec3::Y.dot(right);
        let pitch_dot = Vec3::NEG_Y.dot(forward);

        roll_dot * forward * t.roll_force * t.roll_limit_mult + pitch_dot * right * t.pitch_force * t.pitch_limit_mult
    }
}

/// Handling penalty for `kind`, if that part type is gone and has one configured.
pub fn part_input_mults<'a>(
    effects: &'a [PartEffect],
    parts: &dyn PartStatus,
    kind: PartKind,
) -> Option<&'a PartEffect> {
    if !parts.is_part_type_destroyed(kind) {
        return None;
    }
    effects.iter().find(|e| e.kind == kind)
}

/// Control multiplier: `mult` at a standstill, easing to 1 at `threshold` and above.
pub fn handle_mod(speed: f32, threshold: f32, mult: f32) -> f32 {
    if speed > threshold || threshold <= 0.0 {
        return 1.0;
    }
    1.0 + (mult - 1.0) * (1.0 - speed / threshold)
}

/// Altitude safety net: stall above the ceiling while climbing, die below the floor while falling.
pub fn check_vertical_limits(height: f32, vertical_speed: f32, tuning: &FlightTuning) -> Option<ShipMode> {
    if height > tuning.stall_y && vertical_speed > 0.0 {
        Some(ShipMode::Stalling)
    } else if height < tuning.kill_y && vertical_speed < 0.0 {
        Some(ShipMode::Dying)
    } else {
        None
    }
}
