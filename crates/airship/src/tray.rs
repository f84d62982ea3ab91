//! Passenger tray: keeps passengers aboard by passing the ship's acceleration on to them.

use engine_core::{Entity, Vec3};
use physics::RigidBodyHandle;

use crate::config::TrayTuning;

/// A passenger currently inside the tray sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayPassenger {
    pub entity: Entity,
    pub body: RigidBodyHandle,
}

#[derive(Debug, Clone)]
pub struct PassengerTray {
    contents: Vec<TrayPassenger>,
    last_ship_velocity: Vec3,
    ship_acceleration: Vec3,
    /// Acceleration is only tracked once the ship has moved, so spawning doesn't kick passengers.
    started: bool,
    power_down_timer: f32,
    tuning: TrayTuning,
}

impl PassengerTray {
    pub fn new(tuning: TrayTuning) -> Self {
        Self {
            contents: Vec::new(),
            last_ship_velocity: Vec3::ZERO,
            ship_acceleration: Vec3::ZERO,
            started: false,
            power_down_timer: 0.0,
            tuning,
        }
    }

    /// Start tracking a passenger. Returns false if it was already aboard.
    pub fn track(&mut self, passenger: TrayPassenger) -> bool {
        if self.contents.iter().any(|p| p.entity == passenger.entity) {
            return false;
        }
        self.contents.push(passenger);
        true
    }

    pub fn untrack(&mut self, entity: Entity) -> bool {
        let before = self.contents.len();
        self.contents.retain(|p| p.entity != entity);
        self.contents.len() != before
    }

    pub fn contents(&self) -> &[TrayPassenger] {
        &self.contents
    }

    pub fn passenger_count(&self) -> usize {
        self.contents.len()
    }

    pub fn payload_mass(&self) -> f32 {
        self.contents.len() as f32 * self.tuning.passenger_mass
    }

    /// Suspend retention for a while so passengers can be thrown out.
    pub fn power_down(&mut self) {
        self.power_down_timer = self.tuning.power_down_duration;
    }

    pub fn is_powered(&self) -> bool {
        self.power_down_timer <= 0.0
    }

    pub fn ship_acceleration(&self) -> Vec3 {
        self.ship_acceleration
    }

    /// Forget motion history, e.g. after the ship is teleported back to spawn.
    pub fn reset_motion(&mut self) {
        self.last_ship_velocity = Vec3::ZERO;
        self.ship_acceleration = Vec3::ZERO;
        self.started = false;
    }

    pub fn fixed_update(&mut self, ship_velocity: Vec3, dt: f32) {
        if self.power_down_timer > 0.0 {
            self.power_down_timer -= dt;
        }
        if dt <= 0.0 {
            return;
        }
        if !self.started && ship_velocity.length_squared() > 0.0 {
            self.started = true;
        }
        if self.started {
            self.ship_acceleration = (ship_velocity - self.last_ship_velocity) / dt;
            self.last_ship_velocity = ship_velocity;
        }
    }

    /// Velocity change to give every tracked passenger this tick, if retention is on.
    pub fn retention_velocity_change(&self, dt: f32) -> Option<Vec3> {
        if !self.is_powered() || self.contents.is_empty() {
            return None;
        }
        Some(self.ship_acceleration * dt)
    }
}
