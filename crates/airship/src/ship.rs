//! The ship aggregate: owns the state machine, the flight model, the parts and
//! the tray, and wires them to one physics body.

use engine_core::{PlayerSlot, Transform, Vec3, Velocity};
use input::{GamepadButton, GamepadFrame, InputState};
use physics::{BoxMass, ColliderHandle, PhysicsWorld, RigidBodyHandle};

use crate::behaviours::{DyingBehaviour, RouletteBehaviour, StallingBehaviour, SuicideBehaviour};
use crate::collision::{self, CollisionOutcome};
use crate::config::ShipTuning;
use crate::error::ShipError;
use crate::events::{HapticRequest, Rumble, ShipEvent};
use crate::flight::{self, FlightModel};
use crate::kinematics::ShipKinematics;
use crate::parts::{MassProvider, PartBreak, PartId, PartKind, PartRegistry, PartStatus, ShipPart};
use crate::state::{BehaviourModule, ModeEntry, ShipMode, ShipStateMachine, Visibility};
use crate::tray::{PassengerTray, TrayPassenger};

/// Explicit requests from outside the input path (debug keys, scripted matches).
#[derive(Debug, Clone, PartialEq)]
pub enum ShipCommand {
    SetMode(ShipMode),
    SetModeNamed(String),
    CycleDebug,
}

pub struct Ship {
    player: PlayerSlot,
    state: ShipStateMachine,
    flight: FlightModel,
    parts: PartRegistry,
    tray: PassengerTray,
    roulette: RouletteBehaviour,
    dying: DyingBehaviour,
    stalling: StallingBehaviour,
    suicide: SuicideBehaviour,
    input: InputState,
    body: RigidBodyHandle,
    hull: ColliderHandle,
    tray_sensor: ColliderHandle,
    spawn: Transform,
    tuning: ShipTuning,
    /// Mode of the last entry applied to the physics body.
    applied_mode: ShipMode,
    applied_mass: f32,
    events: Vec<ShipEvent>,
}

impl Ship {
    /// Build the ship's body, hull, tray sensor and part colliders at `spawn`.
    ///
    /// The ship starts in Pregame; its entry is applied on the first flush.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        player: PlayerSlot,
        spawn: Transform,
        tuning: ShipTuning,
    ) -> Result<Self, ShipError> {
        tuning.validate()?;

        let mass = BoxMass {
            mass: tuning.flight.mass,
            half_extents: tuning.hull_half_extents,
        };
        let body = physics.add_ship_body(&spawn, mass, tuning.flight.linear_drag, tuning.flight.angular_drag);
        let hull = physics.add_ship_collider(body, tuning.hull_half_extents, Vec3::ZERO);
        let tray_sensor = physics.add_tray_sensor(body, tuning.tray.half_extents, tuning.tray.offset);

        let mut parts = PartRegistry::new(tuning.flight.mass);
        for config in &tuning.parts {
            let id = parts.add_part(ShipPart::from_config(config));
            let collider = physics.add_ship_collider(body, config.half_extents, config.offset);
            parts.attach_collider(id, collider);
        }

        log::info!("Spawned {} ship at {:?}", player, spawn.position);

        Ok(Self {
            player,
            state: ShipStateMachine::new(tuning.state.clone()),
            flight: FlightModel::new(tuning.flight.clone(), tuning.part_effects.clone()),
            parts,
            tray: PassengerTray::new(tuning.tray.clone()),
            roulette: RouletteBehaviour::new(&tuning.behaviours),
            dying: DyingBehaviour::default(),
            stalling: StallingBehaviour::new(&tuning.behaviours),
            suicide: SuicideBehaviour::new(&tuning.behaviours),
            input: InputState::with_dead_zone(player, tuning.state.any_input_dead_zone),
            body,
            hull,
            tray_sensor,
            spawn,
            applied_mode: ShipMode::Pregame,
            applied_mass: tuning.flight.mass,
            tuning,
            events: Vec::new(),
        })
    }

    pub fn player(&self) -> PlayerSlot {
        self.player
    }

    pub fn mode(&self) -> ShipMode {
        self.state.mode()
    }

    pub fn visibility(&self) -> Visibility {
        self.state.visibility()
    }

    pub fn active_module(&self) -> Option<BehaviourModule> {
        self.state.active_module()
    }

    pub fn flight(&self) -> &FlightModel {
        &self.flight
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn tray(&self) -> &PassengerTray {
        &self.tray
    }

    pub fn roulette(&self) -> &RouletteBehaviour {
        &self.roulette
    }

    pub fn dying(&self) -> &DyingBehaviour {
        &self.dying
    }

    pub fn stalling(&self) -> &StallingBehaviour {
        &self.stalling
    }

    pub fn suicide(&self) -> &SuicideBehaviour {
        &self.suicide
    }

    pub fn tuning(&self) -> &ShipTuning {
        &self.tuning
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn hull_collider(&self) -> ColliderHandle {
        self.hull
    }

    pub fn tray_collider(&self) -> ColliderHandle {
        self.tray_sensor
    }

    pub fn part_colliders(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.parts.parts().flat_map(|(_, part)| part.colliders.iter().copied())
    }

    pub fn spawn_pose(&self) -> Transform {
        self.spawn
    }

    /// Current mass over start mass.
    pub fn mass_ratio(&self) -> f32 {
        self.parts.mass().ratio()
    }

    pub fn is_part_type_destroyed(&self, kind: PartKind) -> bool {
        self.parts.is_part_type_destroyed(kind)
    }

    pub fn is_part_destroyed(&self, id: PartId) -> bool {
        self.parts.is_part_destroyed(id)
    }

    pub fn set_force_open_hatch(&mut self, open: bool) {
        self.flight.force_open_hatch = open;
    }

    pub fn kinematics(&self, physics: &PhysicsWorld) -> Option<ShipKinematics> {
        let transform = physics.body_transform(self.body)?;
        let velocity = physics.body_velocity(self.body)?;
        Some(ShipKinematics::new(transform, velocity))
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<ShipEvent> {
        std::mem::take(&mut self.events)
    }

    fn haptic(&mut self, rumble: Rumble) {
        self.events.push(ShipEvent::Haptic(HapticRequest {
            player: self.player,
            rumble,
        }));
    }

    fn sync_modules(&mut self) {
        self.flight
            .set_enabled(self.state.is_module_enabled(BehaviourModule::Control));
    }

    pub fn set_mode(&mut self, mode: ShipMode) {
        self.state.set_state(mode);
        self.sync_modules();
    }

    pub fn command(&mut self, command: ShipCommand) {
        match command {
            ShipCommand::SetMode(mode) => self.set_mode(mode),
            ShipCommand::SetModeNamed(name) => {
                self.state.set_state_named(&name);
            }
            ShipCommand::CycleDebug => {
                self.state.cycle_debug();
            }
        }
        self.sync_modules();
    }

    /// Read this frame's controller state and route it to whatever mode is active.
    pub fn process_input(&mut self, frame: &GamepadFrame, kin: &ShipKinematics) {
        self.input.begin_frame();
        self.input.apply_frame(frame);

        if self.input.is_pressed(GamepadButton::Select) {
            self.state.cycle_debug();
        }
        if self.input.is_released(GamepadButton::Select) && self.state.mode() == ShipMode::Dying {
            self.state.set_state(ShipMode::Suicide);
        }

        let any_input = self.input.any_input(self.state.dead_zone());
        if self.state.try_auto_start(any_input) {
            log::info!("{} took control", self.player);
        }

        if self.state.can_escape_stall() && self.input.all_released() {
            log::info!("{} turned the stall into a fireship dive", self.player);
            self.state.set_state(ShipMode::Suicide);
        }

        self.sync_modules();

        let controls = self.input.ship_controls();
        self.flight.apply_input(&controls, kin.linear_velocity, kin.forward());
        match self.state.active_module() {
            Some(BehaviourModule::Roulette) => self.roulette.apply_input(&controls),
            Some(BehaviourModule::Suicide) => self.suicide.apply_input(&controls),
            _ => self.suicide.clear_input(),
        }
    }

    /// Per-frame timers and the altitude safety net.
    pub fn update(&mut self, dt: f32, kin: &ShipKinematics) {
        self.state.tick(dt);
        match self.state.active_module() {
            Some(BehaviourModule::Roulette) => self.roulette.update(dt),
            Some(BehaviourModule::Dying) => self.dying.update(dt),
            Some(BehaviourModule::Suicide) => self.suicide.update(dt),
            _ => {}
        }

        if let Some(rumble) = self.flight.update_hatch_rumble(dt, self.tray.passenger_count()) {
            self.haptic(rumble);
        }

        self.check_vertical_limits(kin);
    }

    pub fn check_vertical_limits(&mut self, kin: &ShipKinematics) {
        let position = kin.position();
        match flight::check_vertical_limits(position.y, kin.linear_velocity.y, self.flight.tuning()) {
            Some(ShipMode::Stalling) => {
                if self.state.request_stall() {
                    log::info!("{} stalled above {}", self.player, self.flight.tuning().stall_y);
                    self.stalling.set_above_stall_y(self.flight.tuning().stall_y);
                }
            }
            Some(ShipMode::Dying) => {
                if self.state.request_death() {
                    log::info!("{} fell below {}", self.player, self.flight.tuning().kill_y);
                }
            }
            _ => {}
        }
        self.sync_modules();
    }

    /// Apply queued mode entries to the physics body.
    pub fn flush_mode_entries(&mut self, physics: &mut PhysicsWorld) {
        for entry in self.state.take_pending() {
            self.apply_entry(physics, &entry);
        }
        self.sync_modules();
    }

    fn apply_entry(&mut self, physics: &mut PhysicsWorld, entry: &ModeEntry) {
        if entry.reset_to_spawn {
            physics.set_body_pose(self.body, &self.spawn);
            self.tray.reset_motion();
        }
        if entry.zero_velocity {
            physics.set_body_velocity(self.body, Velocity::default());
        }
        if entry.repair_parts {
            self.parts.repair_all_parts();
            self.events.push(ShipEvent::PartsRepaired);
        }
        if entry.reset_suicide_timer {
            self.suicide.reset_timer();
        }
        if entry.reset_dying_timer {
            self.dying.reset_timer();
        }
        if entry.mode == ShipMode::Roulette {
            self.roulette.reset();
        }

        physics.set_gravity_scale(self.body, if entry.gravity { 1.0 } else { 0.0 });
        physics.set_body_forces(self.body, Vec3::ZERO, Vec3::ZERO);

        let colliders = entry.visibility.colliders;
        physics.set_collider_enabled(self.hull, colliders);
        physics.set_collider_enabled(self.tray_sensor, colliders);
        for (_, part) in self.parts.parts() {
            let enabled = colliders && !part.is_destroyed();
            for &collider in &part.colliders {
                physics.set_collider_enabled(collider, enabled);
            }
        }

        if self.applied_mode != entry.mode {
            log::debug!("{} entered {}", self.player, entry.mode);
            self.events.push(ShipEvent::ModeChanged {
                from: self.applied_mode,
                to: entry.mode,
            });
            self.applied_mode = entry.mode;
        }
    }

    /// Set this tick's forces from the active module and keep passengers aboard.
    pub fn fixed_update(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        let Some(kin) = self.kinematics(physics) else {
            log::warn!("{} has no physics body, skipping tick", self.player);
            return;
        };

        self.parts.set_payload(self.tray.payload_mass());
        let mass = self.parts.current_mass();
        if (mass - self.applied_mass).abs() > f32::EPSILON {
            physics.set_box_mass(
                self.body,
                BoxMass {
                    mass,
                    half_extents: self.tuning.hull_half_extents,
                },
            );
            self.applied_mass = mass;
        }

        let (force, torque) = match self.state.active_module() {
            Some(BehaviourModule::Control) => {
                let forces = self.flight.compute_forces(&kin, &self.parts, &self.parts);
                (forces.force(mass), forces.torque())
            }
            Some(BehaviourModule::Stalling) => (Vec3::ZERO, self.stalling.torque(&kin)),
            Some(BehaviourModule::Suicide) => {
                let (accel, torque) = self.suicide.forces(&kin);
                (accel * mass, torque)
            }
            _ => (Vec3::ZERO, Vec3::ZERO),
        };
        physics.set_body_forces(self.body, force, torque);

        self.tray.fixed_update(kin.linear_velocity, dt);
        if let Some(delta) = self.tray.retention_velocity_change(dt) {
            for passenger in self.tray.contents() {
                physics.apply_velocity_change(passenger.body, delta);
            }
        }
    }

    pub fn track_passenger(&mut self, passenger: TrayPassenger) -> bool {
        self.tray.track(passenger)
    }

    pub fn untrack_passenger(&mut self, entity: engine_core::Entity) -> bool {
        self.tray.untrack(entity)
    }

    /// Scenery hit: rumble and shake passengers loose if it was hard enough.
    pub fn on_world_contact(&mut self, relative_speed_sqr: f32) -> bool {
        if !collision::is_world_bump(relative_speed_sqr, &self.tuning.collision) {
            return false;
        }
        let rumble = collision::bump_rumble(&self.tuning.collision);
        self.haptic(rumble);
        self.tray.power_down();
        self.events.push(ShipEvent::TrayPoweredDown);
        true
    }

    /// Record a ship-vs-ship outcome this ship classified.
    pub fn on_ship_collision(&mut self, outcome: &CollisionOutcome) {
        self.events.push(ShipEvent::Collision { kind: outcome.kind });
        if let Some(rumble) = outcome.rumble {
            self.haptic(rumble);
        }
    }

    /// Power down the tray and throw every passenger with `launch_velocity`.
    pub fn power_down_tray(&mut self, physics: &mut PhysicsWorld, launch_velocity: Vec3) {
        self.tray.power_down();
        for passenger in self.tray.contents() {
            physics.apply_velocity_change(passenger.body, launch_velocity);
        }
        self.events.push(ShipEvent::TrayPoweredDown);
    }

    /// Break the part owning `my_collider` if the hit reached its threshold.
    pub fn evaluate_part_contact(
        &mut self,
        physics: &mut PhysicsWorld,
        my_collider: ColliderHandle,
        relative_speed_sqr: f32,
        dt: f32,
    ) -> Option<PartBreak> {
        let broken = self
            .parts
            .evaluate_part_collision(my_collider, relative_speed_sqr, &mut self.state)?;
        self.apply_part_break(physics, &broken, dt);
        self.sync_modules();
        Some(broken)
    }

    /// Break a part directly, e.g. from a weapon hit.
    pub fn break_part(&mut self, physics: &mut PhysicsWorld, id: PartId, dt: f32) -> Option<PartBreak> {
        let broken = self.parts.break_part(id, &mut self.state)?;
        self.apply_part_break(physics, &broken, dt);
        self.sync_modules();
        Some(broken)
    }

    fn apply_part_break(&mut self, physics: &mut PhysicsWorld, broken: &PartBreak, dt: f32) {
        let Some(part) = self.parts.part(broken.id) else {
            return;
        };
        let colliders = part.colliders.clone();
        let point = colliders.first().and_then(|&c| physics.collider_position(c));
        for &collider in &colliders {
            physics.set_collider_enabled(collider, false);
        }
        self.events.push(ShipEvent::PartDestroyed { kind: broken.kind });

        if !broken.kind.is_balloon() {
            return;
        }
        let Some(kin) = self.kinematics(physics) else {
            return;
        };
        let c = &self.tuning.collision;
        let impulse = kin.up() * c.balloon_destroy_force * dt;
        physics.apply_impulse_at_point(self.body, impulse, point.unwrap_or(kin.position()));

        let rumble = match broken.kind {
            PartKind::LeftBalloon => Rumble::new(c.balloon_rumble_strength, 0.0, c.balloon_rumble_duration, true),
            _ => Rumble::new(0.0, c.balloon_rumble_strength, c.balloon_rumble_duration, true),
        };
        self.haptic(rumble);
        self.events.push(ShipEvent::BalloonPopped { kind: broken.kind });
    }
}
