//! Simulation loop: owns the ECS world, the physics world and the ship registry.
//!
//! Per frame, each ship reads input and resolves mode changes before any fixed
//! step runs, so forces are always computed for the mode that is current.

use std::collections::{HashMap, HashSet};

use engine_core::{Entity, PlayerSlot, Time, Transform, Vec3, Velocity, World};
use input::GamepadFrame;
use physics::{ColliderHandle, ContactEvent, PhysicsBody, PhysicsWorld};

use crate::collision;
use crate::config::{ShipTuning, SimConfig};
use crate::error::ShipError;
use crate::events::ShipEvent;
use crate::kinematics::ShipKinematics;
use crate::parts::{PartBreak, PartKind};
use crate::ship::{Ship, ShipCommand};
use crate::state::ShipMode;
use crate::targeting::{self, TargetCandidate};
use crate::tray::TrayPassenger;

const PASSENGER_RADIUS: f32 = 0.5;

/// Marker for passenger entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passenger;

/// What a collider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderOwner {
    ShipHull(Entity),
    ShipPart(Entity),
    TraySensor(Entity),
    Passenger(Entity),
}

impl ColliderOwner {
    fn ship(self) -> Option<Entity> {
        match self {
            ColliderOwner::ShipHull(e) | ColliderOwner::ShipPart(e) => Some(e),
            _ => None,
        }
    }
}

/// Read-only view of a ship for cameras, audio and HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipSnapshot {
    pub entity: Entity,
    pub player: PlayerSlot,
    pub mode: ShipMode,
    pub kinematics: ShipKinematics,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub throttle: f32,
    pub is_reversing: bool,
    pub open_hatch: bool,
    pub propeller_anim_mult: f32,
    pub mass_ratio: f32,
    pub passengers: usize,
}

pub struct Simulation {
    world: World,
    physics: PhysicsWorld,
    time: Time,
    tuning: ShipTuning,
    owners: HashMap<ColliderHandle, ColliderOwner>,
    players: HashMap<PlayerSlot, Entity>,
    /// Ship motion before the current physics step, for relative collision speeds.
    snapshots: HashMap<Entity, ShipKinematics>,
    events: Vec<(Entity, ShipEvent)>,
}

impl Simulation {
    pub fn new(config: &SimConfig, tuning: ShipTuning) -> Self {
        let mut time = Time::new();
        time.set_fixed_rate(config.fixed_rate_hz);
        Self {
            world: World::new(),
            physics: PhysicsWorld::new(config.gravity),
            time,
            tuning,
            owners: HashMap::new(),
            players: HashMap::new(),
            snapshots: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn tuning(&self) -> &ShipTuning {
        &self.tuning
    }

    pub fn add_ground(&mut self, height: f32) -> ColliderHandle {
        self.physics.add_ground_plane(height)
    }

    pub fn add_pillar(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        self.physics.add_static_cuboid(position, half_extents)
    }

    /// Add a ship for `player` using the simulation's tuning.
    pub fn spawn_ship(&mut self, player: PlayerSlot, spawn: Transform) -> Result<Entity, ShipError> {
        self.spawn_ship_with(player, spawn, self.tuning.clone())
    }

    pub fn spawn_ship_with(
        &mut self,
        player: PlayerSlot,
        spawn: Transform,
        tuning: ShipTuning,
    ) -> Result<Entity, ShipError> {
        if self.players.contains_key(&player) {
            return Err(ShipError::SlotTaken(player));
        }
        let mut ship = Ship::spawn(&mut self.physics, player, spawn, tuning)?;
        ship.flush_mode_entries(&mut self.physics);

        let hull = ship.hull_collider();
        let tray = ship.tray_collider();
        let parts: Vec<ColliderHandle> = ship.part_colliders().collect();
        let entity = self.world.spawn((ship, player));

        self.owners.insert(hull, ColliderOwner::ShipHull(entity));
        self.owners.insert(tray, ColliderOwner::TraySensor(entity));
        for collider in parts {
            self.owners.insert(collider, ColliderOwner::ShipPart(entity));
        }
        self.players.insert(player, entity);
        Ok(entity)
    }

    pub fn spawn_passenger(&mut self, position: Vec3) -> Entity {
        let (body, collider) = self
            .physics
            .add_ball_body(position, PASSENGER_RADIUS, self.tuning.tray.passenger_mass);
        let entity = self
            .world
            .spawn((Passenger, PhysicsBody::with_collider(body, collider)));
        self.owners.insert(collider, ColliderOwner::Passenger(entity));
        entity
    }

    pub fn ship_entity(&self, player: PlayerSlot) -> Option<Entity> {
        self.players.get(&player).copied()
    }

    /// Every ship entity, in player order.
    pub fn ships(&self) -> Vec<Entity> {
        PlayerSlot::ALL
            .iter()
            .filter_map(|p| self.players.get(p).copied())
            .collect()
    }

    pub fn passengers(&self) -> Vec<Entity> {
        self.world
            .query::<&Passenger>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }

    pub fn passenger_position(&self, entity: Entity) -> Option<Vec3> {
        let body = self.world.get::<&PhysicsBody>(entity).ok()?.rigid_body;
        self.physics.body_transform(body).map(|t| t.position)
    }

    pub fn ship(&self, entity: Entity) -> Option<hecs::Ref<'_, Ship>> {
        self.world.get::<&Ship>(entity).ok()
    }

    pub fn ship_mode(&self, entity: Entity) -> Option<ShipMode> {
        self.ship(entity).map(|s| s.mode())
    }

    pub fn ship_kinematics(&self, entity: Entity) -> Option<ShipKinematics> {
        self.ship(entity)?.kinematics(&self.physics)
    }

    /// Teleport a ship and overwrite its velocity.
    pub fn set_ship_kinematics(&mut self, entity: Entity, kin: &ShipKinematics) -> Result<(), ShipError> {
        let body = self.ship(entity).ok_or(ShipError::NotAShip(entity))?.body();
        self.physics.set_body_pose(body, &kin.transform);
        self.physics.set_body_velocity(body, kin.velocity());
        Ok(())
    }

    pub fn ship_snapshot(&self, entity: Entity) -> Option<ShipSnapshot> {
        let ship = self.ship(entity)?;
        let kinematics = ship.kinematics(&self.physics)?;
        let flight = ship.flight();
        Some(ShipSnapshot {
            entity,
            player: ship.player(),
            mode: ship.mode(),
            kinematics,
            pitch: flight.pitch(),
            yaw: flight.yaw(),
            roll: flight.roll(),
            throttle: flight.throttle(),
            is_reversing: flight.is_reversing(),
            open_hatch: flight.open_hatch(),
            propeller_anim_mult: flight.propeller_anim_mult(),
            mass_ratio: ship.mass_ratio(),
            passengers: ship.tray().passenger_count(),
        })
    }

    /// Front-cannon lock for `entity`: the best other ship inside its forward cone.
    pub fn find_front_target(
        &self,
        entity: Entity,
        look_dir: Option<Vec3>,
        cone_dot: f32,
        max_distance: f32,
    ) -> Option<Entity> {
        let me = self.ship_kinematics(entity)?;
        let candidates: Vec<TargetCandidate> = self
            .ships()
            .into_iter()
            .filter(|&other| other != entity)
            .filter_map(|other| {
                let kin = self.ship_kinematics(other)?;
                Some(TargetCandidate {
                    entity: other,
                    position: kin.position(),
                })
            })
            .collect();
        targeting::find_front_target(
            me.position(),
            me.forward(),
            look_dir.unwrap_or_else(|| me.forward()),
            candidates,
            cone_dot,
            max_distance,
        )
    }

    /// Apply a command to a ship right away, including its physics side effects.
    pub fn command(&mut self, entity: Entity, command: ShipCommand) -> Result<(), ShipError> {
        let mut ship = self
            .world
            .get::<&mut Ship>(entity)
            .map_err(|_| ShipError::NotAShip(entity))?;
        ship.command(command);
        ship.flush_mode_entries(&mut self.physics);
        Ok(())
    }

    /// Break the first intact part of `kind` on a ship, as a weapon hit would.
    pub fn break_part(&mut self, entity: Entity, kind: PartKind) -> Result<Option<PartBreak>, ShipError> {
        let dt = self.time.fixed_timestep_seconds();
        let mut ship = self
            .world
            .get::<&mut Ship>(entity)
            .map_err(|_| ShipError::NotAShip(entity))?;
        let id = ship
            .parts()
            .parts()
            .find(|(_, part)| part.kind == kind && !part.is_destroyed())
            .map(|(id, _)| id);
        let broken = id.and_then(|id| ship.break_part(&mut self.physics, id, dt));
        ship.flush_mode_entries(&mut self.physics);
        Ok(broken)
    }

    pub fn drain_events(&mut self) -> Vec<(Entity, ShipEvent)> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }

    fn collect_events(&mut self) {
        for (entity, ship) in self.world.query_mut::<&mut Ship>() {
            self.events
                .extend(ship.drain_events().into_iter().map(|event| (entity, event)));
        }
    }

    /// Run one rendered frame: input and mode changes for every ship, then as many
    /// fixed physics steps as the accumulated time allows.
    pub fn frame(&mut self, dt: f32, inputs: &HashMap<PlayerSlot, GamepadFrame>) {
        self.time.advance_seconds(dt);
        let frame_dt = self.time.delta_seconds();
        let idle = GamepadFrame::default();

        for (_, ship) in self.world.query_mut::<&mut Ship>() {
            let Some(kin) = ship.kinematics(&self.physics) else {
                log::warn!("{} has no physics body, skipping frame", ship.player());
                continue;
            };
            let frame = inputs.get(&ship.player()).unwrap_or(&idle);
            ship.process_input(frame, &kin);
            ship.update(frame_dt, &kin);
            ship.flush_mode_entries(&mut self.physics);
        }

        while self.time.should_fixed_update() {
            let step = self.time.fixed_timestep_seconds();
            self.fixed_step(step);
        }
    }

    fn fixed_step(&mut self, dt: f32) {
        self.snapshots.clear();
        for (entity, ship) in self.world.query::<&Ship>().iter() {
            if let Some(kin) = ship.kinematics(&self.physics) {
                self.snapshots.insert(entity, kin);
            }
        }

        for (_, ship) in self.world.query_mut::<&mut Ship>() {
            ship.fixed_update(&mut self.physics, dt);
        }

        self.physics.step(dt);
        let contacts = self.physics.drain_contact_events();
        self.dispatch_contacts(&contacts, dt);

        for (_, ship) in self.world.query_mut::<&mut Ship>() {
            ship.flush_mode_entries(&mut self.physics);
        }
        self.collect_events();
    }

    fn dispatch_contacts(&mut self, contacts: &[ContactEvent], dt: f32) {
        let mut rammed: HashSet<(Entity, Entity)> = HashSet::new();
        let mut bumped: HashSet<Entity> = HashSet::new();

        for contact in contacts {
            let a = self.owners.get(&contact.collider1).copied();
            let b = self.owners.get(&contact.collider2).copied();

            if contact.sensor {
                match (a, b) {
                    (Some(ColliderOwner::TraySensor(ship)), Some(ColliderOwner::Passenger(p)))
                    | (Some(ColliderOwner::Passenger(p)), Some(ColliderOwner::TraySensor(ship))) => {
                        self.on_tray_contact(ship, p, contact.started);
                    }
                    _ => {}
                }
                continue;
            }
            if !contact.started {
                continue;
            }

            self.on_contact(contact.collider1, a, b, dt, &mut rammed, &mut bumped);
            self.on_contact(contact.collider2, b, a, dt, &mut rammed, &mut bumped);
        }
    }

    fn on_tray_contact(&mut self, ship: Entity, passenger: Entity, entered: bool) {
        let Some(body) = self.world.get::<&PhysicsBody>(passenger).ok().map(|b| b.rigid_body) else {
            return;
        };
        let Ok(mut ship) = self.world.get::<&mut Ship>(ship) else {
            return;
        };
        if entered {
            ship.track_passenger(TrayPassenger {
                entity: passenger,
                body,
            });
        } else {
            ship.untrack_passenger(passenger);
        }
    }

    /// Handle one side of a contact from the point of view of `mine`.
    fn on_contact(
        &mut self,
        my_collider: ColliderHandle,
        mine: Option<ColliderOwner>,
        theirs: Option<ColliderOwner>,
        dt: f32,
        rammed: &mut HashSet<(Entity, Entity)>,
        bumped: &mut HashSet<Entity>,
    ) {
        let Some(me) = mine.and_then(ColliderOwner::ship) else {
            return;
        };
        let Some(my_kin) = self.snapshots.get(&me).copied() else {
            return;
        };

        let relative_speed_sqr = match theirs {
            Some(ColliderOwner::Passenger(_)) | Some(ColliderOwner::TraySensor(_)) => return,
            Some(owner) => {
                let Some(other) = owner.ship() else {
                    return;
                };
                if other == me {
                    return;
                }
                let Some(other_kin) = self.snapshots.get(&other).copied() else {
                    return;
                };
                if collision::should_evaluate(my_kin.linear_velocity, other_kin.linear_velocity)
                    && rammed.insert((me, other))
                {
                    self.resolve_ship_collision(me, &my_kin, other, &other_kin);
                }
                (my_kin.linear_velocity - other_kin.linear_velocity).length_squared()
            }
            None => {
                let speed_sqr = my_kin.linear_velocity.length_squared();
                if bumped.insert(me) {
                    if let Ok(mut ship) = self.world.get::<&mut Ship>(me) {
                        ship.on_world_contact(speed_sqr);
                    }
                }
                speed_sqr
            }
        };

        if let Ok(mut ship) = self.world.get::<&mut Ship>(me) {
            ship.evaluate_part_contact(&mut self.physics, my_collider, relative_speed_sqr, dt);
        }
    }

    fn resolve_ship_collision(&mut self, me: Entity, my_kin: &ShipKinematics, other: Entity, other_kin: &ShipKinematics) {
        let relative_speed_sqr = (my_kin.linear_velocity - other_kin.linear_velocity).length_squared();
        let outcome = collision::classify_ship_collision(my_kin, other_kin, relative_speed_sqr, &self.tuning.collision);
        log::debug!("Ship collision: {:?}", outcome.kind);

        if let Ok(mut ship) = self.world.get::<&mut Ship>(me) {
            ship.on_ship_collision(&outcome);
            if outcome.power_down_self {
                ship.power_down_tray(&mut self.physics, other_kin.linear_velocity);
            }
        }
        if outcome.power_down_other {
            if let Ok(mut ship) = self.world.get::<&mut Ship>(other) {
                ship.power_down_tray(&mut self.physics, my_kin.linear_velocity);
            }
        }
    }

    /// Velocity of a ship's body right now.
    pub fn ship_velocity(&self, entity: Entity) -> Option<Velocity> {
        let body = self.ship(entity)?.body();
        self.physics.body_velocity(body)
    }
}
