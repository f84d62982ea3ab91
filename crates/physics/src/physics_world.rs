//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use crate::events::{ContactEvent, ContactEventQueue};
use engine_core::{Transform, Velocity, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(transform: &Transform) -> Isometry<Real> {
    let r = transform.rotation;
    Isometry3::from_parts(
        Translation3::new(transform.position.x, transform.position.y, transform.position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(r.w, r.x, r.y, r.z)),
    )
}

/// Box-shaped mass distribution used for ship hulls.
///
/// Ship colliders carry zero density; the body's mass comes entirely from this
/// so part loss and payload can be changed without touching collider shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMass {
    pub mass: f32,
    pub half_extents: Vec3,
}

impl BoxMass {
    fn properties(&self) -> MassProperties {
        let size = self.half_extents * 2.0;
        let k = self.mass / 12.0;
        let inertia = vector![
            k * (size.y * size.y + size.z * size.z),
            k * (size.x * size.x + size.z * size.z),
            k * (size.x * size.x + size.y * size.y)
        ];
        MassProperties::new(point![0.0, 0.0, 0.0], self.mass, inertia)
    }
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    events: ContactEventQueue,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            events: ContactEventQueue::default(),
        }
    }

    /// Step the physics simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.events,
        );
    }

    /// Take every collision event produced since the last drain.
    pub fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        self.events.drain()
    }

    /// Add a ship body: dynamic, never sleeps, mass from `mass` rather than colliders.
    pub fn add_ship_body(
        &mut self,
        transform: &Transform,
        mass: BoxMass,
        linear_damping: f32,
        angular_damping: f32,
    ) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(to_isometry(transform))
            .additional_mass_properties(mass.properties())
            .linear_damping(linear_damping)
            .angular_damping(angular_damping)
            .gravity_scale(0.0)
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a dynamic ball body (passengers, loose cargo).
    pub fn add_ball_body(&mut self, position: Vec3, radius: f32, mass: f32) -> (RigidBodyHandle, ColliderHandle) {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);
        let collider = ColliderBuilder::ball(radius)
            .mass(mass)
            .collision_groups(CollisionGroup::passenger())
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        (handle, collider)
    }

    /// Add a massless box collider to a ship body at a local offset, reporting collision events.
    pub fn add_ship_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_extents: Vec3,
        offset: Vec3,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(offset))
            .density(0.0)
            .collision_groups(CollisionGroup::ship())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a sensor box (the passenger tray) to a ship body.
    pub fn add_tray_sensor(
        &mut self,
        body_handle: RigidBodyHandle,
        half_extents: Vec3,
        offset: Vec3,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(offset))
            .density(0.0)
            .sensor(true)
            .collision_groups(CollisionGroup::tray())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a ground plane collider (flat half-space at `height`).
    pub fn add_ground_plane(&mut self, height: f32) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, height, 0.0])
            .collision_groups(CollisionGroup::environment())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static cuboid collider (pillars, cliffs). No parent body.
    pub fn add_static_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(translation))
            .collision_groups(CollisionGroup::environment())
            .build();
        self.collider_set.insert(collider)
    }

    /// Get the transform of a rigid body.
    pub fn body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Get the linear and angular velocity of a rigid body.
    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Velocity> {
        self.rigid_body_set
            .get(handle)
            .map(|body| Velocity::with_angular(to_vec3(body.linvel()), to_vec3(body.angvel())))
    }

    /// Whether the body moves under the solver (false for fixed bodies).
    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .map(|body| body.is_dynamic())
            .unwrap_or(false)
    }

    /// World-space position of a collider.
    pub fn collider_position(&self, handle: ColliderHandle) -> Option<Vec3> {
        self.collider_set
            .get(handle)
            .map(|c| to_vec3(&c.position().translation.vector))
    }

    /// Teleport a body to `transform`.
    pub fn set_body_pose(&mut self, handle: RigidBodyHandle, transform: &Transform) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_position(to_isometry(transform), true);
        }
    }

    /// Overwrite a body's linear and angular velocity.
    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Velocity) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(to_vector(velocity.linear), true);
            body.set_angvel(to_vector(velocity.angular), true);
        }
    }

    /// Replace the persistent force and torque on a body for the coming step.
    ///
    /// Rapier keeps user forces until reset, so callers that recompute forces
    /// every tick go through this instead of accumulating.
    pub fn set_body_forces(&mut self, handle: RigidBodyHandle, force: Vec3, torque: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.reset_forces(false);
            body.reset_torques(false);
            body.add_force(to_vector(force), true);
            body.add_torque(to_vector(torque), true);
        }
    }

    /// Apply an impulse to a dynamic body.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    /// Apply an impulse at a world-space point.
    pub fn apply_impulse_at_point(&mut self, handle: RigidBodyHandle, impulse: Vec3, point: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse_at_point(to_vector(impulse), point![point.x, point.y, point.z], true);
        }
    }

    /// Instantly change a body's velocity by `delta`, independent of its mass.
    pub fn apply_velocity_change(&mut self, handle: RigidBodyHandle, delta: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let linvel = *body.linvel() + to_vector(delta);
            body.set_linvel(linvel, true);
        }
    }

    /// Turn gravity on (1.0) or off (0.0) for a body.
    pub fn set_gravity_scale(&mut self, handle: RigidBodyHandle, scale: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_gravity_scale(scale, true);
        }
    }

    /// Replace the mass distribution of a ship body.
    pub fn set_box_mass(&mut self, handle: RigidBodyHandle, mass: BoxMass) {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) => body.set_additional_mass_properties(mass.properties(), true),
            None => log::warn!("set_box_mass on missing body {:?}", handle),
        }
    }

    /// Current total mass of a body.
    pub fn body_mass(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set.get(handle).map(|body| body.mass())
    }

    /// Enable or disable a collider without removing it.
    pub fn set_collider_enabled(&mut self, handle: ColliderHandle, enabled: bool) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_enabled(enabled);
        }
    }

    pub fn is_collider_enabled(&self, handle: ColliderHandle) -> bool {
        self.collider_set
            .get(handle)
            .map(|c| c.is_enabled())
            .unwrap_or(false)
    }
}
