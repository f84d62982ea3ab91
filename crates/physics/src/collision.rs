//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for different entity types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (terrain, walls, pillars)
    Environment = 1 << 0,
    /// Ship hulls and their destructible parts
    Ship = 1 << 1,
    /// Loose passengers
    Passenger = 1 << 2,
    /// Passenger tray sensor volume
    Tray = 1 << 3,
}

impl CollisionGroup {
    fn bits(groups: &[CollisionGroup]) -> Group {
        Group::from_bits_retain(groups.iter().fold(0u32, |acc, g| acc | *g as u32))
    }

    /// Environment collides with everything.
    pub fn environment() -> InteractionGroups {
        InteractionGroups::new(Self::bits(&[Self::Environment]), Group::ALL)
    }

    /// Ships hit the world, each other, and passengers.
    pub fn ship() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Ship]),
            Self::bits(&[Self::Environment, Self::Ship, Self::Passenger]),
        )
    }

    /// Passengers bounce off everything and are detected by trays.
    pub fn passenger() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Passenger]),
            Self::bits(&[Self::Environment, Self::Ship, Self::Passenger, Self::Tray]),
        )
    }

    /// Tray sensors only care about passengers.
    pub fn tray() -> InteractionGroups {
        InteractionGroups::new(Self::bits(&[Self::Tray]), Self::bits(&[Self::Passenger]))
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle) -> Self {
        Self {
            rigid_body,
            collider: None,
        }
    }

    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}
