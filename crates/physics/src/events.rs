//! Collision event collection for the physics step.

use rapier3d::prelude::*;
use std::sync::Mutex;

/// A collider pair that started or stopped touching during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    /// True for a new contact, false when the pair separated.
    pub started: bool,
    /// True when one of the colliders is a sensor.
    pub sensor: bool,
}

impl ContactEvent {
    /// The handle on the other side of the pair, if `handle` takes part in it.
    pub fn other(&self, handle: ColliderHandle) -> Option<ColliderHandle> {
        if self.collider1 == handle {
            Some(self.collider2)
        } else if self.collider2 == handle {
            Some(self.collider1)
        } else {
            None
        }
    }
}

/// Event handler that buffers collision events until the caller drains them.
#[derive(Debug, Default)]
pub struct ContactEventQueue {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactEventQueue {
    pub fn drain(&self) -> Vec<ContactEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => {
                log::warn!("Contact event queue lock was poisoned, recovering");
                std::mem::take(&mut *poisoned.into_inner())
            }
        }
    }
}

impl EventHandler for ContactEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let contact = ContactEvent {
            collider1: event.collider1(),
            collider2: event.collider2(),
            started: event.started(),
            sensor: event.sensor(),
        };
        match self.events.lock() {
            Ok(mut events) => events.push(contact),
            Err(poisoned) => poisoned.into_inner().push(contact),
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
