//! Destructible ship parts and the ship's running mass.

use physics::ColliderHandle;
use serde::{Deserialize, Serialize};

use crate::config::PartConfig;
use crate::state::{ShipMode, StateRequester};

/// Lowest mass a ship may ever report. Falling below this is a bug.
pub const MIN_SHIP_MASS: f32 = 1.0;

/// Which part of the ship a destructible piece is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    #[default]
    Invalid,
    LeftBalloon,
    RightBalloon,
    Mast,
    Rudder,
}

impl PartKind {
    pub const ALL: [PartKind; 5] = [
        PartKind::Invalid,
        PartKind::LeftBalloon,
        PartKind::RightBalloon,
        PartKind::Mast,
        PartKind::Rudder,
    ];

    pub fn is_balloon(self) -> bool {
        matches!(self, PartKind::LeftBalloon | PartKind::RightBalloon)
    }
}

/// Read access to a ship's mass, for systems that scale by it.
pub trait MassProvider {
    fn start_mass(&self) -> f32;
    fn current_mass(&self) -> f32;

    /// `start / current`: below 1 when the ship is loaded, above 1 when it has lost parts.
    fn handling_mass_mult(&self) -> f32 {
        self.start_mass() / self.current_mass()
    }
}

/// Read access to which part types are gone.
pub trait PartStatus {
    fn is_part_type_destroyed(&self, kind: PartKind) -> bool;
}

/// Running mass total: start mass, minus lost parts, plus carried payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipMass {
    start: f32,
    lost: f32,
    payload: f32,
}

impl ShipMass {
    pub fn new(start: f32) -> Self {
        debug_assert!(start >= MIN_SHIP_MASS, "ship start mass {start} below minimum");
        Self {
            start: start.max(MIN_SHIP_MASS),
            lost: 0.0,
            payload: 0.0,
        }
    }

    pub fn current(&self) -> f32 {
        let mass = self.start - self.lost + self.payload;
        debug_assert!(mass >= MIN_SHIP_MASS, "ship mass {mass} below minimum");
        mass.max(MIN_SHIP_MASS)
    }

    pub fn payload(&self) -> f32 {
        self.payload
    }

    pub fn set_payload(&mut self, payload: f32) {
        self.payload = payload.max(0.0);
    }

    /// Current mass as a fraction of the start mass.
    pub fn ratio(&self) -> f32 {
        self.current() / self.start
    }
}

impl MassProvider for ShipMass {
    fn start_mass(&self) -> f32 {
        self.start
    }

    fn current_mass(&self) -> f32 {
        self.current()
    }
}

/// Index of a part within its ship's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub usize);

#[derive(Debug, Clone)]
pub struct ShipPart {
    pub kind: PartKind,
    pub break_velocity: f32,
    break_velocity_sqr: f32,
    pub mass: f32,
    pub colliders: Vec<ColliderHandle>,
    destroyed: bool,
}

impl ShipPart {
    pub fn new(kind: PartKind, break_velocity: f32, mass: f32) -> Self {
        Self {
            kind,
            break_velocity,
            break_velocity_sqr: break_velocity * break_velocity,
            mass,
            colliders: Vec::new(),
            destroyed: false,
        }
    }

    pub fn from_config(config: &PartConfig) -> Self {
        Self::new(config.kind, config.break_velocity, config.mass)
    }

    pub fn break_velocity_sqr(&self) -> f32 {
        self.break_velocity_sqr
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// What happened when a part broke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartBreak {
    pub id: PartId,
    pub kind: PartKind,
    pub mass_removed: f32,
    /// True when this break took the last balloon and killed the ship.
    pub killed_ship: bool,
}

/// Every destructible part of one ship, plus the ship's mass bookkeeping.
#[derive(Debug, Clone)]
pub struct PartRegistry {
    parts: Vec<ShipPart>,
    mass: ShipMass,
    left_balloon_broken: bool,
    right_balloon_broken: bool,
}

impl PartRegistry {
    pub fn new(start_mass: f32) -> Self {
        Self {
            parts: Vec::new(),
            mass: ShipMass::new(start_mass),
            left_balloon_broken: false,
            right_balloon_broken: false,
        }
    }

    pub fn add_part(&mut self, part: ShipPart) -> PartId {
        self.parts.push(part);
        PartId(self.parts.len() - 1)
    }

    pub fn attach_collider(&mut self, id: PartId, collider: ColliderHandle) {
        if let Some(part) = self.parts.get_mut(id.0) {
            part.colliders.push(collider);
        }
    }

    pub fn part(&self, id: PartId) -> Option<&ShipPart> {
        self.parts.get(id.0)
    }

    pub fn parts(&self) -> impl Iterator<Item = (PartId, &ShipPart)> {
        self.parts.iter().enumerate().map(|(i, p)| (PartId(i), p))
    }

    pub fn mass(&self) -> &ShipMass {
        &self.mass
    }

    pub fn set_payload(&mut self, payload: f32) {
        self.mass.set_payload(payload);
    }

    pub fn is_part_destroyed(&self, id: PartId) -> bool {
        self.part(id).map(|p| p.destroyed).unwrap_or(false)
    }

    /// The part owning `collider`, if it is one of ours.
    pub fn part_for_collider(&self, collider: ColliderHandle) -> Option<PartId> {
        self.parts
            .iter()
            .position(|p| p.colliders.contains(&collider))
            .map(PartId)
    }

    /// Restore every part and its mass, and forget which balloons burst.
    pub fn repair_all_parts(&mut self) {
        for part in &mut self.parts {
            part.destroyed = false;
        }
        self.mass.lost = 0.0;
        self.left_balloon_broken = false;
        self.right_balloon_broken = false;
    }

    /// Restore a single part. Returns false if it was intact already.
    pub fn repair_part(&mut self, id: PartId) -> bool {
        let Some(part) = self.parts.get_mut(id.0) else {
            return false;
        };
        if !part.destroyed {
            return false;
        }
        part.destroyed = false;
        self.mass.lost = (self.mass.lost - part.mass).max(0.0);
        match part.kind {
            PartKind::LeftBalloon => self.left_balloon_broken = false,
            PartKind::RightBalloon => self.right_balloon_broken = false,
            _ => {}
        }
        true
    }

    /// Destroy a part and take its mass off the ship.
    ///
    /// Losing the second balloon asks for [`ShipMode::Dying`], once.
    pub fn break_part(&mut self, id: PartId, requester: &mut dyn StateRequester) -> Option<PartBreak> {
        let part = self.parts.get_mut(id.0)?;
        if part.destroyed {
            return None;
        }
        part.destroyed = true;
        self.mass.lost += part.mass;
        let kind = part.kind;
        let mass_removed = part.mass;

        let both_before = self.left_balloon_broken && self.right_balloon_broken;
        match kind {
            PartKind::LeftBalloon => self.left_balloon_broken = true,
            PartKind::RightBalloon => self.right_balloon_broken = true,
            _ => {}
        }
        let killed_ship = !both_before && self.left_balloon_broken && self.right_balloon_broken;
        if killed_ship {
            log::info!("Both balloons lost, ship going down");
            requester.request_state(ShipMode::Dying);
        }
        log::info!("{:?} destroyed ({} mass lost)", kind, mass_removed);

        Some(PartBreak {
            id,
            kind,
            mass_removed,
            killed_ship,
        })
    }

    /// Break the part behind `collider` if the hit reached its break velocity.
    pub fn evaluate_part_collision(
        &mut self,
        collider: ColliderHandle,
        relative_speed_sqr: f32,
        requester: &mut dyn StateRequester,
    ) -> Option<PartBreak> {
        let id = self.part_for_collider(collider)?;
        let part = &self.parts[id.0];
        if part.destroyed || relative_speed_sqr < part.break_velocity_sqr {
            return None;
        }
        self.break_part(id, requester)
    }
}

impl PartStatus for PartRegistry {
    /// True when the ship has parts of `kind` and every one of them is destroyed.
    fn is_part_type_destroyed(&self, kind: PartKind) -> bool {
        let mut of_kind = self.parts.iter().filter(|p| p.kind == kind).peekable();
        of_kind.peek().is_some() && of_kind.all(|p| p.destroyed)
    }
}

impl MassProvider for PartRegistry {
    fn start_mass(&self) -> f32 {
        self.mass.start_mass()
    }

    fn current_mass(&self) -> f32 {
        self.mass.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Requests(Vec<ShipMode>);

    impl StateRequester for Requests {
        fn request_state(&mut self, mode: ShipMode) {
            self.0.push(mode);
        }
    }

    fn registry() -> (PartRegistry, [PartId; 4]) {
        let mut reg = PartRegistry::new(100.0);
        let ids = [
            reg.add_part(ShipPart::new(PartKind::LeftBalloon, 10.0, 5.0)),
            reg.add_part(ShipPart::new(PartKind::RightBalloon, 10.0, 5.0)),
            reg.add_part(ShipPart::new(PartKind::Mast, 10.0, 4.0)),
            reg.add_part(ShipPart::new(PartKind::Rudder, 10.0, 3.0)),
        ];
        for (i, id) in ids.iter().enumerate() {
            reg.attach_collider(*id, ColliderHandle::from_raw_parts(i as u32, 0));
        }
        (reg, ids)
    }

    #[test]
    fn break_velocity_is_squared_once() {
        let part = ShipPart::new(PartKind::Mast, 12.0, 1.0);
        assert_eq!(part.break_velocity_sqr(), 144.0);
    }

    #[test]
    fn break_all_then_repair_restores_mass() {
        let (mut reg, ids) = registry();
        let mut requests = Requests::default();
        for id in ids {
            assert!(reg.break_part(id, &mut requests).is_some());
        }
        assert_eq!(reg.current_mass(), 83.0);
        assert!(reg.handling_mass_mult() > 1.0);

        reg.repair_all_parts();
        assert_eq!(reg.current_mass(), reg.start_mass());
        for kind in [PartKind::LeftBalloon, PartKind::RightBalloon, PartKind::Mast, PartKind::Rudder] {
            assert!(!reg.is_part_type_destroyed(kind));
        }
    }

    #[test]
    fn both_balloons_request_dying_exactly_once() {
        for order in [[0usize, 1], [1, 0]] {
            let (mut reg, ids) = registry();
            let mut requests = Requests::default();
            reg.break_part(ids[order[0]], &mut requests);
            assert!(requests.0.is_empty());
            let second = reg.break_part(ids[order[1]], &mut requests).expect("second balloon breaks");
            assert!(second.killed_ship);
            assert!(reg.break_part(ids[order[1]], &mut requests).is_none());
            reg.break_part(ids[2], &mut requests);
            assert_eq!(requests.0, vec![ShipMode::Dying]);
        }
    }

    #[test]
    fn single_balloon_never_kills() {
        let (mut reg, ids) = registry();
        let mut requests = Requests::default();
        reg.break_part(ids[0], &mut requests);
        reg.break_part(ids[2], &mut requests);
        reg.break_part(ids[3], &mut requests);
        assert!(requests.0.is_empty());
        assert!(reg.is_part_type_destroyed(PartKind::LeftBalloon));
        assert!(!reg.is_part_type_destroyed(PartKind::RightBalloon));
    }

    #[test]
    fn missing_kind_is_not_destroyed() {
        let mut reg = PartRegistry::new(100.0);
        let rudder = reg.add_part(ShipPart::new(PartKind::Rudder, 10.0, 3.0));
        assert!(!reg.is_part_type_destroyed(PartKind::Mast));

        reg.break_part(rudder, &mut Requests::default());
        assert!(reg.is_part_type_destroyed(PartKind::Rudder));
        assert!(!reg.is_part_type_destroyed(PartKind::Mast));
    }

    #[test]
    fn collision_must_reach_break_velocity() {
        let (mut reg, _) = registry();
        let mut requests = Requests::default();
        let mast = ColliderHandle::from_raw_parts(2, 0);
        assert!(reg.evaluate_part_collision(mast, 99.5, &mut requests).is_none());
        let hit = reg.evaluate_part_collision(mast, 100.0, &mut requests);
        assert_eq!(hit.map(|b| b.kind), Some(PartKind::Mast));
        assert!(reg.evaluate_part_collision(mast, 1000.0, &mut requests).is_none());
    }

    #[test]
    fn unknown_collider_is_ignored() {
        let (mut reg, _) = registry();
        let mut requests = Requests::default();
        let stranger = ColliderHandle::from_raw_parts(40, 0);
        assert!(reg.evaluate_part_collision(stranger, 1.0e6, &mut requests).is_none());
    }

    #[test]
    fn repairing_one_balloon_rearms_death() {
        let (mut reg, ids) = registry();
        let mut requests = Requests::default();
        reg.break_part(ids[0], &mut requests);
        reg.break_part(ids[1], &mut requests);
        assert!(reg.repair_part(ids[1]));
        assert!(!reg.repair_part(ids[1]));
        reg.break_part(ids[1], &mut requests);
        assert_eq!(requests.0, vec![ShipMode::Dying, ShipMode::Dying]);
    }

    #[test]
    fn payload_lowers_handling() {
        let mut mass = ShipMass::new(100.0);
        mass.set_payload(25.0);
        assert!((mass.handling_mass_mult() - 0.8).abs() < 1e-6);
        assert!((mass.ratio() - 1.25).abs() < 1e-6);
    }
}
