//! Outbound notifications from a ship to the layers that present it.

use engine_core::PlayerSlot;

use crate::collision::CollisionKind;
use crate::parts::PartKind;
use crate::state::ShipMode;

/// Controller motor intensities for one rumble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rumble {
    pub left: f32,
    pub right: f32,
    pub duration: f32,
    /// Timed rumbles stop after `duration`; untimed ones fade on the pad's own schedule.
    pub timed: bool,
}

impl Rumble {
    pub fn new(left: f32, right: f32, duration: f32, timed: bool) -> Self {
        Self {
            left,
            right,
            duration,
            timed,
        }
    }
}

/// Fire-and-forget request for the haptics layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticRequest {
    pub player: PlayerSlot,
    pub rumble: Rumble,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShipEvent {
    ModeChanged { from: ShipMode, to: ShipMode },
    PartDestroyed { kind: PartKind },
    BalloonPopped { kind: PartKind },
    PartsRepaired,
    TrayPoweredDown,
    Collision { kind: CollisionKind },
    Haptic(HapticRequest),
}
