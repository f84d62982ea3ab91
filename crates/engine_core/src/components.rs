//! Common ECS components used across the engine.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Velocity component for moving entities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self {
            linear,
            angular: Vec3::ZERO,
        }
    }

    pub fn with_angular(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }
}

/// Which local player (and therefore which gamepad) owns an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    Player1,
    Player2,
    Player3,
    Player4,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no player slot for index {0} (expected 0..=3)")]
pub struct InvalidPlayerSlot(pub usize);

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 4] = [
        PlayerSlot::Player1,
        PlayerSlot::Player2,
        PlayerSlot::Player3,
        PlayerSlot::Player4,
    ];

    /// Zero-based controller index.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::Player1 => 0,
            PlayerSlot::Player2 => 1,
            PlayerSlot::Player3 => 2,
            PlayerSlot::Player4 => 3,
        }
    }
}

impl TryFrom<usize> for PlayerSlot {
    type Error = InvalidPlayerSlot;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(index).copied().ok_or(InvalidPlayerSlot(index))
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.index() + 1)
    }
}
