//! Error types for ship setup and tuning.

use engine_core::{Entity, PlayerSlot};
use thiserror::Error;

/// A tuning file that cannot drive a ship.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },
    #[error("destructible parts weigh {parts}, leaving less than the minimum ship mass out of {mass}")]
    PartsTooHeavy { parts: f32, mass: f32 },
}

/// Failures while adding a ship to the simulation.
#[derive(Debug, Error)]
pub enum ShipError {
    #[error("player slot {0} already has a ship")]
    SlotTaken(PlayerSlot),
    #[error("invalid ship tuning: {0}")]
    Tuning(#[from] TuningError),
    #[error("entity {0:?} is not a ship")]
    NotAShip(Entity),
}

/// A mode name that does not match any [`crate::ShipMode`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown ship mode '{0}'")]
pub struct UnknownMode(pub String);
