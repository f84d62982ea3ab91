//! Airship combat core: per-ship mode state machine, flight model, destructible
//! parts, collision consequences and the passenger tray, driven by a headless
//! simulation over `rapier3d`.

pub mod behaviours;
pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod flight;
pub mod kinematics;
pub mod parts;
pub mod ship;
pub mod sim;
pub mod state;
pub mod targeting;
pub mod tray;

pub use collision::{CollisionKind, CollisionOutcome};
pub use config::{ShipTuning, SimConfig};
pub use error::{ShipError, TuningError, UnknownMode};
pub use events::{HapticRequest, Rumble, ShipEvent};
pub use flight::{FlightForces, FlightModel};
pub use kinematics::ShipKinematics;
pub use parts::{MassProvider, PartKind, PartRegistry, PartStatus};
pub use ship::{Ship, ShipCommand};
pub use sim::{ShipSnapshot, Simulation};
pub use state::{ShipMode, ShipStateMachine, StateRequester, Visibility};
