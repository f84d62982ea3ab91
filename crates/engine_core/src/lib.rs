//! Core engine types shared by the airship crates.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial components
//! - Fixed-timestep time management
//! - Common component types for ECS

pub mod components;
pub mod time;
pub mod transform;

pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec2, Vec3};
pub use hecs::{Entity, World};
