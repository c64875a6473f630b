//! # Penny Arm Library
//!
//! Shared types and utilities for the Penny 6-DOF arm: forward/inverse
//! kinematics, servo calibration, the serial wire codec, the transport
//! session and the [`ArmController`] that ties them together.

pub mod controller;
pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use controller::*;
pub use types::*;
pub use utils::*;
