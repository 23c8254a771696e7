//! Core types for rigid body dynamics.
//!
//! This crate provides the foundational types for a 3D rigid body dynamics
//! engine:
//!
//! - [`MotionState`] - Pose and velocity snapshot of a rigid body
//! - [`BodyId`] / [`BodyHandle`] - Identity and arena addressing
//! - [`MotionSettings`] / [`DeactivationSettings`] - Global tuning knobs
//! - [`DynamicsError`] - Error taxonomy for lifecycle operations
//! - [`math`] - Specialized numerics (adaptive tensor inverse, orientation
//!   stepping, orthogonality checks)
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no integration loop, no collision
//! detection, no solver. They're the common language between:
//!
//! - The dynamics core (bodies, integrator, position update)
//! - Constraint solvers operating on body velocities
//! - Sleep/activation management
//! - Logging and replay of body trajectories
//!
//! # Coordinate System
//!
//! Right-handed, with world-space angular velocity. Orientations are unit
//! quaternions; every public type that carries an orientation keeps it within
//! 1e-5 of unit norm.
//!
//! # Example
//!
//! ```
//! use dynamics_types::MotionState;
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//!
//! let state = MotionState::new(
//!     Point3::new(0.0, 10.0, 0.0),
//!     UnitQuaternion::identity(),
//!     Vector3::zeros(),
//!     Vector3::zeros(),
//! );
//!
//! assert_eq!(state.position.y, 10.0);
//! assert!(state.is_finite());
//! ```

#![doc(html_root_url = "https://docs.rs/dynamics-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
pub mod math;

pub use body::{AngularRepresentation, BodyHandle, BodyId, MotionState, PositionUpdateMode};
pub use config::{CcdFilter, CollisionGroup, CollisionRules, DeactivationSettings, MotionSettings};
pub use error::DynamicsError;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_state_round_trip_fields() {
        let state = MotionState::new(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::identity(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::zeros(),
        );

        assert_eq!(state.position.x, 1.0);
        assert_eq!(state.linear_velocity.x, 1.0);
    }

    #[test]
    fn test_result_alias() {
        fn fails() -> Result<()> {
            Err(DynamicsError::invalid_mass("mass must be positive"))
        }
        assert!(fails().is_err());
    }
}
