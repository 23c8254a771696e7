//! Body identity and motion state types.
//!
//! A body has two notions of identity: a [`BodyId`], unique for the lifetime
//! of the process and assigned at construction, and a [`BodyHandle`], the
//! arena slot a body occupies once inserted into a body set. Handles carry a
//! generation counter so a handle to a removed body is detectably stale.

use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a rigid body, monotonic for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Allocate the next body ID.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Arena address of a body: slot index plus generation.
///
/// The generation is bumped when a slot is vacated, so handles held across a
/// removal resolve to nothing instead of aliasing a newer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Create a handle from raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The arena slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// The slot generation this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}v{}", self.index, self.generation)
    }
}

/// How a body's pose is advanced each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionUpdateMode {
    /// Advance the pose by the full `v · dt` every tick.
    #[default]
    Discrete,
    /// Advance the orientation normally, but clamp the translation to the
    /// earliest time of impact reported by the body's pairs.
    Continuous,
}

/// Which angular quantity is the primary state of a body.
///
/// With [`Velocity`](AngularRepresentation::Velocity) the angular velocity is
/// stored and momentum is derived on read. With
/// [`Momentum`](AngularRepresentation::Momentum) the angular momentum is
/// conserved through orientation changes and the velocity is re-derived after
/// every world-tensor refresh. Fixed at simulation construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AngularRepresentation {
    /// Angular velocity is primary.
    #[default]
    Velocity,
    /// Angular momentum is primary.
    Momentum,
}

/// Pose and velocity of a rigid body at a point in time.
///
/// A plain value used for buffered and interpolated reads; immutable after
/// creation.
///
/// # Example
///
/// ```
/// use dynamics_types::MotionState;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let state = MotionState::new(
///     Point3::origin(),
///     UnitQuaternion::identity(),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::zeros(),
/// );
/// assert!(state.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionState {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
    /// Linear velocity in world coordinates (m/s).
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity in world coordinates (rad/s).
    pub angular_velocity: Vector3<f64>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self::at_rest(Point3::origin())
    }
}

impl MotionState {
    /// Create a motion state from its four components.
    #[must_use]
    pub const fn new(
        position: Point3<f64>,
        orientation: UnitQuaternion<f64>,
        linear_velocity: Vector3<f64>,
        angular_velocity: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            orientation,
            linear_velocity,
            angular_velocity,
        }
    }

    /// Create a motion state at rest at the given position.
    #[must_use]
    pub fn at_rest(position: Point3<f64>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Velocity of the material point at `location` in world coordinates.
    ///
    /// `v_point = v + ω × (location − position)`
    #[must_use]
    pub fn velocity_at_point(&self, location: &Point3<f64>) -> Vector3<f64> {
        self.linear_velocity + self.angular_velocity.cross(&(location - self.position))
    }

    /// Check that every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.linear_velocity.iter().all(|x| x.is_finite())
            && self.angular_velocity.iter().all(|x| x.is_finite())
    }

    /// Linear interpolation between two states.
    ///
    /// Uses SLERP for the orientation.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            position: Point3::from(self.position.coords.lerp(&other.position.coords, t)),
            orientation: self.orientation.slerp(&other.orientation, t),
            linear_velocity: self.linear_velocity.lerp(&other.linear_velocity, t),
            angular_velocity: self.angular_velocity.lerp(&other.angular_velocity, t),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id_monotonic() {
        let a = BodyId::fresh();
        let b = BodyId::fresh();
        assert!(b.raw() > a.raw());
        assert_eq!(a.to_string(), format!("Body({})", a.raw()));
    }

    #[test]
    fn test_body_handle_parts() {
        let h = BodyHandle::new(7, 2);
        assert_eq!(h.index(), 7);
        assert_eq!(h.generation(), 2);
        assert_eq!(h.to_string(), "slot 7v2");
    }

    #[test]
    fn test_velocity_at_point() {
        // Spinning around Z; a point one meter along X moves along Y.
        let state = MotionState::new(
            Point3::origin(),
            UnitQuaternion::identity(),
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let v = state.velocity_at_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = MotionState::at_rest(Point3::origin());
        let b = MotionState::at_rest(Point3::new(10.0, 0.0, 0.0));
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.position.x, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_is_finite_rejects_nan() {
        let mut state = MotionState::default();
        assert!(state.is_finite());
        state.linear_velocity.x = f64::NAN;
        assert!(!state.is_finite());
    }

    #[test]
    fn test_update_mode_default() {
        assert_eq!(PositionUpdateMode::default(), PositionUpdateMode::Discrete);
        assert_eq!(
            AngularRepresentation::default(),
            AngularRepresentation::Velocity
        );
    }
}
