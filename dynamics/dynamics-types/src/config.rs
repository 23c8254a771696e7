//! Configuration types for the dynamics core.
//!
//! [`MotionSettings`] holds the global, read-only-during-a-tick knobs the
//! position updater and body constructors consult; [`DeactivationSettings`]
//! holds the thresholds the sleep system and the integrator's low-velocity
//! stabilization share.

use std::sync::Arc;

use crate::body::{AngularRepresentation, BodyHandle, PositionUpdateMode};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collision filtering group of a collidable.
///
/// Bodies default to the group paired with their mass mode; a custom group is
/// never touched by mode transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionGroup {
    /// No group assigned yet; mode transitions assign the paired default.
    #[default]
    Unspecified,
    /// The default group for dynamic bodies.
    DefaultDynamic,
    /// The default group for kinematic bodies.
    DefaultKinematic,
    /// A user-assigned group, left alone by mode transitions.
    Custom(u32),
}

/// Collision filtering state carried by a collidable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionRules {
    /// The collidable's filtering group.
    pub group: CollisionGroup,
}

/// Which pairs are eligible for continuous collision detection.
#[derive(Clone, Default)]
pub enum CcdFilter {
    /// Every pair on a continuously-updated body is eligible.
    #[default]
    AllPairs,
    /// No pair is ever eligible (continuous bodies still clamp to 1).
    None,
    /// Custom predicate over the two bodies of a pair.
    Custom(Arc<dyn Fn(BodyHandle, BodyHandle) -> bool + Send + Sync>),
}

impl std::fmt::Debug for CcdFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllPairs => write!(f, "CcdFilter::AllPairs"),
            Self::None => write!(f, "CcdFilter::None"),
            Self::Custom(_) => write!(f, "CcdFilter::Custom(..)"),
        }
    }
}

impl CcdFilter {
    /// Evaluate the filter for a pair of bodies.
    #[must_use]
    pub fn allows(&self, own: BodyHandle, other: BodyHandle) -> bool {
        match self {
            Self::AllPairs => true,
            Self::None => false,
            Self::Custom(predicate) => predicate(own, other),
        }
    }
}

/// Global motion settings, fixed for the lifetime of a simulation.
#[derive(Debug, Clone)]
pub struct MotionSettings {
    /// Update mode assigned to newly constructed bodies.
    pub default_position_update_mode: PositionUpdateMode,
    /// Whether angular velocity or angular momentum is the primary state.
    pub angular_representation: AngularRepresentation,
    /// Pair eligibility for continuous collision detection.
    pub ccd_filter: CcdFilter,
    /// Shape-family constant applied when a volume distribution is scaled to
    /// a local inertia tensor: `tensor = distribution · (mass · scale)`.
    pub inertia_tensor_scale: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            default_position_update_mode: PositionUpdateMode::Discrete,
            angular_representation: AngularRepresentation::Velocity,
            ccd_filter: CcdFilter::AllPairs,
            inertia_tensor_scale: 1.0,
        }
    }
}

impl MotionSettings {
    /// Settings with continuous position updates as the default.
    #[must_use]
    pub fn continuous() -> Self {
        Self {
            default_position_update_mode: PositionUpdateMode::Continuous,
            ..Default::default()
        }
    }

    /// Settings that conserve angular momentum through orientation changes.
    #[must_use]
    pub fn conserving() -> Self {
        Self {
            angular_representation: AngularRepresentation::Momentum,
            ..Default::default()
        }
    }

    /// Set the CCD filter.
    #[must_use]
    pub fn with_ccd_filter(mut self, filter: CcdFilter) -> Self {
        self.ccd_filter = filter;
        self
    }
}

/// Thresholds shared by the sleep system and the integrator's low-velocity
/// stabilization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeactivationSettings {
    /// Whether the integrator may boost damping on slow bodies.
    pub use_stabilization: bool,
    /// Speed floor (combined linear and angular) under which a body counts
    /// as nearly at rest.
    pub velocity_lower_limit: f64,
    /// Time a body must stay under the floor before stabilization may engage.
    pub low_velocity_time_minimum: f64,
    /// Time under the floor before the body is deactivated entirely.
    pub sleep_time_threshold: f64,
    /// Whether bodies may be deactivated at all.
    pub allow_deactivation: bool,
}

impl Default for DeactivationSettings {
    fn default() -> Self {
        Self {
            use_stabilization: true,
            velocity_lower_limit: 0.26,
            low_velocity_time_minimum: 1.0,
            sleep_time_threshold: 2.0,
            allow_deactivation: true,
        }
    }
}

impl DeactivationSettings {
    /// The squared velocity floor, for comparison against `|v|² + |ω|²`.
    #[must_use]
    pub fn velocity_lower_limit_squared(&self) -> f64 {
        self.velocity_lower_limit * self.velocity_lower_limit
    }

    /// Settings that never deactivate and never stabilize.
    #[must_use]
    pub fn always_active() -> Self {
        Self {
            use_stabilization: false,
            allow_deactivation: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_settings_defaults() {
        let settings = MotionSettings::default();
        assert_eq!(
            settings.default_position_update_mode,
            PositionUpdateMode::Discrete
        );
        assert_eq!(settings.inertia_tensor_scale, 1.0);
    }

    #[test]
    fn test_continuous_preset() {
        let settings = MotionSettings::continuous();
        assert_eq!(
            settings.default_position_update_mode,
            PositionUpdateMode::Continuous
        );
    }

    #[test]
    fn test_ccd_filter() {
        let a = BodyHandle::new(0, 0);
        let b = BodyHandle::new(1, 0);

        assert!(CcdFilter::AllPairs.allows(a, b));
        assert!(!CcdFilter::None.allows(a, b));

        let only_slot_zero = CcdFilter::Custom(Arc::new(|own, _| own.index() == 0));
        assert!(only_slot_zero.allows(a, b));
        assert!(!only_slot_zero.allows(b, a));
    }

    #[test]
    fn test_deactivation_limits() {
        let settings = DeactivationSettings::default();
        let expected = settings.velocity_lower_limit * settings.velocity_lower_limit;
        assert!((settings.velocity_lower_limit_squared() - expected).abs() < 1e-12);

        let always = DeactivationSettings::always_active();
        assert!(!always.allow_deactivation);
        assert!(!always.use_stabilization);
    }

    #[test]
    fn test_collision_group_default() {
        assert_eq!(CollisionGroup::default(), CollisionGroup::Unspecified);
        assert_eq!(CollisionRules::default().group, CollisionGroup::Unspecified);
    }
}
