//! Force and damping integration.
//!
//! The integrator advances every dynamic body's velocity for gravity and
//! damping over a timestep, optionally boosting damping on bodies hovering
//! near the sleep threshold, and finishes by refreshing the world-space
//! inertia tensors from the current orientation. It runs data-parallel over
//! disjoint bodies; it never propagates errors — numeric violations surface
//! as debug-time assertions at the mutation point.

use std::sync::Arc;

use nalgebra::Vector3;
use rayon::iter::ParallelIterator;

use dynamics_types::DeactivationSettings;

use crate::body_set::BodySet;
use crate::rigid_body::RigidBody;

/// Velocity integration over the body set.
#[derive(Debug, Clone)]
pub struct Integrator {
    gravity: Vector3<f64>,
    gravity_dt: Vector3<f64>,
    deactivation: Arc<DeactivationSettings>,
}

impl Integrator {
    /// Create an integrator with the given gravity and default thresholds.
    #[must_use]
    pub fn new(gravity: Vector3<f64>) -> Self {
        Self::with_deactivation(gravity, Arc::new(DeactivationSettings::default()))
    }

    /// Create an integrator sharing the sleep system's thresholds.
    #[must_use]
    pub fn with_deactivation(
        gravity: Vector3<f64>,
        deactivation: Arc<DeactivationSettings>,
    ) -> Self {
        Self {
            gravity,
            gravity_dt: Vector3::zeros(),
            deactivation,
        }
    }

    /// The gravity acceleration vector.
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// Change the gravity acceleration vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    /// Gravity velocity increment precomputed for the running tick.
    #[must_use]
    pub fn gravity_dt(&self) -> Vector3<f64> {
        self.gravity_dt
    }

    /// Integrate all dynamic bodies over `dt`.
    pub fn update(&mut self, bodies: &mut BodySet, dt: f64) {
        self.gravity_dt = self.gravity * dt;
        let gravity_dt = self.gravity_dt;
        let deactivation = Arc::clone(&self.deactivation);

        bodies.par_iter_mut().for_each(|(_, body)| {
            integrate_body(body, &gravity_dt, dt, &deactivation);
        });
    }
}

/// Per-body velocity update: gravity, stabilization boost, damping, world
/// tensor refresh.
fn integrate_body(
    body: &mut RigidBody,
    gravity_dt: &Vector3<f64>,
    dt: f64,
    deactivation: &DeactivationSettings,
) {
    if !body.is_dynamic() {
        return;
    }

    if body.gravity_affected() {
        body.apply_gravity(gravity_dt);
    }

    if deactivation.use_stabilization {
        let activation = Arc::clone(body.activation_handle());
        let engaged = activation.allow_stabilization()
            && (activation.is_slowing()
                || activation.velocity_time_below_limit() > deactivation.low_velocity_time_minimum);
        if engaged {
            let energy = body.linear_velocity().norm_squared()
                + body.angular_velocity().norm_squared();
            if energy < deactivation.velocity_lower_limit_squared() {
                let boost = 1.0 - energy.sqrt() / (2.0 * deactivation.velocity_lower_limit);
                body.modify_linear_damping(boost);
                body.modify_angular_damping(boost);
            }
        }
    }

    body.apply_damping(dt);
    body.refresh_world_inertia();
}
