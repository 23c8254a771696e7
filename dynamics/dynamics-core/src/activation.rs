//! Activation state shared between bodies and the sleep system.
//!
//! Each body holds an [`ActivationHandle`] in an `Arc`; the island manager
//! holds the other reference. All state on the handle is atomic so mutation
//! setters, the integrator's stabilization gate, and the deactivation pass can
//! touch it from any phase without locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use dynamics_types::DeactivationSettings;

/// Activity record for one body.
///
/// `activate` is called by every state mutation on the body (unless an
/// explicit without-activation path is used); the deactivation pass drives
/// the slowing flag and the low-velocity timer.
#[derive(Debug)]
pub struct ActivationHandle {
    active: AtomicBool,
    slowing: AtomicBool,
    allow_stabilization: AtomicBool,
    /// f64 bit patterns; the timer and energy are never torn because every
    /// access goes through the bit-cast helpers below.
    velocity_time_below_limit_bits: AtomicU64,
    previous_energy_bits: AtomicU64,
    settings: Arc<DeactivationSettings>,
}

impl ActivationHandle {
    /// Create an active handle using the given thresholds.
    #[must_use]
    pub fn new(settings: Arc<DeactivationSettings>) -> Self {
        Self {
            active: AtomicBool::new(true),
            slowing: AtomicBool::new(false),
            allow_stabilization: AtomicBool::new(true),
            velocity_time_below_limit_bits: AtomicU64::new(0.0_f64.to_bits()),
            previous_energy_bits: AtomicU64::new(f64::INFINITY.to_bits()),
            settings,
        }
    }

    /// Wake the body and clear the deactivation countdown.
    pub fn activate(&self) {
        self.store_time_below_limit(0.0);
        if !self.active.swap(true, Ordering::Release) {
            trace!("body reactivated");
        }
    }

    /// Whether the body's island is currently simulated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Whether the body lost kinetic energy over the last deactivation pass.
    #[must_use]
    pub fn is_slowing(&self) -> bool {
        self.slowing.load(Ordering::Relaxed)
    }

    /// Seconds the body has spent below the velocity floor.
    #[must_use]
    pub fn velocity_time_below_limit(&self) -> f64 {
        f64::from_bits(self.velocity_time_below_limit_bits.load(Ordering::Relaxed))
    }

    /// Whether the integrator may apply low-velocity stabilization to this body.
    #[must_use]
    pub fn allow_stabilization(&self) -> bool {
        self.allow_stabilization.load(Ordering::Relaxed)
    }

    /// Opt the body in or out of low-velocity stabilization.
    pub fn set_allow_stabilization(&self, allow: bool) {
        self.allow_stabilization.store(allow, Ordering::Relaxed);
    }

    /// The thresholds this handle was created with.
    #[must_use]
    pub fn settings(&self) -> &DeactivationSettings {
        &self.settings
    }

    fn store_time_below_limit(&self, value: f64) {
        self.velocity_time_below_limit_bits
            .store(value.to_bits(), Ordering::Relaxed);
    }

    /// Record one deactivation-pass sample of the body's kinetic energy
    /// measure (`|v|² + |ω|²`). Updates the slowing flag and the
    /// low-velocity timer; returns true when the body should deactivate.
    pub(crate) fn record_energy_sample(&self, energy: f64, dt: f64) -> bool {
        let previous = f64::from_bits(self.previous_energy_bits.load(Ordering::Relaxed));
        self.slowing.store(energy < previous, Ordering::Relaxed);
        self.previous_energy_bits
            .store(energy.to_bits(), Ordering::Relaxed);

        if energy < self.settings.velocity_lower_limit_squared() {
            let time = self.velocity_time_below_limit() + dt;
            self.store_time_below_limit(time);
            self.settings.allow_deactivation && time > self.settings.sleep_time_threshold
        } else {
            self.store_time_below_limit(0.0);
            false
        }
    }

    pub(crate) fn deactivate(&self) {
        if self.active.swap(false, Ordering::Release) {
            trace!("body deactivated");
        }
    }
}

/// The timer half of the sleep system.
///
/// Walks the body set once per tick, samples each body's energy, and
/// deactivates bodies that have idled past the hysteresis threshold. Island
/// grouping (waking neighbors on contact) lives with the space, outside this
/// crate.
#[derive(Debug, Clone)]
pub struct DeactivationManager {
    settings: Arc<DeactivationSettings>,
}

impl Default for DeactivationManager {
    fn default() -> Self {
        Self::new(Arc::new(DeactivationSettings::default()))
    }
}

impl DeactivationManager {
    /// Create a manager with the given thresholds.
    #[must_use]
    pub fn new(settings: Arc<DeactivationSettings>) -> Self {
        Self { settings }
    }

    /// The shared thresholds, for handing to new bodies.
    #[must_use]
    pub fn settings(&self) -> &Arc<DeactivationSettings> {
        &self.settings
    }

    /// End-of-tick pass over all bodies.
    pub fn update(&self, bodies: &crate::body_set::BodySet, dt: f64) {
        for (_, body) in bodies.iter() {
            let energy = body.linear_velocity().norm_squared()
                + body.angular_velocity().norm_squared();
            if body.activation_handle().record_energy_sample(energy, dt) {
                body.activation_handle().deactivate();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn handle() -> ActivationHandle {
        ActivationHandle::new(Arc::new(DeactivationSettings::default()))
    }

    #[test]
    fn test_starts_active() {
        let h = handle();
        assert!(h.is_active());
        assert_eq!(h.velocity_time_below_limit(), 0.0);
        assert!(h.allow_stabilization());
    }

    #[test]
    fn test_activate_clears_timer() {
        let h = handle();
        // Idle well past the floor for a while.
        for _ in 0..10 {
            h.record_energy_sample(0.0, 0.5);
        }
        assert!(h.velocity_time_below_limit() > 1.0);

        h.activate();
        assert_eq!(h.velocity_time_below_limit(), 0.0);
    }

    #[test]
    fn test_slowing_tracks_energy_trend() {
        let h = handle();
        h.record_energy_sample(4.0, 0.01);
        h.record_energy_sample(3.0, 0.01);
        assert!(h.is_slowing());
        h.record_energy_sample(5.0, 0.01);
        assert!(!h.is_slowing());
    }

    #[test]
    fn test_deactivation_after_hysteresis() {
        let settings = Arc::new(DeactivationSettings {
            sleep_time_threshold: 1.0,
            ..Default::default()
        });
        let h = ActivationHandle::new(settings);

        assert!(!h.record_energy_sample(0.0, 0.6));
        assert!(h.record_energy_sample(0.0, 0.6));
    }

    #[test]
    fn test_fast_body_resets_timer() {
        let h = handle();
        h.record_energy_sample(0.0, 0.5);
        assert!(h.velocity_time_below_limit() > 0.0);
        h.record_energy_sample(100.0, 0.5);
        assert_eq!(h.velocity_time_below_limit(), 0.0);
    }

    #[test]
    fn test_manager_deactivates_idle_bodies() {
        use crate::body_set::BodySet;
        use crate::rigid_body::RigidBody;
        use crate::shape::Shape;
        use nalgebra::Vector3;

        let manager = DeactivationManager::default();
        let mut bodies = BodySet::new();

        let mut idle = RigidBody::dynamic(Shape::sphere(1.0), 1.0).unwrap();
        idle.set_gravity_affected(false);
        let idle = bodies.insert(idle);

        let mut busy = RigidBody::dynamic(Shape::sphere(1.0), 1.0).unwrap();
        busy.set_linear_velocity(Vector3::new(5.0, 0.0, 0.0));
        let busy = bodies.insert(busy);

        // Three simulated seconds, past the default hysteresis.
        for _ in 0..30 {
            manager.update(&bodies, 0.1);
        }

        assert!(!bodies.get(idle).unwrap().activation_handle().is_active());
        assert!(bodies.get(busy).unwrap().activation_handle().is_active());
    }

    #[test]
    fn test_deactivation_disabled() {
        let settings = Arc::new(DeactivationSettings {
            allow_deactivation: false,
            sleep_time_threshold: 0.1,
            ..Default::default()
        });
        let h = ActivationHandle::new(settings);
        for _ in 0..100 {
            assert!(!h.record_energy_sample(0.0, 1.0));
        }
    }
}
