//! Position update phases: discrete advance, TOI computation, continuous
//! advance.
//!
//! Every tick runs three ordered phases over the body set:
//!
//! 1. [`pre_update`](PositionUpdater::pre_update) — every updateable body
//!    gets its orientation stepped; discretely-updated bodies also advance
//!    their translation by the full `v · dt` and are finalized.
//! 2. [`update_times_of_impact`](PositionUpdater::update_times_of_impact) —
//!    CCD-eligible pairs compute their time-of-impact slots against immutable
//!    motion snapshots taken after the pre-update.
//! 3. [`continuous_update`](PositionUpdater::continuous_update) —
//!    continuously-updated bodies advance their translation by
//!    `v · dt · toi_min` and are finalized.
//!
//! The pre-update must precede TOI computation (so the stepped orientation is
//! visible) and TOI computation must precede the continuous update. Each
//! finalized body is queued for exactly one `PositionUpdated` emission per
//! tick, dispatched by [`finish_tick`](PositionUpdater::finish_tick).

use std::sync::Arc;

use rayon::iter::ParallelIterator;

use dynamics_types::{BodyHandle, MotionSettings, PositionUpdateMode};

use crate::body_set::BodySet;
use crate::collidable::SweptBody;
use crate::events::PositionUpdatedEvents;

/// Executes the per-tick position phases.
#[derive(Debug)]
pub struct PositionUpdater {
    settings: Arc<MotionSettings>,
    events: PositionUpdatedEvents,
}

impl Default for PositionUpdater {
    fn default() -> Self {
        Self::new(Arc::new(MotionSettings::default()))
    }
}

impl PositionUpdater {
    /// Create an updater against the global motion settings.
    #[must_use]
    pub fn new(settings: Arc<MotionSettings>) -> Self {
        Self {
            settings,
            events: PositionUpdatedEvents::new(),
        }
    }

    /// The `PositionUpdated` subscriber list.
    pub fn events_mut(&mut self) -> &mut PositionUpdatedEvents {
        &mut self.events
    }

    /// Read-only view of the subscriber list.
    #[must_use]
    pub fn events(&self) -> &PositionUpdatedEvents {
        &self.events
    }

    /// Phase 1: step orientations for every updateable body; advance and
    /// finalize discretely-updated bodies.
    pub fn pre_update(&mut self, bodies: &mut BodySet, dt: f64) {
        let finalized: Vec<BodyHandle> = bodies
            .par_iter_mut()
            .filter_map(|(handle, body)| {
                body.step_orientation(dt);
                if body.position_update_mode() == PositionUpdateMode::Discrete {
                    let delta = body.linear_velocity() * dt;
                    body.advance_position(delta);
                    Some(handle)
                } else {
                    None
                }
            })
            .collect();
        self.events.enqueue(finalized);
    }

    /// Phase 2: recompute time-of-impact slots for CCD-eligible pairs.
    ///
    /// Bodies are read through immutable snapshots taken up front, and each
    /// pair writes only its own slot, so the sweep is safe to parallelize
    /// across bodies.
    pub fn update_times_of_impact(&self, bodies: &mut BodySet, dt: f64) {
        let snapshots: Vec<Option<SweptBody>> = (0..bodies.slot_count())
            .map(|index| {
                bodies.body_at_slot(index).map(|body| SweptBody {
                    position: body.position(),
                    linear_velocity: body.linear_velocity(),
                    radius: body.collidable().shape().maximum_radius(),
                })
            })
            .collect();
        let settings = Arc::clone(&self.settings);

        bodies.par_iter_mut().for_each(|(handle, body)| {
            if body.position_update_mode() != PositionUpdateMode::Continuous {
                return;
            }
            let Some(own) = snapshots[handle.index()] else {
                return;
            };
            for pair in body.collidable_mut().pairs_mut() {
                if !settings.ccd_filter.allows(handle, pair.other()) {
                    continue;
                }
                if let Some(other) = snapshots
                    .get(pair.other().index())
                    .copied()
                    .flatten()
                {
                    pair.update_time_of_impact(&own, &other, dt);
                }
            }
        });
    }

    /// Reset every pair's time of impact to its no-impact default of 1.
    pub fn reset_times_of_impact(&self, bodies: &mut BodySet) {
        bodies.par_iter_mut().for_each(|(_, body)| {
            for pair in body.collidable_mut().pairs_mut() {
                pair.reset_time_of_impact();
            }
        });
    }

    /// Phase 3: advance and finalize continuously-updated bodies, clamping
    /// the translation to the earliest pair time of impact.
    pub fn continuous_update(&mut self, bodies: &mut BodySet, dt: f64) {
        let finalized: Vec<BodyHandle> = bodies
            .par_iter_mut()
            .filter_map(|(handle, body)| {
                if body.position_update_mode() != PositionUpdateMode::Continuous {
                    return None;
                }
                let toi_min = body
                    .collidable()
                    .pairs()
                    .iter()
                    .map(crate::collidable::ContactPair::time_of_impact)
                    .fold(1.0_f64, f64::min);
                let delta = body.linear_velocity() * dt * toi_min;
                body.advance_position(delta);
                Some(handle)
            })
            .collect();
        self.events.enqueue(finalized);
    }

    /// Dispatch the `PositionUpdated` events queued by the position phases.
    pub fn finish_tick(&mut self) {
        self.events.dispatch();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::collidable::{ContactPair, PairEntry};
    use crate::rigid_body::RigidBody;
    use crate::shape::Shape;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion, Vector3};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn drifting_body(mode: PositionUpdateMode, velocity: Vector3<f64>) -> RigidBody {
        let mut body = RigidBody::dynamic(Shape::sphere(1.0), 1.0).unwrap();
        body.set_position_update_mode(mode);
        body.set_linear_velocity(velocity);
        body
    }

    #[test]
    fn test_discrete_advance() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(drifting_body(
            PositionUpdateMode::Discrete,
            Vector3::new(2.0, 0.0, 0.0),
        ));

        let mut updater = PositionUpdater::default();
        updater.pre_update(&mut bodies, 0.5);

        let body = bodies.get(h).unwrap();
        assert_relative_eq!(body.position(), Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        // The collidable transform followed the body.
        assert_relative_eq!(
            body.collidable().world_position(),
            Point3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pre_update_steps_orientation_for_all_modes() {
        let mut bodies = BodySet::new();
        let mut continuous = drifting_body(PositionUpdateMode::Continuous, Vector3::zeros());
        continuous.set_angular_velocity(Vector3::new(0.0, std::f64::consts::PI, 0.0));
        let h = bodies.insert(continuous);

        let mut updater = PositionUpdater::default();
        updater.pre_update(&mut bodies, 1.0);

        let q = bodies.get(h).unwrap().orientation();
        assert_relative_eq!(q.coords.y.abs(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(q.coords.w, 0.0, epsilon = 1e-10);
        // Orientation matrix refreshed alongside the quaternion.
        assert_relative_eq!(
            *bodies.get(h).unwrap().orientation_matrix(),
            q.to_rotation_matrix().into_inner(),
            epsilon = 1e-12
        );
        // Continuous bodies do not translate during the pre-update.
        assert_eq!(bodies.get(h).unwrap().position(), Point3::origin());
    }

    #[test]
    fn test_continuous_clamps_to_toi() {
        let mut bodies = BodySet::new();
        let mover = bodies.insert(drifting_body(
            PositionUpdateMode::Continuous,
            Vector3::new(10.0, 0.0, 0.0),
        ));
        let mut obstacle = RigidBody::kinematic(Shape::sphere(1.0));
        obstacle.set_position(Point3::new(7.0, 0.0, 0.0));
        let obstacle = bodies.insert(obstacle);

        bodies
            .get_mut(mover)
            .unwrap()
            .collidable_mut()
            .add_pair(
                ContactPair::between(PairEntry::Rigid(mover), PairEntry::Rigid(obstacle)).unwrap(),
            );

        let mut updater = PositionUpdater::default();
        updater.pre_update(&mut bodies, 1.0);
        updater.update_times_of_impact(&mut bodies, 1.0);
        updater.continuous_update(&mut bodies, 1.0);

        // Gap of 5m closing at 10 m/s: impact halfway through the step.
        let body = bodies.get(mover).unwrap();
        assert_relative_eq!(
            body.collidable().pairs()[0].time_of_impact(),
            0.5,
            epsilon = 1e-10
        );
        assert_relative_eq!(body.position(), Point3::new(5.0, 0.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_continuous_without_pairs_moves_fully() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(drifting_body(
            PositionUpdateMode::Continuous,
            Vector3::new(10.0, 0.0, 0.0),
        ));

        let mut updater = PositionUpdater::default();
        updater.pre_update(&mut bodies, 1.0);
        updater.update_times_of_impact(&mut bodies, 1.0);
        updater.continuous_update(&mut bodies, 1.0);

        assert_relative_eq!(
            bodies.get(h).unwrap().position(),
            Point3::new(10.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_reset_times_of_impact() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(drifting_body(
            PositionUpdateMode::Continuous,
            Vector3::new(10.0, 0.0, 0.0),
        ));
        let mut obstacle = RigidBody::kinematic(Shape::sphere(1.0));
        obstacle.set_position(Point3::new(7.0, 0.0, 0.0));
        let b = bodies.insert(obstacle);
        bodies
            .get_mut(a)
            .unwrap()
            .collidable_mut()
            .add_pair(ContactPair::between(PairEntry::Rigid(a), PairEntry::Rigid(b)).unwrap());

        let updater = PositionUpdater::default();
        updater.update_times_of_impact(&mut bodies, 1.0);
        assert!(bodies.get(a).unwrap().collidable().pairs()[0].time_of_impact() < 1.0);

        updater.reset_times_of_impact(&mut bodies);
        assert_eq!(
            bodies.get(a).unwrap().collidable().pairs()[0].time_of_impact(),
            1.0
        );
    }

    #[test]
    fn test_ccd_filter_none_leaves_slots_alone() {
        let settings = Arc::new(MotionSettings::default().with_ccd_filter(
            dynamics_types::CcdFilter::None,
        ));
        let mut bodies = BodySet::new();
        let a = bodies.insert(drifting_body(
            PositionUpdateMode::Continuous,
            Vector3::new(10.0, 0.0, 0.0),
        ));
        let mut obstacle = RigidBody::kinematic(Shape::sphere(1.0));
        obstacle.set_position(Point3::new(7.0, 0.0, 0.0));
        let b = bodies.insert(obstacle);
        bodies
            .get_mut(a)
            .unwrap()
            .collidable_mut()
            .add_pair(ContactPair::between(PairEntry::Rigid(a), PairEntry::Rigid(b)).unwrap());

        let updater = PositionUpdater::new(settings);
        updater.update_times_of_impact(&mut bodies, 1.0);
        assert_eq!(
            bodies.get(a).unwrap().collidable().pairs()[0].time_of_impact(),
            1.0
        );
    }

    #[test]
    fn test_position_updated_emitted_once_per_body() {
        let mut bodies = BodySet::new();
        let discrete = bodies.insert(drifting_body(
            PositionUpdateMode::Discrete,
            Vector3::new(1.0, 0.0, 0.0),
        ));
        let continuous = bodies.insert(drifting_body(
            PositionUpdateMode::Continuous,
            Vector3::new(1.0, 0.0, 0.0),
        ));

        let mut updater = PositionUpdater::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        {
            let count = Arc::clone(&count);
            let seen = Arc::clone(&seen);
            updater.events_mut().subscribe(move |handle| {
                count.fetch_add(1, Ordering::Relaxed);
                seen.lock().map(|mut s| s.push(handle)).ok();
            });
        }

        updater.pre_update(&mut bodies, 1.0);
        updater.update_times_of_impact(&mut bodies, 1.0);
        updater.continuous_update(&mut bodies, 1.0);
        updater.finish_tick();

        assert_eq!(count.load(Ordering::Relaxed), 2);
        let seen = seen.lock().unwrap();
        assert!(seen.contains(&discrete));
        assert!(seen.contains(&continuous));
    }

    #[test]
    fn test_kinematic_bodies_are_updateable() {
        let mut bodies = BodySet::new();
        let mut body = RigidBody::kinematic(Shape::sphere(1.0));
        body.set_linear_velocity(Vector3::new(3.0, 0.0, 0.0));
        body.set_angular_velocity(Vector3::new(0.0, 1.0, 0.0));
        let h = bodies.insert(body);

        let mut updater = PositionUpdater::default();
        updater.pre_update(&mut bodies, 1.0);

        let body = bodies.get(h).unwrap();
        assert_relative_eq!(body.position(), Point3::new(3.0, 0.0, 0.0), epsilon = 1e-12);
        assert_ne!(body.orientation(), UnitQuaternion::identity());
    }
}
