//! The collidable attached to each rigid body.
//!
//! A [`Collidable`] is exclusively owned by its body and carries the body's
//! presence in collision detection: the shape, the world transform the
//! position updater publishes, the collision filtering rules, and the list of
//! contact pairs the narrow phase has produced. Pair lists are append-only
//! during the narrow phase and treated as read-only snapshots during solver
//! and position phases; the only per-tick mutation the core performs is each
//! pair's own time-of-impact slot.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use dynamics_types::{BodyHandle, CollisionRules, DynamicsError, Result};

use crate::shape::{Material, Shape};

/// What the broad phase hands to a pair handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairEntry {
    /// A collidable owned by a rigid body.
    Rigid(BodyHandle),
    /// A volume that reports overlaps but never generates contacts.
    DetectorVolume,
}

/// A narrow phase pair between a collidable and an opposing entry.
///
/// Owns a time-of-impact slot in `[0, 1]`: the fraction of the timestep before
/// the swept shapes can first touch. Reset to 1 each tick; written exactly
/// once per tick by [`ContactPair::update_time_of_impact`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPair {
    other: BodyHandle,
    time_of_impact: f64,
    friction: f64,
    restitution: f64,
}

impl ContactPair {
    /// Build a pair from two broad phase entries.
    ///
    /// The pair belongs to the first entry's collidable and records the second
    /// entry as the opposing body. Entries that cannot generate contacts are
    /// rejected with [`DynamicsError::InvalidPairEntry`] and the pair stays
    /// uninitialized.
    pub fn between(own: PairEntry, other: PairEntry) -> Result<Self> {
        let PairEntry::Rigid(_) = own else {
            return Err(DynamicsError::invalid_pair_entry(
                "pair owner must be a rigid collidable",
            ));
        };
        let PairEntry::Rigid(other) = other else {
            return Err(DynamicsError::invalid_pair_entry(
                "detector volumes do not generate contact pairs",
            ));
        };
        let defaults = Material::default();
        Ok(Self {
            other,
            time_of_impact: 1.0,
            friction: defaults.friction,
            restitution: defaults.restitution,
        })
    }

    /// Handle of the opposing body.
    #[must_use]
    pub fn other(&self) -> BodyHandle {
        self.other
    }

    /// The current time-of-impact estimate in `[0, 1]`.
    #[must_use]
    pub fn time_of_impact(&self) -> f64 {
        self.time_of_impact
    }

    /// Reset the time of impact to its no-impact default of 1.
    pub fn reset_time_of_impact(&mut self) {
        self.time_of_impact = 1.0;
    }

    /// Blended friction of the pair.
    #[must_use]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Blended restitution of the pair.
    #[must_use]
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Refresh the pair's material response from the owning body's material.
    ///
    /// Only the supplied material participates; a cleared material leaves the
    /// pair at its previous response until the narrow phase rebuilds it.
    pub fn update_material_properties(&mut self, material: &Material) {
        self.friction = material.friction;
        self.restitution = material.restitution;
    }

    /// Conservative swept-bounding-sphere time of impact.
    ///
    /// Computes the earliest `t ∈ [0, 1]` at which the two bounding spheres
    /// can touch given the relative linear velocity over `dt`, and writes it
    /// into this pair's slot. Only this pair's slot is mutated, so the sweep
    /// is safe to run concurrently across bodies.
    pub fn update_time_of_impact(&mut self, own: &SweptBody, other: &SweptBody, dt: f64) {
        let separation = other.position - own.position;
        let gap = separation.norm() - (own.radius + other.radius);
        if gap <= 0.0 {
            self.time_of_impact = 0.0;
            return;
        }

        let relative = own.linear_velocity - other.linear_velocity;
        let distance = separation.norm();
        if distance < f64::EPSILON {
            self.time_of_impact = 0.0;
            return;
        }
        let approach_speed = relative.dot(&separation) / distance;
        if approach_speed <= 0.0 {
            self.time_of_impact = 1.0;
            return;
        }

        self.time_of_impact = (gap / (approach_speed * dt)).min(1.0);
    }
}

/// Positional snapshot of a body used for swept time-of-impact estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptBody {
    /// World position of the body center.
    pub position: Point3<f64>,
    /// Linear velocity of the body.
    pub linear_velocity: Vector3<f64>,
    /// Bounding radius of the body's shape.
    pub radius: f64,
}

/// A body's presence in collision detection.
#[derive(Debug, Clone)]
pub struct Collidable {
    owner: Option<BodyHandle>,
    shape: Shape,
    world_position: Point3<f64>,
    world_orientation: UnitQuaternion<f64>,
    /// Collision filtering rules; the group field is swapped between paired
    /// defaults on mass-mode transitions.
    pub collision_rules: CollisionRules,
    pairs: Vec<ContactPair>,
}

impl Collidable {
    /// Create a collidable for a shape, not yet attached to a body slot.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            owner: None,
            shape,
            world_position: Point3::origin(),
            world_orientation: UnitQuaternion::identity(),
            collision_rules: CollisionRules::default(),
            pairs: Vec::new(),
        }
    }

    /// The shape of this collidable.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    /// Back-reference to the owning body's arena slot, if inserted.
    #[must_use]
    pub fn owner(&self) -> Option<BodyHandle> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<BodyHandle>) {
        self.owner = owner;
    }

    /// Publish a new world transform for collision detection.
    pub fn update_world_transform(
        &mut self,
        position: Point3<f64>,
        orientation: UnitQuaternion<f64>,
    ) {
        self.world_position = position;
        self.world_orientation = orientation;
    }

    /// World position last published by the position updater.
    #[must_use]
    pub fn world_position(&self) -> Point3<f64> {
        self.world_position
    }

    /// World orientation last published by the position updater.
    #[must_use]
    pub fn world_orientation(&self) -> UnitQuaternion<f64> {
        self.world_orientation
    }

    /// The pairs the narrow phase has produced for this collidable.
    #[must_use]
    pub fn pairs(&self) -> &[ContactPair] {
        &self.pairs
    }

    /// Mutable access to the pair list for TOI updates.
    pub fn pairs_mut(&mut self) -> &mut [ContactPair] {
        &mut self.pairs
    }

    /// Append a pair produced by the narrow phase.
    pub fn add_pair(&mut self, pair: ContactPair) {
        self.pairs.push(pair);
    }

    /// Drop all pairs, e.g. when the body leaves the space.
    pub fn clear_pairs(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn handle(i: u32) -> BodyHandle {
        BodyHandle::new(i, 0)
    }

    #[test]
    fn test_pair_rejects_detector_volume() {
        let err = ContactPair::between(PairEntry::DetectorVolume, PairEntry::Rigid(handle(1)));
        assert!(matches!(err, Err(DynamicsError::InvalidPairEntry { .. })));

        let err = ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::DetectorVolume);
        assert!(matches!(err, Err(DynamicsError::InvalidPairEntry { .. })));
    }

    #[test]
    fn test_pair_defaults() {
        let pair =
            ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::Rigid(handle(1))).unwrap();
        assert_eq!(pair.other(), handle(1));
        assert_eq!(pair.time_of_impact(), 1.0);
    }

    #[test]
    fn test_toi_head_on() {
        let mut pair =
            ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::Rigid(handle(1))).unwrap();

        // Unit spheres, 5m gap, closing at 10 m/s over a 1s step.
        let own = SweptBody {
            position: Point3::origin(),
            linear_velocity: Vector3::new(10.0, 0.0, 0.0),
            radius: 1.0,
        };
        let other = SweptBody {
            position: Point3::new(7.0, 0.0, 0.0),
            linear_velocity: Vector3::zeros(),
            radius: 1.0,
        };
        pair.update_time_of_impact(&own, &other, 1.0);
        assert_relative_eq!(pair.time_of_impact(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_toi_receding() {
        let mut pair =
            ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::Rigid(handle(1))).unwrap();
        let own = SweptBody {
            position: Point3::origin(),
            linear_velocity: Vector3::new(-10.0, 0.0, 0.0),
            radius: 1.0,
        };
        let other = SweptBody {
            position: Point3::new(7.0, 0.0, 0.0),
            linear_velocity: Vector3::zeros(),
            radius: 1.0,
        };
        pair.update_time_of_impact(&own, &other, 1.0);
        assert_eq!(pair.time_of_impact(), 1.0);
    }

    #[test]
    fn test_toi_already_overlapping() {
        let mut pair =
            ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::Rigid(handle(1))).unwrap();
        let own = SweptBody {
            position: Point3::origin(),
            linear_velocity: Vector3::zeros(),
            radius: 1.0,
        };
        let other = SweptBody {
            position: Point3::new(1.5, 0.0, 0.0),
            linear_velocity: Vector3::zeros(),
            radius: 1.0,
        };
        pair.update_time_of_impact(&own, &other, 1.0);
        assert_eq!(pair.time_of_impact(), 0.0);
    }

    #[test]
    fn test_material_refresh() {
        let mut pair =
            ContactPair::between(PairEntry::Rigid(handle(0)), PairEntry::Rigid(handle(1))).unwrap();
        pair.update_material_properties(&Material::new(0.9, 0.3));
        assert_eq!(pair.friction(), 0.9);
        assert_eq!(pair.restitution(), 0.3);
    }

    #[test]
    fn test_collidable_transform() {
        let mut collidable = Collidable::new(Shape::sphere(1.0));
        assert!(collidable.owner().is_none());

        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0);
        collidable.update_world_transform(Point3::new(1.0, 2.0, 3.0), q);
        assert_eq!(collidable.world_position(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(collidable.world_orientation(), q);
    }
}
