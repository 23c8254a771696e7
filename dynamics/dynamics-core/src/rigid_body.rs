//! The rigid body entity.
//!
//! A body owns its pose, velocities, and inertia; everything else it touches
//! (activation record, collidable, material) is a collaborator. Bodies come
//! in two mass modes:
//!
//! - **Dynamic**: finite mass, responds to impulses and gravity. The local
//!   inertia tensor and its inverse are kept consistent with the mass, and
//!   the world-space tensors are similarity transforms through the current
//!   orientation matrix.
//! - **Kinematic**: zero mass and zero inverse inertia. The pose is driven
//!   externally; impulses are no-ops, but the body still transfers momentum
//!   to dynamic bodies through the solver.
//!
//! Every state mutation routes through a setter that validates finiteness,
//! keeps the derived quantities in sync, and activates the body. The solver
//! fast paths ([`apply_linear_impulse`](RigidBody::apply_linear_impulse),
//! [`apply_angular_impulse`](RigidBody::apply_angular_impulse)) skip
//! activation and notifications so they are safe inside the solver's inner
//! loop under the body's exclusive lock.

use std::sync::Arc;

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use tracing::debug;

use dynamics_types::{
    math, AngularRepresentation, BodyHandle, BodyId, CollisionGroup, DeactivationSettings,
    DynamicsError, MotionSettings, MotionState, PositionUpdateMode, Result,
};

use crate::activation::ActivationHandle;
use crate::collidable::Collidable;
use crate::shape::{Material, Shape};
use crate::sync::{SpinLock, SpinLockGuard};

/// A rigid body: pose, velocities, inertia, and identity.
#[derive(Debug)]
pub struct RigidBody {
    id: BodyId,

    position: Point3<f64>,
    orientation: UnitQuaternion<f64>,
    orientation_matrix: Matrix3<f64>,

    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    /// Primary state only under `AngularRepresentation::Momentum`; kept in
    /// lockstep with the velocity there, unused otherwise.
    angular_momentum: Vector3<f64>,
    angular_representation: AngularRepresentation,

    local_inertia: Matrix3<f64>,
    local_inertia_inverse: Matrix3<f64>,
    world_inertia: Matrix3<f64>,
    world_inertia_inverse: Matrix3<f64>,
    mass: f64,
    inverse_mass: f64,
    dynamic: bool,

    gravity_affected: bool,
    linear_damping: f64,
    angular_damping: f64,
    linear_damping_boost: f64,
    angular_damping_boost: f64,

    position_update_mode: PositionUpdateMode,
    ignore_shape_changes: bool,
    inertia_tensor_scale: f64,
    tag: Option<u64>,

    activation: Arc<ActivationHandle>,
    collidable: Collidable,
    material: Option<Material>,
    lock: SpinLock,
}

impl RigidBody {
    /// Create a kinematic body with default settings.
    #[must_use]
    pub fn kinematic(shape: Shape) -> Self {
        Self::base(
            shape,
            &MotionSettings::default(),
            Arc::new(DeactivationSettings::default()),
        )
    }

    /// Create a dynamic body with default settings.
    ///
    /// Fails with [`DynamicsError::InvalidMass`] when `mass` is non-positive
    /// or non-finite.
    pub fn dynamic(shape: Shape, mass: f64) -> Result<Self> {
        let mut body = Self::kinematic(shape);
        body.become_dynamic(mass)?;
        Ok(body)
    }

    /// Create a body under explicit settings. `mass` of `None` yields a
    /// kinematic body.
    pub fn with_settings(
        shape: Shape,
        mass: Option<f64>,
        settings: &MotionSettings,
        deactivation: Arc<DeactivationSettings>,
    ) -> Result<Self> {
        let mut body = Self::base(shape, settings, deactivation);
        if let Some(mass) = mass {
            body.become_dynamic(mass)?;
        }
        Ok(body)
    }

    fn base(
        shape: Shape,
        settings: &MotionSettings,
        deactivation: Arc<DeactivationSettings>,
    ) -> Self {
        let mut collidable = Collidable::new(shape);
        collidable.collision_rules.group = CollisionGroup::DefaultKinematic;
        Self {
            id: BodyId::fresh(),
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            orientation_matrix: Matrix3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
            angular_representation: settings.angular_representation,
            local_inertia: Matrix3::zeros(),
            local_inertia_inverse: Matrix3::zeros(),
            world_inertia: Matrix3::zeros(),
            world_inertia_inverse: Matrix3::zeros(),
            mass: 0.0,
            inverse_mass: 0.0,
            dynamic: false,
            gravity_affected: true,
            linear_damping: 0.03,
            angular_damping: 0.15,
            linear_damping_boost: 0.0,
            angular_damping_boost: 0.0,
            position_update_mode: settings.default_position_update_mode,
            ignore_shape_changes: false,
            inertia_tensor_scale: settings.inertia_tensor_scale,
            tag: None,
            activation: Arc::new(ActivationHandle::new(deactivation)),
            collidable,
            material: None,
            lock: SpinLock::new(),
        }
    }

    // -----------------------------------------------------------------
    // Identity and collaborators
    // -----------------------------------------------------------------

    /// Unique id assigned at construction.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// The arena slot this body occupies, if inserted into a body set.
    #[must_use]
    pub fn handle(&self) -> Option<BodyHandle> {
        self.collidable.owner()
    }

    /// The shared activation record.
    #[must_use]
    pub fn activation_handle(&self) -> &Arc<ActivationHandle> {
        &self.activation
    }

    /// The body's collidable.
    #[must_use]
    pub fn collidable(&self) -> &Collidable {
        &self.collidable
    }

    /// Mutable access to the body's collidable.
    pub fn collidable_mut(&mut self) -> &mut Collidable {
        &mut self.collidable
    }

    /// The body's surface material, if any.
    #[must_use]
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Assign or clear the surface material.
    ///
    /// Assigning a material refreshes the material response of the body's
    /// existing pairs from the new material; clearing refreshes nothing (the
    /// narrow phase rebuilds stale pairs on its next pass).
    pub fn set_material(&mut self, material: Option<Material>) {
        self.material = material;
        if let Some(material) = self.material {
            for pair in self.collidable.pairs_mut() {
                pair.update_material_properties(&material);
            }
        }
        self.activation.activate();
    }

    /// Acquire the body's exclusive lock.
    ///
    /// Held by workers that may race on the same body, e.g. solver impulse
    /// application across constraints sharing the body.
    pub fn lock(&self) -> SpinLockGuard<'_> {
        self.lock.lock()
    }

    /// Opaque user tag.
    #[must_use]
    pub fn tag(&self) -> Option<u64> {
        self.tag
    }

    /// Set the opaque user tag.
    pub fn set_tag(&mut self, tag: Option<u64>) {
        self.tag = tag;
    }

    // -----------------------------------------------------------------
    // Pose and velocity
    // -----------------------------------------------------------------

    /// World position.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    /// Assign the world position.
    pub fn set_position(&mut self, position: Point3<f64>) {
        math::validate_vector3(&position.coords, "position");
        self.position = position;
        self.collidable
            .update_world_transform(self.position, self.orientation);
        self.activation.activate();
    }

    /// World orientation.
    #[must_use]
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    /// The orientation's rotation matrix, kept in sync with the quaternion.
    #[must_use]
    pub fn orientation_matrix(&self) -> &Matrix3<f64> {
        &self.orientation_matrix
    }

    /// Assign the world orientation.
    ///
    /// The quaternion is re-normalized to scrub accumulated drift, the
    /// orientation matrix and world inertia tensors are refreshed, and the
    /// collidable transform is republished.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        math::validate_quaternion(&orientation, "orientation");
        self.orientation = UnitQuaternion::new_normalize(orientation.into_inner());
        self.orientation_matrix = self.orientation.to_rotation_matrix().into_inner();
        self.refresh_world_inertia();
        self.collidable
            .update_world_transform(self.position, self.orientation);
        self.activation.activate();
    }

    /// Linear velocity.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    /// Assign the linear velocity.
    pub fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        math::validate_vector3(&velocity, "linear velocity");
        self.linear_velocity = velocity;
        self.activation.activate();
    }

    /// Angular velocity.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    /// Assign the angular velocity.
    pub fn set_angular_velocity(&mut self, velocity: Vector3<f64>) {
        math::validate_vector3(&velocity, "angular velocity");
        self.angular_velocity = velocity;
        if self.angular_representation == AngularRepresentation::Momentum {
            self.angular_momentum = self.world_inertia * velocity;
        }
        self.activation.activate();
    }

    /// Angular momentum, derived through the world inertia tensor.
    #[must_use]
    pub fn angular_momentum(&self) -> Vector3<f64> {
        match self.angular_representation {
            AngularRepresentation::Momentum if self.dynamic => self.angular_momentum,
            _ => self.world_inertia * self.angular_velocity,
        }
    }

    /// Assign the angular momentum; the velocity follows through the inverse
    /// world tensor.
    pub fn set_angular_momentum(&mut self, momentum: Vector3<f64>) {
        math::validate_vector3(&momentum, "angular momentum");
        self.angular_velocity = self.world_inertia_inverse * momentum;
        if self.angular_representation == AngularRepresentation::Momentum {
            self.angular_momentum = momentum;
        }
        self.activation.activate();
    }

    /// Snapshot the pose and velocities.
    #[must_use]
    pub fn motion_state(&self) -> MotionState {
        MotionState::new(
            self.position,
            self.orientation,
            self.linear_velocity,
            self.angular_velocity,
        )
    }

    /// Restore a pose/velocity snapshot through the individual setters.
    pub fn set_motion_state(&mut self, state: &MotionState) {
        self.set_position(state.position);
        self.set_orientation(state.orientation);
        self.set_linear_velocity(state.linear_velocity);
        self.set_angular_velocity(state.angular_velocity);
    }

    // -----------------------------------------------------------------
    // Mass mode
    // -----------------------------------------------------------------

    /// Mass in kg; zero for kinematic bodies.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass; zero for kinematic bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    /// Whether the body responds to forces and impulses.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Whether the body's pose is driven externally.
    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        !self.dynamic
    }

    /// Local-space inertia tensor.
    #[must_use]
    pub fn local_inertia(&self) -> &Matrix3<f64> {
        &self.local_inertia
    }

    /// Inverse of the local inertia tensor (tolerant of collapsed axes).
    #[must_use]
    pub fn local_inertia_inverse(&self) -> &Matrix3<f64> {
        &self.local_inertia_inverse
    }

    /// World-space inertia tensor.
    #[must_use]
    pub fn world_inertia(&self) -> &Matrix3<f64> {
        &self.world_inertia
    }

    /// Inverse of the world-space inertia tensor.
    #[must_use]
    pub fn world_inertia_inverse(&self) -> &Matrix3<f64> {
        &self.world_inertia_inverse
    }

    /// Change the body's mass.
    ///
    /// Non-positive or non-finite mass makes the body kinematic, preserving
    /// its velocities. A mass change on an already dynamic body scales the
    /// existing local inertia tensor; a kinematic body becomes dynamic with a
    /// tensor derived from its shape.
    pub fn set_mass(&mut self, mass: f64) {
        if mass <= 0.0 || !mass.is_finite() {
            self.become_kinematic();
        } else if self.dynamic {
            let ratio = mass / self.mass;
            self.local_inertia *= ratio;
            self.local_inertia_inverse = math::adaptive_inverse(&self.local_inertia);
            self.mass = mass;
            self.inverse_mass = 1.0 / mass;
            self.refresh_world_inertia();
            self.activation.activate();
        } else {
            let tensor = self.shape_inertia(mass);
            self.promote(mass, tensor);
        }
    }

    /// Change the body's inverse mass. Positive values become `1/im` mass;
    /// anything else makes the body kinematic.
    pub fn set_inverse_mass(&mut self, inverse_mass: f64) {
        if inverse_mass > 0.0 {
            self.set_mass(1.0 / inverse_mass);
        } else {
            self.set_mass(0.0);
        }
    }

    /// Make the body kinematic: zero mass, zero inverse inertia. Velocities
    /// are preserved. Idempotent.
    pub fn become_kinematic(&mut self) {
        if self.dynamic {
            debug!(id = %self.id, "body becoming kinematic");
        }
        self.dynamic = false;
        self.mass = 0.0;
        self.inverse_mass = 0.0;
        self.local_inertia = Matrix3::zeros();
        self.local_inertia_inverse = Matrix3::zeros();
        self.world_inertia = Matrix3::zeros();
        self.world_inertia_inverse = Matrix3::zeros();
        self.angular_momentum = Vector3::zeros();
        if matches!(
            self.collidable.collision_rules.group,
            CollisionGroup::DefaultDynamic | CollisionGroup::Unspecified
        ) {
            self.collidable.collision_rules.group = CollisionGroup::DefaultKinematic;
        }
        self.activation.activate();
    }

    /// Make the body dynamic with an inertia tensor derived from its shape.
    ///
    /// Fails with [`DynamicsError::InvalidMass`] on non-positive or
    /// non-finite mass; the body is left unchanged. Idempotent for a body
    /// already dynamic at the same mass.
    pub fn become_dynamic(&mut self, mass: f64) -> Result<()> {
        if mass <= 0.0 || !mass.is_finite() {
            return Err(DynamicsError::invalid_mass(format!(
                "cannot become dynamic with mass {mass}"
            )));
        }
        let tensor = self.shape_inertia(mass);
        self.promote(mass, tensor);
        Ok(())
    }

    /// Make the body dynamic with an explicit local inertia tensor.
    pub fn become_dynamic_with_inertia(
        &mut self,
        mass: f64,
        local_inertia: Matrix3<f64>,
    ) -> Result<()> {
        if mass <= 0.0 || !mass.is_finite() {
            return Err(DynamicsError::invalid_mass(format!(
                "cannot become dynamic with mass {mass}"
            )));
        }
        self.promote(mass, local_inertia);
        Ok(())
    }

    fn shape_inertia(&self, mass: f64) -> Matrix3<f64> {
        self.collidable.shape().volume_distribution() * (mass * self.inertia_tensor_scale)
    }

    /// Mass validated by the caller.
    fn promote(&mut self, mass: f64, local_inertia: Matrix3<f64>) {
        if !self.dynamic {
            debug!(id = %self.id, mass, "body becoming dynamic");
        }
        self.dynamic = true;
        self.mass = mass;
        self.inverse_mass = 1.0 / mass;
        self.local_inertia = local_inertia;
        self.local_inertia_inverse = math::adaptive_inverse(&local_inertia);
        self.world_inertia =
            math::similarity_transform(&self.orientation_matrix, &self.local_inertia);
        self.world_inertia_inverse =
            math::similarity_transform(&self.orientation_matrix, &self.local_inertia_inverse);
        // Re-seed the conserved momentum from the current velocity; a no-op
        // when angular velocity is the primary state.
        if self.angular_representation == AngularRepresentation::Momentum {
            self.angular_momentum = self.world_inertia * self.angular_velocity;
        }
        if matches!(
            self.collidable.collision_rules.group,
            CollisionGroup::DefaultKinematic | CollisionGroup::Unspecified
        ) {
            self.collidable.collision_rules.group = CollisionGroup::DefaultDynamic;
        }
        self.activation.activate();
    }

    // -----------------------------------------------------------------
    // Impulses
    // -----------------------------------------------------------------

    /// Apply an impulse at a world-space location.
    ///
    /// No-op on kinematic bodies. Activates the body.
    pub fn apply_impulse(&mut self, location: Point3<f64>, impulse: Vector3<f64>) {
        if !self.dynamic {
            return;
        }
        math::validate_vector3(&impulse, "impulse");
        self.apply_linear_impulse(impulse);
        let moment = (location - self.position).cross(&impulse);
        self.apply_angular_impulse(moment);
        self.activation.activate();
    }

    /// Apply a linear impulse through the center of mass.
    ///
    /// Solver fast path: no activation, no shape or material notifications.
    /// Safe to call under the body's exclusive lock.
    pub fn apply_linear_impulse(&mut self, impulse: Vector3<f64>) {
        math::validate_vector3(&impulse, "linear impulse");
        self.linear_velocity += impulse * self.inverse_mass;
    }

    /// Apply an angular impulse.
    ///
    /// Solver fast path: no activation, no shape or material notifications.
    /// Safe to call under the body's exclusive lock.
    pub fn apply_angular_impulse(&mut self, impulse: Vector3<f64>) {
        math::validate_vector3(&impulse, "angular impulse");
        match self.angular_representation {
            AngularRepresentation::Velocity => {
                self.angular_velocity += self.world_inertia_inverse * impulse;
            }
            AngularRepresentation::Momentum => {
                self.angular_momentum += impulse;
                self.angular_velocity = self.world_inertia_inverse * self.angular_momentum;
            }
        }
    }

    // -----------------------------------------------------------------
    // Damping
    // -----------------------------------------------------------------

    /// Base linear damping in `[0, 1]`.
    #[must_use]
    pub fn linear_damping(&self) -> f64 {
        self.linear_damping
    }

    /// Set the base linear damping, clamped to `[0, 1]`.
    pub fn set_linear_damping(&mut self, damping: f64) {
        self.linear_damping = damping.clamp(0.0, 1.0);
        self.activation.activate();
    }

    /// Base angular damping in `[0, 1]`.
    #[must_use]
    pub fn angular_damping(&self) -> f64 {
        self.angular_damping
    }

    /// Set the base angular damping, clamped to `[0, 1]`.
    pub fn set_angular_damping(&mut self, damping: f64) {
        self.angular_damping = damping.clamp(0.0, 1.0);
        self.activation.activate();
    }

    /// Transient linear damping boost; resets after each force integration.
    #[must_use]
    pub fn linear_damping_boost(&self) -> f64 {
        self.linear_damping_boost
    }

    /// Transient angular damping boost; resets after each force integration.
    #[must_use]
    pub fn angular_damping_boost(&self) -> f64 {
        self.angular_damping_boost
    }

    /// Add a transient boost to the linear damping.
    ///
    /// The boost scales with the remaining headroom, and the combined
    /// `base + boost` stays in `[0, 1]`.
    pub fn modify_linear_damping(&mut self, amount: f64) {
        let total = self.linear_damping + self.linear_damping_boost;
        self.linear_damping_boost += amount * (1.0 - total);
        self.linear_damping_boost = self
            .linear_damping_boost
            .clamp(0.0, 1.0 - self.linear_damping);
    }

    /// Add a transient boost to the angular damping.
    pub fn modify_angular_damping(&mut self, amount: f64) {
        let total = self.angular_damping + self.angular_damping_boost;
        self.angular_damping_boost += amount * (1.0 - total);
        self.angular_damping_boost = self
            .angular_damping_boost
            .clamp(0.0, 1.0 - self.angular_damping);
    }

    // -----------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------

    /// Whether gravity accelerates this body.
    #[must_use]
    pub fn gravity_affected(&self) -> bool {
        self.gravity_affected
    }

    /// Enable or disable gravity for this body.
    pub fn set_gravity_affected(&mut self, affected: bool) {
        self.gravity_affected = affected;
        self.activation.activate();
    }

    /// How the position updater advances this body.
    #[must_use]
    pub fn position_update_mode(&self) -> PositionUpdateMode {
        self.position_update_mode
    }

    /// Change the position update mode. The updater rebuilds its buckets from
    /// this flag every tick, so the change takes effect on the next tick.
    pub fn set_position_update_mode(&mut self, mode: PositionUpdateMode) {
        if self.position_update_mode != mode {
            debug!(id = %self.id, ?mode, "position update mode changed");
        }
        self.position_update_mode = mode;
    }

    /// Whether shape changes leave the inertia tensor untouched.
    #[must_use]
    pub fn ignore_shape_changes(&self) -> bool {
        self.ignore_shape_changes
    }

    /// Control whether shape changes recompute the inertia tensor.
    pub fn set_ignore_shape_changes(&mut self, ignore: bool) {
        self.ignore_shape_changes = ignore;
    }

    /// Replace the collidable's shape.
    ///
    /// A dynamic body recomputes its local inertia tensor from the new
    /// shape's volume distribution unless shape changes are ignored.
    pub fn set_shape(&mut self, shape: Shape) {
        self.collidable.set_shape(shape);
        if self.dynamic && !self.ignore_shape_changes {
            self.local_inertia = self.shape_inertia(self.mass);
            self.local_inertia_inverse = math::adaptive_inverse(&self.local_inertia);
            self.refresh_world_inertia();
        }
        self.activation.activate();
    }

    /// The angular representation fixed at construction.
    #[must_use]
    pub fn angular_representation(&self) -> AngularRepresentation {
        self.angular_representation
    }

    // -----------------------------------------------------------------
    // Tick-phase internals
    // -----------------------------------------------------------------

    /// Recompute the world-space inertia tensors from the current orientation
    /// matrix. Under the momentum representation, the angular velocity is
    /// re-derived from the conserved momentum afterwards.
    pub(crate) fn refresh_world_inertia(&mut self) {
        self.world_inertia =
            math::similarity_transform(&self.orientation_matrix, &self.local_inertia);
        self.world_inertia_inverse =
            math::similarity_transform(&self.orientation_matrix, &self.local_inertia_inverse);
        if self.angular_representation == AngularRepresentation::Momentum && self.dynamic {
            self.angular_velocity = self.world_inertia_inverse * self.angular_momentum;
        }
    }

    /// Integration-phase gravity contribution. No activation.
    pub(crate) fn apply_gravity(&mut self, gravity_dt: &Vector3<f64>) {
        self.linear_velocity += *gravity_dt;
    }

    /// Integration-phase damping: attenuate velocities by
    /// `clamp(1 − (base + boost), 0, 1)^dt`, then reset the boosts.
    pub(crate) fn apply_damping(&mut self, dt: f64) {
        let linear_total = self.linear_damping + self.linear_damping_boost;
        if linear_total > 0.0 {
            self.linear_velocity *= (1.0 - linear_total).clamp(0.0, 1.0).powf(dt);
        }
        let angular_total = self.angular_damping + self.angular_damping_boost;
        if angular_total > 0.0 {
            self.angular_velocity *= (1.0 - angular_total).clamp(0.0, 1.0).powf(dt);
            if self.angular_representation == AngularRepresentation::Momentum && self.dynamic {
                self.angular_momentum = self.world_inertia * self.angular_velocity;
            }
        }
        self.linear_damping_boost = 0.0;
        self.angular_damping_boost = 0.0;
    }

    /// Position-phase orientation step: exponential-map advance, matrix
    /// refresh, world tensor refresh.
    pub(crate) fn step_orientation(&mut self, dt: f64) {
        self.orientation = math::integrate_orientation(&self.orientation, &self.angular_velocity, dt);
        self.orientation_matrix = self.orientation.to_rotation_matrix().into_inner();
        self.refresh_world_inertia();
    }

    /// Position-phase translation advance; republishes the collidable's world
    /// transform.
    pub(crate) fn advance_position(&mut self, delta: Vector3<f64>) {
        self.position += delta;
        math::validate_vector3(&self.position.coords, "position");
        self.collidable
            .update_world_transform(self.position, self.orientation);
    }
}
