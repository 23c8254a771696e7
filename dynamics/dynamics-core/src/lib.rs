//! Rigid body dynamics core.
//!
//! This crate provides the per-entity motion model and the tick phases that
//! advance it. It builds on [`dynamics_types`] for the data structures.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Integrator                            │
//! │  gravity → stabilization → damping → world tensor refresh   │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │  (external constraint solver runs here,
//!                           │   using the impulse fast paths)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PositionUpdater                         │
//! │  pre-update → time-of-impact sweep → continuous update      │
//! │  finalized bodies emit PositionUpdated                      │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BodySet                              │
//! │  generational arena of RigidBody: pose, velocity, inertia   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Tick ordering
//!
//! The owning space runs the phases in a fixed order each tick, with a
//! barrier between phases:
//!
//! 1. [`Integrator::update`]
//! 2. constraint solving (external; uses
//!    [`RigidBody::apply_linear_impulse`] / [`RigidBody::apply_angular_impulse`]
//!    under the per-body lock)
//! 3. [`PositionUpdater::pre_update`]
//! 4. [`PositionUpdater::update_times_of_impact`]
//! 5. [`PositionUpdater::continuous_update`]
//! 6. [`PositionUpdater::finish_tick`] and [`DeactivationManager::update`]
//!
//! Within each phase, every body is mutated by exactly one worker; pair TOI
//! slots are the only per-pair mutation and each pair writes its own slot.
//!
//! # Quick Start
//!
//! ```
//! use dynamics_core::{BodySet, Integrator, PositionUpdater, RigidBody, Shape};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = BodySet::new();
//! let mut ball = RigidBody::dynamic(Shape::sphere(0.5), 1.0).unwrap();
//! ball.set_position(Point3::new(0.0, 10.0, 0.0));
//! ball.set_linear_damping(0.0);
//! let ball = bodies.insert(ball);
//!
//! let mut integrator = Integrator::new(Vector3::new(0.0, -9.81, 0.0));
//! let mut updater = PositionUpdater::default();
//!
//! let dt = 1.0 / 240.0;
//! for _ in 0..240 {
//!     integrator.update(&mut bodies, dt);
//!     updater.pre_update(&mut bodies, dt);
//!     updater.update_times_of_impact(&mut bodies, dt);
//!     updater.continuous_update(&mut bodies, dt);
//!     updater.finish_tick();
//! }
//!
//! // After a second of free fall the ball has dropped roughly 4.9 m.
//! let y = bodies.get(ball).unwrap().position().y;
//! assert!(y < 5.2 && y > 5.0);
//! ```

#![doc(html_root_url = "https://docs.rs/dynamics-core/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::module_name_repetitions,    // RigidBody in rigid_body.rs is the clearest name
    clippy::missing_errors_doc,         // Error docs added where non-obvious
)]

pub mod activation;
pub mod body_set;
pub mod collidable;
pub mod events;
pub mod integrator;
pub mod joint_basis;
pub mod position_updater;
pub mod rigid_body;
pub mod shape;
pub mod sync;

pub use activation::{ActivationHandle, DeactivationManager};
pub use body_set::BodySet;
pub use collidable::{Collidable, ContactPair, PairEntry, SweptBody};
pub use events::{PositionUpdatedEvents, SubscriptionId};
pub use integrator::Integrator;
pub use joint_basis::{JointBasis2, JointBasis3};
pub use position_updater::PositionUpdater;
pub use rigid_body::RigidBody;
pub use shape::{Material, Shape};
pub use sync::{SpinLock, SpinLockGuard};

// The types crate is the public vocabulary of this one.
pub use dynamics_types::{
    AngularRepresentation, BodyHandle, BodyId, CcdFilter, CollisionGroup, CollisionRules,
    DeactivationSettings, DynamicsError, MotionSettings, MotionState, PositionUpdateMode, Result,
};
