//! Specialized numerics for rigid body dynamics.
//!
//! Pure math routines with no engine state dependencies: inertia tensor
//! transformation, the tolerant tensor inverse used for axis-locked bodies,
//! exponential-map orientation stepping, and the validation helpers that back
//! the debug-time finiteness checks.

use nalgebra::{Matrix2, Matrix3, UnitQuaternion, Vector3};

/// Tolerance for orthogonality tests on joint basis axes.
pub const BIG_EPSILON: f64 = 1e-5;

/// Relative determinant floor below which a 3×3 inversion is treated as singular.
const SINGULARITY_EPSILON: f64 = 1e-12;

/// Compute the similarity transform `R · M · Rᵀ`.
///
/// This is how a body-local inertia tensor is expressed in world space given
/// the body's orientation matrix `R`.
#[must_use]
pub fn similarity_transform(r: &Matrix3<f64>, m: &Matrix3<f64>) -> Matrix3<f64> {
    r * m * r.transpose()
}

/// Invert a (possibly singular) inertia tensor.
///
/// For a well-conditioned tensor this is the standard matrix inverse. For a
/// tensor with collapsed axes (a body locked on one or more rotation axes),
/// the collapsed rows and columns of the result are zero and the surviving
/// block is inverted on its own. The result is always finite for finite input.
///
/// # Example
///
/// ```
/// use dynamics_types::math::adaptive_inverse;
/// use nalgebra::{Matrix3, Vector3};
///
/// // A tensor locked on the Y axis
/// let locked = Matrix3::from_diagonal(&Vector3::new(2.0, 0.0, 4.0));
/// let inv = adaptive_inverse(&locked);
///
/// assert_eq!(inv[(0, 0)], 0.5);
/// assert_eq!(inv[(1, 1)], 0.0);
/// assert_eq!(inv[(2, 2)], 0.25);
/// ```
#[must_use]
pub fn adaptive_inverse(m: &Matrix3<f64>) -> Matrix3<f64> {
    let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Matrix3::zeros();
    }

    // Well-conditioned path: plain inversion.
    let det_floor = scale * scale * scale * SINGULARITY_EPSILON;
    if m.determinant().abs() > det_floor {
        if let Some(inv) = m.try_inverse() {
            if inv.iter().all(|v| v.is_finite()) {
                return inv;
            }
        }
    }

    // Degenerate path: identify the surviving axes by diagonal magnitude,
    // invert that block, and leave the collapsed rows/columns zero.
    let live: Vec<usize> = (0..3)
        .filter(|&i| m[(i, i)].abs() > scale * BIG_EPSILON)
        .collect();

    let mut out = Matrix3::zeros();
    match live.as_slice() {
        [] => {}
        [i] => out[(*i, *i)] = 1.0 / m[(*i, *i)],
        [a, b] => {
            let sub = Matrix2::new(m[(*a, *a)], m[(*a, *b)], m[(*b, *a)], m[(*b, *b)]);
            if let Some(inv) = sub.try_inverse() {
                out[(*a, *a)] = inv[(0, 0)];
                out[(*a, *b)] = inv[(0, 1)];
                out[(*b, *a)] = inv[(1, 0)];
                out[(*b, *b)] = inv[(1, 1)];
            } else {
                out[(*a, *a)] = 1.0 / m[(*a, *a)];
                out[(*b, *b)] = 1.0 / m[(*b, *b)];
            }
        }
        _ => {
            // All three diagonals survive but the full inverse failed
            // (strong off-diagonal coupling). Fall back to the diagonal.
            for i in 0..3 {
                out[(i, i)] = 1.0 / m[(i, i)];
            }
        }
    }
    out
}

/// Advance an orientation by a world-frame angular velocity over `dt`.
///
/// Uses the exponential map: `q(t+dt) = exp(ω·dt) ⊗ q(t)`. Exact for constant
/// angular velocity and unit-norm by construction, so no renormalization drift
/// accumulates across steps.
#[must_use]
pub fn integrate_orientation(
    orientation: &UnitQuaternion<f64>,
    omega: &Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let angle = omega.norm() * dt;
    if angle < 1e-10 {
        return *orientation;
    }
    // World-frame angular velocity pre-multiplies.
    UnitQuaternion::from_scaled_axis(omega * dt) * orientation
}

/// Largest pairwise |cos| among the given axes.
///
/// Zero for a perfectly orthogonal set; compare against [`BIG_EPSILON`].
/// Degenerate (near zero-length) axes report 1.0 so they are rejected by the
/// same comparison.
#[must_use]
pub fn orthogonality_defect(axes: &[Vector3<f64>]) -> f64 {
    let mut worst = 0.0_f64;
    for (i, a) in axes.iter().enumerate() {
        let na = a.norm();
        if na < BIG_EPSILON {
            return 1.0;
        }
        for b in &axes[i + 1..] {
            let nb = b.norm();
            if nb < BIG_EPSILON {
                return 1.0;
            }
            worst = worst.max(a.dot(b).abs() / (na * nb));
        }
    }
    worst
}

/// Debug-time finiteness check for a vector.
///
/// Triggers an assertion in debug builds when any component is NaN or ±∞.
/// In release builds the value passes through unchanged and the caller is
/// responsible.
#[inline]
pub fn validate_vector3(v: &Vector3<f64>, context: &str) {
    debug_assert!(
        v.iter().all(|c| c.is_finite()),
        "non-finite component in {context}: {v:?}"
    );
    let _ = (v, context);
}

/// Debug-time finiteness check for a quaternion.
#[inline]
pub fn validate_quaternion(q: &UnitQuaternion<f64>, context: &str) {
    debug_assert!(
        q.coords.iter().all(|c| c.is_finite()),
        "non-finite component in {context}: {q:?}"
    );
    let _ = (q, context);
}
