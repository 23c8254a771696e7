//! Orthonormal reference frames for constraints.
//!
//! A joint basis carries a set of orthonormal axes in the local space of its
//! owning connection, plus the world rotation matrix of that connection.
//! Constraints project forces onto the world-space axes, which are recomputed
//! whenever the rotation matrix is assigned.

use nalgebra::{Matrix3, Vector3};

use dynamics_types::{math, DynamicsError, Result};

/// Validate and normalize a set of axes. Pairwise |dot| must stay below the
/// orthogonality tolerance; degenerate axes are rejected by the same check.
fn orthonormalize<const N: usize>(axes: [Vector3<f64>; N]) -> Result<[Vector3<f64>; N]> {
    let defect = math::orthogonality_defect(&axes);
    if defect > math::BIG_EPSILON {
        return Err(DynamicsError::NonOrthogonalBasis { max_dot: defect });
    }
    Ok(axes.map(|axis| axis.normalize()))
}

/// Three-axis orthonormal frame attached to a constraint connection.
///
/// Defaults to primary = +Z, x = +X, y = +Y with an identity rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct JointBasis3 {
    local_primary: Vector3<f64>,
    local_x: Vector3<f64>,
    local_y: Vector3<f64>,
    rotation: Matrix3<f64>,
    world_primary: Vector3<f64>,
    world_x: Vector3<f64>,
    world_y: Vector3<f64>,
}

impl Default for JointBasis3 {
    fn default() -> Self {
        Self::new()
    }
}

impl JointBasis3 {
    /// Create the default basis.
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_primary: Vector3::z(),
            local_x: Vector3::x(),
            local_y: Vector3::y(),
            rotation: Matrix3::identity(),
            world_primary: Vector3::z(),
            world_x: Vector3::x(),
            world_y: Vector3::y(),
        }
    }

    /// Assign the local axes.
    ///
    /// Fails with [`DynamicsError::NonOrthogonalBasis`] when the axes are not
    /// mutually perpendicular; the basis is left unchanged. Axes are
    /// normalized on the way in.
    pub fn set_local_axes(
        &mut self,
        primary: Vector3<f64>,
        x: Vector3<f64>,
        y: Vector3<f64>,
    ) -> Result<()> {
        let [primary, x, y] = orthonormalize([primary, x, y])?;
        self.local_primary = primary;
        self.local_x = x;
        self.local_y = y;
        self.recompute_world_axes();
        Ok(())
    }

    /// Assign the axes in world space; they are projected into local space
    /// through the transpose of the current rotation matrix.
    pub fn set_world_axes(
        &mut self,
        primary: Vector3<f64>,
        x: Vector3<f64>,
        y: Vector3<f64>,
    ) -> Result<()> {
        let [primary, x, y] = orthonormalize([primary, x, y])?;
        let into_local = self.rotation.transpose();
        self.local_primary = into_local * primary;
        self.local_x = into_local * x;
        self.local_y = into_local * y;
        self.world_primary = primary;
        self.world_x = x;
        self.world_y = y;
        Ok(())
    }

    /// Assign the world rotation matrix of the owning connection; the world
    /// axes follow.
    pub fn set_rotation_matrix(&mut self, rotation: Matrix3<f64>) {
        self.rotation = rotation;
        self.recompute_world_axes();
    }

    /// The world rotation matrix of the owning connection.
    #[must_use]
    pub fn rotation_matrix(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Primary axis in local space.
    #[must_use]
    pub fn local_primary_axis(&self) -> Vector3<f64> {
        self.local_primary
    }

    /// X axis in local space.
    #[must_use]
    pub fn local_x_axis(&self) -> Vector3<f64> {
        self.local_x
    }

    /// Y axis in local space.
    #[must_use]
    pub fn local_y_axis(&self) -> Vector3<f64> {
        self.local_y
    }

    /// Primary axis in world space.
    #[must_use]
    pub fn primary_axis(&self) -> Vector3<f64> {
        self.world_primary
    }

    /// X axis in world space.
    #[must_use]
    pub fn x_axis(&self) -> Vector3<f64> {
        self.world_x
    }

    /// Y axis in world space.
    #[must_use]
    pub fn y_axis(&self) -> Vector3<f64> {
        self.world_y
    }

    fn recompute_world_axes(&mut self) {
        self.world_primary = self.rotation * self.local_primary;
        self.world_x = self.rotation * self.local_x;
        self.world_y = self.rotation * self.local_y;
    }
}

/// Two-axis orthonormal frame for constraints that only need a primary axis
/// and one perpendicular measurement direction.
#[derive(Debug, Clone, PartialEq)]
pub struct JointBasis2 {
    local_primary: Vector3<f64>,
    local_x: Vector3<f64>,
    rotation: Matrix3<f64>,
    world_primary: Vector3<f64>,
    world_x: Vector3<f64>,
}

impl Default for JointBasis2 {
    fn default() -> Self {
        Self::new()
    }
}

impl JointBasis2 {
    /// Create the default basis: primary = +Z, x = +X, identity rotation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_primary: Vector3::z(),
            local_x: Vector3::x(),
            rotation: Matrix3::identity(),
            world_primary: Vector3::z(),
            world_x: Vector3::x(),
        }
    }

    /// Assign the local axes; see [`JointBasis3::set_local_axes`].
    pub fn set_local_axes(&mut self, primary: Vector3<f64>, x: Vector3<f64>) -> Result<()> {
        let [primary, x] = orthonormalize([primary, x])?;
        self.local_primary = primary;
        self.local_x = x;
        self.recompute_world_axes();
        Ok(())
    }

    /// Assign the axes in world space; see [`JointBasis3::set_world_axes`].
    pub fn set_world_axes(&mut self, primary: Vector3<f64>, x: Vector3<f64>) -> Result<()> {
        let [primary, x] = orthonormalize([primary, x])?;
        let into_local = self.rotation.transpose();
        self.local_primary = into_local * primary;
        self.local_x = into_local * x;
        self.world_primary = primary;
        self.world_x = x;
        Ok(())
    }

    /// Assign the world rotation matrix; the world axes follow.
    pub fn set_rotation_matrix(&mut self, rotation: Matrix3<f64>) {
        self.rotation = rotation;
        self.recompute_world_axes();
    }

    /// The world rotation matrix of the owning connection.
    #[must_use]
    pub fn rotation_matrix(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Primary axis in local space.
    #[must_use]
    pub fn local_primary_axis(&self) -> Vector3<f64> {
        self.local_primary
    }

    /// X axis in local space.
    #[must_use]
    pub fn local_x_axis(&self) -> Vector3<f64> {
        self.local_x
    }

    /// Primary axis in world space.
    #[must_use]
    pub fn primary_axis(&self) -> Vector3<f64> {
        self.world_primary
    }

    /// X axis in world space.
    #[must_use]
    pub fn x_axis(&self) -> Vector3<f64> {
        self.world_x
    }

    fn recompute_world_axes(&mut self) {
        self.world_primary = self.rotation * self.local_primary;
        self.world_x = self.rotation * self.local_x;
    }
}
