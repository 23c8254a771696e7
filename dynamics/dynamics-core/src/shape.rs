//! Collision shape families and their mass distribution.
//!
//! The core only needs two things from a shape: the volume distribution (the
//! inertia tensor of the shape per unit mass, in local coordinates) and a
//! conservative bounding radius for swept time-of-impact estimates. Contact
//! geometry lives in the narrow phase, outside this crate.

use nalgebra::{Matrix3, Vector3};

/// A convex collision shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Sphere with the given radius.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Box with half-extents along each local axis.
    Box {
        /// Half-extents of the box in each axis.
        half_extents: Vector3<f64>,
    },
    /// Capsule (cylinder with hemispherical caps) along the local Z axis.
    Capsule {
        /// Half-length of the cylindrical portion along the Z-axis.
        half_length: f64,
        /// Radius of the capsule.
        radius: f64,
    },
    /// Cylinder with flat caps along the local Z axis.
    Cylinder {
        /// Half-length of the cylinder along the Z-axis.
        half_length: f64,
        /// Radius of the cylinder.
        radius: f64,
    },
}

impl Shape {
    /// Create a sphere shape.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents.
    #[must_use]
    pub fn box_shape(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }

    /// Create a capsule shape.
    #[must_use]
    pub fn capsule(half_length: f64, radius: f64) -> Self {
        Self::Capsule {
            half_length,
            radius,
        }
    }

    /// Create a cylinder shape.
    #[must_use]
    pub fn cylinder(half_length: f64, radius: f64) -> Self {
        Self::Cylinder {
            half_length,
            radius,
        }
    }

    /// Inertia tensor of the shape per unit mass, in local coordinates.
    ///
    /// Scaling by `mass · inertia_tensor_scale` yields the body's local
    /// inertia tensor.
    #[must_use]
    pub fn volume_distribution(&self) -> Matrix3<f64> {
        match *self {
            Self::Sphere { radius } => {
                let i = 0.4 * radius * radius;
                Matrix3::from_diagonal(&Vector3::new(i, i, i))
            }
            Self::Box { half_extents } => {
                let x2 = 4.0 * half_extents.x * half_extents.x;
                let y2 = 4.0 * half_extents.y * half_extents.y;
                let z2 = 4.0 * half_extents.z * half_extents.z;
                Matrix3::from_diagonal(&Vector3::new(
                    (y2 + z2) / 12.0,
                    (x2 + z2) / 12.0,
                    (x2 + y2) / 12.0,
                ))
            }
            Self::Cylinder {
                half_length,
                radius,
            } => {
                let r2 = radius * radius;
                let h2 = 4.0 * half_length * half_length;
                let ixx = (3.0 * r2 + h2) / 12.0;
                Matrix3::from_diagonal(&Vector3::new(ixx, ixx, 0.5 * r2))
            }
            Self::Capsule {
                half_length,
                radius,
            } => {
                // Split unit mass between the cylinder and the two caps by
                // volume, then combine their moments about the capsule center.
                let h = 2.0 * half_length;
                let r2 = radius * radius;
                let cylinder_volume = std::f64::consts::PI * r2 * h;
                let caps_volume = 4.0 / 3.0 * std::f64::consts::PI * r2 * radius;
                let total = cylinder_volume + caps_volume;
                let mc = cylinder_volume / total;
                let ms = caps_volume / total;

                let ixx = mc * (h * h / 12.0 + r2 / 4.0)
                    + ms * (0.4 * r2 + 0.5 * h * h + 0.375 * h * radius);
                let izz = mc * 0.5 * r2 + ms * 0.4 * r2;
                Matrix3::from_diagonal(&Vector3::new(ixx, ixx, izz))
            }
        }
    }

    /// Radius of the smallest origin-centered sphere containing the shape.
    #[must_use]
    pub fn maximum_radius(&self) -> f64 {
        match *self {
            Self::Sphere { radius } => radius,
            Self::Box { half_extents } => half_extents.norm(),
            Self::Capsule {
                half_length,
                radius,
            } => half_length + radius,
            Self::Cylinder {
                half_length,
                radius,
            } => (half_length * half_length + radius * radius).sqrt(),
        }
    }
}

/// Surface material of a collidable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Restitution (bounciness) in `[0, 1]`.
    pub restitution: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

impl Material {
    /// Create a material from friction and restitution.
    #[must_use]
    pub const fn new(friction: f64, restitution: f64) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}
