/// 4x4 homogeneous transform builders for object and camera poses
use nalgebra::{Matrix4, Point3, Unit, Vector3};

use crate::math::EPSILON;

/// Transform builder for world-space transformations. Angles are in degrees.
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation(offset: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_translation(offset)
    }

    /// Create a uniform scale matrix
    pub fn uniform_scale(factor: f64) -> Matrix4<f64> {
        Matrix4::new_scaling(factor)
    }

    /// Create a non-uniform scale matrix
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Matrix4<f64> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Rotation around the world Y axis (right-hand rule)
    pub fn rotation_y(degrees: f64) -> Matrix4<f64> {
        Matrix4::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
    }

    /// Rotation around an arbitrary axis; identity if the axis is degenerate
    pub fn rotation_about_axis(axis: &Vector3<f64>, degrees: f64) -> Matrix4<f64> {
        match Unit::try_new(*axis, EPSILON) {
            Some(axis) => Matrix4::from_axis_angle(&axis, degrees.to_radians()),
            None => Matrix4::identity(),
        }
    }

    /// Applies `transform` about `pivot` instead of the origin: `T(pivot) * M * T(-pivot)`
    pub fn about_pivot(pivot: &Point3<f64>, transform: &Matrix4<f64>) -> Matrix4<f64> {
        Self::translation(&pivot.coords) * transform * Self::translation(&-pivot.coords)
    }

    /// Model matrix placing a unit-sized model at `location`, scaled by `size`
    pub fn model(location: &Point3<f64>, size: f64) -> Matrix4<f64> {
        Self::translation(&location.coords) * Self::uniform_scale(size)
    }

    /// Translation component of an affine matrix
    pub fn translation_of(matrix: &Matrix4<f64>) -> Point3<f64> {
        Point3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
    }
}
