/// Clip-space frustum planes and homogeneous line clipping.
///
/// Planes are extracted from the rows of the projection matrix (`row3 ± row_i` for the
/// sides, `row2` for near since depth runs 0..1, `row3 - row2` for far) and then carried
/// into clip space with the inverse-transpose of the projection. In clip space a point is
/// inside a plane when `normal · p >= 0`.
use nalgebra::{Matrix4, Vector4};
use tracing::trace;

use crate::error::ProjectionError;

/// Slack allowed on the line-plane parameter before it is clamped to `[0, 1]`.
const PARAMETER_TOLERANCE: f64 = 1e-9;

/// Denominators smaller than this mean the segment runs parallel to the plane.
const PARALLEL_TOLERANCE: f64 = 1e-12;

/// The six frustum planes, in clipping order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// A clip-space point lying on this plane
    pub fn point_on_plane(self) -> Vector4<f64> {
        match self {
            ClipPlane::Left => Vector4::new(-1.0, 0.0, 0.0, 1.0),
            ClipPlane::Right => Vector4::new(1.0, 0.0, 0.0, 1.0),
            ClipPlane::Bottom => Vector4::new(0.0, -1.0, 0.0, 1.0),
            ClipPlane::Top => Vector4::new(0.0, 1.0, 0.0, 1.0),
            ClipPlane::Near => Vector4::new(0.0, 0.0, 0.0, 1.0),
            ClipPlane::Far => Vector4::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    /// The view-space plane as a combination of projection rows
    fn from_rows(self, projection: &Matrix4<f64>) -> Vector4<f64> {
        let row = |i: usize| projection.row(i).transpose();
        match self {
            ClipPlane::Left => row(3) + row(0),
            ClipPlane::Right => row(3) - row(0),
            ClipPlane::Bottom => row(3) + row(1),
            ClipPlane::Top => row(3) - row(1),
            ClipPlane::Near => row(2),
            ClipPlane::Far => row(3) - row(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    normals: [Vector4<f64>; 6],
}

impl Frustum {
    pub fn from_projection(projection: &Matrix4<f64>) -> Result<Self, ProjectionError> {
        let inverse_transpose = projection
            .try_inverse()
            .ok_or(ProjectionError::NotInvertible)?
            .transpose();

        let normals = ClipPlane::ALL.map(|plane| inverse_transpose * plane.from_rows(projection));
        trace!(?normals, "derived frustum planes");

        Ok(Self { normals })
    }

    pub fn normal(&self, plane: ClipPlane) -> Vector4<f64> {
        self.normals[plane.index()]
    }

    pub fn is_outside(&self, plane: ClipPlane, point: &Vector4<f64>) -> bool {
        self.normal(plane).dot(point) < 0.0
    }

    /// `-w <= x <= w`, `-w <= y <= w` and `0 <= z <= w`
    pub fn contains(&self, point: &Vector4<f64>) -> bool {
        ClipPlane::ALL
            .iter()
            .all(|&plane| !self.is_outside(plane, point))
    }

    /// Culls a polygon when every vertex is outside the same plane.
    ///
    /// This keeps some polygons that are not actually visible; polygons are not clipped.
    pub fn culls_polygon(&self, points: &[Vector4<f64>]) -> bool {
        points.is_empty()
            || ClipPlane::ALL
                .iter()
                .any(|&plane| points.iter().all(|p| self.is_outside(plane, p)))
    }

    /// Clips a clip-space segment against every plane in turn.
    ///
    /// Returns `None` when the segment lies entirely outside the frustum.
    pub fn clip_segment(
        &self,
        start: Vector4<f64>,
        end: Vector4<f64>,
    ) -> Option<(Vector4<f64>, Vector4<f64>)> {
        if self.contains(&start) && self.contains(&end) {
            return Some((start, end));
        }

        let (mut a, mut b) = (start, end);
        for plane in ClipPlane::ALL {
            if self.is_outside(plane, &a) {
                a = self.intersect(plane, &a, &b)?;
            } else if self.is_outside(plane, &b) {
                b = self.intersect(plane, &a, &b)?;
            }
        }
        Some((a, b))
    }

    /// `t = (plane_point - a) · n / ((b - a) · n)`, accepted only inside `[0, 1]`.
    fn intersect(&self, plane: ClipPlane, a: &Vector4<f64>, b: &Vector4<f64>) -> Option<Vector4<f64>> {
        let normal = self.normal(plane);
        let dir = b - a;
        let denom = dir.dot(&normal);
        if denom.abs() < PARALLEL_TOLERANCE {
            return None;
        }

        let t = (plane.point_on_plane() - a).dot(&normal) / denom;
        if !(-PARAMETER_TOLERANCE..=1.0 + PARAMETER_TOLERANCE).contains(&t) {
            return None;
        }
        Some(a + dir * t.clamp(0.0, 1.0))
    }
}
