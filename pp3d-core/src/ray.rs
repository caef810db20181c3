/// Finite picking rays
use nalgebra::{Point3, Unit, Vector3};

use crate::math::EPSILON;

/// Pick length used when a ray is built from a screen position
pub const DEFAULT_PICK_LENGTH: f64 = 100_000.0;

/// `origin + direction * s` for `s` in `[0, max_length]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Point3<f64>,
    direction: Unit<Vector3<f64>>,
    max_length: f64,
}

impl Ray {
    /// `None` when the direction has no length or `max_length` is not positive and finite.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>, max_length: f64) -> Option<Self> {
        if !max_length.is_finite() || max_length <= 0.0 {
            return None;
        }
        let direction = Unit::try_new(direction, EPSILON)?;
        Some(Self {
            origin,
            direction,
            max_length,
        })
    }

    /// Ray covering exactly the segment from `start` to `end`
    pub fn from_points(start: Point3<f64>, end: Point3<f64>) -> Option<Self> {
        let d = end - start;
        Self::new(start, d, d.norm())
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn direction(&self) -> Unit<Vector3<f64>> {
        self.direction
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    pub fn end(&self) -> Point3<f64> {
        self.origin + self.direction.into_inner() * self.max_length
    }

    /// Point at the fraction `t` of the full length
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction.into_inner() * (t * self.max_length)
    }

    /// Closest distance between `point` and any point of the ray
    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        crate::math::distance_to_segment(point, &self.origin, &self.end())
    }
}
