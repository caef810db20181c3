/// Vector and homogeneous-coordinate helpers that nalgebra does not provide directly
use nalgebra::{Point3, Rotation3, Unit, Vector3, Vector4};

/// Tolerance used for "is this effectively zero" checks on lengths and `w`.
pub const EPSILON: f64 = 1e-9;

/// The fixed world-up axis used for Gram-Schmidt orthogonalization.
pub fn world_up() -> Vector3<f64> {
    Vector3::y()
}

/// Normalizes `v`, or returns it unchanged when its magnitude is (near) zero.
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(EPSILON).unwrap_or(*v)
}

/// Rotates `v` around `axis` by `degrees`, right-hand rule.
///
/// A zero-length axis leaves `v` untouched.
pub fn rotate_around_axis(v: &Vector3<f64>, axis: &Vector3<f64>, degrees: f64) -> Vector3<f64> {
    match Unit::try_new(*axis, EPSILON) {
        Some(axis) => Rotation3::from_axis_angle(&axis, degrees.to_radians()) * v,
        None => *v,
    }
}

/// Angle in degrees between two unit vectors.
pub fn angle_between_unit_vectors(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Homogeneous form of a point (`w = 1`).
pub fn to_homogeneous(p: &Point3<f64>) -> Vector4<f64> {
    Vector4::new(p.x, p.y, p.z, 1.0)
}

/// Homogeneous form of a direction (`w = 0`).
pub fn direction_to_homogeneous(v: &Vector3<f64>) -> Vector4<f64> {
    Vector4::new(v.x, v.y, v.z, 0.0)
}

/// Perspective divide. A `w` of (near) zero is left undivided.
pub fn from_homogeneous(h: &Vector4<f64>) -> Point3<f64> {
    if h.w.abs() < EPSILON {
        Point3::new(h.x, h.y, h.z)
    } else {
        Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
    }
}

/// Shortest distance from `point` to the segment `[a, b]`.
pub fn distance_to_segment(point: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPSILON {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Parameters `(s, t)` of the closest points `p1 + s*d1` and `p2 + t*d2` on two infinite lines.
///
/// Returns `None` when the lines are (nearly) parallel.
pub fn closest_points_between_lines(
    p1: &Point3<f64>,
    d1: &Vector3<f64>,
    p2: &Point3<f64>,
    d2: &Vector3<f64>,
) -> Option<(f64, f64)> {
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d2.dot(d2);
    let w = p1 - p2;
    let d = d1.dot(&w);
    let e = d2.dot(&w);

    let denom = a * c - b * b;
    // Relative test: denom is |d1|^2 |d2|^2 sin^2(angle).
    if denom <= 1e-12 * a * c || a < EPSILON || c < EPSILON {
        return None;
    }

    Some(((b * e - c * d) / denom, (a * e - b * d) / denom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_zero_is_noop() {
        let zero = Vector3::zeros();
        assert_eq!(normalize_or_zero(&zero), zero);

        let v = normalize_or_zero(&Vector3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_around_axis_right_hand_rule() {
        // X rotated +90 degrees around Z lands on Y.
        let v = rotate_around_axis(&Vector3::x(), &Vector3::z(), 90.0);
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);

        let same = rotate_around_axis(&Vector3::x(), &Vector3::zeros(), 45.0);
        assert_eq!(same, Vector3::x());
    }

    #[test]
    fn test_angle_between_tolerates_rounding() {
        let a = Vector3::new(1.0 + 1e-16, 0.0, 0.0);
        assert_relative_eq!(angle_between_unit_vectors(&a, &Vector3::x()), 0.0, epsilon = 1e-6);
        assert_relative_eq!(
            angle_between_unit_vectors(&Vector3::x(), &Vector3::y()),
            90.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_homogeneous_divide() {
        let p = from_homogeneous(&Vector4::new(2.0, 4.0, 6.0, 2.0));
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));

        let undivided = from_homogeneous(&Vector4::new(2.0, 4.0, 6.0, 0.0));
        assert_eq!(undivided, Point3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoints() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        assert_relative_eq!(distance_to_segment(&Point3::new(5.0, 3.0, 0.0), &a, &b), 3.0);
        assert_relative_eq!(distance_to_segment(&Point3::new(-4.0, 3.0, 0.0), &a, &b), 5.0);
        assert_relative_eq!(distance_to_segment(&Point3::new(0.0, 2.0, 0.0), &a, &a), 2.0);
    }

    #[test]
    fn test_closest_points_between_lines() {
        // X axis and a line parallel to Y through (3, 0, 5).
        let (s, t) = closest_points_between_lines(
            &Point3::origin(),
            &Vector3::x(),
            &Point3::new(3.0, 0.0, 5.0),
            &Vector3::y(),
        )
        .unwrap();
        assert_relative_eq!(s, 3.0, epsilon = 1e-12);
        assert_relative_eq!(t, 0.0, epsilon = 1e-12);

        let parallel = closest_points_between_lines(
            &Point3::origin(),
            &Vector3::x(),
            &Point3::new(0.0, 1.0, 0.0),
            &Vector3::new(2.0, 0.0, 0.0),
        );
        assert!(parallel.is_none());
    }
}
