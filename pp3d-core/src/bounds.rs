/// Bounding volumes and their ray tests.
///
/// Intersections report `t` as a fraction of the ray's full length (0 at the
/// origin, 1 at `max_length`) together with the world-space distance, so hits
/// from different volume kinds can be ordered against each other.
use nalgebra::{Point3, Unit, Vector3};

use crate::geometry::LineSegment;
use crate::math::{distance_to_segment, EPSILON};
use crate::ray::Ray;

/// Direction components below this are treated as parallel to a box slab.
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// Length used for the unbounded ray tests
pub const INFINITE_LENGTH: f64 = 1e12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    AxisAlignedBox,
    Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    AxisAlignedBox { min: Point3<f64>, max: Point3<f64> },
    Sphere { center: Point3<f64>, diameter: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Entry parameter as a fraction of the tested length
    pub t: f64,
    /// Entry distance from the ray origin in world units
    pub distance: f64,
}

impl Intersection {
    fn at_distance(distance: f64, max_length: f64) -> Self {
        Self {
            t: distance / max_length,
            distance,
        }
    }
}

impl BoundingVolume {
    /// Box spanning two corners in any order
    pub fn aabb(a: Point3<f64>, b: Point3<f64>) -> Self {
        BoundingVolume::AxisAlignedBox {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    pub fn sphere(center: Point3<f64>, diameter: f64) -> Self {
        BoundingVolume::Sphere {
            center,
            diameter: diameter.abs(),
        }
    }

    /// Tight volume around a point cloud; `None` for no points.
    ///
    /// The sphere is centered on the box middle and reaches the farthest point.
    pub fn from_points<'a, I>(points: I, kind: VolumeKind) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let points: Vec<&Point3<f64>> = points.into_iter().collect();
        let first = **points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.inf(p), max.sup(p)));

        Some(match kind {
            VolumeKind::AxisAlignedBox => BoundingVolume::AxisAlignedBox { min, max },
            VolumeKind::Sphere => {
                let center = nalgebra::center(&min, &max);
                let radius = points
                    .iter()
                    .map(|p| (*p - center).norm())
                    .fold(0.0, f64::max);
                BoundingVolume::Sphere {
                    center,
                    diameter: radius * 2.0,
                }
            }
        })
    }

    /// Cube (or sphere) of edge length `size` centered on `point`
    pub fn around_point(point: &Point3<f64>, size: f64, kind: VolumeKind) -> Self {
        match kind {
            VolumeKind::AxisAlignedBox => {
                let half = Vector3::repeat(size.abs() / 2.0);
                BoundingVolume::AxisAlignedBox {
                    min: point - half,
                    max: point + half,
                }
            }
            VolumeKind::Sphere => Self::sphere(*point, size),
        }
    }

    /// Flattened box around a segment: the dominant axis is left tight and the
    /// two minor axes are padded by `thickness / 2`.
    pub fn around_line(segment: &LineSegment, thickness: f64, kind: VolumeKind) -> Self {
        match kind {
            VolumeKind::AxisAlignedBox => {
                let dir = segment.direction().abs();
                // Ties go to the first axis.
                let mut dominant = 0;
                for axis in 1..3 {
                    if dir[axis] > dir[dominant] {
                        dominant = axis;
                    }
                }

                let mut pad = Vector3::repeat(thickness.abs() / 2.0);
                pad[dominant] = 0.0;

                let min = segment.start.inf(&segment.end);
                let max = segment.start.sup(&segment.end);
                BoundingVolume::AxisAlignedBox {
                    min: min - pad,
                    max: max + pad,
                }
            }
            VolumeKind::Sphere => Self::sphere(segment.middle(), segment.length().max(thickness.abs())),
        }
    }

    pub fn kind(&self) -> VolumeKind {
        match self {
            BoundingVolume::AxisAlignedBox { .. } => VolumeKind::AxisAlignedBox,
            BoundingVolume::Sphere { .. } => VolumeKind::Sphere,
        }
    }

    pub fn middle(&self) -> Point3<f64> {
        match self {
            BoundingVolume::AxisAlignedBox { min, max } => nalgebra::center(min, max),
            BoundingVolume::Sphere { center, .. } => *center,
        }
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        match *self {
            BoundingVolume::AxisAlignedBox { min, max } => BoundingVolume::AxisAlignedBox {
                min: min + offset,
                max: max + offset,
            },
            BoundingVolume::Sphere { center, diameter } => BoundingVolume::Sphere {
                center: center + offset,
                diameter,
            },
        }
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            BoundingVolume::AxisAlignedBox { min, max } => {
                (0..3).all(|i| point[i] >= min[i] && point[i] <= max[i])
            }
            BoundingVolume::Sphere { center, diameter } => (point - center).norm() <= diameter / 2.0,
        }
    }

    /// The 12 box edges for wireframe overlays. Spheres have none.
    pub fn edges(&self) -> Vec<LineSegment> {
        let (min, max) = match self {
            BoundingVolume::AxisAlignedBox { min, max } => (min, max),
            BoundingVolume::Sphere { .. } => return Vec::new(),
        };

        let corner = |x: bool, y: bool, z: bool| {
            Point3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };

        let mut edges = Vec::with_capacity(12);
        for a in [false, true] {
            for b in [false, true] {
                edges.push(LineSegment::new(corner(false, a, b), corner(true, a, b)));
                edges.push(LineSegment::new(corner(a, false, b), corner(a, true, b)));
                edges.push(LineSegment::new(corner(a, b, false), corner(a, b, true)));
            }
        }
        edges
    }

    /// Ray test over `[start, start + dir * max_length]`.
    ///
    /// Boxes use the slab method and report the entry point. Spheres compare the
    /// center's distance to the segment with the radius and approximate `t` by the
    /// straight-line distance to the center, clamped to the tested length.
    pub fn ray_intersect(
        &self,
        start: &Point3<f64>,
        dir: &Unit<Vector3<f64>>,
        max_length: f64,
    ) -> Option<Intersection> {
        if max_length <= 0.0 {
            return None;
        }

        match self {
            BoundingVolume::AxisAlignedBox { min, max } => {
                slab_entry(min, max, start, dir, max_length).map(|d| Intersection::at_distance(d, max_length))
            }
            BoundingVolume::Sphere { center, diameter } => {
                let end = start + dir.into_inner() * max_length;
                if distance_to_segment(center, start, &end) > diameter / 2.0 {
                    return None;
                }
                let distance = (center - start).norm().min(max_length);
                Some(Intersection::at_distance(distance, max_length))
            }
        }
    }

    /// Like [`BoundingVolume::ray_intersect`] but spheres report the true entry point.
    pub fn ray_intersect_exact(
        &self,
        start: &Point3<f64>,
        dir: &Unit<Vector3<f64>>,
        max_length: f64,
    ) -> Option<Intersection> {
        match self {
            BoundingVolume::AxisAlignedBox { .. } => self.ray_intersect(start, dir, max_length),
            BoundingVolume::Sphere { center, diameter } => {
                if max_length <= 0.0 {
                    return None;
                }
                let radius = diameter / 2.0;
                let oc = start - center;
                let b = oc.dot(dir);
                let c = oc.norm_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }

                let root = discriminant.sqrt();
                let (entry, exit) = (-b - root, -b + root);
                if exit < 0.0 {
                    return None;
                }
                let distance = entry.max(0.0);
                if distance > max_length {
                    return None;
                }
                Some(Intersection::at_distance(distance, max_length))
            }
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.ray_intersect(&ray.origin(), &ray.direction(), ray.max_length())
    }

    pub fn intersect_exact(&self, ray: &Ray) -> Option<Intersection> {
        self.ray_intersect_exact(&ray.origin(), &ray.direction(), ray.max_length())
    }

    /// Segment test; `t` is a fraction of the segment length.
    pub fn intersect_segment(&self, start: &Point3<f64>, end: &Point3<f64>) -> Option<Intersection> {
        match Ray::from_points(*start, *end) {
            Some(ray) => self.intersect(&ray),
            None if self.contains(start) => Some(Intersection { t: 0.0, distance: 0.0 }),
            None => None,
        }
    }

    /// Unbounded test from `start` along `dir`; only `distance` is meaningful.
    pub fn intersect_infinite(&self, start: &Point3<f64>, dir: &Vector3<f64>) -> Option<Intersection> {
        let dir = Unit::try_new(*dir, EPSILON)?;
        self.ray_intersect(start, &dir, INFINITE_LENGTH)
    }
}

/// Slab method over `[0, max_length]`, returning the entry distance.
fn slab_entry(
    min: &Point3<f64>,
    max: &Point3<f64>,
    start: &Point3<f64>,
    dir: &Unit<Vector3<f64>>,
    max_length: f64,
) -> Option<f64> {
    let mut t_min = 0.0_f64;
    let mut t_max = max_length;

    for axis in 0..3 {
        let d = dir[axis];
        if d.abs() < PARALLEL_EPSILON {
            // Parallel to this slab: the origin must already be between its planes.
            if start[axis] < min[axis] || start[axis] > max[axis] {
                return None;
            }
            continue;
        }

        let mut t_near = (min[axis] - start[axis]) / d;
        let mut t_far = (max[axis] - start[axis]) / d;
        if t_near > t_far {
            std::mem::swap(&mut t_near, &mut t_far);
        }

        t_min = t_min.max(t_near);
        t_max = t_max.min(t_far);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> BoundingVolume {
        BoundingVolume::aabb(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    fn dir(x: f64, y: f64, z: f64) -> Unit<Vector3<f64>> {
        Unit::new_normalize(Vector3::new(x, y, z))
    }

    #[test]
    fn test_box_hit_reports_entry() {
        let hit = unit_box()
            .ray_intersect(&Point3::new(0.0, 0.0, 5.0), &dir(0.0, 0.0, -1.0), 10.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 4.0);
        assert_relative_eq!(hit.t, 0.4);
    }

    #[test]
    fn test_box_parallel_miss() {
        let miss = unit_box().ray_intersect(&Point3::new(5.0, 5.0, 5.0), &dir(1.0, 0.0, 0.0), 100.0);
        assert!(miss.is_none());
    }

    #[test]
    fn test_box_out_of_reach_and_behind() {
        let b = unit_box();
        assert!(b.ray_intersect(&Point3::new(0.0, 0.0, 5.0), &dir(0.0, 0.0, -1.0), 3.0).is_none());
        assert!(b.ray_intersect(&Point3::new(0.0, 0.0, 5.0), &dir(0.0, 0.0, 1.0), 100.0).is_none());

        // Starting inside hits at the origin.
        let inside = b.ray_intersect(&Point3::origin(), &dir(1.0, 1.0, 0.0), 10.0).unwrap();
        assert_eq!(inside.t, 0.0);
    }

    #[test]
    fn test_sphere_hit_and_miss() {
        let sphere = BoundingVolume::sphere(Point3::origin(), 10.0);
        let down = dir(0.0, 0.0, -1.0);

        let hit = sphere.ray_intersect(&Point3::new(0.0, 0.0, 20.0), &down, 30.0).unwrap();
        assert_relative_eq!(hit.distance, 20.0);
        assert_relative_eq!(hit.t, 20.0 / 30.0);

        assert!(sphere.ray_intersect(&Point3::new(10.0, 0.0, 20.0), &down, 30.0).is_none());
    }

    #[test]
    fn test_sphere_exact_entry() {
        let sphere = BoundingVolume::sphere(Point3::origin(), 10.0);
        let down = dir(0.0, 0.0, -1.0);
        let hit = sphere
            .ray_intersect_exact(&Point3::new(0.0, 0.0, 20.0), &down, 30.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 15.0, epsilon = 1e-12);

        assert!(sphere
            .ray_intersect_exact(&Point3::new(0.0, 0.0, 20.0), &down, 10.0)
            .is_none());
        assert!(sphere
            .ray_intersect_exact(&Point3::new(0.0, 0.0, 20.0), &dir(0.0, 0.0, 1.0), 100.0)
            .is_none());
    }

    #[test]
    fn test_around_line_pads_minor_axes() {
        let segment = LineSegment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 1.0, 0.0));
        match BoundingVolume::around_line(&segment, 4.0, VolumeKind::AxisAlignedBox) {
            BoundingVolume::AxisAlignedBox { min, max } => {
                assert_eq!(min, Point3::new(0.0, -2.0, -2.0));
                assert_eq!(max, Point3::new(10.0, 3.0, 2.0));
            }
            other => panic!("expected a box, got {other:?}"),
        }
    }

    #[test]
    fn test_from_points_and_middle() {
        let points = [
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.0, 0.0, 5.0),
            Point3::new(0.0, 4.0, 4.0),
        ];
        let b = BoundingVolume::from_points(&points, VolumeKind::AxisAlignedBox).unwrap();
        assert_eq!(b, BoundingVolume::aabb(Point3::new(-1.0, 0.0, 3.0), Point3::new(1.0, 4.0, 5.0)));
        assert_eq!(b.middle(), Point3::new(0.0, 2.0, 4.0));

        let s = BoundingVolume::from_points(&points, VolumeKind::Sphere).unwrap();
        assert!(points.iter().all(|p| s.contains(p)));
        assert!(BoundingVolume::from_points(&[], VolumeKind::Sphere).is_none());
    }

    #[test]
    fn test_edges() {
        let edges = unit_box().edges();
        assert_eq!(edges.len(), 12);
        assert!(edges.iter().all(|e| (e.length() - 2.0).abs() < 1e-12));
        assert!(BoundingVolume::sphere(Point3::origin(), 1.0).edges().is_empty());
    }

    #[test]
    fn test_segment_and_infinite_forms() {
        let b = unit_box();
        let hit = b
            .intersect_segment(&Point3::new(-3.0, 0.0, 0.0), &Point3::new(3.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.t, 2.0 / 6.0, epsilon = 1e-12);

        let far = b
            .intersect_infinite(&Point3::new(0.0, 0.0, 1e6), &-Vector3::z())
            .unwrap();
        assert_relative_eq!(far.distance, 1e6 - 1.0, epsilon = 1e-6);
    }
}
