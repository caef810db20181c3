/// Translation gizmo hit-testing and drag resolution.
///
/// The gizmo has three axis handles, three plane handles and a center handle that
/// moves freely in the plane facing the camera. Only the handles' bounding volumes
/// live here; how the gizmo is drawn is up to the host.
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::bounds::{BoundingVolume, VolumeKind};
use crate::geometry::{Color, LineSegment};
use crate::math::{closest_points_between_lines, EPSILON};
use crate::picking::{hits, Pickable};
use crate::ray::Ray;

pub const DEFAULT_LENGTH: f64 = 60.0;
pub const DEFAULT_THICKNESS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    X,
    Y,
    Z,
    XY,
    XZ,
    YZ,
    All,
}

impl Handle {
    pub const ALL: [Handle; 7] = [
        Handle::X,
        Handle::Y,
        Handle::Z,
        Handle::XY,
        Handle::XZ,
        Handle::YZ,
        Handle::All,
    ];

    /// Direction of an axis handle
    pub fn axis(self) -> Option<Vector3<f64>> {
        match self {
            Handle::X => Some(Vector3::x()),
            Handle::Y => Some(Vector3::y()),
            Handle::Z => Some(Vector3::z()),
            _ => None,
        }
    }

    /// The two axes spanning a plane handle
    pub fn plane_axes(self) -> Option<(Vector3<f64>, Vector3<f64>)> {
        match self {
            Handle::XY => Some((Vector3::x(), Vector3::y())),
            Handle::XZ => Some((Vector3::x(), Vector3::z())),
            Handle::YZ => Some((Vector3::y(), Vector3::z())),
            _ => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Handle::X | Handle::YZ => Color::RED,
            Handle::Y | Handle::XZ => Color::GREEN,
            Handle::Z | Handle::XY => Color::BLUE,
            Handle::All => Color::YELLOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleVolume {
    pub handle: Handle,
    pub volume: BoundingVolume,
}

impl Pickable for HandleVolume {
    fn bounding_volume(&self) -> &BoundingVolume {
        &self.volume
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gizmo {
    origin: Point3<f64>,
    length: f64,
    thickness: f64,
    handles: Vec<HandleVolume>,
}

impl Gizmo {
    pub fn new(origin: Point3<f64>, length: f64) -> Self {
        Self::with_thickness(origin, length, DEFAULT_THICKNESS * length / DEFAULT_LENGTH)
    }

    pub fn with_thickness(origin: Point3<f64>, length: f64, thickness: f64) -> Self {
        let mut gizmo = Self {
            origin,
            length,
            thickness,
            handles: Vec::with_capacity(Handle::ALL.len()),
        };
        gizmo.handles = Handle::ALL
            .iter()
            .map(|&handle| HandleVolume {
                handle,
                volume: gizmo.volume_for(handle),
            })
            .collect();
        gizmo
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn handles(&self) -> &[HandleVolume] {
        &self.handles
    }

    /// Same gizmo at a new origin
    pub fn moved_to(&self, origin: Point3<f64>) -> Self {
        let offset = origin - self.origin;
        Self {
            origin,
            length: self.length,
            thickness: self.thickness,
            handles: self
                .handles
                .iter()
                .map(|h| HandleVolume {
                    handle: h.handle,
                    volume: h.volume.translated(&offset),
                })
                .collect(),
        }
    }

    /// The visible shaft of an axis handle, starting a third of the length out
    pub fn axis_segment(&self, axis: &Vector3<f64>) -> LineSegment {
        let start = self.origin + axis * (self.length / 3.0);
        LineSegment::new(start, start + axis * self.length)
    }

    /// Corners of a plane handle's square
    pub fn plane_square(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> [Point3<f64>; 4] {
        let offset = self.length / 6.0;
        let size = self.length / 2.6;
        let p = |u: f64, v: f64| self.origin + a * u + b * v;
        [
            p(offset, offset),
            p(offset + size, offset),
            p(offset + size, offset + size),
            p(offset, offset + size),
        ]
    }

    fn volume_for(&self, handle: Handle) -> BoundingVolume {
        if let Some(axis) = handle.axis() {
            return BoundingVolume::around_line(
                &self.axis_segment(&axis),
                self.thickness,
                VolumeKind::AxisAlignedBox,
            );
        }
        if let Some((a, b)) = handle.plane_axes() {
            let [first, _, third, _] = self.plane_square(&a, &b);
            return BoundingVolume::aabb(first, third);
        }
        BoundingVolume::around_point(&self.origin, self.length / 3.0, VolumeKind::AxisAlignedBox)
    }

    /// Nearest handle under the ray
    pub fn pick_handle(&self, ray: &Ray) -> Option<Handle> {
        let handle = hits(ray, &self.handles).first().map(|hit| hit.target.handle);
        if let Some(handle) = handle {
            debug!(?handle, "gizmo handle picked");
        }
        handle
    }

    /// World point the ray selects while dragging `handle`.
    ///
    /// Axis handles use the closest point on the axis line, plane handles intersect
    /// their plane and the center handle uses the plane facing `view_forward`.
    /// Points behind the ray origin give `None`.
    pub fn drag_point(&self, ray: &Ray, handle: Handle, view_forward: &Vector3<f64>) -> Option<Point3<f64>> {
        let direction = ray.direction().into_inner();

        if let Some(axis) = handle.axis() {
            let (s, t) = closest_points_between_lines(&ray.origin(), &direction, &self.origin, &axis)?;
            if s < 0.0 {
                return None;
            }
            return Some(self.origin + axis * t);
        }

        let normal = match handle.plane_axes() {
            Some((a, b)) => a.cross(&b),
            None => *view_forward,
        };
        let denom = normal.dot(&direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let s = normal.dot(&(self.origin - ray.origin())) / denom;
        if s < 0.0 {
            return None;
        }
        Some(ray.origin() + direction * s)
    }
}

impl Default for Gizmo {
    fn default() -> Self {
        Self::new(Point3::origin(), DEFAULT_LENGTH)
    }
}
