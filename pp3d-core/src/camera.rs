/// Camera pose and view transform.
///
/// A [`Camera`] is an immutable value: every control operation returns a new
/// camera, and the view matrix is composed on demand from the location and the
/// orthonormal [`Basis`], so the rotation and translation parts can never be
/// observed out of sync.
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use tracing::warn;

use crate::error::CameraError;
use crate::math::{angle_between_unit_vectors, rotate_around_axis, world_up, EPSILON};
use crate::transform::Transform;

/// Pitch can come no closer than this to straight up or down, in degrees.
pub const POLE_MARGIN_DEGREES: f64 = 1.0;

/// Limit for absolute pitch when set directly from angles.
pub const MAX_PITCH_DEGREES: f64 = 89.0;

/// Right-handed orthonormal camera basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub forward: Vector3<f64>,
    pub up: Vector3<f64>,
    pub left: Vector3<f64>,
}

impl Basis {
    /// Gram-Schmidt against world up: `left = up_world x forward`, `up = forward x left`.
    ///
    /// The resulting basis never has roll.
    pub fn from_forward(forward: &Vector3<f64>) -> Result<Self, CameraError> {
        if !forward.iter().all(|c| c.is_finite()) {
            return Err(CameraError::NonFiniteInput);
        }
        let forward = forward
            .try_normalize(EPSILON)
            .ok_or(CameraError::DegenerateDirection)?;
        let left = world_up()
            .cross(&forward)
            .try_normalize(EPSILON)
            .ok_or(CameraError::DegenerateDirection)?;
        let up = forward.cross(&left).normalize();

        Ok(Self { forward, up, left })
    }

    /// Rows are `-left`, `up`, `-forward`: the camera looks down view-space -Z.
    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            (-self.left).transpose(),
            self.up.transpose(),
            (-self.forward).transpose(),
        ])
    }
}

/// `view = R * T(-location)`, i.e. the rotation block with `-R * location` in the last column.
pub fn compose_view_transform(location: &Point3<f64>, basis: &Basis) -> Matrix4<f64> {
    let rotation = basis.rotation();
    let translation = -(rotation * location.coords);

    let mut view = rotation.to_homogeneous();
    view.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
    view
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    location: Point3<f64>,
    basis: Basis,
}

impl Camera {
    pub fn new(location: Point3<f64>, forward: &Vector3<f64>) -> Result<Self, CameraError> {
        if !location.coords.iter().all(|c| c.is_finite()) {
            return Err(CameraError::NonFiniteInput);
        }
        Ok(Self {
            location,
            basis: Basis::from_forward(forward)?,
        })
    }

    pub fn looking_at(location: Point3<f64>, target: &Point3<f64>) -> Result<Self, CameraError> {
        let dir = target - location;
        if dir.norm() < EPSILON {
            return Err(CameraError::ZeroLengthLookAt);
        }
        Self::new(location, &dir)
    }

    pub fn location(&self) -> Point3<f64> {
        self.location
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.basis.forward
    }

    pub fn up(&self) -> Vector3<f64> {
        self.basis.up
    }

    pub fn left(&self) -> Vector3<f64> {
        self.basis.left
    }

    /// World space to view space
    pub fn view_transform(&self) -> Matrix4<f64> {
        compose_view_transform(&self.location, &self.basis)
    }

    /// View space to world space. The rotation is orthonormal, so this is `[R^T | location]`.
    pub fn inverse_view_transform(&self) -> Matrix4<f64> {
        let mut inverse = self.basis.rotation().transpose().to_homogeneous();
        inverse
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.location.coords);
        inverse
    }

    pub fn with_location(&self, location: Point3<f64>) -> Self {
        Self {
            location,
            basis: self.basis,
        }
    }

    pub fn set_direction(&self, forward: &Vector3<f64>) -> Result<Self, CameraError> {
        Ok(Self {
            location: self.location,
            basis: Basis::from_forward(forward)?,
        })
    }

    pub fn look_at(&self, target: &Point3<f64>) -> Result<Self, CameraError> {
        let dir = target - self.location;
        if dir.norm() < EPSILON {
            return Err(CameraError::ZeroLengthLookAt);
        }
        self.set_direction(&dir)
    }

    /// Negative amounts move backwards.
    pub fn move_forward(&self, amount: f64) -> Self {
        self.with_location(self.location + self.basis.forward * amount)
    }

    /// Along the camera's own up axis.
    pub fn move_up(&self, amount: f64) -> Self {
        self.with_location(self.location + self.basis.up * amount)
    }

    /// Along world +Y regardless of orientation.
    pub fn move_up_world(&self, amount: f64) -> Self {
        self.with_location(self.location + world_up() * amount)
    }

    /// Positive moves left, negative moves right.
    pub fn move_left(&self, amount: f64) -> Self {
        self.with_location(self.location + self.basis.left * amount)
    }

    /// Turns horizontally around the camera up axis. Positive turns right.
    pub fn turn(&self, degrees: f64) -> Self {
        let forward = rotate_around_axis(&self.basis.forward, &self.basis.up, -degrees);
        self.redirected(&forward)
    }

    /// Turns vertically around the camera left axis. Positive pitches the nose up.
    ///
    /// The rotation is clamped so the forward vector stays at least
    /// [`POLE_MARGIN_DEGREES`] away from vertical.
    pub fn pitch(&self, degrees: f64) -> Self {
        let degrees = self.clamp_pitch_delta(degrees);
        let forward = rotate_around_axis(&self.basis.forward, &self.basis.left, -degrees);
        self.redirected(&forward)
    }

    /// Rotates the whole pose around `pivot`: yaw about world up, then pitch about the
    /// current left axis, both applied to the inverse view transform in pivot-local space.
    pub fn orbit_around_point(&self, pivot: &Point3<f64>, delta_yaw: f64, delta_pitch: f64) -> Self {
        let delta_pitch = self.clamp_pitch_delta(delta_pitch);

        let rotation = Transform::rotation_y(-delta_yaw)
            * Transform::rotation_about_axis(&self.basis.left, -delta_pitch);
        let camera_to_world = Transform::about_pivot(pivot, &rotation) * self.inverse_view_transform();

        let location = Transform::translation_of(&camera_to_world);
        // Column 2 of the inverse view holds -forward.
        let forward = -camera_to_world.fixed_view::<3, 1>(0, 2).into_owned();

        match Basis::from_forward(&forward) {
            Ok(basis) => Self { location, basis },
            Err(err) => {
                warn!(%err, "orbit produced a degenerate basis; keeping previous pose");
                *self
            }
        }
    }

    /// Current yaw in degrees, positive to the right of -Z.
    pub fn yaw(&self) -> f64 {
        let back = -self.basis.forward;
        (-back.x.atan2(back.z)).to_degrees()
    }

    /// Current pitch in degrees, positive up, 0 at the horizon.
    pub fn pitch_angle(&self) -> f64 {
        self.basis.forward.y.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Rebuilds the direction from spherical angles, pitch clamped to ±[`MAX_PITCH_DEGREES`].
    pub fn set_yaw_and_pitch(&self, yaw: f64, pitch: f64) -> Self {
        let pitch = pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES).to_radians();
        let yaw = yaw.to_radians();

        let forward = Vector3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * -yaw.cos());
        self.redirected(&forward)
    }

    fn clamp_pitch_delta(&self, degrees: f64) -> f64 {
        let pole = if degrees < 0.0 { -world_up() } else { world_up() };
        let max_angle =
            (angle_between_unit_vectors(&self.basis.forward, &pole) - POLE_MARGIN_DEGREES).max(0.0);
        degrees.clamp(-max_angle, max_angle)
    }

    fn redirected(&self, forward: &Vector3<f64>) -> Self {
        match self.set_direction(forward) {
            Ok(camera) => camera,
            Err(err) => {
                warn!(%err, "rejected camera direction; keeping previous orientation");
                *self
            }
        }
    }
}

impl Default for Camera {
    /// At `(0, 0, 1000)` looking at the origin.
    fn default() -> Self {
        Self {
            location: Point3::new(0.0, 0.0, 1000.0),
            basis: Basis {
                forward: -Vector3::z(),
                up: Vector3::y(),
                left: -Vector3::x(),
            },
        }
    }
}
