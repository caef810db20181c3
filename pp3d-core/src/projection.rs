/// Projection matrices, frustum clipping and the screen <-> world mapping
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use tracing::debug;

use crate::camera::Camera;
use crate::config::ProjectionConfig;
use crate::error::ProjectionError;
use crate::frustum::Frustum;
use crate::geometry::{Color, Face, LineSegment};
use crate::math::{from_homogeneous, to_homogeneous};
use crate::ray::{Ray, DEFAULT_PICK_LENGTH};
use crate::viewport::Viewport;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Perspective matrix for a right-handed view space, NDC depth 0 at `near` and 1 at `far`.
pub fn perspective_matrix(fov: f64, aspect: f64, near: f64, far: f64) -> Result<Matrix4<f64>, ProjectionError> {
    if !(fov > 0.0 && fov < 180.0) {
        return Err(ProjectionError::InvalidFieldOfView(fov));
    }
    validate_aspect(aspect)?;
    if !(near > 0.0 && far > near && far.is_finite()) {
        return Err(ProjectionError::InvalidClipRange { near, far });
    }

    let f = 1.0 / (fov.to_radians() / 2.0).tan();
    let depth = near - far;

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        f / aspect, 0.0, 0.0,         0.0,
        0.0,        f,   0.0,         0.0,
        0.0,        0.0, far / depth, near * far / depth,
        0.0,        0.0, -1.0,        0.0,
    );
    Ok(matrix)
}

/// Orthographic matrix mapping `[-right, right] x [-top, top]` and depth `near..far` to 0..1.
pub fn orthographic_matrix(top: f64, right: f64, near: f64, far: f64) -> Result<Matrix4<f64>, ProjectionError> {
    for extent in [top, right] {
        if !(extent > 0.0 && extent.is_finite()) {
            return Err(ProjectionError::InvalidExtent(extent));
        }
    }
    if !(far > near && near.is_finite() && far.is_finite()) {
        return Err(ProjectionError::InvalidClipRange { near, far });
    }

    let depth = near - far;

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        1.0 / right, 0.0,       0.0,         0.0,
        0.0,         1.0 / top, 0.0,         0.0,
        0.0,         0.0,       1.0 / depth, near / depth,
        0.0,         0.0,       0.0,         1.0,
    );
    Ok(matrix)
}

fn validate_aspect(aspect: f64) -> Result<(), ProjectionError> {
    if aspect > 0.0 && aspect.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::InvalidAspect(aspect))
    }
}

/// A polygon after projection, in screen space, ready for a painter's pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFace {
    pub points: Vec<Point3<f64>>,
    /// Mean view-space distance in front of the camera; larger is farther away
    pub depth: f64,
    pub color: Color,
    /// Index of the face in the slice handed to [`Projection::project_faces`]
    pub source_index: usize,
}

/// An immutable projection snapshot: matrix, inverse and frustum always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    config: ProjectionConfig,
    viewport: Viewport,
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
    frustum: Frustum,
    pick_length: f64,
}

impl Projection {
    pub fn new(config: ProjectionConfig, viewport: Viewport) -> Result<Self, ProjectionError> {
        let aspect = viewport.aspect();
        let matrix = match config {
            ProjectionConfig::Perspective { fov, near, far } => perspective_matrix(fov, aspect, near, far)?,
            ProjectionConfig::Orthographic { top, near, far } => {
                validate_aspect(aspect)?;
                orthographic_matrix(top, top * aspect, near, far)?
            }
        };
        let inverse = matrix.try_inverse().ok_or(ProjectionError::NotInvertible)?;
        let frustum = Frustum::from_projection(&matrix)?;

        debug!(
            mode = ?config.mode(),
            width = viewport.width(),
            height = viewport.height(),
            "projection built"
        );

        Ok(Self {
            config,
            viewport,
            matrix,
            inverse,
            frustum,
            pick_length: DEFAULT_PICK_LENGTH,
        })
    }

    pub fn perspective(fov: f64, near: f64, far: f64, viewport: Viewport) -> Result<Self, ProjectionError> {
        Self::new(ProjectionConfig::Perspective { fov, near, far }, viewport)
    }

    pub fn orthographic(top: f64, near: f64, far: f64, viewport: Viewport) -> Result<Self, ProjectionError> {
        Self::new(ProjectionConfig::Orthographic { top, near, far }, viewport)
    }

    /// Length of rays produced by [`Projection::screen_to_ray`]; must be positive and finite.
    pub fn with_pick_length(mut self, pick_length: f64) -> Result<Self, ProjectionError> {
        if !(pick_length.is_finite() && pick_length > 0.0) {
            return Err(ProjectionError::InvalidPickLength(pick_length));
        }
        self.pick_length = pick_length;
        Ok(self)
    }

    /// Same lens for a resized surface. Matrix, inverse and frustum are re-derived.
    pub fn rebuild_for(&self, viewport: Viewport) -> Result<Self, ProjectionError> {
        Self::new(self.config, viewport)?.with_pick_length(self.pick_length)
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn mode(&self) -> ProjectionMode {
        self.config.mode()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// `projection * view * point`, no culling
    pub fn project_to_clip_space(&self, camera: &Camera, point: &Point3<f64>) -> Vector4<f64> {
        self.matrix * camera.view_transform() * to_homogeneous(point)
    }

    /// World point to screen space. With `clip`, points outside the frustum give `None`.
    pub fn project(&self, camera: &Camera, point: &Point3<f64>, clip: bool) -> Option<Point3<f64>> {
        let h = self.project_to_clip_space(camera, point);
        if clip && !self.frustum.contains(&h) {
            return None;
        }
        Some(self.viewport.clip_to_screen(&h))
    }

    /// Clip-space endpoints of the visible part of `segment`
    pub fn clip_line_segment(&self, camera: &Camera, segment: &LineSegment) -> Option<(Vector4<f64>, Vector4<f64>)> {
        let view_projection = self.matrix * camera.view_transform();
        let a = view_projection * to_homogeneous(&segment.start);
        let b = view_projection * to_homogeneous(&segment.end);
        self.frustum.clip_segment(a, b)
    }

    /// Screen-space segment, or `None` when the segment is fully culled
    pub fn project_line_segment(&self, camera: &Camera, segment: &LineSegment) -> Option<LineSegment> {
        let (a, b) = self.clip_line_segment(camera, segment)?;
        Some(LineSegment::new(
            self.viewport.clip_to_screen(&a),
            self.viewport.clip_to_screen(&b),
        ))
    }

    /// Backface-culls, frustum-culls and projects world-space faces.
    ///
    /// Output keeps input order; callers sort by `depth` for painting.
    pub fn project_faces(&self, camera: &Camera, faces: &[Face]) -> Vec<ProjectedFace> {
        let view = camera.view_transform();

        faces
            .iter()
            .enumerate()
            .filter_map(|(source_index, face)| {
                let view_face = face.transformed(&view);
                if self.is_back_facing(&view_face) {
                    return None;
                }

                let clip: Vec<Vector4<f64>> = view_face
                    .points
                    .iter()
                    .map(|p| self.matrix * to_homogeneous(p))
                    .collect();
                if self.frustum.culls_polygon(&clip) {
                    return None;
                }

                Some(ProjectedFace {
                    points: clip.iter().map(|h| self.viewport.clip_to_screen(h)).collect(),
                    depth: -view_face.average_location().z,
                    color: face.color,
                    source_index,
                })
            })
            .collect()
    }

    /// Back-facing test on a face already in view space
    fn is_back_facing(&self, view_face: &Face) -> bool {
        let normal = view_face.normal();
        match self.mode() {
            ProjectionMode::Perspective => normal.dot(&view_face.average_location().coords) >= 0.0,
            // Every view ray is parallel to -Z.
            ProjectionMode::Orthographic => normal.z <= 0.0,
        }
    }

    /// Inverse projection then inverse view
    pub fn from_clip_space_to_world_space(&self, camera: &Camera, clip: &Vector4<f64>) -> Point3<f64> {
        from_homogeneous(&(camera.inverse_view_transform() * self.inverse * clip))
    }

    /// Picking ray through a screen pixel, starting at the camera (perspective)
    /// or on the near plane (orthographic).
    pub fn screen_to_ray(&self, camera: &Camera, x: f64, y: f64) -> Option<Ray> {
        let ndc = self.viewport.screen_to_ndc(x, y);
        let near_point = self.from_clip_space_to_world_space(camera, &to_homogeneous(&ndc));

        match self.mode() {
            ProjectionMode::Perspective => {
                let origin = camera.location();
                Ray::new(origin, near_point - origin, self.pick_length)
            }
            ProjectionMode::Orthographic => Ray::new(near_point, camera.forward(), self.pick_length),
        }
    }

    /// Screen-space length of a world-space size placed at `location`, measured
    /// along the camera's left axis.
    pub fn projected_size(&self, camera: &Camera, location: &Point3<f64>, size: f64) -> f64 {
        let offset: Vector3<f64> = camera.left() * size;
        let a = self.viewport.clip_to_screen(&self.project_to_clip_space(camera, location));
        let b = self
            .viewport
            .clip_to_screen(&self.project_to_clip_space(camera, &(location + offset)));
        (b.xy() - a.xy()).norm()
    }

    /// Pixels per world unit at `location`
    pub fn projected_size_multiplier(&self, camera: &Camera, location: &Point3<f64>) -> f64 {
        self.projected_size(camera, location, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use approx::assert_relative_eq;

    fn viewport() -> Viewport {
        Viewport::new(800, 600).unwrap()
    }

    fn perspective() -> Projection {
        Projection::perspective(60.0, 0.1, 10_000.0, viewport()).unwrap()
    }

    #[test]
    fn test_projection_creation() {
        let projection = perspective();
        assert_eq!(projection.mode(), ProjectionMode::Perspective);
        assert_eq!(projection.viewport(), viewport());
        assert!(matches!(
            Projection::perspective(0.0, 0.1, 10.0, viewport()),
            Err(ProjectionError::InvalidFieldOfView(_))
        ));
        assert!(matches!(
            Projection::perspective(60.0, 10.0, 10.0, viewport()),
            Err(ProjectionError::InvalidClipRange { .. })
        ));
        assert!(matches!(
            Projection::orthographic(-1.0, 0.1, 10.0, viewport()),
            Err(ProjectionError::InvalidExtent(_))
        ));
    }

    #[test]
    fn test_perspective_depth_range() {
        let m = perspective_matrix(90.0, 1.0, 1.0, 100.0).unwrap();
        let near = from_homogeneous(&(m * Vector4::new(0.0, 0.0, -1.0, 1.0)));
        let far = from_homogeneous(&(m * Vector4::new(0.0, 0.0, -100.0, 1.0)));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-12);

        // 45 degrees off axis touches the edge of a 90 degree frustum.
        let edge = from_homogeneous(&(m * Vector4::new(5.0, 0.0, -5.0, 1.0)));
        assert_relative_eq!(edge.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orthographic_depth_range() {
        let m = orthographic_matrix(10.0, 20.0, 1.0, 101.0).unwrap();
        let near = m * Vector4::new(20.0, -10.0, -1.0, 1.0);
        let far = m * Vector4::new(0.0, 0.0, -101.0, 1.0);
        assert_relative_eq!(near, Vector4::new(1.0, -1.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_center_and_behind() {
        let projection = perspective();
        let camera = Camera::default();

        let center = projection.project(&camera, &Point3::origin(), true).unwrap();
        assert_relative_eq!(center.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 300.0, epsilon = 1e-9);

        let behind = Point3::new(0.0, 0.0, 2000.0);
        assert!(projection.project(&camera, &behind, true).is_none());
        assert!(projection.project(&camera, &behind, false).is_some());
    }

    #[test]
    fn test_line_segment_through_camera_is_clipped() {
        let projection = perspective();
        let camera = Camera::default();
        let segment = LineSegment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 5000.0));
        let (a, b) = projection.clip_line_segment(&camera, &segment).unwrap();
        assert_eq!(a, projection.project_to_clip_space(&camera, &segment.start));
        assert!(b.z.abs() < 1e-6);

        let screen = projection.project_line_segment(&camera, &segment).unwrap();
        assert_relative_eq!(screen.start.x, 400.0, epsilon = 1e-6);

        let behind = LineSegment::new(Point3::new(0.0, 0.0, 1500.0), Point3::new(10.0, 0.0, 3000.0));
        assert!(projection.project_line_segment(&camera, &behind).is_none());
    }

    #[test]
    fn test_cube_shows_only_front_faces() {
        let camera = Camera::default();
        let cube = Mesh::cube(200.0);

        let projected = perspective().project_faces(&camera, &cube.faces);
        // Straight on, only the +Z face points at the camera.
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].source_index, 0);
        assert_relative_eq!(projected[0].depth, 900.0, epsilon = 1e-9);

        let ortho = Projection::orthographic(1000.0, 0.1, 10_000.0, viewport()).unwrap();
        let projected = ortho.project_faces(&camera, &cube.faces);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].source_index, 0);
    }

    #[test]
    fn test_faces_outside_the_view_are_culled() {
        let camera = Camera::default();
        let far_left = Mesh::cube(10.0)
            .faces
            .iter()
            .map(|f| f.transformed(&Matrix4::new_translation(&Vector3::new(-5000.0, 0.0, 0.0))))
            .collect::<Vec<_>>();
        assert!(perspective().project_faces(&camera, &far_left).is_empty());
    }

    #[test]
    fn test_screen_to_ray_through_center() {
        let projection = perspective();
        let camera = Camera::default();
        let ray = projection.screen_to_ray(&camera, 400.0, 300.0).unwrap();
        assert_relative_eq!(ray.origin(), camera.location(), epsilon = 1e-9);
        assert_relative_eq!(ray.direction().into_inner(), -Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(ray.max_length(), DEFAULT_PICK_LENGTH);

        let ortho = Projection::orthographic(1000.0, 0.1, 10_000.0, viewport()).unwrap();
        let ray = ortho.screen_to_ray(&camera, 0.0, 300.0).unwrap();
        assert_relative_eq!(ray.direction().into_inner(), camera.forward(), epsilon = 1e-12);
        // Left screen edge is `top * aspect` world units to the left.
        assert_relative_eq!(ray.origin().x, -1000.0 * 800.0 / 600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projected_size_scales_with_distance() {
        let projection = perspective();
        let camera = Camera::default();
        let near = projection.projected_size(&camera, &Point3::new(0.0, 0.0, 500.0), 10.0);
        let far = projection.projected_size(&camera, &Point3::origin(), 10.0);
        assert_relative_eq!(near, 2.0 * far, epsilon = 1e-9);
        assert_relative_eq!(
            projection.projected_size_multiplier(&camera, &Point3::origin()) * 10.0,
            far,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rebuild_for_resized_viewport() {
        let projection = perspective().with_pick_length(500.0).unwrap();
        let resized = projection.rebuild_for(Viewport::new(400, 600).unwrap()).unwrap();
        assert_eq!(resized.viewport().width(), 400);
        assert_eq!(resized.config(), projection.config());
        assert_relative_eq!(resized.matrix()[(0, 0)], projection.matrix()[(0, 0)] * 2.0, epsilon = 1e-12);

        let ray = resized.screen_to_ray(&Camera::default(), 200.0, 300.0).unwrap();
        assert_relative_eq!(ray.max_length(), 500.0);
    }

    #[test]
    fn test_pick_length_must_be_finite() {
        assert_eq!(
            perspective().with_pick_length(f64::INFINITY),
            Err(ProjectionError::InvalidPickLength(f64::INFINITY))
        );
        assert!(perspective().with_pick_length(0.0).is_err());
        assert!(perspective().with_pick_length(f64::NAN).is_err());
    }
}
