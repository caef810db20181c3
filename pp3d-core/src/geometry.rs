/// Geometry primitives: segments, polygon faces and simple meshes
use nalgebra::{Matrix4, Point3, Vector3};

use crate::math::normalize_or_zero;

/// An opaque material tag carried through projection for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const LIGHT_GRAY: Color = Color::rgb(192, 192, 192);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::LIGHT_GRAY
    }
}

/// A straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl LineSegment {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    /// Unnormalized direction from start to end
    pub fn direction(&self) -> Vector3<f64> {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    pub fn middle(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

/// A planar polygon, counter-clockwise (right-hand rule) winding when seen from the front
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub points: Vec<Point3<f64>>,
    pub color: Color,
}

impl Face {
    pub fn new(color: Color, points: Vec<Point3<f64>>) -> Self {
        Self { points, color }
    }

    /// Applies an affine matrix to every point, returning a new face
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Face {
        Face {
            points: self.points.iter().map(|p| matrix.transform_point(p)).collect(),
            color: self.color,
        }
    }

    /// Average of the per-corner normals.
    ///
    /// Corners whose edges are degenerate are skipped, so a collinear or
    /// collapsed polygon yields the zero vector.
    pub fn normal(&self) -> Vector3<f64> {
        let count = self.points.len();
        let mut sum = Vector3::zeros();
        let mut used = 0;

        for i in 0..count {
            let p = self.points[i];
            let prev = self.points[(i + count - 1) % count];
            let next = self.points[(i + 1) % count];

            let n = normalize_or_zero(&(next - p).cross(&(prev - p)));
            if n != Vector3::zeros() {
                sum += n;
                used += 1;
            }
        }

        if used == 0 {
            return Vector3::zeros();
        }
        normalize_or_zero(&(sum / used as f64))
    }

    pub fn average_location(&self) -> Point3<f64> {
        if self.points.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }

    /// Edges of the closed polygon
    pub fn lines(&self) -> Vec<LineSegment> {
        let count = self.points.len();
        (0..count)
            .map(|i| LineSegment::new(self.points[i], self.points[(i + 1) % count]))
            .collect()
    }
}

/// A polygon mesh in model space
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self { faces: Vec::new() }
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Recolors every face
    pub fn with_color(mut self, color: Color) -> Self {
        for face in &mut self.faces {
            face.color = color;
        }
        self
    }

    /// Axis-aligned cube centered on the origin with outward-facing quads
    pub fn cube(size: f64) -> Self {
        let h = size / 2.0;
        let p = Point3::new;
        let c = Color::LIGHT_GRAY;
        let mut mesh = Self::new();

        // Front (+Z)
        mesh.add_face(Face::new(c, vec![p(-h, -h, h), p(h, -h, h), p(h, h, h), p(-h, h, h)]));
        // Back (-Z)
        mesh.add_face(Face::new(c, vec![p(h, -h, -h), p(-h, -h, -h), p(-h, h, -h), p(h, h, -h)]));
        // Top (+Y)
        mesh.add_face(Face::new(c, vec![p(-h, h, h), p(h, h, h), p(h, h, -h), p(-h, h, -h)]));
        // Bottom (-Y)
        mesh.add_face(Face::new(c, vec![p(-h, -h, -h), p(h, -h, -h), p(h, -h, h), p(-h, -h, h)]));
        // Right (+X)
        mesh.add_face(Face::new(c, vec![p(h, -h, h), p(h, -h, -h), p(h, h, -h), p(h, h, h)]));
        // Left (-X)
        mesh.add_face(Face::new(c, vec![p(-h, -h, -h), p(-h, -h, h), p(-h, h, h), p(-h, h, -h)]));

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.faces.len(), 6);
        for face in &cube.faces {
            let n = face.normal();
            let outward = face.average_location().coords.normalize();
            assert_relative_eq!(n, outward, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        let face = Face::new(
            Color::RED,
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
        );
        assert_eq!(face.normal(), Vector3::zeros());
    }

    #[test]
    fn test_face_lines_close_the_loop() {
        let face = &Mesh::cube(2.0).faces[0];
        let lines = face.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3].end, face.points[0]);
    }

    #[test]
    fn test_segment_middle_and_length() {
        let s = LineSegment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 6.0, 8.0));
        assert_relative_eq!(s.length(), 10.0);
        assert_eq!(s.middle(), Point3::new(0.0, 3.0, 4.0));
    }
}
