/// Viewport transform between clip space / NDC and screen pixels
use nalgebra::{Point3, Vector4};

use crate::error::ProjectionError;
use crate::math::EPSILON;

/// Pixel dimensions of the drawing surface. Screen y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self, ProjectionError> {
        if width == 0 || height == 0 {
            return Err(ProjectionError::EmptyViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Horizontal aspect ratio (width / height)
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Clip space to screen space: perspective divide, then scale NDC x/y to pixels.
    ///
    /// The returned z is the NDC depth in `[0, 1]` for visible points.
    pub fn clip_to_screen(&self, clip: &Vector4<f64>) -> Point3<f64> {
        let (mut x, mut y, mut z) = (clip.x, clip.y, clip.z);
        if clip.w.abs() >= EPSILON {
            x /= clip.w;
            y /= clip.w;
            z /= clip.w;
        }

        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Point3::new((w * x + w) / 2.0, (h * -y + h) / 2.0, z)
    }

    /// Screen pixel to NDC on the near plane (`z = 0`)
    pub fn screen_to_ndc(&self, x: f64, y: f64) -> Point3<f64> {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Point3::new((x * 2.0 - w) / w, (y * 2.0 - h) / -h, 0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_viewport() {
        assert!(matches!(
            Viewport::new(0, 10),
            Err(ProjectionError::EmptyViewport { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_ndc_corners_map_to_screen_corners() {
        let vp = Viewport::new(800, 600).unwrap();
        let top_left = vp.clip_to_screen(&Vector4::new(-2.0, 2.0, 1.0, 2.0));
        assert_eq!((top_left.x, top_left.y, top_left.z), (0.0, 0.0, 0.5));

        let bottom_right = vp.clip_to_screen(&Vector4::new(1.0, -1.0, 0.0, 1.0));
        assert_eq!((bottom_right.x, bottom_right.y), (800.0, 600.0));
    }

    #[test]
    fn test_screen_to_ndc_inverts_viewport() {
        let vp = Viewport::new(1280, 720).unwrap();
        let ndc = vp.screen_to_ndc(320.0, 540.0);
        let back = vp.clip_to_screen(&Vector4::new(ndc.x, ndc.y, ndc.z, 1.0));
        assert!((back.x - 320.0).abs() < 1e-9);
        assert!((back.y - 540.0).abs() < 1e-9);
        assert!((vp.aspect() - 16.0 / 9.0).abs() < 1e-12);
    }
}
