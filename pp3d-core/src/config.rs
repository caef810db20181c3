/// Serde configuration for the projection, the initial camera and the viewer host.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{CameraError, ConfigError, ProjectionError};
use crate::projection::{Projection, ProjectionMode};
use crate::viewport::Viewport;

pub const DEFAULT_FOV: f64 = 60.0;
pub const DEFAULT_NEAR: f64 = 0.1;
pub const DEFAULT_FAR: f64 = 10_000.0;
pub const DEFAULT_ORTHOGRAPHIC_TOP: f64 = 1000.0;

/// Lens parameters. The aspect ratio always comes from the viewport at build time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProjectionConfig {
    Perspective {
        /// Vertical field of view in degrees
        #[serde(default = "default_fov")]
        fov: f64,
        #[serde(default = "default_near")]
        near: f64,
        #[serde(default = "default_far")]
        far: f64,
    },
    Orthographic {
        /// Half the visible height in world units
        #[serde(default = "default_top")]
        top: f64,
        #[serde(default = "default_near")]
        near: f64,
        #[serde(default = "default_far")]
        far: f64,
    },
}

fn default_fov() -> f64 {
    DEFAULT_FOV
}

fn default_near() -> f64 {
    DEFAULT_NEAR
}

fn default_far() -> f64 {
    DEFAULT_FAR
}

fn default_top() -> f64 {
    DEFAULT_ORTHOGRAPHIC_TOP
}

impl ProjectionConfig {
    pub fn default_for(mode: ProjectionMode) -> Self {
        match mode {
            ProjectionMode::Perspective => ProjectionConfig::Perspective {
                fov: DEFAULT_FOV,
                near: DEFAULT_NEAR,
                far: DEFAULT_FAR,
            },
            ProjectionMode::Orthographic => ProjectionConfig::Orthographic {
                top: DEFAULT_ORTHOGRAPHIC_TOP,
                near: DEFAULT_NEAR,
                far: DEFAULT_FAR,
            },
        }
    }

    pub fn mode(&self) -> ProjectionMode {
        match self {
            ProjectionConfig::Perspective { .. } => ProjectionMode::Perspective,
            ProjectionConfig::Orthographic { .. } => ProjectionMode::Orthographic,
        }
    }

    pub fn near(&self) -> f64 {
        match *self {
            ProjectionConfig::Perspective { near, .. } | ProjectionConfig::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f64 {
        match *self {
            ProjectionConfig::Perspective { far, .. } | ProjectionConfig::Orthographic { far, .. } => far,
        }
    }

    /// Switches lens type, keeping the clip range.
    pub fn toggled(&self) -> Self {
        let (near, far) = (self.near(), self.far());
        match self {
            ProjectionConfig::Perspective { .. } => ProjectionConfig::Orthographic {
                top: DEFAULT_ORTHOGRAPHIC_TOP,
                near,
                far,
            },
            ProjectionConfig::Orthographic { .. } => ProjectionConfig::Perspective {
                fov: DEFAULT_FOV,
                near,
                far,
            },
        }
    }

    pub fn build(&self, viewport: Viewport) -> Result<Projection, ProjectionError> {
        Projection::new(*self, viewport)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::default_for(ProjectionMode::Perspective)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub location: [f64; 3],
    pub look_at: [f64; 3],
}

impl CameraConfig {
    pub fn build(&self) -> Result<Camera, CameraError> {
        Camera::looking_at(Point3::from(self.location), &Point3::from(self.look_at))
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 1000.0],
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

/// Settings for the interactive host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub projection: ProjectionConfig,
    pub camera: CameraConfig,
    /// `tracing` filter level: error, warn, info, debug or trace
    pub log_level: String,
    /// World units per key press
    pub move_speed: f64,
    /// Degrees per key press
    pub turn_speed: f64,
}

impl ViewerConfig {
    /// Validates the configuration by building the initial camera and projection.
    pub fn build(&self, viewport: Viewport) -> Result<(Camera, Projection), ConfigError> {
        let camera = self.camera.build()?;
        let projection = self.projection.build(viewport)?;
        Ok((camera, projection))
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            camera: CameraConfig::default(),
            log_level: "info".to_string(),
            move_speed: 25.0,
            turn_speed: 3.0,
        }
    }
}
