/// PP3D Core Library - Camera, projection and picking math
///
/// This library provides the stateless geometry pipeline of the viewer: camera
/// poses, perspective/orthographic projection, homogeneous frustum clipping, the
/// viewport transform, and ray picking against bounding volumes and gizmo handles.

pub mod bounds;
pub mod camera;
pub mod config;
pub mod error;
pub mod frustum;
pub mod geometry;
pub mod gizmo;
pub mod math;
pub mod picking;
pub mod projection;
pub mod ray;
pub mod scene;
pub mod selection;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use bounds::{BoundingVolume, Intersection, VolumeKind};
pub use camera::{compose_view_transform, Basis, Camera};
pub use config::{CameraConfig, ProjectionConfig, ViewerConfig};
pub use error::{CameraError, ConfigError, ProjectionError};
pub use frustum::{ClipPlane, Frustum};
pub use geometry::{Color, Face, LineSegment, Mesh};
pub use gizmo::{Gizmo, Handle};
pub use picking::{pick_nearest, Hit, Pickable};
pub use projection::{ProjectedFace, Projection, ProjectionMode};
pub use ray::Ray;
pub use scene::{ObjectId, ObjectKind, Scene, SceneObject, WorldGeometry};
pub use selection::{SelectionState, SharedSelection};
pub use transform::Transform;
pub use viewport::Viewport;
