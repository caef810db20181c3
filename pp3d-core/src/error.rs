/// Error types for invalid camera and projection configurations.
///
/// Culling and missed picks are not errors: those come back as `None`.
use thiserror::Error;

/// A camera state that would leave the basis undefined.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraError {
    /// The forward vector is zero or parallel to world up, so `left` collapses.
    #[error("forward direction is degenerate (zero or parallel to world up)")]
    DegenerateDirection,
    /// `look_at` was given the camera's own location.
    #[error("look-at target coincides with the camera location")]
    ZeroLengthLookAt,
    /// A NaN or infinite component was supplied.
    #[error("camera input contains a non-finite component")]
    NonFiniteInput,
}

/// A projection that could not be built or inverted.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    #[error("vertical field of view must be inside (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f64),
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f64),
    #[error("invalid clip range: near = {near}, far = {far}")]
    InvalidClipRange { near: f64, far: f64 },
    #[error("orthographic extent must be positive and finite, got {0}")]
    InvalidExtent(f64),
    #[error("pick length must be positive and finite, got {0}")]
    InvalidPickLength(f64),
    #[error("projection matrix is not invertible")]
    NotInvertible,
    #[error("viewport must have a non-zero size, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
}

/// Failure while turning a configuration file into live camera/projection state.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("projection: {0}")]
    Projection(#[from] ProjectionError),
    #[error("camera: {0}")]
    Camera(#[from] CameraError),
}
