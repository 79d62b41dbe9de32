//! Capture error types and platform error translation.

use crate::traits::ErrorName;

/// Classification names understood across platforms.
pub mod names {
    /// The user or the system refused access to the device.
    pub const NOT_ALLOWED: &str = "NotAllowedError";
    /// No device matches the request.
    pub const NOT_FOUND: &str = "NotFoundError";
    /// The device exists but is held by something else.
    pub const NOT_READABLE: &str = "NotReadableError";
    /// The device cannot satisfy the hard constraints.
    pub const OVERCONSTRAINED: &str = "OverconstrainedError";
    /// The request asks for something the platform cannot provide at all.
    pub const NOT_SUPPORTED: &str = "NotSupportedError";
}

/// The platform denied or failed to provide capture access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot access video stream ({kind}).")]
pub struct MediaError {
    kind: String,
}

impl MediaError {
    /// Wrap a platform classification string.
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self { kind: kind.into() }
    }

    /// The platform's classification, verbatim.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// Error type for camera operations over a platform whose errors are `E`.
#[derive(Debug, thiserror::Error)]
pub enum CameraError<E> {
    /// Classified platform failure.
    #[error(transparent)]
    Media(#[from] MediaError),
    /// Unclassified platform failure, passed through unchanged.
    #[error(transparent)]
    Platform(E),
}

impl<E> CameraError<E> {
    /// The classified failure, if this is one.
    pub const fn as_media(&self) -> Option<&MediaError> {
        match self {
            Self::Media(err) => Some(err),
            Self::Platform(_) => None,
        }
    }
}

/// Result type for camera operations.
pub type Result<T, E> = std::result::Result<T, CameraError<E>>;

/// Re-raise a classified platform failure as [`MediaError`]; anything else
/// passes through untouched.
pub fn translate<T, E: ErrorName>(result: std::result::Result<T, E>) -> Result<T, E> {
    result.map_err(|err| match err.error_name() {
        Some(name) => CameraError::Media(MediaError::new(name)),
        None => CameraError::Platform(err),
    })
}
