//! Cam-Access: camera discovery and activation over a pluggable media platform
//!
//! This library lists the video capture devices a platform exposes, opens
//! constrained capture sessions on them, and translates platform failures
//! into [`MediaError`]. The platform is injected through the
//! [`MediaPlatform`] trait; [`V4l2Platform`] drives real V4L2 hardware.

pub mod camera;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod label;
pub mod traits;

#[cfg(test)]
pub mod mock;

pub use camera::Camera;
pub use device::{FourCC, V4l2Error, V4l2Platform};
pub use discovery::get_cameras;
pub use error::{CameraError, MediaError};
pub use label::camera_name;
pub use traits::{
    CaptureSession, Constraints, DeviceDescriptor, DeviceId, DeviceKind, ErrorName, FacingMode,
    MediaPlatform, TrackSettings, VideoTrack,
};
