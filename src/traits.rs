//! Core traits and types for the capture platform abstraction.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum capture width requested by [`Constraints::for_device`].
pub const MIN_WIDTH: u32 = 600;
/// Maximum capture width requested by [`Constraints::for_device`].
pub const MAX_WIDTH: u32 = 800;
/// Minimum width/height ratio requested by [`Constraints::for_device`].
pub const MIN_ASPECT_RATIO: f64 = 1.6;

/// Opaque platform device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create an identifier from the platform's raw id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which physical camera to prefer on devices with several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear-facing camera.
    #[default]
    Environment,
    /// Front-facing camera.
    User,
}

impl FacingMode {
    /// Platform string for this facing mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown facing mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown facing mode '{0}' (expected 'environment' or 'user')")]
pub struct ParseFacingModeError(String);

impl FromStr for FacingMode {
    type Err = ParseFacingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environment" => Ok(Self::Environment),
            "user" => Ok(Self::User),
            other => Err(ParseFacingModeError(other.to_owned())),
        }
    }
}

/// Kind of device reported by enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Camera or other video source.
    VideoInput,
    /// Microphone.
    AudioInput,
    /// Speaker or headphones.
    AudioOutput,
    /// Video sink (e.g. a V4L2 output node).
    VideoOutput,
    /// Anything the platform reports that fits none of the above.
    Other,
}

impl DeviceKind {
    /// Platform string for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VideoInput => "videoinput",
            Self::AudioInput => "audioinput",
            Self::AudioOutput => "audiooutput",
            Self::VideoOutput => "videooutput",
            Self::Other => "other",
        }
    }
}

/// A device as reported by [`MediaPlatform::enumerate_devices`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Device kind.
    pub kind: DeviceKind,
    /// Platform device identifier.
    pub device_id: DeviceId,
    /// Raw label; empty when the platform withholds it.
    pub label: String,
}

impl DeviceDescriptor {
    /// Create a new descriptor.
    pub fn new<I, L>(kind: DeviceKind, device_id: I, label: L) -> Self
    where
        I: Into<DeviceId>,
        L: Into<String>,
    {
        Self {
            kind,
            device_id: device_id.into(),
            label: label.into(),
        }
    }
}

/// Hard requirements for a capture session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSet {
    /// Exact device to open.
    pub source_id: DeviceId,
    /// Smallest acceptable width in pixels.
    pub min_width: u32,
    /// Largest acceptable width in pixels.
    pub max_width: u32,
    /// Smallest acceptable width/height ratio.
    pub min_aspect_ratio: f64,
}

impl ConstraintSet {
    /// Whether a negotiated resolution meets every bound.
    pub fn is_satisfied_by(&self, width: u32, height: u32) -> bool {
        (self.min_width..=self.max_width).contains(&width) && self.aspect_ok(width, height)
    }

    /// Widest resolution that meets the bounds: maximum width, tallest
    /// height still honoring the aspect ratio.
    pub fn preferred_resolution(&self) -> (u32, u32) {
        let width = self.max_width;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut height = (f64::from(width) / self.min_aspect_ratio).round() as u32;
        if height > 1 && !self.aspect_ok(width, height) {
            height -= 1;
        }
        (width, height.max(1))
    }

    fn aspect_ok(&self, width: u32, height: u32) -> bool {
        height > 0 && f64::from(width) / f64::from(height) >= self.min_aspect_ratio
    }
}

/// Video part of a capture request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    /// Soft facing-mode preference.
    pub facing_mode: FacingMode,
    /// Hard requirements, absent for a permission-priming request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<ConstraintSet>,
    /// Fallback requirement sets, absent for a permission-priming request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<Vec<ConstraintSet>>,
}

/// A capture request handed to [`MediaPlatform::get_user_media`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraints {
    /// Whether audio is requested.
    pub audio: bool,
    /// Video requirements.
    pub video: VideoConstraints,
}

impl Constraints {
    /// Request for one specific device: 600-800 px wide, aspect ratio of at
    /// least 1.6, no fallbacks, no audio.
    pub fn for_device(source_id: DeviceId, facing_mode: FacingMode) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                facing_mode,
                mandatory: Some(ConstraintSet {
                    source_id,
                    min_width: MIN_WIDTH,
                    max_width: MAX_WIDTH,
                    min_aspect_ratio: MIN_ASPECT_RATIO,
                }),
                optional: Some(Vec::new()),
            },
        }
    }

    /// Request carrying only the facing mode, used to obtain permission.
    pub const fn priming(facing_mode: FacingMode) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                facing_mode,
                mandatory: None,
                optional: None,
            },
        }
    }
}

/// Settings negotiated for a live video track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSettings {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// Platform failures that may carry a classification name
/// (`NotAllowedError`, `NotFoundError`, ...).
pub trait ErrorName {
    /// Classification of this failure, or `None` when the platform gave none.
    fn error_name(&self) -> Option<&str>;
}

/// One live video track of a capture session.
pub trait VideoTrack {
    /// Human-readable track label.
    fn label(&self) -> &str;

    /// Settings the platform negotiated for this track.
    fn settings(&self) -> TrackSettings;

    /// Whether the track still holds the device.
    fn is_live(&self) -> bool;

    /// Release the track. Stopping a stopped track does nothing.
    fn stop(&mut self);
}

/// An active capture session returned by [`MediaPlatform::get_user_media`].
pub trait CaptureSession {
    /// Track type held by the session.
    type Track: VideoTrack;

    /// Video tracks of this session.
    fn video_tracks(&self) -> &[Self::Track];

    /// Mutable access to the video tracks, e.g. to stop them.
    fn video_tracks_mut(&mut self) -> &mut [Self::Track];
}

/// Host media-capture API.
pub trait MediaPlatform {
    /// Session type produced by [`Self::get_user_media`].
    type Session: CaptureSession;
    /// Error type reported by platform calls.
    type Error: std::error::Error + ErrorName + 'static;

    /// Request a capture session satisfying `constraints`.
    fn get_user_media(
        &self,
        constraints: &Constraints,
    ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send;

    /// List every media device the platform knows about.
    fn enumerate_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, Self::Error>> + Send;
}

/// Stop every video track of `session`.
pub fn stop_video_tracks<S: CaptureSession>(session: &mut S) {
    for track in session.video_tracks_mut() {
        track.stop();
    }
}
