//! V4L2 platform implementation using the v4l crate.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;
use v4l::capability::Flags;
use v4l::context::{enum_devices, Node};
use v4l::framesize::FrameSizeEnum;
use v4l::video::Capture;
use v4l::Device;

use crate::error::names;
use crate::traits::{
    CaptureSession, ConstraintSet, Constraints, DeviceDescriptor, DeviceKind, ErrorName,
    MediaPlatform, TrackSettings, VideoTrack,
};

/// Pixel format representation (e.g., YUYV, MJPG, RGB3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
    /// MJPEG pixel format (Motion JPEG).
    pub const MJPG: Self = Self::new(b"MJPG");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Error returned when a pixel format code is not four ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pixel format '{0}' is not a four character code")]
pub struct ParseFourCCError(String);

impl FromStr for FourCC {
    type Err = ParseFourCCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseFourCCError(s.to_owned()))?;
        if code.is_ascii() {
            Ok(Self(code))
        } else {
            Err(ParseFourCCError(s.to_owned()))
        }
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Error type for V4L2 platform calls.
#[derive(Debug, thiserror::Error)]
pub enum V4l2Error {
    /// A device ioctl or open failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// Device node path.
        path: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// No video capture node exists.
    #[error("no video capture device found")]
    NoDevice,
    /// The node exists but cannot capture video.
    #[error("{0} is not a video capture device")]
    NotCapture(String),
    /// The request asked for audio.
    #[error("audio capture is not available through V4L2")]
    AudioUnsupported,
    /// The driver settled on a resolution outside the requested bounds.
    #[error("driver negotiated {width}x{height}, outside the requested constraints")]
    Overconstrained {
        /// Negotiated width.
        width: u32,
        /// Negotiated height.
        height: u32,
    },
}

impl V4l2Error {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

impl ErrorName for V4l2Error {
    fn error_name(&self) -> Option<&str> {
        match self {
            Self::Io { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => Some(names::NOT_ALLOWED),
                io::ErrorKind::NotFound => Some(names::NOT_FOUND),
                io::ErrorKind::ResourceBusy => Some(names::NOT_READABLE),
                io::ErrorKind::InvalidInput => Some(names::OVERCONSTRAINED),
                _ => None,
            },
            Self::NoDevice | Self::NotCapture(_) => Some(names::NOT_FOUND),
            Self::AudioUnsupported => Some(names::NOT_SUPPORTED),
            Self::Overconstrained { .. } => Some(names::OVERCONSTRAINED),
        }
    }
}

/// Media platform backed by the V4L2 nodes under `/dev`.
///
/// V4L2 has no notion of facing mode, so it is ignored; a request without a
/// `sourceId` opens the first capture node.
#[derive(Debug, Clone, Copy)]
pub struct V4l2Platform {
    fourcc: FourCC,
}

impl Default for V4l2Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl V4l2Platform {
    /// Create a platform requesting YUYV frames.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fourcc: FourCC::YUYV,
        }
    }

    /// Set the pixel format requested when negotiating a session.
    #[must_use]
    pub const fn with_fourcc(mut self, fourcc: FourCC) -> Self {
        self.fourcc = fourcc;
        self
    }

    /// Pixel format requested when negotiating a session.
    pub const fn fourcc(&self) -> FourCC {
        self.fourcc
    }

    fn open(
        &self,
        path: &Path,
        mandatory: Option<&ConstraintSet>,
    ) -> Result<V4l2Session, V4l2Error> {
        let device = Device::with_path(path).map_err(|err| V4l2Error::io("open", path, err))?;
        let caps = device
            .query_caps()
            .map_err(|err| V4l2Error::io("query capabilities of", path, err))?;

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(V4l2Error::NotCapture(path.display().to_string()));
        }

        let format = match mandatory {
            Some(set) => self.negotiate(&device, path, set)?,
            None => device
                .format()
                .map_err(|err| V4l2Error::io("query format of", path, err))?,
        };

        let fourcc = FourCC::from(format.fourcc);
        debug!(
            path = %path.display(),
            width = format.width,
            height = format.height,
            %fourcc,
            "v4l2 session opened"
        );

        Ok(V4l2Session {
            tracks: vec![V4l2Track {
                label: caps.card,
                settings: TrackSettings {
                    width: format.width,
                    height: format.height,
                },
                fourcc,
                device: Some(device),
            }],
        })
    }

    fn negotiate(
        &self,
        device: &Device,
        path: &Path,
        set: &ConstraintSet,
    ) -> Result<v4l::Format, V4l2Error> {
        let mut fmt = device
            .format()
            .map_err(|err| V4l2Error::io("query format of", path, err))?;

        let sizes: Vec<FrameSizeEnum> = match device.enum_framesizes(self.fourcc.into()) {
            Ok(sizes) => sizes.into_iter().map(|size| size.size).collect(),
            Err(err) => {
                debug!(path = %path.display(), %err, "frame sizes unavailable");
                Vec::new()
            }
        };
        let (width, height) = frame_size_for(&sizes, set);
        fmt.width = width;
        fmt.height = height;
        fmt.fourcc = self.fourcc.into();

        let fmt = device
            .set_format(&fmt)
            .map_err(|err| V4l2Error::io("set format of", path, err))?;

        if set.is_satisfied_by(fmt.width, fmt.height) {
            Ok(fmt)
        } else {
            Err(V4l2Error::Overconstrained {
                width: fmt.width,
                height: fmt.height,
            })
        }
    }
}

/// Resolution to request from a driver advertising `sizes`.
///
/// When every size is discrete, the largest one meeting `set` is chosen.
/// Stepwise or continuous drivers, drivers that list nothing, and discrete
/// lists with no fitting entry get the set's preferred resolution and the
/// driver rounds it.
fn frame_size_for(sizes: &[FrameSizeEnum], set: &ConstraintSet) -> (u32, u32) {
    let discrete: Option<Vec<(u32, u32)>> = sizes
        .iter()
        .map(|size| match size {
            FrameSizeEnum::Discrete(d) => Some((d.width, d.height)),
            FrameSizeEnum::Stepwise(_) => None,
        })
        .collect();

    discrete
        .and_then(|sizes| {
            sizes
                .into_iter()
                .filter(|&(width, height)| set.is_satisfied_by(width, height))
                .max_by_key(|&(width, height)| u64::from(width) * u64::from(height))
        })
        .unwrap_or_else(|| set.preferred_resolution())
}

/// Descriptor for one V4L2 node.
fn inspect(node: &Node) -> Result<DeviceDescriptor, V4l2Error> {
    let path = node.path();
    let device = Device::with_path(path).map_err(|err| V4l2Error::io("open", path, err))?;
    let caps = device
        .query_caps()
        .map_err(|err| V4l2Error::io("query capabilities of", path, err))?;

    let kind = if caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        DeviceKind::VideoInput
    } else if caps.capabilities.contains(Flags::VIDEO_OUTPUT) {
        DeviceKind::VideoOutput
    } else {
        DeviceKind::Other
    };

    let label = node
        .name()
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or(caps.card);

    Ok(DeviceDescriptor::new(
        kind,
        path.to_string_lossy().into_owned(),
        label,
    ))
}

/// `/dev/video*` nodes in index order.
fn nodes() -> Vec<Node> {
    let mut nodes = enum_devices();
    sort_nodes(&mut nodes);
    nodes
}

fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by_key(Node::index);
}

/// Path of the first capture node.
///
/// When no node is usable, the first error met while opening a node is
/// returned, so a permission failure is not reported as a missing device.
fn first_capture<I>(results: I) -> Result<PathBuf, V4l2Error>
where
    I: IntoIterator<Item = Result<DeviceDescriptor, V4l2Error>>,
{
    let mut first_err = None;
    for result in results {
        match result {
            Ok(device) if device.kind == DeviceKind::VideoInput => {
                return Ok(PathBuf::from(device.device_id.as_str()));
            }
            Ok(_) => {}
            Err(err) => {
                debug!(%err, "skipping unreadable node");
                first_err.get_or_insert(err);
            }
        }
    }
    Err(first_err.unwrap_or(V4l2Error::NoDevice))
}

impl MediaPlatform for V4l2Platform {
    type Session = V4l2Session;
    type Error = V4l2Error;

    async fn get_user_media(&self, constraints: &Constraints) -> Result<V4l2Session, V4l2Error> {
        if constraints.audio {
            return Err(V4l2Error::AudioUnsupported);
        }

        let mandatory = constraints.video.mandatory.as_ref();
        let path = match mandatory {
            Some(set) => PathBuf::from(set.source_id.as_str()),
            None => first_capture(nodes().iter().map(inspect))?,
        };

        self.open(&path, mandatory)
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, V4l2Error> {
        Ok(nodes()
            .iter()
            .filter_map(|node| {
                inspect(node)
                    .map_err(|err| debug!(%err, "skipping unreadable node"))
                    .ok()
            })
            .collect())
    }
}

/// Capture session holding one open V4L2 node.
#[derive(Debug)]
pub struct V4l2Session {
    tracks: Vec<V4l2Track>,
}

impl CaptureSession for V4l2Session {
    type Track = V4l2Track;

    fn video_tracks(&self) -> &[V4l2Track] {
        &self.tracks
    }

    fn video_tracks_mut(&mut self) -> &mut [V4l2Track] {
        &mut self.tracks
    }
}

/// Video track owning the device handle until stopped.
pub struct V4l2Track {
    label: String,
    settings: TrackSettings,
    fourcc: FourCC,
    device: Option<Device>,
}

impl V4l2Track {
    /// Negotiated pixel format.
    pub const fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl fmt::Debug for V4l2Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("V4l2Track")
            .field("label", &self.label)
            .field("settings", &self.settings)
            .field("fourcc", &self.fourcc)
            .field("live", &self.is_live())
            .finish()
    }
}

impl VideoTrack for V4l2Track {
    fn label(&self) -> &str {
        &self.label
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn is_live(&self) -> bool {
        self.device.is_some()
    }

    fn stop(&mut self) {
        // Dropping the handle closes the node.
        self.device = None;
    }
}
