//! Mock platform implementation for testing without hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{
    CaptureSession, Constraints, DeviceDescriptor, ErrorName, MediaPlatform, TrackSettings,
    VideoTrack,
};

/// Mock platform error with an optional classification name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MockError {
    name: Option<String>,
    message: String,
}

impl MockError {
    /// Error carrying a classification name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            message: format!("{name}: mock failure"),
        }
    }

    /// Error without a classification name.
    pub fn unnamed(message: &str) -> Self {
        Self {
            name: None,
            message: message.to_owned(),
        }
    }
}

impl ErrorName for MockError {
    fn error_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Default)]
struct State {
    requests: Vec<Constraints>,
    enumerate_calls: usize,
    tracks: Vec<Arc<AtomicBool>>,
}

/// Mock platform for testing without hardware.
#[derive(Default)]
pub struct MockPlatform {
    devices: Vec<DeviceDescriptor>,
    media_failure: Option<MockError>,
    enumerate_failure: Option<MockError>,
    settings: TrackSettings,
    state: Mutex<State>,
}

impl MockPlatform {
    /// Create a mock platform with no devices.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: TrackSettings {
                width: 800,
                height: 500,
            },
            ..Self::default()
        }
    }

    /// Set the devices reported by enumeration.
    #[must_use]
    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    /// Fail every `get_user_media` call with `err`.
    #[must_use]
    pub fn failing_media(mut self, err: MockError) -> Self {
        self.media_failure = Some(err);
        self
    }

    /// Fail every `enumerate_devices` call with `err`.
    #[must_use]
    pub fn failing_enumeration(mut self, err: MockError) -> Self {
        self.enumerate_failure = Some(err);
        self
    }

    /// Every constraint object passed to `get_user_media`, in order.
    pub fn requests(&self) -> Vec<Constraints> {
        self.state().requests.clone()
    }

    /// Number of `enumerate_devices` calls.
    pub fn enumerate_calls(&self) -> usize {
        self.state().enumerate_calls
    }

    /// Number of tracks handed out that have not been stopped.
    pub fn live_tracks(&self) -> usize {
        self.state()
            .tracks
            .iter()
            .filter(|live| live.load(Ordering::SeqCst))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MediaPlatform for MockPlatform {
    type Session = MockSession;
    type Error = MockError;

    async fn get_user_media(&self, constraints: &Constraints) -> Result<MockSession, MockError> {
        let mut state = self.state();
        state.requests.push(constraints.clone());

        if let Some(err) = &self.media_failure {
            return Err(err.clone());
        }

        let live = Arc::new(AtomicBool::new(true));
        state.tracks.push(Arc::clone(&live));

        let label = constraints
            .video
            .mandatory
            .as_ref()
            .map_or_else(|| "Mock Camera".to_owned(), |set| set.source_id.to_string());

        Ok(MockSession {
            tracks: vec![MockTrack {
                label,
                settings: self.settings,
                live,
            }],
        })
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, MockError> {
        self.state().enumerate_calls += 1;

        match &self.enumerate_failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.devices.clone()),
        }
    }
}

/// Mock capture session holding one video track.
#[derive(Debug)]
pub struct MockSession {
    tracks: Vec<MockTrack>,
}

impl CaptureSession for MockSession {
    type Track = MockTrack;

    fn video_tracks(&self) -> &[MockTrack] {
        &self.tracks
    }

    fn video_tracks_mut(&mut self) -> &mut [MockTrack] {
        &mut self.tracks
    }
}

/// Mock video track whose liveness the platform can observe.
#[derive(Debug)]
pub struct MockTrack {
    label: String,
    settings: TrackSettings,
    live: Arc<AtomicBool>,
}

impl VideoTrack for MockTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DeviceId, DeviceKind, FacingMode};

    #[tokio::test]
    async fn test_mock_records_requests() {
        let platform = MockPlatform::new();
        let constraints = Constraints::for_device(DeviceId::new("cam-0"), FacingMode::User);

        let session = platform
            .get_user_media(&constraints)
            .await
            .expect("get_user_media should succeed");

        assert_eq!(platform.requests(), vec![constraints]);
        assert_eq!(session.video_tracks().len(), 1);
        assert_eq!(session.video_tracks()[0].label(), "cam-0");
        assert_eq!(platform.live_tracks(), 1);
    }

    #[tokio::test]
    async fn test_mock_track_stop_is_observed() {
        let platform = MockPlatform::new();
        let mut session = platform
            .get_user_media(&Constraints::priming(FacingMode::Environment))
            .await
            .expect("get_user_media should succeed");

        session.video_tracks_mut()[0].stop();
        assert!(!session.video_tracks()[0].is_live());
        assert_eq!(platform.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_mock_enumeration() {
        let devices = vec![DeviceDescriptor::new(DeviceKind::VideoInput, "a", "A")];
        let platform = MockPlatform::new().with_devices(devices.clone());

        let listed = platform
            .enumerate_devices()
            .await
            .expect("enumerate should succeed");
        assert_eq!(listed, devices);
        assert_eq!(platform.enumerate_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let platform = MockPlatform::new()
            .failing_media(MockError::named("NotAllowedError"))
            .failing_enumeration(MockError::unnamed("gone"));

        let err = platform
            .get_user_media(&Constraints::priming(FacingMode::User))
            .await
            .expect_err("media should fail");
        assert_eq!(err.error_name(), Some("NotAllowedError"));

        let err = platform
            .enumerate_devices()
            .await
            .expect_err("enumeration should fail");
        assert_eq!(err.error_name(), None);
        assert_eq!(platform.live_tracks(), 0);
    }
}
