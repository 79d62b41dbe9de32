//! Camera entity owning at most one capture session.

use std::fmt;

use tracing::{debug, info};

use crate::error::{translate, Result};
use crate::traits::{stop_video_tracks, Constraints, DeviceId, FacingMode, MediaPlatform};

/// One capture device reported by the platform.
///
/// Obtained from [`crate::get_cameras`]. The camera borrows the platform it
/// was discovered on and holds at most one active session; dropping the
/// camera stops that session.
pub struct Camera<'p, P: MediaPlatform> {
    platform: &'p P,
    id: DeviceId,
    name: Option<String>,
    facing_mode: FacingMode,
    session: Option<P::Session>,
}

impl<'p, P: MediaPlatform> Camera<'p, P> {
    pub(crate) fn new(
        platform: &'p P,
        id: DeviceId,
        name: Option<String>,
        facing_mode: FacingMode,
    ) -> Self {
        Self {
            platform,
            id,
            name,
            facing_mode,
            session: None,
        }
    }

    /// Platform device identifier.
    pub const fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Cleaned device label, if the platform reported one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Facing mode sent with every capture request.
    pub const fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// Whether a session is currently held.
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any.
    pub const fn session(&self) -> Option<&P::Session> {
        self.session.as_ref()
    }

    /// Open a capture session on this device.
    ///
    /// A session that is already active is stopped first, so the camera never
    /// holds more than one.
    pub async fn start(&mut self) -> Result<&mut P::Session, P::Error> {
        if self.session.is_some() {
            debug!(id = %self.id, "restarting camera, stopping previous session");
            self.stop();
        }

        let constraints = Constraints::for_device(self.id.clone(), self.facing_mode);
        let session = translate(self.platform.get_user_media(&constraints).await)?;

        info!(id = %self.id, facing_mode = %self.facing_mode, "camera started");
        Ok(self.session.insert(session))
    }

    /// Stop every video track and release the session. Does nothing when no
    /// session is active.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        stop_video_tracks(&mut session);
        info!(id = %self.id, "camera stopped");
    }
}

impl<P: MediaPlatform> Drop for Camera<'_, P> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<P: MediaPlatform> fmt::Debug for Camera<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("facing_mode", &self.facing_mode)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
