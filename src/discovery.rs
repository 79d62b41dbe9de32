//! Camera discovery.

use tracing::{debug, trace};

use crate::camera::Camera;
use crate::error::{translate, CameraError, Result};
use crate::label::camera_name;
use crate::traits::{stop_video_tracks, Constraints, DeviceKind, FacingMode, MediaPlatform};

/// List the video input devices of `platform` as [`Camera`]s.
///
/// Access is requested once before enumerating, because platforms withhold
/// device labels and ids until the user has granted it. Every camera gets
/// the same `facing_mode`. Cameras come back in the platform's enumeration
/// order; a failure at any step yields no cameras at all.
pub async fn get_cameras<P: MediaPlatform>(
    platform: &P,
    facing_mode: FacingMode,
) -> Result<Vec<Camera<'_, P>>, P::Error> {
    ensure_access(platform, facing_mode).await?;

    let devices = platform
        .enumerate_devices()
        .await
        .map_err(CameraError::Platform)?;

    let cameras: Vec<_> = devices
        .into_iter()
        .filter(|device| {
            let keep = device.kind == DeviceKind::VideoInput;
            if !keep {
                trace!(id = %device.device_id, kind = device.kind.as_str(), "skipping device");
            }
            keep
        })
        .map(|device| {
            let name = camera_name(Some(&device.label));
            Camera::new(platform, device.device_id, name, facing_mode)
        })
        .collect();

    debug!(count = cameras.len(), %facing_mode, "cameras discovered");
    Ok(cameras)
}

/// Open and immediately release a session so the platform grants access.
async fn ensure_access<P: MediaPlatform>(
    platform: &P,
    facing_mode: FacingMode,
) -> Result<(), P::Error> {
    let constraints = Constraints::priming(facing_mode);
    let mut session = translate(platform.get_user_media(&constraints).await)?;
    stop_video_tracks(&mut session);

    debug!(%facing_mode, "camera access granted");
    Ok(())
}
