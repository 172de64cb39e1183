use crate::commands::scanner::{report_failure, ScannerState};
use crate::error::ScanError;
use crate::models::device::VideoConstraints;
use crate::models::scan_result::CaptureOutcome;
use crate::services::camera::{CaptureDevice, CaptureSession};
use crate::services::capture_loop::{CaptureHandle, CaptureLoop};
use crate::services::decoder::Decoder;

/// Open the camera and start scanning its frames in the background.
///
/// Refused before the scanner is ready. Activating while a capture is still
/// running is ignored.
pub async fn activate_camera<D: Decoder>(
    state: &ScannerState<D>,
    device: &dyn CaptureDevice,
) -> Result<(), String> {
    let mut camera = state.camera.lock().await;
    if camera.as_ref().is_some_and(|handle| !handle.is_finished()) {
        tracing::warn!("Camera already active, ignoring activation request");
        return Ok(());
    }

    if !state.pipeline.lock().await.is_ready() {
        return report_failure(
            "activate camera",
            Err(ScanError::Sequence(
                "camera activated before templates and alphabet were loaded".to_string(),
            )),
        );
    }

    let constraints = VideoConstraints {
        min_width: state.capture.min_video_width,
        min_height: state.capture.min_video_height,
    };
    let session = report_failure("activate camera", CaptureSession::open(device, &constraints))?;

    let handle = CaptureLoop::new(&state.capture).spawn(state.pipeline(), session);
    *camera = Some(handle);
    Ok(())
}

/// Cancel the running capture, if any, and wait for it to wind down.
///
/// Returns `None` when no capture was active.
pub async fn stop_camera<D: Decoder>(state: &ScannerState<D>) -> Result<Option<CaptureOutcome>, String> {
    let Some(handle) = state.camera.lock().await.take() else {
        return Ok(None);
    };

    handle.stop();
    report_failure("stop camera", handle.join().await).map(Some)
}

/// Wait for the running capture to decode, fail or be cancelled.
///
/// The capture stays registered while waiting, so it can still be stopped
/// and a second activation is still refused.
pub async fn await_camera_result<D: Decoder>(state: &ScannerState<D>) -> Result<CaptureOutcome, String> {
    let handle = state
        .camera
        .lock()
        .await
        .clone()
        .ok_or_else(|| "Camera is not active".to_string())?;

    let result = handle.join().await;

    let mut camera = state.camera.lock().await;
    if camera.as_ref().is_some_and(CaptureHandle::is_finished) {
        *camera = None;
    }
    drop(camera);

    report_failure("camera scan", result)
}

pub async fn is_camera_active<D: Decoder>(state: &ScannerState<D>) -> bool {
    state
        .camera
        .lock()
        .await
        .as_ref()
        .is_some_and(|handle| !handle.is_finished())
}
