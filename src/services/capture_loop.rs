use crate::error::ScanError;
use crate::models::config::{CaptureConfig, DecodeErrorPolicy};
use crate::models::crop::CropRegion;
use crate::models::scan_result::CaptureOutcome;
use crate::services::camera::CaptureSession;
use crate::services::decoder::Decoder;
use crate::services::pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;

/// Requests cancellation of a capture loop
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving side of a [`StopHandle`], checked by the loop every iteration
#[derive(Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop has been requested. Never resolves if every
    /// handle is gone without requesting it.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

/// Continuous camera scanning.
///
/// Each iteration grabs the current frame, crops its center into the frame
/// buffer and scans it, then awaits the pacing delay so other tasks (and the
/// stop request) get to run before the next frame.
#[derive(Debug, Clone, Copy)]
pub struct CaptureLoop {
    frame_width: u32,
    frame_height: u32,
    frame_interval: Duration,
    policy: DecodeErrorPolicy,
}

impl CaptureLoop {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            frame_interval: config.frame_interval(),
            policy: config.on_decode_error,
        }
    }

    /// Run until a frame decodes, a terminal error occurs or `stop` fires.
    ///
    /// The session is stopped on every exit path.
    pub async fn run<D: Decoder>(
        &self,
        pipeline: Arc<Mutex<Pipeline<D>>>,
        mut session: CaptureSession,
        mut stop: StopSignal,
    ) -> Result<CaptureOutcome, ScanError> {
        let result = self.drive(&pipeline, &mut session, &mut stop).await;
        session.stop();

        match &result {
            Ok(CaptureOutcome::Decoded { report, attempts }) => {
                tracing::info!(attempts, "Recognition result: {}", report.value)
            }
            Ok(CaptureOutcome::Cancelled { attempts }) => {
                tracing::info!(attempts, "Streaming cancelled")
            }
            Err(e) => tracing::error!(error = %e, "Streaming stopped on error"),
        }
        result
    }

    /// Spawn [`CaptureLoop::run`] as its own task
    pub fn spawn<D: Decoder>(
        self,
        pipeline: Arc<Mutex<Pipeline<D>>>,
        session: CaptureSession,
    ) -> CaptureHandle {
        let (stop, signal) = stop_channel();
        let (outcome_tx, outcome) = watch::channel(None);
        tokio::spawn(async move {
            let result = self.run(pipeline, session, signal).await;
            outcome_tx.send_replace(Some(result));
        });
        CaptureHandle { stop, outcome }
    }

    async fn drive<D: Decoder>(
        &self,
        pipeline: &Mutex<Pipeline<D>>,
        session: &mut CaptureSession,
        stop: &mut StopSignal,
    ) -> Result<CaptureOutcome, ScanError> {
        let metadata = tokio::select! {
            metadata = session.wait_for_metadata() => metadata?,
            _ = stop.stopped() => return Ok(CaptureOutcome::Cancelled { attempts: 0 }),
        };

        let crop = CropRegion::centered(
            metadata.width,
            metadata.height,
            self.frame_width,
            self.frame_height,
        );
        tracing::info!(
            video_width = metadata.width,
            video_height = metadata.height,
            sx = crop.x,
            sy = crop.y,
            "Start streaming"
        );

        let mut attempts = 0u32;
        loop {
            if stop.is_stopped() {
                return Ok(CaptureOutcome::Cancelled { attempts });
            }

            if let Some(frame) = session.grab_frame()? {
                attempts += 1;
                let result = pipeline.lock().await.scan_frame(&frame, crop);

                match result {
                    Ok(report) => return Ok(CaptureOutcome::Decoded { report, attempts }),
                    Err(e) if e.is_decode() && self.policy == DecodeErrorPolicy::Continue => {
                        tracing::debug!(attempt = attempts, error = %e, "Frame not recognized");
                    }
                    Err(e) => return Err(e),
                }
            }

            tokio::select! {
                _ = sleep(self.frame_interval) => {}
                _ = stop.stopped() => return Ok(CaptureOutcome::Cancelled { attempts }),
            }
        }
    }
}

/// Running capture task plus the means to cancel it.
///
/// Clones refer to the same task: any of them can stop it and all of them
/// observe the same outcome.
#[derive(Clone)]
pub struct CaptureHandle {
    stop: StopHandle,
    outcome: watch::Receiver<Option<Result<CaptureOutcome, ScanError>>>,
}

impl CaptureHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some() || self.outcome.has_changed().is_err()
    }

    /// Wait for the loop to end and return its outcome
    pub async fn join(&self) -> Result<CaptureOutcome, ScanError> {
        let mut outcome = self.outcome.clone();
        let finished = match outcome.wait_for(Option::is_some).await {
            Ok(ready) => (*ready).clone(),
            Err(_) => None,
        };

        // The task only goes away without publishing if it panicked
        finished.unwrap_or_else(|| {
            Err(ScanError::Sequence(
                "capture task ended without reporting an outcome".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::models::config::AppConfig;
    use crate::models::device::VideoConstraints;
    use crate::models::pixel::ScanBuffer;
    use crate::services::camera::ReplayDevice;
    use crate::services::decoder::testing::RecordingDecoder;
    use crate::test_support::{camera_frame, temp_dir, write_reference_assets};
    use std::path::Path;

    /// Accepts every asset, then panics on the first scan
    struct CrashingDecoder;

    impl Decoder for CrashingDecoder {
        fn configure(&mut self, _config_json: &str) -> Result<(), DecodeError> {
            Ok(())
        }

        fn ingest_template(&mut self, _buffer: &ScanBuffer) -> Result<(), DecodeError> {
            Ok(())
        }

        fn ingest_alphabet(&mut self, _buffer: &ScanBuffer, _params_json: &str) -> Result<(), DecodeError> {
            Ok(())
        }

        fn scan(&mut self, _buffer: &ScanBuffer) -> Result<String, DecodeError> {
            panic!("decoder crashed mid-scan");
        }

        fn generate(&mut self, _buffer: &mut ScanBuffer) -> Result<String, DecodeError> {
            Err(DecodeError::new("not supported"))
        }
    }

    async fn shared_pipeline(dir: &Path, ready: bool) -> Arc<Mutex<Pipeline<RecordingDecoder>>> {
        let config = AppConfig {
            assets: write_reference_assets(dir, 4),
            ..AppConfig::default()
        };
        let mut pipeline = Pipeline::new(RecordingDecoder::new(), &config).unwrap();
        if ready {
            pipeline.initialize().await.unwrap();
        }
        Arc::new(Mutex::new(pipeline))
    }

    fn capture_loop(policy: DecodeErrorPolicy) -> CaptureLoop {
        CaptureLoop::new(&CaptureConfig {
            fps: 200,
            on_decode_error: policy,
            ..CaptureConfig::default()
        })
    }

    fn open(device: &ReplayDevice) -> CaptureSession {
        CaptureSession::open(device, &VideoConstraints::default()).unwrap()
    }

    #[tokio::test]
    async fn test_success_stops_camera_and_returns_result() {
        let dir = temp_dir("loop-success");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, Some("A1B2"))]).with_tracks(2);

        let (_handle, signal) = stop_channel();
        let outcome = capture_loop(DecodeErrorPolicy::Stop)
            .run(pipeline, open(&device), signal)
            .await
            .unwrap();

        assert_eq!(outcome.report().map(|r| r.value.as_str()), Some("A1B2"));
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(device.grab_count(), 1);
        assert_eq!(device.issued_tracks().len(), 2);
        assert!(device.issued_tracks().iter().all(|t| t.stop_count() == 1));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_decode_failure_stops_on_first_error() {
        let dir = temp_dir("loop-first-error");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, None)]);

        let handle = capture_loop(DecodeErrorPolicy::Stop).spawn(pipeline, open(&device));
        let result = handle.join().await;

        assert!(matches!(result, Err(ScanError::Decode(_))));
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        sleep(Duration::from_millis(30)).await;
        assert_eq!(device.grab_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_continue_policy_scans_until_success() {
        let dir = temp_dir("loop-continue");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![
            camera_frame(720, 720, 350, None),
            camera_frame(720, 720, 350, None),
            camera_frame(720, 720, 350, Some("THIRD")),
        ]);

        let (_handle, signal) = stop_channel();
        let outcome = capture_loop(DecodeErrorPolicy::Continue)
            .run(pipeline, open(&device), signal)
            .await
            .unwrap();

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.report().unwrap().value, "THIRD");
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_loop_yields_and_can_be_cancelled() {
        let dir = temp_dir("loop-cancel");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, None)]);

        let handle = capture_loop(DecodeErrorPolicy::Continue).spawn(pipeline, open(&device));

        // Only reachable if the loop hands control back between frames
        sleep(Duration::from_millis(40)).await;
        assert!(device.grab_count() >= 1);
        assert!(!handle.is_finished());

        let remote = handle.stop_handle();
        tokio::spawn(async move { remote.stop() }).await.unwrap();
        let outcome = handle.join().await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Cancelled { .. }));
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        let grabs = device.grab_count();
        sleep(Duration::from_millis(30)).await;
        assert_eq!(device.grab_count(), grabs);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_cancel_before_metadata_never_grabs() {
        let dir = temp_dir("loop-cancel-early");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, Some("X"))]).with_delayed_metadata();
        let stream = device.open_stream(&VideoConstraints::default()).unwrap();
        let _metadata = stream.metadata_sender();
        let session = CaptureSession::from_stream(Box::new(stream));

        let handle = capture_loop(DecodeErrorPolicy::Stop).spawn(pipeline, session);
        sleep(Duration::from_millis(10)).await;
        handle.stop();

        let outcome = handle.join().await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Cancelled { attempts: 0 });
        assert_eq!(device.grab_count(), 0);
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unready_pipeline_is_sequence_error() {
        let dir = temp_dir("loop-unready");
        let pipeline = shared_pipeline(&dir, false).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, Some("X"))]);

        let (_handle, signal) = stop_channel();
        let result = capture_loop(DecodeErrorPolicy::Continue)
            .run(pipeline, open(&device), signal)
            .await;

        assert!(matches!(result, Err(ScanError::Sequence(_))));
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_crashed_task_is_not_reported_as_camera_failure() {
        let dir = temp_dir("loop-crash");
        let config = AppConfig {
            assets: write_reference_assets(&dir, 2),
            ..AppConfig::default()
        };
        let mut pipeline = Pipeline::new(CrashingDecoder, &config).unwrap();
        pipeline.initialize().await.unwrap();
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, None)]);

        let handle = capture_loop(DecodeErrorPolicy::Stop).spawn(Arc::new(Mutex::new(pipeline)), open(&device));
        let result = tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("join should return once the task is gone");

        match result {
            Err(ScanError::Sequence(msg)) => assert!(msg.contains("without reporting an outcome")),
            other => panic!("expected Sequence error, got {:?}", other),
        }
        assert!(handle.is_finished());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_cloned_handles_share_one_outcome() {
        let dir = temp_dir("loop-clone");
        let pipeline = shared_pipeline(&dir, true).await;
        let device = ReplayDevice::new(vec![camera_frame(720, 720, 350, None)]);

        let handle = capture_loop(DecodeErrorPolicy::Continue).spawn(pipeline, open(&device));
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.join().await })
        };

        sleep(Duration::from_millis(20)).await;
        handle.stop();

        let first = handle.join().await.unwrap();
        let second = waiter.await.unwrap().unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, CaptureOutcome::Cancelled { .. }));
        assert_eq!(device.issued_tracks()[0].stop_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_stop_signal_survives_dropped_handle() {
        let (handle, mut signal) = stop_channel();
        drop(handle);

        assert!(!signal.is_stopped());
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.stopped()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let (handle, signal) = stop_channel();
        let other = handle.clone();

        other.stop();
        assert!(handle.is_stopped());
        assert!(signal.is_stopped());
    }
}
