use crate::error::ScanError;
use crate::models::config::CaptureConfig;
use crate::models::scan_result::{ScanReport, SelfTestReport};
use crate::services::capture_loop::CaptureHandle;
use crate::services::decoder::Decoder;
use crate::services::frame_source::FrameSource;
use crate::services::pipeline::{Pipeline, PipelineStage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scanner state shared by every command
pub struct ScannerState<D: Decoder> {
    pub(crate) pipeline: Arc<Mutex<Pipeline<D>>>,
    pub(crate) camera: Mutex<Option<CaptureHandle>>,
    pub(crate) capture: CaptureConfig,
}

impl<D: Decoder> ScannerState<D> {
    pub fn new(pipeline: Pipeline<D>) -> Self {
        let capture = pipeline.capture_config().clone();
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            camera: Mutex::new(None),
            capture,
        }
    }

    pub fn pipeline(&self) -> Arc<Mutex<Pipeline<D>>> {
        Arc::clone(&self.pipeline)
    }
}

/// Log a failed action and turn it into the message shown to the user
pub(crate) fn report_failure<T>(action: &str, result: Result<T, ScanError>) -> Result<T, String> {
    result.map_err(|e| {
        tracing::error!(action, error = %e, "Action failed");
        e.to_string()
    })
}

/// Current startup stage of the pipeline
pub async fn pipeline_stage<D: Decoder>(state: &ScannerState<D>) -> PipelineStage {
    state.pipeline.lock().await.stage().clone()
}

/// Render a ground-truth code, scan it and report whether both match
pub async fn generate_and_self_test<D: Decoder>(state: &ScannerState<D>) -> Result<SelfTestReport, String> {
    let result = state.pipeline.lock().await.generate_and_self_test();
    report_failure("generate", result)
}

/// Scan an image file selected by path
pub async fn scan_image_file<D: Decoder>(state: &ScannerState<D>, path: PathBuf) -> Result<ScanReport, String> {
    scan(state, "scan file", FrameSource::Static(path)).await
}

/// Scan the raw bytes of an uploaded image
pub async fn scan_uploaded_file<D: Decoder>(
    state: &ScannerState<D>,
    name: String,
    bytes: Vec<u8>,
) -> Result<ScanReport, String> {
    scan(state, "scan upload", FrameSource::Upload { name, bytes }).await
}

/// Scan an uploaded image given as base64 or a `data:` URL
pub async fn scan_uploaded_base64<D: Decoder>(
    state: &ScannerState<D>,
    name: String,
    data: String,
) -> Result<ScanReport, String> {
    let source = report_failure("scan upload", FrameSource::upload_from_base64(name, &data))?;
    scan(state, "scan upload", source).await
}

async fn scan<D: Decoder>(
    state: &ScannerState<D>,
    action: &str,
    source: FrameSource,
) -> Result<ScanReport, String> {
    let result = state.pipeline.lock().await.scan_source(source).await;
    if let Ok(report) = &result {
        tracing::info!(origin = %report.origin, "Recognition result: {}", report.value);
    }
    report_failure(action, result)
}
