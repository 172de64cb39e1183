use crate::error::ScanError;
use crate::models::config::{AppConfig, CaptureConfig, OpaqueConfig};
use crate::models::crop::CropRegion;
use crate::models::pixel::{ScanBuffer, SourceOrigin};
use crate::models::reference_set::ReferenceSet;
use crate::models::scan_result::{ScanReport, SelfTestReport};
use crate::services::decoder::Decoder;
use crate::services::frame_source::{self, FrameSource};
use crate::services::template_loader::TemplateLoader;
use crate::services::{alphabet_loader, scan};
use image::RgbaImage;
use serde::Serialize;
use std::path::PathBuf;

/// Where the pipeline is in its startup sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    /// Decoder configured, nothing loaded yet
    Configured,
    TemplatesLoaded { count: usize },
    /// Templates and alphabet loaded; scans are allowed
    Ready,
    /// A loading stage failed; the decoder state is unusable
    Failed { reason: String },
}

/// Scanner state: the decoder, its reference set and the two pixel surfaces.
///
/// Built once at startup. The load buffer receives templates and the
/// alphabet, the frame buffer receives everything that gets scanned.
pub struct Pipeline<D: Decoder> {
    decoder: D,
    reference_set: ReferenceSet,
    alphabet_params: OpaqueConfig,
    load_buffer: ScanBuffer,
    frame_buffer: ScanBuffer,
    capture: CaptureConfig,
    startup_scan: Option<PathBuf>,
    stage: PipelineStage,
}

impl<D: Decoder> Pipeline<D> {
    /// Forward the decoder configuration verbatim and build the reference set
    pub fn new(mut decoder: D, config: &AppConfig) -> Result<Self, ScanError> {
        let reference_set = ReferenceSet::from_config(&config.assets)?;

        decoder
            .configure(&config.decoder.to_json_string())
            .map_err(|e| ScanError::Config(format!("decoder rejected configuration: {}", e)))?;

        Ok(Self {
            decoder,
            reference_set,
            alphabet_params: config.alphabet.clone(),
            load_buffer: ScanBuffer::new(config.capture.frame_width, config.capture.frame_height),
            frame_buffer: ScanBuffer::new(config.capture.frame_width, config.capture.frame_height),
            capture: config.capture.clone(),
            startup_scan: config.startup_scan.clone(),
            stage: PipelineStage::Configured,
        })
    }

    pub fn stage(&self) -> &PipelineStage {
        &self.stage
    }

    pub fn is_ready(&self) -> bool {
        self.stage == PipelineStage::Ready
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn reference_set(&self) -> &ReferenceSet {
        &self.reference_set
    }

    pub fn frame_buffer(&self) -> &ScanBuffer {
        &self.frame_buffer
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture
    }

    /// Templates, then alphabet, then the optional warm-up scan.
    ///
    /// A failing warm-up scan is reported but leaves the pipeline ready.
    pub async fn initialize(&mut self) -> Result<(), ScanError> {
        self.load_templates().await?;
        self.load_alphabet().await?;

        if let Some(path) = self.startup_scan.clone() {
            match self.scan_source(FrameSource::Static(path.clone())).await {
                Ok(report) => tracing::info!(
                    path = %path.display(),
                    value = %report.value,
                    "Recognition result: {}",
                    report.value
                ),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Warm-up scan failed"),
            }
        }
        Ok(())
    }

    pub async fn load_templates(&mut self) -> Result<usize, ScanError> {
        match &self.stage {
            PipelineStage::Configured => {}
            PipelineStage::Failed { reason } => return Err(Self::failed(reason)),
            _ => return Err(ScanError::Sequence("templates are already loaded".to_string())),
        }

        let mut loader = TemplateLoader::new(&self.reference_set);
        match loader.load_all(&mut self.decoder, &mut self.load_buffer).await {
            Ok(count) => {
                self.stage = PipelineStage::TemplatesLoaded { count };
                Ok(count)
            }
            Err(e) => {
                self.stage = PipelineStage::Failed {
                    reason: format!("template {}: {}", loader.cursor(), e),
                };
                Err(e)
            }
        }
    }

    pub async fn load_alphabet(&mut self) -> Result<(), ScanError> {
        match &self.stage {
            PipelineStage::TemplatesLoaded { .. } => {}
            PipelineStage::Failed { reason } => return Err(Self::failed(reason)),
            PipelineStage::Ready => {
                return Err(ScanError::Sequence("alphabet is already loaded".to_string()))
            }
            PipelineStage::Configured => {
                return Err(ScanError::Sequence(
                    "alphabet requested before template loading completed".to_string(),
                ))
            }
        }

        let alphabet = self.reference_set.alphabet().clone();
        match alphabet_loader::load(
            &mut self.decoder,
            &mut self.load_buffer,
            &alphabet,
            &self.alphabet_params,
        )
        .await
        {
            Ok(()) => {
                self.stage = PipelineStage::Ready;
                tracing::info!("Scanner ready");
                Ok(())
            }
            Err(e) => {
                self.stage = PipelineStage::Failed {
                    reason: format!("alphabet: {}", e),
                };
                Err(e)
            }
        }
    }

    /// Scan whatever the frame buffer currently holds
    pub fn scan_once(&mut self, origin: SourceOrigin) -> Result<ScanReport, ScanError> {
        self.require_ready()?;
        scan::scan_once(&mut self.decoder, &self.frame_buffer, origin)
    }

    /// Decode a static or uploaded image at its natural size and scan it
    pub async fn scan_source(&mut self, source: FrameSource) -> Result<ScanReport, ScanError> {
        self.require_ready()?;
        let origin = source.origin();
        let pixels = frame_source::acquire(source).await?;
        self.frame_buffer.draw_source(&pixels);
        scan::scan_once(&mut self.decoder, &self.frame_buffer, origin)
    }

    /// Draw the cropped camera frame and scan it
    pub fn scan_frame(&mut self, frame: &RgbaImage, crop: CropRegion) -> Result<ScanReport, ScanError> {
        self.require_ready()?;
        self.frame_buffer.draw_crop(frame, crop);
        scan::scan_once(&mut self.decoder, &self.frame_buffer, SourceOrigin::Camera)
    }

    /// Render a ground-truth symbol, scan it back and compare
    pub fn generate_and_self_test(&mut self) -> Result<SelfTestReport, ScanError> {
        self.require_ready()?;
        let generated = self.decoder.generate(&mut self.frame_buffer)?;
        tracing::info!(value = %generated, "Generated code");

        let report = scan::scan_once(&mut self.decoder, &self.frame_buffer, SourceOrigin::Static)?;
        let result = SelfTestReport::new(generated, report);
        if result.matched {
            tracing::info!("Generated code is correctly recognized");
        } else {
            tracing::warn!(
                generated = %result.generated,
                recognized = %result.recognized,
                "Generated code is INCORRECTLY recognized"
            );
        }
        Ok(result)
    }

    fn require_ready(&self) -> Result<(), ScanError> {
        match &self.stage {
            PipelineStage::Ready => Ok(()),
            PipelineStage::Failed { reason } => Err(Self::failed(reason)),
            _ => Err(ScanError::Sequence(
                "scan requested before templates and alphabet were loaded".to_string(),
            )),
        }
    }

    fn failed(reason: &str) -> ScanError {
        ScanError::Sequence(format!("pipeline failed during loading ({})", reason))
    }
}
