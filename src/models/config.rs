use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Reference asset locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub template_dir: PathBuf,
    pub template_count: usize,
    pub template_extension: String,
    pub alphabet_path: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            template_dir: PathBuf::from("glyph_templates"),
            template_count: 4,
            template_extension: "jpg".to_string(),
            alphabet_path: PathBuf::from("alphabet/alphabet2.jpg"),
        }
    }
}

/// What the capture loop does after the decoder rejects a frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Stop the camera and report the failure
    #[default]
    Stop,
    /// Keep scanning until a frame decodes or the loop is cancelled
    Continue,
}

/// Camera capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub min_video_width: u32,
    pub min_video_height: u32,
    pub on_decode_error: DecodeErrorPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_width: 350,
            frame_height: 350,
            fps: 60,
            min_video_width: 720,
            min_video_height: 720,
            on_decode_error: DecodeErrorPolicy::Stop,
        }
    }
}

impl CaptureConfig {
    /// Pacing delay between two capture attempts
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Structured payload handed to the decoder without interpretation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OpaqueConfig(pub serde_json::Value);

impl Default for OpaqueConfig {
    fn default() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

impl OpaqueConfig {
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub decoder: OpaqueConfig,
    #[serde(default)]
    pub alphabet: OpaqueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Image scanned once right after loading completes
    #[serde(default)]
    pub startup_scan: Option<PathBuf>,
}
