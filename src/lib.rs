pub mod commands;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

pub use commands::scanner::ScannerState;
pub use error::{DecodeError, ScanError};
pub use models::config::AppConfig;
pub use models::scan_result::{CaptureOutcome, ScanReport, SelfTestReport};
pub use services::camera::{CaptureDevice, ReplayDevice, VideoStream};
pub use services::decoder::Decoder;
pub use services::pipeline::{Pipeline, PipelineStage};

use services::config::ConfigManager;

/// Configure the decoder, load templates and alphabet, and hand back the
/// state every command runs against.
pub async fn bootstrap<D: Decoder>(decoder: D, config: &AppConfig) -> Result<ScannerState<D>, ScanError> {
    let mut pipeline = Pipeline::new(decoder, config)?;
    pipeline.initialize().await?;
    Ok(ScannerState::new(pipeline))
}

/// Start the scanner from the config file in the platform config directory
pub async fn run<D: Decoder>(decoder: D) -> Result<ScannerState<D>, ScanError> {
    let config_manager = ConfigManager::new()?;
    run_with(decoder, &config_manager).await
}

/// Start the scanner from an explicit config location
pub async fn run_with<D: Decoder>(decoder: D, config_manager: &ConfigManager) -> Result<ScannerState<D>, ScanError> {
    let config = config_manager.load()?;
    services::logging::init(&config.logging);

    tracing::info!(
        config = %config_manager.config_file_path().display(),
        templates = config.assets.template_count,
        "Starting symcode scanner"
    );

    bootstrap(decoder, &config).await
}
