use crate::error::ScanError;
use crate::models::pixel::{PixelSource, SourceOrigin};
use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};

/// Where the pixels of a one-shot scan come from
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Image file on disk (bundled asset or user-selected path)
    Static(PathBuf),
    /// Raw bytes of an uploaded image file
    Upload { name: String, bytes: Vec<u8> },
}

impl FrameSource {
    /// Build an upload from plain base64 or a `data:` URL
    pub fn upload_from_base64(name: impl Into<String>, data: &str) -> Result<Self, ScanError> {
        let name = name.into();
        let payload = match data.split_once(',') {
            Some((header, body)) if header.starts_with("data:") => body,
            _ => data,
        };

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ScanError::source_load(&name, format!("invalid base64 payload: {}", e)))?;

        Ok(Self::Upload { name, bytes })
    }

    pub fn origin(&self) -> SourceOrigin {
        match self {
            Self::Static(_) => SourceOrigin::Static,
            Self::Upload { .. } => SourceOrigin::Upload,
        }
    }

    /// Name used in logs and error messages
    pub fn name(&self) -> String {
        match self {
            Self::Static(path) => path.display().to_string(),
            Self::Upload { name, .. } => name.clone(),
        }
    }
}

/// Load and decode `source` into RGBA pixels at its natural size.
///
/// Decoding runs on the blocking pool so the scheduler keeps serving other
/// tasks while a large image is decoded.
pub async fn acquire(source: FrameSource) -> Result<PixelSource, ScanError> {
    let origin = source.origin();
    let name = source.name();

    let bytes = match source {
        FrameSource::Static(path) => read_asset(&path).await?,
        FrameSource::Upload { bytes, .. } => bytes,
    };

    let decode_name = name.clone();
    let image = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|decoded| decoded.to_rgba8())
            .map_err(|e| ScanError::source_load(&decode_name, e))
    })
    .await
    .map_err(|e| ScanError::source_load(&name, format!("decode task failed: {}", e)))??;

    tracing::debug!(
        source = %name,
        origin = %origin,
        width = image.width(),
        height = image.height(),
        "Image source decoded"
    );

    Ok(PixelSource::new(origin, image))
}

/// Convenience for loading a bundled asset as a static source
pub async fn acquire_path(path: &Path) -> Result<PixelSource, ScanError> {
    acquire(FrameSource::Static(path.to_path_buf())).await
}

async fn read_asset(path: &Path) -> Result<Vec<u8>, ScanError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ScanError::source_load(path.display().to_string(), e))
}
