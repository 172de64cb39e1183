use crate::error::ScanError;
use crate::models::config::OpaqueConfig;
use crate::models::pixel::ScanBuffer;
use crate::services::decoder::Decoder;
use crate::services::frame_source;
use std::path::Path;

/// Load the alphabet image and hand it to the decoder with its reader parameters.
///
/// Must run after every template has been ingested; [`crate::services::pipeline::Pipeline`]
/// enforces that ordering.
pub async fn load<D: Decoder + ?Sized>(
    decoder: &mut D,
    buffer: &mut ScanBuffer,
    alphabet: &Path,
    params: &OpaqueConfig,
) -> Result<(), ScanError> {
    let params_json = params.to_json_string();

    let pixels = frame_source::acquire_path(alphabet).await.map_err(|e| {
        tracing::error!(path = %alphabet.display(), error = %e, "Alphabet failed to load");
        e
    })?;

    buffer.draw_source(&pixels);
    decoder.ingest_alphabet(buffer, &params_json).map_err(|e| {
        tracing::error!(error = %e, "Decoder rejected alphabet");
        ScanError::from(e)
    })?;

    tracing::info!(
        width = buffer.width(),
        height = buffer.height(),
        "Alphabet loading completes"
    );
    Ok(())
}
