use crate::error::ScanError;
use crate::models::pixel::{ScanBuffer, SourceOrigin};
use crate::models::scan_result::ScanReport;
use crate::services::decoder::Decoder;
use chrono::Utc;
use std::time::Instant;

/// Run one decode attempt against `buffer` and time it.
///
/// Decoder errors come back untouched inside [`ScanError::Decode`]; deciding
/// what a failure means is left to the caller.
pub fn scan_once<D: Decoder + ?Sized>(
    decoder: &mut D,
    buffer: &ScanBuffer,
    origin: SourceOrigin,
) -> Result<ScanReport, ScanError> {
    let start = Instant::now();
    let result = decoder.scan(buffer);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(origin = %origin, "Scanning finishes in {} ms", elapsed_ms);

    let value = result?;
    Ok(ScanReport {
        value,
        origin,
        elapsed_ms,
        scanned_at: Utc::now(),
    })
}
