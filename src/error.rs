use thiserror::Error;

/// Error raised by a decoder collaborator.
///
/// The message is whatever the decoding engine reported; the pipeline never
/// rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every failure the scanning pipeline can surface.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// An image asset (template, alphabet, static file or upload) could not be decoded.
    #[error("failed to load image {source_name}: {reason}")]
    SourceLoad { source_name: String, reason: String },

    /// Camera permission denied, device unavailable or stream lost.
    #[error("camera access failed: {0}")]
    DeviceAccess(String),

    /// The decoder rejected the submitted pixels.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A stage was invoked before its precondition stage completed.
    #[error("pipeline sequence violated: {0}")]
    Sequence(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScanError {
    pub(crate) fn source_load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from the decoder rather than the pipeline.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<ScanError> for String {
    fn from(error: ScanError) -> Self {
        error.to_string()
    }
}
