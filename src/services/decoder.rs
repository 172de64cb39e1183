use crate::error::DecodeError;
use crate::models::pixel::ScanBuffer;

/// Capability surface of the symbol decoding engine.
///
/// The engine itself is a black box: the pipeline only decides *when* each
/// call happens and which pixels it sees. Implementations must accept calls
/// in this order: `configure` once, `ingest_template` for every template,
/// `ingest_alphabet` once, then any number of `scan`/`generate` calls.
pub trait Decoder: Send + 'static {
    /// Receive the decoder configuration as a JSON string, forwarded verbatim
    fn configure(&mut self, config_json: &str) -> Result<(), DecodeError>;

    /// Ingest the template currently drawn in `buffer`
    fn ingest_template(&mut self, buffer: &ScanBuffer) -> Result<(), DecodeError>;

    /// Ingest the alphabet currently drawn in `buffer` with its reader parameters
    fn ingest_alphabet(&mut self, buffer: &ScanBuffer, params_json: &str) -> Result<(), DecodeError>;

    /// Recognize a symbol in `buffer`
    fn scan(&mut self, buffer: &ScanBuffer) -> Result<String, DecodeError>;

    /// Render a ground-truth symbol into `buffer` and return its value
    fn generate(&mut self, buffer: &mut ScanBuffer) -> Result<String, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn configure(&mut self, config_json: &str) -> Result<(), DecodeError> {
        (**self).configure(config_json)
    }

    fn ingest_template(&mut self, buffer: &ScanBuffer) -> Result<(), DecodeError> {
        (**self).ingest_template(buffer)
    }

    fn ingest_alphabet(&mut self, buffer: &ScanBuffer, params_json: &str) -> Result<(), DecodeError> {
        (**self).ingest_alphabet(buffer, params_json)
    }

    fn scan(&mut self, buffer: &ScanBuffer) -> Result<String, DecodeError> {
        (**self).scan(buffer)
    }

    fn generate(&mut self, buffer: &mut ScanBuffer) -> Result<String, DecodeError> {
        (**self).generate(buffer)
    }
}
