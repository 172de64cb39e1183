use crate::error::ScanError;
use crate::models::pixel::ScanBuffer;
use crate::models::reference_set::ReferenceSet;
use crate::services::decoder::Decoder;
use crate::services::frame_source;

/// Feeds the reference templates to the decoder one at a time, in index order.
///
/// The cursor starts at 1 and only advances after the decoder accepted the
/// template at that index; a failure leaves it pointing at the failed index.
pub struct TemplateLoader<'a> {
    set: &'a ReferenceSet,
    cursor: usize,
}

impl<'a> TemplateLoader<'a> {
    pub fn new(set: &'a ReferenceSet) -> Self {
        Self { set, cursor: 1 }
    }

    /// Index of the next template to load
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of templates the decoder has accepted
    pub fn loaded(&self) -> usize {
        self.cursor - 1
    }

    /// Load every remaining template, each awaited before the next starts
    pub async fn load_all<D: Decoder + ?Sized>(
        &mut self,
        decoder: &mut D,
        buffer: &mut ScanBuffer,
    ) -> Result<usize, ScanError> {
        let set = self.set;
        while let Some(template) = set.templates().get(self.cursor - 1) {
            let pixels = frame_source::acquire_path(&template.path).await.map_err(|e| {
                tracing::error!(index = template.index, error = %e, "Template failed to load");
                e
            })?;

            buffer.draw_source(&pixels);
            decoder.ingest_template(buffer).map_err(|e| {
                tracing::error!(index = template.index, error = %e, "Decoder rejected template");
                ScanError::from(e)
            })?;

            tracing::debug!(
                index = template.index,
                width = buffer.width(),
                height = buffer.height(),
                "Template ingested"
            );
            self.cursor += 1;
        }

        tracing::info!(count = self.loaded(), "Template loading completes");
        Ok(self.loaded())
    }
}
