use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Minimum video size requested from a capture device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoConstraints {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            min_width: 720,
            min_height: 720,
        }
    }
}

impl VideoConstraints {
    pub fn is_satisfied_by(&self, width: u32, height: u32) -> bool {
        width >= self.min_width && height >= self.min_height
    }
}

/// Native dimensions reported once a stream is ready
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
}

/// Handle to one media track of a live stream.
///
/// Clones share the same stop counter, so whoever observes a track can tell
/// how many times it was released.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    stops: Arc<AtomicUsize>,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_count() > 0
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}
