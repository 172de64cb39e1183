use crate::error::ScanError;
use crate::models::device::{MediaTrack, VideoConstraints, VideoMetadata};
use image::RgbaImage;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Live video stream handed out by a [`CaptureDevice`]
pub trait VideoStream: Send {
    /// Resolves to `Some` once the stream knows its native dimensions
    fn metadata(&self) -> watch::Receiver<Option<VideoMetadata>>;

    /// Current frame, or `None` when no frame is available yet
    fn current_frame(&mut self) -> Option<RgbaImage>;

    /// Every track obtained with this stream
    fn tracks(&self) -> Vec<MediaTrack>;
}

/// Source of live video streams
pub trait CaptureDevice: Send + Sync {
    /// Ask for a stream honouring `constraints`.
    ///
    /// Permission or availability failures surface as
    /// [`ScanError::DeviceAccess`]; no stream is started in that case.
    fn request_access(&self, constraints: &VideoConstraints) -> Result<Box<dyn VideoStream>, ScanError>;
}

/// Lifecycle of a [`CaptureSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped,
}

/// One lifetime of an active camera stream, from activation to release.
pub struct CaptureSession {
    stream: Option<Box<dyn VideoStream>>,
    metadata: watch::Receiver<Option<VideoMetadata>>,
    tracks: Vec<MediaTrack>,
    state: SessionState,
}

impl CaptureSession {
    /// Request a stream from `device` and wrap it in a running session
    pub fn open(device: &dyn CaptureDevice, constraints: &VideoConstraints) -> Result<Self, ScanError> {
        let stream = device.request_access(constraints)?;
        tracing::info!(
            min_width = constraints.min_width,
            min_height = constraints.min_height,
            "Camera access granted"
        );
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: Box<dyn VideoStream>) -> Self {
        let metadata = stream.metadata();
        let tracks = stream.tracks();
        Self {
            stream: Some(stream),
            metadata,
            tracks,
            state: SessionState::Running,
        }
    }

    /// Suspend until the stream reports its native dimensions
    pub async fn wait_for_metadata(&mut self) -> Result<VideoMetadata, ScanError> {
        let ready = self
            .metadata
            .wait_for(|m| m.is_some())
            .await
            .map_err(|_| ScanError::DeviceAccess("stream closed before reporting metadata".to_string()))?;

        (*ready).ok_or_else(|| ScanError::DeviceAccess("stream metadata missing".to_string()))
    }

    /// Pull the current frame; `Ok(None)` means "nothing yet, try again"
    pub fn grab_frame(&mut self) -> Result<Option<RgbaImage>, ScanError> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.current_frame()),
            None => Err(ScanError::DeviceAccess("capture session already stopped".to_string())),
        }
    }

    /// Release every track and detach the stream.
    ///
    /// Returns `true` if this call released the stream, `false` if the
    /// session was already stopped.
    pub fn stop(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            return false;
        };

        for track in stream.tracks() {
            track.stop();
        }
        drop(stream);
        self.state = SessionState::Stopped;

        tracing::info!(tracks = self.tracks.len(), "Camera stopped");
        true
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.stop() {
            tracing::warn!("Capture session dropped while running; tracks released");
        }
    }
}

/// Capture device that replays a fixed sequence of frames in a loop.
///
/// Useful for recorded footage, demos and tests. Frames are shared between
/// all streams the device hands out.
#[derive(Clone)]
pub struct ReplayDevice {
    frames: Arc<Vec<RgbaImage>>,
    deny: bool,
    delay_metadata: bool,
    tracks_per_stream: usize,
    grabs: Arc<AtomicU32>,
    issued_tracks: Arc<Mutex<Vec<MediaTrack>>>,
}

impl ReplayDevice {
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames: Arc::new(frames),
            deny: false,
            delay_metadata: false,
            tracks_per_stream: 1,
            grabs: Arc::new(AtomicU32::new(0)),
            issued_tracks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Load every decodable image in `dir`, sorted by file name
    pub fn from_dir(dir: &Path) -> Result<Self, ScanError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ScanError::DeviceAccess(format!("Failed to read frame directory {:?}: {}", dir, e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match image::open(&path) {
                Ok(img) => frames.push(img.to_rgba8()),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable frame"),
            }
        }

        if frames.is_empty() {
            return Err(ScanError::DeviceAccess(format!("No frames found in {:?}", dir)));
        }
        Ok(Self::new(frames))
    }

    /// A device whose permission prompt is always declined
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::new(Vec::new())
        }
    }

    /// Streams report metadata only after [`ReplayStream::publish_metadata`]
    pub fn with_delayed_metadata(mut self) -> Self {
        self.delay_metadata = true;
        self
    }

    /// Each stream carries `count` tracks (video plus e.g. audio), at least one
    pub fn with_tracks(mut self, count: usize) -> Self {
        self.tracks_per_stream = count.max(1);
        self
    }

    /// Number of frames handed out across all streams
    pub fn grab_count(&self) -> u32 {
        self.grabs.load(Ordering::SeqCst)
    }

    /// Every track issued so far, for release checks
    pub fn issued_tracks(&self) -> Vec<MediaTrack> {
        self.issued_tracks.lock().clone()
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }

    /// Open a stream with concrete type, bypassing the trait object
    pub fn open_stream(&self, constraints: &VideoConstraints) -> Result<ReplayStream, ScanError> {
        if self.deny {
            return Err(ScanError::DeviceAccess("Permission denied".to_string()));
        }

        let (width, height) = self
            .native_size()
            .ok_or_else(|| ScanError::DeviceAccess("Requested device not found".to_string()))?;

        if !constraints.is_satisfied_by(width, height) {
            return Err(ScanError::DeviceAccess(format!(
                "Device resolution {}x{} does not satisfy minimum {}x{}",
                width, height, constraints.min_width, constraints.min_height
            )));
        }

        let metadata = VideoMetadata { width, height };
        let initial = if self.delay_metadata { None } else { Some(metadata) };
        let (metadata_tx, _) = watch::channel(initial);

        let tracks: Vec<MediaTrack> = {
            let mut issued = self.issued_tracks.lock();
            let first = issued.len();
            let tracks: Vec<_> = (first..first + self.tracks_per_stream)
                .map(|n| MediaTrack::new(format!("replay-track-{}", n)))
                .collect();
            issued.extend(tracks.iter().cloned());
            tracks
        };

        Ok(ReplayStream {
            frames: Arc::clone(&self.frames),
            cursor: 0,
            metadata: Arc::new(metadata_tx),
            native: metadata,
            tracks,
            grabs: Arc::clone(&self.grabs),
        })
    }
}

impl CaptureDevice for ReplayDevice {
    fn request_access(&self, constraints: &VideoConstraints) -> Result<Box<dyn VideoStream>, ScanError> {
        Ok(Box::new(self.open_stream(constraints)?))
    }
}

/// Stream produced by a [`ReplayDevice`]
pub struct ReplayStream {
    frames: Arc<Vec<RgbaImage>>,
    cursor: usize,
    metadata: Arc<watch::Sender<Option<VideoMetadata>>>,
    native: VideoMetadata,
    tracks: Vec<MediaTrack>,
    grabs: Arc<AtomicU32>,
}

impl ReplayStream {
    /// Announce the native dimensions to anyone waiting on metadata
    pub fn publish_metadata(&self) {
        self.metadata.send_replace(Some(self.native));
    }

    /// Sender side of the metadata channel, for publishing from another task
    pub fn metadata_sender(&self) -> Arc<watch::Sender<Option<VideoMetadata>>> {
        Arc::clone(&self.metadata)
    }
}

impl VideoStream for ReplayStream {
    fn metadata(&self) -> watch::Receiver<Option<VideoMetadata>> {
        self.metadata.subscribe()
    }

    fn current_frame(&mut self) -> Option<RgbaImage> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor += 1;
        self.grabs.fetch_add(1, Ordering::SeqCst);
        Some(frame)
    }

    fn tracks(&self) -> Vec<MediaTrack> {
        self.tracks.clone()
    }
}
