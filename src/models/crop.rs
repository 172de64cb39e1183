use serde::{Deserialize, Serialize};

/// Region of a video frame copied into the frame buffer.
///
/// Offsets are signed: a video smaller than the frame yields a negative
/// offset and the uncovered part of the buffer stays cleared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CropRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centered crop of `frame_width` x `frame_height` out of a video frame.
    ///
    /// `sx = (video_width - frame_width) / 2`, `sy` likewise, rounded down.
    pub fn centered(video_width: u32, video_height: u32, frame_width: u32, frame_height: u32) -> Self {
        let sx = (i64::from(video_width) - i64::from(frame_width)).div_euclid(2);
        let sy = (i64::from(video_height) - i64::from(frame_height)).div_euclid(2);
        Self::new(sx, sy, frame_width, frame_height)
    }

    /// Exclusive right edge in frame coordinates
    pub fn x2(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn y2(&self) -> i64 {
        self.y + i64::from(self.height)
    }
}
