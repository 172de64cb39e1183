use crate::models::crop::CropRegion;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Where the pixels of a scan came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Static,
    Upload,
    Camera,
}

impl std::fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Static => "static",
            Self::Upload => "upload",
            Self::Camera => "camera",
        };
        f.write_str(name)
    }
}

/// Decoded pixels of a single scan request.
///
/// Lives only until it has been drawn into a [`ScanBuffer`].
#[derive(Debug, Clone)]
pub struct PixelSource {
    pub origin: SourceOrigin,
    pub image: RgbaImage,
}

impl PixelSource {
    pub fn new(origin: SourceOrigin, image: RgbaImage) -> Self {
        Self { origin, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pixel surface the decoder reads from.
///
/// Every draw starts with [`ScanBuffer::reset`], so nothing from a previous
/// source survives into the next scan.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    surface: RgbaImage,
}

impl ScanBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: RgbaImage::from_pixel(width, height, CLEAR),
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    /// Resize to `width` x `height` and clear every pixel
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.surface.dimensions() == (width, height) {
            self.surface.pixels_mut().for_each(|p| *p = CLEAR);
        } else {
            self.surface = RgbaImage::from_pixel(width, height, CLEAR);
        }
    }

    /// Resize to the source's natural size and copy it in whole
    pub fn draw_source(&mut self, source: &PixelSource) {
        self.reset(source.width(), source.height());
        self.surface.copy_from_slice(source.image.as_raw());
    }

    /// Resize to the crop size and copy the cropped region of `frame`.
    ///
    /// Pixels of the crop that fall outside `frame` stay cleared.
    pub fn draw_crop(&mut self, frame: &RgbaImage, crop: CropRegion) {
        self.reset(crop.width, crop.height);

        // Overlap of the crop with the frame, in frame coordinates
        let (frame_w, frame_h) = frame.dimensions();
        let (x0, x1) = (crop.x.max(0), crop.x2().min(i64::from(frame_w)));
        let (y0, y1) = (crop.y.max(0), crop.y2().min(i64::from(frame_h)));

        for sy in y0..y1 {
            for sx in x0..x1 {
                let pixel = *frame.get_pixel(sx as u32, sy as u32);
                self.surface
                    .put_pixel((sx - crop.x) as u32, (sy - crop.y) as u32, pixel);
            }
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.surface
    }

    /// Mutable access for collaborators that render into the buffer
    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.surface
    }
}
