//! Fixtures shared by the unit tests of several modules.

use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::config::AssetConfig;

const SYMBOL_G: u8 = 0xC0;
const SYMBOL_B: u8 = 0xDE;

/// Write `value` as a row of tagged pixels starting at (x, y)
pub(crate) fn paint_symbol(image: &mut RgbaImage, x: u32, y: u32, value: &str) {
    for (i, byte) in value.bytes().enumerate() {
        image.put_pixel(x + i as u32, y, Rgba([byte, SYMBOL_G, SYMBOL_B, 255]));
    }
}

/// Read back a value painted by [`paint_symbol`]
pub(crate) fn read_symbol(image: &RgbaImage, x: u32, y: u32) -> Option<String> {
    let bytes: Vec<u8> = (x..image.width())
        .map(|px| image.get_pixel(px, y))
        .take_while(|p| p[1] == SYMBOL_G && p[2] == SYMBOL_B && p[3] == 255)
        .map(|p| p[0])
        .collect();

    if bytes.is_empty() {
        None
    } else {
        String::from_utf8(bytes).ok()
    }
}

/// Opaque grey frame carrying `value` at the top-left of the centered crop
pub(crate) fn camera_frame(width: u32, height: u32, frame_size: u32, value: Option<&str>) -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255]));
    if let Some(value) = value {
        let x = (width - frame_size) / 2;
        let y = (height - frame_size) / 2;
        paint_symbol(&mut frame, x, y, value);
    }
    frame
}

/// Fresh, empty directory unique to this test process and call
pub(crate) fn temp_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "symcode-scanner-{}-{}-{}",
        label,
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    dir
}

/// Solid image whose red channel identifies it as fixture `marker`
pub(crate) fn marker_image(marker: u8, width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([marker, 10, 20, 255]))
}

pub(crate) fn write_png(path: &Path, image: &RgbaImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture parent");
    }
    image.save(path).expect("write fixture image");
}

/// Lay out `count` templates (markers 10, 20, ...) and an alphabet (marker 200)
/// under `root`, returning the matching asset configuration.
pub(crate) fn write_reference_assets(root: &Path, count: usize) -> AssetConfig {
    let assets = AssetConfig {
        root: root.to_path_buf(),
        template_dir: PathBuf::from("glyph_templates"),
        template_count: count,
        template_extension: "png".to_string(),
        alphabet_path: PathBuf::from("alphabet/alphabet2.png"),
    };

    for index in 1..=count {
        let path = root
            .join(&assets.template_dir)
            .join(format!("{}.png", index));
        write_png(&path, &marker_image(index as u8 * 10, 30 + index as u32, 40));
    }
    write_png(&root.join(&assets.alphabet_path), &marker_image(200, 120, 60));

    assets
}

/// Template marker written for a given 1-based index
pub(crate) fn template_marker(index: usize) -> u8 {
    index as u8 * 10
}
