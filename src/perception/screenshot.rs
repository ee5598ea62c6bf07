// Screenshot capture of the primary monitor.
use image::imageops::FilterType;

use crate::errors::{PilotError, PilotResult};
use crate::perception::traits::ScreenSource;
use crate::perception::types::CapturedFrame;

/// [`ScreenSource`] backed by xcap.
#[derive(Debug, Default)]
pub struct XcapScreen;

impl XcapScreen {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenSource for XcapScreen {
    fn capture(&mut self, target_width: u32, target_height: u32) -> PilotResult<CapturedFrame> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| PilotError::Perception(format!("enumerate monitors: {e}")))?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| monitors.first())
            .ok_or_else(|| PilotError::Perception("no monitor found".into()))?;

        let shot = monitor
            .capture_image()
            .map_err(|e| PilotError::Perception(format!("capture: {e}")))?;
        let (w, h) = (shot.width(), shot.height());
        let rgba = image::RgbaImage::from_raw(w, h, shot.into_raw())
            .ok_or_else(|| PilotError::Perception("capture buffer size mismatch".into()))?;

        tracing::debug!(width = w, height = h, target_width, target_height, "screen captured");
        encode_frame(rgba, target_width, target_height)
    }
}

/// Scale a raw capture to the target resolution and PNG-encode it.
/// A zero target dimension keeps the native size.
pub fn encode_frame(
    rgba: image::RgbaImage,
    target_width: u32,
    target_height: u32,
) -> PilotResult<CapturedFrame> {
    let (screen_width, screen_height) = rgba.dimensions();
    let scaled = if target_width == 0
        || target_height == 0
        || (target_width, target_height) == (screen_width, screen_height)
    {
        rgba
    } else {
        image::imageops::resize(&rgba, target_width, target_height, FilterType::Triangle)
    };

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(scaled)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| PilotError::Perception(format!("PNG encode: {e}")))?;

    Ok(CapturedFrame {
        png,
        screen_width,
        screen_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resizes_to_target_and_keeps_screen_size() {
        let raw = image::RgbaImage::from_pixel(64, 32, image::Rgba([10, 20, 30, 255]));
        let frame = encode_frame(raw, 16, 8).unwrap();
        assert_eq!((frame.screen_width, frame.screen_height), (64, 32));

        let decoded = image::load_from_memory(&frame.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        assert!(!frame.to_base64().is_empty());
    }

    #[test]
    fn zero_target_keeps_native_resolution() {
        let raw = image::RgbaImage::new(20, 10);
        let frame = encode_frame(raw, 0, 0).unwrap();
        let decoded = image::load_from_memory(&frame.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }
}
